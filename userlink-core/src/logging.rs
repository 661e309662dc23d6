//! Structured logging using **tracing**.
//!
//! The library only emits events; the binary decides where they go. The JSON
//! subscriber provides machine-readable output, which doubles as the audit
//! trail of every substituted user link.

use tracing::{info, warn};

/// Initializes the global tracing collector (subscriber).
///
/// This should be called *once* at the beginning of the application's runtime.
/// It configures structured JSON output to stderr.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=userlink_core=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr) // stdout is reserved for the report
        .init();
}

/// A document was skipped and left as it was.
pub fn log_document_skipped(document: &str, error: &str) {
    warn!(event = "SKIP", document = %document, error = %error, "Skipping document");
}

/// A document was (or, in dry-run mode, would be) written back.
pub fn log_document_rewritten(document: &str, replaced: usize, version: u64, dry_run: bool) {
    info!(
        event = "REWRITE",
        document = %document,
        replaced,
        version,
        dry_run,
        "Document rewritten"
    );
}

/// The body on disk is not the one userlink last wrote.
pub fn log_external_edit(document: &str, version: u64) {
    warn!(
        event = "EXTERNAL_EDIT",
        document = %document,
        version,
        "Document changed since userlink last wrote it"
    );
}

/// Audit record for one replaced user link.
pub fn log_substitution(key: &str, display_name: &str) {
    info!(
        event = "SUBSTITUTE",
        user_key = %key,
        display_name = %display_name,
        "Replacing user link with plain text"
    );
}
