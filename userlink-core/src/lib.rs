//! userlink-core: replace references to departed users in stored documents
//!
//! Confluence storage-format documents embed user links, macros that name a
//! person by an opaque user key and sometimes carry a cached display name.
//! When the person directory no longer knows someone, their link is broken.
//! This library rewrites each document so those links become the plain-text
//! display name, while links to people who still resolve stay byte for byte
//! as they were.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use userlink_core::prelude::*;
//!
//! let directory = Directory::load("people.json".as_ref(), DEFAULT_UNKNOWN_MARKER)?;
//! let rewritten = process(&body, &directory)?;
//! if rewritten.changed {
//!     store(rewritten.body);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`scanner`]: Locates user links and classifies their terminator variant
//! - [`rewriter`]: Keeps or replaces one user link
//! - [`process`]: Single pass over one document body
//! - [`resolver`]: Directory collaborators (`Resolver`, `Directory`, `MemoResolver`)
//! - [`batch`]: Parallel batch driver over a directory of documents
//! - [`ledger`]: Per-document version counter with SHA-256 body hashes
//! - [`documents`]: Document discovery
//! - [`error`]: Typed error handling

pub mod batch;
pub mod config;
pub mod documents;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod prelude;
pub mod process;
pub mod report;
pub mod resolver;
pub mod rewriter;
pub mod scanner;

// ============================================================================
// Explicit Re-exports
// ============================================================================

// Error types
pub use error::{IoResultExt, LookupFailure, UserlinkError, UserlinkResult};

// Core pass
pub use process::{process, RewrittenDocument, Substitution};
pub use rewriter::{clean_reference_key, rewrite_occurrence, Rewrite};
pub use scanner::{find_next_macro, MacroHead, Occurrence, Scan, Terminator, MACRO_START};

// Resolvers
pub use resolver::{
    Directory, DirectoryEntry, MemoResolver, Resolution, Resolver, DEFAULT_UNKNOWN_MARKER,
};

// Batch driver
pub use batch::{Batch, BatchReport, DocumentReport, DocumentStatus};
pub use documents::{gather_documents, DEFAULT_EXTENSIONS, EXCLUDED_DIRS};
pub use ledger::{
    body_hash, ledger_path, load_ledger, save_ledger, DocumentVersion, Ledger, LedgerMetadata,
};

// Configuration
pub use config::{load_config, OutputConfig, UserlinkConfig};

// Logging
pub use logging::{
    init_structured_logging, log_document_rewritten, log_document_skipped, log_external_edit,
    log_substitution,
};

// Reporting
pub use report::{print_json, print_plain, render_plain};
