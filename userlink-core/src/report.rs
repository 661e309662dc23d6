//! Output formatting - plaintext and JSON.

use std::fmt::Write;

use crate::batch::{BatchReport, DocumentStatus};

/// Renders a batch report as human-readable text.
pub fn render_plain(report: &BatchReport) -> String {
    let mut out = String::new();
    let tag = if report.dry_run { "DRY-RUN" } else { "REWRITE" };

    for doc in &report.documents {
        if doc.edited_externally {
            let _ = writeln!(
                out,
                "[EDITED] {}: changed since userlink last wrote it",
                doc.path
            );
        }
        match &doc.status {
            DocumentStatus::Rewritten {
                version,
                substitutions,
                ..
            } => {
                let _ = writeln!(
                    out,
                    "[{}] {}: replaced {} user link(s), version {}",
                    tag,
                    doc.path,
                    substitutions.len(),
                    version
                );
                for sub in substitutions {
                    match &sub.cached_name {
                        Some(cached) => {
                            let _ = writeln!(
                                out,
                                "  - {} -> {} (cached: {})",
                                sub.key, sub.display_name, cached
                            );
                        }
                        None => {
                            let _ = writeln!(out, "  - {} -> {}", sub.key, sub.display_name);
                        }
                    }
                }
            }
            DocumentStatus::Failed { error } => {
                let _ = writeln!(out, "[FAILED] {}: {}", doc.path, error);
            }
            DocumentStatus::Unchanged { .. } | DocumentStatus::NoMacros => {}
        }
    }

    if report.documents.is_empty() {
        out.push_str("No documents found.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "Documents: {} | rewritten: {} | unchanged: {} | failed: {} | links replaced: {}",
        report.documents.len(),
        report.rewritten(),
        report.unchanged(),
        report.failed(),
        report.substitutions()
    );
    out
}

/// Prints a batch report in plain text format.
pub fn print_plain(report: &BatchReport) {
    print!("{}", render_plain(report));
}

/// Prints a batch report in JSON format.
///
/// Falls back to the plain summary line if serialization fails.
pub fn print_json(report: &BatchReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            print_plain(report);
        }
    }
}
