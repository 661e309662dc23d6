//! Batch driver: rewrite every stored document under a root directory.
//!
//! ```rust,ignore
//! use userlink_core::{Batch, Directory};
//!
//! let directory = Directory::load("people.json".as_ref(), "Unknown User")?;
//! let report = Batch::new("/exports/space")
//!     .extensions(["xml"])
//!     .dry_run(true)
//!     .run(&directory)?;
//!
//! println!("{} document(s) rewritten", report.rewritten());
//! ```
//!
//! Each document gets its own independent pass, so documents run in parallel
//! on the Rayon pool. A document that fails is reported and left untouched;
//! the rest of the batch carries on. The version ledger is read before any
//! document is touched, and a ledger that cannot be read stops the batch.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::documents::{gather_documents, DEFAULT_EXTENSIONS};
use crate::error::{IoResultExt, UserlinkResult};
use crate::ledger::{load_ledger, save_ledger, Ledger};
use crate::logging::{log_document_rewritten, log_document_skipped, log_external_edit};
use crate::process::{process, Substitution};
use crate::resolver::Resolver;

/// Builder for a batch run.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Root directory holding the documents
    root: PathBuf,

    /// Document extensions to scan
    extensions: Vec<String>,

    /// Extra directory names to prune
    excluded_dirs: Vec<String>,

    /// Dry-run mode (don't write documents or the ledger)
    dry_run: bool,
}

impl Batch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            excluded_dirs: Vec::new(),
            dry_run: false,
        }
    }

    /// Replace the scanned extensions.
    pub fn extensions(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = exts.into_iter().map(Into::into).collect();
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Enable dry-run mode (no file modifications).
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Run the batch and report on every document.
    pub fn run<R>(&self, resolver: &R) -> Result<BatchReport>
    where
        R: Resolver + ?Sized,
    {
        let exts: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        let excludes: Vec<&str> = self.excluded_dirs.iter().map(String::as_str).collect();
        let files = gather_documents(&self.root, &exts, &excludes)?;

        let mut ledger = load_ledger(&self.root)
            .with_context(|| {
                format!("Failed to load version ledger under {}", self.root.display())
            })?
            .unwrap_or_else(Ledger::new);

        let outcomes: Vec<(String, Checked)> = files
            .par_iter()
            .map(|file| {
                let name = self.relative_name(file);
                let checked = self.rewrite_file(file, &name, &ledger, resolver);
                (name, checked)
            })
            .collect();

        let mut written = false;
        let mut documents = Vec::with_capacity(outcomes.len());

        for (name, Checked { outcome, edited }) in outcomes {
            if edited {
                log_external_edit(&name, ledger.version(&name));
            }
            let status = match outcome {
                Outcome::NoMacros => DocumentStatus::NoMacros,
                Outcome::Unchanged { macros } => DocumentStatus::Unchanged { macros },
                Outcome::Failed(error) => {
                    log_document_skipped(&name, &error);
                    DocumentStatus::Failed { error }
                }
                Outcome::Rewritten {
                    macros,
                    substitutions,
                    body,
                } => {
                    let version = if self.dry_run {
                        ledger.version(&name) + 1
                    } else {
                        written = true;
                        ledger.bump(&name, &body)
                    };
                    log_document_rewritten(&name, substitutions.len(), version, self.dry_run);
                    DocumentStatus::Rewritten {
                        macros,
                        version,
                        substitutions,
                    }
                }
            };
            documents.push(DocumentReport {
                path: name,
                edited_externally: edited,
                status,
            });
        }

        if written {
            save_ledger(&self.root, &ledger).with_context(|| {
                format!("Failed to save version ledger under {}", self.root.display())
            })?;
        }

        Ok(BatchReport {
            root: self.root.display().to_string(),
            dry_run: self.dry_run,
            documents,
        })
    }

    /// Read, rewrite, and (unless dry-run) write back one document.
    fn rewrite_file<R>(&self, file: &Path, name: &str, ledger: &Ledger, resolver: &R) -> Checked
    where
        R: Resolver + ?Sized,
    {
        let original = match fs::read_to_string(file).with_path(file) {
            Ok(text) => text,
            Err(e) => {
                return Checked {
                    outcome: Outcome::Failed(e.to_string()),
                    edited: false,
                }
            }
        };
        // Only documents userlink has written before have a hash to compare.
        let edited = ledger.documents.contains_key(name) && !ledger.matches(name, &original);

        let outcome = match self.try_rewrite(file, &original, resolver) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e.to_string()),
        };
        Checked { outcome, edited }
    }

    fn try_rewrite<R>(&self, file: &Path, original: &str, resolver: &R) -> UserlinkResult<Outcome>
    where
        R: Resolver + ?Sized,
    {
        let result = process(original, resolver)?;

        if result.no_macros() {
            return Ok(Outcome::NoMacros);
        }
        if !result.changed {
            return Ok(Outcome::Unchanged {
                macros: result.macros,
            });
        }
        if !self.dry_run {
            fs::write(file, &result.body).with_path(file)?;
        }

        Ok(Outcome::Rewritten {
            macros: result.macros,
            substitutions: result.substitutions,
            body: result.body,
        })
    }

    /// Root-relative path with `/` separators, used as the ledger key.
    fn relative_name(&self, file: &Path) -> String {
        let rel = file.strip_prefix(&self.root).unwrap_or(file);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Per-document result before ledger bookkeeping.
struct Checked {
    outcome: Outcome,
    /// The body on disk differs from the hash the ledger recorded
    edited: bool,
}

enum Outcome {
    NoMacros,
    Unchanged {
        macros: usize,
    },
    Rewritten {
        macros: usize,
        substitutions: Vec<Substitution>,
        body: String,
    },
    Failed(String),
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    /// No user links in the document
    NoMacros,
    /// Every user link still resolves
    Unchanged { macros: usize },
    /// At least one user link was replaced; `version` is the new version
    /// (the would-be version in dry-run mode)
    Rewritten {
        macros: usize,
        version: u64,
        substitutions: Vec<Substitution>,
    },
    /// Skipped; the document was left as it was
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    /// Path relative to the batch root
    pub path: String,
    /// The document changed on disk since userlink last wrote it
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub edited_externally: bool,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

/// Result of a batch run, documents in path order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub root: String,
    pub dry_run: bool,
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&DocumentStatus) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.status)).count()
    }

    pub fn rewritten(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Rewritten { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Unchanged { .. } | DocumentStatus::NoMacros))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Documents changed on disk since userlink last wrote them.
    pub fn edited_externally(&self) -> usize {
        self.documents.iter().filter(|d| d.edited_externally).count()
    }

    /// Total user links replaced across the batch.
    pub fn substitutions(&self) -> usize {
        self.documents
            .iter()
            .map(|d| match &d.status {
                DocumentStatus::Rewritten { substitutions, .. } => substitutions.len(),
                _ => 0,
            })
            .sum()
    }
}
