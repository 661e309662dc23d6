//! Person-directory collaborators.
//!
//! The rewriter only knows the [`Resolver`] trait. This module provides an
//! in-memory [`Directory`] snapshot loaded from JSON and a memoising wrapper
//! for batches where the same people are referenced from many documents.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;

use crate::error::{IoResultExt, LookupFailure, UserlinkError, UserlinkResult};

/// Display-name marker the directory uses for people it no longer knows.
pub const DEFAULT_UNKNOWN_MARKER: &str = "Unknown User";

/// What the directory says about one user key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub display_name: String,
    /// The directory still recognises an active, named person
    pub resolvable: bool,
}

impl Resolution {
    pub fn active(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            resolvable: true,
        }
    }

    pub fn departed(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            resolvable: false,
        }
    }
}

/// Looks up a cleaned user key.
///
/// Calls block until the directory answers. Implementations must be `Sync`
/// because a batch runs independent documents on a thread pool.
pub trait Resolver: Sync {
    fn resolve(&self, key: &str) -> Result<Resolution, LookupFailure>;
}

impl<F> Resolver for F
where
    F: Fn(&str) -> Result<Resolution, LookupFailure> + Sync,
{
    fn resolve(&self, key: &str) -> Result<Resolution, LookupFailure> {
        self(key)
    }
}

/// One person in a directory snapshot.
///
/// Either a bare display name or an object with an explicit `active` flag.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DirectoryEntry {
    Name(String),
    Person {
        display_name: String,
        #[serde(default)]
        active: Option<bool>,
    },
}

/// In-memory snapshot of the person directory.
///
/// Without an explicit `active` flag, a person is resolvable unless their
/// display name contains the unknown marker.
#[derive(Debug, Clone)]
pub struct Directory {
    entries: HashMap<String, DirectoryEntry>,
    unknown_marker: String,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(DEFAULT_UNKNOWN_MARKER)
    }
}

impl Directory {
    pub fn new(unknown_marker: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            unknown_marker: unknown_marker.into(),
        }
    }

    /// Parses a JSON object mapping user keys to entries.
    pub fn from_json(text: &str, unknown_marker: impl Into<String>) -> serde_json::Result<Self> {
        let entries = serde_json::from_str(text)?;
        Ok(Self {
            entries,
            unknown_marker: unknown_marker.into(),
        })
    }

    /// Loads a snapshot file.
    pub fn load(path: &Path, unknown_marker: impl Into<String>) -> UserlinkResult<Self> {
        let text = fs::read_to_string(path).with_path(path)?;
        Self::from_json(&text, unknown_marker)
            .map_err(|e| UserlinkError::directory(path, e.to_string()))
    }

    pub fn insert_name(&mut self, key: impl Into<String>, display_name: impl Into<String>) {
        self.entries
            .insert(key.into(), DirectoryEntry::Name(display_name.into()));
    }

    pub fn insert_person(
        &mut self,
        key: impl Into<String>,
        display_name: impl Into<String>,
        active: bool,
    ) {
        self.entries.insert(
            key.into(),
            DirectoryEntry::Person {
                display_name: display_name.into(),
                active: Some(active),
            },
        );
    }

    pub fn unknown_marker(&self) -> &str {
        &self.unknown_marker
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Resolver for Directory {
    fn resolve(&self, key: &str) -> Result<Resolution, LookupFailure> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| LookupFailure::new(key, "not present in directory snapshot"))?;

        let (display_name, active) = match entry {
            DirectoryEntry::Name(name) => (name, None),
            DirectoryEntry::Person {
                display_name,
                active,
            } => (display_name, *active),
        };
        let resolvable =
            active.unwrap_or_else(|| !display_name.contains(self.unknown_marker.as_str()));

        Ok(Resolution {
            display_name: display_name.clone(),
            resolvable,
        })
    }
}

/// Memoises successful lookups of an inner resolver.
///
/// Failures are not cached, so a flaky directory gets asked again for the
/// next document.
#[derive(Debug)]
pub struct MemoResolver<R> {
    inner: R,
    memo: Mutex<HashMap<String, Resolution>>,
}

impl<R: Resolver> MemoResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct keys answered so far.
    pub fn cached(&self) -> usize {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<R: Resolver> Resolver for MemoResolver<R> {
    fn resolve(&self, key: &str) -> Result<Resolution, LookupFailure> {
        if let Some(hit) = self
            .memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Ok(hit.clone());
        }

        // The lock is not held across the lookup; two threads may race on the
        // same key and both ask the directory, which is harmless.
        let resolution = self.inner.resolve(key)?;
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), resolution.clone());
        Ok(resolution)
    }
}
