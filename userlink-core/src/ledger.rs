//! Version ledger for rewritten documents.
//!
//! Every time the batch driver writes a document back, the document's
//! version is incremented and the SHA-256 of the new body recorded. The
//! ledger lives at `.userlink/versions.json` under the batch root.
//!
//! # Ledger Versioning
//!
//! The ledger is the only record of document versions, so a file that
//! cannot be read back is an error, never a fresh start. Only a ledger that
//! does not exist yet starts everyone at [`INITIAL_VERSION`].

use crate::error::{IoResultExt, UserlinkError, UserlinkResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current ledger format version. Increment when the format changes.
const LEDGER_VERSION: u32 = 1;

const USERLINK_VERSION: &str = env!("CARGO_PKG_VERSION");

const LEDGER_DIR: &str = ".userlink";
const LEDGER_FILE: &str = "versions.json";

/// Version assumed for a document the ledger has never seen.
pub const INITIAL_VERSION: u64 = 1;

/// Recorded state of one document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DocumentVersion {
    pub version: u64,
    /// SHA-256 of the last body written
    pub hash: String,
}

/// Ledger metadata for compatibility checking.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LedgerMetadata {
    pub ledger_version: u32,
    pub userlink_version: String,
    #[serde(default)]
    pub updated_at: u64,
}

impl LedgerMetadata {
    pub fn current() -> Self {
        let updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            ledger_version: LEDGER_VERSION,
            userlink_version: USERLINK_VERSION.to_string(),
            updated_at,
        }
    }

    /// Whether this build can read the recorded format. The tool version
    /// is informational only.
    pub fn is_compatible(&self) -> bool {
        self.ledger_version == LEDGER_VERSION
    }
}

/// The full ledger, keyed by root-relative document path.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Ledger {
    #[serde(default)]
    pub metadata: LedgerMetadata,
    pub documents: BTreeMap<String, DocumentVersion>,
}

/// Compute SHA-256 hash of a document body.
#[inline]
pub fn body_hash(body: &str) -> String {
    let mut sha = Sha256::new();
    sha.update(body.as_bytes());
    format!("{:x}", sha.finalize())
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            metadata: LedgerMetadata::current(),
            documents: BTreeMap::new(),
        }
    }

    /// Current version of a document.
    pub fn version(&self, document: &str) -> u64 {
        self.documents
            .get(document)
            .map_or(INITIAL_VERSION, |d| d.version)
    }

    /// Records a new body for `document` and returns its new version.
    ///
    /// Versions only ever go up, even if the body is identical to an
    /// earlier one.
    pub fn bump(&mut self, document: &str, body: &str) -> u64 {
        let version = self.version(document) + 1;
        self.documents.insert(
            document.to_string(),
            DocumentVersion {
                version,
                hash: body_hash(body),
            },
        );
        version
    }

    /// Whether `body` is what the ledger last recorded for `document`.
    pub fn matches(&self, document: &str, body: &str) -> bool {
        self.documents
            .get(document)
            .is_some_and(|d| d.hash == body_hash(body))
    }
}

/// Path of the ledger file under `root`.
pub fn ledger_path(root: &Path) -> PathBuf {
    root.join(LEDGER_DIR).join(LEDGER_FILE)
}

/// Load the ledger from `.userlink/versions.json`.
///
/// Returns `Ok(None)` only when the file does not exist. An unreadable,
/// corrupt, or incompatible ledger is an error.
pub fn load_ledger(root: &Path) -> UserlinkResult<Option<Ledger>> {
    let path = ledger_path(root);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(UserlinkError::io(&path, e)),
    };

    let ledger: Ledger = serde_json::from_str(&text).map_err(|e| {
        UserlinkError::ledger(format!("{} is not a valid ledger: {}", path.display(), e))
    })?;

    if !ledger.metadata.is_compatible() {
        return Err(UserlinkError::ledger(format!(
            "{} has format version {}, this build reads version {}",
            path.display(),
            ledger.metadata.ledger_version,
            LEDGER_VERSION
        )));
    }

    Ok(Some(ledger))
}

/// Save the ledger atomically (temp file + rename).
pub fn save_ledger(root: &Path, ledger: &Ledger) -> UserlinkResult<()> {
    let dir = root.join(LEDGER_DIR);
    fs::create_dir_all(&dir).with_path(&dir)?;

    let mut stamped = ledger.clone();
    stamped.metadata = LedgerMetadata::current();
    let json = serde_json::to_string_pretty(&stamped)
        .map_err(|e| UserlinkError::ledger(e.to_string()))?;

    let path = ledger_path(root);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("{}.{}.{}.tmp", LEDGER_FILE, std::process::id(), nanos));

    fs::write(&temp_path, &json).with_path(&temp_path)?;
    if let Err(e) = fs::rename(&temp_path, &path) {
        let _ = fs::remove_file(&temp_path);
        return Err(UserlinkError::io(&path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "userlink_ledger_{}_{}",
            name,
            std::process::id()
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_bump_is_monotonic() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.version("space/home.xml"), INITIAL_VERSION);
        assert_eq!(ledger.bump("space/home.xml", "a"), 2);
        assert_eq!(ledger.bump("space/home.xml", "a"), 3);
        assert_eq!(ledger.bump("space/other.xml", "b"), 2);
        assert!(ledger.matches("space/home.xml", "a"));
        assert!(!ledger.matches("space/home.xml", "b"));
    }

    #[test]
    fn test_body_hash() {
        assert_eq!(
            body_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(body_hash("a"), body_hash("b"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let root = temp_root("roundtrip");
        assert!(load_ledger(&root).unwrap().is_none());

        let mut ledger = Ledger::new();
        ledger.bump("home.xml", "<p>Jane Doe</p>");

        save_ledger(&root, &ledger).unwrap();
        let loaded = load_ledger(&root).unwrap().unwrap();
        assert_eq!(loaded.version("home.xml"), 2);
        assert!(loaded.matches("home.xml", "<p>Jane Doe</p>"));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_incompatible_ledger_rejected() {
        let root = temp_root("incompatible");
        let mut ledger = Ledger::new();
        ledger.bump("home.xml", "x");
        save_ledger(&root, &ledger).unwrap();

        let path = ledger_path(&root);
        let text = fs::read_to_string(&path).unwrap();
        let stale = text.replace("\"ledger_version\": 1", "\"ledger_version\": 99");
        fs::write(&path, stale).unwrap();

        let err = load_ledger(&root).unwrap_err();
        assert!(matches!(err, UserlinkError::Ledger { .. }));
        assert!(err.to_string().contains("99"));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_other_tool_version_still_loads() {
        let root = temp_root("tool_version");
        let mut ledger = Ledger::new();
        ledger.bump("home.xml", "x");
        ledger.bump("home.xml", "y");
        save_ledger(&root, &ledger).unwrap();

        let path = ledger_path(&root);
        let text = fs::read_to_string(&path).unwrap();
        let older = text.replace(
            &format!("\"userlink_version\": \"{}\"", USERLINK_VERSION),
            "\"userlink_version\": \"0.0.1\"",
        );
        fs::write(&path, older).unwrap();

        let loaded = load_ledger(&root).unwrap().unwrap();
        assert_eq!(loaded.metadata.userlink_version, "0.0.1");
        assert_eq!(loaded.version("home.xml"), 3);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_corrupt_ledger_rejected() {
        let root = temp_root("corrupt");
        fs::create_dir_all(root.join(LEDGER_DIR)).unwrap();
        fs::write(ledger_path(&root), "{not json").unwrap();

        let err = load_ledger(&root).unwrap_err();
        assert!(matches!(err, UserlinkError::Ledger { .. }));

        fs::remove_dir_all(&root).ok();
    }
}
