//! Durable registry backed by a single JSON document.
//!
//! Layout: `{ "<identifier>": { "signature": f64, "digest": "<hex>" }, ... }`
//! with keys sorted. Documents that use `quantum`/`sha256` field names load
//! as well.
//!
//! Writers serialize on an advisory lock over `<file>.lock` and merge into
//! the document as it is on disk, so handles opened by separate processes do
//! not drop each other's records.

use fd_lock::RwLock as WriterLock;
use parking_lot::RwLock;
use qsig_core::{is_digest, Record, Registry, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(alias = "quantum")]
    signature: f64,
    #[serde(alias = "sha256")]
    digest: String,
}

type Document = BTreeMap<String, StoredRecord>;

#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    records: RwLock<Document>,
}

impl JsonFileRegistry {
    /// Load every record from `path`. A missing file is an empty registry;
    /// nothing is written until the first `put`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let records = load_document(&path)?;
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Registry for JsonFileRegistry {
    fn get(&self, identifier: &str) -> Result<Option<Record>, StorageError> {
        Ok(self.records.read().get(identifier).map(|r| Record {
            identifier: identifier.to_string(),
            signature: r.signature,
            digest: r.digest.clone(),
        }))
    }

    fn put(&self, record: Record) -> Result<(), StorageError> {
        validate(&record.identifier, record.signature, &record.digest)?;
        let mut guard = self.records.write();
        ensure_parent(&self.path)?;

        // other handles (other processes) may have written since `open`
        let mut lock = WriterLock::new(open_lock_file(&self.path)?);
        let _held = lock.write()?;
        let mut next = load_document(&self.path)?;
        next.insert(
            record.identifier,
            StoredRecord {
                signature: record.signature,
                digest: record.digest,
            },
        );
        // memory only moves forward once the document is on disk
        save_document_atomic(&self.path, &next)?;
        *guard = next;
        Ok(())
    }

    fn list_identifiers(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.records.read().keys().cloned().collect())
    }
}

fn validate(identifier: &str, signature: f64, digest: &str) -> Result<(), StorageError> {
    if identifier.is_empty() {
        return Err(StorageError::InvalidRecord {
            identifier: identifier.to_string(),
            reason: "empty identifier",
        });
    }
    if !signature.is_finite() {
        return Err(StorageError::InvalidRecord {
            identifier: identifier.to_string(),
            reason: "signature is not finite",
        });
    }
    if !is_digest(digest) {
        return Err(StorageError::InvalidRecord {
            identifier: identifier.to_string(),
            reason: "digest is not 64 lowercase hex characters",
        });
    }
    Ok(())
}

fn load_document(path: &Path) -> Result<Document, StorageError> {
    if !path.exists() {
        return Ok(Document::new());
    }
    let bytes = fs::read(path)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }
    let doc: Document = serde_json::from_slice(&bytes)?;
    for (identifier, r) in &doc {
        validate(identifier, r.signature, &r.digest)?;
    }
    Ok(doc)
}

fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Sidecar `<file>.lock`; the document itself is replaced by rename, so it
/// cannot carry the lock.
pub(crate) fn lock_path_for(path: &Path) -> PathBuf {
    let mut p = path.as_os_str().to_os_string();
    p.push(".lock");
    PathBuf::from(p)
}

fn open_lock_file(path: &Path) -> Result<File, StorageError> {
    Ok(OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path_for(path))?)
}

/// Caller holds the writer lock.
fn save_document_atomic(path: &Path, doc: &Document) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let bytes = serde_json::to_vec_pretty(doc)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
