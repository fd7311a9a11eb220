//! Append-only, hash-chained JSONL event log.
//!
//! Each line is an `AuditRecord`. `hash` is `sha256:` over the canonical JSON
//! of `{"prev_hash": ..., "event": ...}` and `prev_hash` links to the previous
//! line, starting from `GENESIS_HASH`. Editing, dropping or reordering any
//! line breaks the chain at that line.
//!
//! Appenders in separate processes take an advisory lock on `<log>.lock` and
//! re-read the chain tail under it, so concurrent runs extend one chain.

use fd_lock::RwLock as FileLock;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use qsig_common::{canonical_json_bytes, sha256_bytes, CanonError};

/// `prev_hash` of the first record in every log.
pub const GENESIS_HASH: &str = "sha256:";

#[derive(Debug, thiserror::Error)]
pub enum AuditLogError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("event serialization: {0}")]
    Event(#[from] serde_json::Error),
    #[error("canon: {0}")]
    Canon(#[from] CanonError),
    #[error("hash chain broken at line {line}: expected {expected}, got {got}")]
    HashChainBroken {
        line: usize,
        expected: String,
        got: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub prev_hash: String,
    pub hash: String,
    pub event: serde_json::Value,
}

fn chain_hash(prev_hash: &str, event: &serde_json::Value) -> Result<String, AuditLogError> {
    let payload = serde_json::json!({
        "prev_hash": prev_hash,
        "event": event
    });
    let canon = canonical_json_bytes(&payload)?;
    Ok(sha256_bytes(&canon))
}

pub struct AuditAppender {
    path: PathBuf,
    file: File,
    last_hash: String,
}

impl AuditAppender {
    /// Open for appending. The existing chain is verified first so new
    /// records never extend a broken log.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditLogError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let lock = FileLock::new(open_lock_file(&path)?);
        let _held = lock.read()?;
        let last_hash = walk_chain(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            last_hash,
        })
    }

    /// Hash of the newest record this appender has seen.
    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event; returns its hash. The chain is re-walked under the
    /// writer lock, so records appended by other handles since `open` are
    /// linked to rather than forked from.
    pub fn append<T: Serialize>(&mut self, event: &T) -> Result<String, AuditLogError> {
        let event = serde_json::to_value(event)?;

        let mut lock = FileLock::new(open_lock_file(&self.path)?);
        let _held = lock.write()?;
        let prev_hash = walk_chain(&self.path)?;
        let hash = chain_hash(&prev_hash, &event)?;
        let record = AuditRecord {
            prev_hash,
            hash: hash.clone(),
            event,
        };

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_data()?;

        self.last_hash = hash.clone();
        Ok(hash)
    }
}

/// Read every record without checking the chain.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, AuditLogError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let rdr = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (i, line) in rdr.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|source| AuditLogError::Json { line: i + 1, source })?;
        records.push(record);
    }
    Ok(records)
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut p = path.as_os_str().to_os_string();
    p.push(".lock");
    PathBuf::from(p)
}

fn open_lock_file(path: &Path) -> Result<File, AuditLogError> {
    Ok(OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path_for(path))?)
}

/// Walk the chain and return the last hash (`GENESIS_HASH` for a missing or
/// empty log).
pub fn verify_log(path: impl AsRef<Path>) -> Result<String, AuditLogError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(GENESIS_HASH.to_string());
    }
    let lock = FileLock::new(open_lock_file(path)?);
    let _held = lock.read()?;
    walk_chain(path)
}

/// Caller holds the lock.
fn walk_chain(path: &Path) -> Result<String, AuditLogError> {
    if !path.exists() {
        return Ok(GENESIS_HASH.to_string());
    }

    let rdr = BufReader::new(File::open(path)?);
    let mut expected_prev = GENESIS_HASH.to_string();

    for (i, line) in rdr.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: AuditRecord = serde_json::from_str(&line)
            .map_err(|source| AuditLogError::Json { line: line_no, source })?;

        if record.prev_hash != expected_prev {
            return Err(AuditLogError::HashChainBroken {
                line: line_no,
                expected: expected_prev,
                got: record.prev_hash,
            });
        }

        let computed = chain_hash(&record.prev_hash, &record.event)?;
        if computed != record.hash {
            return Err(AuditLogError::HashChainBroken {
                line: line_no,
                expected: computed,
                got: record.hash,
            });
        }
        expected_prev = record.hash;
    }

    Ok(expected_prev)
}
