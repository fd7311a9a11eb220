//! Registry of stored signatures, keyed by content identifier.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored association between an identifier and its registered signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub identifier: String,
    pub signature: f64,
    /// Lowercase hex SHA-256 of the registered content.
    pub digest: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid record {identifier}: {reason}")]
    InvalidRecord {
        identifier: String,
        reason: &'static str,
    },
}

/// Storage capability the verifier depends on.
///
/// `put` is an upsert and must be durable before it returns `Ok`.
/// Implementations serialize writers; last writer wins.
pub trait Registry: Send + Sync {
    fn get(&self, identifier: &str) -> Result<Option<Record>, StorageError>;
    fn put(&self, record: Record) -> Result<(), StorageError>;
    fn list_identifiers(&self) -> Result<Vec<String>, StorageError>;
}

/// Process-local registry; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    records: RwLock<BTreeMap<String, Record>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Registry for MemoryRegistry {
    fn get(&self, identifier: &str) -> Result<Option<Record>, StorageError> {
        Ok(self.records.read().get(identifier).cloned())
    }

    fn put(&self, record: Record) -> Result<(), StorageError> {
        self.records
            .write()
            .insert(record.identifier.clone(), record);
        Ok(())
    }

    fn list_identifiers(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.records.read().keys().cloned().collect())
    }
}
