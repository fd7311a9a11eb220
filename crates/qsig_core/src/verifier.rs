//! Registration and verification against a `Registry`.

use crate::comparison::Comparison;
use crate::digest::digest;
use crate::encoder::encode;
use crate::math::round_to;
use crate::registry::{Record, Registry, StorageError};
use crate::transform::signature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signature deltas strictly below this count as intact.
pub const DEFAULT_TOLERANCE_THRESHOLD: f64 = 1e-4;

/// Decimal places kept in a reported delta.
const DELTA_DECIMALS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    Intact,
    Tampered,
}

impl IntegrityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intact => "intact",
            Self::Tampered => "tampered",
        }
    }
}

/// Outcome of comparing fresh content against its stored record.
///
/// The two signals are independent. A caller may see an intact signature with
/// a mismatched digest; the digest is the authoritative one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub integrity_status: IntegrityStatus,
    /// `|stored - fresh|`, rounded to 6 decimal places.
    pub signature_delta: f64,
    pub digest_matches: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("tolerance threshold must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifierPolicy {
    tolerance_threshold: f64,
}

impl Default for VerifierPolicy {
    fn default() -> Self {
        Self {
            tolerance_threshold: DEFAULT_TOLERANCE_THRESHOLD,
        }
    }
}

impl VerifierPolicy {
    pub fn new(tolerance_threshold: f64) -> Result<Self, PolicyError> {
        if !tolerance_threshold.is_finite() || tolerance_threshold < 0.0 {
            return Err(PolicyError::InvalidTolerance(tolerance_threshold));
        }
        Ok(Self {
            tolerance_threshold,
        })
    }

    pub fn tolerance_threshold(&self) -> f64 {
        self.tolerance_threshold
    }

    /// Classify an unrounded signature delta.
    pub fn classify(&self, delta: f64) -> IntegrityStatus {
        if delta < self.tolerance_threshold {
            IntegrityStatus::Intact
        } else {
            IntegrityStatus::Tampered
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Get,
    Put,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageOp::Get => write!(f, "get"),
            StorageOp::Put => write!(f, "put"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error("record not found: {identifier}")]
    NotFound { identifier: String },
    #[error("storage {operation} failed for {identifier}: {source}")]
    Storage {
        identifier: String,
        operation: StorageOp,
        #[source]
        source: StorageError,
    },
}

impl IntegrityError {
    /// Stable snake_case reason for callers that report errors as codes.
    pub fn reason(&self) -> &'static str {
        match self {
            IntegrityError::NotFound { .. } => "record_not_found",
            IntegrityError::Storage { .. } => "storage_failed",
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            IntegrityError::NotFound { identifier } => identifier,
            IntegrityError::Storage { identifier, .. } => identifier,
        }
    }

    fn storage(identifier: &str, operation: StorageOp, source: StorageError) -> Self {
        IntegrityError::Storage {
            identifier: identifier.to_string(),
            operation,
            source,
        }
    }
}

/// Fresh signature, digest and amplitudes of one blob.
struct Measurement {
    amplitudes: Vec<f64>,
    signature: f64,
    digest: String,
}

impl Measurement {
    fn of(bytes: &[u8]) -> Self {
        let amplitudes = encode(bytes);
        let signature = signature(&amplitudes);
        Self {
            amplitudes,
            signature,
            digest: digest(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier {
    policy: VerifierPolicy,
}

impl Verifier {
    pub fn new(policy: VerifierPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &VerifierPolicy {
        &self.policy
    }

    /// Compute and store the record for `bytes`, replacing any earlier one.
    pub fn register_content<R: Registry + ?Sized>(
        &self,
        registry: &R,
        identifier: &str,
        bytes: &[u8],
    ) -> Result<Record, IntegrityError> {
        let m = Measurement::of(bytes);
        let record = Record {
            identifier: identifier.to_string(),
            signature: m.signature,
            digest: m.digest,
        };
        registry
            .put(record.clone())
            .map_err(|e| IntegrityError::storage(identifier, StorageOp::Put, e))?;
        Ok(record)
    }

    /// Compare `bytes` against the stored record for `identifier`.
    ///
    /// The registry is only read.
    pub fn verify_content<R: Registry + ?Sized>(
        &self,
        registry: &R,
        identifier: &str,
        bytes: &[u8],
    ) -> Result<Verdict, IntegrityError> {
        let m = Measurement::of(bytes);
        let stored = lookup(registry, identifier)?;
        Ok(self.compare(&stored, m.signature, &m.digest))
    }

    /// `verify_content` plus the plotting payload.
    pub fn verify_with_comparison<R: Registry + ?Sized>(
        &self,
        registry: &R,
        identifier: &str,
        bytes: &[u8],
    ) -> Result<(Verdict, Comparison), IntegrityError> {
        let m = Measurement::of(bytes);
        let stored = lookup(registry, identifier)?;
        let verdict = self.compare(&stored, m.signature, &m.digest);
        let comparison = Comparison::new(&stored, m.signature, m.amplitudes);
        Ok((verdict, comparison))
    }

    /// Build a verdict from a stored record and a fresh measurement.
    pub fn compare(&self, stored: &Record, signature: f64, digest: &str) -> Verdict {
        let delta = (stored.signature - signature).abs();
        Verdict {
            integrity_status: self.policy.classify(delta),
            signature_delta: round_to(delta, DELTA_DECIMALS),
            digest_matches: stored.digest == digest,
        }
    }
}

fn lookup<R: Registry + ?Sized>(registry: &R, identifier: &str) -> Result<Record, IntegrityError> {
    registry
        .get(identifier)
        .map_err(|e| IntegrityError::storage(identifier, StorageOp::Get, e))?
        .ok_or_else(|| IntegrityError::NotFound {
            identifier: identifier.to_string(),
        })
}
