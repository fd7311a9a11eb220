//! qsig core: deterministic content signatures and tamper verification.
//!
//! The pipeline is:
//! - bytes → amplitude vector (`b / 255`, L2-normalized unless zero norm)
//! - amplitude vector → scalar signature (uniform weight, index phase, |sum| mod 1)
//! - bytes → SHA-256 hex digest
//! - (signature, digest) stored per identifier in a `Registry`
//! - fresh (signature, digest) compared against the stored record into a `Verdict`
//!
//! The signature is a similarity heuristic. Only the digest is collision resistant.

pub mod comparison;
pub mod digest;
pub mod encoder;
pub mod math;
pub mod registry;
pub mod transform;
pub mod verifier;

pub use comparison::{approximate_historic_amplitudes, Comparison};
pub use digest::{digest, is_digest, DIGEST_HEX_LEN};
pub use encoder::encode;
pub use registry::{MemoryRegistry, Record, Registry, StorageError};
pub use transform::{fingerprint, signature};
pub use verifier::{
    IntegrityError, IntegrityStatus, PolicyError, StorageOp, Verdict, Verifier, VerifierPolicy,
    DEFAULT_TOLERANCE_THRESHOLD,
};
