//! Byte blob → amplitude vector.

use crate::math::l2_normalize_or_keep;

/// Scale each byte into `[0, 1]`.
pub fn byte_amplitudes(bytes: &[u8]) -> Vec<f64> {
    bytes.iter().map(|&b| f64::from(b) / 255.0).collect()
}

/// Encode a blob as an amplitude vector with unit L2 norm.
///
/// Empty and all-zero blobs have zero norm; their amplitudes are returned
/// unnormalized (an empty or all-zero vector).
pub fn encode(bytes: &[u8]) -> Vec<f64> {
    let mut v = byte_amplitudes(bytes);
    l2_normalize_or_keep(&mut v);
    v
}
