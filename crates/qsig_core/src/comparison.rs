//! Display payload for plotting a stored signature against a fresh one.
//!
//! Nothing here feeds the verdict. The "historic" amplitudes are rebuilt from
//! the stored digest's hex characters, not from the registered content, so
//! they only approximate the shape of a curve for a viewer.

use crate::encoder::encode;
use crate::registry::Record;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub original_signature: f64,
    pub current_signature: f64,
    pub current_amplitudes: Vec<f64>,
    pub historic_amplitudes_approx: Vec<f64>,
}

impl Comparison {
    pub fn new(stored: &Record, current_signature: f64, current_amplitudes: Vec<f64>) -> Self {
        let historic_amplitudes_approx =
            approximate_historic_amplitudes(&stored.digest, current_amplitudes.len());
        Self {
            original_signature: stored.signature,
            current_signature,
            current_amplitudes,
            historic_amplitudes_approx,
        }
    }
}

/// Encode the nibble values of the first `len` hex characters of `digest`.
///
/// At most 64 values come out of a well-formed digest. Characters that are
/// not hex digits are skipped.
pub fn approximate_historic_amplitudes(digest: &str, len: usize) -> Vec<f64> {
    let nibbles: Vec<u8> = digest
        .chars()
        .take(len)
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    encode(&nibbles)
}
