//! Amplitude vector → scalar signature.
//!
//! signature = |Σ v_k · (1/√n) · e^{i·2πk/n}| mod 1
//!
//! This is the magnitude of the first DFT bin under orthonormal scaling, so
//! it is unchanged by cyclic shifts and by reversal of the vector. Other
//! permutations and any change of length move it.

use crate::encoder::encode;
use num_complex::Complex64;
use std::f64::consts::TAU;

/// Uniform mixing weight `1/√n`. Undefined for `n == 0`.
fn mixing_weight(n: usize) -> f64 {
    1.0 / (n as f64).sqrt()
}

/// Unit phase for index `k` of `n`.
fn phase(k: usize, n: usize) -> Complex64 {
    Complex64::from_polar(1.0, TAU * k as f64 / n as f64)
}

/// Reduce a non-negative magnitude into `[0, 1)`.
fn reduce_unit(magnitude: f64) -> f64 {
    magnitude % 1.0
}

/// Compute the signature of an amplitude vector.
///
/// An empty vector has signature `0.0`. An all-zero vector sums to zero and
/// also yields `0.0`.
pub fn signature(vector: &[f64]) -> f64 {
    let n = vector.len();
    if n == 0 {
        return 0.0;
    }
    let w = mixing_weight(n);
    let acc: Complex64 = vector
        .iter()
        .enumerate()
        .map(|(k, &v)| phase(k, n) * (v * w))
        .sum();
    reduce_unit(acc.norm())
}

/// `signature(encode(bytes))`.
pub fn fingerprint(bytes: &[u8]) -> f64 {
    signature(&encode(bytes))
}
