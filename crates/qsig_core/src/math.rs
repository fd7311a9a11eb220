//! Math utilities: L2 norm and zero-tolerant normalization.

/// Compute L2 norm of a vector.
pub fn l2_norm(v: &[f64]) -> f64 {
    let sum: f64 = v.iter().map(|x| x * x).sum();
    sum.sqrt()
}

/// L2-normalize a vector in place.
///
/// A zero-norm vector (empty or all zeros) is left untouched and `false` is
/// returned; otherwise every element is divided by the norm and `true` is
/// returned.
pub fn l2_normalize_or_keep(v: &mut [f64]) -> bool {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// Round to `digits` decimal places.
///
/// Rounds the exact binary value rather than `value * 10^digits`, so
/// `0.0001235` (stored as 0.00012349999...) becomes `0.000123`.
pub fn round_to(value: f64, digits: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", digits, value).parse().unwrap_or(value)
}
