//! Exact content digest (SHA-256, lowercase hex).

/// Length of a digest string in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 of the whole blob as 64 lowercase hex characters.
pub fn digest(bytes: &[u8]) -> String {
    qsig_common::sha256_hex(bytes)
}

/// Check that `s` looks like a digest produced by [`digest`].
pub fn is_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
