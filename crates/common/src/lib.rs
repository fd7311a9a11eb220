use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug)]
pub enum CanonError {
    Json(serde_json::Error),
}

impl fmt::Display for CanonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonError::Json(e) => write!(f, "json: {}", e),
        }
    }
}

impl std::error::Error for CanonError {}

impl From<serde_json::Error> for CanonError {
    fn from(value: serde_json::Error) -> Self {
        CanonError::Json(value)
    }
}

/// Lowercase hex SHA-256 of `bytes`, 64 characters, no prefix.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// SHA-256 of `bytes` as a `sha256:<hex>` reference.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    format!("sha256:{}", sha256_hex(bytes))
}

pub fn canonical_json_bytes(v: &Value) -> Result<Vec<u8>, CanonError> {
    fn canonicalize_value(v: &Value) -> Value {
        match v {
            Value::Object(map) => {
                let mut keys: Vec<_> = map.iter().collect();
                keys.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = serde_json::Map::new();
                for (k, v) in keys {
                    out.insert(k.clone(), canonicalize_value(v));
                }
                Value::Object(out)
            }
            Value::Array(arr) => Value::Array(arr.iter().map(canonicalize_value).collect()),
            _ => v.clone(),
        }
    }

    let canon = canonicalize_value(v);
    Ok(serde_json::to_vec(&canon)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            sha256_bytes(b"abc"),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn canonical_bytes_ignore_key_order() {
        let a = serde_json::json!({"b": 2, "a": {"y": 1, "x": [3, 2]}});
        let b = serde_json::json!({"a": {"x": [3, 2], "y": 1}, "b": 2});
        assert_eq!(
            canonical_json_bytes(&a).unwrap(),
            canonical_json_bytes(&b).unwrap()
        );
    }
}
