//! Per-ancestor identity suffix.
//!
//! Every title published under an ancestor carries the same short token, so two
//! documentation trees sharing a store never collide on title.

use harsh::Harsh;

use crate::error::SyncError;

/// Prefix of every identity suffix.
pub const SUFFIX_SEPARATOR: &str = "___";

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz1234567890";
const MIN_HASH_LENGTH: usize = 4;
const SUFFIX_HASH_LENGTH: usize = 6;

/// Derive the identity suffix for `ancestor_id`.
///
/// The hex form of the identifier is hashed with the identifier itself as salt,
/// and the first six characters of the hash follow `SUFFIX_SEPARATOR`. Pure: the
/// same identifier always yields the same suffix.
pub fn derive_suffix(ancestor_id: &str) -> Result<String, SyncError> {
    if ancestor_id.is_empty() {
        return Err(SyncError::Identity("ancestor id is empty".to_string()));
    }

    let ancestor_hex = hex::encode(ancestor_id.as_bytes());

    let harsh = Harsh::builder()
        .salt(ancestor_id)
        .alphabet(ALPHABET)
        .length(MIN_HASH_LENGTH)
        .build()
        .map_err(|e| SyncError::Identity(format!("on new hash ids: {}", e)))?;

    let hash = harsh
        .encode_hex(&ancestor_hex)
        .map_err(|e| SyncError::Identity(format!("on encode ancestor hex: {}", e)))?;
    if hash.is_empty() {
        return Err(SyncError::Identity(format!(
            "empty hash for ancestor {:?}",
            ancestor_id
        )));
    }

    let short = hash.get(..SUFFIX_HASH_LENGTH).unwrap_or(&hash);
    Ok(format!("{}{}", SUFFIX_SEPARATOR, short))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_is_deterministic() {
        for id in ["123456", "98304", "65538", "ancestor with spaces"] {
            assert_eq!(derive_suffix(id).unwrap(), derive_suffix(id).unwrap());
        }
    }

    #[test]
    fn test_suffix_shape() {
        let suffix = derive_suffix("1234567").unwrap();
        let hash = suffix.strip_prefix(SUFFIX_SEPARATOR).unwrap();
        assert!(!hash.is_empty() && hash.len() <= SUFFIX_HASH_LENGTH);
        assert!(hash.chars().all(|c| ALPHABET.contains(c)));
    }

    #[test]
    fn test_distinct_ancestors_get_distinct_suffixes() {
        let ids: Vec<String> = (0..50).map(|i| format!("{}", 1_000_000 + i * 7919)).collect();
        let suffixes: std::collections::HashSet<String> =
            ids.iter().map(|id| derive_suffix(id).unwrap()).collect();
        // Sampled, not proven: allow for a stray collision in six base-36 characters.
        assert!(suffixes.len() >= ids.len() - 1);
    }

    #[test]
    fn test_empty_ancestor_is_rejected() {
        let err = derive_suffix("").unwrap_err();
        assert!(matches!(err, SyncError::Identity(_)));
    }
}
