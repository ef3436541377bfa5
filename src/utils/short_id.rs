//! ShortId generation and shape validation.

use rand::Rng;

pub const SHORT_ID_LEN: usize = 8;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws a fresh 8-character id uniformly from `A-Z0-9`.
pub fn generate_short_id() -> String {
    let mut rng = rand::rng();
    (0..SHORT_ID_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `candidate` matches `^[A-Z0-9]{8}$`.
///
/// Public lookups check this before touching the store.
pub fn is_valid_short_id(candidate: &str) -> bool {
    candidate.len() == SHORT_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_have_valid_shape() {
        for _ in 0..1000 {
            let id = generate_short_id();
            assert!(is_valid_short_id(&id), "bad id {}", id);
        }
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_short_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        assert!(is_valid_short_id("ABCD1234"));
        assert!(!is_valid_short_id("abcd1234"));
        assert!(!is_valid_short_id("ABCD123"));
        assert!(!is_valid_short_id("ABCD12345"));
        assert!(!is_valid_short_id("ABCD-234"));
        assert!(!is_valid_short_id("ÀBCD1234"));
        assert!(!is_valid_short_id(""));
    }
}
