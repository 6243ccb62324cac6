use rand::{rngs::OsRng, RngCore};

/// Length of an issued token key, in hex characters.
pub const TOKEN_KEY_LEN: usize = 40;

/// Opaque bearer key: 20 random bytes, hex encoded.
pub fn generate_key() -> String {
    let mut raw = [0u8; TOKEN_KEY_LEN / 2];
    OsRng.fill_bytes(&mut raw);
    raw.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_forty_hex_chars() {
        let key = generate_key();
        assert_eq!(key.len(), TOKEN_KEY_LEN);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn keys_are_unique() {
        assert_ne!(generate_key(), generate_key());
    }
}
