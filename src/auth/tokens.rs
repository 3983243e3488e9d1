use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Opaque refresh credential: 32 random bytes, base64 for transport.
pub fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Only the SHA-256 of the token is ever stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_refresh_token(), generate_refresh_token());
    }

    #[test]
    fn hash_is_stable() {
        let tok = generate_refresh_token();
        assert_eq!(hash_token(&tok), hash_token(&tok));
        assert_ne!(hash_token(&tok), tok);
    }
}
