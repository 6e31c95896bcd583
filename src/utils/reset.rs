use anyhow::Result;
use sha2::{Digest, Sha256};

/// Raw entropy per reset token; hex-encodes to 40 characters.
const RESET_TOKEN_BYTES: usize = 20;

/// Generate a password-reset token. Returns `(plaintext, digest)`: the
/// plaintext goes out by email and is never persisted, the SHA-256 hex
/// digest is what the user record stores.
pub fn generate_reset_token() -> Result<(String, String)> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| anyhow::anyhow!("Failed to gather reset-token entropy: {}", e))?;
    let plaintext = hex_encode(&bytes);
    let digest = hash_reset_token(&plaintext);
    Ok((plaintext, digest))
}

/// One-way digest of a plaintext reset token. Redemption re-hashes the
/// incoming token with this same function and compares digests.
pub fn hash_reset_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_is_40_hex_chars() {
        let (plaintext, _) = generate_reset_token().unwrap();
        assert_eq!(plaintext.len(), 40);
        assert!(plaintext.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_matches_rehash() {
        let (plaintext, digest) = generate_reset_token().unwrap();
        assert_eq!(hash_reset_token(&plaintext), digest);
        assert_ne!(plaintext, digest);
    }

    #[test]
    fn tokens_are_unique() {
        let (a, _) = generate_reset_token().unwrap();
        let (b, _) = generate_reset_token().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_sha256_hex() {
        // sha256("abc")
        assert_eq!(
            hash_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
