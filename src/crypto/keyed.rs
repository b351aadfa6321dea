use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `input` under `key`.
pub fn keyed_hash(key: &[u8], input: &str) -> Result<String, crate::Error> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| crate::Error::Crypto(e.to_string()))?;
    mac.update(input.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_hash_rfc4231_case_2() {
        let out = keyed_hash(b"Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            out,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_keyed_hash_depends_on_key() {
        let a = keyed_hash(b"key-a", "secret").unwrap();
        let b = keyed_hash(b"key-b", "secret").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, keyed_hash(b"key-a", "secret").unwrap());
        assert!(!a.contains("secret"));
    }
}
