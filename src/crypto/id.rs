use rand::RngCore;
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("entropy source: {0}")]
    Entropy(String),
}

/// Source of unguessable identifiers (secret IDs, selector IDs, HMAC keys).
pub trait IdSource: Send + Sync {
    fn generate(&self) -> Result<String, IdError>;
}

/// Random v4 UUIDs drawn straight from the OS entropy source.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsIdSource;

impl IdSource for OsIdSource {
    fn generate(&self) -> Result<String, IdError> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| IdError::Entropy(e.to_string()))?;
        Ok(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
    }
}

/// 32 random bytes from the OS entropy source.
pub fn random_key() -> Result<[u8; 32], IdError> {
    let mut key = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|e| IdError::Entropy(e.to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_os_ids_are_uuids_and_unique() {
        let ids: HashSet<String> = (0..64).map(|_| OsIdSource.generate().unwrap()).collect();
        assert_eq!(ids.len(), 64);
        for id in &ids {
            let parsed = uuid::Uuid::parse_str(id).expect("must be a UUID");
            assert_eq!(parsed.get_version_num(), 4);
        }
    }

    #[test]
    fn test_random_key_not_zero() {
        assert_ne!(random_key().unwrap(), [0u8; 32]);
    }
}
