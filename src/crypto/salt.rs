use super::{id, keyed_hash};
use crate::error::{Error, Result};
use crate::storage::{SALT_KEY, Storage};

/// Process-wide secret used to derive storage names from secret IDs.
#[derive(Clone)]
pub struct Salt {
    key: [u8; 32],
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Salt(..)")
    }
}

impl Salt {
    pub fn from_key(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Read the salt persisted under `salt`, generating and storing one on first use.
    pub fn load_or_create(storage: &dyn Storage) -> Result<Self> {
        if let Some(bytes) = storage.get(SALT_KEY).map_err(Error::StorageRead)? {
            let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                Error::StorageRead(crate::storage::StorageError::Corrupt(format!(
                    "salt is {} bytes, expected 32",
                    bytes.len()
                )))
            })?;
            return Ok(Self { key });
        }

        let key = id::random_key().map_err(|source| Error::IdentifierGeneration {
            what: "salt",
            source,
        })?;
        storage.put(SALT_KEY, key.to_vec()).map_err(Error::StorageWrite)?;
        tracing::info!("Generated new storage salt");
        Ok(Self { key })
    }

    /// One-way, salted name for `id`. Lower-case hex.
    pub fn salt_id(&self, id: &str) -> Result<String> {
        keyed_hash(&self.key, id)
    }
}
