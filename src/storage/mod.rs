pub mod disk;
pub mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

/// Key prefixes for the three record namespaces plus the process salt.
pub const BINDING_PREFIX: &str = "bindings/";
pub const SELECTOR_PREFIX: &str = "selector/";
pub const SECRET_ID_PREFIX: &str = "secret_id/";
pub const SALT_KEY: &str = "salt";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialize: {0}")]
    Serialization(String),
    #[error("Encrypt: {0}")]
    Encryption(String),
    #[error("Corrupt: {0}")]
    Corrupt(String),
}

/// Flat key -> blob store. Single-key operations only; nothing spans keys.
///
/// Calls may block on I/O. Async callers go through [`blocking`].
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// CBOR-encode `value` and store it under `key`.
pub fn put_cbor<T: serde::Serialize>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    storage.put(key, buf)
}

/// Load and CBOR-decode the value under `key`, if any.
pub fn get_cbor<T: serde::de::DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get(key)? {
        None => Ok(None),
        Some(bytes) => ciborium::from_reader(bytes.as_slice())
            .map(Some)
            .map_err(|e| StorageError::Serialization(e.to_string())),
    }
}

/// Run storage work on tokio's blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> crate::Result<T>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
