use std::collections::HashMap;
use std::sync::Mutex;

use super::{Storage, StorageError};

/// In-process storage backend.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic mid-insert cannot leave a HashMap half-written, so poisoning is ignored.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let storage = MemoryStorage::new();
        assert!(storage.get("a").unwrap().is_none());

        storage.put("a", b"one".to_vec()).unwrap();
        storage.put("b", b"two".to_vec()).unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some(&b"one"[..]));
        assert_eq!(storage.keys(), vec!["a".to_string(), "b".to_string()]);

        storage.delete("a").unwrap();
        assert!(storage.get("a").unwrap().is_none());
        assert_eq!(storage.len(), 1);

        // Deleting again is fine
        storage.delete("a").unwrap();
    }

    #[test]
    fn test_cbor_helpers() {
        let storage = MemoryStorage::new();
        super::super::put_cbor(&storage, "k", &vec!["x".to_string(), "y".to_string()]).unwrap();
        let back: Option<Vec<String>> = super::super::get_cbor(&storage, "k").unwrap();
        assert_eq!(back, Some(vec!["x".to_string(), "y".to_string()]));

        storage.put("bad", b"\xff\xff".to_vec()).unwrap();
        let res: Result<Option<Vec<String>>, _> = super::super::get_cbor(&storage, "bad");
        assert!(matches!(res, Err(StorageError::Serialization(_))));
    }
}
