use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use std::path::{Path, PathBuf};

use super::{Storage, StorageError};

const NONCE_LEN: usize = 12;

/// One encrypted file per key: `dir/{hex(key)}.bin` holding `nonce || AES-256-GCM(value)`.
pub struct DiskStorage {
    seal_key: [u8; 32],
    dir: PathBuf,
}

impl DiskStorage {
    pub fn new(seal_key: [u8; 32], dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { seal_key, dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", hex::encode(key.as_bytes())))
    }

    fn cipher(&self) -> Result<Aes256Gcm, StorageError> {
        Aes256Gcm::new_from_slice(&self.seal_key).map_err(|e| StorageError::Encryption(e.to_string()))
    }
}

impl Storage for DiskStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let bytes = match std::fs::read(self.path_for(key)) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.len() < NONCE_LEN {
            return Err(StorageError::Corrupt(format!("entry {key:?} too short")));
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);

        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| StorageError::Encryption(e.to_string()))?;
        Ok(Some(plaintext))
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), value.as_slice())
            .map_err(|e| StorageError::Encryption(e.to_string()))?;

        let mut file_bytes = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        file_bytes.extend_from_slice(&nonce_bytes);
        file_bytes.extend_from_slice(&ciphertext);

        // Write-then-rename so a reader never sees a torn file.
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, file_bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Delete every stored entry in `dir`. Returns the number of files removed.
pub fn wipe(dir: &Path) -> Result<usize, StorageError> {
    let mut count = 0usize;
    if !dir.exists() {
        return Ok(0);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("tmp") => {
                std::fs::remove_file(&path)?;
                count += 1;
            }
            _ => {
                tracing::debug!(path = %path.display(), "Skipping non-entry file");
            }
        }
    }
    Ok(count)
}
