use std::sync::{Arc, Mutex, MutexGuard};

use super::record::unix_now;
use super::{RemainingUses, SecretCredentialRecord, SecretIdPolicy};
use crate::config::SECRET_LOCK_SHARDS;
use crate::crypto::keyed_hash;
use crate::error::{Error, Result};
use crate::storage::{SECRET_ID_PREFIX, Storage, get_cbor, put_cbor};

/// Per-secret-ID usage state, stored under
/// `secret_id/{selector_id}/{HMAC(hmac_key, secret_id)}`.
pub struct SecretStore {
    storage: Arc<dyn Storage>,
    locks: Vec<Mutex<()>>,
}

impl SecretStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            locks: (0..SECRET_LOCK_SHARDS).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn register(
        &self,
        selector_id: &str,
        secret_id: &str,
        hmac_key: &str,
        policy: &SecretIdPolicy,
    ) -> Result<()> {
        self.register_at(selector_id, secret_id, hmac_key, policy, unix_now())
    }

    pub(crate) fn register_at(
        &self,
        selector_id: &str,
        secret_id: &str,
        hmac_key: &str,
        policy: &SecretIdPolicy,
        now: u64,
    ) -> Result<()> {
        let hashed = keyed_hash(hmac_key.as_bytes(), secret_id)?;
        let key = entry_key(selector_id, &hashed);
        let _guard = self.shard(&hashed);

        if self.storage.get(&key).map_err(Error::StorageRead)?.is_some() {
            return Err(Error::AlreadyRegistered);
        }
        let record = SecretCredentialRecord::new(policy, now);
        put_cbor(&*self.storage, &key, &record).map_err(Error::StorageWrite)?;
        tracing::debug!(selector_id, num_uses = policy.num_uses, "Secret ID registered");
        Ok(())
    }

    pub fn lookup(
        &self,
        selector_id: &str,
        secret_id: &str,
        hmac_key: &str,
    ) -> Result<Option<SecretCredentialRecord>> {
        let hashed = keyed_hash(hmac_key.as_bytes(), secret_id)?;
        get_cbor(&*self.storage, &entry_key(selector_id, &hashed)).map_err(Error::StorageRead)
    }

    /// Spend one use of the secret ID. The record is deleted when its last
    /// use is spent or when it is found expired.
    pub fn consume_if_valid(
        &self,
        selector_id: &str,
        secret_id: &str,
        hmac_key: &str,
    ) -> Result<RemainingUses> {
        self.consume_at(selector_id, secret_id, hmac_key, unix_now())
    }

    pub(crate) fn consume_at(
        &self,
        selector_id: &str,
        secret_id: &str,
        hmac_key: &str,
        now: u64,
    ) -> Result<RemainingUses> {
        let hashed = keyed_hash(hmac_key.as_bytes(), secret_id)?;
        let key = entry_key(selector_id, &hashed);
        let _guard = self.shard(&hashed);

        let mut record: SecretCredentialRecord = get_cbor(&*self.storage, &key)
            .map_err(Error::StorageRead)?
            .ok_or(Error::NotFound)?;

        if record.is_expired_at(now) {
            self.storage.delete(&key).map_err(Error::StorageWrite)?;
            tracing::info!(selector_id, "Expired secret ID removed");
            return Err(Error::Expired);
        }

        match record.secret_id_num_uses {
            0 => Ok(RemainingUses::Unlimited),
            1 => {
                self.storage.delete(&key).map_err(Error::StorageWrite)?;
                tracing::debug!(selector_id, "Secret ID used up");
                Ok(RemainingUses::Limited(0))
            }
            n => {
                record.secret_id_num_uses = n - 1;
                record.last_updated_time = now;
                put_cbor(&*self.storage, &key, &record).map_err(Error::StorageWrite)?;
                Ok(RemainingUses::Limited(n - 1))
            }
        }
    }

    pub fn delete(&self, selector_id: &str, secret_id: &str, hmac_key: &str) -> Result<()> {
        let hashed = keyed_hash(hmac_key.as_bytes(), secret_id)?;
        let _guard = self.shard(&hashed);
        self.storage
            .delete(&entry_key(selector_id, &hashed))
            .map_err(Error::StorageWrite)
    }

    fn shard(&self, hashed: &str) -> MutexGuard<'_, ()> {
        let idx = hashed
            .get(..2)
            .and_then(|b| usize::from_str_radix(b, 16).ok())
            .unwrap_or(0)
            % self.locks.len();
        // Guards protect no data, so a poisoned shard is still usable.
        self.locks[idx].lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn entry_key(selector_id: &str, hashed: &str) -> String {
    format!("{SECRET_ID_PREFIX}{selector_id}/{hashed}")
}
