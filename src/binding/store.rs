use std::sync::Arc;
use tokio::sync::RwLock;

use super::{BindingType, CompositeBindingRecord, SelectorEntry, SelectorRegistry};
use crate::error::{Error, Result};
use crate::storage::{BINDING_PREFIX, Storage, blocking, get_cbor, put_cbor};

/// Composite bindings keyed by derived name, plus the selector index that
/// points back at them.
///
/// Every read takes `lock` shared and every write takes it exclusive, so a
/// reader never observes a binding whose selector entry has not been written
/// yet by the same `set`.
pub struct BindingStore {
    storage: Arc<dyn Storage>,
    selectors: SelectorRegistry,
    lock: Arc<RwLock<()>>,
}

impl BindingStore {
    pub fn new(storage: Arc<dyn Storage>, lock: Arc<RwLock<()>>) -> Self {
        Self {
            selectors: SelectorRegistry::new(storage.clone()),
            storage,
            lock,
        }
    }

    pub fn selectors(&self) -> &SelectorRegistry {
        &self.selectors
    }

    /// Write the binding under `bindings/{lowercase(name)}` and then its
    /// selector entry.
    ///
    /// There is no rollback: if the selector write fails the binding stays
    /// behind without a selector pointing at it.
    pub async fn set(&self, name: &str, record: &CompositeBindingRecord) -> Result<()> {
        if name.is_empty() {
            return Err(Error::MissingName);
        }
        let name = name.to_lowercase();
        let storage = self.storage.clone();
        let selectors = self.selectors.clone();
        let record = record.clone();

        let _guard = self.lock.write().await;
        blocking(move || write_binding(&*storage, &selectors, name, &record)).await
    }

    pub async fn get(&self, name: &str) -> Result<Option<CompositeBindingRecord>> {
        if name.is_empty() {
            return Err(Error::MissingName);
        }
        let key = binding_key(&name.to_lowercase());
        let storage = self.storage.clone();

        let _guard = self.lock.read().await;
        blocking(move || get_cbor(&*storage, &key).map_err(Error::StorageRead)).await
    }

    /// Remove the binding entry only. The selector entry and any secret ID
    /// records are left alone.
    pub async fn delete(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::MissingName);
        }
        let key = binding_key(&name.to_lowercase());
        let storage = self.storage.clone();

        let _guard = self.lock.write().await;
        blocking(move || storage.delete(&key).map_err(Error::StorageWrite)).await
    }
}

fn write_binding(
    storage: &dyn Storage,
    selectors: &SelectorRegistry,
    name: String,
    record: &CompositeBindingRecord,
) -> Result<()> {
    put_cbor(storage, &binding_key(&name), record).map_err(Error::StorageWrite)?;

    let selector_id = &record.selector_id;
    let entry = SelectorEntry {
        binding_type: BindingType::Composite,
        binding_name: name,
    };
    if let Err(e) = selectors.register(selector_id, &entry) {
        tracing::error!(
            binding = %entry.binding_name,
            %selector_id,
            error = %e,
            "Selector registration failed; binding is orphaned"
        );
        return Err(e);
    }
    tracing::debug!(binding = %entry.binding_name, %selector_id, "Binding stored");
    Ok(())
}

fn binding_key(name: &str) -> String {
    format!("{BINDING_PREFIX}{name}")
}
