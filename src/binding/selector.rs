use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{SELECTOR_PREFIX, Storage, get_cbor, put_cbor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingType {
    /// Ad-hoc union of apps and groups.
    Composite,
}

/// Reverse index from a selector ID to the binding it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorEntry {
    pub binding_type: BindingType,
    pub binding_name: String,
}

#[derive(Clone)]
pub struct SelectorRegistry {
    storage: Arc<dyn Storage>,
}

impl SelectorRegistry {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Upsert the mapping for `selector_id`.
    pub fn register(&self, selector_id: &str, entry: &SelectorEntry) -> Result<()> {
        if selector_id.is_empty() {
            return Err(Error::MissingName);
        }
        put_cbor(&*self.storage, &selector_key(selector_id), entry).map_err(Error::StorageWrite)
    }

    pub fn resolve(&self, selector_id: &str) -> Result<Option<SelectorEntry>> {
        if selector_id.is_empty() {
            return Ok(None);
        }
        get_cbor(&*self.storage, &selector_key(selector_id)).map_err(Error::StorageRead)
    }

    pub fn delete(&self, selector_id: &str) -> Result<()> {
        if selector_id.is_empty() {
            return Err(Error::MissingName);
        }
        self.storage
            .delete(&selector_key(selector_id))
            .map_err(Error::StorageWrite)
    }
}

fn selector_key(selector_id: &str) -> String {
    format!("{SELECTOR_PREFIX}{selector_id}")
}
