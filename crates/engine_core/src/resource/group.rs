// crates/engine_core/src/resource/group.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use super::types::ResourceType;
use super::DEFAULT_STORAGE;

/// A located resource kept around so that the next lookup is free.
pub(crate) struct CachedLocation {
    pub location: String,
    pub path: String,
    pub ty: Arc<dyn ResourceType>,
    pub time: Option<SystemTime>,
}

/// Ordered storages + cache of what was found in them.
pub(crate) struct ResourceGroup {
    pub name: String,
    pub storages: Vec<String>,
    pub cache: HashMap<String, CachedLocation>,
}

impl ResourceGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            storages: vec![DEFAULT_STORAGE.to_string()],
            cache: HashMap::new(),
        }
    }

    pub fn add_storage(&mut self, storage: &str, add_first: bool) {
        if add_first {
            self.storages.insert(0, storage.to_string());
        } else {
            self.storages.push(storage.to_string());
        }
        // Lookup order changed: anything cached may now be shadowed.
        self.cache.clear();
    }

    pub fn remove_storage(&mut self, storage: &str) -> bool {
        match self.storages.iter().position(|s| s == storage) {
            Some(index) => {
                self.storages.remove(index);
                self.cache.clear();
                true
            }
            None => false,
        }
    }

    pub fn has_storage(&self, storage: &str) -> bool {
        self.storages.iter().any(|s| s == storage)
    }
}
