//! Browser LocalStorage store (WASM only)

use web_sys::Storage;

use super::{KeyValueStore, keys};
use crate::error::StorageError;

/// LocalStorage key prefix, keeps game keys apart from anything else on the origin
const PREFIX: &str = "geocoin_";

pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn open() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }

    fn item(key: &str) -> String {
        format!("{PREFIX}{key}")
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(&Self::item(key))
            .map_err(|_| StorageError::Unavailable)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // set_item throws QuotaExceededError when the origin is full
        self.storage
            .set_item(&Self::item(key), value)
            .map_err(|_| StorageError::WriteRejected(key.to_string()))
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        for key in keys::ALL {
            self.storage
                .remove_item(&Self::item(key))
                .map_err(|_| StorageError::Unavailable)?;
        }
        log::info!("Saved game cleared");
        Ok(())
    }
}
