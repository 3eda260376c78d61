// THEORY:
// The `ColorStore` owns the user's collection of saved colors. It is the single
// writer for that collection and the only code that touches the `savedColors` key.
//
// Key architectural principles:
// 1.  **Explicit ownership**: the store is built once, from its storage, before any
//     consumer exists. Consumers hold the store itself, never an ambient handle, so
//     there is no "used before it was provided" state to detect.
// 2.  **Newest first**: `save` prepends. Ids are UUID v4 strings assigned at save time
//     and never reused within a collection.
// 3.  **Mirror on every mutation**: `save`, `delete` and `clear` write through to
//     storage before returning the new collection. Rehydration happens exactly once,
//     in `open`.
// 4.  **Memory is authoritative**: if storage fails, the mutation still happens in
//     memory, the failure is logged, and the store reports degraded persistence.
// 5.  **Records are re-derived**: a stored record's hex is its source of truth. On
//     load, rgb and name are recomputed from it, and records with an unparseable hex
//     or a duplicate id are dropped.

use crate::config::SAVED_COLORS_KEY;
use crate::core_modules::channel::channel::ChannelTriple;
use crate::core_modules::color_info::ColorInfo;
use crate::core_modules::storage::KeyValueStorage;
use crate::error::StorageError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// A color the user explicitly saved. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedColor {
    #[serde(flatten)]
    color: ColorInfo,
    id: String,
    timestamp: Timestamp,
}

impl SavedColor {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn color(&self) -> &ColorInfo {
        &self.color
    }

    pub fn hex(&self) -> &str {
        self.color.hex()
    }
}

/// The on-disk shape of one record. Only `hex`, `id` and `timestamp` are trusted.
#[derive(Debug, Deserialize)]
struct StoredRecord {
    hex: String,
    id: String,
    timestamp: Timestamp,
}

impl StoredRecord {
    fn into_saved(self) -> Option<SavedColor> {
        let triple = ChannelTriple::from_hex(&self.hex).ok()?;
        Some(SavedColor {
            color: ColorInfo::from(triple),
            id: self.id,
            timestamp: self.timestamp,
        })
    }
}

/// The process-wide saved-color collection, mirrored to `S`.
#[derive(Debug)]
pub struct ColorStore<S: KeyValueStorage> {
    storage: S,
    saved: Vec<SavedColor>,
    degraded: bool,
}

impl<S: KeyValueStorage> ColorStore<S> {
    /// Builds the store and rehydrates the collection from `storage`.
    pub fn open(storage: S) -> Self {
        let mut store = Self {
            storage,
            saved: Vec::new(),
            degraded: false,
        };
        match store.storage.get(SAVED_COLORS_KEY) {
            Ok(Some(text)) => store.saved = Self::decode(&text),
            Ok(None) => {}
            Err(e) => {
                warn!("saved colors unavailable, continuing with an empty collection: {e}");
                store.degraded = true;
            }
        }
        debug!("rehydrated {} saved colors", store.saved.len());
        store
    }

    fn decode(text: &str) -> Vec<SavedColor> {
        let records: Vec<Value> = match serde_json::from_str(text) {
            Ok(records) => records,
            Err(e) => {
                warn!("ignoring unreadable saved colors: {e}");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut saved = Vec::with_capacity(records.len());
        for record in records {
            let parsed = serde_json::from_value::<StoredRecord>(record)
                .ok()
                .and_then(StoredRecord::into_saved);
            match parsed {
                Some(color) if seen.insert(color.id.clone()) => saved.push(color),
                Some(color) => warn!("dropping saved color with duplicate id {}", color.id),
                None => warn!("dropping malformed saved color record"),
            }
        }
        saved
    }

    /// The collection, newest first.
    pub fn saved(&self) -> &[SavedColor] {
        &self.saved
    }

    pub fn get(&self, id: &str) -> Option<&SavedColor> {
        self.saved.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// `true` when the last storage access failed and changes live only in memory.
    pub fn persistence_degraded(&self) -> bool {
        self.degraded
    }

    /// Saves `color` as a new record at the front of the collection.
    pub fn save(&mut self, color: &ColorInfo) -> &[SavedColor] {
        let mut id = uuid::Uuid::new_v4().to_string();
        while self.get(&id).is_some() {
            id = uuid::Uuid::new_v4().to_string();
        }
        let record = SavedColor {
            color: color.clone(),
            id,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        debug!("saving {} as {}", record.hex(), record.id);
        self.saved.insert(0, record);
        self.persist();
        &self.saved
    }

    /// Removes the record with `id`. Unknown ids change nothing.
    pub fn delete(&mut self, id: &str) -> &[SavedColor] {
        let before = self.saved.len();
        self.saved.retain(|c| c.id != id);
        if self.saved.len() != before {
            self.persist();
        }
        &self.saved
    }

    /// Empties the collection and removes the storage key.
    pub fn clear(&mut self) -> &[SavedColor] {
        self.saved.clear();
        let result = self.storage.remove(SAVED_COLORS_KEY);
        self.record_outcome(result);
        &self.saved
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.saved)
            .map_err(StorageError::from)
            .and_then(|text| self.storage.set(SAVED_COLORS_KEY, &text));
        self.record_outcome(result);
    }

    fn record_outcome(&mut self, result: Result<(), StorageError>) {
        match result {
            Ok(()) => self.degraded = false,
            Err(e) => {
                warn!("saved colors kept in memory only: {e}");
                self.degraded = true;
            }
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::storage::MemoryStorage;

    fn info(r: u8, g: u8, b: u8) -> ColorInfo {
        ColorInfo::from(ChannelTriple::new(r, g, b))
    }

    /// Storage whose writes always fail.
    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[test]
    fn saves_are_newest_first_with_distinct_ids() {
        let mut store = ColorStore::open(MemoryStorage::new());
        let color_a = info(255, 0, 0);
        let color_b = info(0, 0, 255);
        store.save(&color_a);
        let saved = store.save(&color_b);

        assert_eq!(saved[0].hex(), color_b.hex());
        assert_eq!(saved[1].hex(), color_a.hex());
        assert_ne!(saved[0].id(), saved[1].id());

        for _ in 0..50 {
            store.save(&color_a);
        }
        let ids: HashSet<_> = store.saved().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids.len(), store.len());
    }

    #[test]
    fn delete_removes_exactly_one_and_keeps_order() {
        let mut store = ColorStore::open(MemoryStorage::new());
        for level in [10u8, 20, 30, 40] {
            store.save(&info(level, level, level));
        }
        let victim = store.saved()[1].id().to_string();
        let remaining: Vec<String> = store
            .delete(&victim)
            .iter()
            .map(|c| c.hex().to_string())
            .collect();
        assert_eq!(remaining, ["#282828", "#141414", "#0a0a0a"]);

        let before = store.saved().to_vec();
        store.delete("no-such-id");
        assert_eq!(store.saved(), before.as_slice());
    }

    #[test]
    fn clear_empties_memory_and_storage() {
        let mut store = ColorStore::open(MemoryStorage::new());
        store.save(&info(1, 2, 3));
        assert!(store.storage().get(SAVED_COLORS_KEY).unwrap().is_some());
        assert!(store.clear().is_empty());
        assert_eq!(store.storage().get(SAVED_COLORS_KEY).unwrap(), None);
    }

    #[test]
    fn every_mutation_is_mirrored_and_rehydrated() {
        let mut store = ColorStore::open(MemoryStorage::new());
        store.save(&info(255, 0, 0));
        store.save(&info(0, 255, 0));
        let first_id = store.saved()[1].id().to_string();
        store.delete(&first_id);

        let reopened = ColorStore::open(store.storage().clone());
        assert_eq!(reopened.saved(), store.saved());
        assert_eq!(reopened.saved()[0].hex(), "#00ff00");
    }

    #[test]
    fn stored_shape_matches_the_record_layout() {
        let mut store = ColorStore::open(MemoryStorage::new());
        store.save(&info(255, 0, 0));
        let text = store.storage().get(SAVED_COLORS_KEY).unwrap().unwrap();
        let records: Vec<Value> = serde_json::from_str(&text).unwrap();
        let record = records[0].as_object().unwrap();
        assert_eq!(record["hex"], "#ff0000");
        assert_eq!(record["rgb"], "rgb(255, 0, 0)");
        assert_eq!(record["name"], "Red");
        assert!(record["id"].is_string());
        assert!(record["timestamp"].is_i64());
    }

    #[test]
    fn rehydration_drops_bad_and_duplicate_records() {
        let mut storage = MemoryStorage::new();
        let text = serde_json::json!([
            { "hex": "#FF0000", "rgb": "stale", "name": "Whatever", "id": "a", "timestamp": 2 },
            { "hex": "nope", "rgb": "", "id": "b", "timestamp": 1 },
            { "hex": "#00ff00", "rgb": "", "id": "a", "timestamp": 0 },
            { "rgb": "rgb(0, 0, 0)", "id": "c", "timestamp": 0 }
        ])
        .to_string();
        storage.set(SAVED_COLORS_KEY, &text).unwrap();

        let store = ColorStore::open(storage);
        assert_eq!(store.len(), 1);
        let only = &store.saved()[0];
        assert_eq!(only.id(), "a");
        assert_eq!(only.hex(), "#ff0000");
        assert_eq!(only.color().rgb(), "rgb(255, 0, 0)");
    }

    #[test]
    fn unreadable_collection_starts_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(SAVED_COLORS_KEY, "{{{").unwrap();
        assert!(ColorStore::open(storage).is_empty());
    }

    #[test]
    fn storage_failures_degrade_to_memory_only() {
        let mut store = ColorStore::open(BrokenStorage);
        assert!(store.persistence_degraded());

        store.save(&info(9, 9, 9));
        store.save(&info(8, 8, 8));
        assert_eq!(store.len(), 2);
        assert!(store.persistence_degraded());

        let id = store.saved()[0].id().to_string();
        assert_eq!(store.delete(&id).len(), 1);
        assert!(store.clear().is_empty());
    }
}
