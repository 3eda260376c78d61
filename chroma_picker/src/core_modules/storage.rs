// THEORY:
// Durable state is a flat key -> string map, the same shape a browser's local
// storage has. The collection and the theme each own one key and serialize their
// own values; the storage layer only moves strings.
//
// `JsonFileStorage` keeps the whole map in one JSON object on disk. Every write
// rewrites the document through a temp file and a rename, so a crash mid-write
// leaves the previous document intact. A document that no longer parses is reported
// on read; the next write moves it aside and starts a fresh one.
// `MemoryStorage` is the session-only variant.

use crate::error::StorageError;
use log::warn;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A process-external key-value store for string values.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory storage. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON object file holding every key.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Points at `path`; the file and its parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_document(&self) -> Result<Map<String, Value>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// The document to modify on a write. An unparseable document is moved to
    /// `<name>.json.corrupt` and replaced by an empty one.
    fn document_for_write(&self) -> Result<Map<String, Value>, StorageError> {
        match self.read_document() {
            Err(StorageError::Json(e)) => {
                let aside = self.path.with_extension("json.corrupt");
                warn!(
                    "storage document {} is corrupt ({e}), moving it to {}",
                    self.path.display(),
                    aside.display()
                );
                fs::rename(&self.path, &aside).map_err(|e| self.io_error(e))?;
                Ok(Map::new())
            }
            other => other,
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let text = serde_json::to_string_pretty(document)?;
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, text).map_err(|e| self.io_error(e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let document = self.read_document()?;
        Ok(match document.get(key) {
            Some(Value::String(value)) => Some(value.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut document = self.document_for_write()?;
        document.insert(key.to_string(), Value::String(value.to_string()));
        self.write_document(&document)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut document = self.document_for_write()?;
        if document.remove(key).is_some() {
            self.write_document(&document)?;
        }
        Ok(())
    }
}
