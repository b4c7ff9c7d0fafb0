//! Locally persisted set of dismissed milestone notifications.
//!
//! The state is a plain value with pure `load`, `merge` and `save`. Storage
//! lives behind [`KeyValueStore`] so the CLI can keep it in a file and tests
//! can keep it in memory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::KvError;

/// Key under which dismissed targets are stored.
pub const DISMISSAL_KEY: &str = "dismissed-congrats-targets";

/// Milestone targets whose crossing notification the user closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DismissalState {
    targets: BTreeSet<i64>,
}

impl DismissalState {
    /// Parse the stored JSON array.
    ///
    /// Missing or malformed input yields an empty state. Non-integer entries
    /// are skipped.
    #[must_use]
    pub fn load(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };

        match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            Ok(values) => Self {
                targets: values.iter().filter_map(json_integer).collect(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed dismissal state");
                Self::default()
            }
        }
    }

    /// JSON array of targets, ascending.
    #[must_use]
    pub fn save(&self) -> String {
        let values: Vec<i64> = self.targets.iter().copied().collect();
        serde_json::Value::from(values).to_string()
    }

    /// Union with another state.
    #[must_use]
    pub fn merge(mut self, other: &DismissalState) -> Self {
        self.targets.extend(other.targets.iter().copied());
        self
    }

    /// Returns `true` when the target was not already dismissed.
    pub fn insert(&mut self, target: i64) -> bool {
        self.targets.insert(target)
    }

    #[must_use]
    pub fn contains(&self, target: i64) -> bool {
        self.targets.contains(&target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Read the state from `store`; read failures are logged and yield empty.
    pub fn read_from<K: KeyValueStore + ?Sized>(store: &K) -> Self {
        match store.get(DISMISSAL_KEY) {
            Ok(raw) => Self::load(raw.as_deref()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read dismissal state");
                Self::default()
            }
        }
    }

    /// Persist the state to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] if the store cannot be written.
    pub fn write_to<K: KeyValueStore + ?Sized>(&self, store: &K) -> Result<(), KvError> {
        store.set(DISMISSAL_KEY, &self.save())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn json_integer(value: &serde_json::Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

/// String key-value storage for small client-side state.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`KvError`] if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Store `value` under `key`; durable when this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
}

/// One JSON object per file, keys mapping to string values.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> KvError {
        KvError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, KvError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "state file is not a JSON object of strings; starting fresh"
                );
                Ok(BTreeMap::new())
            }
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        let encoded = serde_json::to_string_pretty(&map)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut file = fs::File::create(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(encoded.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// In-process store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
