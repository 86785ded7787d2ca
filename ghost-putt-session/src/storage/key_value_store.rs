use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// String key/value persistence. Implementations log failures instead of
/// returning them; a broken store only costs the saved values.
pub trait KeyValueStore: Send + Sync {
    fn save(&self, key: &str, value: &str);
    fn get(&self, key: &str) -> Option<String>;
    fn clear(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn save(&self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    fn clear(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// All keys in one JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Loads `path` if it exists. An unreadable or corrupt file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring corrupt store {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read store {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) {
        let Ok(mut entries) = self.entries.lock() else {
            warn!("Store {} is poisoned", self.path.display());
            return;
        };
        change(&mut entries);

        let text = match serde_json::to_string_pretty(&*entries) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize store: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, text) {
            warn!("Failed to write store {}: {}", self.path.display(), e);
        }
    }
}

impl KeyValueStore for FileStore {
    fn save(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        });
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn clear(&self, key: &str) {
        self.update(|entries| {
            entries.remove(key);
        });
    }
}
