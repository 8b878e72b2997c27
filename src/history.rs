use crate::{
    config::HistoryConfig,
    error::{Result, StudioError},
    models::{GenerationRequest, HistoryEntry},
};
use chrono::{SubsecRound, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// String key-value store backing the prompt history.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Cache kept in a single JSON object file, one string value per key.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> Result<Map<String, Value>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(StudioError::StorageError(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StudioError::StorageError("cache lock poisoned".into()))?;
        let object = self.read_object()?;
        Ok(object.get(key).and_then(Value::as_str).map(String::from))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StudioError::StorageError("cache lock poisoned".into()))?;
        // An unreadable file is replaced rather than blocking every write.
        let mut object = self.read_object().unwrap_or_default();
        object.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&Value::Object(object))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| StudioError::StorageError("cache lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StudioError::StorageError("cache lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// How the last `load` went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Empty,
    Loaded(usize),
    /// Stored data could not be read or parsed and was treated as empty.
    Recovered,
}

/// Bounded, most-recent-first history of submitted requests.
pub struct PromptHistory {
    cache: Arc<dyn LocalCache>,
    key: String,
    capacity: usize,
    entries: Vec<HistoryEntry>,
    last_load: LoadStatus,
}

impl PromptHistory {
    pub fn new(cache: Arc<dyn LocalCache>, config: &HistoryConfig) -> Self {
        Self {
            cache,
            key: config.key.clone(),
            capacity: config.capacity.max(1),
            entries: Vec::new(),
            last_load: LoadStatus::Empty,
        }
    }

    /// Creates the store and loads whatever the cache holds.
    pub fn open(cache: Arc<dyn LocalCache>, config: &HistoryConfig) -> Self {
        let mut history = Self::new(cache, config);
        history.load();
        history
    }

    pub fn load(&mut self) -> LoadStatus {
        let status = match self.cache.get(&self.key) {
            Ok(None) => {
                self.entries.clear();
                LoadStatus::Empty
            }
            Ok(Some(raw)) => match parse_entries(&raw) {
                Ok(mut entries) => {
                    entries.truncate(self.capacity);
                    let count = entries.len();
                    self.entries = entries;
                    LoadStatus::Loaded(count)
                }
                Err(e) => {
                    log::warn!("Failed to parse history, starting empty: {}", e);
                    self.entries.clear();
                    LoadStatus::Recovered
                }
            },
            Err(e) => {
                log::warn!("Failed to read history, starting empty: {}", e);
                self.entries.clear();
                LoadStatus::Recovered
            }
        };
        self.last_load = status;
        status
    }

    pub fn last_load(&self) -> LoadStatus {
        self.last_load
    }

    pub fn persist(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.entries)?;
        self.cache.set(&self.key, &raw)
    }

    /// Prepends a new entry and trims to capacity. Persisting is best effort.
    pub fn record(&mut self, request: &GenerationRequest) -> HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::now_v7().to_string(),
            prompt: request.prompt.clone(),
            style: request.style,
            ratio: request.aspect_ratio,
            // stored with millisecond precision
            created_at: Utc::now().trunc_subsecs(3),
        };
        self.entries.insert(0, entry.clone());
        self.entries.truncate(self.capacity);

        if let Err(e) = self.persist() {
            log::warn!("Failed to persist prompt history: {}", e);
        }
        entry
    }

    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reuse(&self, id: &str) -> Option<GenerationRequest> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(HistoryEntry::to_request)
    }
}

pub fn parse_entries(raw: &str) -> Result<Vec<HistoryEntry>> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtStyle, AspectRatio};

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            style: ArtStyle::Watercolor,
            aspect_ratio: AspectRatio::Landscape4x3,
        }
    }

    fn memory_history() -> (Arc<MemoryCache>, PromptHistory) {
        let cache = Arc::new(MemoryCache::new());
        let history = PromptHistory::open(cache.clone(), &HistoryConfig::default());
        (cache, history)
    }

    #[test]
    fn test_eleven_records_keep_ten_newest_first() {
        let (_, mut history) = memory_history();
        for i in 0..11 {
            history.record(&request(&format!("prompt {}", i)));
        }

        let prompts: Vec<&str> = history.list().iter().map(|e| e.prompt.as_str()).collect();
        assert_eq!(prompts.len(), 10);
        assert_eq!(prompts[0], "prompt 10");
        assert_eq!(prompts[9], "prompt 1");
        assert!(!prompts.contains(&"prompt 0"));
    }

    #[test]
    fn test_ids_are_unique() {
        let (_, mut history) = memory_history();
        let a = history.record(&request("same"));
        let b = history.record(&request("same"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_list_is_stable_without_record() {
        let (_, mut history) = memory_history();
        history.record(&request("one"));
        history.record(&request("two"));
        assert_eq!(history.list().to_vec(), history.list().to_vec());
    }

    #[test]
    fn test_persist_round_trip_in_fresh_store() {
        let (cache, mut history) = memory_history();
        history.record(&request("first"));
        history.record(&request("second"));

        let reopened = PromptHistory::open(cache, &HistoryConfig::default());
        assert_eq!(reopened.last_load(), LoadStatus::Loaded(2));
        assert_eq!(reopened.list(), history.list());
    }

    #[test]
    fn test_corrupt_data_recovers_as_empty() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("prompt_history", "{not json").unwrap();

        let history = PromptHistory::open(cache, &HistoryConfig::default());
        assert_eq!(history.last_load(), LoadStatus::Recovered);
        assert!(history.is_empty());
    }

    #[test]
    fn test_persisted_format_uses_millisecond_timestamps() {
        let (cache, mut history) = memory_history();
        let entry = history.record(&request("a fox"));

        let raw = cache.get("prompt_history").unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["prompt"], "a fox");
        assert_eq!(value[0]["style"], "Watercolor");
        assert_eq!(value[0]["ratio"], "4:3");
        assert_eq!(
            value[0]["timestamp"].as_i64(),
            Some(entry.created_at.timestamp_millis())
        );
    }

    #[test]
    fn test_reuse_returns_original_parameters() {
        let (_, mut history) = memory_history();
        let entry = history.record(&request("a lighthouse"));

        let reused = history.reuse(&entry.id).unwrap();
        assert_eq!(reused, request("a lighthouse"));
        assert!(history.reuse("missing").is_none());
    }

    #[test]
    fn test_file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let config = HistoryConfig::default().with_path(&path);

        let mut history = PromptHistory::open(Arc::new(FileCache::new(&path)), &config);
        assert_eq!(history.last_load(), LoadStatus::Empty);
        history.record(&request("saved"));

        let reopened = PromptHistory::open(Arc::new(FileCache::new(&path)), &config);
        assert_eq!(reopened.list(), history.list());
    }

    #[test]
    fn test_file_cache_unparseable_file_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "garbage").unwrap();

        let mut history =
            PromptHistory::open(Arc::new(FileCache::new(&path)), &HistoryConfig::default());
        assert_eq!(history.last_load(), LoadStatus::Recovered);

        // writing replaces the broken file
        history.record(&request("fresh"));
        let reopened =
            PromptHistory::open(Arc::new(FileCache::new(&path)), &HistoryConfig::default());
        assert_eq!(reopened.len(), 1);
    }
}
