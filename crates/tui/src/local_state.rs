use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use api_types::ledger::CsvStyle;
use engine::FilterState;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const KEY_BASE_URL: &str = "BASE_URL";
pub const KEY_TOKEN: &str = "TOKEN";
pub const KEY_REFRESH_TOKEN: &str = "REFRESH_TOKEN";
pub const KEY_FILTERS: &str = "FILTROS";
pub const KEY_LEDGER_ID: &str = "LEDGER_ID";
pub const KEY_CSV_STYLE: &str = "CSV_STYLE";
pub const KEY_UI_FLAGS: &str = "UI_FLAGS";

/// String key/value persistence. Last write wins.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, used by tests and one-shot commands.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten after every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = Path::new(&self.path).parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Dashboard display toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiFlags {
    pub show_id: bool,
}

impl Default for UiFlags {
    fn default() -> Self {
        Self { show_id: true }
    }
}

/// Typed view over a [`KeyValueStore`].
///
/// Structured values are stored as JSON; a value that no longer parses
/// reads as absent.
#[derive(Debug)]
pub struct LocalState<S> {
    store: S,
}

impl<S: KeyValueStore> LocalState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn base_url(&self) -> Option<String> {
        self.text(KEY_BASE_URL)
    }

    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        self.set_text(KEY_BASE_URL, base_url)
    }

    pub fn token(&self) -> Option<String> {
        self.text(KEY_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.text(KEY_REFRESH_TOKEN)
    }

    /// Stores both tokens. An empty refresh token keeps the stored one.
    pub fn set_tokens(&mut self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.set_text(KEY_TOKEN, access_token)?;
        if !refresh_token.is_empty() {
            self.set_text(KEY_REFRESH_TOKEN, refresh_token)?;
        }
        Ok(())
    }

    pub fn set_access_token(&mut self, access_token: &str) -> Result<()> {
        self.set_text(KEY_TOKEN, access_token)
    }

    pub fn clear_tokens(&mut self) -> Result<()> {
        self.store.remove(KEY_TOKEN)?;
        self.store.remove(KEY_REFRESH_TOKEN)
    }

    /// Stored filters, `None` when absent or unreadable.
    pub fn filters(&self) -> Option<FilterState> {
        self.json::<FilterState>(KEY_FILTERS)
            .map(FilterState::sanitized)
    }

    pub fn set_filters(&mut self, filters: &FilterState) -> Result<()> {
        self.store
            .set(KEY_FILTERS, serde_json::to_string(filters)?)
    }

    pub fn ledger_id(&self) -> Option<String> {
        self.text(KEY_LEDGER_ID)
    }

    pub fn set_ledger_id(&mut self, ledger_id: &str) -> Result<()> {
        self.set_text(KEY_LEDGER_ID, ledger_id)
    }

    /// Stored as the bare `br`/`us` label.
    pub fn csv_style(&self) -> Option<CsvStyle> {
        match self.text(KEY_CSV_STYLE)?.to_ascii_lowercase().as_str() {
            "br" => Some(CsvStyle::Br),
            "us" => Some(CsvStyle::Us),
            _ => None,
        }
    }

    pub fn set_csv_style(&mut self, style: CsvStyle) -> Result<()> {
        self.set_text(KEY_CSV_STYLE, style.as_str())
    }

    pub fn ui_flags(&self) -> UiFlags {
        self.json(KEY_UI_FLAGS).unwrap_or_default()
    }

    pub fn set_ui_flags(&mut self, flags: UiFlags) -> Result<()> {
        self.store.set(KEY_UI_FLAGS, serde_json::to_string(&flags)?)
    }

    fn text(&self, key: &str) -> Option<String> {
        self.store
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn set_text(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return self.store.remove(key);
        }
        self.store.set(key, value.to_string())
    }

    fn json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("ignoring corrupt {key} in local state: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("extrato_tui_{}_{name}", std::process::id()))
            .join("state.json")
    }

    #[test]
    fn tokens_round_trip_and_clear() {
        let mut state = LocalState::new(MemoryStore::default());
        state.set_tokens("access", "refresh").unwrap();
        state.set_tokens("access-2", "").unwrap();
        assert_eq!(state.token().as_deref(), Some("access-2"));
        assert_eq!(state.refresh_token().as_deref(), Some("refresh"));

        state.clear_tokens().unwrap();
        assert_eq!(state.token(), None);
        assert_eq!(state.refresh_token(), None);
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        let mut store = MemoryStore::default();
        store.set(KEY_FILTERS, "{not json".to_string()).unwrap();
        store.set(KEY_CSV_STYLE, "eu".to_string()).unwrap();
        store.set(KEY_UI_FLAGS, "[]".to_string()).unwrap();
        let state = LocalState::new(store);
        assert_eq!(state.filters(), None);
        assert_eq!(state.csv_style(), None);
        assert_eq!(state.ui_flags(), UiFlags::default());
    }

    #[test]
    fn blank_text_removes_key() {
        let mut state = LocalState::new(MemoryStore::default());
        state.set_ledger_id("12").unwrap();
        state.set_ledger_id("  ").unwrap();
        assert_eq!(state.ledger_id(), None);
    }

    #[test]
    fn file_store_persists_between_opens() {
        let path = temp_path("persist");
        let _ = fs::remove_file(&path);

        let mut state = LocalState::new(JsonFileStore::open(&path).unwrap());
        let mut filters = FilterState::default();
        filters.set_kind("CREDITO");
        state.set_filters(&filters).unwrap();
        state.set_csv_style(CsvStyle::Us).unwrap();
        state.set_base_url("http://api.local").unwrap();

        let reopened = LocalState::new(JsonFileStore::open(&path).unwrap());
        assert_eq!(reopened.filters().unwrap().kind, "CREDITO");
        assert_eq!(reopened.csv_style(), Some(CsvStyle::Us));
        assert_eq!(reopened.base_url().as_deref(), Some("http://api.local"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_is_empty() {
        let state = LocalState::new(JsonFileStore::open(temp_path("missing")).unwrap());
        assert_eq!(state.token(), None);
        assert_eq!(state.filters(), None);
    }
}
