use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Content of one loaded data file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataValue {
    /// Parsed contents of a `.json` file.
    Json(JsonValue),
    /// Verbatim contents of any other file.
    Text(String),
}

impl DataValue {
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            DataValue::Json(value) => Some(value),
            DataValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(text) => Some(text),
            DataValue::Json(_) => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            DataValue::Json(value) => value.clone(),
            DataValue::Text(text) => JsonValue::String(text.clone()),
        }
    }
}

/// Loaded data files keyed by absolute path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataStore {
    entries: BTreeMap<PathBuf, DataValue>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, path: PathBuf, value: DataValue) -> Option<DataValue> {
        self.entries.insert(path, value)
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&DataValue> {
        self.entries.get(path.as_ref())
    }

    pub fn json(&self, path: impl AsRef<Path>) -> Option<&JsonValue> {
        self.get(path).and_then(DataValue::as_json)
    }

    pub fn text(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.get(path).and_then(DataValue::as_text)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &DataValue)> {
        self.entries.iter()
    }

    /// Entries whose file stem equals `stem`, e.g. `users` for `users.json`.
    pub fn find_by_stem<'a>(
        &'a self,
        stem: &'a str,
    ) -> impl Iterator<Item = (&'a PathBuf, &'a DataValue)> + 'a {
        self.entries
            .iter()
            .filter(move |(path, _)| path.file_stem().and_then(|s| s.to_str()) == Some(stem))
    }

    /// Whole store as a JSON object keyed by path string.
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .entries
            .iter()
            .map(|(path, value)| (path.to_string_lossy().into_owned(), value.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_accessors_match_variant() {
        let mut store = DataStore::new();
        store.insert(PathBuf::from("/d/a.json"), DataValue::Json(json!({"x": 1})));
        store.insert(PathBuf::from("/d/notes.txt"), DataValue::Text("hello".into()));

        assert_eq!(store.json("/d/a.json"), Some(&json!({"x": 1})));
        assert_eq!(store.text("/d/a.json"), None);
        assert_eq!(store.text("/d/notes.txt"), Some("hello"));
        assert_eq!(store.json("/d/notes.txt"), None);
        assert!(store.get("/d/missing").is_none());
    }

    #[test]
    fn find_by_stem_ignores_extension() {
        let mut store = DataStore::new();
        store.insert(PathBuf::from("/d/users.json"), DataValue::Json(json!([])));
        store.insert(PathBuf::from("/d/users.txt"), DataValue::Text(String::new()));
        store.insert(PathBuf::from("/d/groups.json"), DataValue::Json(json!([])));

        let found: Vec<_> = store.find_by_stem("users").map(|(p, _)| p.clone()).collect();
        assert_eq!(
            found,
            vec![PathBuf::from("/d/users.json"), PathBuf::from("/d/users.txt")]
        );
    }

    #[test]
    fn json_view_keys_by_path_and_keeps_text_as_strings() {
        let mut store = DataStore::new();
        store.insert(PathBuf::from("/d/a.json"), DataValue::Json(json!([1, 2])));
        store.insert(PathBuf::from("/d/b.txt"), DataValue::Text("raw".into()));

        assert_eq!(store.to_json(), json!({"/d/a.json": [1, 2], "/d/b.txt": "raw"}));
        assert_eq!(serde_json::to_value(&store).unwrap(), store.to_json());
    }
}
