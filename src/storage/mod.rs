use serde::{Deserialize, Serialize};

pub(crate) const EXPANDED_NOTEBOOKS_KEY: &str = "expanded-notebooks";
pub(crate) const EXPANDED_SECTIONS_KEY: &str = "expanded-sections";
pub(crate) const EXPANDED_UNASSIGNED_KEY: &str = "expanded-unassigned";
pub(crate) const EXPANDED_SHOPPING_LISTS_KEY: &str = "expanded-shopping-lists";
pub(crate) const EXPANDED_RECENT_KEY: &str = "expanded-recent";

pub(crate) fn collapsed_sections_key(notebook_id: &str) -> String {
    format!("collapsed-sections-{notebook_id}")
}

/// Durable string key/value storage.
///
/// The browser implementation is localStorage; tests use [`MemoryStorage`].
pub(crate) trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    #[cfg(test)]
    fn remove(&self, key: &str);
}

/// `window.localStorage`. Every call re-resolves the storage handle, so the
/// type is a plain unit struct and can live inside signals.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, value).is_err() {
                tracing::warn!(key, "localStorage write failed");
            }
        }
    }

    #[cfg(test)]
    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

/// In-memory store for tests. Clones share the same map.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub(crate) struct MemoryStorage {
    items: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, String>>>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let s = Self::new();
        for (k, v) in items {
            s.set(k, v);
        }
        s
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.items.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.items.lock() {
            map.remove(key);
        }
    }
}

/// Missing or malformed values both come back as `None`.
pub(crate) fn load_json<T: for<'de> Deserialize<'de>>(
    store: &impl KeyValueStore,
    key: &str,
) -> Option<T> {
    let json = store.get(key)?;
    match serde_json::from_str(&json) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring malformed persisted value");
            None
        }
    }
}

pub(crate) fn save_json<T: Serialize>(store: &impl KeyValueStore, key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        store.set(key, &json);
    }
}

/// Move-to-front insert keyed by `same_key`, truncated to `max`.
pub(crate) fn upsert_lru_by_key<T: Clone>(
    mut items: Vec<T>,
    item: T,
    same_key: impl Fn(&T, &T) -> bool,
    max: usize,
) -> Vec<T> {
    items.retain(|x| !same_key(x, &item));
    items.insert(0, item);
    if items.len() > max {
        items.truncate(max);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_json_missing_key() {
        let s = MemoryStorage::new();
        assert_eq!(load_json::<Vec<String>>(&s, "nope"), None);
    }

    #[test]
    fn test_load_json_malformed_value() {
        let s = MemoryStorage::with_items([("k", "{not json")]);
        assert_eq!(load_json::<Vec<String>>(&s, "k"), None);
    }

    #[test]
    fn test_save_then_load_json() {
        let s = MemoryStorage::new();
        save_json(&s, "k", &vec!["a".to_string(), "b".to_string()]);
        assert_eq!(s.get("k").as_deref(), Some(r#"["a","b"]"#));
        assert_eq!(
            load_json::<Vec<String>>(&s, "k"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_memory_storage_clones_share_items() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set("k", "v");
        assert_eq!(b.get("k").as_deref(), Some("v"));
        b.remove("k");
        assert!(a.get("k").is_none());
    }

    #[test]
    fn test_upsert_lru_moves_existing_to_front() {
        let items = vec![(1, "a"), (2, "b"), (3, "c")];
        let next = upsert_lru_by_key(items, (3, "c2"), |x, y| x.0 == y.0, 10);
        assert_eq!(next, vec![(3, "c2"), (1, "a"), (2, "b")]);
    }

    #[test]
    fn test_upsert_lru_truncates() {
        let items = vec![1, 2, 3];
        let next = upsert_lru_by_key(items, 4, |x, y| x == y, 3);
        assert_eq!(next, vec![4, 1, 2]);
    }

    #[test]
    fn test_collapsed_sections_key_is_per_notebook() {
        assert_eq!(collapsed_sections_key("nb1"), "collapsed-sections-nb1");
    }
}
