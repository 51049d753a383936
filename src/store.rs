//! String key/value persistence.
//!
//! Everything the game remembers between page loads goes through
//! [`KeyValueStore`]: the logged-in player name, per-player level scores and the
//! shared rating list. In the browser that is `window.localStorage`; native
//! builds and tests use [`MemoryStore`].

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub const PLAYER_NAME_KEY: &str = "playerName";
pub const RATING_KEY: &str = "rating";
const LEVEL_SCORES_PREFIX: &str = "levelScores_";

/// Key holding the per-level best scores of one player.
pub fn level_scores_key(player: &str) -> String {
    format!("{LEVEL_SCORES_PREFIX}{player}")
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("local storage is not available")]
    Unavailable,
    #[error("storage rejected the write: {0}")]
    Rejected(String),
    #[error("could not encode value for '{key}': {reason}")]
    Encode { key: String, reason: String },
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Read a JSON value, treating a missing key or an unparsable value as the
/// type's default. A corrupted store must never stop the game from loading.
pub fn read_json_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            console_warn!("ignoring malformed stored value", key, err.to_string());
            T::default()
        }
    }
}

pub fn write_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|err| StoreError::Encode {
        key: key.to_string(),
        reason: err.to_string(),
    })?;
    store.set(key, &raw)
}

/// In-process store. Interior mutability keeps the trait `&self` like
/// `web_sys::Storage`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// `window.localStorage` wrapper.
#[derive(Clone, Debug)]
pub struct BrowserStore {
    storage: web_sys::Storage,
}

impl BrowserStore {
    pub fn local() -> Result<Self, StoreError> {
        let window = web_sys::window().ok_or(StoreError::Unavailable)?;
        let storage = window
            .local_storage()
            .ok()
            .flatten()
            .ok_or(StoreError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| StoreError::Rejected(js_message(&err)))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|err| StoreError::Rejected(js_message(&err)))
    }
}

fn js_message(value: &wasm_bindgen::JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Memory-backed store whose writes can be switched to fail, like a full
/// or locked-down `localStorage`.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    reject: std::cell::Cell<bool>,
}

#[cfg(test)]
impl FailingStore {
    pub(crate) fn reject_writes(&self) {
        self.reject.set(true);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.reject.get() {
            return Err(StoreError::Rejected("QuotaExceededError".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.remove(key)
    }
}
