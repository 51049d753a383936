//! Player name gate.

use crate::store::{KeyValueStore, PLAYER_NAME_KEY, StoreError};

/// How long the presentation layer keeps a login error on screen.
pub const FEEDBACK_CLEAR_MS: u32 = 3_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Please enter your name")]
    EmptyName,
    #[error("Name must be between {min} and {max} characters (got {len})")]
    InvalidLength { len: usize, min: usize, max: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Name validation rules. Some page revisions skip the length check, so it is
/// a switch rather than a hard rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameRules {
    pub enforce_length: bool,
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            enforce_length: true,
            min_len: 3,
            max_len: 20,
        }
    }
}

impl NameRules {
    pub fn relaxed() -> Self {
        Self {
            enforce_length: false,
            ..Self::default()
        }
    }

    /// Returns the trimmed name when it passes.
    pub fn check<'a>(&self, raw: &'a str) -> Result<&'a str, LoginError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(LoginError::EmptyName);
        }
        let len = name.chars().count();
        if self.enforce_length && !(self.min_len..=self.max_len).contains(&len) {
            return Err(LoginError::InvalidLength {
                len,
                min: self.min_len,
                max: self.max_len,
            });
        }
        Ok(name)
    }
}

/// Owns the `playerName` key. Nothing else writes it.
pub struct Session<S: KeyValueStore> {
    store: S,
    rules: NameRules,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self::with_rules(store, NameRules::default())
    }

    pub fn with_rules(store: S, rules: NameRules) -> Self {
        Self { store, rules }
    }

    pub fn rules(&self) -> NameRules {
        self.rules
    }

    pub fn login(&self, name: &str) -> Result<PlayerIdentity, LoginError> {
        let name = self.rules.check(name)?;
        self.store.set(PLAYER_NAME_KEY, name)?;
        console_log!("player logged in", name);
        Ok(PlayerIdentity {
            name: name.to_string(),
        })
    }

    pub fn current_identity(&self) -> Option<PlayerIdentity> {
        self.store
            .get(PLAYER_NAME_KEY)
            .filter(|name| !name.trim().is_empty())
            .map(|name| PlayerIdentity { name })
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.remove(PLAYER_NAME_KEY)?;
        console_log!("player logged out");
        Ok(())
    }
}
