//! Username/password store used by the account sign-in mode.
//!
//! Passwords are kept as given, in a JSON object keyed by username.

use crate::error::{FormError, StoreError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{1,32}$").expect("username pattern"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialStore {
    users: BTreeMap<String, String>,
}

pub fn is_valid_username(name: &str) -> bool {
    USERNAME_RE.is_match(name)
}

impl CredentialStore {
    /// Load the store. A missing file yields an empty store.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users.get(username).is_some_and(|p| p == password)
    }

    pub fn register(&mut self, username: &str, password: &str) -> Result<(), FormError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(FormError::MissingField("a username"));
        }
        if password.is_empty() {
            return Err(FormError::MissingField("a password"));
        }
        if !is_valid_username(username) {
            return Err(FormError::InvalidUsername(username.to_string()));
        }
        if self.contains(username) {
            return Err(FormError::UsernameTaken(username.to_string()));
        }
        self.users.insert(username.to_string(), password.to_string());
        log::info!("Registered user {username}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn register_and_verify() {
        let mut store = CredentialStore::default();
        store.register("rohan", "pw1").unwrap();
        assert!(store.verify("rohan", "pw1"));
        assert!(!store.verify("rohan", "PW1"));
        assert!(!store.verify("amy", "pw1"));
    }

    #[test]
    fn register_rejects_bad_input() {
        let mut store = CredentialStore::default();
        store.register("rohan", "pw1").unwrap();
        assert_eq!(
            store.register("rohan", "other"),
            Err(FormError::UsernameTaken("rohan".into()))
        );
        assert_eq!(
            store.register("  ", "pw"),
            Err(FormError::MissingField("a username"))
        );
        assert_eq!(
            store.register("amy", ""),
            Err(FormError::MissingField("a password"))
        );
        assert_eq!(
            store.register("amy smith", "pw"),
            Err(FormError::InvalidUsername("amy smith".into()))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn username_pattern() {
        assert!(is_valid_username("a.b-c_9"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username(&"x".repeat(33)));
        assert!(!is_valid_username("with/slash"));
    }

    #[test]
    fn save_load_is_plain_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        let mut store = CredentialStore::default();
        store.register("amy", "secret").unwrap();
        store.save(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"amy": "secret"}));
        assert_eq!(CredentialStore::load(&path).unwrap(), store);
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::load(dir.path().join("users.json")).unwrap();
        assert_eq!(store.len(), 0);
    }
}
