// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port.
//!
//! Profiles are stored as JSON blobs under a logical key (the profile name).
//! The [`ConfigStore`] port moves raw bytes; [`ConfigService`] owns the JSON
//! encoding and the profile-level operations the CLI uses.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::profile::RelocationProfile;

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Profile name unusable as a storage key.
    #[error("invalid profile name `{0}`")]
    InvalidKey(String),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Whether `key` is a usable profile name: non-empty ASCII alphanumerics,
/// `-`, `_` and `.`, not starting with `.`.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Read a profile from a standalone JSON file.
pub fn read_profile_file(path: &Path) -> Result<RelocationProfile, ConfigError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound)
        }
        Err(err) => return Err(ConfigError::Io(err)),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Thin service that serializes config values and delegates storage to a `ConfigStore`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the inner store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Load the profile saved as `name`. Missing profiles are `NotFound`.
    pub fn load_profile(&self, name: &str) -> Result<RelocationProfile, ConfigError> {
        if !is_valid_key(name) {
            return Err(ConfigError::InvalidKey(name.to_owned()));
        }
        self.load(name)?.ok_or(ConfigError::NotFound)
    }

    /// Save `profile` as `name`, replacing any previous profile.
    pub fn save_profile(&self, name: &str, profile: &RelocationProfile) -> Result<(), ConfigError> {
        if !is_valid_key(name) {
            return Err(ConfigError::InvalidKey(name.to_owned()));
        }
        self.save(name, profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::profile::RelocationSpec;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemStore {
        blobs: RefCell<BTreeMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.blobs
                .borrow()
                .get(key)
                .cloned()
                .ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn missing_and_empty_blobs_load_as_none() {
        let service = ConfigService::new(MemStore::default());
        assert!(service.load::<Vec<String>>("absent").unwrap().is_none());
        service.store().save_raw("empty", b"").unwrap();
        assert!(service.load::<Vec<String>>("empty").unwrap().is_none());
    }

    #[test]
    fn saved_values_load_back() {
        let service = ConfigService::new(MemStore::default());
        service.save("list", &vec!["a", "b"]).unwrap();
        assert_eq!(
            service.load::<Vec<String>>("list").unwrap(),
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
    }

    #[test]
    fn profiles_round_trip_by_name() {
        let service = ConfigService::new(MemStore::default());
        let profile = RelocationProfile::new(vec![RelocationSpec::new("org.a", "x.org.a")]);
        service.save_profile("jooq", &profile).unwrap();
        assert_eq!(service.load_profile("jooq").unwrap(), profile);
        assert!(matches!(
            service.load_profile("other"),
            Err(ConfigError::NotFound)
        ));
    }

    #[test]
    fn rejects_unusable_names() {
        let service = ConfigService::new(MemStore::default());
        for name in ["", "../etc", ".hidden", "a/b", "with space"] {
            assert!(
                matches!(
                    service.save_profile(name, &RelocationProfile::default()),
                    Err(ConfigError::InvalidKey(_))
                ),
                "{name}"
            );
        }
        assert!(is_valid_key("shaded-jooq_3.19"));
    }

    #[test]
    fn garbage_is_a_serde_error() {
        let service = ConfigService::new(MemStore::default());
        service.store().save_raw("bad", b"{nope").unwrap();
        assert!(matches!(
            service.load::<Vec<String>>("bad"),
            Err(ConfigError::Serde(_))
        ));
    }
}
