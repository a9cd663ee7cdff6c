use crate::licensing::config::{default_store_path, storage_keys};
use crate::licensing::days::Days;
use crate::licensing::provider::{Clock, LicenseProvider, TrialProvider};
use crate::licensing::registration::LicenseWriter;
use crate::licensing::trial::TrialPeriod;
use crate::licensing::types::{License, LicenseError};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Narrow key-value store holding license and trial data
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), LicenseError>;
    fn remove(&self, key: &str) -> Result<(), LicenseError>;

    /// Set several keys as one write where the backend allows it
    fn set_all(&self, entries: Vec<(&str, Value)>) -> Result<(), LicenseError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Lock, ignoring poison: guarded values are plain maps.
fn lock_ignore_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Store that lives as long as the process
#[derive(Default, Debug)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock_ignore_poison(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LicenseError> {
        lock_ignore_poison(&self.values).insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LicenseError> {
        lock_ignore_poison(&self.values).remove(key);
        Ok(())
    }

    fn set_all(&self, entries: Vec<(&str, Value)>) -> Result<(), LicenseError> {
        let mut values = lock_ignore_poison(&self.values);
        for (key, value) in entries {
            values.insert(key.to_string(), value);
        }
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// The file is read on first access and cached; every mutation writes the
/// whole object back.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    cache: Mutex<Option<Map<String, Value>>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Store at the platform's local data directory
    pub fn open_default() -> Result<Self, LicenseError> {
        let path = default_store_path()
            .ok_or_else(|| LicenseError::Storage("Failed to get app data dir".to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the in-memory cache so the next access re-reads the file
    pub fn clear_cache(&self) {
        *lock_ignore_poison(&self.cache) = None;
    }

    fn load(&self) -> Result<Map<String, Value>, LicenseError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| LicenseError::Storage(format!("Failed to read license state: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| LicenseError::Storage(format!("Failed to parse license state: {}", e)))
    }

    fn save(&self, values: &Map<String, Value>) -> Result<(), LicenseError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LicenseError::Storage(format!("Failed to create app data dir: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(values)
            .map_err(|e| LicenseError::Storage(format!("Failed to serialize license state: {}", e)))?;

        std::fs::write(&self.path, json)
            .map_err(|e| LicenseError::Storage(format!("Failed to write license state: {}", e)))
    }

    fn update(&self, change: impl FnOnce(&mut Map<String, Value>)) -> Result<(), LicenseError> {
        let mut cache = lock_ignore_poison(&self.cache);
        let mut values = match cache.take() {
            Some(values) => values,
            None => self.load()?,
        };

        // The cache only ever holds what is on disk
        let previous = values.clone();
        change(&mut values);
        match self.save(&values) {
            Ok(()) => {
                *cache = Some(values);
                Ok(())
            }
            Err(e) => {
                *cache = Some(previous);
                Err(e)
            }
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let mut cache = lock_ignore_poison(&self.cache);
        if cache.is_none() {
            match self.load() {
                Ok(values) => *cache = Some(values),
                Err(e) => {
                    log::warn!("{}", e);
                    return None;
                }
            }
        }
        cache.as_ref().and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LicenseError> {
        self.update(|values| {
            values.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<(), LicenseError> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn set_all(&self, entries: Vec<(&str, Value)>) -> Result<(), LicenseError> {
        self.update(|values| {
            for (key, value) in entries {
                values.insert(key.to_string(), value);
            }
        })
    }
}

/// License source and writer over a key-value store
#[derive(Debug)]
pub struct StoredLicense<S> {
    store: S,
}

impl<S: KeyValueStore> StoredLicense<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn key_value_store(&self) -> &S {
        &self.store
    }

    /// Delete both license keys
    pub fn remove_license(&self) -> Result<(), LicenseError> {
        self.store.remove(storage_keys::LICENSEE)?;
        self.store.remove(storage_keys::LICENSE_CODE)
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.store.get(key)? {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl<S: KeyValueStore> LicenseProvider for StoredLicense<S> {
    fn current_license(&self) -> Option<License> {
        let name = self.string(storage_keys::LICENSEE)?;
        let license_code = self.string(storage_keys::LICENSE_CODE)?;
        Some(License { name, license_code })
    }
}

impl<S: KeyValueStore> LicenseWriter for StoredLicense<S> {
    fn store(&self, license_code: &str, name: &str) -> Result<(), LicenseError> {
        self.store.set_all(vec![
            (storage_keys::LICENSEE, Value::String(name.to_string())),
            (storage_keys::LICENSE_CODE, Value::String(license_code.to_string())),
        ])
    }
}

/// Trial period source over a key-value store
#[derive(Debug)]
pub struct StoredTrial<S> {
    store: S,
}

impl<S: KeyValueStore> StoredTrial<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a trial of `days` starting now
    pub fn start_trial(&self, clock: &dyn Clock, days: Days) -> Result<TrialPeriod, LicenseError> {
        if self.current_trial_period().is_some() {
            return Err(LicenseError::TrialAlreadyStarted);
        }

        let trial_period = TrialPeriod::starting_at(clock.now(), days)
            .ok_or_else(|| LicenseError::InvalidTrialLength(days.amount()))?;
        self.store.set_all(vec![
            (
                storage_keys::TRIAL_START_DATE,
                Value::String(trial_period.start_date.to_rfc3339()),
            ),
            (
                storage_keys::TRIAL_END_DATE,
                Value::String(trial_period.end_date.to_rfc3339()),
            ),
        ])?;

        log::info!("Started trial until {}", trial_period.end_date);
        Ok(trial_period)
    }

    /// The recorded trial, or a new one on first launch
    pub fn ensure_trial(&self, clock: &dyn Clock, days: Days) -> Result<TrialPeriod, LicenseError> {
        match self.current_trial_period() {
            Some(trial_period) => Ok(trial_period),
            None => self.start_trial(clock, days),
        }
    }

    fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        let value = self.store.get(key)?;
        let parsed = value
            .as_str()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|date| date.with_timezone(&Utc));

        if parsed.is_none() {
            log::warn!("Ignoring unreadable {}: {}", key, value);
        }
        parsed
    }
}

impl<S: KeyValueStore> TrialProvider for StoredTrial<S> {
    fn current_trial_period(&self) -> Option<TrialPeriod> {
        let start_date = self.date(storage_keys::TRIAL_START_DATE)?;
        let end_date = self.date(storage_keys::TRIAL_END_DATE)?;
        Some(TrialPeriod::new(start_date, end_date))
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LicenseError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), LicenseError> {
        (**self).remove(key)
    }

    fn set_all(&self, entries: Vec<(&str, Value)>) -> Result<(), LicenseError> {
        (**self).set_all(entries)
    }
}
