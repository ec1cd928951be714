//! Persisted badge settings.
//!
//! Settings are one JSON object. Top-level keys hold system settings (WiFi
//! credentials, badge name, restart policy); the reserved `_settings` object
//! holds app-scoped settings whose keys are prefixed with the app name
//! (`"name.font"`).
//!
//! [`Storage`] is the collaborator seam. [`MemoryStorage`] backs tests and the
//! simulator's ephemeral mode; [`FileStorage`] persists every change to a JSON
//! file.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;
use serde_json::{Map, Value};

use crate::error::StorageError;

/// Well-known setting keys.
pub mod keys {
    /// WiFi network name
    pub const SSID: &str = "SSID";
    /// WiFi passphrase
    pub const PSK: &str = "PSK";
    /// Over-the-air updates enabled
    pub const OTA: &str = "OTA";
    /// Over-the-air update server
    pub const OTA_SERVER: &str = "OTA_SERVER";
    /// Reboot automatically after a crash
    pub const RESTART: &str = "RESTART";
    /// Badge owner's name
    pub const NAME: &str = "NAME";
    /// Badge image reference pushed by the backend
    pub const IMAGE: &str = "IMAGE";
    /// Event schedule pushed by the backend
    pub const SCHEDULE: &str = "SCHEDULE";
    /// Reserved object holding app-scoped settings
    pub const APP_SETTINGS: &str = "_settings";
}

/// In-memory settings document.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    data: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut data = Map::new();
        data.insert(keys::SSID.into(), Value::from("trp-badge"));
        data.insert(keys::PSK.into(), Value::from(""));
        data.insert(keys::OTA.into(), Value::Bool(true));
        data.insert(keys::OTA_SERVER.into(), Value::from("https://badge.troopers.de/api"));
        data.insert(keys::RESTART.into(), Value::Bool(false));
        data.insert(keys::NAME.into(), Value::Null);
        data.insert(keys::APP_SETTINGS.into(), Value::Object(Map::new()));
        Self { data }
    }
}

impl Settings {
    /// Overlay a loaded document onto the current values.
    ///
    /// # Errors
    ///
    /// - `StorageError::NotAnObject` if `loaded` is not a JSON object
    pub fn merge(&mut self, loaded: Value) -> Result<(), StorageError> {
        let Value::Object(loaded) = loaded else {
            return Err(StorageError::NotAnObject);
        };
        self.data.extend(loaded);
        if !self.data.get(keys::APP_SETTINGS).is_some_and(Value::is_object) {
            self.data.insert(keys::APP_SETTINGS.into(), Value::Object(Map::new()));
        }
        Ok(())
    }

    /// System setting. `None` if absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set a system setting.
    pub fn insert(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_owned(), value);
    }

    /// App-scoped setting.
    ///
    /// Only keys prefixed `"<app>."` are visible to `app`.
    pub fn app_setting(&self, app: &str, key: &str) -> Option<&Value> {
        let scoped = key.strip_prefix(app)?.strip_prefix('.')?;
        if scoped.is_empty() {
            return None;
        }
        self.data.get(keys::APP_SETTINGS)?.get(key)
    }

    /// Set an app-scoped setting (key already prefixed).
    pub fn insert_app_setting(&mut self, key: &str, value: Value) {
        let scoped = self
            .data
            .entry(keys::APP_SETTINGS)
            .or_insert_with(|| Value::Object(Map::new()));
        if !scoped.is_object() {
            *scoped = Value::Object(Map::new());
        }
        if let Value::Object(scoped) = scoped {
            scoped.insert(key.to_owned(), value);
        }
    }

    /// Apply a backend settings push.
    ///
    /// Expects `{"response": {"name", "image", "schedule", "settings"}}`.
    /// Returns `false` and changes nothing if the shape is wrong.
    pub fn merge_remote(&mut self, body: &Value) -> bool {
        let Some(response) = body.get("response").and_then(Value::as_object) else {
            return false;
        };

        for (field, key) in [("name", keys::NAME), ("image", keys::IMAGE), ("schedule", keys::SCHEDULE)]
        {
            if let Some(value) = response.get(field).filter(|value| is_truthy(value)) {
                self.insert(key, value.clone());
            }
        }
        if let Some(settings) = response.get("settings").and_then(Value::as_object) {
            for (key, value) in settings {
                self.insert_app_setting(key, value.clone());
            }
        }
        true
    }

    /// Whole document as JSON.
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Number(_) => true,
    }
}

/// Settings collaborator.
pub trait Storage {
    /// Current settings.
    fn settings(&self) -> &Settings;

    /// Apply `change` and persist the result.
    fn update(&mut self, change: &mut dyn FnMut(&mut Settings));

    /// Delete persisted settings. In-memory values are kept until restart.
    fn wipe(&mut self);

    /// System setting.
    fn get(&self, key: &str) -> Option<&Value> {
        self.settings().get(key)
    }

    /// System setting as a non-empty string.
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str).filter(|text| !text.is_empty())
    }

    /// System setting as a flag. Missing or non-boolean reads as `false`.
    fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Set and persist a system setting.
    fn set(&mut self, key: &str, value: Value) {
        let mut value = Some(value);
        self.update(&mut |settings| {
            if let Some(value) = value.take() {
                settings.insert(key, value);
            }
        });
    }

    /// App-scoped setting, see [`Settings::app_setting`].
    fn app_setting(&self, app: &str, key: &str) -> Option<&Value> {
        self.settings().app_setting(app, key)
    }

    /// Set and persist an app-scoped setting.
    fn set_app_setting(&mut self, key: &str, value: Value) {
        let mut value = Some(value);
        self.update(&mut |settings| {
            if let Some(value) = value.take() {
                settings.insert_app_setting(key, value);
            }
        });
    }

    /// Apply and persist a backend settings push.
    fn merge_remote(&mut self, body: &Value) -> bool {
        let mut merged = false;
        self.update(&mut |settings| merged = settings.merge_remote(body));
        merged
    }
}
