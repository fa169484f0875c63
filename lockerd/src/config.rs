//! Persistent key/value configuration.
//!
//! Settings are grouped in sections. Top-level keys belong to the root section (`""`); every
//! other section is a TOML table whose name may use `::` namespacing, so the password of the
//! `password` authenticator lives in `["auth::password"]`.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{debug, warn};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::idle::LockDelay;

/// Authentication plugin used when the configuration does not name one.
pub const DEFAULT_AUTH: &str = "password";

/// Name of the root section, holding the top-level keys.
pub const ROOT: &str = "";

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Value(Scalar),
    Section(BTreeMap<String, Scalar>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<String>),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Boolean(b) => b.to_string(),
            Scalar::List(items) => items.join(","),
        }
    }
}

impl Config {
    /// Per-user configuration file, `locker.toml` in the platform configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "Locker", "locker").map(|dirs| dirs.config_dir().join("locker.toml"))
    }

    /// Loads the configuration at `path`. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                debug!("Loading configuration from {}", path.display());
                Config::parse(&text)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist, using defaults", path.display());
                Ok(Config::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        let entries: BTreeMap<String, Entry> = toml::from_str(text)?;
        let mut config = Config::default();
        for (name, entry) in entries {
            match entry {
                Entry::Value(value) => config.set(ROOT, &name, Some(&value.into_string())),
                Entry::Section(values) => {
                    for (key, value) in values {
                        config.set(&name, &key, Some(&value.into_string()));
                    }
                }
            }
        }
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = self.to_toml()?;
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, text).map_err(write_error)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut table = toml::value::Table::new();
        for (name, values) in &self.sections {
            if name == ROOT {
                for (key, value) in values {
                    table.insert(key.clone(), toml::Value::String(value.clone()));
                }
            } else {
                let section = values
                    .iter()
                    .map(|(key, value)| (key.clone(), toml::Value::String(value.clone())))
                    .collect();
                table.insert(name.clone(), toml::Value::Table(section));
            }
        }
        Ok(toml::to_string(&toml::Value::Table(table))?)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|values| values.get(key))
            .map(String::as_str)
    }

    /// Sets `key` in `section`; `None` removes it.
    pub fn set(&mut self, section: &str, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.sections
                    .entry(section.to_string())
                    .or_default()
                    .insert(key.to_string(), value.to_string());
            }
            None => {
                if let Some(values) = self.sections.get_mut(section) {
                    values.remove(key);
                    if values.is_empty() {
                        self.sections.remove(section);
                    }
                }
            }
        }
    }

    /// Name of the authentication plugin.
    pub fn auth(&self) -> &str {
        match self.get(ROOT, "auth") {
            Some(name) if !name.trim().is_empty() => name.trim(),
            _ => DEFAULT_AUTH,
        }
    }

    /// Name of the demo plugin, if one is configured.
    pub fn demo(&self) -> Option<&str> {
        self.get(ROOT, "demo")
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Names of the observer plugins, in load order, without duplicates.
    pub fn plugins(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.get(ROOT, "plugins").unwrap_or("").split(',') {
            let name = name.trim();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// How long after the screen saver turns on the screen should lock.
    pub fn lock_delay(&self) -> LockDelay {
        let value = match self.get(ROOT, "lock") {
            Some(value) => value,
            None => return LockDelay::Never,
        };
        match LockDelay::parse(value) {
            Some(delay) => delay,
            None => {
                warn!("Ignoring invalid lock delay {:?}", value);
                LockDelay::Never
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const SAMPLE: &str = r#"
auth = "slider"
demo = "colors"
plugins = "debug, suspend,debug"
lock = 5

["auth::password"]
password = "hunter2"

["plugin::suspend"]
delay = 20
"#;

    #[test]
    fn test_parse_sections() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.auth(), "slider");
        assert_eq!(config.demo(), Some("colors"));
        assert_eq!(config.plugins(), vec!["debug", "suspend"]);
        assert_eq!(config.get("auth::password", "password"), Some("hunter2"));
        assert_eq!(config.get("plugin::suspend", "delay"), Some("20"));
        assert_eq!(config.lock_delay(), LockDelay::After(Duration::from_secs(5)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.auth(), DEFAULT_AUTH);
        assert_eq!(config.demo(), None);
        assert!(config.plugins().is_empty());
        assert_eq!(config.lock_delay(), LockDelay::Never);
    }

    #[test]
    fn test_plugins_as_array() {
        let config = Config::parse("plugins = [\"debug\", \"suspend\"]").unwrap();
        assert_eq!(config.plugins(), vec!["debug", "suspend"]);
    }

    #[test]
    fn test_invalid_lock_delay_is_unset() {
        let config = Config::parse("lock = \"soon\"").unwrap();
        assert_eq!(config.lock_delay(), LockDelay::Never);
    }

    #[test]
    fn test_set_and_remove() {
        let mut config = Config::default();
        config.set("demo::colors", "interval", Some("250"));
        assert_eq!(config.get("demo::colors", "interval"), Some("250"));
        config.set("demo::colors", "interval", None);
        assert_eq!(config.get("demo::colors", "interval"), None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("locker.toml");
        let config = Config::parse(SAMPLE).unwrap();
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_error() {
        assert!(Config::parse("auth = ").is_err());
    }
}
