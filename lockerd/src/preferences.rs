//! Snapshot of the settings presented by the preferences surface.

use crate::config::Config;
use crate::idle::LockDelay;
use crate::plugin::{PluginKind, PluginRegistry};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Preferences {
    pub auth: String,
    pub demo: Option<String>,
    pub observers: Vec<String>,
    pub lock: LockDelay,
    pub available_authenticators: Vec<String>,
    pub available_demos: Vec<String>,
    pub available_observers: Vec<String>,
}

impl Preferences {
    pub fn new(config: &Config, registry: &PluginRegistry) -> Preferences {
        Preferences {
            auth: config.auth().to_string(),
            demo: config.demo().map(str::to_string),
            observers: config.plugins().into_iter().map(str::to_string).collect(),
            lock: config.lock_delay(),
            available_authenticators: registry.names(PluginKind::Authenticator),
            available_demos: registry.names(PluginKind::Demo),
            available_observers: registry.names(PluginKind::Observer),
        }
    }

    /// One line per setting, for logging.
    pub fn summary(&self) -> Vec<String> {
        vec![
            format!(
                "Authentication: {} (available: {})",
                self.auth,
                self.available_authenticators.join(", ")
            ),
            format!(
                "Demo: {} (available: {})",
                self.demo.as_deref().unwrap_or("none"),
                self.available_demos.join(", ")
            ),
            format!(
                "Plugins: {} (available: {})",
                if self.observers.is_empty() {
                    "none".to_string()
                } else {
                    self.observers.join(", ")
                },
                self.available_observers.join(", ")
            ),
            format!("Lock: {}", self.lock),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_preferences_from_config() {
        let config = Config::parse("demo = \"colors\"\nplugins = \"debug\"\nlock = 60").unwrap();
        let preferences = Preferences::new(&config, &PluginRegistry::builtin());
        assert_eq!(preferences.auth, "password");
        assert_eq!(preferences.demo.as_deref(), Some("colors"));
        assert_eq!(preferences.observers, vec!["debug"]);
        assert_eq!(preferences.lock, LockDelay::After(Duration::from_secs(60)));
        assert_eq!(preferences.summary()[3], "Lock: after 60s");
    }
}
