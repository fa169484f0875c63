use std::collections::VecDeque;
use std::time::Duration;

use locker_proto::Action;

use crate::config::Config;
use crate::error::PluginError;
use crate::plugin::PluginKind;
use crate::timer::{TimerId, TimerOwner, Timers};

/// Requests plugins made during a callback, collected by the controller once it returns.
#[derive(Debug, Default)]
pub struct Outbox {
    pub actions: VecDeque<Action>,
    pub errors: Vec<String>,
    pub about: bool,
    pub config_changed: bool,
}

/// Access to the locker handed to every plugin callback.
///
/// Configuration is namespaced by plugin kind: an authenticator asking for section `password`
/// reads `auth::password`. Actions requested through [`Helper::action`] run after the current
/// callback returns, in request order.
pub struct Helper<'a> {
    kind: PluginKind,
    owner: TimerOwner,
    config: &'a mut Config,
    timers: &'a mut Timers,
    outbox: &'a mut Outbox,
}

impl<'a> Helper<'a> {
    pub fn new(
        kind: PluginKind,
        owner: TimerOwner,
        config: &'a mut Config,
        timers: &'a mut Timers,
        outbox: &'a mut Outbox,
    ) -> Helper<'a> {
        Helper {
            kind,
            owner,
            config,
            timers,
            outbox,
        }
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    /// Reports an error to the user and returns `code`.
    pub fn error(&mut self, message: &str, code: i32) -> i32 {
        self.outbox.errors.push(message.to_string());
        code
    }

    /// Asks the locker to perform `action`.
    ///
    /// # Errors
    /// Demo plugins may not request actions.
    pub fn action(&mut self, action: Action) -> Result<(), PluginError> {
        if self.kind == PluginKind::Demo {
            return Err(PluginError::Unsupported {
                kind: self.kind,
                capability: "request actions",
            });
        }
        self.outbox.actions.push_back(action);
        Ok(())
    }

    pub fn config_get(&self, section: &str, key: &str) -> Option<&str> {
        self.config.get(&self.section(section), key)
    }

    /// Sets (or with `None`, removes) a configuration value. Changes are saved on shutdown.
    pub fn config_set(&mut self, section: &str, key: &str, value: Option<&str>) {
        let section = self.section(section);
        self.config.set(&section, key, value);
        self.outbox.config_changed = true;
    }

    /// Shows information about the locker.
    ///
    /// # Errors
    /// Only observer plugins may do this.
    pub fn about_dialog(&mut self) -> Result<(), PluginError> {
        if self.kind != PluginKind::Observer {
            return Err(PluginError::Unsupported {
                kind: self.kind,
                capability: "show the about dialog",
            });
        }
        self.outbox.about = true;
        Ok(())
    }

    /// Schedules a call to the plugin's `timeout` callback `delay` from now.
    pub fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.timers.schedule(delay, self.owner.clone())
    }

    pub fn cancel_timeout(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    fn section(&self, section: &str) -> String {
        format!("{}::{}", self.kind.config_prefix(), section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_namespaced() {
        let mut config = Config::default();
        config.set("auth::password", "password", Some("secret"));
        let mut timers = Timers::new();
        let mut outbox = Outbox::default();

        let mut helper = Helper::new(
            PluginKind::Authenticator,
            TimerOwner::Authenticator,
            &mut config,
            &mut timers,
            &mut outbox,
        );
        assert_eq!(helper.config_get("password", "password"), Some("secret"));
        helper.config_set("password", "hint", Some("a classic"));

        assert_eq!(config.get("auth::password", "hint"), Some("a classic"));
        assert!(outbox.config_changed);
    }

    #[test]
    fn test_demo_cannot_request_actions() {
        let mut config = Config::default();
        let mut timers = Timers::new();
        let mut outbox = Outbox::default();
        let mut helper = Helper::new(
            PluginKind::Demo,
            TimerOwner::Demo,
            &mut config,
            &mut timers,
            &mut outbox,
        );
        assert!(helper.action(Action::Unlock).is_err());
        assert!(helper.about_dialog().is_err());
        assert!(outbox.actions.is_empty());
    }

    #[test]
    fn test_actions_and_errors_are_queued() {
        let mut config = Config::default();
        let mut timers = Timers::new();
        let mut outbox = Outbox::default();
        let mut helper = Helper::new(
            PluginKind::Observer,
            TimerOwner::Observer("test".to_string()),
            &mut config,
            &mut timers,
            &mut outbox,
        );
        helper.action(Action::Lock).unwrap();
        helper.action(Action::Suspend).unwrap();
        assert_eq!(helper.error("oops", 2), 2);
        helper.set_timeout(Duration::from_secs(1));

        assert_eq!(outbox.actions, vec![Action::Lock, Action::Suspend]);
        assert_eq!(outbox.errors, vec!["oops".to_string()]);
        assert_eq!(
            timers.take_due(std::time::Instant::now() + Duration::from_secs(2)).len(),
            1
        );
    }
}
