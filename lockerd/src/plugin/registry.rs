use std::collections::BTreeMap;

use crate::error::PluginError;
use crate::plugin::{colors, debug, password, slider, suspend};
use crate::plugin::{Authenticator, Demo, Helper, Observer, PluginKind};

pub type AuthFactory = Box<dyn Fn(&mut Helper<'_>) -> Result<Box<dyn Authenticator>, PluginError>>;
pub type DemoFactory = Box<dyn Fn(&mut Helper<'_>) -> Result<Box<dyn Demo>, PluginError>>;
pub type ObserverFactory = Box<dyn Fn(&mut Helper<'_>) -> Result<Box<dyn Observer>, PluginError>>;

/// Named plugin constructors, one table per plugin kind.
#[derive(Default)]
pub struct PluginRegistry {
    authenticators: BTreeMap<String, AuthFactory>,
    demos: BTreeMap<String, DemoFactory>,
    observers: BTreeMap<String, ObserverFactory>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> PluginRegistry {
        PluginRegistry::default()
    }

    /// A registry holding the plugins shipped with the locker.
    pub fn builtin() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register_authenticator(password::NAME, Box::new(password::create));
        registry.register_authenticator(slider::NAME, Box::new(slider::create));
        registry.register_demo(colors::NAME, Box::new(colors::create));
        registry.register_observer(debug::NAME, Box::new(debug::create));
        registry.register_observer(suspend::NAME, Box::new(suspend::create));
        registry
    }

    pub fn register_authenticator(&mut self, name: &str, factory: AuthFactory) {
        self.authenticators.insert(name.to_string(), factory);
    }

    pub fn register_demo(&mut self, name: &str, factory: DemoFactory) {
        self.demos.insert(name.to_string(), factory);
    }

    pub fn register_observer(&mut self, name: &str, factory: ObserverFactory) {
        self.observers.insert(name.to_string(), factory);
    }

    pub fn create_authenticator(
        &self,
        name: &str,
        helper: &mut Helper<'_>,
    ) -> Result<Box<dyn Authenticator>, PluginError> {
        let factory = self
            .authenticators
            .get(name)
            .ok_or_else(|| not_found(PluginKind::Authenticator, name))?;
        factory(helper)
    }

    pub fn create_demo(&self, name: &str, helper: &mut Helper<'_>) -> Result<Box<dyn Demo>, PluginError> {
        let factory = self
            .demos
            .get(name)
            .ok_or_else(|| not_found(PluginKind::Demo, name))?;
        factory(helper)
    }

    pub fn create_observer(
        &self,
        name: &str,
        helper: &mut Helper<'_>,
    ) -> Result<Box<dyn Observer>, PluginError> {
        let factory = self
            .observers
            .get(name)
            .ok_or_else(|| not_found(PluginKind::Observer, name))?;
        factory(helper)
    }

    /// Registered names for `kind`, sorted.
    pub fn names(&self, kind: PluginKind) -> Vec<String> {
        match kind {
            PluginKind::Authenticator => self.authenticators.keys().cloned().collect(),
            PluginKind::Demo => self.demos.keys().cloned().collect(),
            PluginKind::Observer => self.observers.keys().cloned().collect(),
        }
    }
}

fn not_found(kind: PluginKind, name: &str) -> PluginError {
    PluginError::NotFound {
        kind,
        name: name.to_string(),
    }
}
