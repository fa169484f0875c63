//! Observer logging every lifecycle event.

use locker_proto::Event;
use log::info;

use crate::error::PluginError;
use crate::plugin::{Helper, Observer};

pub const NAME: &str = "debug";

pub fn create(_helper: &mut Helper<'_>) -> Result<Box<dyn Observer>, PluginError> {
    info!("Debug observer loaded");
    Ok(Box::new(EventLog))
}

pub struct EventLog;

impl Observer for EventLog {
    fn event(&mut self, _helper: &mut Helper<'_>, event: Event) -> Result<(), PluginError> {
        info!("Locker event: {}", event);
        Ok(())
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        info!("Debug observer unloaded");
    }
}
