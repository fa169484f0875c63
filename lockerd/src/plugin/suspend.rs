//! Observer suspending the machine once the screen has been locked or blanked for a while.

use std::time::Duration;

use locker_proto::{Action, Event};
use log::{debug, warn};

use crate::error::PluginError;
use crate::plugin::{Helper, Observer};
use crate::timer::TimerId;

pub const NAME: &str = "suspend";

const SECTION: &str = "suspend";
const DEFAULT_DELAY: Duration = Duration::from_secs(10);

pub fn create(helper: &mut Helper<'_>) -> Result<Box<dyn Observer>, PluginError> {
    let delay = match helper.config_get(SECTION, "delay") {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!("Ignoring invalid suspend delay {:?}", value);
                DEFAULT_DELAY
            }
        },
        None => DEFAULT_DELAY,
    };
    Ok(Box::new(Suspend::new(delay)))
}

pub struct Suspend {
    delay: Duration,
    timer: Option<TimerId>,
}

impl Suspend {
    pub fn new(delay: Duration) -> Suspend {
        Suspend { delay, timer: None }
    }

    fn cancel(&mut self, helper: &mut Helper<'_>) {
        if let Some(timer) = self.timer.take() {
            helper.cancel_timeout(timer);
        }
    }
}

impl Observer for Suspend {
    fn event(&mut self, helper: &mut Helper<'_>, event: Event) -> Result<(), PluginError> {
        match event {
            Event::Activated | Event::Locked => {
                self.cancel(helper);
                debug!("Suspending in {}s", self.delay.as_secs());
                self.timer = Some(helper.set_timeout(self.delay));
            }
            Event::Deactivated | Event::Unlocked => self.cancel(helper),
            _ => {}
        }
        Ok(())
    }

    fn timeout(&mut self, helper: &mut Helper<'_>, timer: TimerId) {
        if self.timer != Some(timer) {
            return;
        }
        self.timer = None;
        if let Err(err) = helper.action(Action::Suspend) {
            helper.error(&err.to_string(), 1);
        }
    }
}
