//! Slide-to-unlock authenticator. Needs no secret, so it only keeps casual passers-by out.

use std::time::Duration;

use locker_proto::Action;
use log::debug;

use crate::error::PluginError;
use crate::plugin::{AuthInput, AuthWidget, Authenticator, Helper};
use crate::timer::TimerId;

pub const NAME: &str = "slider";

const STEP: u32 = 25;
const END: u32 = 100;
const TRACK_WIDTH: usize = 20;
const SPRING_BACK: Duration = Duration::from_secs(1);
const IDLE_TIMEOUT: Duration = Duration::from_secs(3);

pub fn create(_helper: &mut Helper<'_>) -> Result<Box<dyn Authenticator>, PluginError> {
    Ok(Box::new(Slider::default()))
}

#[derive(Debug, Default)]
pub struct Slider {
    position: u32,
    visible: bool,
    locked: bool,
    unlocked: bool,
    spring_timer: Option<TimerId>,
    idle_timer: Option<TimerId>,
}

impl Slider {
    fn reset(&mut self, helper: &mut Helper<'_>) {
        self.position = 0;
        self.visible = false;
        for timer in self.spring_timer.take().into_iter().chain(self.idle_timer.take()) {
            helper.cancel_timeout(timer);
        }
    }

    fn rearm(&mut self, helper: &mut Helper<'_>) {
        if let Some(timer) = self.spring_timer.take() {
            helper.cancel_timeout(timer);
        }
        if let Some(timer) = self.idle_timer.take() {
            helper.cancel_timeout(timer);
        }
        if self.position > 0 {
            self.spring_timer = Some(helper.set_timeout(SPRING_BACK));
        }
        self.idle_timer = Some(helper.set_timeout(IDLE_TIMEOUT));
    }

    fn track(&self) -> String {
        let filled = self.position as usize * TRACK_WIDTH / END as usize;
        format!(
            "[{}>{}]",
            "=".repeat(filled),
            " ".repeat(TRACK_WIDTH - filled)
        )
    }
}

impl Authenticator for Slider {
    fn widget(&self) -> AuthWidget {
        if !self.visible {
            return AuthWidget::hidden();
        }
        AuthWidget::shown(vec!["Slide right to unlock".to_string(), self.track()])
    }

    fn action(&mut self, helper: &mut Helper<'_>, action: Action) -> Result<(), PluginError> {
        match action {
            Action::Activate | Action::Start => self.reset(helper),
            Action::Deactivate => {
                if self.locked {
                    self.visible = true;
                    self.rearm(helper);
                }
            }
            Action::Lock => {
                self.locked = true;
                self.unlocked = false;
                self.reset(helper);
            }
            Action::Unlock => {
                if self.locked && !self.unlocked {
                    return Err(PluginError::failed("The slider was not moved to the end"));
                }
                self.locked = false;
                self.unlocked = false;
                self.reset(helper);
            }
            _ => {}
        }
        Ok(())
    }

    fn input(&mut self, helper: &mut Helper<'_>, input: AuthInput) {
        if !self.locked || self.unlocked {
            return;
        }
        self.visible = true;

        match input {
            AuthInput::Right => self.position = (self.position + STEP).min(END),
            AuthInput::Left => self.position = self.position.saturating_sub(STEP),
            AuthInput::Escape => self.position = 0,
            _ => {}
        }

        if self.position == END {
            debug!("Slider reached the end");
            self.unlocked = true;
            if let Err(err) = helper.action(Action::Unlock) {
                helper.error(&err.to_string(), 1);
            }
            return;
        }
        self.rearm(helper);
    }

    fn timeout(&mut self, helper: &mut Helper<'_>, timer: TimerId) {
        if self.spring_timer == Some(timer) {
            self.spring_timer = None;
            self.position = 0;
        } else if self.idle_timer == Some(timer) {
            self.idle_timer = None;
            self.reset(helper);
            if let Err(err) = helper.action(Action::Activate) {
                helper.error(&err.to_string(), 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::config::Config;
    use crate::plugin::{Outbox, PluginKind};
    use crate::timer::{TimerOwner, Timers};

    #[derive(Default)]
    struct Harness {
        config: Config,
        timers: Timers,
        outbox: Outbox,
    }

    impl Harness {
        fn helper(&mut self) -> Helper<'_> {
            Helper::new(
                PluginKind::Authenticator,
                TimerOwner::Authenticator,
                &mut self.config,
                &mut self.timers,
                &mut self.outbox,
            )
        }
    }

    fn locked_slider(harness: &mut Harness) -> Slider {
        let mut slider = Slider::default();
        slider.action(&mut harness.helper(), Action::Lock).unwrap();
        slider
    }

    #[test]
    fn test_slide_to_end_requests_unlock() {
        let mut harness = Harness::default();
        let mut slider = locked_slider(&mut harness);
        assert!(slider.action(&mut harness.helper(), Action::Unlock).is_err());

        for _ in 0..4 {
            slider.input(&mut harness.helper(), AuthInput::Right);
        }
        assert_eq!(harness.outbox.actions, vec![Action::Unlock]);
        assert!(slider.action(&mut harness.helper(), Action::Unlock).is_ok());
    }

    #[test]
    fn test_left_moves_back() {
        let mut harness = Harness::default();
        let mut slider = locked_slider(&mut harness);
        slider.input(&mut harness.helper(), AuthInput::Left);
        slider.input(&mut harness.helper(), AuthInput::Right);
        slider.input(&mut harness.helper(), AuthInput::Right);
        slider.input(&mut harness.helper(), AuthInput::Left);
        assert_eq!(slider.position, 25);
        assert!(slider.widget().visible);
        assert!(harness.outbox.actions.is_empty());
    }

    #[test]
    fn test_springs_back_then_hides() {
        let mut harness = Harness::default();
        let mut slider = locked_slider(&mut harness);
        slider.input(&mut harness.helper(), AuthInput::Right);

        let spring = harness
            .timers
            .take_due(Instant::now() + SPRING_BACK + Duration::from_millis(100));
        assert_eq!(spring.len(), 1);
        slider.timeout(&mut harness.helper(), spring[0].0);
        assert_eq!(slider.position, 0);
        assert!(slider.widget().visible);

        let idle = harness
            .timers
            .take_due(Instant::now() + IDLE_TIMEOUT + Duration::from_millis(100));
        assert_eq!(idle.len(), 1);
        slider.timeout(&mut harness.helper(), idle[0].0);
        assert!(!slider.widget().visible);
        assert_eq!(harness.outbox.actions, vec![Action::Activate]);
    }

    #[test]
    fn test_track_rendering() {
        let mut slider = Slider::default();
        assert_eq!(slider.track(), format!("[>{}]", " ".repeat(TRACK_WIDTH)));
        slider.position = 50;
        assert_eq!(slider.track(), format!("[{}>{}]", "=".repeat(10), " ".repeat(10)));
    }
}
