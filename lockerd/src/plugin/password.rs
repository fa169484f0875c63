//! Password authenticator.
//!
//! The expected password is read from `password` in the `[auth::password]` section, either as
//! plain text or as a `crypt(3)` hash such as `$6$salt$...`. When the locked overlay is woken up, a prompt appears on the primary monitor; a correct password
//! requests `Unlock`, and a prompt left alone for a while goes back to the screen saver.

use std::env;
use std::time::Duration;

use locker_proto::Action;
use log::{debug, warn};
use zeroize::Zeroizing;

use crate::error::PluginError;
use crate::plugin::{AuthInput, AuthWidget, Authenticator, Helper};
use crate::timer::TimerId;

pub const NAME: &str = "password";

const SECTION: &str = "password";
const KEY: &str = "password";
const PROMPT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn create(_helper: &mut Helper<'_>) -> Result<Box<dyn Authenticator>, PluginError> {
    let user = env::var("USER").unwrap_or_else(|_| "its owner".to_string());
    Ok(Box::new(Password::new(user)))
}

pub struct Password {
    user: String,
    entry: Zeroizing<String>,
    message: Option<String>,
    prompting: bool,
    locked: bool,
    authenticated: bool,
    idle_timer: Option<TimerId>,
}

impl Password {
    pub fn new(user: String) -> Password {
        Password {
            user,
            entry: Zeroizing::new(String::new()),
            message: None,
            prompting: false,
            locked: false,
            authenticated: false,
            idle_timer: None,
        }
    }

    fn hide(&mut self, helper: &mut Helper<'_>) {
        self.prompting = false;
        self.entry.clear();
        self.message = None;
        if let Some(timer) = self.idle_timer.take() {
            helper.cancel_timeout(timer);
        }
    }

    fn prompt(&mut self, helper: &mut Helper<'_>) {
        self.prompting = true;
        if let Some(timer) = self.idle_timer.take() {
            helper.cancel_timeout(timer);
        }
        self.idle_timer = Some(helper.set_timeout(PROMPT_TIMEOUT));
    }

    fn verify(&mut self, helper: &mut Helper<'_>) {
        let expected = match helper.config_get(SECTION, KEY) {
            Some(password) => Zeroizing::new(password.to_string()),
            None => {
                self.message = Some("No password was set".to_string());
                return;
            }
        };

        if matches(&expected, &self.entry) {
            debug!("Password accepted");
            self.authenticated = true;
            self.entry.clear();
            self.message = Some("Unlocking...".to_string());
            if let Err(err) = helper.action(Action::Unlock) {
                helper.error(&err.to_string(), 1);
            }
        } else {
            warn!("Authentication failed for {}", self.user);
            self.entry.clear();
            self.message = Some("Authentication failed".to_string());
        }
    }
}

impl Authenticator for Password {
    fn widget(&self) -> AuthWidget {
        if !self.prompting {
            return AuthWidget::hidden();
        }

        let mut lines = vec![
            format!("This screen is locked by {}", self.user),
            format!("Password: {}", "*".repeat(self.entry.chars().count())),
        ];
        if let Some(ref message) = self.message {
            lines.push(message.clone());
        }
        AuthWidget::shown(lines)
    }

    fn action(&mut self, helper: &mut Helper<'_>, action: Action) -> Result<(), PluginError> {
        match action {
            Action::Activate | Action::Start => self.hide(helper),
            Action::Deactivate => {
                if self.locked {
                    self.prompt(helper);
                }
            }
            Action::Lock => {
                if helper.config_get(SECTION, KEY).is_none() {
                    return Err(PluginError::failed("No password was set"));
                }
                self.locked = true;
                self.authenticated = false;
                self.hide(helper);
            }
            Action::Unlock => {
                if self.locked && !self.authenticated {
                    return Err(PluginError::failed("The password was not entered"));
                }
                self.locked = false;
                self.authenticated = false;
                self.hide(helper);
            }
            _ => {}
        }
        Ok(())
    }

    fn input(&mut self, helper: &mut Helper<'_>, input: AuthInput) {
        if !self.locked || self.authenticated {
            return;
        }
        // Any key wakes the prompt up, and restarts its timeout
        self.prompt(helper);

        match input {
            AuthInput::Char(c) => {
                self.message = None;
                self.entry.push(c);
            }
            AuthInput::Backspace => {
                self.entry.pop();
            }
            AuthInput::Escape => self.entry.clear(),
            AuthInput::Enter => self.verify(helper),
            AuthInput::Left | AuthInput::Right => {}
        }
    }

    fn timeout(&mut self, helper: &mut Helper<'_>, timer: TimerId) {
        if self.idle_timer != Some(timer) {
            return;
        }
        self.idle_timer = None;
        debug!("Password prompt timed out");
        self.hide(helper);
        if let Err(err) = helper.action(Action::Activate) {
            helper.error(&err.to_string(), 1);
        }
    }
}

/// Checks an entry against a stored password. Values starting with `$` are crypt hashes.
fn matches(expected: &str, entry: &str) -> bool {
    if expected.starts_with('$') {
        pwhash::unix::verify(entry, expected)
    } else {
        constant_time_eq(expected.as_bytes(), entry.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::config::Config;
    use crate::plugin::{Outbox, PluginKind};
    use crate::timer::{TimerOwner, Timers};

    struct Harness {
        config: Config,
        timers: Timers,
        outbox: Outbox,
    }

    impl Harness {
        fn new(password: Option<&str>) -> Harness {
            let mut config = Config::default();
            config.set("auth::password", "password", password);
            Harness {
                config,
                timers: Timers::new(),
                outbox: Outbox::default(),
            }
        }

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

    fn type_text(auth: &mut Password, harness: &mut Harness, text: &str) {
        for c in text.chars() {
            auth.input(&mut harness.helper(), AuthInput::Char(c));
        }
    }

    #[test]
    fn test_lock_without_password_fails() {
        let mut harness = Harness::new(None);
        let mut auth = Password::new("alice".to_string());
        let err = auth.action(&mut harness.helper(), Action::Lock).unwrap_err();
        assert_eq!(err, PluginError::failed("No password was set"));
        // Nothing was locked, so unlocking stays possible
        assert!(auth.action(&mut harness.helper(), Action::Unlock).is_ok());
    }

    #[test]
    fn test_unlock_requires_password() {
        let mut harness = Harness::new(Some("hunter2"));
        let mut auth = Password::new("alice".to_string());
        auth.action(&mut harness.helper(), Action::Lock).unwrap();
        assert!(auth.action(&mut harness.helper(), Action::Unlock).is_err());
    }

    #[test]
    fn test_correct_password_requests_unlock() {
        let mut harness = Harness::new(Some("hunter2"));
        let mut auth = Password::new("alice".to_string());
        auth.action(&mut harness.helper(), Action::Lock).unwrap();
        auth.action(&mut harness.helper(), Action::Deactivate).unwrap();
        assert!(auth.widget().visible);

        type_text(&mut auth, &mut harness, "hunter2");
        assert_eq!(auth.widget().lines[1], "Password: *******");
        auth.input(&mut harness.helper(), AuthInput::Enter);

        assert_eq!(harness.outbox.actions, vec![Action::Unlock]);
        assert!(auth.action(&mut harness.helper(), Action::Unlock).is_ok());
        assert!(!auth.widget().visible);
    }

    #[test]
    fn test_wrong_password_clears_entry() {
        let mut harness = Harness::new(Some("hunter2"));
        let mut auth = Password::new("alice".to_string());
        auth.action(&mut harness.helper(), Action::Lock).unwrap();
        type_text(&mut auth, &mut harness, "hunter3");
        auth.input(&mut harness.helper(), AuthInput::Enter);

        assert!(harness.outbox.actions.is_empty());
        let widget = auth.widget();
        assert_eq!(widget.lines[1], "Password: ");
        assert_eq!(widget.lines[2], "Authentication failed");
        assert!(auth.action(&mut harness.helper(), Action::Unlock).is_err());
    }

    #[test]
    fn test_backspace_and_escape() {
        let mut harness = Harness::new(Some("ab"));
        let mut auth = Password::new("alice".to_string());
        auth.action(&mut harness.helper(), Action::Lock).unwrap();
        type_text(&mut auth, &mut harness, "abc");
        auth.input(&mut harness.helper(), AuthInput::Backspace);
        auth.input(&mut harness.helper(), AuthInput::Enter);
        assert_eq!(harness.outbox.actions, vec![Action::Unlock]);

        let mut auth = Password::new("alice".to_string());
        auth.action(&mut harness.helper(), Action::Lock).unwrap();
        type_text(&mut auth, &mut harness, "xyz");
        auth.input(&mut harness.helper(), AuthInput::Escape);
        assert_eq!(auth.widget().lines[1], "Password: ");
    }

    #[test]
    fn test_input_ignored_when_not_locked() {
        let mut harness = Harness::new(Some("hunter2"));
        let mut auth = Password::new("alice".to_string());
        type_text(&mut auth, &mut harness, "hunter2");
        auth.input(&mut harness.helper(), AuthInput::Enter);
        assert!(harness.outbox.actions.is_empty());
        assert!(!auth.widget().visible);
    }

    #[test]
    fn test_idle_prompt_reactivates() {
        let mut harness = Harness::new(Some("hunter2"));
        let mut auth = Password::new("alice".to_string());
        auth.action(&mut harness.helper(), Action::Lock).unwrap();
        auth.action(&mut harness.helper(), Action::Deactivate).unwrap();

        let due = harness
            .timers
            .take_due(Instant::now() + PROMPT_TIMEOUT + Duration::from_secs(1));
        assert_eq!(due.len(), 1);
        auth.timeout(&mut harness.helper(), due[0].0);

        assert!(!auth.widget().visible);
        assert_eq!(harness.outbox.actions, vec![Action::Activate]);
    }

    const SHA512_HUNTER2: &str = "$6$saltsalt$8iYtNHxjWRl.NF6oNZ5tF.iKFlQREaXBLlSmZKP6dy9l5z3vsooWNW0/GZ6Nej73/TFug6pIPSqbJoCT6dfnj.";

    #[test]
    fn test_crypt_hash_password() {
        let mut harness = Harness::new(Some(SHA512_HUNTER2));
        let mut auth = Password::new("alice".to_string());
        auth.action(&mut harness.helper(), Action::Lock).unwrap();

        type_text(&mut auth, &mut harness, "hunter3");
        auth.input(&mut harness.helper(), AuthInput::Enter);
        assert!(harness.outbox.actions.is_empty());

        type_text(&mut auth, &mut harness, "hunter2");
        auth.input(&mut harness.helper(), AuthInput::Enter);
        assert_eq!(harness.outbox.actions, vec![Action::Unlock]);
    }

    #[test]
    fn test_matches() {
        assert!(matches("hunter2", "hunter2"));
        assert!(!matches("hunter2", "$6$hunter2"));
        assert!(matches(
            "$5$saltsalt$OIdfjX.u4Y3SJ4I2bX8w5BMf1VAUhHABNUirScDzZi3",
            "hunter2"
        ));
        assert!(!matches(
            "$5$saltsalt$OIdfjX.u4Y3SJ4I2bX8w5BMf1VAUhHABNUirScDzZi3",
            "$5$saltsalt$OIdfjX.u4Y3SJ4I2bX8w5BMf1VAUhHABNUirScDzZi3"
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
    }
}
