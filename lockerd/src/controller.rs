//! The lock controller.
//!
//! A single [`Controller`] owns the overlay windows, the input grab, the plugin sessions and the
//! `enabled`/`locked`/`active` flags, and is the only place they change. Idle notifications,
//! timers, client messages and plugin requests all funnel into the transitions below.
//!
//! Transitions check with the observers before touching any state. A transition that is not
//! forced is abandoned when an observer vetoes its pre-event; forced transitions (those chained
//! from another transition or triggered by the idle source) still announce the pre-event but go
//! ahead regardless. Input is grabbed exactly while the screen is locked or active.

use std::mem;
use std::path::PathBuf;
use std::time::Instant;

use locker_proto::{Action, Event, Message};
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::display::{Display, DisplayEvent, Painter, WindowId};
use crate::error::{LockerError, PluginError};
use crate::grab::InputGrab;
use crate::idle::{AutoLock, IdleEvent, LockDelay};
use crate::monitor::MonitorRegistry;
use crate::notify::Notifier;
use crate::plugin::{
    AuthInput, AuthSession, AuthWidget, DemoSession, Helper, ObserverSession, Outbox, PluginKind,
    PluginRegistry,
};
use crate::power::Power;
use crate::preferences::Preferences;
use crate::timer::{TimerOwner, Timers};

/// Plugin requests dispatched per flush. A plugin answering every action with another one would
/// otherwise keep the controller busy forever.
const MAX_QUEUED_ACTIONS: usize = 32;

const NOTIFICATION_SUMMARY: &str = "Screen locker";

/// State lent to plugins through their [`Helper`].
#[derive(Debug, Default)]
struct Host {
    config: Config,
    timers: Timers,
    outbox: Outbox,
}

impl Host {
    fn helper(&mut self, kind: PluginKind, owner: TimerOwner) -> Helper<'_> {
        Helper::new(
            kind,
            owner,
            &mut self.config,
            &mut self.timers,
            &mut self.outbox,
        )
    }

    fn auth_helper(&mut self) -> Helper<'_> {
        self.helper(PluginKind::Authenticator, TimerOwner::Authenticator)
    }

    fn demo_helper(&mut self) -> Helper<'_> {
        self.helper(PluginKind::Demo, TimerOwner::Demo)
    }

    fn observer_helper(&mut self, name: &str) -> Helper<'_> {
        self.helper(PluginKind::Observer, TimerOwner::Observer(name.to_string()))
    }
}

pub struct Controller<D: Display> {
    display: D,
    power: Box<dyn Power>,
    notifier: Box<dyn Notifier>,
    registry: PluginRegistry,
    host: Host,
    config_path: Option<PathBuf>,
    config_dirty: bool,

    enabled: bool,
    locked: bool,
    active: bool,
    preferences_shown: bool,

    monitors: MonitorRegistry,
    auth: Option<AuthSession>,
    demo: Option<DemoSession>,
    observers: Vec<ObserverSession>,
    auto_lock: AutoLock,
    grab: InputGrab,
    shut_down: bool,
}

impl<D: Display> Controller<D> {
    /// Creates the controller: loads the plugins named by `config` and covers every monitor with
    /// an (unmapped) overlay window.
    ///
    /// # Errors
    /// Fails if the authentication plugin cannot be created or the monitors cannot be listed. A
    /// missing demo or observer plugin is only reported.
    pub fn new(
        display: D,
        registry: PluginRegistry,
        config: Config,
        power: Box<dyn Power>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Controller<D>, LockerError> {
        let mut controller = Controller {
            display,
            power,
            notifier,
            registry,
            host: Host {
                config,
                ..Host::default()
            },
            config_path: None,
            config_dirty: false,
            enabled: true,
            locked: false,
            active: false,
            preferences_shown: false,
            monitors: MonitorRegistry::new(),
            auth: None,
            demo: None,
            observers: Vec::new(),
            auto_lock: AutoLock::new(),
            grab: InputGrab::new(),
            shut_down: false,
        };

        controller.auth = Some(controller.create_auth()?);
        controller.load_demo();
        controller.load_observers();
        controller.refresh_monitors()?;
        controller.flush_outbox();
        controller.display.flush();
        Ok(controller)
    }

    /// File the configuration is reloaded from, and saved to when a plugin changed it.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn with_grab(mut self, grab: InputGrab) -> Self {
        self.grab = grab;
        self
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn config(&self) -> &Config {
        &self.host.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_grabbed(&self) -> bool {
        self.grab.is_grabbed()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// When the event loop should next call [`Controller::run_timers`].
    pub fn next_deadline(&self) -> Option<Instant> {
        self.host.timers.next_deadline()
    }

    /// Performs an action requested from outside the locker (the control utility, logind).
    ///
    /// `flag` shows (`true`) or hides the preferences for [`Action::ShowPreferences`] and is
    /// ignored otherwise. An explicit `Deactivate` also restarts the platform idle timer.
    pub fn dispatch(&mut self, action: Action, flag: bool) -> Result<(), LockerError> {
        if self.shut_down {
            return Err(LockerError::ShutDown);
        }
        info!("Received {} request", action);
        let result = match action {
            Action::ShowPreferences => {
                self.show_preferences(flag);
                Ok(())
            }
            Action::Deactivate => self.deactivate(false, true),
            _ => self.perform(action, false),
        };
        self.flush_outbox();
        self.redraw();
        self.display.flush();
        result
    }

    /// Decodes and dispatches a locker client message.
    pub fn handle_client_message(&mut self, data: &[u32]) -> Result<(), LockerError> {
        match Message::decode(data)? {
            Message::Action { action, flag } => self.dispatch(action, flag),
        }
    }

    /// Reacts to a display event. Failures are reported rather than returned.
    pub fn handle_event(&mut self, event: DisplayEvent) {
        if self.shut_down {
            return;
        }
        let result = match event {
            DisplayEvent::Idle(idle) => self.handle_idle(idle),
            DisplayEvent::TopologyChanged => self.handle_topology_change(),
            DisplayEvent::ClientMessage(data) => self.handle_client_message(&data),
            DisplayEvent::Input(input) => {
                self.handle_input(input);
                Ok(())
            }
            DisplayEvent::Exposed(window) => {
                if self.monitors.primary_window().map(|w| w.id) == Some(window) {
                    self.redraw();
                }
                Ok(())
            }
        };
        match result {
            Ok(()) => (),
            Err(LockerError::Message { source }) => warn!("Ignoring client message: {}", source),
            Err(err) => self.report_failure(&err),
        }
        self.flush_outbox();
        self.display.flush();
    }

    /// Reacts to a screen saver state change.
    pub fn handle_idle(&mut self, event: IdleEvent) -> Result<(), LockerError> {
        debug!("Screen saver event {:?}", event);
        let result = match event {
            IdleEvent::Off => {
                self.enable();
                self.deactivate(false, false)
            }
            IdleEvent::On => self.idle_on(),
            IdleEvent::Cycle => self.cycle(false),
            IdleEvent::Disabled => {
                self.disable();
                Ok(())
            }
        };
        self.flush_outbox();
        self.redraw();
        result
    }

    fn idle_on(&mut self) -> Result<(), LockerError> {
        if self.locked {
            return self.activate(true);
        }
        if !self.enabled {
            debug!("Locking is disabled, only activating");
            return self.activate(true);
        }

        match self.host.config.lock_delay() {
            LockDelay::Never => self.activate(true),
            LockDelay::Immediate => self.lock(true),
            LockDelay::After(delay) => {
                self.activate(true)?;
                self.auto_lock.arm(&mut self.host.timers, delay);
                Ok(())
            }
        }
    }

    /// Fires every timer due at `now`.
    pub fn run_timers(&mut self, now: Instant) {
        if self.shut_down {
            return;
        }
        for (id, owner) in self.host.timers.take_due(now) {
            match owner {
                TimerOwner::AutoLock => {
                    if self.auto_lock.fired(id) {
                        info!("Lock delay expired");
                        if let Err(err) = self.lock(true) {
                            self.report_failure(&err);
                        }
                    }
                }
                TimerOwner::Authenticator => {
                    if let Some(ref mut session) = self.auth {
                        let mut helper = self.host.auth_helper();
                        session.plugin.timeout(&mut helper, id);
                    }
                }
                TimerOwner::Demo => {
                    if let Some(ref mut session) = self.demo {
                        let mut helper = self.host.demo_helper();
                        session
                            .plugin
                            .timeout(&mut helper, &mut self.display as &mut dyn Painter, id);
                    }
                }
                TimerOwner::Observer(name) => {
                    if let Some(session) = self.observers.iter_mut().find(|o| o.name == name) {
                        let mut helper = self.host.observer_helper(&session.name);
                        session.plugin.timeout(&mut helper, id);
                    }
                }
            }
            self.flush_outbox();
        }
        self.redraw();
        self.display.flush();
    }

    /// Forwards keyboard input to the authenticator while locked.
    pub fn handle_input(&mut self, input: AuthInput) {
        if !self.locked {
            return;
        }
        if let Some(ref mut session) = self.auth {
            let mut helper = self.host.auth_helper();
            session.plugin.input(&mut helper, input);
        }
        self.flush_outbox();
        self.redraw();
    }

    /// Re-enumerates the monitors. When the primary window changed under an open grab, focus and
    /// grab follow it, to the root window if no overlay is left.
    pub fn handle_topology_change(&mut self) -> Result<(), LockerError> {
        info!("Monitor configuration changed");
        self.refresh_monitors()?;

        if self.grab.is_grabbed() {
            let window = self.grab_target();
            if self.grab.window() != Some(window) {
                debug!("Input now goes to {:#x}", window);
                self.display.focus_window(window);
                let failures = self.grab.acquire(&mut self.display, window);
                self.report_grab_failures(failures.keyboard, failures.pointer);
            }
        }
        self.redraw();
        Ok(())
    }

    /// Locks ahead of a system sleep. Forced, so observers cannot hold it up.
    pub fn prepare_for_sleep(&mut self) {
        info!("Locking before sleep");
        if let Err(err) = self.lock(true) {
            self.report_failure(&err);
        }
        self.flush_outbox();
        self.redraw();
        self.display.flush();
    }

    fn perform(&mut self, action: Action, force: bool) -> Result<(), LockerError> {
        match action {
            Action::Activate => self.activate(force),
            Action::Deactivate => self.deactivate(force, false),
            Action::Disable => {
                self.disable();
                Ok(())
            }
            Action::Enable => {
                self.enable();
                Ok(())
            }
            Action::Lock => self.lock(force),
            Action::Cycle => self.cycle(force),
            Action::Reload => self.reload(),
            Action::ShowPreferences => {
                let show = !self.preferences_shown;
                self.show_preferences(show);
                Ok(())
            }
            Action::Start => {
                self.start();
                Ok(())
            }
            Action::Stop => {
                self.stop_demo();
                Ok(())
            }
            Action::Suspend => self.suspend(force),
            Action::Unlock => self.unlock(force),
        }
    }

    fn enable(&mut self) {
        if !self.enabled {
            info!("Enabling automatic locking");
            self.enabled = true;
        }
    }

    fn disable(&mut self) {
        if self.locked {
            info!("Not disabling while locked");
            return;
        }
        if self.enabled {
            info!("Disabling automatic locking");
            self.enabled = false;
        }
        self.auto_lock.cancel(&mut self.host.timers);
    }

    fn activate(&mut self, force: bool) -> Result<(), LockerError> {
        self.pre_event(Event::Activating, force)?;
        self.auth_action(Action::Activate)?;

        info!("Activating");
        let was_active = self.active;
        self.active = true;
        self.cover();
        if !was_active {
            self.start_demo();
            self.display.activate_screensaver();
        }
        self.redraw();
        self.post_event(Event::Activated);
        Ok(())
    }

    /// Leaves the active state. While locked the overlay stays up and the authenticator gets a
    /// chance to prompt; otherwise the overlay goes away. With `reset`, the platform idle timer
    /// restarts too.
    fn deactivate(&mut self, force: bool, reset: bool) -> Result<(), LockerError> {
        if !self.locked && !self.active {
            self.auto_lock.cancel(&mut self.host.timers);
            if reset {
                self.display.reset_screensaver();
            }
            return Ok(());
        }

        self.pre_event(Event::Deactivating, force)?;
        if self.locked {
            self.auth_action(Action::Deactivate)?;
        }

        info!("Deactivating");
        self.auto_lock.cancel(&mut self.host.timers);
        self.active = false;
        self.stop_demo();
        if !self.locked {
            self.uncover();
        }
        if reset {
            self.display.reset_screensaver();
        }
        self.redraw();
        self.post_event(Event::Deactivated);
        Ok(())
    }

    fn lock(&mut self, force: bool) -> Result<(), LockerError> {
        if self.locked {
            debug!("Already locked");
            return Ok(());
        }
        self.pre_event(Event::Locking, force)?;

        info!("Locking");
        self.auto_lock.cancel(&mut self.host.timers);
        self.locked = true;
        if let Err(err) = self.activate(true) {
            // The screen is locked whatever the authenticator thinks of activating
            self.report_failure(&err);
            self.cover();
        }
        let result = self.auth_action(Action::Lock);
        self.redraw();
        self.post_event(Event::Locked);
        result
    }

    fn unlock(&mut self, force: bool) -> Result<(), LockerError> {
        self.pre_event(Event::Unlocking, force)?;
        self.auth_action(Action::Unlock)?;

        if self.locked {
            info!("Unlocking");
            self.locked = false;
        }
        self.auto_lock.cancel(&mut self.host.timers);
        self.uncover();
        self.deactivate(true, true)?;
        self.post_event(Event::Unlocked);
        Ok(())
    }

    fn cycle(&mut self, force: bool) -> Result<(), LockerError> {
        self.pre_event(Event::Cycling, force)?;
        self.activate(true)?;
        if let Some(ref mut session) = self.demo {
            let mut helper = self.host.demo_helper();
            session
                .plugin
                .cycle(&mut helper, &mut self.display as &mut dyn Painter);
        }
        self.post_event(Event::Cycled);
        Ok(())
    }

    /// Locks, then suspends the machine. A failure to suspend leaves the screen locked.
    fn suspend(&mut self, force: bool) -> Result<(), LockerError> {
        self.pre_event(Event::Suspending, force)?;
        self.lock(true)?;
        self.display.flush();
        self.power.suspend()?;
        Ok(())
    }

    fn start(&mut self) {
        self.display.activate_screensaver();
        self.start_demo();
    }

    fn start_demo(&mut self) {
        if let Some(ref mut session) = self.demo {
            if !session.running {
                debug!("Starting demo {}", session.name);
                session.running = true;
                let mut helper = self.host.demo_helper();
                session
                    .plugin
                    .start(&mut helper, &mut self.display as &mut dyn Painter);
            }
        }
    }

    fn stop_demo(&mut self) {
        if let Some(ref mut session) = self.demo {
            if session.running {
                debug!("Stopping demo {}", session.name);
                session.running = false;
                let mut helper = self.host.demo_helper();
                session
                    .plugin
                    .stop(&mut helper, &mut self.display as &mut dyn Painter);
            }
        }
    }

    /// Re-reads the configuration and brings the plugin sessions in line with it.
    fn reload(&mut self) -> Result<(), LockerError> {
        info!("Reloading configuration");
        if let Some(path) = self.config_path.clone() {
            self.save_config();
            self.host.config = Config::load(&path)?;
        }

        let result = self.reload_auth();
        self.reload_demo();
        self.reload_observers();

        if let Some(ref mut session) = self.demo {
            let mut helper = self.host.demo_helper();
            session.plugin.reload(&mut helper);
        }
        if let Err(err) = self.auth_action(Action::Reload) {
            self.report_failure(&err);
        }
        result
    }

    fn reload_auth(&mut self) -> Result<(), LockerError> {
        let wanted = self.host.config.auth().to_string();
        if self.auth.as_ref().map(|s| s.name.as_str()) == Some(wanted.as_str()) {
            return Ok(());
        }
        if self.locked {
            warn!("Not switching authentication to {} while locked", wanted);
            return Err(PluginError::failed(
                "The authentication plugin cannot change while the screen is locked",
            )
            .into());
        }

        let session = self.create_auth()?;
        info!("Switched authentication to {}", session.name);
        self.auth = Some(session);
        Ok(())
    }

    fn reload_demo(&mut self) {
        let wanted = self.host.config.demo().map(str::to_string);
        if self.demo.as_ref().map(|s| &s.name) == wanted.as_ref() {
            return;
        }

        let running = self.demo.as_ref().map_or(false, |s| s.running);
        self.unload_demo();
        self.load_demo();
        if running {
            self.start_demo();
        }
    }

    fn reload_observers(&mut self) {
        let wanted: Vec<String> = self
            .host
            .config
            .plugins()
            .into_iter()
            .map(str::to_string)
            .collect();

        let (kept, dropped): (Vec<ObserverSession>, Vec<ObserverSession>) =
            mem::take(&mut self.observers)
                .into_iter()
                .partition(|session| wanted.contains(&session.name));
        self.observers = kept;
        for session in dropped {
            info!("Unloading plugin {}", session.name);
            self.host
                .timers
                .cancel_owned_by(&TimerOwner::Observer(session.name.clone()));
        }

        for name in wanted {
            if !self.observers.iter().any(|s| s.name == name) {
                self.load_observer(&name);
            }
        }
    }

    fn show_preferences(&mut self, show: bool) {
        self.preferences_shown = show;
        if show {
            let preferences = Preferences::new(&self.host.config, &self.registry);
            self.display.show_preferences(Some(&preferences));
        } else {
            self.display.show_preferences(None);
        }
    }

    fn create_auth(&mut self) -> Result<AuthSession, LockerError> {
        let name = self.host.config.auth().to_string();
        debug!("Loading authentication plugin {}", name);
        let mut helper = self.host.auth_helper();
        let plugin = self.registry.create_authenticator(&name, &mut helper)?;
        Ok(AuthSession { name, plugin })
    }

    fn load_demo(&mut self) {
        let name = match self.host.config.demo() {
            Some(name) => name.to_string(),
            None => return,
        };
        debug!("Loading demo {}", name);
        let mut helper = self.host.demo_helper();
        match self.registry.create_demo(&name, &mut helper) {
            Ok(plugin) => {
                let mut session = DemoSession {
                    name,
                    plugin,
                    running: false,
                };
                for err in self.monitors.register_demo(&mut session) {
                    self.report(&format!("The demo could not use a window: {}", err));
                }
                self.demo = Some(session);
            }
            Err(err) => self.report(&format!("Could not load demo {}: {}", name, err)),
        }
    }

    fn unload_demo(&mut self) {
        if let Some(mut session) = self.demo.take() {
            info!("Unloading demo {}", session.name);
            if session.running {
                session.running = false;
                let mut helper = self.host.demo_helper();
                session
                    .plugin
                    .stop(&mut helper, &mut self.display as &mut dyn Painter);
            }
            self.monitors.unregister_demo(&mut session);
            drop(session);
            self.host.timers.cancel_owned_by(&TimerOwner::Demo);
        }
    }

    fn load_observers(&mut self) {
        let names: Vec<String> = self
            .host
            .config
            .plugins()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in names {
            self.load_observer(&name);
        }
    }

    fn load_observer(&mut self, name: &str) {
        debug!("Loading plugin {}", name);
        let mut helper = self.host.observer_helper(name);
        match self.registry.create_observer(name, &mut helper) {
            Ok(plugin) => self.observers.push(ObserverSession {
                name: name.to_string(),
                plugin,
            }),
            Err(err) => self.report(&format!("Could not load plugin {}: {}", name, err)),
        }
    }

    fn refresh_monitors(&mut self) -> Result<(), LockerError> {
        let monitors = self.display.monitors()?;
        let visible = self.locked || self.active;
        let errors = self
            .monitors
            .refresh(&mut self.display, &monitors, self.demo.as_mut(), visible);
        for message in errors.messages() {
            self.report(&message);
        }
        Ok(())
    }

    /// The primary overlay, or the root window when there is no overlay at all.
    fn grab_target(&self) -> WindowId {
        match self.monitors.primary_window() {
            Some(window) => window.id,
            None => {
                warn!("No overlay window, grabbing input on the root window");
                self.display.root_window()
            }
        }
    }

    /// Shows every overlay, then focuses and grabs the primary one.
    fn cover(&mut self) {
        self.monitors.show_all(&mut self.display);
        let window = self.grab_target();
        self.display.focus_window(window);
        let failures = self.grab.acquire(&mut self.display, window);
        self.report_grab_failures(failures.keyboard, failures.pointer);
    }

    fn uncover(&mut self) {
        self.grab.release(&mut self.display);
        self.monitors.hide_all(&mut self.display);
    }

    fn report_grab_failures(&mut self, keyboard: bool, pointer: bool) {
        if keyboard {
            self.report("Could not grab the keyboard, the screen is not fully locked");
        }
        if pointer {
            self.report("Could not grab the pointer");
        }
    }

    fn redraw(&mut self) {
        let window = match self.monitors.primary_window() {
            Some(window) => window.id,
            None => return,
        };
        let widget = match self.auth {
            Some(ref session) if self.locked || self.active => session.plugin.widget(),
            _ => AuthWidget::hidden(),
        };
        self.display.draw_widget(window, &widget);
    }

    fn auth_action(&mut self, action: Action) -> Result<(), LockerError> {
        let session = match self.auth {
            Some(ref mut session) => session,
            None => return Ok(()),
        };
        debug!("Authentication plugin {}: {}", session.name, action);
        let mut helper = self.host.auth_helper();
        session
            .plugin
            .action(&mut helper, action)
            .map_err(|source| LockerError::AuthRefused { action, source })
    }

    /// Sends `event` to every observer. Every observer hears about it even after one objected.
    fn broadcast(&mut self, event: Event) -> Result<(), LockerError> {
        let mut vetoed = false;
        for session in self.observers.iter_mut() {
            let mut helper = self.host.observer_helper(&session.name);
            if let Err(err) = session.plugin.event(&mut helper, event) {
                if event.is_pre() {
                    info!("Plugin {} objects to {}: {}", session.name, event, err);
                    vetoed = true;
                }
            }
        }
        if vetoed {
            Err(LockerError::Vetoed(event))
        } else {
            Ok(())
        }
    }

    fn pre_event(&mut self, event: Event, force: bool) -> Result<(), LockerError> {
        match self.broadcast(event) {
            Err(_) if force => {
                debug!("Ignoring objections to forced {}", event);
                Ok(())
            }
            result => result,
        }
    }

    fn post_event(&mut self, event: Event) {
        let _ = self.broadcast(event);
    }

    /// Runs the actions plugins asked for and reports their errors, until nothing is left.
    fn flush_outbox(&mut self) {
        let mut dispatched = 0;
        loop {
            for message in mem::take(&mut self.host.outbox.errors) {
                self.report(&message);
            }
            if mem::replace(&mut self.host.outbox.about, false) {
                self.show_about();
            }
            if mem::replace(&mut self.host.outbox.config_changed, false) {
                self.config_dirty = true;
            }

            let action = match self.host.outbox.actions.pop_front() {
                Some(action) => action,
                None => break,
            };
            if dispatched == MAX_QUEUED_ACTIONS || self.shut_down {
                warn!(
                    "Dropping {} queued plugin requests",
                    self.host.outbox.actions.len() + 1
                );
                self.host.outbox.actions.clear();
                break;
            }
            dispatched += 1;

            debug!("Plugin requested {}", action);
            if let Err(err) = self.perform(action, false) {
                self.report_failure(&err);
            }
        }
    }

    fn show_about(&mut self) {
        let about = format!("lockerd {}", env!("CARGO_PKG_VERSION"));
        info!("{}", about);
        if !self.locked {
            self.notifier.notify(NOTIFICATION_SUMMARY, &about);
        }
    }

    /// Tells the user something went wrong: always in the log, and as a desktop notification
    /// unless the screen is locked.
    pub fn report(&mut self, message: &str) {
        error!("{}", message);
        if !self.locked {
            self.notifier.notify(NOTIFICATION_SUMMARY, message);
        }
    }

    /// Reports a failed transition. Vetoes are expected and only logged.
    pub fn report_failure(&mut self, err: &LockerError) {
        match err {
            LockerError::Vetoed(event) => info!("Transition abandoned, a plugin vetoed {}", event),
            err => {
                let mut message = err.to_string();
                let mut source = std::error::Error::source(err);
                while let Some(cause) = source {
                    message.push_str(": ");
                    message.push_str(&cause.to_string());
                    source = cause.source();
                }
                self.report(&message);
            }
        }
    }

    fn save_config(&mut self) {
        if !self.config_dirty {
            return;
        }
        if let Some(ref path) = self.config_path {
            match self.host.config.save(path) {
                Ok(()) => {
                    debug!("Saved configuration to {}", path.display());
                    self.config_dirty = false;
                }
                Err(err) => error!("Could not save configuration: {}", err),
            }
        }
    }

    /// Tears everything down: the authenticator, the demo (after taking its windows back), the
    /// observers, the grab, the windows, and finally the screen saver registration. Only the
    /// first call does anything.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        info!("Shutting down");

        if let Some(session) = self.auth.take() {
            debug!("Destroying authentication plugin {}", session.name);
            drop(session);
        }
        self.unload_demo();
        for session in self.observers.drain(..) {
            debug!("Destroying plugin {}", session.name);
            drop(session);
        }
        self.auto_lock.cancel(&mut self.host.timers);
        self.host.outbox = Outbox::default();

        self.grab.release(&mut self.display);
        self.monitors.destroy_all(&mut self.display);
        self.display.unregister_screensaver();
        self.save_config();
        self.display.flush();
    }
}

impl<D: Display> Drop for Controller<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
