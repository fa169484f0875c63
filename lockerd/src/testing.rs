//! In-memory display, power and notification backends plus scriptable plugins for driving the
//! controller in tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use locker_proto::{Action, Event};

use crate::config::Config;
use crate::controller::Controller;
use crate::display::{Display, Geometry, Monitor, Painter, Rgb, WindowId};
use crate::error::{DisplayError, PluginError, PowerError};
use crate::grab::InputGrab;
use crate::monitor::OverlayWindow;
use crate::notify::Notifier;
use crate::plugin::{AuthWidget, Authenticator, Demo, Helper, Observer, PluginRegistry};
use crate::power::Power;
use crate::preferences::Preferences;

pub(crate) const ROOT_WINDOW: WindowId = 0x100;

pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

#[derive(Debug)]
pub(crate) struct DisplayState {
    pub monitors: Vec<Monitor>,
    pub fail_monitors: bool,
    pub fail_create_at: Option<usize>,
    pub create_calls: usize,
    pub created: Vec<WindowId>,
    pub destroyed: Vec<WindowId>,
    pub visible: HashSet<WindowId>,
    pub geometry: HashMap<WindowId, Geometry>,
    pub focused: Option<WindowId>,
    pub keyboard_grab: Option<WindowId>,
    pub pointer_grab: Option<WindowId>,
    pub keyboard_grab_attempts: u32,
    pub pointer_grab_attempts: u32,
    pub ungrabs: u32,
    pub refuse_keyboard: bool,
    pub refuse_pointer: bool,
    pub fills: Vec<(WindowId, Rgb)>,
    pub widgets: Vec<(WindowId, AuthWidget)>,
    pub screensaver_activations: u32,
    pub resets: u32,
    pub preferences: Option<Preferences>,
    pub unregistered: u32,
    next_id: WindowId,
}

impl Default for DisplayState {
    fn default() -> Self {
        DisplayState {
            monitors: vec![Monitor::new(Geometry::new(0, 0, 1920, 1080), true)],
            fail_monitors: false,
            fail_create_at: None,
            create_calls: 0,
            created: Vec::new(),
            destroyed: Vec::new(),
            visible: HashSet::new(),
            geometry: HashMap::new(),
            focused: None,
            keyboard_grab: None,
            pointer_grab: None,
            keyboard_grab_attempts: 0,
            pointer_grab_attempts: 0,
            ungrabs: 0,
            refuse_keyboard: false,
            refuse_pointer: false,
            fills: Vec::new(),
            widgets: Vec::new(),
            screensaver_activations: 0,
            resets: 0,
            preferences: None,
            unregistered: 0,
            next_id: 0x200,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDisplay {
    pub state: DisplayState,
    pub journal: Journal,
}

impl FakeDisplay {
    pub fn new() -> FakeDisplay {
        FakeDisplay::default()
    }

    fn log(&self, entry: String) {
        self.journal.borrow_mut().push(entry);
    }
}

impl Painter for FakeDisplay {
    fn fill(&mut self, window: WindowId, color: Rgb) {
        self.state.fills.push((window, color));
    }
}

impl Display for FakeDisplay {
    fn root_window(&self) -> WindowId {
        ROOT_WINDOW
    }

    fn monitors(&mut self) -> Result<Vec<Monitor>, DisplayError> {
        if self.state.fail_monitors {
            return Err(DisplayError::Request {
                request: "GetMonitors",
                code: 17,
            });
        }
        Ok(self.state.monitors.clone())
    }

    fn create_window(&mut self, geometry: Geometry) -> Result<WindowId, DisplayError> {
        let call = self.state.create_calls;
        self.state.create_calls += 1;
        if self.state.fail_create_at == Some(call) {
            return Err(DisplayError::Request {
                request: "CreateWindow",
                code: 11,
            });
        }
        self.state.next_id += 1;
        let id = self.state.next_id;
        self.state.created.push(id);
        self.state.geometry.insert(id, geometry);
        Ok(id)
    }

    fn configure_window(&mut self, window: WindowId, geometry: Geometry) {
        self.state.geometry.insert(window, geometry);
    }

    fn destroy_window(&mut self, window: WindowId) {
        self.state.destroyed.push(window);
        self.state.visible.remove(&window);
        self.state.geometry.remove(&window);
        self.log(format!("destroy:{:#x}", window));
    }

    fn show_window(&mut self, window: WindowId) {
        self.state.visible.insert(window);
    }

    fn hide_window(&mut self, window: WindowId) {
        self.state.visible.remove(&window);
    }

    fn focus_window(&mut self, window: WindowId) {
        self.state.focused = Some(window);
    }

    fn grab_keyboard(&mut self, window: WindowId) -> bool {
        self.state.keyboard_grab_attempts += 1;
        if self.state.refuse_keyboard {
            return false;
        }
        self.state.keyboard_grab = Some(window);
        true
    }

    fn grab_pointer(&mut self, window: WindowId) -> bool {
        self.state.pointer_grab_attempts += 1;
        if self.state.refuse_pointer {
            return false;
        }
        self.state.pointer_grab = Some(window);
        true
    }

    fn ungrab_keyboard(&mut self) {
        self.state.keyboard_grab = None;
        self.state.ungrabs += 1;
        self.log("ungrab".to_string());
    }

    fn ungrab_pointer(&mut self) {
        self.state.pointer_grab = None;
    }

    fn draw_widget(&mut self, window: WindowId, widget: &AuthWidget) {
        self.state.widgets.push((window, widget.clone()));
    }

    fn activate_screensaver(&mut self) {
        self.state.screensaver_activations += 1;
    }

    fn reset_screensaver(&mut self) {
        self.state.resets += 1;
    }

    fn show_preferences(&mut self, preferences: Option<&Preferences>) {
        self.state.preferences = preferences.cloned();
    }

    fn unregister_screensaver(&mut self) {
        self.state.unregistered += 1;
        self.log("unregister".to_string());
    }

    fn flush(&mut self) {}
}

/// Shared record of what the fakes and scripted plugins saw, plus knobs scripting their answers.
#[derive(Default)]
pub(crate) struct Probe {
    pub journal: Journal,
    /// Actions the scripted authenticator refuses.
    pub refuse: RefCell<Vec<Action>>,
    /// Events the watcher observers veto.
    pub veto: RefCell<Vec<Event>>,
    /// When the authenticator receives the first action, it requests the second.
    pub requests: RefCell<Vec<(Action, Action)>>,
    pub suspends: Cell<u32>,
    pub fail_suspend: Cell<bool>,
    pub notifications: RefCell<Vec<String>>,
}

impl Probe {
    pub fn new() -> Rc<Probe> {
        Rc::new(Probe::default())
    }

    pub fn log<S: Into<String>>(&self, entry: S) {
        self.journal.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.journal.borrow().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.journal.borrow_mut().clear();
    }
}

pub(crate) struct FakePower(pub Rc<Probe>);

impl Power for FakePower {
    fn suspend(&mut self) -> Result<(), PowerError> {
        if self.0.fail_suspend.get() {
            return Err(PowerError::Sysfs {
                path: "/sys/power/state".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        self.0.suspends.set(self.0.suspends.get() + 1);
        self.0.log("suspend");
        Ok(())
    }
}

pub(crate) struct RecordingNotifier(pub Rc<Probe>);

impl Notifier for RecordingNotifier {
    fn notify(&mut self, _summary: &str, body: &str) {
        self.0.notifications.borrow_mut().push(body.to_string());
    }
}

struct ScriptedAuth(Rc<Probe>);

impl Authenticator for ScriptedAuth {
    fn widget(&self) -> AuthWidget {
        AuthWidget::shown(vec!["scripted".to_string()])
    }

    fn action(&mut self, helper: &mut Helper<'_>, action: Action) -> Result<(), PluginError> {
        self.0.log(format!("auth:{}", action));
        let requested: Vec<Action> = self
            .0
            .requests
            .borrow()
            .iter()
            .filter(|(on, _)| *on == action)
            .map(|(_, request)| *request)
            .collect();
        for request in requested {
            helper.action(request)?;
        }
        if self.0.refuse.borrow().contains(&action) {
            return Err(PluginError::failed(format!("refused to {}", action)));
        }
        Ok(())
    }
}

impl Drop for ScriptedAuth {
    fn drop(&mut self) {
        self.0.log("drop:auth");
    }
}

struct CountingDemo(Rc<Probe>);

impl Demo for CountingDemo {
    fn add(&mut self, window: &OverlayWindow) -> Result<(), PluginError> {
        self.0.log(format!("demo:add:{:#x}", window.id));
        Ok(())
    }

    fn remove(&mut self, window: WindowId) {
        self.0.log(format!("demo:remove:{:#x}", window));
    }

    fn reload(&mut self, _helper: &mut Helper<'_>) {
        self.0.log("demo:reload");
    }

    fn start(&mut self, _helper: &mut Helper<'_>, _painter: &mut dyn Painter) {
        self.0.log("demo:start");
    }

    fn stop(&mut self, _helper: &mut Helper<'_>, _painter: &mut dyn Painter) {
        self.0.log("demo:stop");
    }

    fn cycle(&mut self, _helper: &mut Helper<'_>, _painter: &mut dyn Painter) {
        self.0.log("demo:cycle");
    }
}

impl Drop for CountingDemo {
    fn drop(&mut self) {
        self.0.log("drop:demo");
    }
}

struct Watcher {
    name: &'static str,
    probe: Rc<Probe>,
}

impl Observer for Watcher {
    fn event(&mut self, _helper: &mut Helper<'_>, event: Event) -> Result<(), PluginError> {
        self.probe.log(format!("{}:{}", self.name, event));
        if self.probe.veto.borrow().contains(&event) {
            return Err(PluginError::failed(format!("{} vetoed {}", self.name, event)));
        }
        Ok(())
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.probe.log(format!("drop:{}", self.name));
    }
}

/// The built-in plugins plus the scripted `scripted` authenticator, `counting` demo and
/// `watcher`/`spy` observers, all reporting to `probe`.
pub(crate) fn registry(probe: &Rc<Probe>) -> PluginRegistry {
    let mut registry = PluginRegistry::builtin();
    let p = Rc::clone(probe);
    registry.register_authenticator(
        "scripted",
        Box::new(move |_: &mut Helper<'_>| Ok(Box::new(ScriptedAuth(Rc::clone(&p))) as Box<dyn Authenticator>)),
    );
    let p = Rc::clone(probe);
    registry.register_demo(
        "counting",
        Box::new(move |_: &mut Helper<'_>| Ok(Box::new(CountingDemo(Rc::clone(&p))) as Box<dyn Demo>)),
    );
    for &name in &["watcher", "spy"] {
        let p = Rc::clone(probe);
        registry.register_observer(
            name,
            Box::new(move |_: &mut Helper<'_>| {
                Ok(Box::new(Watcher {
                    name,
                    probe: Rc::clone(&p),
                }) as Box<dyn Observer>)
            }),
        );
    }
    registry
}

/// Controller over a [`FakeDisplay`] configured from `config` (TOML). The scripted authenticator
/// is used unless `config` names another.
pub(crate) fn controller(probe: &Rc<Probe>, config: &str) -> Controller<FakeDisplay> {
    controller_with(probe, config, FakeDisplay::new())
}

pub(crate) fn controller_with(
    probe: &Rc<Probe>,
    config: &str,
    mut display: FakeDisplay,
) -> Controller<FakeDisplay> {
    let mut config = Config::parse(config).unwrap();
    if config.get("", "auth").is_none() {
        config.set("", "auth", Some("scripted"));
    }
    display.journal = Rc::clone(&probe.journal);
    Controller::new(
        display,
        registry(probe),
        config,
        Box::new(FakePower(Rc::clone(probe))),
        Box::new(RecordingNotifier(Rc::clone(probe))),
    )
    .unwrap()
    .with_grab(InputGrab::with_retries(2, Duration::from_millis(0)))
}
