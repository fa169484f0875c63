//! One overlay window per physical monitor.
//!
//! The registry is indexed by monitor: slot `i` holds the overlay for the `i`th monitor of the
//! last enumeration, or nothing when that monitor is a clone of one already covered. Indices only
//! mean something until the next refresh.

use log::{debug, info, warn};

use crate::display::{Display, Geometry, Monitor, WindowId};
use crate::error::{DisplayError, PluginError};
use crate::plugin::DemoSession;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OverlayWindow {
    pub id: WindowId,
    pub geometry: Geometry,
    /// Whether the demo was told about this window. Keeps `add`/`remove` calls balanced.
    pub registered_with_demo: bool,
}

impl OverlayWindow {
    pub fn new(id: WindowId, geometry: Geometry) -> OverlayWindow {
        OverlayWindow {
            id,
            geometry,
            registered_with_demo: false,
        }
    }
}

/// Problems met while refreshing. None of them stop the refresh.
#[derive(Debug, Default)]
pub struct RefreshErrors {
    pub display: Vec<DisplayError>,
    pub demo: Vec<PluginError>,
}

impl RefreshErrors {
    pub fn is_empty(&self) -> bool {
        self.display.is_empty() && self.demo.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.display
            .iter()
            .map(|err| format!("Could not create an overlay window: {}", err))
            .chain(
                self.demo
                    .iter()
                    .map(|err| format!("The demo could not use a window: {}", err)),
            )
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MonitorRegistry {
    windows: Vec<Option<OverlayWindow>>,
    primary: usize,
}

impl MonitorRegistry {
    pub fn new() -> MonitorRegistry {
        MonitorRegistry::default()
    }

    /// Brings the overlays in line with `monitors`.
    ///
    /// Surplus slots are unregistered from the demo and destroyed. Every remaining slot is then
    /// checked against the windows before it: a monitor already covered by one of them (a cloned
    /// output) loses its window, any other monitor keeps its window, resized if needed, or gets a
    /// new one. The primary monitor always has its own window. New windows are handed to the demo,
    /// and mapped when `visible`.
    pub fn refresh(
        &mut self,
        display: &mut dyn Display,
        monitors: &[Monitor],
        mut demo: Option<&mut DemoSession>,
        visible: bool,
    ) -> RefreshErrors {
        let mut errors = RefreshErrors::default();

        while self.windows.len() > monitors.len() {
            if let Some(Some(window)) = self.windows.pop() {
                debug!("Removing overlay {:#x}", window.id);
                unregister(demo.as_deref_mut(), &window);
                display.destroy_window(window.id);
            }
        }
        self.windows.resize(monitors.len(), None);

        for (index, monitor) in monitors.iter().enumerate() {
            let clone = !monitor.primary && self.covered_before(index, &monitor.geometry);
            let current = self.windows[index].take();
            let slot = match (current, clone) {
                (Some(window), true) => {
                    info!(
                        "Monitor {} at {} is now a clone, removing its overlay",
                        index, monitor.geometry
                    );
                    unregister(demo.as_deref_mut(), &window);
                    display.destroy_window(window.id);
                    None
                }
                (Some(mut window), false) => {
                    if window.geometry != monitor.geometry {
                        debug!("Moving overlay {:#x} to {}", window.id, monitor.geometry);
                        window.geometry = monitor.geometry;
                        display.configure_window(window.id, monitor.geometry);
                    }
                    Some(window)
                }
                (None, true) => {
                    info!("Monitor {} at {} is a clone, not covering it", index, monitor.geometry);
                    None
                }
                (None, false) => match display.create_window(monitor.geometry) {
                    Ok(id) => {
                        let mut window = OverlayWindow::new(id, monitor.geometry);
                        debug!("Created overlay {:#x} on {}", window.id, monitor.geometry);
                        if let Some(session) = demo.as_deref_mut() {
                            match session.plugin.add(&window) {
                                Ok(()) => window.registered_with_demo = true,
                                Err(err) => errors.demo.push(err),
                            }
                        }
                        if visible {
                            display.show_window(window.id);
                        }
                        Some(window)
                    }
                    Err(err) => {
                        warn!("Could not create an overlay for monitor {}: {}", index, err);
                        errors.display.push(err);
                        None
                    }
                },
            };
            self.windows[index] = slot;
        }

        let reported = monitors.iter().position(|m| m.primary);
        self.primary = match reported {
            Some(index) if self.live(index) => index,
            _ => 0,
        };

        errors
    }

    /// Whether a window in a slot before `index` already covers `geometry`.
    fn covered_before(&self, index: usize, geometry: &Geometry) -> bool {
        self.windows[..index]
            .iter()
            .flatten()
            .any(|window| window.geometry.contains(geometry))
    }

    fn live(&self, index: usize) -> bool {
        matches!(self.windows.get(index), Some(Some(_)))
    }

    pub fn primary_index(&self) -> usize {
        self.primary
    }

    /// The window hosting the authentication widget and holding the grab. Falls back to the
    /// first live window when the primary slot has none.
    pub fn primary_window(&self) -> Option<&OverlayWindow> {
        match self.windows.get(self.primary) {
            Some(Some(window)) => Some(window),
            _ => self.windows().next(),
        }
    }

    /// Live overlay windows, in monitor order.
    pub fn windows(&self) -> impl Iterator<Item = &OverlayWindow> {
        self.windows.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn show_all(&self, display: &mut dyn Display) {
        for window in self.windows() {
            display.show_window(window.id);
        }
    }

    pub fn hide_all(&self, display: &mut dyn Display) {
        for window in self.windows() {
            display.hide_window(window.id);
        }
    }

    /// Hands every window not yet known to `demo` over to it.
    pub fn register_demo(&mut self, demo: &mut DemoSession) -> Vec<PluginError> {
        let mut errors = Vec::new();
        for window in self.windows.iter_mut().flatten() {
            if window.registered_with_demo {
                continue;
            }
            match demo.plugin.add(window) {
                Ok(()) => window.registered_with_demo = true,
                Err(err) => errors.push(err),
            }
        }
        errors
    }

    /// Takes back every window `demo` was given.
    pub fn unregister_demo(&mut self, demo: &mut DemoSession) {
        for window in self.windows.iter_mut().flatten() {
            unregister(Some(&mut *demo), window);
            window.registered_with_demo = false;
        }
    }

    pub fn destroy_all(&mut self, display: &mut dyn Display) {
        for window in self.windows.drain(..).flatten() {
            debug!("Destroying overlay {:#x}", window.id);
            display.destroy_window(window.id);
        }
        self.primary = 0;
    }
}

fn unregister(demo: Option<&mut DemoSession>, window: &OverlayWindow) {
    if let (Some(session), true) = (demo, window.registered_with_demo) {
        session.plugin.remove(window.id);
    }
}
