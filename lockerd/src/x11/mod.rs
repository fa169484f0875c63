//! [`Display`] implementation on top of XCB.

use std::collections::HashMap;
use std::os::unix::io::{AsRawFd, RawFd};

use log::{debug, info, trace, warn};
use xcb::randr;

use locker_proto::CLIENT_MESSAGE;

use crate::display::{Display, DisplayEvent, Geometry, Monitor, Painter, Rgb, WindowId};
use crate::error::DisplayError;
use crate::plugin::AuthWidget;
use crate::preferences::Preferences;

mod keymap;
mod screensaver;

pub use self::keymap::Keymap;
pub use self::screensaver::ScreenSaver;

const FONT: &str = "fixed";
const LINE_SPACING: i32 = 4;
const PREFERENCES_WIDTH: u32 = 480;
const PREFERENCES_PADDING: i32 = 16;

struct Text {
    gc: xcb::Gcontext,
    ascent: i32,
    line_height: i32,
    char_width: i32,
}

struct PreferencesWindow {
    id: WindowId,
    lines: Vec<String>,
}

pub struct X11Display {
    conn: xcb::Connection,
    root: xcb::Window,
    root_visual: xcb::Visualid,
    root_depth: u8,
    screen_size: (u32, u32),
    screensaver: ScreenSaver,
    keymap: Keymap,
    text: Text,
    client_message: xcb::Atom,
    randr_event: Option<u8>,
    geometry: HashMap<WindowId, Geometry>,
    preferences: Option<PreferencesWindow>,
}

impl X11Display {
    /// Connects to `name`, or `$DISPLAY` when not given, and registers as the screen saver.
    pub fn connect(name: Option<&str>) -> Result<X11Display, DisplayError> {
        let (conn, screen_num) =
            xcb::Connection::connect(name).map_err(|source| DisplayError::Connect { source })?;

        let setup = conn.get_setup();
        let screen = setup
            .roots()
            .nth(screen_num as usize)
            .ok_or(DisplayError::NoScreen(screen_num))?;
        let root = screen.root();
        let root_visual = screen.root_visual();
        let root_depth = screen.root_depth();
        let screen_size = (
            u32::from(screen.width_in_pixels()),
            u32::from(screen.height_in_pixels()),
        );
        let white = screen.white_pixel();
        let black = screen.black_pixel();

        // Root resizes and locker client messages both arrive as structure notifications
        xcb::change_window_attributes_checked(
            &conn,
            root,
            &[(xcb::CW_EVENT_MASK, xcb::EVENT_MASK_STRUCTURE_NOTIFY)],
        )
        .request_check()
        .map_err(DisplayError::request("ChangeWindowAttributes"))?;

        let screensaver = ScreenSaver::register(&conn, root)?;
        let keymap = Keymap::load(&conn)?;
        let text = Text::new(&conn, root, white, black)?;

        let client_message = xcb::intern_atom(&conn, false, CLIENT_MESSAGE)
            .get_reply()
            .map_err(DisplayError::request("InternAtom"))?
            .atom();

        let randr_event = select_randr(&conn, root);

        info!(
            "Connected to X screen {} ({}x{})",
            screen_num, screen_size.0, screen_size.1
        );
        conn.flush();

        Ok(X11Display {
            conn,
            root,
            root_visual,
            root_depth,
            screen_size,
            screensaver,
            keymap,
            text,
            client_message,
            randr_event,
            geometry: HashMap::new(),
            preferences: None,
        })
    }

    /// Whether the connection to the server is still usable.
    pub fn check_connection(&self) -> Result<(), DisplayError> {
        match self.conn.has_error() {
            Ok(()) => Ok(()),
            Err(source) => Err(DisplayError::Connect { source }),
        }
    }

    /// Drains every queued event.
    pub fn poll_events(&mut self) -> Vec<DisplayEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.conn.poll_for_event() {
            if let Some(event) = self.decode(&event) {
                trace!("X event: {:?}", event);
                events.push(event);
            }
        }
        events
    }

    fn decode(&mut self, event: &xcb::GenericEvent) -> Option<DisplayEvent> {
        if let Some(idle) = self.screensaver.decode(event) {
            return Some(DisplayEvent::Idle(idle));
        }

        let event_type = event.response_type() & !0x80;
        if Some(event_type) == self.randr_event {
            return Some(DisplayEvent::TopologyChanged);
        }

        match event_type {
            0 => {
                let error: &xcb::GenericError = unsafe { xcb::cast_event(event) };
                warn!("X error {}", error.error_code());
                None
            }
            xcb::KEY_PRESS => {
                let key: &xcb::KeyPressEvent = unsafe { xcb::cast_event(event) };
                self.keymap
                    .translate(key.detail(), key.state())
                    .map(DisplayEvent::Input)
            }
            xcb::EXPOSE => {
                let expose: &xcb::ExposeEvent = unsafe { xcb::cast_event(event) };
                if expose.count() != 0 {
                    return None;
                }
                let window = expose.window();
                if self.preferences.as_ref().map(|p| p.id) == Some(window) {
                    self.draw_preferences();
                    None
                } else {
                    Some(DisplayEvent::Exposed(window))
                }
            }
            xcb::CONFIGURE_NOTIFY => {
                let configure: &xcb::ConfigureNotifyEvent = unsafe { xcb::cast_event(event) };
                if configure.window() != self.root {
                    return None;
                }
                let size = (
                    u32::from(configure.width()),
                    u32::from(configure.height()),
                );
                if size == self.screen_size {
                    return None;
                }
                self.screen_size = size;
                Some(DisplayEvent::TopologyChanged)
            }
            xcb::CLIENT_MESSAGE => {
                let message: &xcb::ClientMessageEvent = unsafe { xcb::cast_event(event) };
                if message.type_() != self.client_message || message.format() != 32 {
                    return None;
                }
                let mut data = [0u32; 5];
                data.copy_from_slice(&message.data().data32()[..5]);
                Some(DisplayEvent::ClientMessage(data))
            }
            xcb::MAPPING_NOTIFY => {
                match Keymap::load(&self.conn) {
                    Ok(keymap) => self.keymap = keymap,
                    Err(err) => warn!("Could not reload keyboard mapping: {}", err),
                }
                None
            }
            _ => None,
        }
    }

    fn draw_lines(&self, window: WindowId, lines: &[String]) {
        let geometry = match self.geometry.get(&window) {
            Some(geometry) => *geometry,
            None => return,
        };
        xcb::clear_area(&self.conn, false, window, 0, 0, 0, 0);

        let block = lines.len() as i32 * self.text.line_height;
        let mut y = (geometry.height as i32 - block) / 2 + self.text.ascent;
        for line in lines {
            let width = line.len() as i32 * self.text.char_width;
            let x = (geometry.width as i32 - width) / 2;
            xcb::image_text_8(&self.conn, window, self.text.gc, x as i16, y as i16, line);
            y += self.text.line_height;
        }
    }

    fn draw_preferences(&self) {
        if let Some(ref preferences) = self.preferences {
            self.draw_lines(preferences.id, &preferences.lines);
        }
    }

    fn hide_preferences(&mut self) {
        if let Some(preferences) = self.preferences.take() {
            self.destroy_window(preferences.id);
        }
    }

    /// One monitor per enabled CRTC. The primary is the CRTC driving the primary output.
    fn crtc_monitors(&self) -> Result<Vec<Monitor>, DisplayError> {
        let resources = randr::get_screen_resources_current(&self.conn, self.root)
            .get_reply()
            .map_err(DisplayError::request("RRGetScreenResourcesCurrent"))?;
        let primary = randr::get_output_primary(&self.conn, self.root)
            .get_reply()
            .map_err(DisplayError::request("RRGetOutputPrimary"))?
            .output();

        let mut monitors = Vec::new();
        for &crtc in resources.crtcs() {
            let info = randr::get_crtc_info(&self.conn, crtc, resources.config_timestamp())
                .get_reply()
                .map_err(DisplayError::request("RRGetCrtcInfo"))?;
            let geometry = Geometry::new(
                i32::from(info.x()),
                i32::from(info.y()),
                u32::from(info.width()),
                u32::from(info.height()),
            );
            monitors.extend(crtc_monitor(geometry, info.outputs(), primary));
        }
        Ok(monitors)
    }
}

impl AsRawFd for X11Display {
    fn as_raw_fd(&self) -> RawFd {
        self.conn.as_raw_fd()
    }
}

impl Text {
    fn new(
        conn: &xcb::Connection,
        root: xcb::Window,
        foreground: u32,
        background: u32,
    ) -> Result<Text, DisplayError> {
        let font = conn.generate_id();
        xcb::open_font_checked(conn, font, FONT)
            .request_check()
            .map_err(DisplayError::request("OpenFont"))?;
        let info = xcb::query_font(conn, font)
            .get_reply()
            .map_err(DisplayError::request("QueryFont"))?;

        let gc = conn.generate_id();
        xcb::create_gc(
            conn,
            gc,
            root,
            &[
                (xcb::GC_FOREGROUND, foreground),
                (xcb::GC_BACKGROUND, background),
                (xcb::GC_FONT, font),
            ],
        );
        xcb::close_font(conn, font);

        let ascent = i32::from(info.font_ascent());
        Ok(Text {
            gc,
            ascent,
            line_height: ascent + i32::from(info.font_descent()) + LINE_SPACING,
            char_width: i32::from(info.max_bounds().character_width()),
        })
    }
}

/// The monitor shown by a CRTC, or `None` when the CRTC is disabled.
fn crtc_monitor(
    geometry: Geometry,
    outputs: &[randr::Output],
    primary: randr::Output,
) -> Option<Monitor> {
    if outputs.is_empty() || geometry.width == 0 || geometry.height == 0 {
        return None;
    }
    let is_primary = primary != 0 && outputs.contains(&primary);
    Some(Monitor::new(geometry, is_primary))
}

/// Subscribes to RandR screen changes, returning the event type to expect.
fn select_randr(conn: &xcb::Connection, root: xcb::Window) -> Option<u8> {
    let ext_data = conn
        .get_extension_data(randr::id())
        .filter(|data| data.present())?;
    if let Err(err) = randr::query_version(conn, 1, 3).get_reply() {
        warn!("RandR version query failed, ignoring monitor changes: {}", err.error_code());
        return None;
    }
    randr::select_input(conn, root, randr::NOTIFY_MASK_SCREEN_CHANGE as u16);
    Some(ext_data.first_event() + randr::SCREEN_CHANGE_NOTIFY)
}

impl Painter for X11Display {
    fn fill(&mut self, window: WindowId, color: Rgb) {
        xcb::change_window_attributes(&self.conn, window, &[(xcb::CW_BACK_PIXEL, color.pixel())]);
        xcb::clear_area(&self.conn, false, window, 0, 0, 0, 0);
    }
}

impl Display for X11Display {
    fn root_window(&self) -> WindowId {
        self.root
    }

    fn monitors(&mut self) -> Result<Vec<Monitor>, DisplayError> {
        if self.randr_event.is_some() {
            let monitors = self.crtc_monitors()?;
            if !monitors.is_empty() {
                return Ok(monitors);
            }
        }

        debug!("No RandR monitors, covering the whole screen");
        let (width, height) = self.screen_size;
        Ok(vec![Monitor::new(Geometry::new(0, 0, width, height), true)])
    }

    fn create_window(&mut self, geometry: Geometry) -> Result<WindowId, DisplayError> {
        let window = self.conn.generate_id();
        xcb::create_window_checked(
            &self.conn,
            self.root_depth,
            window,
            self.root,
            geometry.x as i16,
            geometry.y as i16,
            geometry.width as u16,
            geometry.height as u16,
            0,
            xcb::WINDOW_CLASS_INPUT_OUTPUT as u16,
            self.root_visual,
            &[
                (xcb::CW_BACK_PIXEL, Rgb::BLACK.pixel()),
                (xcb::CW_OVERRIDE_REDIRECT, 1),
                (
                    xcb::CW_EVENT_MASK,
                    xcb::EVENT_MASK_EXPOSURE | xcb::EVENT_MASK_KEY_PRESS,
                ),
            ],
        )
        .request_check()
        .map_err(DisplayError::request("CreateWindow"))?;
        debug!("Created window {:#x} at {}", window, geometry);
        self.geometry.insert(window, geometry);
        Ok(window)
    }

    fn configure_window(&mut self, window: WindowId, geometry: Geometry) {
        xcb::configure_window(
            &self.conn,
            window,
            &[
                (xcb::CONFIG_WINDOW_X as u16, geometry.x as u32),
                (xcb::CONFIG_WINDOW_Y as u16, geometry.y as u32),
                (xcb::CONFIG_WINDOW_WIDTH as u16, geometry.width),
                (xcb::CONFIG_WINDOW_HEIGHT as u16, geometry.height),
            ],
        );
        self.geometry.insert(window, geometry);
    }

    fn destroy_window(&mut self, window: WindowId) {
        debug!("Destroying window {:#x}", window);
        xcb::destroy_window(&self.conn, window);
        self.geometry.remove(&window);
    }

    fn show_window(&mut self, window: WindowId) {
        xcb::map_window(&self.conn, window);
        xcb::configure_window(
            &self.conn,
            window,
            &[(xcb::CONFIG_WINDOW_STACK_MODE as u16, xcb::STACK_MODE_ABOVE)],
        );
    }

    fn hide_window(&mut self, window: WindowId) {
        xcb::unmap_window(&self.conn, window);
    }

    fn focus_window(&mut self, window: WindowId) {
        xcb::set_input_focus(
            &self.conn,
            xcb::INPUT_FOCUS_POINTER_ROOT as u8,
            window,
            xcb::CURRENT_TIME,
        );
    }

    fn grab_keyboard(&mut self, window: WindowId) -> bool {
        let reply = xcb::grab_keyboard(
            &self.conn,
            true,
            window,
            xcb::CURRENT_TIME,
            xcb::GRAB_MODE_ASYNC as u8,
            xcb::GRAB_MODE_ASYNC as u8,
        )
        .get_reply();
        match reply {
            Ok(reply) => reply.status() == xcb::GRAB_STATUS_SUCCESS as u8,
            Err(err) => {
                warn!("GrabKeyboard failed with X error {}", err.error_code());
                false
            }
        }
    }

    fn grab_pointer(&mut self, window: WindowId) -> bool {
        let mask = xcb::EVENT_MASK_BUTTON_PRESS
            | xcb::EVENT_MASK_BUTTON_RELEASE
            | xcb::EVENT_MASK_POINTER_MOTION;
        let reply = xcb::grab_pointer(
            &self.conn,
            true,
            window,
            mask as u16,
            xcb::GRAB_MODE_ASYNC as u8,
            xcb::GRAB_MODE_ASYNC as u8,
            xcb::NONE,
            xcb::NONE,
            xcb::CURRENT_TIME,
        )
        .get_reply();
        match reply {
            Ok(reply) => reply.status() == xcb::GRAB_STATUS_SUCCESS as u8,
            Err(err) => {
                warn!("GrabPointer failed with X error {}", err.error_code());
                false
            }
        }
    }

    fn ungrab_keyboard(&mut self) {
        xcb::ungrab_keyboard(&self.conn, xcb::CURRENT_TIME);
    }

    fn ungrab_pointer(&mut self) {
        xcb::ungrab_pointer(&self.conn, xcb::CURRENT_TIME);
    }

    fn draw_widget(&mut self, window: WindowId, widget: &AuthWidget) {
        if widget.visible {
            self.draw_lines(window, &widget.lines);
        } else {
            xcb::clear_area(&self.conn, false, window, 0, 0, 0, 0);
        }
    }

    fn activate_screensaver(&mut self) {
        xcb::force_screen_saver(&self.conn, xcb::SCREEN_SAVER_ACTIVE as u8);
    }

    fn reset_screensaver(&mut self) {
        xcb::force_screen_saver(&self.conn, xcb::SCREEN_SAVER_RESET as u8);
    }

    fn show_preferences(&mut self, preferences: Option<&Preferences>) {
        let preferences = match preferences {
            Some(preferences) => preferences,
            None => return self.hide_preferences(),
        };

        let lines = preferences.summary();
        let height = lines.len() as i32 * self.text.line_height + 2 * PREFERENCES_PADDING;
        let (screen_width, screen_height) = self.screen_size;
        let geometry = Geometry::new(
            (screen_width as i32 - PREFERENCES_WIDTH as i32) / 2,
            (screen_height as i32 - height) / 2,
            PREFERENCES_WIDTH,
            height as u32,
        );

        let id = match self.preferences {
            Some(ref existing) => {
                let id = existing.id;
                self.configure_window(id, geometry);
                id
            }
            None => match self.create_window(geometry) {
                Ok(id) => id,
                Err(err) => {
                    warn!("Could not create the preferences window: {}", err);
                    return;
                }
            },
        };
        self.preferences = Some(PreferencesWindow { id, lines });
        self.show_window(id);
        self.draw_preferences();
    }

    fn unregister_screensaver(&mut self) {
        self.screensaver.unregister(&self.conn);
    }

    fn flush(&mut self) {
        self.conn.flush();
    }
}

impl Drop for X11Display {
    fn drop(&mut self) {
        self.hide_preferences();
        self.screensaver.unregister(&self.conn);
        self.conn.flush();
    }
}
