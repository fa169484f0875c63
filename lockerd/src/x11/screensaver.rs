use log::debug;
use xcb::screensaver;

use crate::error::DisplayError;
use crate::idle::IdleEvent;

/// Property through which a client claims the screen saver, holding its pid.
const SCREEN_SAVER_ID: &str = "_MIT_SCREEN_SAVER_ID";

/// Registration with the [X11 screen saver extension](https://www.x.org/releases/X11R7.7/doc/scrnsaverproto/saver.html):
/// the locker listens for screen saver state changes and claims the screen saver so the server
/// does not blank the display on its own.
pub struct ScreenSaver {
    root: xcb::Window,
    notify_event: u8,
    id_atom: xcb::Atom,
    registered: bool,
}

impl ScreenSaver {
    pub fn register(conn: &xcb::Connection, root: xcb::Window) -> Result<ScreenSaver, DisplayError> {
        let ext_data = conn
            .get_extension_data(screensaver::id())
            .filter(|data| data.present())
            .ok_or(DisplayError::MissingExtension("MIT-SCREEN-SAVER"))?;

        // Figure out the actual X11 event response type we'll see
        let notify_event = ext_data.first_event() + screensaver::NOTIFY;

        screensaver::select_input_checked(
            conn,
            root,
            screensaver::EVENT_NOTIFY_MASK | screensaver::EVENT_CYCLE_MASK,
        )
        .request_check()
        .map_err(DisplayError::request("ScreenSaverSelectInput"))?;

        let id_atom = xcb::intern_atom(conn, false, SCREEN_SAVER_ID)
            .get_reply()
            .map_err(DisplayError::request("InternAtom"))?
            .atom();
        let pid = std::process::id();
        xcb::change_property_checked(
            conn,
            xcb::PROP_MODE_REPLACE as u8,
            root,
            id_atom,
            xcb::ATOM_INTEGER,
            32,
            &[pid],
        )
        .request_check()
        .map_err(DisplayError::request("ChangeProperty"))?;
        debug!("Registered as the screen saver with pid {}", pid);

        Ok(ScreenSaver {
            root,
            notify_event,
            id_atom,
            registered: true,
        })
    }

    /// Decodes a screen saver notification, or returns `None` for any other event.
    pub fn decode(&self, event: &xcb::GenericEvent) -> Option<IdleEvent> {
        // Don't know why this is needed, but _every_ XCB example I've seen does it
        let event_type = event.response_type() & !0x80;
        if event_type != self.notify_event {
            return None;
        }

        // Safety: verified above that this is a NotifyEvent, according to the event type from the extension data
        let event: &screensaver::NotifyEvent = unsafe { xcb::cast_event(event) };
        idle_event(event.state())
    }

    /// Gives the screen saver back to the server. Only the first call does anything.
    pub fn unregister(&mut self, conn: &xcb::Connection) {
        if self.registered {
            xcb::delete_property(conn, self.root, self.id_atom);
            self.registered = false;
        }
    }
}

fn idle_event(state: u8) -> Option<IdleEvent> {
    match u32::from(state) {
        screensaver::STATE_OFF => Some(IdleEvent::Off),
        screensaver::STATE_ON => Some(IdleEvent::On),
        screensaver::STATE_CYCLE => Some(IdleEvent::Cycle),
        screensaver::STATE_DISABLED => Some(IdleEvent::Disabled),
        _ => None,
    }
}
