//! Keycode to authenticator input translation.

use xkbcommon::xkb;
use xkbcommon::xkb::keysyms as key;

use crate::error::DisplayError;
use crate::plugin::AuthInput;

/// The server's keyboard layout, compiled by xkbcommon.
pub struct Keymap {
    state: xkb::State,
}

impl Keymap {
    pub fn load(conn: &xcb::Connection) -> Result<Keymap, DisplayError> {
        let (mut major, mut minor, mut base_event, mut base_error) = (0, 0, 0, 0);
        let present = xkb::x11::setup_xkb_extension(
            conn,
            xkb::x11::MIN_MAJOR_XKB_VERSION,
            xkb::x11::MIN_MINOR_XKB_VERSION,
            xkb::x11::SetupXkbExtensionFlags::NoFlags,
            &mut major,
            &mut minor,
            &mut base_event,
            &mut base_error,
        );
        if !present {
            return Err(DisplayError::MissingExtension("XKEYBOARD"));
        }

        let context = xkb::Context::new(xkb::CONTEXT_NO_FLAGS);
        let device = xkb::x11::get_core_keyboard_device_id(conn);
        let keymap =
            xkb::x11::keymap_new_from_device(&context, conn, device, xkb::KEYMAP_COMPILE_NO_FLAGS);
        let state = xkb::x11::state_new_from_device(&keymap, conn, device);
        Ok(Keymap { state })
    }

    /// Translates a key press, or returns `None` for keys the authenticators don't care about.
    ///
    /// `state` is the core event state: modifiers in the low byte, the group in bits 13 and 14.
    pub fn translate(&mut self, keycode: u8, state: u16) -> Option<AuthInput> {
        let mods = xkb::ModMask::from(state & 0xff);
        let group = xkb::LayoutIndex::from((state >> 13) & 0x3);
        self.state.update_mask(mods, 0, 0, group, 0, 0);

        let keycode = xkb::Keycode::from(keycode);
        input(
            self.state.key_get_one_sym(keycode),
            &self.state.key_get_utf8(keycode),
        )
    }
}

/// Maps a keysym and the text it produces to an authenticator input.
fn input(keysym: xkb::Keysym, text: &str) -> Option<AuthInput> {
    match keysym {
        key::KEY_Return | key::KEY_KP_Enter => Some(AuthInput::Enter),
        key::KEY_BackSpace => Some(AuthInput::Backspace),
        key::KEY_Escape => Some(AuthInput::Escape),
        key::KEY_Left | key::KEY_KP_Left => Some(AuthInput::Left),
        key::KEY_Right | key::KEY_KP_Right => Some(AuthInput::Right),
        _ => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_control() => Some(AuthInput::Char(c)),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_keys_use_layout_text() {
        assert_eq!(input(key::KEY_a, "a"), Some(AuthInput::Char('a')));
        assert_eq!(input(key::KEY_A, "A"), Some(AuthInput::Char('A')));
        assert_eq!(input(key::KEY_eacute, "é"), Some(AuthInput::Char('é')));
        assert_eq!(input(key::KEY_Cyrillic_ya, "я"), Some(AuthInput::Char('я')));
    }

    #[test]
    fn test_keypad_digits() {
        assert_eq!(input(key::KEY_KP_1, "1"), Some(AuthInput::Char('1')));
        assert_eq!(input(key::KEY_KP_Enter, "\r"), Some(AuthInput::Enter));
        assert_eq!(input(key::KEY_KP_Left, ""), Some(AuthInput::Left));
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(input(key::KEY_Return, "\r"), Some(AuthInput::Enter));
        assert_eq!(input(key::KEY_BackSpace, "\u{8}"), Some(AuthInput::Backspace));
        assert_eq!(input(key::KEY_Escape, "\u{1b}"), Some(AuthInput::Escape));
        assert_eq!(input(key::KEY_Right, ""), Some(AuthInput::Right));
    }

    #[test]
    fn test_keys_without_text_are_ignored() {
        assert_eq!(input(key::KEY_Shift_L, ""), None);
        assert_eq!(input(key::KEY_Tab, "\t"), None);
        assert_eq!(input(key::KEY_dead_acute, ""), None);
    }
}
