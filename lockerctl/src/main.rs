use std::io;
use std::process;

use anyhow::{anyhow, Context};
use env_logger::Env;
use log::{debug, error};
use structopt::clap::ErrorKind;
use structopt::StructOpt;

use locker_proto::{Action, Message, CLIENT_MESSAGE};

#[derive(Debug, StructOpt)]
#[structopt(about = "Control the lockerd screen locker")]
struct Opt {
    /// Temporarily disable the screensaver
    #[structopt(short = "D")]
    disable: bool,

    /// Enable the screensaver again
    #[structopt(short = "E")]
    enable: bool,

    /// Display or change settings
    #[structopt(short = "S")]
    settings: bool,

    /// Cycle the screen saver
    #[structopt(short = "c")]
    cycle: bool,

    /// Lock the screen
    #[structopt(short = "l")]
    lock: bool,

    /// Activate the screen saver
    #[structopt(short = "s")]
    activate: bool,

    /// Unlock the screen
    #[structopt(short = "u")]
    unlock: bool,

    /// Suspend the computer
    #[structopt(short = "z")]
    suspend: bool,
}

impl Opt {
    /// The single action requested, or `None` when there are none or several.
    fn action(&self) -> Option<Action> {
        let flags = [
            (self.disable, Action::Disable),
            (self.enable, Action::Enable),
            (self.settings, Action::ShowPreferences),
            (self.cycle, Action::Cycle),
            (self.lock, Action::Lock),
            (self.activate, Action::Activate),
            (self.unlock, Action::Unlock),
            (self.suspend, Action::Suspend),
        ];
        let mut selected = flags.iter().filter(|(set, _)| *set).map(|&(_, action)| action);
        match (selected.next(), selected.next()) {
            (Some(action), None) => Some(action),
            _ => None,
        }
    }
}

/// Broadcasts `message` to the locker through the root window.
fn send(message: &Message) -> anyhow::Result<()> {
    let (conn, screen_num) =
        xcb::Connection::connect(None).context("Could not connect to X server")?;
    let setup = conn.get_setup();
    let screen = setup
        .roots()
        .nth(screen_num as usize)
        .ok_or_else(|| anyhow!("Could not get X11 screen {}", screen_num))?;
    let root = screen.root();

    let atom = xcb::intern_atom(&conn, false, CLIENT_MESSAGE)
        .get_reply()
        .map_err(|e| anyhow!("InternAtom failed with X error {}", e.error_code()))?
        .atom();

    let event = xcb::ClientMessageEvent::new(
        32,
        root,
        atom,
        xcb::ClientMessageData::from_data32(message.encode()),
    );
    xcb::send_event_checked(&conn, false, root, xcb::EVENT_MASK_STRUCTURE_NOTIFY, &event)
        .request_check()
        .map_err(|e| anyhow!("SendEvent failed with X error {}", e.error_code()))?;
    debug!("Sent {:?}", message);
    Ok(())
}

fn message_for(action: Action) -> Message {
    // Settings are shown, never hidden, from here
    Message::action(action, action == Action::ShowPreferences)
}

fn main() {
    let env = Env::new()
        .filter_or("LOCKER_LOG", "warn")
        .write_style("LOCKER_LOG_STYLE");
    env_logger::init_from_env(env);

    let opt = match Opt::from_iter_safe(std::env::args_os()) {
        Ok(opt) => opt,
        Err(e) => match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => {
                println!("{}", e.message);
                process::exit(0);
            }
            _ => {
                eprintln!("{}", e.message);
                process::exit(1);
            }
        },
    };

    let action = match opt.action() {
        Some(action) => action,
        None => {
            eprintln!("Exactly one action must be given");
            let _ = Opt::clap().write_help(&mut io::stderr());
            eprintln!();
            process::exit(1);
        }
    };

    if let Err(e) = send(&message_for(action)) {
        error!("{:#}", e);
        process::exit(2);
    }
}
