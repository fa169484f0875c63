use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use structopt::StructOpt;

use lockerd::config::{self, Config};
use lockerd::controller::Controller;
use lockerd::notify::{DesktopNotifier, LogNotifier, Notifier};
use lockerd::plugin::PluginRegistry;
use lockerd::power::LogindPower;
use lockerd::signals;
use lockerd::sleep::SleepMonitor;
use lockerd::x11::X11Display;

/// Longest the loop sleeps without looking at timers and the system bus.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, StructOpt)]
#[structopt(about = "X11 screen locker daemon")]
struct Opt {
    /// Configuration file [default: locker.toml in the user configuration directory]
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Authentication plugin, overriding the configuration
    #[structopt(short, long)]
    auth: Option<String>,

    /// Demo plugin, overriding the configuration
    #[structopt(short, long)]
    demo: Option<String>,

    /// X display to connect to [default: $DISPLAY]
    #[structopt(long)]
    display: Option<String>,
}

fn load_config(path: Option<&Path>) -> Config {
    let path = match path {
        Some(path) => path,
        None => {
            warn!("No configuration directory, using defaults");
            return Config::default();
        }
    };
    match Config::load(path) {
        Ok(config) => config,
        Err(err) => {
            error!("{:#}, using defaults", anyhow::Error::new(err));
            Config::default()
        }
    }
}

/// Milliseconds until the loop should wake up on its own.
fn poll_timeout(deadline: Option<Instant>, now: Instant) -> i32 {
    let wait = match deadline {
        Some(deadline) => deadline.saturating_duration_since(now).min(MAX_POLL_INTERVAL),
        None => MAX_POLL_INTERVAL,
    };
    // Round up so a timer is never polled for just before it is due
    ((wait.as_micros() + 999) / 1000) as i32
}

fn run(opt: Opt) -> anyhow::Result<()> {
    signals::install().context("Could not install signal handlers")?;

    let config_path = opt.config.or_else(Config::default_path);
    let mut config = load_config(config_path.as_deref());
    if let Some(ref auth) = opt.auth {
        config.set(config::ROOT, "auth", Some(auth));
    }
    if let Some(ref demo) = opt.demo {
        config.set(config::ROOT, "demo", Some(demo));
    }

    let display =
        X11Display::connect(opt.display.as_deref()).context("Could not open the X display")?;
    let notifier: Box<dyn Notifier> = match DesktopNotifier::new() {
        Ok(notifier) => Box::new(notifier),
        Err(err) => {
            warn!("No session bus, errors will only be logged: {}", err);
            Box::new(LogNotifier)
        }
    };

    let mut controller = Controller::new(
        display,
        PluginRegistry::builtin(),
        config,
        Box::new(LogindPower::new()),
        notifier,
    )
    .context("Could not start the locker")?;
    if let Some(path) = config_path {
        controller = controller.with_config_path(path);
    }

    let mut sleep = match SleepMonitor::new() {
        Ok(sleep) => Some(sleep),
        Err(err) => {
            warn!("Not locking before sleep: {:#}", anyhow::Error::new(err));
            None
        }
    };

    info!("Locker running");
    let fd = controller.display().as_raw_fd();
    while !signals::terminated() && !controller.is_shut_down() {
        let timeout = poll_timeout(controller.next_deadline(), Instant::now());
        let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
        match poll(&mut fds, timeout) {
            Ok(_) | Err(nix::Error::Sys(Errno::EINTR)) => (),
            Err(err) => return Err(err).context("Waiting for events failed"),
        }

        for event in controller.display_mut().poll_events() {
            controller.handle_event(event);
        }
        controller
            .display()
            .check_connection()
            .context("Lost the connection to the X server")?;

        controller.run_timers(Instant::now());

        let result = match sleep {
            Some(ref mut monitor) => monitor.process(&mut controller),
            None => Ok(()),
        };
        if let Err(err) = result {
            warn!("Stopped watching logind: {:#}", anyhow::Error::new(err));
            sleep = None;
        }
    }

    controller.shutdown();
    Ok(())
}

fn main() {
    let env = Env::new()
        .filter_or("LOCKER_LOG", "info")
        .write_style("LOCKER_LOG_STYLE");
    env_logger::init_from_env(env);

    if let Err(e) = run(Opt::from_args()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
