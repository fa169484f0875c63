//! Demo filling every monitor with a solid colour, stepping through a palette.

use std::time::Duration;

use log::{debug, warn};

use crate::display::{Painter, Rgb, WindowId};
use crate::error::PluginError;
use crate::monitor::OverlayWindow;
use crate::plugin::{Demo, Helper};
use crate::timer::TimerId;

pub const NAME: &str = "colors";

const SECTION: &str = "colors";
const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

const PALETTE: [Rgb; 6] = [
    Rgb(0x1d, 0x35, 0x57),
    Rgb(0x45, 0x7b, 0x9d),
    Rgb(0x2a, 0x9d, 0x8f),
    Rgb(0xe9, 0xc4, 0x6a),
    Rgb(0xf4, 0xa2, 0x61),
    Rgb(0xe7, 0x6f, 0x51),
];

pub fn create(helper: &mut Helper<'_>) -> Result<Box<dyn Demo>, PluginError> {
    Ok(Box::new(Colors::new(interval(helper))))
}

/// Reads `interval` (milliseconds) from `[demo::colors]`.
fn interval(helper: &Helper<'_>) -> Duration {
    match helper.config_get(SECTION, "interval") {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                warn!("Ignoring invalid colour interval {:?}", value);
                DEFAULT_INTERVAL
            }
        },
        None => DEFAULT_INTERVAL,
    }
}

pub struct Colors {
    windows: Vec<WindowId>,
    index: usize,
    interval: Duration,
    timer: Option<TimerId>,
}

impl Colors {
    pub fn new(interval: Duration) -> Colors {
        Colors {
            windows: Vec::new(),
            index: 0,
            interval,
            timer: None,
        }
    }

    fn paint(&self, painter: &mut dyn Painter) {
        let color = PALETTE[self.index % PALETTE.len()];
        for window in &self.windows {
            painter.fill(*window, color);
        }
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % PALETTE.len();
    }
}

impl Demo for Colors {
    fn add(&mut self, window: &OverlayWindow) -> Result<(), PluginError> {
        if !self.windows.contains(&window.id) {
            self.windows.push(window.id);
        }
        Ok(())
    }

    fn remove(&mut self, window: WindowId) {
        self.windows.retain(|w| *w != window);
    }

    fn reload(&mut self, helper: &mut Helper<'_>) {
        self.interval = interval(helper);
        debug!("Colour interval is now {}ms", self.interval.as_millis());
    }

    fn start(&mut self, helper: &mut Helper<'_>, painter: &mut dyn Painter) {
        self.paint(painter);
        if let Some(timer) = self.timer.take() {
            helper.cancel_timeout(timer);
        }
        self.timer = Some(helper.set_timeout(self.interval));
    }

    fn stop(&mut self, helper: &mut Helper<'_>, painter: &mut dyn Painter) {
        if let Some(timer) = self.timer.take() {
            helper.cancel_timeout(timer);
        }
        for window in &self.windows {
            painter.fill(*window, Rgb::BLACK);
        }
    }

    fn cycle(&mut self, _helper: &mut Helper<'_>, painter: &mut dyn Painter) {
        self.advance();
        self.paint(painter);
    }

    fn timeout(&mut self, helper: &mut Helper<'_>, painter: &mut dyn Painter, timer: TimerId) {
        if self.timer != Some(timer) {
            return;
        }
        self.advance();
        self.paint(painter);
        self.timer = Some(helper.set_timeout(self.interval));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::config::Config;
    use crate::display::Geometry;
    use crate::plugin::{Outbox, PluginKind};
    use crate::timer::{TimerOwner, Timers};

    #[derive(Default)]
    struct Canvas {
        fills: Vec<(WindowId, Rgb)>,
    }

    impl Painter for Canvas {
        fn fill(&mut self, window: WindowId, color: Rgb) {
            self.fills.push((window, color));
        }
    }

    fn overlay(id: WindowId) -> OverlayWindow {
        OverlayWindow::new(id, Geometry::new(0, 0, 640, 480))
    }

    #[test]
    fn test_interval_from_config() {
        let mut config = Config::default();
        config.set("demo::colors", "interval", Some("250"));
        let mut timers = Timers::new();
        let mut outbox = Outbox::default();
        let helper = Helper::new(
            PluginKind::Demo,
            TimerOwner::Demo,
            &mut config,
            &mut timers,
            &mut outbox,
        );
        assert_eq!(interval(&helper), Duration::from_millis(250));
    }

    #[test]
    fn test_start_cycle_stop() {
        let mut config = Config::default();
        let mut timers = Timers::new();
        let mut outbox = Outbox::default();
        let mut helper = Helper::new(
            PluginKind::Demo,
            TimerOwner::Demo,
            &mut config,
            &mut timers,
            &mut outbox,
        );
        let mut canvas = Canvas::default();
        let mut colors = Colors::new(DEFAULT_INTERVAL);
        colors.add(&overlay(1)).unwrap();
        colors.add(&overlay(2)).unwrap();

        colors.start(&mut helper, &mut canvas);
        assert_eq!(canvas.fills, vec![(1, PALETTE[0]), (2, PALETTE[0])]);

        colors.remove(2);
        colors.cycle(&mut helper, &mut canvas);
        assert_eq!(canvas.fills[2], (1, PALETTE[1]));

        colors.stop(&mut helper, &mut canvas);
        assert_eq!(canvas.fills.last(), Some(&(1, Rgb::BLACK)));
        drop(helper);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_timeout_repaints_and_rearms() {
        let mut config = Config::default();
        let mut timers = Timers::new();
        let mut outbox = Outbox::default();
        let mut canvas = Canvas::default();
        let mut colors = Colors::new(DEFAULT_INTERVAL);
        colors.add(&overlay(1)).unwrap();
        {
            let mut helper = Helper::new(
                PluginKind::Demo,
                TimerOwner::Demo,
                &mut config,
                &mut timers,
                &mut outbox,
            );
            colors.start(&mut helper, &mut canvas);
        }

        let due = timers.take_due(Instant::now() + Duration::from_secs(1));
        assert_eq!(due.len(), 1);
        let mut helper = Helper::new(
            PluginKind::Demo,
            TimerOwner::Demo,
            &mut config,
            &mut timers,
            &mut outbox,
        );
        colors.timeout(&mut helper, &mut canvas, due[0].0);
        drop(helper);

        assert_eq!(canvas.fills, vec![(1, PALETTE[0]), (1, PALETTE[1])]);
        assert_eq!(timers.len(), 1);
    }
}
