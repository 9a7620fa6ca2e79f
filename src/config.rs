//! Link tunables.

use crate::constants::*;
use log::warn;
use std::str::FromStr;
use std::time::Duration;

/// Timing and port parameters for a controller link.
///
/// The read window is both the iteration count and, with the inter-byte
/// delay, the effective response timeout of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub baud_rate: u32,
    /// Read iterations per poll
    pub read_window: usize,
    /// Wait after each read iteration
    pub inter_byte_delay: Duration,
    /// Idle time between driver loop cycles
    pub poll_period: Duration,
    /// Timeout handed to the serial port for blocking calls
    pub port_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            baud_rate: BAUD_RATE,
            read_window: DEFAULT_READ_WINDOW,
            inter_byte_delay: inter_frame_gap(BAUD_RATE),
            poll_period: Duration::from_millis(POLL_PERIOD_MS),
            port_timeout: Duration::from_millis(TIMEOUT_MS),
        }
    }
}

impl LinkConfig {
    /// Defaults overridden by `TRACER_READ_WINDOW`, `TRACER_INTER_BYTE_US`
    /// and `TRACER_POLL_PERIOD_MS`. Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = LinkConfig::default();
        if let Some(window) = env_value::<usize>("TRACER_READ_WINDOW") {
            config.read_window = window;
        }
        if let Some(us) = env_value::<u64>("TRACER_INTER_BYTE_US") {
            config.inter_byte_delay = Duration::from_micros(us);
        }
        if let Some(ms) = env_value::<u64>("TRACER_POLL_PERIOD_MS") {
            config.poll_period = Duration::from_millis(ms);
        }
        config
    }

    pub fn read_window(mut self, iterations: usize) -> Self {
        self.read_window = iterations;
        self
    }

    pub fn inter_byte_delay(mut self, delay: Duration) -> Self {
        self.inter_byte_delay = delay;
        self
    }

    pub fn poll_period(mut self, period: Duration) -> Self {
        self.poll_period = period;
        self
    }

    /// Set the baud rate and rescale the inter-byte delay to match.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self.inter_byte_delay = inter_frame_gap(baud_rate);
        self
    }

    /// Worst-case time spent capturing one response.
    pub fn read_budget(&self) -> Duration {
        self.inter_byte_delay * self.read_window as u32
    }
}

fn env_value<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}
