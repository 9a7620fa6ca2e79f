use crate::dispatch::{dispatch, Command, RelayState};
use crate::error::Result;
use crate::frame::ResponseEnvelope;
use crate::link::TelemetrySource;
use crate::telemetry::{Sample, TelemetryReading};
use log::{error, warn};

/// Result of one driver loop cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub sample: Sample,
    /// Host command dispatched after the poll, if any
    pub command: Option<Command>,
    /// Why the pending host command could not be sent
    pub dispatch_error: Option<String>,
}

/// Owns a telemetry source and the cached relay state for the driver loop.
pub struct Monitor<S: TelemetrySource> {
    source: S,
    relay: RelayState,
    seeded: bool,
}

impl<S: TelemetrySource> Monitor<S> {
    pub fn new(source: S) -> Self {
        Monitor {
            source,
            relay: RelayState::default(),
            seeded: false,
        }
    }

    pub fn relay(&self) -> RelayState {
        self.relay
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Poll and decode one reading.
    ///
    /// Envelope problems are logged; the reading is decoded regardless.
    pub fn sample(&mut self) -> Result<Sample> {
        let buffer = self.source.poll()?;
        if let Err(e) = ResponseEnvelope::locate(buffer.as_bytes()).and_then(|env| env.verify()) {
            warn!("Response failed validation ({} bytes captured): {}", buffer.len(), e);
        }

        let reading = TelemetryReading::decode(&buffer);
        if !self.seeded {
            self.relay.on = reading.is_load_on();
            self.seeded = true;
        }
        Ok(Sample::now(reading))
    }

    /// Handle one host line.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<Command>> {
        dispatch(line, &mut self.source, &mut self.relay)
    }

    /// One full cycle: sample, then the pending host line.
    ///
    /// Only a failed poll is an error. A command that cannot be sent is
    /// logged and reported in the cycle next to the reading.
    pub fn cycle(&mut self, pending: Option<&str>) -> Result<Cycle> {
        let sample = self.sample()?;
        let mut cycle = Cycle {
            sample,
            command: None,
            dispatch_error: None,
        };
        if let Some(line) = pending {
            match self.handle_line(line) {
                Ok(command) => cycle.command = command,
                Err(e) => {
                    error!("Could not send {:?}: {}", line.trim(), e);
                    cycle.dispatch_error = Some(e.to_string());
                }
            }
        }
        Ok(cycle)
    }
}
