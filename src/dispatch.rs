//! Host text commands.

use crate::constants::{HOST_LINE_LIMIT, LOAD_OFF_TOKEN, LOAD_ON_TOKEN};
use crate::error::Result;
use crate::frame::Frame;
use crate::link::TelemetrySource;
use log::{info, trace};

/// A recognised host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    LoadOn,
    LoadOff,
}

impl Command {
    /// Match a host token. Anything else is not a command.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            LOAD_ON_TOKEN => Some(Command::LoadOn),
            LOAD_OFF_TOKEN => Some(Command::LoadOff),
            _ => None,
        }
    }

    pub fn frame(self) -> Frame {
        Frame::manual_control(self == Command::LoadOn)
    }
}

/// Locally cached load relay state, for display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayState {
    pub on: bool,
}

/// Send the manual control frame for `line`, if it is a command.
///
/// Unrecognised input is dropped and `Ok(None)` returned.
pub fn dispatch<S: TelemetrySource + ?Sized>(
    line: &str,
    source: &mut S,
    relay: &mut RelayState,
) -> Result<Option<Command>> {
    let Some(command) = Command::parse(line) else {
        trace!("Ignoring host input {:?}", line);
        return Ok(None);
    };

    source.send_command(&command.frame())?;
    relay.on = command == Command::LoadOn;
    info!("Load relay switched {}", if relay.on { "on" } else { "off" });
    Ok(Some(command))
}

/// Accumulates host bytes into newline terminated lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    overflowed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a line once `\n` arrives.
    ///
    /// Lines longer than the limit are discarded whole.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        if byte == b'\n' {
            let line = std::mem::take(&mut self.pending);
            if std::mem::take(&mut self.overflowed) {
                return None;
            }
            let text = String::from_utf8_lossy(&line);
            return Some(text.trim_end_matches('\r').to_string());
        }

        if self.pending.len() >= HOST_LINE_LIMIT {
            self.pending.clear();
            self.overflowed = true;
        }
        if !self.overflowed {
            self.pending.push(byte);
        }
        None
    }

    /// Feed a chunk, collecting every completed line.
    pub fn extend(&mut self, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MANUAL_CONTROL_CMD;
    use crate::telemetry::RawResponseBuffer;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Frame>,
    }

    impl TelemetrySource for Recorder {
        fn poll(&mut self) -> Result<RawResponseBuffer> {
            Ok(RawResponseBuffer::new())
        }

        fn send_command(&mut self, frame: &Frame) -> Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    #[test]
    fn load_on_and_off() {
        let mut source = Recorder::default();
        let mut relay = RelayState::default();

        assert_eq!(dispatch("LON", &mut source, &mut relay).unwrap(), Some(Command::LoadOn));
        assert!(relay.on);
        assert_eq!(dispatch("LOFF\r", &mut source, &mut relay).unwrap(), Some(Command::LoadOff));
        assert!(!relay.on);

        assert_eq!(source.frames.len(), 2);
        assert_eq!(source.frames[0].command(), MANUAL_CONTROL_CMD);
        assert_eq!(source.frames[0].payload(), &[1]);
        assert_eq!(source.frames[1].payload(), &[0]);
    }

    #[test]
    fn unknown_input_sends_nothing() {
        let mut source = Recorder::default();
        let mut relay = RelayState { on: true };

        for line in ["XYZ", "", "lon", "LONG"] {
            assert_eq!(dispatch(line, &mut source, &mut relay).unwrap(), None);
        }
        assert!(source.frames.is_empty());
        assert!(relay.on);
    }

    #[test]
    fn line_buffer_splits_lines() {
        let mut lines = LineBuffer::new();
        assert!(lines.extend(b"LO").is_empty());
        assert_eq!(lines.extend(b"N\r\nLOFF\nXY"), vec!["LON", "LOFF"]);
        assert_eq!(lines.extend(b"Z\n"), vec!["XYZ"]);
    }

    #[test]
    fn line_buffer_drops_overlong_lines() {
        let mut lines = LineBuffer::new();
        let long = vec![b'A'; HOST_LINE_LIMIT + 10];
        assert!(lines.extend(&long).is_empty());
        assert!(lines.push(b'\n').is_none());
        assert_eq!(lines.extend(b"LON\n"), vec!["LON"]);
    }
}
