//! # Tracer Link
//!
//! A Rust library for polling EPsolar Tracer solar charge controllers over
//! their framed serial protocol and bridging the readings to a line based
//! text interface.
//!
//! ## Features
//!
//! - Build request frames with the controller's own 16-bit checksum
//! - Capture responses under a fixed, bounded read window
//! - Decode realtime telemetry (voltages, currents, temperature, status flags)
//! - Switch the load relay on and off
//! - Run offline against a seeded simulated controller
//!
//! ## Example
//!
//! ```no_run
//! use tracer_link::{LinkConfig, Monitor, SerialTracer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracer = SerialTracer::open("/dev/ttyUSB0", LinkConfig::default())?;
//!     let mut monitor = Monitor::new(tracer);
//!     let sample = monitor.sample()?;
//!     println!("Battery voltage: {:.2}V", sample.reading.battery_voltage);
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod link;
pub mod monitor;
pub mod simulate;
pub mod telemetry;

pub use checksum::checksum;
pub use config::LinkConfig;
pub use dispatch::{dispatch, Command, LineBuffer, RelayState};
pub use error::{Result, TracerError};
pub use frame::{Frame, ResponseEnvelope};
pub use link::{ByteLink, LinkDriver, SerialTracer, TelemetrySource};
pub use monitor::{Cycle, Monitor};
pub use simulate::SimulatedSource;
pub use telemetry::{RawResponseBuffer, Sample, TelemetryReading};
