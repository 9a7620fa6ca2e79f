//! Basic Usage Example
//!
//! This example demonstrates the core functionality of the tracer-link library:
//! - Listing and selecting serial ports
//! - Opening the controller link
//! - Polling and decoding realtime telemetry
//! - Switching the load relay
//! - Debug output for protocol analysis
//!
//! Usage:
//!   cargo run --example basic_usage                  # Interactive mode
//!   cargo run --example basic_usage -- COM3          # Specify port
//!   cargo run --example basic_usage -- /dev/ttyUSB0
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example basic_usage
//!   RUST_LOG=info cargo run --example basic_usage

mod common;

use log::info;
use std::thread;
use std::time::Duration;
use tracer_link::{Command, LinkConfig, Monitor, Result, SerialTracer};

fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Get port name from command line argument or interactive selection
    let port_name = match std::env::args().nth(1) {
        Some(port) => port,
        None => common::select_port()?,
    };

    info!("Connecting to Tracer on {}...", port_name);
    let config = LinkConfig::default();
    let mut tracer = SerialTracer::open(&port_name, config.clone())?;

    // Enable debug printing to see protocol messages (RUST_LOG=debug)
    tracer.set_debug_print(true, true);
    let mut monitor = Monitor::new(tracer);

    info!("=== Realtime Telemetry ===");
    for _ in 0..3 {
        let sample = monitor.sample()?;
        let r = sample.reading;
        info!("{}", sample.timestamp.format("%Y-%m-%d %H:%M:%S"));
        info!(
            "Battery: {:.2}V (max {:.2}V, cut-off {:.2}V)",
            r.battery_voltage, r.battery_max, r.over_discharge
        );
        info!(
            "PV: {:.2}V, charging: {}, charge current: {:.2}A",
            r.pv_voltage,
            r.is_charging(),
            r.charge_current
        );
        info!("Load: {}, {:.2}A", if r.is_load_on() { "on" } else { "off" }, r.load_current);
        info!("Battery temperature: {}C", r.battery_temp);
        thread::sleep(config.poll_period);
    }

    info!("=== Load Relay Test ===");
    let restore = if monitor.relay().on { Command::LoadOn } else { Command::LoadOff };
    monitor.handle_line("LON")?;
    thread::sleep(Duration::from_secs(2));
    info!("Load after LON: {}", monitor.sample()?.reading.is_load_on());
    monitor.handle_line("LOFF")?;
    thread::sleep(Duration::from_secs(2));
    info!("Load after LOFF: {}", monitor.sample()?.reading.is_load_on());

    // Put the relay back the way we found it
    if restore == Command::LoadOn {
        monitor.handle_line("LON")?;
    }

    info!("=== Basic Usage Complete ===");

    Ok(())
}
