//! Live Report Example
//!
//! Polls the controller for a while and prints a summary of what it saw:
//! - Interactive serial port selection (or command-line argument)
//! - Minimum/maximum battery and PV voltage over the run
//! - Structured samples with JSON export
//! - `--simulate` to run against the built-in simulated controller
//!
//! Usage:
//!   cargo run --example live_report                    # Interactive mode
//!   cargo run --example live_report -- /dev/ttyUSB0
//!   cargo run --example live_report -- --simulate
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example live_report

mod common;

use log::{error, info};
use std::time::Duration;
use tracer_link::{
    LinkConfig, Monitor, Result, Sample, SerialTracer, SimulatedSource, TelemetrySource,
};

const SAMPLES: usize = 10;

fn collect<S: TelemetrySource>(monitor: &mut Monitor<S>, period: Duration) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(SAMPLES);
    for _ in 0..SAMPLES {
        match monitor.sample() {
            Ok(sample) => samples.push(sample),
            Err(e) => error!("Poll failed: {}", e),
        }
        std::thread::sleep(period);
    }
    samples
}

fn report(samples: &[Sample]) {
    if samples.is_empty() {
        error!("No samples collected");
        error!("Check that:");
        error!("1. Controller is powered and connected");
        error!("2. Correct serial port is specified");
        error!("3. Link runs at 9600 baud");
        return;
    }

    let range = |f: fn(&Sample) -> f64| {
        samples.iter().map(f).fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
    };
    let (bat_lo, bat_hi) = range(|s| s.reading.battery_voltage);
    let (pv_lo, pv_hi) = range(|s| s.reading.pv_voltage);
    let charging = samples.iter().filter(|s| s.reading.is_charging()).count();

    println!("Samples: {}", samples.len());
    println!("Battery voltage: {:.2}V .. {:.2}V", bat_lo, bat_hi);
    println!("PV voltage: {:.2}V .. {:.2}V", pv_lo, pv_hi);
    println!("Charging in {} of {} samples", charging, samples.len());
    for sample in samples {
        println!("{} {}", sample.timestamp.format("%H:%M:%S"), sample.reading);
    }

    if let Ok(json) = serde_json::to_string_pretty(samples) {
        info!("JSON Export:");
        info!("{}", json);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = LinkConfig::from_env();
    let arg = std::env::args().nth(1);

    info!("=== Tracer Live Report ===");
    let samples = if arg.as_deref() == Some("--simulate") {
        let mut monitor = Monitor::new(SimulatedSource::from_entropy());
        collect(&mut monitor, Duration::from_millis(100))
    } else {
        let port_name = match arg {
            Some(port) => port,
            None => common::select_port()?,
        };
        info!("Connecting to Tracer on {}...", port_name);
        let mut monitor = Monitor::new(SerialTracer::open(&port_name, config.clone())?);
        collect(&mut monitor, config.poll_period)
    };

    report(&samples);
    info!("=== Live Report Complete ===");
    Ok(())
}
