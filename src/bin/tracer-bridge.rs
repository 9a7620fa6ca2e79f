//! Bridge a Tracer controller to a line based host interface.
//!
//! Usage:
//!   tracer-bridge /dev/ttyUSB0                         # host interface on stdin/stdout
//!   tracer-bridge /dev/ttyUSB0 --host-port /dev/ttyACM0
//!   tracer-bridge --simulate 42 --json                 # no hardware needed
//!   tracer-bridge --list
//!
//! Every cycle prints one reading. Sending `LON` or `LOFF` on the host side
//! switches the controller's load relay.
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug tracer-bridge /dev/ttyUSB0

use log::{error, info, warn};
use std::io::{self, ErrorKind, Read, Write};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;
use tracer_link::constants::HOST_BAUD_RATE;
use tracer_link::{
    LineBuffer, LinkConfig, Monitor, Result, SerialTracer, SimulatedSource, TelemetrySource,
    TracerError,
};

const USAGE: &str =
    "tracer-bridge [PORT] [--host-port NAME] [--simulate [SEED]] [--json] [--list]";

#[derive(Debug, Default)]
struct Options {
    port: Option<String>,
    host_port: Option<String>,
    simulate: Option<u64>,
    json: bool,
    list: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Options> {
    let mut options = Options::default();
    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--host-port" => {
                options.host_port = Some(args.next().ok_or_else(|| missing("--host-port"))?);
            }
            "--simulate" => {
                let explicit = args.peek().map_or(false, |value| !value.starts_with("--"));
                let seed = match args.next_if(|_| explicit) {
                    Some(value) => value
                        .parse()
                        .map_err(|_| TracerError::Parse(format!("invalid seed {:?}", value)))?,
                    None => rand::random(),
                };
                options.simulate = Some(seed);
            }
            "--json" => options.json = true,
            "--list" => options.list = true,
            other if other.starts_with("--") => {
                return Err(TracerError::Parse(format!("unknown option {}", other)));
            }
            port => options.port = Some(port.to_string()),
        }
    }
    Ok(options)
}

fn missing(option: &str) -> TracerError {
    TracerError::Parse(format!("{} needs a value", option))
}

/// Forward complete host lines to the driver loop.
fn spawn_host_reader(mut input: Box<dyn Read + Send>) -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("host-input".into())
        .spawn(move || {
            let mut lines = LineBuffer::new();
            let mut chunk = [0u8; 64];
            loop {
                let n = match input.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                        continue
                    }
                    Err(e) => {
                        error!("Host input failed: {}", e);
                        break;
                    }
                };
                for line in lines.extend(&chunk[..n]) {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
            }
        })?;
    Ok(rx)
}

type HostChannel = (Box<dyn Write>, Box<dyn Read + Send>);

fn open_host(host_port: Option<&str>) -> Result<HostChannel> {
    match host_port {
        Some(name) => {
            let port = serialport::new(name, HOST_BAUD_RATE)
                .timeout(Duration::from_millis(100))
                .open()?;
            let reader: Box<dyn Read + Send> = Box::new(port.try_clone()?);
            let writer: Box<dyn Write> = Box::new(port);
            info!("Host interface on {} at {} baud", name, HOST_BAUD_RATE);
            Ok((writer, reader))
        }
        None => {
            let writer: Box<dyn Write> = Box::new(io::stdout());
            let reader: Box<dyn Read + Send> = Box::new(io::stdin());
            Ok((writer, reader))
        }
    }
}

fn open_source(options: &Options, config: &LinkConfig) -> Result<Box<dyn TelemetrySource>> {
    if let Some(seed) = options.simulate {
        info!("Simulating controller (seed {})", seed);
        return Ok(Box::new(SimulatedSource::seeded(seed)));
    }

    let port = options
        .port
        .as_deref()
        .ok_or_else(|| TracerError::Parse("no controller port given (or use --simulate)".into()))?;
    info!("Connecting to Tracer on {}...", port);
    let mut tracer = SerialTracer::open(port, config.clone())?;
    tracer.set_debug_print(true, true);
    Ok(Box::new(tracer))
}

fn run(options: Options) -> Result<()> {
    if options.list {
        for port in SerialTracer::list_ports()? {
            println!("{} - {:?}", port.port_name, port.port_type);
        }
        return Ok(());
    }

    let config = LinkConfig::from_env();
    let mut monitor = Monitor::new(open_source(&options, &config)?);
    let (mut output, input) = open_host(options.host_port.as_deref())?;
    let commands = spawn_host_reader(input)?;

    info!(
        "Polling every {:?} (read window {} x {:?})",
        config.poll_period, config.read_window, config.inter_byte_delay
    );

    loop {
        let pending = commands.try_recv().ok();
        let cycle = match monitor.cycle(pending.as_deref()) {
            Ok(cycle) => cycle,
            Err(e) => {
                error!("Poll failed: {}", e);
                thread::sleep(config.poll_period);
                continue;
            }
        };

        let line = if options.json {
            serde_json::to_string(&cycle.sample)
                .map_err(|e| TracerError::Parse(format!("cannot serialize sample: {}", e)))?
        } else {
            cycle.sample.reading.to_string()
        };
        writeln!(output, "{}", line)?;
        output.flush()?;

        if let Some(command) = cycle.command {
            let relay = if monitor.relay().on { "on" } else { "off" };
            info!("Handled {:?}, relay now {}", command, relay);
        }
        thread::sleep(config.poll_period);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = parse_args(std::env::args().skip(1)).and_then(run);
    if let Err(e) = result {
        error!("{}", e);
        if matches!(e, TracerError::Parse(_)) {
            warn!("usage: {}", USAGE);
        }
        std::process::exit(1);
    }
}
