//! Helpers shared by the demos.

use inquire::Select;
use std::io;
use tracer_link::{Result, SerialTracer};

/// Interactive serial port selection using inquire
pub fn select_port() -> Result<String> {
    let ports = SerialTracer::list_ports()?;
    if ports.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "no serial ports found").into());
    }

    let choices: Vec<String> = ports
        .iter()
        .map(|p| format!("{} - {:?}", p.port_name, p.port_type))
        .collect();
    let selection = Select::new("Select a serial port:", choices)
        .prompt()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Selection cancelled: {}", e)))?;

    // Entries read "<port name> - <port type>"
    let port_name = selection.split(" - ").next().unwrap_or(&selection);
    Ok(port_name.to_string())
}
