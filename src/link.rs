use crate::config::LinkConfig;
use crate::error::Result;
use crate::frame::{hex, Frame};
use crate::telemetry::RawResponseBuffer;
use log::debug;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::thread;

/// Byte-level access to the controller link.
pub trait ByteLink {
    /// Write all of `bytes`.
    fn transmit(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Take one byte if one is already waiting, without blocking.
    fn try_read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Drop anything left over from a previous exchange.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteLink for Box<dyn SerialPort> {
    fn transmit(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }

    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.bytes_to_read()? == 0 {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

/// Something that can be polled for telemetry and sent commands.
pub trait TelemetrySource {
    /// Request telemetry and capture whatever the controller sends back.
    fn poll(&mut self) -> Result<RawResponseBuffer>;

    /// Send a frame. Nothing is read back.
    fn send_command(&mut self, frame: &Frame) -> Result<()>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn poll(&mut self) -> Result<RawResponseBuffer> {
        (**self).poll()
    }

    fn send_command(&mut self, frame: &Frame) -> Result<()> {
        (**self).send_command(frame)
    }
}

/// Drives the request/capture exchange over a [`ByteLink`].
pub struct LinkDriver<L: ByteLink> {
    link: L,
    config: LinkConfig,
    print_tx: bool,
    print_rx: bool,
}

/// A driver bound to a real serial port.
pub type SerialTracer = LinkDriver<Box<dyn SerialPort>>;

impl SerialTracer {
    /// Open `port_name` at the configured baud rate.
    pub fn open(port_name: &str, config: LinkConfig) -> Result<Self> {
        let port = serialport::new(port_name, config.baud_rate)
            .timeout(config.port_timeout)
            .open()?;
        debug!("Opened {} at {} baud", port_name, config.baud_rate);
        Ok(LinkDriver::new(port, config))
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }
}

impl<L: ByteLink> LinkDriver<L> {
    pub fn new(link: L, config: LinkConfig) -> Self {
        LinkDriver {
            link,
            config,
            print_tx: false,
            print_rx: false,
        }
    }

    /// Enable/disable debug logging of TX/RX traffic
    pub fn set_debug_print(&mut self, tx: bool, rx: bool) {
        self.print_tx = tx;
        self.print_rx = rx;
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn into_inner(self) -> L {
        self.link
    }

    fn send(&mut self, frame: &Frame) -> Result<()> {
        if self.print_tx {
            debug!("Sending:  {}", frame);
        }
        self.link.transmit(frame.as_bytes())?;
        Ok(())
    }

    /// Run the fixed read window.
    ///
    /// Every iteration takes at most one byte and then waits the inter-byte
    /// delay, so a poll always costs `read_window` iterations no matter how
    /// much arrives. Bytes beyond the buffer capacity are read and dropped.
    fn capture(&mut self) -> Result<RawResponseBuffer> {
        let mut buffer = RawResponseBuffer::new();
        let mut dropped = 0usize;

        for _ in 0..self.config.read_window {
            if let Some(byte) = self.link.try_read_byte()? {
                if !buffer.push(byte) {
                    dropped += 1;
                }
            }
            if !self.config.inter_byte_delay.is_zero() {
                thread::sleep(self.config.inter_byte_delay);
            }
        }

        if self.print_rx {
            debug!("Received: {}", hex(buffer.captured()));
        }
        if dropped > 0 {
            debug!("Dropped {} bytes past buffer capacity", dropped);
        }
        Ok(buffer)
    }
}

impl<L: ByteLink> TelemetrySource for LinkDriver<L> {
    fn poll(&mut self) -> Result<RawResponseBuffer> {
        self.link.discard_input()?;
        self.send(&Frame::telemetry_request())?;
        self.capture()
    }

    fn send_command(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame)
    }
}
