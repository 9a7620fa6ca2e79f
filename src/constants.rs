//! Protocol constants for Tracer charge-controller communication.
//!
//! This module defines the wire layout of the framed serial protocol:
//! preambles, command codes, the response field offsets and the serial
//! port parameters used on both sides of the bridge.

use std::time::Duration;

/// Preamble sent ahead of every request frame.
pub const SYNC_PREAMBLE: [u8; 12] = [
    0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xEB, 0x90, 0xEB, 0x90, 0xEB, 0x90,
];

/// Preamble the controller puts in front of its responses.
pub const RESPONSE_PREAMBLE: [u8; 6] = [0xEB, 0x90, 0xEB, 0x90, 0xEB, 0x90];

/// Address of the controller on the link
pub const DEVICE_ID: u8 = 0x16;

/// Realtime telemetry request command
pub const TELEMETRY_CMD: u8 = 0xA0;

/// Manual load relay control command
pub const MANUAL_CONTROL_CMD: u8 = 0xAA;

/// Precomputed checksum of the telemetry request (its payload never varies)
pub const TELEMETRY_CHECKSUM: [u8; 2] = [0xB1, 0xA7];

/// Final byte of every frame
pub const TERMINATOR: u8 = 0x7F;

/// Largest payload the 1-byte length field can describe
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Bytes between the start of a frame and its payload (id, command, length)
pub const ENVELOPE_HEADER_LEN: usize = 3;

/// Capacity of the response capture buffer
pub const RESPONSE_CAPACITY: usize = 256;

/// Default number of read iterations per poll
pub const DEFAULT_READ_WINDOW: usize = RESPONSE_CAPACITY;

/// Device link baud rate
pub const BAUD_RATE: u32 = 9600;

/// Host text channel baud rate when it runs over a second serial port
pub const HOST_BAUD_RATE: u32 = 57600;

/// Bits per character on the wire (start, 8 data, parity slot, stop)
pub const BITS_PER_CHAR: u32 = 11;

/// Serial port read timeout in milliseconds
pub const TIMEOUT_MS: u64 = 1000;

/// Idle time between two poll cycles in milliseconds
pub const POLL_PERIOD_MS: u64 = 1000;

/// Stored battery temperature is the real temperature plus this offset
pub const TEMPERATURE_OFFSET: i16 = 30;

/// Longest host command line kept by the line buffer
pub const HOST_LINE_LIMIT: usize = 64;

/// Host token switching the load relay on
pub const LOAD_ON_TOKEN: &str = "LON";

/// Host token switching the load relay off
pub const LOAD_OFF_TOKEN: &str = "LOFF";

/// Raw response buffer offsets of each telemetry field.
pub mod offsets {
    pub const BATTERY_VOLTAGE: usize = 9;
    pub const PV_VOLTAGE: usize = 11;
    // 13..15 reserved
    pub const LOAD_CURRENT: usize = 15;
    pub const OVER_DISCHARGE: usize = 17;
    pub const BATTERY_MAX: usize = 19;
    pub const LOAD_ON: usize = 21;
    pub const LOAD_OVERLOAD: usize = 22;
    pub const LOAD_SHORT: usize = 23;
    // 24 reserved
    pub const BATTERY_OVERLOAD: usize = 25;
    pub const OVER_DISCHARGED: usize = 26;
    pub const BATTERY_FULL: usize = 27;
    pub const CHARGING: usize = 28;
    pub const BATTERY_TEMP: usize = 29;
    pub const CHARGE_CURRENT: usize = 30;
}

/// Payload length of a telemetry response (offsets 9..33)
pub const TELEMETRY_PAYLOAD_LEN: u8 = 24;

/// Minimum idle gap between frames: 3.5 character times at `baud_rate`.
pub fn inter_frame_gap(baud_rate: u32) -> Duration {
    // 3.5 chars * bits * 1e6 us / baud
    let micros = 3_500_000u64 * BITS_PER_CHAR as u64 / baud_rate.max(1) as u64;
    Duration::from_micros(micros)
}
