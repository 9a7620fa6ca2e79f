//! Decoding of the realtime telemetry response.

use crate::constants::{offsets, RESPONSE_CAPACITY, TEMPERATURE_OFFSET};
use crate::error::TracerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bytes captured during one poll.
///
/// Capacity is fixed; `len` counts the bytes actually received. Slots past
/// `len` stay zero, so a silent controller yields an all-zero buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct RawResponseBuffer {
    bytes: [u8; RESPONSE_CAPACITY],
    len: usize,
}

impl RawResponseBuffer {
    pub fn new() -> Self {
        RawResponseBuffer {
            bytes: [0; RESPONSE_CAPACITY],
            len: 0,
        }
    }

    /// Build a buffer from already captured bytes, keeping at most the capacity.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut buffer = Self::new();
        for &byte in data {
            if !buffer.push(byte) {
                break;
            }
        }
        buffer
    }

    /// Append a byte. Returns `false` once the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        match self.bytes.get_mut(self.len) {
            Some(slot) => {
                *slot = byte;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    /// Bytes captured so far.
    pub fn captured(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// The whole buffer, including unfilled (zero) slots.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == RESPONSE_CAPACITY
    }
}

impl Default for RawResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawResponseBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponseBuffer")
            .field("len", &self.len)
            .field("captured", &crate::frame::hex(self.captured()))
            .finish()
    }
}

/// One snapshot of the controller's realtime values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    /// Battery voltage (V)
    pub battery_voltage: f64,
    /// Photovoltaic array voltage (V)
    pub pv_voltage: f64,
    /// Load current (A)
    pub load_current: f64,
    /// Over-discharge voltage threshold (V)
    pub over_discharge: f64,
    /// Battery maximum voltage (V)
    pub battery_max: f64,
    pub battery_full: u8,
    pub charging: u8,
    /// Battery temperature (°C)
    pub battery_temp: i16,
    /// Charging current (A)
    pub charge_current: f64,
    pub load_on: u8,
    pub load_overload: u8,
    pub load_short: u8,
    pub battery_overload: u8,
    pub over_discharged: u8,
}

impl TelemetryReading {
    /// Decode a captured response.
    pub fn decode(buffer: &RawResponseBuffer) -> Self {
        Self::decode_bytes(buffer.as_bytes())
    }

    /// Decode from raw bytes. Offsets past the end of `bytes` read as zero.
    ///
    /// No range checks are made: a silent or garbled link gives a well formed
    /// but meaningless reading.
    pub fn decode_bytes(bytes: &[u8]) -> Self {
        let byte = |offset: usize| bytes.get(offset).copied().unwrap_or(0);
        let fixed =
            |offset: usize| u16::from_le_bytes([byte(offset), byte(offset + 1)]) as f64 / 100.0;

        TelemetryReading {
            battery_voltage: fixed(offsets::BATTERY_VOLTAGE),
            pv_voltage: fixed(offsets::PV_VOLTAGE),
            load_current: fixed(offsets::LOAD_CURRENT),
            over_discharge: fixed(offsets::OVER_DISCHARGE),
            battery_max: fixed(offsets::BATTERY_MAX),
            battery_full: byte(offsets::BATTERY_FULL),
            charging: byte(offsets::CHARGING),
            battery_temp: byte(offsets::BATTERY_TEMP) as i16 - TEMPERATURE_OFFSET,
            charge_current: fixed(offsets::CHARGE_CURRENT),
            load_on: byte(offsets::LOAD_ON),
            load_overload: byte(offsets::LOAD_OVERLOAD),
            load_short: byte(offsets::LOAD_SHORT),
            battery_overload: byte(offsets::BATTERY_OVERLOAD),
            over_discharged: byte(offsets::OVER_DISCHARGED),
        }
    }

    pub fn is_load_on(&self) -> bool {
        self.load_on != 0
    }

    pub fn is_charging(&self) -> bool {
        self.charging != 0
    }

    pub fn is_battery_full(&self) -> bool {
        self.battery_full != 0
    }
}

/// Host line: `battery:pv:load:over_discharge:battery_max:full:charging:temp:charge:load_on`
impl fmt::Display for TelemetryReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}:{:.2}:{:.2}:{:.2}:{:.2}:{}:{}:{}:{:.2}:{}",
            self.battery_voltage,
            self.pv_voltage,
            self.load_current,
            self.over_discharge,
            self.battery_max,
            self.battery_full,
            self.charging,
            self.battery_temp,
            self.charge_current,
            self.load_on
        )
    }
}

impl FromStr for TelemetryReading {
    type Err = TracerError;

    /// Parse a host line. Every field may be written as a decimal; flags and
    /// temperature are rounded. Auxiliary status flags are not on the line and
    /// read as zero.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim().split(':').collect();
        if fields.len() != 10 {
            return Err(TracerError::Parse(format!(
                "expected 10 fields, got {} in {:?}",
                fields.len(),
                line
            )));
        }

        let field = |index: usize| -> Result<f64, TracerError> {
            let text = fields[index].trim();
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(TracerError::Parse(format!(
                    "invalid field {}: {:?}",
                    index, text
                ))),
            }
        };
        // `as` saturates, so out of range flags clamp to 0..=255
        let flag = |index: usize| field(index).map(|v| v.round() as u8);

        Ok(TelemetryReading {
            battery_voltage: field(0)?,
            pv_voltage: field(1)?,
            load_current: field(2)?,
            over_discharge: field(3)?,
            battery_max: field(4)?,
            battery_full: flag(5)?,
            charging: flag(6)?,
            battery_temp: field(7).map(|v| v.round() as i16)?,
            charge_current: field(8)?,
            load_on: flag(9)?,
            load_overload: 0,
            load_short: 0,
            battery_overload: 0,
            over_discharged: 0,
        })
    }
}

/// A reading stamped with its capture time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: TelemetryReading,
}

impl Sample {
    pub fn now(reading: TelemetryReading) -> Self {
        Sample {
            timestamp: Utc::now(),
            reading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_fixed(buf: &mut [u8], offset: usize, value: f64) {
        let raw = (value * 100.0).round() as u16;
        buf[offset..offset + 2].copy_from_slice(&raw.to_le_bytes());
    }

    #[test]
    fn battery_from_raw_bytes() {
        let mut raw = [0u8; RESPONSE_CAPACITY];
        raw[9] = 0x10;
        raw[10] = 0x27;
        let reading = TelemetryReading::decode(&RawResponseBuffer::from_bytes(&raw));
        assert_eq!(reading.battery_voltage, 100.0);
    }

    #[test]
    fn fixed_point_fields() {
        let mut raw = [0u8; RESPONSE_CAPACITY];
        put_fixed(&mut raw, offsets::BATTERY_VOLTAGE, 12.87);
        put_fixed(&mut raw, offsets::PV_VOLTAGE, 17.3);
        put_fixed(&mut raw, offsets::LOAD_CURRENT, 0.45);
        put_fixed(&mut raw, offsets::OVER_DISCHARGE, 11.1);
        put_fixed(&mut raw, offsets::BATTERY_MAX, 14.4);
        put_fixed(&mut raw, offsets::CHARGE_CURRENT, 655.35);

        let reading = TelemetryReading::decode_bytes(&raw);
        let close = |a: f64, b: f64| (a - b).abs() < 0.01;
        assert!(close(reading.battery_voltage, 12.87));
        assert!(close(reading.pv_voltage, 17.3));
        assert!(close(reading.load_current, 0.45));
        assert!(close(reading.over_discharge, 11.1));
        assert!(close(reading.battery_max, 14.4));
        assert!(close(reading.charge_current, 655.35));
    }

    #[test]
    fn temperature_offset() {
        let mut raw = [0u8; 32];
        raw[offsets::BATTERY_TEMP] = 30;
        assert_eq!(TelemetryReading::decode_bytes(&raw).battery_temp, 0);
        raw[offsets::BATTERY_TEMP] = 0;
        assert_eq!(TelemetryReading::decode_bytes(&raw).battery_temp, -30);
        raw[offsets::BATTERY_TEMP] = 55;
        assert_eq!(TelemetryReading::decode_bytes(&raw).battery_temp, 25);
    }

    #[test]
    fn status_bytes_are_raw() {
        let mut raw = [0u8; 32];
        raw[offsets::BATTERY_FULL] = 1;
        raw[offsets::CHARGING] = 1;
        raw[offsets::LOAD_ON] = 1;
        raw[offsets::LOAD_SHORT] = 1;
        let reading = TelemetryReading::decode_bytes(&raw);
        assert!(reading.is_battery_full());
        assert!(reading.is_charging());
        assert!(reading.is_load_on());
        assert_eq!(reading.load_short, 1);
        assert_eq!(reading.load_overload, 0);
    }

    #[test]
    fn short_input_reads_as_zero() {
        let reading = TelemetryReading::decode_bytes(&[0xFF; 10]);
        // Only the low byte of the battery voltage is present.
        assert_eq!(reading.battery_voltage, 2.55);
        assert_eq!(reading.charge_current, 0.0);
        assert_eq!(reading.battery_temp, -30);
    }

    #[test]
    fn silent_link_still_decodes() {
        let reading = TelemetryReading::decode(&RawResponseBuffer::new());
        assert_eq!(reading.to_string(), "0.00:0.00:0.00:0.00:0.00:0:0:-30:0.00:0");
    }

    #[test]
    fn host_line_roundtrip() {
        let mut raw = [0u8; 32];
        put_fixed(&mut raw, offsets::BATTERY_VOLTAGE, 13.02);
        put_fixed(&mut raw, offsets::PV_VOLTAGE, 18.5);
        raw[offsets::CHARGING] = 1;
        raw[offsets::BATTERY_TEMP] = 52;
        raw[offsets::LOAD_ON] = 1;
        let reading = TelemetryReading::decode_bytes(&raw);

        let line = reading.to_string();
        assert_eq!(line, "13.02:18.50:0.00:0.00:0.00:0:1:22:0.00:1");
        assert_eq!(line.parse::<TelemetryReading>().unwrap(), reading);
    }

    #[test]
    fn host_line_accepts_decimal_flags() {
        let reading: TelemetryReading = "13.02:18.50:0.00:0.00:0.00:0.00:1.00:22.00:0.00:1"
            .parse()
            .unwrap();
        assert_eq!(reading.battery_voltage, 13.02);
        assert_eq!(reading.battery_full, 0);
        assert_eq!(reading.charging, 1);
        assert_eq!(reading.battery_temp, 22);
        assert!(reading.is_load_on());

        let cold: TelemetryReading = "12:0:0:0:0:0:0:-4.6:0:0".parse().unwrap();
        assert_eq!(cold.battery_temp, -5);
    }

    #[test]
    fn host_line_rejects_garbage() {
        assert!(matches!(
            "1:2:3".parse::<TelemetryReading>(),
            Err(TracerError::Parse(_))
        ));
        assert!(matches!(
            "a:0:0:0:0:0:0:0:0:0".parse::<TelemetryReading>(),
            Err(TracerError::Parse(_))
        ));
        assert!(matches!(
            "1:0:0:0:0:NaN:0:0:0:0".parse::<TelemetryReading>(),
            Err(TracerError::Parse(_))
        ));
    }

    #[test]
    fn buffer_stops_at_capacity() {
        let mut buffer = RawResponseBuffer::new();
        for i in 0..RESPONSE_CAPACITY {
            assert!(buffer.push(i as u8));
        }
        assert!(buffer.is_full());
        assert!(!buffer.push(0xEE));
        assert_eq!(buffer.len(), RESPONSE_CAPACITY);
        assert_eq!(buffer.captured()[RESPONSE_CAPACITY - 1], 0xFF);
    }
}
