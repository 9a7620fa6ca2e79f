//! Offline telemetry source.
//!
//! Produces well formed controller responses filled with pseudo-random
//! values, so the bridge and anything downstream can run without hardware.

use crate::constants::*;
use crate::error::Result;
use crate::frame::Frame;
use crate::link::TelemetrySource;
use crate::telemetry::RawResponseBuffer;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Simulated controller. The load relay follows the manual control frames it is sent.
pub struct SimulatedSource {
    rng: StdRng,
    load_on: bool,
}

impl SimulatedSource {
    /// Reproducible source: the same seed gives the same sequence of polls.
    pub fn seeded(seed: u64) -> Self {
        SimulatedSource {
            rng: StdRng::seed_from_u64(seed),
            load_on: false,
        }
    }

    pub fn from_entropy() -> Self {
        SimulatedSource {
            rng: StdRng::from_entropy(),
            load_on: false,
        }
    }

    pub fn load_on(&self) -> bool {
        self.load_on
    }

    fn payload(&mut self) -> [u8; TELEMETRY_PAYLOAD_LEN as usize] {
        let mut payload = [0u8; TELEMETRY_PAYLOAD_LEN as usize];
        let base = offsets::BATTERY_VOLTAGE;
        let mut put = |offset: usize, centi: u16| {
            payload[offset - base..offset - base + 2].copy_from_slice(&centi.to_le_bytes());
        };

        let battery = self.rng.gen_range(1150..=1440);
        put(offsets::BATTERY_VOLTAGE, battery);
        put(offsets::PV_VOLTAGE, self.rng.gen_range(0..=2200));
        put(
            offsets::LOAD_CURRENT,
            if self.load_on { self.rng.gen_range(0..=1000) } else { 0 },
        );
        put(offsets::OVER_DISCHARGE, 1110);
        put(offsets::BATTERY_MAX, 1440);
        let charge_current = self.rng.gen_range(0..=1000);
        put(offsets::CHARGE_CURRENT, charge_current);

        payload[offsets::LOAD_ON - base] = u8::from(self.load_on);
        payload[offsets::BATTERY_FULL - base] = u8::from(battery >= 1420);
        payload[offsets::CHARGING - base] = u8::from(charge_current > 0);
        payload[offsets::BATTERY_TEMP - base] =
            (self.rng.gen_range(-5i16..=45) + TEMPERATURE_OFFSET) as u8;
        payload
    }
}

impl TelemetrySource for SimulatedSource {
    fn poll(&mut self) -> Result<RawResponseBuffer> {
        let payload = self.payload();
        let frame = Frame::encode(DEVICE_ID, TELEMETRY_CMD, &payload)?;

        let mut buffer = RawResponseBuffer::from_bytes(&RESPONSE_PREAMBLE);
        for &byte in &frame.as_bytes()[SYNC_PREAMBLE.len()..] {
            buffer.push(byte);
        }
        Ok(buffer)
    }

    fn send_command(&mut self, frame: &Frame) -> Result<()> {
        if let (MANUAL_CONTROL_CMD, [state]) = (frame.command(), frame.payload()) {
            self.load_on = *state != 0;
            debug!("Simulated load relay {}", if self.load_on { "on" } else { "off" });
        }
        Ok(())
    }
}
