//! Request frame construction and response envelope parsing.
//!
//! Layout of a request:
//!
//! ```text
//! preamble (12) | id | cmd | len | payload (len) | checksum (2, BE) | 0x7F
//! ```
//!
//! The checksum covers `id | cmd | len | payload` followed by the checksum
//! slot itself set to zero. Responses use a shorter 6-byte preamble but the
//! same envelope.

use crate::checksum::{self, fold};
use crate::constants::*;
use crate::error::{Result, TracerError};
use std::fmt;

/// An encoded frame ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Encode a frame for `device_id`.
    pub fn encode(device_id: u8, command: u8, payload: &[u8]) -> Result<Self> {
        let length = u8::try_from(payload.len()).map_err(|_| TracerError::PayloadTooLong {
            length: payload.len(),
        })?;

        let mut bytes =
            Vec::with_capacity(SYNC_PREAMBLE.len() + ENVELOPE_HEADER_LEN + payload.len() + 3);
        bytes.extend_from_slice(&SYNC_PREAMBLE);
        bytes.extend_from_slice(&[device_id, command, length]);
        bytes.extend_from_slice(payload);

        let rest = std::iter::once(length).chain(payload.iter().copied()).chain([0, 0]);
        let code = fold(device_id, command, rest);
        bytes.extend_from_slice(&code.to_be_bytes());
        bytes.push(TERMINATOR);

        Ok(Frame { bytes })
    }

    /// The realtime telemetry request. Its checksum never changes.
    pub fn telemetry_request() -> Self {
        let mut bytes = Vec::with_capacity(SYNC_PREAMBLE.len() + ENVELOPE_HEADER_LEN + 3);
        bytes.extend_from_slice(&SYNC_PREAMBLE);
        bytes.extend_from_slice(&[DEVICE_ID, TELEMETRY_CMD, 0x00]);
        bytes.extend_from_slice(&TELEMETRY_CHECKSUM);
        bytes.push(TERMINATOR);
        Frame { bytes }
    }

    /// Switch the controller's load relay.
    pub fn manual_control(on: bool) -> Self {
        let payload = [u8::from(on)];
        let rest = [0x01, payload[0], 0x00, 0x00];
        let code = fold(DEVICE_ID, MANUAL_CONTROL_CMD, rest);

        let mut bytes = Vec::with_capacity(SYNC_PREAMBLE.len() + ENVELOPE_HEADER_LEN + 4);
        bytes.extend_from_slice(&SYNC_PREAMBLE);
        bytes.extend_from_slice(&[DEVICE_ID, MANUAL_CONTROL_CMD, 0x01, payload[0]]);
        bytes.extend_from_slice(&code.to_be_bytes());
        bytes.push(TERMINATOR);
        Frame { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn device_id(&self) -> u8 {
        self.bytes[SYNC_PREAMBLE.len()]
    }

    pub fn command(&self) -> u8 {
        self.bytes[SYNC_PREAMBLE.len() + 1]
    }

    pub fn payload(&self) -> &[u8] {
        let start = SYNC_PREAMBLE.len() + ENVELOPE_HEADER_LEN;
        &self.bytes[start..self.bytes.len() - 3]
    }

    /// The two checksum bytes as a big-endian code.
    pub fn checksum(&self) -> u16 {
        let end = self.bytes.len() - 1;
        u16::from_be_bytes([self.bytes[end - 2], self.bytes[end - 1]])
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex(&self.bytes))
    }
}

/// Format bytes as space separated hex, as printed in debug traces.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A response envelope located inside a captured buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseEnvelope<'a> {
    pub device_id: u8,
    pub command: u8,
    pub payload: &'a [u8],
    /// Checksum as transmitted
    pub checksum: u16,
    /// `id | cmd | len | payload | checksum`
    span: &'a [u8],
}

impl<'a> ResponseEnvelope<'a> {
    /// Parse the envelope at the start of `bytes`.
    pub fn locate(bytes: &'a [u8]) -> Result<Self> {
        let body = bytes.strip_prefix(&RESPONSE_PREAMBLE[..]).ok_or_else(|| {
            TracerError::MalformedResponse(format!(
                "missing preamble, got {}",
                hex(&bytes[..bytes.len().min(RESPONSE_PREAMBLE.len())])
            ))
        })?;

        let &[device_id, command, length, ..] = body else {
            return Err(TracerError::MalformedResponse(format!(
                "truncated header ({} bytes)",
                body.len()
            )));
        };

        let payload_end = ENVELOPE_HEADER_LEN + length as usize;
        let span_end = payload_end + 2;
        if body.len() <= span_end {
            return Err(TracerError::MalformedResponse(format!(
                "declared {} payload bytes, only {} captured",
                length,
                body.len().saturating_sub(ENVELOPE_HEADER_LEN)
            )));
        }
        if body[span_end] != TERMINATOR {
            return Err(TracerError::MalformedResponse(format!(
                "expected terminator, got {:02X}",
                body[span_end]
            )));
        }

        Ok(ResponseEnvelope {
            device_id,
            command,
            payload: &body[ENVELOPE_HEADER_LEN..payload_end],
            checksum: u16::from_be_bytes([body[payload_end], body[payload_end + 1]]),
            span: &body[..span_end],
        })
    }

    /// Check the transmitted checksum against the envelope contents.
    pub fn verify(&self) -> Result<()> {
        let residue = checksum::checksum(self.span)?;
        if residue == 0 {
            return Ok(());
        }

        let unsent = &self.span[..self.span.len() - 2];
        let expected = fold(unsent[0], unsent[1], unsent[2..].iter().copied().chain([0, 0]));
        Err(TracerError::ChecksumMismatch {
            expected,
            actual: self.checksum,
        })
    }
}
