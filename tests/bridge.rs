use std::collections::VecDeque;
use std::io;
use std::time::Duration;
use tracer_link::constants::*;
use tracer_link::{
    checksum, ByteLink, Frame, LinkConfig, LinkDriver, Monitor, TelemetryReading,
};

/// Answers telemetry requests the way the controller does and records
/// everything written to it.
#[derive(Default)]
struct FakeController {
    written: Vec<Vec<u8>>,
    rx: VecDeque<u8>,
    load_on: bool,
    battery_centivolts: u16,
    respond: bool,
}

impl FakeController {
    fn responding(battery_centivolts: u16) -> Self {
        FakeController {
            battery_centivolts,
            respond: true,
            ..Default::default()
        }
    }

    fn response(&self) -> Vec<u8> {
        let mut payload = [0u8; TELEMETRY_PAYLOAD_LEN as usize];
        let at = |offset: usize| offset - offsets::BATTERY_VOLTAGE;
        payload[at(offsets::BATTERY_VOLTAGE)..at(offsets::BATTERY_VOLTAGE) + 2]
            .copy_from_slice(&self.battery_centivolts.to_le_bytes());
        payload[at(offsets::LOAD_ON)] = u8::from(self.load_on);
        payload[at(offsets::BATTERY_TEMP)] = 30 + 21;

        let mut envelope = vec![DEVICE_ID, TELEMETRY_CMD, TELEMETRY_PAYLOAD_LEN];
        envelope.extend_from_slice(&payload);
        envelope.extend_from_slice(&[0, 0]);
        let code = checksum(&envelope).unwrap();
        let n = envelope.len();
        envelope[n - 2..].copy_from_slice(&code.to_be_bytes());

        let mut bytes = RESPONSE_PREAMBLE.to_vec();
        bytes.extend_from_slice(&envelope);
        bytes.push(TERMINATOR);
        bytes
    }
}

impl ByteLink for FakeController {
    fn transmit(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.written.push(bytes.to_vec());
        let frame = &bytes[SYNC_PREAMBLE.len()..];
        match frame[1] {
            TELEMETRY_CMD if self.respond => {
                let response = self.response();
                self.rx.extend(response);
            }
            MANUAL_CONTROL_CMD => self.load_on = frame[3] != 0,
            _ => {}
        }
        Ok(())
    }

    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.rx.pop_front())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.rx.clear();
        Ok(())
    }
}

fn monitor(controller: FakeController) -> Monitor<LinkDriver<FakeController>> {
    let config = LinkConfig::default().inter_byte_delay(Duration::ZERO);
    Monitor::new(LinkDriver::new(controller, config))
}

#[test]
fn polls_and_decodes_over_the_link() {
    let mut monitor = monitor(FakeController::responding(1287));

    let sample = monitor.sample().unwrap();
    assert_eq!(sample.reading.battery_voltage, 12.87);
    assert_eq!(sample.reading.battery_temp, 21);
    assert!(!sample.reading.is_load_on());
    assert_eq!(
        sample.reading.to_string(),
        "12.87:0.00:0.00:0.00:0.00:0:0:21:0.00:0"
    );

    let written = &monitor.source().link().written;
    assert_eq!(written.len(), 1);
    assert_eq!(&written[0][..], Frame::telemetry_request().as_bytes());
    assert_eq!(&written[0][SYNC_PREAMBLE.len() + 3..SYNC_PREAMBLE.len() + 5], &[0xB1, 0xA7]);
}

#[test]
fn host_commands_reach_the_wire() {
    let mut monitor = monitor(FakeController::responding(1300));

    let cycle = monitor.cycle(Some("LON")).unwrap();
    assert!(cycle.command.is_some());
    assert!(monitor.relay().on);
    assert!(monitor.sample().unwrap().reading.is_load_on());

    monitor.cycle(Some("LOFF")).unwrap();
    monitor.cycle(Some("XYZ")).unwrap();
    assert!(!monitor.relay().on);

    let manual: Vec<&Vec<u8>> = monitor
        .source()
        .link()
        .written
        .iter()
        .filter(|bytes| bytes[SYNC_PREAMBLE.len() + 1] == MANUAL_CONTROL_CMD)
        .collect();
    assert_eq!(manual.len(), 2);
    assert_eq!(manual[0][SYNC_PREAMBLE.len() + 3], 1);
    assert_eq!(manual[1][SYNC_PREAMBLE.len() + 3], 0);
    assert_ne!(manual[0][SYNC_PREAMBLE.len() + 4..], manual[1][SYNC_PREAMBLE.len() + 4..]);
}

#[test]
fn silent_controller_yields_a_reading() {
    let mut monitor = monitor(FakeController::default());

    let reading = monitor.sample().unwrap().reading;
    assert_eq!(reading, TelemetryReading::decode_bytes(&[]));
    assert_eq!(reading.battery_voltage, 0.0);
    assert_eq!(reading.battery_temp, -30);
}

#[test]
fn sample_serializes_with_timestamp() {
    let mut monitor = monitor(FakeController::responding(1250));
    let sample = monitor.sample().unwrap();

    let json = serde_json::to_value(sample).unwrap();
    assert_eq!(json["battery_voltage"], 12.5);
    assert!(json["timestamp"].is_string());
}
