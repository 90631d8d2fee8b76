mod common;
use common::*;
use growatt_node::prelude::*;
use growatt_node::transport::growatt::{
    decode_input_registers, GrowattInterface, RegisterBus, RegisterDump, FRAGMENT_SIZE,
};
use growatt_node::transport::ModbusError;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Write;

/// Bus replaying canned replies and recording the requested ranges.
#[derive(Default)]
struct ScriptedBus {
    replies: VecDeque<Result<Vec<u16>, u8>>,
    requests: Vec<(u16, u16)>,
    begins: usize,
}

impl ScriptedBus {
    fn new(replies: Vec<Result<Vec<u16>, u8>>) -> Self {
        Self {
            replies: replies.into(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RegisterBus for ScriptedBus {
    async fn begin(&mut self) {
        self.begins += 1;
    }

    async fn read_input_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, u8> {
        self.requests.push((address, count));
        self.replies.pop_front().unwrap_or(Err(0xe2))
    }
}

fn register_block() -> Vec<u16> {
    let registers = Factory::registers();
    (0..128).map(|r| registers.get(&r).copied().unwrap_or(0)).collect()
}

#[test]
fn decodes_register_block() {
    assert_eq!(decode_input_registers(&register_block()).unwrap(), Factory::registers_record());
}

#[test]
fn short_block_does_not_decode() {
    assert!(decode_input_registers(&register_block()[..100]).is_err());
}

#[tokio::test]
async fn first_fragment_continues_second_succeeds() {
    common_setup();

    let block = register_block();
    let bus = ScriptedBus::new(vec![Ok(block[..64].to_vec()), Ok(block[64..].to_vec())]);
    let mut subject = GrowattInterface::new(bus);

    subject.initialize().await;
    assert_eq!(subject.read_input_registers().await, TransportStatus::Continue);
    assert_eq!(subject.read_input_registers().await, TransportStatus::Success);

    assert_eq!(subject.bus().begins, 1);
    assert_eq!(subject.bus().requests, vec![(0, FRAGMENT_SIZE), (64, FRAGMENT_SIZE)]);
    assert_eq!(subject.telemetry(), &Factory::registers_record());
}

#[tokio::test]
async fn bus_error_restarts_the_transaction() {
    common_setup();

    let block = register_block();
    let bus = ScriptedBus::new(vec![
        Ok(block[..64].to_vec()),
        Err(0xe3),
        Ok(block[..64].to_vec()),
        Ok(block[64..].to_vec()),
    ]);
    let mut subject = GrowattInterface::new(bus);

    assert_eq!(subject.read_input_registers().await, TransportStatus::Continue);
    assert_eq!(subject.read_input_registers().await, TransportStatus::Failure(0xe3));
    assert_eq!(subject.read_input_registers().await, TransportStatus::Continue);
    assert_eq!(subject.read_input_registers().await, TransportStatus::Success);

    let addresses: Vec<u16> = subject.bus().requests.iter().map(|(a, _)| *a).collect();
    assert_eq!(addresses, vec![0, 64, 0, 64]);
}

#[tokio::test]
async fn short_reply_times_out() {
    common_setup();

    let mut subject = GrowattInterface::new(ScriptedBus::new(vec![Ok(vec![0; 10])]));

    assert_eq!(
        subject.read_input_registers().await,
        TransportStatus::Failure(ModbusError::ResponseTimedOut.into())
    );
}

#[tokio::test]
async fn acquisition_over_growatt_interface() {
    common_setup();

    let block = register_block();
    let bus = ScriptedBus::new(vec![
        Err(0xe0),
        Ok(block[..64].to_vec()),
        Ok(block[64..].to_vec()),
    ]);
    let mut subject = RegisterAcquisition::with_waiter(
        GrowattInterface::new(bus),
        RecordingWaiter::default(),
        Factory::policy(5),
    );

    subject.initialize().await;
    assert_eq!(subject.acquire().await, TransportStatus::Success);
    assert_eq!(subject.record(), Some(&Factory::registers_record()));
    assert_eq!(subject.waiter().count(WaitPoint::Continue), 1);
}

#[test]
fn describes_modbus_errors() {
    assert_eq!(ModbusError::describe(0x00), "Success");
    assert_eq!(ModbusError::describe(0xff), "Continue");
    assert_eq!(ModbusError::describe(0x02), "Illegal data address");
    assert_eq!(ModbusError::describe(0xe2), "Response timed out");
    assert_eq!(ModbusError::describe(0x7f), "Unknown error");
}

#[tokio::test]
async fn register_dump_from_file() {
    common_setup();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    for (register, value) in Factory::registers() {
        writeln!(file, "{}: {}", register, value).unwrap();
    }

    let dump = RegisterDump::from_file(file.path().to_str().unwrap()).unwrap();
    let mut subject = GrowattInterface::new(dump);

    assert_eq!(subject.read_input_registers().await, TransportStatus::Continue);
    assert_eq!(subject.read_input_registers().await, TransportStatus::Success);
    assert_eq!(subject.telemetry(), &Factory::registers_record());
}

#[test]
fn register_dump_missing_file() {
    assert!(RegisterDump::from_file("/nonexistent/registers.yaml").is_err());
}
