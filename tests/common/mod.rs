#![allow(dead_code)]

use growatt_node::prelude::*;

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

pub use growatt_node::transport::emulated::EmulatedTransport;

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Factory();
impl Factory {
    pub fn record() -> TelemetryRecord {
        EmulatedTransport::sample()
    }

    pub fn config() -> Config {
        Config::default()
    }

    /// A policy whose periods are distinct so recorded waits can be told apart.
    pub fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            settle_delay: Duration::from_millis(500),
            continue_interval: Duration::from_millis(1000),
            failure_backoff: Duration::from_millis(1500),
        }
    }

    pub fn acquisition(
        statuses: &[TransportStatus],
        retries: u32,
    ) -> RegisterAcquisition<ScriptedTransport, RecordingWaiter> {
        RegisterAcquisition::with_waiter(
            ScriptedTransport::new(statuses),
            RecordingWaiter::default(),
            Self::policy(retries),
        )
    }

    pub fn encoder(
        statuses: &[TransportStatus],
        retries: u32,
    ) -> PayloadEncoder<ScriptedTransport, RecordingWaiter> {
        PayloadEncoder::new(Self::acquisition(statuses, retries))
    }

    /// Input register image of a running inverter; see `registers_record`.
    pub fn registers() -> HashMap<u16, u16> {
        HashMap::from([
            (0, 1),      // status
            (3, 2305),   // pv1voltage 230.5
            (4, 42),     // pv1current 4.2
            (5, 0),      // pv1power hi
            (6, 9681),   // pv1power 968.1
            (35, 1),     // outputpower hi
            (36, 4),     // outputpower 6554.0
            (37, 5001),  // gridfrequency 50.01
            (38, 2301),  // gridvoltage 230.1
            (53, 0),
            (54, 123),   // energytoday 12.3
            (55, 0),
            (56, 45678), // energytotal 4567.8
            (57, 0),
            (58, 7200),  // totalworktime 3600
            (59, 0),
            (60, 111),   // pv1energytoday 11.1
            (61, 0),
            (62, 2222),  // pv1energytotal 222.2
            (93, 0xff9c), // tempinverter -10.0
            (94, 415),   // tempipm 41.5
            (105, 3),    // faultcode
        ])
    }

    pub fn registers_record() -> TelemetryRecord {
        TelemetryRecord {
            status: 1,
            faultcode: 3,
            energytoday: 12.3,
            energytotal: 4567.8,
            totalworktime: 3600.0,
            outputpower: 6554.0,
            gridvoltage: 230.1,
            gridfrequency: 50.01,
            pv1voltage: 230.5,
            pv1current: 4.2,
            pv1power: 968.1,
            tempinverter: -10.0,
            tempipm: 41.5,
            pv1energytoday: 11.1,
            pv1energytotal: 222.2,
        }
    }
}

/// Transport replaying a fixed sequence of read results. Once the script is
/// exhausted every further read fails with 0xe2.
pub struct ScriptedTransport {
    script: VecDeque<TransportStatus>,
    record: TelemetryRecord,
    pub reads: usize,
    pub initializations: usize,
}

impl ScriptedTransport {
    pub fn new(statuses: &[TransportStatus]) -> Self {
        Self {
            script: statuses.iter().copied().collect(),
            record: Factory::record(),
            reads: 0,
            initializations: 0,
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn initialize(&mut self) {
        self.initializations += 1;
    }

    async fn read_input_registers(&mut self) -> TransportStatus {
        self.reads += 1;
        self.script
            .pop_front()
            .unwrap_or(TransportStatus::Failure(0xe2))
    }

    fn describe_error(&self, code: u8) -> String {
        format!("scripted 0x{:02x}", code)
    }

    fn telemetry(&self) -> &TelemetryRecord {
        &self.record
    }
}

/// Records every wait instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingWaiter {
    pub waits: Vec<(WaitPoint, Duration)>,
}

impl RecordingWaiter {
    pub fn count(&self, point: WaitPoint) -> usize {
        self.waits.iter().filter(|(p, _)| *p == point).count()
    }
}

#[async_trait]
impl Waiter for RecordingWaiter {
    async fn wait(&mut self, point: WaitPoint, period: Duration) {
        self.waits.push((point, period));
    }
}
