use crate::prelude::*;
use crate::transport::ModbusError;

use async_trait::async_trait;

/// Stand-in for an attached inverter. Every read succeeds with a fixed set of
/// plausible values.
#[derive(Clone, Debug)]
pub struct EmulatedTransport {
    record: TelemetryRecord,
}

impl Default for EmulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedTransport {
    pub fn new() -> Self {
        Self {
            record: Self::sample(),
        }
    }

    pub fn sample() -> TelemetryRecord {
        TelemetryRecord {
            status: 0,
            faultcode: 0,
            energytoday: 4.4,
            energytotal: 5555.5,
            totalworktime: 12345678.0,
            outputpower: 600.0,
            gridvoltage: 230.0,
            gridfrequency: 50.0,
            pv1voltage: 80.0,
            pv1current: 8.8,
            pv1power: 8.8 * 80.0,
            tempinverter: 25.5,
            tempipm: 25.5,
            pv1energytoday: 4.6,
            pv1energytotal: 5666.6,
        }
    }
}

#[async_trait]
impl Transport for EmulatedTransport {
    async fn initialize(&mut self) {
        debug!("emulated transport: initialize");
    }

    async fn read_input_registers(&mut self) -> TransportStatus {
        TransportStatus::Success
    }

    fn describe_error(&self, code: u8) -> String {
        ModbusError::describe(code).to_string()
    }

    fn telemetry(&self) -> &TelemetryRecord {
        &self.record
    }
}
