use crate::prelude::*;

use bytes::{BufMut, BytesMut};

pub mod frame;

/// Width in bytes of a wire-encoded temperature.
pub const TEMPERATURE_WIDTH: usize = 2;

/// Bytes preceding the field group: module identifier and status byte.
pub const PREFIX_LEN: usize = 2;

pub const DEFAULT_MODULE_ID: u8 = 0;

/// Append-only byte sink an uplink frame is written into.
///
/// Multi-byte fields follow the LoRa serialization conventions used by the
/// receiving decoder: raw floats little-endian, temperatures big-endian fixed
/// point.
pub trait ByteSink {
    fn write_bytes(&mut self, bytes: &[u8]);

    fn write_uint8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    fn write_raw_float(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Hundredths of a degree, truncated toward zero, as a signed 16-bit value.
    fn write_temperature(&mut self, celsius: f32) {
        self.write_bytes(&temperature_to_wire(celsius).to_be_bytes());
    }
}

impl ByteSink for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl ByteSink for BytesMut {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.put_slice(bytes);
    }
}

pub fn temperature_to_wire(celsius: f32) -> i16 {
    // `as` saturates out-of-range values at i16::MIN/MAX
    (celsius * 100.0) as i16
}

pub fn temperature_from_wire(raw: i16) -> f32 {
    f32::from(raw) / 100.0
}

/// Length of the frame written by [`PayloadEncoder::encode_stage2`].
pub fn stage2_len(port: Port, status: TransportStatus) -> usize {
    match (status, port) {
        (TransportStatus::Success, Port::InverterStatus) => PREFIX_LEN + 2 + 6 * 4,
        (TransportStatus::Success, Port::PvString) => {
            PREFIX_LEN + 3 * 4 + 2 * TEMPERATURE_WIDTH + 2 * 4
        }
        _ => PREFIX_LEN,
    }
}

/// Serializes telemetry into the port-selected uplink layout.
pub struct PayloadEncoder<T, W = TokioWaiter> {
    acquisition: RegisterAcquisition<T, W>,
    module_id: u8,
}

impl<T: Transport, W: Waiter> PayloadEncoder<T, W> {
    pub fn new(acquisition: RegisterAcquisition<T, W>) -> Self {
        Self {
            acquisition,
            module_id: DEFAULT_MODULE_ID,
        }
    }

    pub fn with_module_id(mut self, module_id: u8) -> Self {
        self.module_id = module_id;
        self
    }

    pub fn acquisition(&self) -> &RegisterAcquisition<T, W> {
        &self.acquisition
    }

    /// Writes the fields that need no bus I/O. There are none yet.
    pub fn encode_stage1<S: ByteSink + ?Sized>(&self, port: Port, _sink: &mut S) {
        trace!("stage 1: port {}", port);
    }

    /// Runs one acquisition cycle and writes the module byte, the status byte
    /// and, on success, the field group selected by `port`.
    pub async fn encode_stage2<S: ByteSink + ?Sized>(
        &mut self,
        port: Port,
        sink: &mut S,
    ) -> TransportStatus {
        self.acquisition.initialize().await;
        let status = self.acquisition.acquire().await;

        sink.write_uint8(self.module_id);
        sink.write_uint8(status.code());

        if let Some(record) = self.acquisition.record() {
            trace!("Port: {}", port);
            Self::write_fields(port, record, sink);
        }

        status
    }

    fn write_fields<S: ByteSink + ?Sized>(port: Port, record: &TelemetryRecord, sink: &mut S) {
        match port {
            Port::InverterStatus => {
                sink.write_uint8(record.status);
                sink.write_uint8(record.faultcode);
                sink.write_raw_float(record.energytoday);
                sink.write_raw_float(record.energytotal);
                sink.write_raw_float(record.totalworktime);
                sink.write_raw_float(record.outputpower);
                sink.write_raw_float(record.gridvoltage);
                sink.write_raw_float(record.gridfrequency);
            }
            Port::PvString => {
                sink.write_raw_float(record.pv1voltage);
                sink.write_raw_float(record.pv1current);
                sink.write_raw_float(record.pv1power);
                sink.write_temperature(record.tempinverter);
                sink.write_temperature(record.tempipm);
                sink.write_raw_float(record.pv1energytoday);
                sink.write_raw_float(record.pv1energytotal);
            }
        }
    }
}
