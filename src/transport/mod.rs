use crate::prelude::*;

use async_trait::async_trait;
use num_enum::{IntoPrimitive, TryFromPrimitive};

pub mod emulated;
pub mod growatt;

// TransportStatus {{{
/// Outcome of a single register-read attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportStatus {
    /// A multi-part transaction is in progress; read again after a delay.
    Continue,
    Success,
    /// Transport-defined error code, see [`Transport::describe_error`].
    Failure(u8),
}

impl TransportStatus {
    pub const SUCCESS: u8 = 0x00;
    pub const CONTINUE: u8 = 0xff;

    /// Status byte as carried in the uplink frame.
    pub fn code(&self) -> u8 {
        match self {
            Self::Success => Self::SUCCESS,
            Self::Continue => Self::CONTINUE,
            Self::Failure(code) => *code,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            Self::SUCCESS => Self::Success,
            Self::CONTINUE => Self::Continue,
            code => Self::Failure(code),
        }
    }

    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }
} // }}}

// ModbusError {{{
/// Error codes reported by the Modbus master: the four standard exception
/// codes followed by the link-level errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ModbusError {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    SlaveDeviceFailure = 0x04,
    InvalidSlaveId = 0xe0,
    InvalidFunction = 0xe1,
    ResponseTimedOut = 0xe2,
    InvalidCrc = 0xe3,
}

impl ModbusError {
    pub fn describe(code: u8) -> &'static str {
        match code {
            TransportStatus::SUCCESS => "Success",
            TransportStatus::CONTINUE => "Continue",
            code => match Self::try_from(code) {
                Ok(Self::IllegalFunction) => "Illegal function",
                Ok(Self::IllegalDataAddress) => "Illegal data address",
                Ok(Self::IllegalDataValue) => "Illegal data value",
                Ok(Self::SlaveDeviceFailure) => "Slave device failure",
                Ok(Self::InvalidSlaveId) => "Invalid slave ID",
                Ok(Self::InvalidFunction) => "Invalid function",
                Ok(Self::ResponseTimedOut) => "Response timed out",
                Ok(Self::InvalidCrc) => "Invalid CRC",
                Err(_) => "Unknown error",
            },
        }
    }
} // }}}

/// Field-bus capability used by [`RegisterAcquisition`].
///
/// Implementations own the bus for the duration of an uplink cycle. A
/// `Success` from `read_input_registers` means `telemetry()` now holds the
/// values of that transaction.
#[async_trait]
pub trait Transport: Send {
    /// Prepares the bus for a new cycle. Callers must observe the settle
    /// delay before the first read.
    async fn initialize(&mut self);

    async fn read_input_registers(&mut self) -> TransportStatus;

    fn describe_error(&self, code: u8) -> String;

    fn telemetry(&self) -> &TelemetryRecord;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn initialize(&mut self) {
        (**self).initialize().await
    }

    async fn read_input_registers(&mut self) -> TransportStatus {
        (**self).read_input_registers().await
    }

    fn describe_error(&self, code: u8) -> String {
        (**self).describe_error(code)
    }

    fn telemetry(&self) -> &TelemetryRecord {
        (**self).telemetry()
    }
}
