use serde::{Deserialize, Serialize};

/// Snapshot of the latest successful inverter read.
///
/// Produced fresh by the transport on every successful transaction and only
/// read by the encoder while the last status is `Success`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    // inverter status group
    pub status: u8,
    pub faultcode: u8,
    pub energytoday: f32,
    pub energytotal: f32,
    pub totalworktime: f32,
    pub outputpower: f32,
    pub gridvoltage: f32,
    pub gridfrequency: f32,

    // pv-string group
    pub pv1voltage: f32,
    pub pv1current: f32,
    pub pv1power: f32,
    pub tempinverter: f32,
    pub tempipm: f32,
    pub pv1energytoday: f32,
    pub pv1energytotal: f32,
}

// Port {{{
/// Logical uplink port. Port 1 carries the inverter status group, every other
/// port number carries the PV string group.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Port {
    InverterStatus,
    PvString,
}

impl Port {
    pub const INVERTER_STATUS: u8 = 1;
}

impl From<u8> for Port {
    fn from(port: u8) -> Self {
        match port {
            Self::INVERTER_STATUS => Self::InverterStatus,
            _ => Self::PvString,
        }
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InverterStatus => write!(f, "inverter-status"),
            Self::PvString => write!(f, "pv-string"),
        }
    }
} // }}}
