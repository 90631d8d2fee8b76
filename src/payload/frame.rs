use crate::prelude::*;
use crate::payload::temperature_from_wire;

use nom::{
    combinator::map,
    number::complete::{be_i16, le_f32, u8 as byte},
    sequence::tuple,
    IResult,
};
use serde::Serialize;

/// Receiver-side view of an uplink frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UplinkFrame {
    pub module_id: u8,
    /// Transport status byte; serialized apart from the inverter's own status.
    #[serde(rename = "modbus")]
    pub status: u8,
    #[serde(flatten)]
    pub fields: Option<Fields>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fields {
    InverterStatus {
        status: u8,
        faultcode: u8,
        energytoday: f32,
        energytotal: f32,
        totalworktime: f32,
        outputpower: f32,
        gridvoltage: f32,
        gridfrequency: f32,
    },
    PvString {
        pv1voltage: f32,
        pv1current: f32,
        pv1power: f32,
        tempinverter: f32,
        tempipm: f32,
        pv1energytoday: f32,
        pv1energytotal: f32,
    },
}

impl UplinkFrame {
    /// Parses a complete frame received on `port`. Truncated frames and
    /// trailing bytes are rejected.
    pub fn decode(port: Port, input: &[u8]) -> Result<Self> {
        match Self::parse(port, input) {
            Ok(([], frame)) => Ok(frame),
            Ok((rest, _)) => bail!("{} trailing bytes after uplink frame", rest.len()),
            Err(e) => bail!("uplink frame on port {} could not be decoded: {:?}", port, e),
        }
    }

    pub fn transport_status(&self) -> TransportStatus {
        TransportStatus::from_code(self.status)
    }

    fn parse(port: Port, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (module_id, status)) = tuple((byte, byte))(input)?;

        if status != TransportStatus::SUCCESS {
            return Ok((
                input,
                Self {
                    module_id,
                    status,
                    fields: None,
                },
            ));
        }

        let (input, fields) = match port {
            Port::InverterStatus => Self::inverter_status(input)?,
            Port::PvString => Self::pv_string(input)?,
        };

        Ok((
            input,
            Self {
                module_id,
                status,
                fields: Some(fields),
            },
        ))
    }

    fn inverter_status(input: &[u8]) -> IResult<&[u8], Fields> {
        map(
            tuple((byte, byte, le_f32, le_f32, le_f32, le_f32, le_f32, le_f32)),
            |(
                status,
                faultcode,
                energytoday,
                energytotal,
                totalworktime,
                outputpower,
                gridvoltage,
                gridfrequency,
            )| Fields::InverterStatus {
                status,
                faultcode,
                energytoday,
                energytotal,
                totalworktime,
                outputpower,
                gridvoltage,
                gridfrequency,
            },
        )(input)
    }

    fn pv_string(input: &[u8]) -> IResult<&[u8], Fields> {
        map(
            tuple((le_f32, le_f32, le_f32, temperature, temperature, le_f32, le_f32)),
            |(
                pv1voltage,
                pv1current,
                pv1power,
                tempinverter,
                tempipm,
                pv1energytoday,
                pv1energytotal,
            )| Fields::PvString {
                pv1voltage,
                pv1current,
                pv1power,
                tempinverter,
                tempipm,
                pv1energytoday,
                pv1energytotal,
            },
        )(input)
    }
}

fn temperature(input: &[u8]) -> IResult<&[u8], f32> {
    map(be_i16, temperature_from_wire)(input)
}
