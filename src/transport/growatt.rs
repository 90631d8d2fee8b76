use crate::prelude::*;
use crate::transport::ModbusError;

use async_trait::async_trait;
use nom::{
    combinator::map,
    number::complete::{be_i16, be_u16, be_u32},
    IResult,
};
use nom_derive::{Nom, Parse};
use std::collections::HashMap;

/// Registers read per bus transaction.
pub const FRAGMENT_SIZE: u16 = 64;
/// Number of fragments making up one complete input register block.
pub const FRAGMENT_COUNT: u16 = 2;

const INPUT_REGISTER_COUNT: usize = (FRAGMENT_SIZE * FRAGMENT_COUNT) as usize;

/// Raw register access, provided by the Modbus RTU driver.
#[async_trait]
pub trait RegisterBus: Send {
    async fn begin(&mut self) {}

    /// Reads `count` input registers starting at `address`. Errors carry the
    /// Modbus master result code.
    async fn read_input_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, u8>;
}

// InputRegisters {{{
#[derive(PartialEq, Clone, Debug, Nom)]
#[nom(BigEndian)]
struct InputRegisters {
    pub status: u16,
    #[nom(SkipBefore(4))] // Ppv
    #[nom(Parse = "Scaled::be_u16_div10")]
    pub pv1voltage: f32,
    #[nom(Parse = "Scaled::be_u16_div10")]
    pub pv1current: f32,
    #[nom(Parse = "Scaled::be_u32_div10")]
    pub pv1power: f32,

    #[nom(SkipBefore(56))] // pv2..pv8
    #[nom(Parse = "Scaled::be_u32_div10")]
    pub outputpower: f32,
    #[nom(Parse = "Scaled::be_u16_div100")]
    pub gridfrequency: f32,
    #[nom(Parse = "Scaled::be_u16_div10")]
    pub gridvoltage: f32,

    #[nom(SkipBefore(28))] // per-phase output
    #[nom(Parse = "Scaled::be_u32_div10")]
    pub energytoday: f32,
    #[nom(Parse = "Scaled::be_u32_div10")]
    pub energytotal: f32,
    #[nom(Parse = "Scaled::be_u32_half")]
    pub totalworktime: f32,
    #[nom(Parse = "Scaled::be_u32_div10")]
    pub pv1energytoday: f32,
    #[nom(Parse = "Scaled::be_u32_div10")]
    pub pv1energytotal: f32,

    #[nom(SkipBefore(60))] // pv2..pv8 energy, pid
    #[nom(Parse = "Scaled::be_i16_div10")]
    pub tempinverter: f32,
    #[nom(Parse = "Scaled::be_i16_div10")]
    pub tempipm: f32,

    #[nom(SkipBefore(20))] // boost temp, bus voltages, derating
    pub faultcode: u16,
}

impl InputRegisters {
    fn into_record(self) -> TelemetryRecord {
        TelemetryRecord {
            // status and fault codes fit in the low byte
            status: self.status as u8,
            faultcode: self.faultcode as u8,
            energytoday: self.energytoday,
            energytotal: self.energytotal,
            totalworktime: self.totalworktime,
            outputpower: self.outputpower,
            gridvoltage: self.gridvoltage,
            gridfrequency: self.gridfrequency,
            pv1voltage: self.pv1voltage,
            pv1current: self.pv1current,
            pv1power: self.pv1power,
            tempinverter: self.tempinverter,
            tempipm: self.tempipm,
            pv1energytoday: self.pv1energytoday,
            pv1energytotal: self.pv1energytotal,
        }
    }
} // }}}

struct Scaled;
impl Scaled {
    fn be_u16_div10(input: &[u8]) -> IResult<&[u8], f32> {
        map(be_u16, |v| f32::from(v) / 10.0)(input)
    }

    fn be_u16_div100(input: &[u8]) -> IResult<&[u8], f32> {
        map(be_u16, |v| f32::from(v) / 100.0)(input)
    }

    fn be_i16_div10(input: &[u8]) -> IResult<&[u8], f32> {
        map(be_i16, |v| f32::from(v) / 10.0)(input)
    }

    fn be_u32_div10(input: &[u8]) -> IResult<&[u8], f32> {
        map(be_u32, |v| v as f32 / 10.0)(input)
    }

    fn be_u32_half(input: &[u8]) -> IResult<&[u8], f32> {
        map(be_u32, |v| v as f32 * 0.5)(input)
    }
}

/// Decodes a complete input register block, register 0 first.
pub fn decode_input_registers(registers: &[u16]) -> Result<TelemetryRecord> {
    let bytes: Vec<u8> = registers.iter().flat_map(|r| r.to_be_bytes()).collect();

    match InputRegisters::parse(bytes.as_slice()) {
        Ok((_, registers)) => Ok(registers.into_record()),
        Err(e) => Err(anyhow!(
            "input register block of {} registers too short: {:?}",
            registers.len(),
            e
        )),
    }
}

/// Growatt inverter behind a Modbus register bus.
///
/// One transaction covers [`FRAGMENT_COUNT`] reads of [`FRAGMENT_SIZE`]
/// registers; every fragment but the last reports `Continue`.
pub struct GrowattInterface<B> {
    bus: B,
    fragment: u16,
    registers: Vec<u16>,
    record: TelemetryRecord,
}

impl<B: RegisterBus> GrowattInterface<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            fragment: 0,
            registers: vec![0; INPUT_REGISTER_COUNT],
            record: TelemetryRecord::default(),
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn fail(&mut self, code: u8) -> TransportStatus {
        self.fragment = 0;
        TransportStatus::Failure(code)
    }
}

#[async_trait]
impl<B: RegisterBus> Transport for GrowattInterface<B> {
    async fn initialize(&mut self) {
        self.fragment = 0;
        self.bus.begin().await;
    }

    async fn read_input_registers(&mut self) -> TransportStatus {
        let address = self.fragment * FRAGMENT_SIZE;

        let values = match self.bus.read_input_registers(address, FRAGMENT_SIZE).await {
            Ok(values) => values,
            Err(code) => return self.fail(code),
        };

        if values.len() != FRAGMENT_SIZE as usize {
            warn!(
                "growatt: short reply at register {}: {} of {} registers",
                address,
                values.len(),
                FRAGMENT_SIZE
            );
            return self.fail(ModbusError::ResponseTimedOut.into());
        }

        let start = address as usize;
        self.registers[start..start + values.len()].copy_from_slice(&values);
        self.fragment += 1;

        if self.fragment < FRAGMENT_COUNT {
            trace!("growatt: fragment {}/{} read", self.fragment, FRAGMENT_COUNT);
            return TransportStatus::Continue;
        }

        self.fragment = 0;
        match decode_input_registers(&self.registers) {
            Ok(record) => {
                self.record = record;
                TransportStatus::Success
            }
            Err(e) => {
                error!("growatt: {}", e);
                TransportStatus::Failure(ModbusError::IllegalDataValue.into())
            }
        }
    }

    fn describe_error(&self, code: u8) -> String {
        ModbusError::describe(code).to_string()
    }

    fn telemetry(&self) -> &TelemetryRecord {
        &self.record
    }
}

// RegisterDump {{{
/// Register bus serving a fixed register image, for running the node without
/// an inverter attached. Registers missing from the image read as zero.
#[derive(Clone, Debug, Default)]
pub struct RegisterDump {
    registers: HashMap<u16, u16>,
}

impl RegisterDump {
    pub fn new(registers: HashMap<u16, u16>) -> Self {
        Self { registers }
    }

    /// Loads a YAML mapping of register number to value.
    pub fn from_file(file: &str) -> Result<Self> {
        info!("Reading register dump from {}", file);
        let content = std::fs::read_to_string(file)
            .map_err(|err| file_error!("error reading {}: {}", file, err))?;

        let registers: HashMap<u16, u16> = serde_yaml::from_str(&content)
            .map_err(|err| file_error!("error parsing {}: {}", file, err))?;
        debug!("register dump: {} registers", registers.len());

        Ok(Self::new(registers))
    }
}

#[async_trait]
impl RegisterBus for RegisterDump {
    async fn read_input_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, u8> {
        Ok((address..address.saturating_add(count))
            .map(|register| self.registers.get(&register).copied().unwrap_or(0))
            .collect())
    }
} // }}}
