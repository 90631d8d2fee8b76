use clap::Parser;

/// Growatt Node - reads a Growatt inverter and builds LoRaWAN uplink frames
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,

    /// Number of uplink cycles to run; runs until interrupted if omitted
    #[clap(short = 'n', long = "cycles")]
    pub cycles: Option<u64>,

    /// Use this port for every cycle instead of rotating through the configured ports
    #[clap(short = 'p', long = "port")]
    pub port: Option<u8>,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}
