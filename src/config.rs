use crate::prelude::*;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub acquisition: Acquisition,
    #[serde(default)]
    pub uplink: Uplink,
    #[serde(default)]
    pub checksum: Checksum,
    #[serde(default)]
    pub transport: Transport,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acquisition: Acquisition::default(),
            uplink: Uplink::default(),
            checksum: Checksum::default(),
            transport: Transport::default(),
            loglevel: Self::default_loglevel(),
        }
    }
}

// Acquisition {{{
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Acquisition {
    pub retries: Option<u32>,
    pub settle_delay_ms: Option<u64>,
    pub continue_interval_ms: Option<u64>,
    pub failure_backoff_ms: Option<u64>,
}
impl Acquisition {
    pub fn retries(&self) -> u32 {
        self.retries.unwrap_or(5)
    }

    pub fn settle_delay_ms(&self) -> u64 {
        self.settle_delay_ms.unwrap_or(500)
    }

    pub fn continue_interval_ms(&self) -> u64 {
        self.continue_interval_ms.unwrap_or(1000)
    }

    pub fn failure_backoff_ms(&self) -> u64 {
        self.failure_backoff_ms.unwrap_or(1000)
    }
} // }}}

// Uplink {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Uplink {
    #[serde(default = "Config::default_module_id")]
    pub module_id: u8,

    #[serde(default = "Config::default_ports")]
    pub ports: Vec<u8>,

    pub interval_secs: Option<u64>,
}
impl Default for Uplink {
    fn default() -> Self {
        Self {
            module_id: Config::default_module_id(),
            ports: Config::default_ports(),
            interval_secs: None,
        }
    }
}
impl Uplink {
    pub fn module_id(&self) -> u8 {
        self.module_id
    }

    pub fn ports(&self) -> &[u8] {
        &self.ports
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs.unwrap_or(60)
    }
} // }}}

// Checksum {{{
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Checksum {
    pub generator: Option<u16>,
    pub key: Option<u16>,
}
impl Checksum {
    pub fn generator(&self) -> u16 {
        self.generator.unwrap_or(0x8810)
    }

    pub fn key(&self) -> u16 {
        self.key.unwrap_or(0xba95)
    }
} // }}}

// Transport {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Transport {
    #[serde(default = "Config::default_enabled")]
    pub emulate: bool,

    /// YAML register image served in place of a live bus
    pub register_dump: Option<String>,
}
impl Default for Transport {
    fn default() -> Self {
        Self {
            emulate: Config::default_enabled(),
            register_dump: None,
        }
    }
}
impl Transport {
    pub fn emulate(&self) -> bool {
        self.emulate
    }

    pub fn register_dump(&self) -> Option<&str> {
        self.register_dump.as_deref()
    }
} // }}}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        info!("Reading configuration from {}", file);
        let content = std::fs::read_to_string(&file)
            .map_err(|err| file_error!("error reading {}: {}", file, err))?;

        Self::from_yaml(&content)
    }

    /// Logs the effective settings, defaults included.
    pub fn log_summary(&self) {
        info!("Configuration loaded successfully:");
        info!("  Acquisition:");
        info!("    Retries: {}", self.acquisition.retries());
        info!("    Settle Delay: {}ms", self.acquisition.settle_delay_ms());
        info!("    Continue Interval: {}ms", self.acquisition.continue_interval_ms());
        info!("    Failure Backoff: {}ms", self.acquisition.failure_backoff_ms());
        info!("  Uplink:");
        info!("    Module ID: {}", self.uplink.module_id());
        info!("    Ports: {:?}", self.uplink.ports());
        info!("    Interval: {}s", self.uplink.interval_secs());
        info!(
            "  Checksum: generator 0x{:04x}, key 0x{:04x}",
            self.checksum.generator(),
            self.checksum.key()
        );
        info!("  Transport: {}", if self.transport.emulate() { "emulated" } else { "register dump" });
        if let Some(dump) = self.transport.register_dump() {
            info!("    Register Dump: {}", dump);
        }
        info!("  Log Level: {}", self.loglevel);
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // an empty document means "all defaults"
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn loglevel(&self) -> &str {
        &self.loglevel
    }

    fn validate(&self) -> Result<()> {
        if self.acquisition.retries() == 0 {
            bail!("acquisition.retries must be at least 1");
        }

        if self.uplink.ports.is_empty() {
            return Err(file_error!("uplink.ports cannot be empty"));
        }
        if self.uplink.interval_secs() == 0 {
            return Err(file_error!("Invalid uplink interval: 0"));
        }

        if !self.transport.emulate && self.transport.register_dump.is_none() {
            bail!("transport.register_dump is required when transport.emulate is false");
        }

        Ok(())
    }

    fn default_module_id() -> u8 {
        0
    }

    fn default_ports() -> Vec<u8> {
        vec![1, 2]
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }
}
