pub mod acquisition;   // Bounded-retry register acquisition
pub mod checksum;      // Keyed LFSR digest
pub mod config;        // Configuration management
pub mod downlink;      // Downlink command dispatch
pub mod error;         // Error helpers
pub mod node;          // Uplink/downlink application layer
pub mod options;       // Command line options parsing
pub mod payload;       // Uplink frame encoding and decoding
pub mod prelude;       // Common imports and types
pub mod telemetry;     // Telemetry record and ports
pub mod transport;     // Field bus transports

// Get the package version from Cargo.toml
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;
use crate::payload::frame::UplinkFrame;
use crate::transport::emulated::EmulatedTransport;
use crate::transport::growatt::{GrowattInterface, RegisterDump};
use std::future::Future;
use std::io::Write;
use std::time::Duration;

/// Initialises the global logger at `level` unless RUST_LOG says otherwise.
pub fn init_logging(level: &str) {
    if let Err(e) = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init()
    {
        eprintln!("Failed to initialise logging: {}", e);
    }
}

/// Builds the transport selected by the configuration.
pub fn build_transport(config: &Config) -> Result<Box<dyn Transport>> {
    if config.transport.emulate() {
        info!("  Using emulated sensors");
        return Ok(Box::new(EmulatedTransport::new()));
    }

    let file = config
        .transport
        .register_dump()
        .ok_or_else(|| anyhow!("transport.register_dump must be set"))?;
    info!("  Using register dump {}", file);
    let bus = RegisterDump::from_file(file)?;

    Ok(Box::new(GrowattInterface::new(bus)))
}

pub fn build_node(config: &Config) -> Result<Node<Box<dyn Transport>>> {
    let policy = RetryPolicy::from_config(&config.acquisition);
    let acquisition = RegisterAcquisition::new(build_transport(config)?, policy);
    let encoder = PayloadEncoder::new(acquisition).with_module_id(config.uplink.module_id());

    Ok(Node::new(encoder, config.checksum.clone()))
}

/// Runs uplink cycles every `period`, rotating through `ports`, until `cycles`
/// have completed or `shutdown` resolves. Shutdown is observed while waiting
/// for the next tick and while an uplink is in progress; an interrupted
/// uplink is abandoned. Returns the number of completed cycles.
pub async fn run<T, W, F>(
    node: &mut Node<T, W>,
    ports: &[u8],
    period: Duration,
    cycles: Option<u64>,
    shutdown: F,
) -> Result<u64>
where
    T: Transport,
    W: Waiter,
    F: Future<Output = ()>,
{
    if ports.is_empty() {
        bail!("no uplink ports to cycle through");
    }

    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(period);
    let mut cycle: u64 = 0;

    loop {
        let port = ports[(cycle % ports.len() as u64) as usize];

        let frame = tokio::select! {
            _ = &mut shutdown => break,
            frame = async {
                interval.tick().await;
                node.uplink(port).await
            } => frame,
        };

        match UplinkFrame::decode(Port::from(port), &frame) {
            Ok(decoded) => info!("decoded: {}", serde_json::to_string(&decoded)?),
            Err(e) => warn!("uplink frame does not decode: {}", e),
        }

        cycle += 1;
        if cycles.is_some_and(|cycles| cycle >= cycles) {
            info!("{} uplink cycles complete", cycle);
            break;
        }
    }

    Ok(cycle)
}

/// Main application entry point
///
/// Loads the configuration, then triggers one uplink cycle per interval,
/// rotating through the configured ports, until the cycle limit is reached
/// or Ctrl-C is received.
pub async fn app(options: Options) -> Result<()> {
    let config = Config::new(options.config_file.clone())?;

    init_logging(config.loglevel());
    info!("growatt-node {} starting with config file: {}", CARGO_PKG_VERSION, options.config_file);
    config.log_summary();

    let ports = match options.port {
        Some(port) => vec![port],
        None => config.uplink.ports().to_vec(),
    };

    info!("Initializing node...");
    let mut node = build_node(&config)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let period = Duration::from_secs(config.uplink.interval_secs());
    run(&mut node, &ports, period, options.cycles, shutdown).await?;

    info!("Application shutdown complete");
    Ok(())
}
