pub use anyhow::{anyhow, bail, Error, Result};
pub use log::{debug, error, info, trace, warn};

pub use crate::acquisition::{RegisterAcquisition, RetryPolicy, TokioWaiter, WaitPoint, Waiter};
pub use crate::checksum::lfsr_digest16;
pub use crate::config::{self, Config};
pub use crate::downlink::DownlinkDecoder;
pub use crate::file_error;
pub use crate::node::Node;
pub use crate::options::Options;
pub use crate::payload::{ByteSink, PayloadEncoder};
pub use crate::telemetry::{Port, TelemetryRecord};
pub use crate::transport::{Transport, TransportStatus};
