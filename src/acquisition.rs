use crate::prelude::*;

use async_trait::async_trait;
use std::time::Duration;

/// Named suspension points of an acquisition cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum WaitPoint {
    /// After transport initialisation, before the first read.
    Settle,
    /// Between reads while the transport reports `Continue`.
    Continue,
    /// After a failure that ended a drained transaction.
    FailureBackoff,
}

/// Waiting primitive used at every [`WaitPoint`].
#[async_trait]
pub trait Waiter: Send {
    async fn wait(&mut self, point: WaitPoint, period: Duration);
}

/// Yields to the tokio runtime for the requested period.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioWaiter;

#[async_trait]
impl Waiter for TokioWaiter {
    async fn wait(&mut self, point: WaitPoint, period: Duration) {
        trace!("waiting {:?} at {:?}", period, point);
        tokio::time::sleep(period).await;
    }
}

// RetryPolicy {{{
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of outer read attempts, at least one.
    pub retries: u32,
    pub settle_delay: Duration,
    pub continue_interval: Duration,
    pub failure_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            settle_delay: Duration::from_millis(500),
            continue_interval: Duration::from_millis(1000),
            failure_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &config::Acquisition) -> Self {
        Self {
            retries: config.retries(),
            settle_delay: Duration::from_millis(config.settle_delay_ms()),
            continue_interval: Duration::from_millis(config.continue_interval_ms()),
            failure_backoff: Duration::from_millis(config.failure_backoff_ms()),
        }
    }

    pub fn period(&self, point: WaitPoint) -> Duration {
        match point {
            WaitPoint::Settle => self.settle_delay,
            WaitPoint::Continue => self.continue_interval,
            WaitPoint::FailureBackoff => self.failure_backoff,
        }
    }

    fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
} // }}}

/// Drives a register read against a [`Transport`] to completion.
pub struct RegisterAcquisition<T, W = TokioWaiter> {
    transport: T,
    waiter: W,
    policy: RetryPolicy,
    last: Option<TransportStatus>,
}

impl<T: Transport> RegisterAcquisition<T, TokioWaiter> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self::with_waiter(transport, TokioWaiter, policy)
    }
}

impl<T: Transport, W: Waiter> RegisterAcquisition<T, W> {
    pub fn with_waiter(transport: T, waiter: W, policy: RetryPolicy) -> Self {
        Self {
            transport,
            waiter,
            policy,
            last: None,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn waiter(&self) -> &W {
        &self.waiter
    }

    /// Initialises the transport and waits out the settle delay.
    pub async fn initialize(&mut self) {
        self.last = None;
        self.transport.initialize().await;
        self.wait(WaitPoint::Settle).await;
    }

    /// Runs up to `retries` read attempts and returns the final status, which
    /// is either `Success` or the `Failure` of the last attempt.
    ///
    /// Within one attempt, `Continue` results are drained without limit.
    pub async fn acquire(&mut self) -> TransportStatus {
        let attempts = self.policy.attempts();
        let mut attempt = 1;

        let status = loop {
            let status = self.attempt().await;

            if status.is_success() {
                debug!("acquisition succeeded on attempt {}/{}", attempt, attempts);
                break status;
            }

            debug!(
                "acquisition attempt {}/{} ended with 0x{:02x}",
                attempt,
                attempts,
                status.code()
            );

            if attempt >= attempts {
                break status;
            }
            attempt += 1;
        };

        self.last = Some(status);
        status
    }

    /// Latest telemetry, available only while the last acquisition succeeded.
    pub fn record(&self) -> Option<&TelemetryRecord> {
        match self.last {
            Some(TransportStatus::Success) => Some(self.transport.telemetry()),
            _ => None,
        }
    }

    pub fn last_status(&self) -> Option<TransportStatus> {
        self.last
    }

    async fn attempt(&mut self) -> TransportStatus {
        let mut status = self.transport.read_input_registers().await;
        debug!("read_input_registers: 0x{:02x}", status.code());
        if let TransportStatus::Failure(code) = status {
            error!("Error: {}", self.transport.describe_error(code));
            return status;
        }

        while status == TransportStatus::Continue {
            self.wait(WaitPoint::Continue).await;
            status = self.transport.read_input_registers().await;

            let message = self.transport.describe_error(status.code());
            if let TransportStatus::Failure(_) = status {
                error!("Error: {}", message);
                self.wait(WaitPoint::FailureBackoff).await;
            } else {
                debug!("{}", message);
            }
        }

        status
    }

    async fn wait(&mut self, point: WaitPoint) {
        let period = self.policy.period(point);
        self.waiter.wait(point, period).await;
    }
}
