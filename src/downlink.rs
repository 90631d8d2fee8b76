use crate::prelude::*;

/// Result code returned for every downlink that caused no action.
pub const DOWNLINK_RESULT_NONE: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownlinkError {
    #[error("empty downlink payload on port {0}")]
    Empty(u8),
    #[error("unknown downlink command 0x{command:02x} on port {port}")]
    UnknownCommand { port: u8, command: u8 },
    #[error("downlink command 0x{command:02x} expects {expected} argument bytes, got {actual}")]
    InvalidLength {
        command: u8,
        expected: usize,
        actual: usize,
    },
}

impl DownlinkError {
    /// Length check each command runs on its arguments before acting.
    pub fn expect_len(command: u8, expected: usize, args: &[u8]) -> Result<(), Self> {
        if args.len() != expected {
            return Err(Self::InvalidLength {
                command,
                expected,
                actual: args.len(),
            });
        }
        Ok(())
    }
}

/// Commands accepted on the downlink, keyed by the first payload byte.
///
/// No command set is defined for this node yet, so every identifier is
/// rejected. New variants parse their arguments in [`DownlinkCommand::parse`]
/// after checking them with [`DownlinkError::expect_len`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownlinkCommand {}

impl DownlinkCommand {
    pub fn parse(port: u8, payload: &[u8]) -> Result<Self, DownlinkError> {
        let (&command, _args) = payload.split_first().ok_or(DownlinkError::Empty(port))?;

        Err(DownlinkError::UnknownCommand { port, command })
    }

    pub fn id(&self) -> u8 {
        match *self {}
    }
}

#[derive(Debug, Default)]
pub struct DownlinkDecoder;

impl DownlinkDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Dispatches a downlink payload. Rejected payloads are logged and leave
    /// the node untouched; the result is always [`DOWNLINK_RESULT_NONE`].
    pub fn decode(&mut self, port: u8, payload: &[u8]) -> u8 {
        debug!("downlink on port {}: {} bytes", port, payload.len());

        DownlinkCommand::parse(port, payload)
            .map(|command| self.apply(command))
            .unwrap_or_else(|e| {
                debug!("downlink ignored: {}", e);
                DOWNLINK_RESULT_NONE
            })
    }

    fn apply(&mut self, command: DownlinkCommand) -> u8 {
        match command {}
    }
}
