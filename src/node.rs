use crate::prelude::*;
use crate::payload::stage2_len;

use bytes::{Bytes, BytesMut};

/// Application layer of the node: composes uplink frames and receives
/// downlinks.
pub struct Node<T, W = TokioWaiter> {
    encoder: PayloadEncoder<T, W>,
    downlink: DownlinkDecoder,
    checksum: config::Checksum,
}

impl<T: Transport, W: Waiter> Node<T, W> {
    pub fn new(encoder: PayloadEncoder<T, W>, checksum: config::Checksum) -> Self {
        Self {
            encoder,
            downlink: DownlinkDecoder::new(),
            checksum,
        }
    }

    pub fn encoder(&self) -> &PayloadEncoder<T, W> {
        &self.encoder
    }

    /// Builds one uplink frame for `port`: stage 1 followed by stage 2.
    pub async fn uplink(&mut self, port: u8) -> Bytes {
        let selected = Port::from(port);
        let mut frame = BytesMut::with_capacity(stage2_len(selected, TransportStatus::Success));

        self.encoder.encode_stage1(selected, &mut frame);
        let status = self.encoder.encode_stage2(selected, &mut frame).await;
        let frame = frame.freeze();

        info!(
            "uplink port {} ({}): status 0x{:02x}, {} bytes: {}",
            port,
            selected,
            status.code(),
            frame.len(),
            hex::encode(&frame)
        );
        debug!("uplink tag 0x{:04x}", self.tag(&frame));

        frame
    }

    /// Keyed LFSR integrity tag over `frame`.
    pub fn tag(&self, frame: &[u8]) -> u16 {
        lfsr_digest16(frame, self.checksum.generator(), self.checksum.key())
    }

    pub fn downlink(&mut self, port: u8, payload: &[u8]) -> u8 {
        self.downlink.decode(port, payload)
    }
}
