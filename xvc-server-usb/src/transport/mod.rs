//! Packet transports between the bridge and the bit-banging device.
//!
//! Every call is bounded by the transport's timeout. There are no retries: a failed transfer
//! is reported and the XVC session is ended.
use crate::error::BridgeError;

pub mod loopback;
pub mod usb;

/// A bulk channel with a maximum packet size of [`xvc_bitbang::packet::PACKET_SIZE`].
pub trait BulkTransport {
    /// Sends one packet of at most `PACKET_SIZE` bytes.
    fn write_packet(&mut self, packet: &[u8]) -> Result<(), BridgeError>;

    /// Receives one packet into `buf` and returns its length.
    fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError>;

    /// Recovers from an aborted shift, so that the device expects a header packet again.
    fn reset(&mut self) -> Result<(), BridgeError>;
}
