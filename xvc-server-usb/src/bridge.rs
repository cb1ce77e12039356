//! # Bridge Backend
//!
//! Forwards XVC shifts to a bit-banging device: the bit count as a header packet, then
//! TMS and TDI in packets of at most [`PACKET_SIZE`] bytes. The device answers with TDO
//! once it has clocked the whole shift.
use std::io;

use xvc_bitbang::DEFAULT_CAPACITY;
use xvc_bitbang::packet::{Frames, PACKET_SIZE, Reassembler};
use xvc_bitbang::vector::{self, CapacityExceeded};
use xvc_server::XvcServer;

use crate::error::BridgeError;
use crate::transport::BulkTransport;

/// An [`XvcServer`] backend driving a device over a [`BulkTransport`].
pub struct UsbBridge<T> {
    transport: T,
}

impl<T: BulkTransport> UsbBridge<T> {
    pub fn new(transport: T) -> UsbBridge<T> {
        UsbBridge { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs one shift on the device.
    /// `num_bits / 8`, rounded up must be the same length as `tms` and `tdi`.
    /// The returned result, if successful, will also be of that size.
    pub fn shift_data(
        &mut self,
        num_bits: u32,
        tms: &[u8],
        tdi: &[u8],
    ) -> Result<Box<[u8]>, BridgeError> {
        let num_bytes = vector::byte_count(num_bits);
        if tms.len() != num_bytes {
            return Err(BridgeError::VectorLength {
                vector: "TMS",
                expected: num_bytes,
                got: tms.len(),
            });
        }
        if tdi.len() != num_bytes {
            return Err(BridgeError::VectorLength {
                vector: "TDI",
                expected: num_bytes,
                got: tdi.len(),
            });
        }
        if num_bytes > DEFAULT_CAPACITY {
            return Err(CapacityExceeded {
                requested: num_bytes,
                capacity: DEFAULT_CAPACITY,
            }
            .into());
        }
        if num_bytes == 0 {
            log::debug!("Empty shift, nothing to clock");
            return Ok(Box::default());
        }

        log::debug!(
            "Bridge shift: num_bits={}, num_bytes={}",
            num_bits,
            num_bytes
        );
        for frame in Frames::new(num_bits, tms, tdi) {
            self.transport.write_packet(frame.as_bytes())?;
        }

        let mut tdo = vec![0; num_bytes].into_boxed_slice();
        let mut reassembler = Reassembler::new(&mut tdo);
        let mut packet = [0u8; PACKET_SIZE];
        while !reassembler.is_complete() {
            let n = self.transport.read_packet(&mut packet)?;
            reassembler.push(&packet[..n])?;
        }
        Ok(tdo)
    }
}

impl<T: BulkTransport> XvcServer for UsbBridge<T> {
    fn set_tck(&mut self, period_ns: u32) -> u32 {
        log::debug!("Bridge set_tck: period_ns={} (fixed clock)", period_ns);
        period_ns
    }

    fn shift(&mut self, num_bits: u32, tms: &[u8], tdi: &[u8]) -> io::Result<Box<[u8]>> {
        self.shift_data(num_bits, tms, tdi).map_err(|e| {
            log::error!("Bridge shift error: {}", e);
            e.into()
        })
    }

    fn reset(&mut self) -> io::Result<()> {
        self.transport.reset()?;
        Ok(())
    }

    /// TMS and TDI each fill one device buffer.
    fn max_vector_size(&self) -> Option<u32> {
        Some(2 * DEFAULT_CAPACITY as u32)
    }
}
