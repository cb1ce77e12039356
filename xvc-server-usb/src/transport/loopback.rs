//! # Loopback Device
//!
//! Runs the device firmware's [`ShiftEngine`] in-process against a simulated JTAG target,
//! so the bridge can be exercised without hardware. TDO is TDI delayed by a configurable
//! number of cycles.
use std::collections::VecDeque;

use xvc_bitbang::engine::{ShiftEngine, State};
use xvc_bitbang::packet::PACKET_SIZE;
use xvc_bitbang::sim::LoopbackTarget;

use super::BulkTransport;
use crate::error::BridgeError;

pub struct LoopbackDevice {
    engine: ShiftEngine<LoopbackTarget>,
    /// TDO bytes not yet picked up by the host.
    pending: VecDeque<u8>,
}

impl LoopbackDevice {
    pub fn new(delay: usize) -> LoopbackDevice {
        log::info!("Simulating a loopback JTAG target with a delay of {} cycles", delay);
        LoopbackDevice {
            engine: ShiftEngine::new(LoopbackTarget::new(delay)),
            pending: VecDeque::new(),
        }
    }

    /// The simulated target. Its recorded cycles cover the most recent shift.
    pub fn target(&self) -> &LoopbackTarget {
        self.engine.pins()
    }

    pub fn state(&self) -> State {
        self.engine.state()
    }
}

impl BulkTransport for LoopbackDevice {
    fn write_packet(&mut self, packet: &[u8]) -> Result<(), BridgeError> {
        // The bus splits larger transfers into packets
        for chunk in packet.chunks(PACKET_SIZE) {
            if self.engine.state() == State::Header {
                self.engine.pins_mut().clear_cycles();
            }
            // Like the firmware, drop the shift silently; the host notices by timing out.
            match self.engine.receive(chunk) {
                Ok(Some(tdo)) => self.pending.extend(tdo),
                Ok(None) => {}
                Err(e) => log::warn!("Loopback device dropped a shift: {}", e),
            }
        }
        Ok(())
    }

    fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError> {
        if self.pending.is_empty() {
            return Err(BridgeError::Timeout {
                operation: "read a bulk packet",
            });
        }
        let n = buf.len().min(PACKET_SIZE).min(self.pending.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn reset(&mut self) -> Result<(), BridgeError> {
        self.engine.abort();
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn returns_tdo_in_packets() {
        let mut device = LoopbackDevice::new(0);
        let tdi: Vec<u8> = (0..100u8).collect();
        device.write_packet(&800u32.to_le_bytes()).unwrap();
        device.write_packet(&[0; 64]).unwrap();
        device.write_packet(&[0; 36]).unwrap();
        device.write_packet(&tdi[..64]).unwrap();
        device.write_packet(&tdi[64..]).unwrap();

        let mut buf = [0u8; 128];
        assert_eq!(device.read_packet(&mut buf).unwrap(), 64);
        assert_eq!(&buf[..64], &tdi[..64]);
        assert_eq!(device.read_packet(&mut buf).unwrap(), 36);
        assert_eq!(&buf[..36], &tdi[64..]);
        assert!(matches!(
            device.read_packet(&mut buf),
            Err(BridgeError::Timeout { .. })
        ));
        assert_eq!(device.target().cycles().len(), 800);
    }

    #[test]
    fn reset_aborts_partial_shift() {
        let mut device = LoopbackDevice::new(0);
        device.write_packet(&16u32.to_le_bytes()).unwrap();
        device.write_packet(&[0, 0]).unwrap();
        assert_eq!(device.state(), State::ReceiveTdi { bit_count: 16 });
        device.reset().unwrap();
        assert_eq!(device.state(), State::Header);
    }
}
