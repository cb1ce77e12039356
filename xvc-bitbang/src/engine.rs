//! The device-side shift state machine.
//!
//! The engine is fed one bulk packet at a time. It decodes the header, collects the TMS
//! and TDI vectors, and once both are complete it clocks the shift out through its
//! [`JtagPins`] and hands back the captured TDO vector.
//!
//! ```text
//!            header                  TMS full                 TDI full
//!  Header ----------> ReceiveTms -------------> ReceiveTdi -------------> Header
//!    ^  |                 |                         |        (bit-bang,
//!    |  |   error         |          error          |         TDO out)
//!    +--|-----------------+-------------------------+
//!    |  | header too large
//!    |  v
//!  Discard (payload packets of the rejected shift)
//! ```
use core::fmt::{self, Display};

use crate::DEFAULT_CAPACITY;
use crate::packet::{self, FrameError, PACKET_SIZE};
use crate::pins::JtagPins;
use crate::vector::{self, CapacityExceeded, VectorBuffer};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    /// Waiting for the header packet of the next shift.
    Header,
    /// Collecting the TMS vector.
    ReceiveTms { bit_count: u32 },
    /// Collecting the TDI vector.
    ReceiveTdi { bit_count: u32 },
    /// Skipping the TMS and TDI packets of a shift that was rejected for its size.
    Discard { remaining_packets: usize },
}

/// Errors that abort the shift in progress. The engine is back in [`State::Header`]
/// whenever one of these is returned, except for [`EngineError::CapacityExceeded`]: the
/// payload of that shift is still on its way and is skipped in [`State::Discard`] first.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EngineError {
    Frame(FrameError),
    CapacityExceeded(CapacityExceeded),
    /// A payload packet ended before the vector was complete.
    ShortPacket { expected: usize, got: usize },
    /// A payload packet was larger than the transport allows.
    OversizedPacket { len: usize },
}

impl From<FrameError> for EngineError {
    fn from(value: FrameError) -> Self {
        EngineError::Frame(value)
    }
}

impl From<CapacityExceeded> for EngineError {
    fn from(value: CapacityExceeded) -> Self {
        EngineError::CapacityExceeded(value)
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Frame(error) => write!(f, "{}", error),
            EngineError::CapacityExceeded(error) => write!(f, "{}", error),
            EngineError::ShortPacket { expected, got } => write!(
                f,
                "Short packet: expected {} bytes, got {}",
                expected, got
            ),
            EngineError::OversizedPacket { len } => write!(
                f,
                "Packet of {} bytes exceeds packet size {}",
                len, PACKET_SIZE
            ),
        }
    }
}

impl core::error::Error for EngineError {}

/// Runs XVC shifts on a JTAG chain.
///
/// Owns its vector buffers; nothing is shared between engines.
pub struct ShiftEngine<P, const CAP: usize = DEFAULT_CAPACITY> {
    pins: P,
    state: State,
    tms: VectorBuffer<CAP>,
    tdi: VectorBuffer<CAP>,
    tdo: VectorBuffer<CAP>,
}

impl<P: JtagPins, const CAP: usize> ShiftEngine<P, CAP> {
    pub fn new(pins: P) -> Self {
        ShiftEngine {
            pins,
            state: State::Header,
            tms: VectorBuffer::new(),
            tdi: VectorBuffer::new(),
            tdo: VectorBuffer::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Drops any partially received shift. Called by the firmware when the transport
    /// is reset.
    pub fn abort(&mut self) {
        if self.state != State::Header {
            log::debug!("Aborting shift in state {:?}", self.state);
        }
        self.state = State::Header;
    }

    /// Feeds one packet into the engine.
    ///
    /// Returns the TDO vector once a shift has been executed, which is exactly
    /// `ceil(bit_count / 8)` bytes long and must be sent back to the host.
    pub fn receive(&mut self, packet: &[u8]) -> Result<Option<&[u8]>, EngineError> {
        match self.transition(packet) {
            Ok(true) => Ok(Some(self.tdo.as_slice())),
            Ok(false) => Ok(None),
            Err(e) => {
                log::warn!("Dropping shift in state {:?}: {}", self.state, e);
                if !matches!(self.state, State::Discard { .. }) {
                    self.state = State::Header;
                }
                Err(e)
            }
        }
    }

    /// Advances the state machine by one packet. Returns `true` when a shift was executed.
    fn transition(&mut self, packet: &[u8]) -> Result<bool, EngineError> {
        match self.state {
            State::Header => {
                let bit_count = packet::decode_header(packet)?;
                let byte_count = vector::byte_count(bit_count);
                if byte_count > CAP {
                    let remaining_packets = 2 * packet::packet_count(byte_count);
                    if remaining_packets > 0 {
                        self.state = State::Discard { remaining_packets };
                    }
                    return Err(CapacityExceeded {
                        requested: byte_count,
                        capacity: CAP,
                    }
                    .into());
                }
                self.tms.reset(byte_count)?;
                self.tdi.reset(byte_count)?;
                self.tdo.reset(byte_count)?;
                log::debug!("Shift header: bit_count={}, byte_count={}", bit_count, byte_count);

                if byte_count == 0 {
                    return Ok(true);
                }
                self.state = State::ReceiveTms { bit_count };
                Ok(false)
            }
            State::ReceiveTms { bit_count } => {
                Self::fill(&mut self.tms, packet)?;
                if self.tms.is_full() {
                    self.state = State::ReceiveTdi { bit_count };
                }
                Ok(false)
            }
            State::ReceiveTdi { bit_count } => {
                Self::fill(&mut self.tdi, packet)?;
                if !self.tdi.is_full() {
                    return Ok(false);
                }
                self.shift(bit_count);
                self.state = State::Header;
                Ok(true)
            }
            State::Discard { remaining_packets } => {
                self.state = match remaining_packets - 1 {
                    0 => {
                        log::debug!("Rejected shift skipped");
                        State::Header
                    }
                    remaining_packets => State::Discard { remaining_packets },
                };
                Ok(false)
            }
        }
    }

    /// Every payload packet must be full sized, except the last one of a vector which
    /// carries the remainder. Bytes past the end of the vector are padding.
    fn fill(buffer: &mut VectorBuffer<CAP>, packet: &[u8]) -> Result<(), EngineError> {
        if packet.len() > PACKET_SIZE {
            return Err(EngineError::OversizedPacket { len: packet.len() });
        }
        let expected = buffer.remaining().min(PACKET_SIZE);
        if packet.len() < expected {
            return Err(EngineError::ShortPacket {
                expected,
                got: packet.len(),
            });
        }
        buffer.append(packet);
        Ok(())
    }

    /// Clocks `bit_count` cycles and captures TDO.
    fn shift(&mut self, bit_count: u32) {
        log::trace!("Shift TMS: {:02x?}", self.tms.as_slice());
        log::trace!("Shift TDI: {:02x?}", self.tdi.as_slice());
        for i in 0..bit_count as usize {
            let tdo = self.pins.cycle(self.tms.get_bit(i), self.tdi.get_bit(i));
            self.tdo.set_bit(i, tdo);
        }
        log::trace!("Shift TDO: {:02x?}", self.tdo.as_slice());
    }
}
