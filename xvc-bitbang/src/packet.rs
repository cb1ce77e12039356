//! Bulk transport framing.
//!
//! A shift travels to the device as one header packet followed by the TMS vector and then
//! the TDI vector, each cut into packets of at most [`PACKET_SIZE`] bytes. The TDO vector
//! travels back in packets of any size; the host reassembles it with a [`Reassembler`].
use core::fmt::{self, Display};
use core::slice::Chunks;

/// Maximum payload of a single bulk packet (full-speed USB bulk endpoint).
pub const PACKET_SIZE: usize = 64;

/// Bytes of the header packet that carry the bit count. Further bytes are ignored.
pub const HEADER_SIZE: usize = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameError {
    /// The header packet is too short to hold a bit count.
    ShortHeader { len: usize },
    /// More bytes arrived than the vector holds.
    Overflow { expected: usize, got: usize },
}

impl Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::ShortHeader { len } => write!(
                f,
                "Header packet has {} bytes, expected at least {}",
                len, HEADER_SIZE
            ),
            FrameError::Overflow { expected, got } => write!(
                f,
                "Received {} bytes for a vector of {} bytes",
                got, expected
            ),
        }
    }
}

impl core::error::Error for FrameError {}

pub fn encode_header(bit_count: u32) -> [u8; HEADER_SIZE] {
    bit_count.to_le_bytes()
}

pub fn decode_header(packet: &[u8]) -> Result<u32, FrameError> {
    match packet.first_chunk::<HEADER_SIZE>() {
        Some(header) => Ok(u32::from_le_bytes(*header)),
        None => Err(FrameError::ShortHeader { len: packet.len() }),
    }
}

/// Number of packets needed for a vector of `byte_count` bytes.
pub fn packet_count(byte_count: usize) -> usize {
    byte_count.div_ceil(PACKET_SIZE)
}

/// One packet of a framed shift.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Frame<'a> {
    Header([u8; HEADER_SIZE]),
    Tms(&'a [u8]),
    Tdi(&'a [u8]),
}

impl Frame<'_> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Header(header) => &header[..],
            Frame::Tms(chunk) | Frame::Tdi(chunk) => chunk,
        }
    }
}

/// Yields the packets of a shift in transmission order: header, TMS chunks, TDI chunks.
///
/// `tms` and `tdi` are expected to be `ceil(bit_count / 8)` bytes long; the caller validates.
pub struct Frames<'a> {
    header: Option<[u8; HEADER_SIZE]>,
    tms: Chunks<'a, u8>,
    tdi: Chunks<'a, u8>,
}

impl<'a> Frames<'a> {
    pub fn new(bit_count: u32, tms: &'a [u8], tdi: &'a [u8]) -> Frames<'a> {
        Frames {
            header: Some(encode_header(bit_count)),
            tms: tms.chunks(PACKET_SIZE),
            tdi: tdi.chunks(PACKET_SIZE),
        }
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Frame<'a>> {
        if let Some(header) = self.header.take() {
            return Some(Frame::Header(header));
        }
        self.tms
            .next()
            .map(Frame::Tms)
            .or_else(|| self.tdi.next().map(Frame::Tdi))
    }
}

/// Collects a vector of known length from packets of arbitrary size, in arrival order.
pub struct Reassembler<'a> {
    target: &'a mut [u8],
    offset: usize,
}

impl<'a> Reassembler<'a> {
    /// Reassembles into `target`; its length is the number of bytes expected.
    pub fn new(target: &'a mut [u8]) -> Reassembler<'a> {
        Reassembler { target, offset: 0 }
    }

    /// Appends one packet. Fails without writing if the packet would overrun the vector.
    pub fn push(&mut self, packet: &[u8]) -> Result<(), FrameError> {
        let end = self.offset + packet.len();
        if end > self.target.len() {
            return Err(FrameError::Overflow {
                expected: self.target.len(),
                got: end,
            });
        }
        self.target[self.offset..end].copy_from_slice(packet);
        self.offset = end;
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.target.len() - self.offset
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn chunk_and_reassemble() {
        for len in [0, 1, PACKET_SIZE - 1, PACKET_SIZE, PACKET_SIZE + 1, 10 * PACKET_SIZE] {
            let original = pattern(len);
            let chunks: Vec<&[u8]> = original.chunks(PACKET_SIZE).collect();
            assert_eq!(chunks.len(), packet_count(len));
            assert!(chunks.iter().all(|c| c.len() <= PACKET_SIZE));

            let mut out = vec![0; len];
            let mut reassembler = Reassembler::new(&mut out);
            for chunk in chunks {
                reassembler.push(chunk).unwrap();
            }
            assert!(reassembler.is_complete());
            assert_eq!(out, original, "length {}", len);
        }
    }

    #[test]
    fn reassemble_uneven_chunks() {
        let original = pattern(130);
        let mut out = vec![0; 130];
        let mut reassembler = Reassembler::new(&mut out);
        for chunk in [&original[..1], &original[1..100], &original[100..]] {
            assert!(!reassembler.is_complete());
            reassembler.push(chunk).unwrap();
        }
        assert!(reassembler.is_complete());
        assert_eq!(out, original);
    }

    #[test]
    fn reassembler_rejects_overflow() {
        let mut out = [0u8; 3];
        let mut reassembler = Reassembler::new(&mut out);
        reassembler.push(&[1, 2]).unwrap();
        assert_eq!(
            reassembler.push(&[3, 4]),
            Err(FrameError::Overflow {
                expected: 3,
                got: 4
            })
        );
        assert_eq!(reassembler.remaining(), 1);
        assert_eq!(out, [1, 2, 0]);
    }

    #[test]
    fn frames_are_ordered() {
        let tms = pattern(PACKET_SIZE + 10);
        let tdi = pattern(PACKET_SIZE + 10);
        let bit_count = (8 * tms.len()) as u32;
        let frames: Vec<Frame> = Frames::new(bit_count, &tms, &tdi).collect();

        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0], Frame::Header(bit_count.to_le_bytes()));
        assert_eq!(frames[1], Frame::Tms(&tms[..PACKET_SIZE]));
        assert_eq!(frames[2], Frame::Tms(&tms[PACKET_SIZE..]));
        assert_eq!(frames[3], Frame::Tdi(&tdi[..PACKET_SIZE]));
        assert_eq!(frames[4], Frame::Tdi(&tdi[PACKET_SIZE..]));
    }

    #[test]
    fn zero_bits_is_header_only() {
        let frames: Vec<Frame> = Frames::new(0, &[], &[]).collect();
        assert_eq!(frames, vec![Frame::Header([0; 4])]);
    }

    #[test]
    fn header_roundtrip_ignores_padding() {
        let mut packet = [0xEEu8; PACKET_SIZE];
        packet[..HEADER_SIZE].copy_from_slice(&encode_header(8191));
        assert_eq!(decode_header(&packet), Ok(8191));
        assert_eq!(
            decode_header(&[1, 2, 3]),
            Err(FrameError::ShortHeader { len: 3 })
        );
    }
}
