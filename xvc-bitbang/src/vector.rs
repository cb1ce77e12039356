//! Byte-packed bit vectors.
//!
//! Bit `i` of a vector lives in byte `i / 8` at position `i % 8`, least significant bit first.
//! The same order is used for TMS, TDI and TDO.
use core::fmt::{self, Display};

/// Number of bytes needed to hold `bit_count` bits.
pub fn byte_count(bit_count: u32) -> usize {
    bit_count.div_ceil(8) as usize
}

/// Reads bit `index` of `buf`.
pub fn get_bit(buf: &[u8], index: usize) -> bool {
    (buf[index / 8] >> (index % 8)) & 1 != 0
}

/// Sets or clears bit `index` of `buf`, leaving all other bits untouched.
pub fn set_bit(buf: &mut [u8], index: usize, value: bool) {
    let mask = 1 << (index % 8);
    if value {
        buf[index / 8] |= mask;
    } else {
        buf[index / 8] &= !mask;
    }
}

/// The requested vector does not fit into the buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CapacityExceeded {
    pub requested: usize,
    pub capacity: usize,
}

impl Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vector of {} bytes exceeds capacity of {} bytes",
            self.requested, self.capacity
        )
    }
}

impl core::error::Error for CapacityExceeded {}

/// A bit vector with fixed storage of `CAP` bytes.
///
/// The buffer has a length (`byte_count` of the current shift) that is set by [`reset`](Self::reset)
/// and a fill level that grows as packets are appended. Writes never go past the length.
#[derive(Clone, Debug)]
pub struct VectorBuffer<const CAP: usize> {
    data: [u8; CAP],
    len: usize,
    filled: usize,
}

impl<const CAP: usize> Default for VectorBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> VectorBuffer<CAP> {
    pub const fn new() -> Self {
        VectorBuffer {
            data: [0; CAP],
            len: 0,
            filled: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Zeroes the buffer and prepares it to receive `len` bytes.
    ///
    /// Nothing is modified when `len` exceeds the capacity.
    pub fn reset(&mut self, len: usize) -> Result<(), CapacityExceeded> {
        if len > CAP {
            return Err(CapacityExceeded {
                requested: len,
                capacity: CAP,
            });
        }
        self.data.fill(0);
        self.len = len;
        self.filled = 0;
        Ok(())
    }

    /// Appends as many bytes of `bytes` as still fit into the current length.
    /// Returns the number of bytes taken.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.remaining());
        self.data[self.filled..self.filled + n].copy_from_slice(&bytes[..n]);
        self.filled += n;
        n
    }

    /// Bytes still missing until the buffer is full.
    pub fn remaining(&self) -> usize {
        self.len - self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get_bit(&self, index: usize) -> bool {
        get_bit(self.as_slice(), index)
    }

    pub fn set_bit(&mut self, index: usize, value: bool) {
        set_bit(&mut self.data[..self.len], index, value)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}
