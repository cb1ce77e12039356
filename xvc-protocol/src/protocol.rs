use std::fmt::Display;

/// The version of the protocol.
/// A version always consists of a major and a minor part.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Version {
    major: usize,
    minor: usize,
}

impl Version {
    /// Version 1.0 of the protocol
    pub const V1_0: Version = Version { major: 1, minor: 0 };

    /// Returns the latest supported version
    pub fn latest() -> Version {
        Version::V1_0
    }

    pub fn major(&self) -> usize {
        self.major
    }

    pub fn minor(&self) -> usize {
        self.minor
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::V1_0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A command sent from the client to the server.
///
/// The client sends one message and waits for the reply before sending the next.
/// The server replies to every message except unknown ones, in the order received.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message {
    /// Requests the server capabilities. Answered with an [`XvcInfo`].
    GetInfo,
    /// Requests a TCK period. Answered with the period actually in effect (4 bytes, LE).
    SetTck { period_ns: u32 },
    /// Clocks `num_bits` cycles through the JTAG chain. Answered with the TDO vector.
    Shift {
        /// Number of TCK cycles.
        num_bits: u32,
        /// TMS level per cycle, LSB first, `ceil(num_bits / 8)` bytes.
        tms: Box<[u8]>,
        /// TDI level per cycle, LSB first, `ceil(num_bits / 8)` bytes.
        tdi: Box<[u8]>,
    },
}

impl Message {
    /// Length of the reply the server sends for this message, if fixed.
    pub fn reply_len(&self) -> Option<usize> {
        match self {
            Message::GetInfo => None,
            Message::SetTck { .. } => Some(4),
            Message::Shift { num_bits, .. } => Some(num_bits.div_ceil(8) as usize),
        }
    }
}

/// Server capabilities, sent in reply to [`Message::GetInfo`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XvcInfo {
    version: Version,
    max_vector_len: u32,
}

impl XvcInfo {
    pub fn new(version: Version, max_vector_len: u32) -> XvcInfo {
        XvcInfo {
            version,
            max_vector_len,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Largest shift payload in bytes (TMS and TDI vectors together) the server accepts.
    pub fn max_vector_len(&self) -> u32 {
        self.max_vector_len
    }

    /// Largest TMS (or TDI) vector in bytes.
    pub fn max_shift_bytes(&self) -> usize {
        self.max_vector_len as usize / 2
    }
}

impl Default for XvcInfo {
    fn default() -> XvcInfo {
        XvcInfo {
            version: Version::default(),
            max_vector_len: 2048,
        }
    }
}
