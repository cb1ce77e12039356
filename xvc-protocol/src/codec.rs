/// Blocking read and write implementations for the protocol messages.
///
/// All readers use `read_exact`, so fields split over several TCP segments are
/// collected transparently. Only end of stream or an I/O failure ends a read early.
use std::io::{self, BufRead, BufReader, Read, Write};

use crate::{
    error::ReadError,
    protocol::{Message, Version, XvcInfo},
};

const XVC_INFO_PREFIX: &[u8] = b"xvcServer_v";

impl XvcInfo {
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        writeln!(
            writer,
            "xvcServer_v{}:{}",
            self.version(),
            self.max_vector_len()
        )
    }

    pub fn from_reader(reader: &mut impl Read) -> Result<XvcInfo, ReadError> {
        let mut buf_reader = BufReader::with_capacity(32, reader);
        let mut line = Vec::with_capacity(32);
        buf_reader.read_until(b'\n', &mut line)?;

        // Format: "xvcServer_v{version}:{max_vector_len}\n"
        let line = line
            .trim_ascii_end()
            .strip_prefix(XVC_INFO_PREFIX)
            .ok_or_else(|| ReadError::InvalidFormat("Invalid prefix in info message".to_string()))?;

        let colon_index = line.iter().position(|b| *b == b':').ok_or_else(|| {
            ReadError::InvalidFormat("Missing ':' separator in info message".to_string())
        })?;
        let (version_part, rest) = line.split_at(colon_index);

        let version = match version_part {
            b"1.0" => Version::V1_0,
            _ => {
                return Err(ReadError::UnsupportedVersion(
                    String::from_utf8_lossy(version_part).to_string(),
                ));
            }
        };

        let max_vector_len = str::from_utf8(&rest[1..])?.parse::<u32>()?;

        Ok(XvcInfo::new(version, max_vector_len))
    }
}

impl Message {
    pub(crate) const CMD_NAME_GET_INFO: &[u8] = b"getinfo";
    pub(crate) const CMD_NAME_SET_TCK: &[u8] = b"settck";
    pub(crate) const CMD_NAME_SHIFT: &[u8] = b"shift";
    pub(crate) const CMD_DELIMITER: u8 = b':';

    /// Length of the command prefix that distinguishes the commands.
    pub(crate) const PREFIX_LEN: usize = 2;

    /// Reads one command from the client.
    ///
    /// `max_shift_bytes` bounds the length of each of the TMS and TDI vectors. Larger
    /// shifts are rejected with [`ReadError::TooManyBytes`] before their payload is read.
    ///
    /// Unknown commands consume only the bytes inspected so far and are reported as
    /// [`ReadError::InvalidCommandPrefix`] or [`ReadError::InvalidCommand`]; the stream
    /// can be read from again afterwards.
    pub fn from_reader(
        reader: &mut impl Read,
        max_shift_bytes: usize,
    ) -> Result<Message, ReadError> {
        // Longest header: "settck:" + 4 bytes
        let mut buf = [0u8; 16];
        reader.read_exact(&mut buf[..Self::PREFIX_LEN])?;
        match &buf[..Self::PREFIX_LEN] {
            b"ge" => {
                Self::read_header(reader, &mut buf, Self::CMD_NAME_GET_INFO, 0)?;
                Ok(Message::GetInfo)
            }
            b"se" => {
                let period_ns = Self::read_header(reader, &mut buf, Self::CMD_NAME_SET_TCK, 4)?;
                Ok(Message::SetTck {
                    period_ns: u32_from_le(period_ns),
                })
            }
            b"sh" => {
                let num_bits = Self::read_header(reader, &mut buf, Self::CMD_NAME_SHIFT, 4)?;
                let num_bits = u32_from_le(num_bits);
                let num_bytes = check_shift_len(num_bits, max_shift_bytes)?;
                let mut tms = vec![0_u8; num_bytes].into_boxed_slice();
                reader.read_exact(&mut tms)?;
                let mut tdi = vec![0_u8; num_bytes].into_boxed_slice();
                reader.read_exact(&mut tdi)?;
                Ok(Message::Shift { num_bits, tms, tdi })
            }
            prefix => Err(ReadError::InvalidCommandPrefix(
                String::from_utf8_lossy(prefix).to_string(),
            )),
        }
    }

    /// Reads the rest of `<name>:` plus `param_len` parameter bytes into `buf`,
    /// whose first [`Self::PREFIX_LEN`] bytes were already read. Returns the parameter bytes.
    fn read_header<'a>(
        reader: &mut impl Read,
        buf: &'a mut [u8; 16],
        name: &[u8],
        param_len: usize,
    ) -> Result<&'a [u8], ReadError> {
        let header_len = name.len() + 1;
        reader.read_exact(&mut buf[Self::PREFIX_LEN..header_len + param_len])?;
        if &buf[..name.len()] != name || buf[name.len()] != Self::CMD_DELIMITER {
            return Err(ReadError::InvalidCommand(
                String::from_utf8_lossy(&buf[..header_len]).to_string(),
            ));
        }
        Ok(&buf[header_len..header_len + param_len])
    }

    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Message::GetInfo => {
                writer.write_all(Self::CMD_NAME_GET_INFO)?;
                writer.write_all(&[Self::CMD_DELIMITER])
            }
            Message::SetTck { period_ns } => {
                writer.write_all(Self::CMD_NAME_SET_TCK)?;
                writer.write_all(&[Self::CMD_DELIMITER])?;
                writer.write_all(&period_ns.to_le_bytes())
            }
            Message::Shift { num_bits, tms, tdi } => {
                writer.write_all(Self::CMD_NAME_SHIFT)?;
                writer.write_all(&[Self::CMD_DELIMITER])?;
                writer.write_all(&num_bits.to_le_bytes())?;
                writer.write_all(tms)?;
                writer.write_all(tdi)
            }
        }
    }
}

pub(crate) fn u32_from_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

/// Returns the length of each shift vector, or an error if it exceeds `max_shift_bytes`.
pub(crate) fn check_shift_len(num_bits: u32, max_shift_bytes: usize) -> Result<usize, ReadError> {
    let num_bytes = num_bits.div_ceil(8) as usize;
    if num_bytes > max_shift_bytes {
        return Err(ReadError::TooManyBytes {
            max: max_shift_bytes,
            got: num_bytes,
        });
    }
    Ok(num_bytes)
}
