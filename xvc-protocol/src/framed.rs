//! [`tokio_util::codec`] implementation of the client-to-server direction.
//!
//! The decoder works on whatever bytes have arrived so far and returns `Ok(None)` until a
//! complete command, including the whole shift payload, is buffered.
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{check_shift_len, u32_from_le};
use crate::error::ReadError;
use crate::protocol::Message;

#[derive(Copy, Clone)]
enum Command {
    GetInfo,
    SetTck,
    Shift,
}

impl Command {
    fn from_prefix(prefix: &[u8]) -> Option<Command> {
        match prefix {
            b"ge" => Some(Command::GetInfo),
            b"se" => Some(Command::SetTck),
            b"sh" => Some(Command::Shift),
            _ => None,
        }
    }

    fn name(self) -> &'static [u8] {
        match self {
            Command::GetInfo => Message::CMD_NAME_GET_INFO,
            Command::SetTck => Message::CMD_NAME_SET_TCK,
            Command::Shift => Message::CMD_NAME_SHIFT,
        }
    }

    fn param_len(self) -> usize {
        match self {
            Command::GetInfo => 0,
            Command::SetTck | Command::Shift => 4,
        }
    }
}

/// Decodes [`Message`]s and encodes them for sending.
#[derive(Clone, Debug)]
pub struct XvcCodec {
    max_shift_bytes: usize,
}

impl XvcCodec {
    /// `max_shift_bytes` bounds each of the TMS and TDI vectors of a shift.
    pub fn new(max_shift_bytes: usize) -> XvcCodec {
        XvcCodec { max_shift_bytes }
    }
}

impl Decoder for XvcCodec {
    type Item = Message;
    type Error = ReadError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, ReadError> {
        if src.len() < Message::PREFIX_LEN {
            return Ok(None);
        }
        let Some(command) = Command::from_prefix(&src[..Message::PREFIX_LEN]) else {
            let prefix = String::from_utf8_lossy(&src[..Message::PREFIX_LEN]).to_string();
            src.advance(Message::PREFIX_LEN);
            return Err(ReadError::InvalidCommandPrefix(prefix));
        };

        let name = command.name();
        let header_len = name.len() + 1;
        let params_end = header_len + command.param_len();
        if src.len() < params_end {
            src.reserve(params_end - src.len());
            return Ok(None);
        }
        if &src[..name.len()] != name || src[name.len()] != Message::CMD_DELIMITER {
            let cmd = String::from_utf8_lossy(&src[..header_len]).to_string();
            src.advance(params_end);
            return Err(ReadError::InvalidCommand(cmd));
        }

        let message = match command {
            Command::GetInfo => Message::GetInfo,
            Command::SetTck => Message::SetTck {
                period_ns: u32_from_le(&src[header_len..params_end]),
            },
            Command::Shift => {
                let num_bits = u32_from_le(&src[header_len..params_end]);
                let num_bytes = check_shift_len(num_bits, self.max_shift_bytes)?;
                let total = params_end + 2 * num_bytes;
                if src.len() < total {
                    src.reserve(total - src.len());
                    return Ok(None);
                }
                src.advance(params_end);
                let tms = src.split_to(num_bytes).to_vec().into_boxed_slice();
                let tdi = src.split_to(num_bytes).to_vec().into_boxed_slice();
                return Ok(Some(Message::Shift { num_bits, tms, tdi }));
            }
        };
        src.advance(params_end);
        Ok(Some(message))
    }
}

impl Encoder<Message> for XvcCodec {
    type Error = ReadError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), ReadError> {
        let mut writer = dst.writer();
        item.write_to(&mut writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn shift_bytes() -> Vec<u8> {
        let mut data = b"shift:".to_vec();
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&[0x00, 0x00, 0xFF, 0x00]);
        data
    }

    #[test]
    fn decode_partial_deliveries() {
        let data = shift_bytes();
        let mut codec = XvcCodec::new(1024);
        let mut buf = BytesMut::new();
        for (i, byte) in data.iter().enumerate() {
            buf.put_u8(*byte);
            let decoded = codec.decode(&mut buf).unwrap();
            if i + 1 < data.len() {
                assert!(decoded.is_none(), "decoded early at byte {}", i);
            } else {
                assert_eq!(
                    decoded,
                    Some(Message::Shift {
                        num_bits: 16,
                        tms: vec![0x00, 0x00].into_boxed_slice(),
                        tdi: vec![0xFF, 0x00].into_boxed_slice(),
                    })
                );
            }
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_back_to_back() {
        let mut buf = BytesMut::from(&b"getinfo:settck:\x10\x27\x00\x00"[..]);
        let mut codec = XvcCodec::new(1024);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Message::GetInfo));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Message::SetTck { period_ns: 10_000 })
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn unknown_prefix_is_skipped() {
        let mut buf = BytesMut::from(&b"??getinfo:"[..]);
        let mut codec = XvcCodec::new(1024);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ReadError::InvalidCommandPrefix(_))
        ));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Message::GetInfo));
    }

    #[test]
    fn oversized_shift_rejected_before_payload() {
        let mut buf = BytesMut::from(&b"shift:"[..]);
        buf.put_u32_le(8 * 1025);
        let mut codec = XvcCodec::new(1024);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ReadError::TooManyBytes {
                max: 1024,
                got: 1025
            })
        ));
    }

    #[test]
    fn encode_then_decode() {
        let mut codec = XvcCodec::new(1024);
        let mut buf = BytesMut::new();
        codec
            .encode(Message::SetTck { period_ns: 42 }, &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"settck:\x2a\x00\x00\x00");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Message::SetTck { period_ns: 42 })
        );
    }
}
