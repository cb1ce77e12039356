//! # XVC Protocol Library
//!
//! Message types and codecs for the [Xilinx Virtual Cable (XVC)](https://github.com/Xilinx/XilinxVirtualCable)
//! 1.0 protocol, as spoken between Vivado's hardware server and a JTAG bridge.
//!
//! ## Messages
//!
//! | Client sends | Server replies |
//! |---|---|
//! | `getinfo:` | `xvcServer_v1.0:<max_vector_len>\n` |
//! | `settck:<period_ns: u32 LE>` | `<period_ns: u32 LE>` |
//! | `shift:<num_bits: u32 LE><TMS><TDI>` | `<TDO>` |
//!
//! TMS, TDI and TDO are each `ceil(num_bits / 8)` bytes, least significant bit first.
//! `max_vector_len` is the largest TMS plus TDI payload in bytes the server accepts.
//! There is no terminator; message boundaries follow purely from the byte counts above.
//!
//! ## Reading Commands
//!
//! ```
//! use xvc_protocol::Message;
//! use std::io::Cursor;
//!
//! let mut stream = Cursor::new(b"shift:\x04\x00\x00\x00\x0A\x05");
//! let message = Message::from_reader(&mut stream, 1024).expect("Shift should parse");
//! assert_eq!(
//!     message,
//!     Message::Shift { num_bits: 4, tms: Box::new([0x0A]), tdi: Box::new([0x05]) }
//! );
//! ```
//!
//! ## Writing Commands
//!
//! ```
//! use xvc_protocol::Message;
//!
//! let mut buffer = Vec::new();
//! Message::SetTck { period_ns: 10_000 }
//!     .write_to(&mut buffer)
//!     .expect("Writing to vector shouldn't fail");
//! assert_eq!(buffer, b"settck:\x10\x27\x00\x00");
//! ```
//!
//! ## Server Capabilities
//!
//! ```
//! use xvc_protocol::{XvcInfo, Version};
//! use std::io::Cursor;
//!
//! let mut reader = Cursor::new(b"xvcServer_v1.0:2048\n");
//! let info = XvcInfo::from_reader(&mut reader).expect("Info should parse");
//! assert_eq!(info.version(), Version::V1_0);
//! assert_eq!(info.max_shift_bytes(), 1024);
//! ```
//!
//! ## Error Handling
//!
//! Parsing errors are reported as [`error::ReadError`]. Unknown commands
//! ([`ReadError::is_recoverable`](error::ReadError::is_recoverable)) leave the stream at a
//! usable position so a server can log them and keep going.
//!
//! ## Async Framing
//!
//! With the `tokio` feature, [`framed::XvcCodec`] decodes messages incrementally from a
//! `BytesMut` for use with `tokio_util::codec::Framed`.

pub mod protocol;
pub use protocol::*;
pub mod codec;
pub mod error;
#[cfg(feature = "tokio")]
pub mod framed;
