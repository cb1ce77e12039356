//! # XVC Bit-Bang Engine
//!
//! Device-side half of an XVC bridge whose JTAG pins are driven by toggling GPIO lines.
//!
//! ## Overview
//!
//! A host receives XVC `shift:` commands over TCP and forwards them to a microcontroller
//! over a bulk transport with a fixed maximum packet size. This crate contains everything
//! both ends need to agree on, and the state machine running on the device:
//!
//! - [`vector`]: byte-packed bit vectors (TMS, TDI, TDO) with a fixed capacity
//! - [`packet`]: splitting a shift into a header packet and payload packets, and
//!   reassembling a vector from packets of arbitrary size
//! - [`engine`]: the [`ShiftEngine`](engine::ShiftEngine) that accumulates TMS and TDI,
//!   clocks them out and captures TDO
//! - [`pins`]: the line driver interface the engine clocks through, with an adapter for
//!   `embedded-hal` GPIO pins
//!
//! ## Wire Format
//!
//! ```text
//! host -> device   [bit_count: u32 LE] [TMS chunk]... [TDI chunk]...
//! device -> host   [TDO chunk]...
//! ```
//!
//! Every chunk is at most [`packet::PACKET_SIZE`] bytes. Chunks carry no framing of their own;
//! the receiver knows how many bytes to expect from the header.
//!
//! ## Example
//!
//! ```
//! use xvc_bitbang::engine::ShiftEngine;
//! use xvc_bitbang::packet::Frames;
//! # #[cfg(feature = "sim")] {
//! use xvc_bitbang::sim::LoopbackTarget;
//!
//! let mut engine: ShiftEngine<_> = ShiftEngine::new(LoopbackTarget::new(0));
//! let tms = [0x00];
//! let tdi = [0xA5];
//!
//! let mut tdo = None;
//! for frame in Frames::new(8, &tms, &tdi) {
//!     if let Some(out) = engine.receive(frame.as_bytes()).unwrap() {
//!         tdo = Some(out.to_vec());
//!     }
//! }
//! assert_eq!(tdo.unwrap(), vec![0xA5]);
//! # }
//! ```
//!
//! ## `no_std`
//!
//! The crate is `no_std` and allocation free. The `sim` feature pulls in `std` for the
//! simulated target.
#![cfg_attr(not(any(test, feature = "sim")), no_std)]

pub mod engine;
pub mod packet;
pub mod pins;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod vector;

/// Capacity of each vector buffer in bytes. A single shift may clock at most
/// `8 * DEFAULT_CAPACITY` bits.
pub const DEFAULT_CAPACITY: usize = 1024;
