//! # XVC Server for USB Bit-Banging Probes
//!
//! Backend for [`xvc_server`] that forwards JTAG shifts to a microcontroller over USB bulk
//! transfers. The microcontroller runs [`xvc_bitbang::engine::ShiftEngine`] and clocks the
//! vectors out on four GPIO lines.
//!
//! ## Overview
//!
//! - [`bridge::UsbBridge`]: the [`xvc_server::XvcServer`] implementation
//! - [`transport::usb::UsbTransport`]: libusb bulk endpoints via `rusb`
//! - [`transport::loopback::LoopbackDevice`]: the shift engine running in-process against a
//!   simulated loopback target, for use without hardware
//!
//! ## Device Protocol
//!
//! Every shift is sent as a 4-byte little-endian bit count, followed by the TMS vector and
//! then the TDI vector, each split into packets of at most 64 bytes. The device answers with
//! the TDO vector once all bits have been clocked.
//!
//! ```
//! use xvc_server::XvcServer;
//! use xvc_server_usb::bridge::UsbBridge;
//! use xvc_server_usb::transport::loopback::LoopbackDevice;
//!
//! let mut bridge = UsbBridge::new(LoopbackDevice::new(0));
//! let tdo = bridge.shift(16, &[0x00, 0x00], &[0xFF, 0x00]).unwrap();
//! assert_eq!(&tdo[..], &[0xFF, 0x00]);
//! ```
pub mod bridge;
pub mod error;
pub mod transport;
