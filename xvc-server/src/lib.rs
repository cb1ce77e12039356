//! # XVC Server Library
//!
//! The TCP-facing half of an XVC bridge: accepts a client, parses its commands and hands
//! the JTAG work to a backend.
//!
//! ## Architecture
//!
//! - **[`XvcServer`] trait**: implemented by backends that can execute shifts, such as a
//!   microcontroller behind a USB bulk link
//! - **[`server::Server`]**: accepts one client at a time and runs its session: reads a
//!   command, dispatches it to the backend, writes the reply, repeats
//!
//! ## Session Rules
//!
//! - Commands are processed strictly one after another; a shift is never started before
//!   the TDO of the previous one has been written back.
//! - Unknown commands are logged and skipped. The session continues.
//! - Shifts larger than the configured maximum are rejected before their payload is read
//!   and end the session.
//! - A backend failure (for example a transport timeout) ends the session. The backend's
//!   [`XvcServer::reset`] is called so the next client starts from a clean device.
//! - A client closing its connection ends the session; the server then waits for the next
//!   client.
//!
//! ## Basic Usage
//!
//! ```ignore
//! use xvc_server::server::Builder;
//!
//! let mut server = Builder::new()
//!     .max_vector_size(2048)
//!     .build(my_backend);
//! server.listen("127.0.0.1:2542")?;
//! ```
//!
//! ## Logging
//!
//! This crate uses the `log` crate. Connections are logged at `info`, every command at
//! `debug` and the shifted vectors at `trace`.
use std::io;

pub mod server;

/// Executes JTAG operations on behalf of the server.
pub trait XvcServer {
    /// Requests a TCK period and returns the period in effect.
    ///
    /// Backends without clock control return `period_ns` unchanged.
    fn set_tck(&mut self, period_ns: u32) -> u32;

    /// Clocks `num_bits` cycles and returns the captured TDO vector.
    ///
    /// `tms` and `tdi` are `ceil(num_bits / 8)` bytes long, and so must be the result.
    ///
    /// XVC cannot report a failed shift to the client. An error therefore ends the
    /// session; it must not be retried.
    fn shift(&mut self, num_bits: u32, tms: &[u8], tdi: &[u8]) -> io::Result<Box<[u8]>>;

    /// Brings the device back to a state in which it expects a new shift.
    /// Called after a session ended abnormally.
    fn reset(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Largest shift payload in bytes (TMS and TDI together) the backend can execute,
    /// if it is limited. The server never advertises or accepts more than this.
    fn max_vector_size(&self) -> Option<u32> {
        None
    }
}
