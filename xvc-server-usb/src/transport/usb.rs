//! # USB Bulk Transport
//!
//! Talks to the microcontroller through a pair of bulk endpoints using libusb.
//!
//! ## Example Usage
//!
//! ```ignore
//! use xvc_server_usb::transport::usb::{UsbSettings, UsbTransport};
//!
//! let transport = UsbTransport::open(UsbSettings::default())?;
//! ```
use std::time::Duration;

use rusb::{DeviceHandle, GlobalContext};

use super::BulkTransport;
use crate::error::BridgeError;

pub const DEFAULT_VID: u16 = 0x6cf0;
pub const DEFAULT_PID: u16 = 0x0050;
pub const DEFAULT_EP_OUT: u8 = 0x01;
pub const DEFAULT_EP_IN: u8 = 0x81;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Where to find the device and how to talk to it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UsbSettings {
    pub vid: u16,
    pub pid: u16,
    pub interface: u8,
    pub ep_out: u8,
    pub ep_in: u8,
    /// Deadline of every single bulk transfer.
    pub timeout: Duration,
}

impl Default for UsbSettings {
    fn default() -> Self {
        UsbSettings {
            vid: DEFAULT_VID,
            pid: DEFAULT_PID,
            interface: 0,
            ep_out: DEFAULT_EP_OUT,
            ep_in: DEFAULT_EP_IN,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct UsbTransport {
    handle: DeviceHandle<GlobalContext>,
    settings: UsbSettings,
}

impl UsbTransport {
    /// Opens the first device matching the configured VID and PID and claims its interface.
    pub fn open(settings: UsbSettings) -> Result<UsbTransport, BridgeError> {
        let handle = Self::claim(&settings)?;
        Ok(UsbTransport { handle, settings })
    }

    fn claim(settings: &UsbSettings) -> Result<DeviceHandle<GlobalContext>, BridgeError> {
        log::debug!(
            "Looking for USB device {:04x}:{:04x}",
            settings.vid,
            settings.pid
        );
        let handle = rusb::open_device_with_vid_pid(settings.vid, settings.pid).ok_or(
            BridgeError::DeviceNotFound {
                vid: settings.vid,
                pid: settings.pid,
            },
        )?;

        // Not supported on every platform; claiming may still succeed without it.
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            log::debug!("Kernel driver auto-detach unavailable: {}", e);
        }
        handle
            .claim_interface(settings.interface)
            .map_err(BridgeError::usb("claim the interface"))?;

        log::info!(
            "Claimed interface {} of USB device {:04x}:{:04x} (out=0x{:02x}, in=0x{:02x})",
            settings.interface,
            settings.vid,
            settings.pid,
            settings.ep_out,
            settings.ep_in
        );
        Ok(handle)
    }

    pub fn settings(&self) -> &UsbSettings {
        &self.settings
    }
}

impl BulkTransport for UsbTransport {
    fn write_packet(&mut self, packet: &[u8]) -> Result<(), BridgeError> {
        let written = self
            .handle
            .write_bulk(self.settings.ep_out, packet, self.settings.timeout)
            .map_err(BridgeError::usb("write a bulk packet"))?;
        if written != packet.len() {
            return Err(BridgeError::ShortWrite {
                written,
                expected: packet.len(),
            });
        }
        Ok(())
    }

    fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError> {
        self.handle
            .read_bulk(self.settings.ep_in, buf, self.settings.timeout)
            .map_err(BridgeError::usb("read a bulk packet"))
    }

    /// Clears stalled endpoints and resets the device, which the firmware answers by
    /// putting its shift engine back into the header state.
    fn reset(&mut self) -> Result<(), BridgeError> {
        log::info!("Resetting USB device");
        for endpoint in [self.settings.ep_out, self.settings.ep_in] {
            if let Err(e) = self.handle.clear_halt(endpoint) {
                log::debug!("Clearing halt on endpoint 0x{:02x} failed: {}", endpoint, e);
            }
        }
        match self.handle.reset() {
            Ok(()) => Ok(()),
            Err(e) if is_gone(e) => {
                log::warn!("USB device re-enumerated after reset, reopening it");
                self.handle = Self::claim(&self.settings)?;
                Ok(())
            }
            Err(e) => Err(BridgeError::usb("reset the device")(e)),
        }
    }
}

/// Whether the handle no longer refers to an attached device and must be reopened.
fn is_gone(err: rusb::Error) -> bool {
    matches!(err, rusb::Error::NotFound | rusb::Error::NoDevice)
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release_interface(self.settings.interface) {
            log::debug!("Releasing interface failed: {}", e);
        }
    }
}

#[test]
fn reopens_only_after_device_is_gone() {
    assert!(is_gone(rusb::Error::NotFound));
    assert!(is_gone(rusb::Error::NoDevice));
    assert!(!is_gone(rusb::Error::Timeout));
    assert!(!is_gone(rusb::Error::Pipe));
}

#[test]
fn default_settings_match_firmware() {
    let settings = UsbSettings::default();
    assert_eq!((settings.vid, settings.pid), (0x6cf0, 0x0050));
    assert_eq!((settings.ep_out, settings.ep_in), (0x01, 0x81));
    assert_eq!(settings.timeout, Duration::from_secs(1));
}
