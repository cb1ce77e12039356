//! Bridge and device without the TCP front end.
use xvc_bitbang::engine::State;
use xvc_bitbang::sim::Cycle;
use xvc_server::XvcServer;
use xvc_server_usb::bridge::UsbBridge;
use xvc_server_usb::transport::loopback::LoopbackDevice;

#[test]
fn sixteen_cycles_in_order() {
    let mut bridge = UsbBridge::new(LoopbackDevice::new(0));
    let tdo = bridge.shift(16, &[0x00, 0x00], &[0xFF, 0x00]).unwrap();
    assert_eq!(&tdo[..], &[0xFF, 0x00]);

    let target = bridge.transport().target();
    let expected: Vec<Cycle> = (0..16)
        .map(|i| Cycle {
            tms: false,
            tdi: i < 8,
        })
        .collect();
    assert_eq!(target.cycles(), &expected[..]);
    assert_eq!(target.violations(), 0);
    assert_eq!(bridge.transport().state(), State::Header);
}

#[test]
fn tms_is_clocked_lsb_first() {
    let mut bridge = UsbBridge::new(LoopbackDevice::new(0));
    // Test-Logic-Reset: five cycles with TMS high, then Run-Test/Idle
    bridge.shift(6, &[0b0001_1111], &[0x00]).unwrap();
    let tms: Vec<bool> = bridge
        .transport()
        .target()
        .cycles()
        .iter()
        .map(|c| c.tms)
        .collect();
    assert_eq!(tms, [true, true, true, true, true, false]);
}

#[test]
fn cycles_cover_most_recent_shift() {
    let mut bridge = UsbBridge::new(LoopbackDevice::new(0));
    bridge.shift(100, &[0; 13], &[0; 13]).unwrap();
    bridge.shift(3, &[0], &[0b101]).unwrap();
    let cycles = bridge.transport().target().cycles();
    assert_eq!(cycles.len(), 3);
    assert!(cycles[0].tdi && !cycles[1].tdi && cycles[2].tdi);
}

#[test]
fn delay_carries_across_shifts() {
    let mut bridge = UsbBridge::new(LoopbackDevice::new(4));
    let first = bridge.shift(8, &[0], &[0xF0]).unwrap();
    assert_eq!(&first[..], &[0x00]);
    // The high nibble of the first shift is still in the chain
    let second = bridge.shift(8, &[0], &[0x00]).unwrap();
    assert_eq!(&second[..], &[0x0F]);
}

#[test]
fn reset_returns_device_to_header_state() {
    let mut bridge = UsbBridge::new(LoopbackDevice::new(0));
    bridge.shift(8, &[0], &[0x42]).unwrap();
    bridge.reset().unwrap();
    assert_eq!(bridge.transport().state(), State::Header);
    let tdo = bridge.shift(8, &[0], &[0x24]).unwrap();
    assert_eq!(&tdo[..], &[0x24]);
}
