use std::net::SocketAddr;

use xvc_protocol::Version;
use xvc_server::server::Builder;
use xvc_server_usb::bridge::UsbBridge;
use xvc_server_usb::transport::loopback::LoopbackDevice;
use xvc_tests::{TestClient, spawn_server};

fn loopback_server(delay: usize) -> SocketAddr {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = Builder::new().build(UsbBridge::new(LoopbackDevice::new(delay)));
    spawn_server(server).unwrap()
}

fn get_bit(vector: &[u8], index: usize) -> bool {
    vector[index / 8] & (1 << (index % 8)) != 0
}

/// TDO of a fresh loopback target: TDI shifted towards later bits by `delay` positions.
fn delayed(tdi: &[u8], num_bits: usize, delay: usize) -> Vec<u8> {
    let mut tdo = vec![0u8; tdi.len()];
    for i in delay..num_bits {
        if get_bit(tdi, i - delay) {
            tdo[i / 8] |= 1 << (i % 8);
        }
    }
    tdo
}

#[test]
fn getinfo_advertises_device_capacity() {
    let mut client = TestClient::connect(loopback_server(0)).unwrap();
    let info = client.get_info().unwrap();
    assert_eq!(info.version(), Version::V1_0);
    assert_eq!(info.max_vector_len(), 2048);
    assert_eq!(info.max_shift_bytes(), 1024);
}

#[test]
fn oversized_configuration_is_bounded_by_device() {
    let server = Builder::new()
        .max_vector_size(4096)
        .build(UsbBridge::new(LoopbackDevice::new(0)));
    let addr = spawn_server(server).unwrap();

    let mut client = TestClient::connect(addr).unwrap();
    assert_eq!(client.get_info().unwrap().max_vector_len(), 2048);
    let tdi: Vec<u8> = (0..1024u32).map(|i| (i * 7) as u8).collect();
    let tdo = client.shift(8 * 1024, &[0; 1024], &tdi).unwrap();
    assert_eq!(&tdo[..], &tdi[..]);
}

#[test]
fn settck_is_echoed() {
    let mut client = TestClient::connect(loopback_server(0)).unwrap();
    assert_eq!(client.set_tck(10_000).unwrap(), 10_000);
    assert_eq!(client.set_tck(1).unwrap(), 1);
}

#[test]
fn sixteen_bit_shift_loops_back() {
    let mut client = TestClient::connect(loopback_server(0)).unwrap();
    let tdo = client.shift(16, &[0x00, 0x00], &[0xFF, 0x00]).unwrap();
    assert_eq!(&tdo[..], &[0xFF, 0x00]);
}

#[test]
fn partial_byte_shift() {
    let mut client = TestClient::connect(loopback_server(0)).unwrap();
    let tdo = client.shift(13, &[0x00, 0x00], &[0xA5, 0x1F]).unwrap();
    // Only the low 5 bits of the last byte are clocked
    assert_eq!(&tdo[..], &[0xA5, 0x1F]);
}

#[test]
fn zero_bit_shift_returns_nothing() {
    let mut client = TestClient::connect(loopback_server(0)).unwrap();
    let tdo = client.shift(0, &[], &[]).unwrap();
    assert!(tdo.is_empty());
    // The session is still in sync
    assert_eq!(client.set_tck(42).unwrap(), 42);
}

#[test]
fn multi_packet_shift_with_delay() {
    let num_bits = 8 * 1000 - 3;
    let tms = vec![0u8; 1000];
    let tdi: Vec<u8> = (0..1000u32).map(|i| (i * 37 + 11) as u8).collect();

    let mut client = TestClient::connect(loopback_server(3)).unwrap();
    let tdo = client.shift(num_bits as u32, &tms, &tdi).unwrap();
    assert_eq!(tdo.len(), 1000);
    assert_eq!(&tdo[..], &delayed(&tdi, num_bits, 3)[..]);
}

#[test]
fn full_capacity_shift() {
    let tms = vec![0u8; 1024];
    let tdi: Vec<u8> = (0..1024u32).map(|i| i as u8).collect();
    let mut client = TestClient::connect(loopback_server(0)).unwrap();
    let tdo = client.shift(8 * 1024, &tms, &tdi).unwrap();
    assert_eq!(&tdo[..], &tdi[..]);
}

#[test]
fn consecutive_shifts_are_independent() {
    let mut client = TestClient::connect(loopback_server(0)).unwrap();
    for byte in [0x01u8, 0x80, 0x5A, 0xFF, 0x00] {
        let tdo = client.shift(24, &[0; 3], &[byte, !byte, byte]).unwrap();
        assert_eq!(&tdo[..], &[byte, !byte, byte]);
    }
}

#[test]
fn oversized_shift_ends_session_only() {
    let addr = loopback_server(0);
    let mut client = TestClient::connect(addr).unwrap();
    let mut header = b"shift:".to_vec();
    header.extend_from_slice(&(8 * 1025u32).to_le_bytes());
    client.send_raw(&header).unwrap();
    assert!(client.read_to_close().unwrap().is_empty());

    // The server keeps accepting clients
    let mut client = TestClient::connect(addr).unwrap();
    let tdo = client.shift(8, &[0x00], &[0x3C]).unwrap();
    assert_eq!(&tdo[..], &[0x3C]);
}

#[test]
fn unknown_command_is_skipped() {
    let mut client = TestClient::connect(loopback_server(0)).unwrap();
    client.send_raw(b"??").unwrap();
    assert_eq!(client.get_info().unwrap().max_vector_len(), 2048);
    client.send_raw(b"getinfX:").unwrap();
    assert_eq!(client.set_tck(7).unwrap(), 7);
}

#[test]
fn clients_are_served_one_after_another() {
    let addr = loopback_server(0);
    for byte in [0x11u8, 0x22, 0x33] {
        let mut client = TestClient::connect(addr).unwrap();
        let tdo = client.shift(8, &[0x00], &[byte]).unwrap();
        assert_eq!(&tdo[..], &[byte]);
    }
}
