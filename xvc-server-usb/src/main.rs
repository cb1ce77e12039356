use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use clap_num::maybe_hex;
use env_logger::Env;
use xvc_server::server::Builder;
use xvc_server_usb::bridge::UsbBridge;
use xvc_server_usb::transport::BulkTransport;
use xvc_server_usb::transport::loopback::LoopbackDevice;
use xvc_server_usb::transport::usb::{
    DEFAULT_EP_IN, DEFAULT_EP_OUT, DEFAULT_PID, DEFAULT_VID, UsbSettings, UsbTransport,
};

const DEFAULT_TIMEOUT_MS: u64 = 1000;

#[derive(Parser, Eq, PartialEq, Clone, Debug)]
enum DeviceImpl {
    /// Bit-banging probe attached over USB
    Usb {
        #[arg(long, value_parser = maybe_hex::<u16>, default_value_t = DEFAULT_VID)]
        vid: u16,
        #[arg(long, value_parser = maybe_hex::<u16>, default_value_t = DEFAULT_PID)]
        pid: u16,
        #[arg(long, default_value_t = 0)]
        interface: u8,
        #[arg(long, value_parser = maybe_hex::<u8>, default_value_t = DEFAULT_EP_OUT)]
        ep_out: u8,
        #[arg(long, value_parser = maybe_hex::<u8>, default_value_t = DEFAULT_EP_IN)]
        ep_in: u8,
        #[arg(
            short,
            long,
            help = "Timeout of a single bulk transfer in milliseconds",
            default_value_t = DEFAULT_TIMEOUT_MS
        )]
        timeout_ms: u64,
    },
    /// Simulated device whose TDO follows TDI
    Loopback {
        #[arg(short, long, help = "TDO delay in TCK cycles", default_value_t = 0)]
        delay: usize,
    },
}

impl Default for DeviceImpl {
    fn default() -> Self {
        DeviceImpl::Usb {
            vid: DEFAULT_VID,
            pid: DEFAULT_PID,
            interface: 0,
            ep_out: DEFAULT_EP_OUT,
            ep_in: DEFAULT_EP_IN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Parser)]
#[command(about = "Xilinx Virtual Cable (XVC) server for USB bit-banging JTAG probes", long_about=None)]
struct Args {
    #[arg(short, long, default_value = "2542")]
    port: u16,

    #[arg(short, long, default_value = "127.0.0.1")]
    ip: IpAddr,

    #[arg(
        short,
        long,
        help = "Largest shift in bytes, TMS and TDI together",
        default_value = "2048"
    )]
    max_vector_size: u32,

    #[clap(subcommand)]
    device: Option<DeviceImpl>,
}

fn run<T: BulkTransport>(
    transport: T,
    max_vector_size: u32,
    addr: SocketAddr,
) -> Result<(), Box<dyn Error>> {
    let mut server = Builder::new()
        .max_vector_size(max_vector_size)
        .build(UsbBridge::new(transport));
    log::debug!(
        "Server config: max_vector_size={}, advertised={}",
        server.config().max_vector_size,
        server.max_vector_size()
    );
    server.listen(addr)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    log::info!("Starting XVC server");

    let args = Args::parse();
    log::debug!("Parsed arguments: ip={}, port={}", args.ip, args.port);

    let addr = SocketAddr::new(args.ip, args.port);
    log::info!("Binding to address: {}", addr);

    match args.device.unwrap_or_default() {
        DeviceImpl::Usb {
            vid,
            pid,
            interface,
            ep_out,
            ep_in,
            timeout_ms,
        } => {
            let transport = UsbTransport::open(UsbSettings {
                vid,
                pid,
                interface,
                ep_out,
                ep_in,
                timeout: Duration::from_millis(timeout_ms),
            })?;
            run(transport, args.max_vector_size, addr)
        }
        DeviceImpl::Loopback { delay } => {
            run(LoopbackDevice::new(delay), args.max_vector_size, addr)
        }
    }
}
