//! Helpers for the end-to-end tests: a blocking XVC client and a server running on an
//! ephemeral localhost port.
use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    thread,
    time::Duration,
};

use xvc_protocol::{Message, XvcInfo, error::ReadError};
use xvc_server::XvcServer;
use xvc_server::server::Server;

/// Upper bound for every client read, so a hanging server fails the test instead of
/// blocking it.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking client talking XVC 1.0 to a server.
pub struct TestClient {
    tcp: TcpStream,
}

impl TestClient {
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<TestClient> {
        let tcp = TcpStream::connect(addr)?;
        tcp.set_read_timeout(Some(CLIENT_TIMEOUT))?;
        tcp.set_nodelay(true)?;
        Ok(TestClient { tcp })
    }

    pub fn get_info(&mut self) -> Result<XvcInfo, ReadError> {
        Message::GetInfo.write_to(&mut self.tcp)?;
        XvcInfo::from_reader(&mut self.tcp)
    }

    /// Returns the TCK period the server reports as in effect.
    pub fn set_tck(&mut self, period_ns: u32) -> io::Result<u32> {
        let reply = self.request(Message::SetTck { period_ns })?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&reply);
        Ok(u32::from_le_bytes(buf))
    }

    /// Shifts `num_bits` and returns the TDO vector, which is as long as `tms` and `tdi`.
    pub fn shift(&mut self, num_bits: u32, tms: &[u8], tdi: &[u8]) -> io::Result<Box<[u8]>> {
        self.request(Message::Shift {
            num_bits,
            tms: tms.into(),
            tdi: tdi.into(),
        })
    }

    /// Sends a command with a fixed-size reply and reads that reply.
    fn request(&mut self, message: Message) -> io::Result<Box<[u8]>> {
        let reply_len = message.reply_len().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "reply has no fixed length")
        })?;
        message.write_to(&mut self.tcp)?;
        let mut buf = vec![0; reply_len];
        self.tcp.read_exact(&mut buf)?;
        Ok(buf.into_boxed_slice())
    }

    /// Sends bytes that need not form a valid command.
    pub fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tcp.write_all(bytes)
    }

    /// Reads until the server closes the connection and returns what was received.
    pub fn read_to_close(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.tcp.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Runs `server` on a background thread, bound to an ephemeral localhost port.
pub fn spawn_server<T>(mut server: Server<T>) -> io::Result<SocketAddr>
where
    T: XvcServer + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    thread::spawn(move || {
        if let Err(e) = server.serve(listener) {
            log::error!("Test server stopped: {}", e);
        }
    });
    Ok(addr)
}
