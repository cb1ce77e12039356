use std::{
    error::Error,
    io::{self, ErrorKind, Read, Write},
    net::{TcpListener, TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::XvcServer;
use xvc_protocol::error::ReadError;
use xvc_protocol::{Message, Version, XvcInfo};

#[derive(Debug, Clone)]
pub struct Config {
    /// Largest shift payload (TMS and TDI together) in bytes, as advertised by `getinfo:`.
    pub max_vector_size: u32,
    pub read_write_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_vector_size: 2048,
            read_write_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
pub struct Server<T: XvcServer> {
    backend: T,
    config: Config,
}

/// Builder to create a [Server] instance and modify configuration options
///
/// # Example
///
/// ```ignore
/// use xvc_server::server::Builder;
/// use std::time::Duration;
///
/// let server = Builder::new()
///     .max_vector_size(2048)
///     .rw_timeout(Duration::from_secs(20))
///     .build(my_backend);
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Set the largest shift payload in bytes (TMS and TDI together) that this server accepts.
    pub fn max_vector_size(mut self, size: u32) -> Self {
        self.config.max_vector_size = size;
        self
    }

    /// Set the TCP read and write timeout
    pub fn rw_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_write_timeout = timeout;
        self
    }

    pub fn build<T: XvcServer>(self, backend: T) -> Server<T> {
        Server::new(backend, self.config)
    }
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::BrokenPipe
    )
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

impl<T: XvcServer> Server<T> {
    pub fn new(backend: T, config: Config) -> Server<T> {
        if let Some(limit) = backend.max_vector_size()
            && config.max_vector_size > limit
        {
            log::warn!(
                "Configured max_vector_size={} exceeds the backend limit, using {}",
                config.max_vector_size,
                limit
            );
        }
        Server { backend, config }
    }

    /// Largest shift payload in bytes that is advertised and accepted: the configured size,
    /// bounded by what the backend supports.
    pub fn max_vector_size(&self) -> u32 {
        match self.backend.max_vector_size() {
            Some(limit) => self.config.max_vector_size.min(limit),
            None => self.config.max_vector_size,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &T {
        &self.backend
    }

    pub fn listen(&mut self, addr: impl ToSocketAddrs) -> Result<(), Box<dyn Error>> {
        let listener = TcpListener::bind(addr)?;
        self.serve(listener)?;
        Ok(())
    }

    /// Serves clients from `listener`, one at a time, forever.
    pub fn serve(&mut self, listener: TcpListener) -> io::Result<()> {
        log::info!(
            "Server listening for connections on {}",
            listener.local_addr()?
        );

        for stream in listener.incoming() {
            match stream {
                Ok(tcp) => self.session(tcp),
                Err(e) => log::error!("Connection error: {}", e),
            }
        }
        Ok(())
    }

    /// Runs one client session until the client disconnects or a fatal error occurs.
    pub fn session(&mut self, tcp: TcpStream) {
        if let Ok(addr) = tcp.peer_addr() {
            log::info!("New client connection from {}", addr);
        }
        if let Err(e) = self.handle_client(tcp) {
            log::error!("Client error: {}", e);
            if let Err(e) = self.backend.reset() {
                log::error!("Backend reset failed: {}", e);
            }
        }
    }

    fn handle_client(&mut self, mut tcp: TcpStream) -> Result<(), ReadError> {
        tcp.set_read_timeout(Some(self.config.read_write_timeout))?;
        tcp.set_write_timeout(Some(self.config.read_write_timeout))?;
        tcp.set_nodelay(true)?;
        self.run_session(&mut tcp)
    }

    /// Reads and processes messages until the stream ends.
    pub fn run_session(&mut self, stream: &mut (impl Read + Write)) -> Result<(), ReadError> {
        let max_shift_bytes = self.max_vector_size() as usize / 2;
        loop {
            match Message::from_reader(stream, max_shift_bytes) {
                Ok(message) => self.process_message(message, stream)?,
                Err(err) if err.is_recoverable() => {
                    log::warn!("Ignoring unknown command: {}", err);
                }
                Err(ReadError::IoError(err)) if is_disconnect(&err) => {
                    log::info!("Client disconnected");
                    break;
                }
                Err(ReadError::IoError(err)) if is_timeout(&err) => {
                    log::error!("Client read timeout, closing connection");
                    break;
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// Process each message, forwarding the work to the backend.
    fn process_message(
        &mut self,
        message: Message,
        stream: &mut impl Write,
    ) -> Result<(), ReadError> {
        match message {
            Message::GetInfo => {
                log::debug!("Received GetInfo message");
                let info = XvcInfo::new(Version::V1_0, self.max_vector_size());
                info.write_to(stream)?;
                log::debug!("Sent XVC info response");
            }
            Message::SetTck { period_ns } => {
                log::debug!("Received SetTck message: period_ns={}", period_ns);
                let ret_period = self.backend.set_tck(period_ns);
                log::debug!("Set TCK returned: period_ns={}", ret_period);
                stream.write_all(&ret_period.to_le_bytes())?;
            }
            Message::Shift { num_bits, tms, tdi } => {
                log::debug!(
                    "Received Shift message: num_bits={}, tms_len={}, tdi_len={}",
                    num_bits,
                    tms.len(),
                    tdi.len()
                );
                log::trace!("Shift TMS data: {:02x?}", &tms[..]);
                log::trace!("Shift TDI data: {:02x?}", &tdi[..]);
                let tdo = self.backend.shift(num_bits, &tms, &tdi)?;
                if tdo.len() != tms.len() {
                    return Err(ReadError::IoError(io::Error::other(format!(
                        "Backend returned {} bytes of TDO, expected {}",
                        tdo.len(),
                        tms.len()
                    ))));
                }
                log::trace!("Shift result TDO data: {:02x?}", &tdo[..]);
                stream.write_all(&tdo)?;
            }
        }
        stream.flush()?;
        Ok(())
    }
}
