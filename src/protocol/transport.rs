use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};

use log::{debug, info};
use thiserror::Error;

/// Upper bound on a single request or response frame, terminator included.
pub const MAX_FRAME_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to reach server at {address}: {source}")]
    Connect {
        address: SocketAddr,
        source: io::Error,
    },
    #[error("connection closed by server")]
    Closed,
    #[error("Transport IO Error: {0}")]
    Io(#[from] io::Error),
}

/// One long-lived bidirectional stream carrying space-delimited text frames,
/// strictly one request in flight at a time.
pub struct LineTransport<T: Read + Write> {
    stream: T,
}

impl LineTransport<TcpStream> {
    /// Open the connection to the portal server. One attempt, no retry;
    /// the client is built for a single always-on server.
    pub fn connect(address: SocketAddr) -> Result<Self, TransportError> {
        let stream =
            TcpStream::connect(address).map_err(|source| TransportError::Connect {
                address,
                source,
            })?;
        info!("connected to {address}");
        Ok(Self::new(stream))
    }
}

impl<T: Read + Write> LineTransport<T> {
    pub fn new(stream: T) -> Self {
        Self { stream }
    }

    /// Send one request line and block for the single response frame.
    ///
    /// The read is bounded by [`MAX_FRAME_SIZE`]; whatever arrives in one
    /// read call is the response. A zero-byte read means the peer closed
    /// the connection.
    pub fn exchange(&mut self, request: &str) -> Result<String, TransportError> {
        self.stream.write_all(request.as_bytes())?;
        self.stream.flush()?;

        let mut buf = [0u8; MAX_FRAME_SIZE];
        let read = self.stream.read(&mut buf)?;
        if read == 0 {
            return Err(TransportError::Closed);
        }
        debug!("exchange: {} bytes out, {read} bytes in", request.len());

        let line = String::from_utf8_lossy(&buf[..read]);
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
