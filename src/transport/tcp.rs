use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::Transport;
use crate::DEFAULT_PORT;

pub struct TcpTransport {
    inner: TcpStream,
    peer: SocketAddr,
}

impl TcpTransport {
    pub fn connect(host: &str) -> io::Result<Self> {
        Self::connect_with(host, DEFAULT_PORT, None)
    }

    /// Tries every address `host` resolves to, in order, until one accepts.
    pub fn connect_with(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<Self> {
        let mut last_err = None;

        for addr in (host, port).to_socket_addrs()? {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream),
                Err(err) => {
                    debug!(%addr, %err, "flicd connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{host}:{port} did not resolve to any address"),
            )
        }))
    }

    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok(Self {
            inner: stream,
            peer,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Read for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Transport for TcpTransport {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        // A zero duration is rejected by the socket layer.
        self.inner
            .set_read_timeout(timeout.map(|t| t.max(Duration::from_millis(1))))
    }

    fn shutdown(&mut self) -> io::Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
