use std::io::{self, Read, Write};
use std::time::Duration;

/// TCP connection to a flicd daemon.
#[cfg(feature = "tcp")]
pub mod tcp;

/// Byte stream the client speaks the protocol over.
///
/// Reads must honour the timeout set through [`Transport::set_read_timeout`]
/// by failing with [`io::ErrorKind::WouldBlock`] or [`io::ErrorKind::TimedOut`],
/// and report the end of the stream as a zero-length read.
pub trait Transport: Read + Write {
    /// `None` blocks until data arrives.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    fn shutdown(&mut self) -> io::Result<()>;
}
