//! Blocking connection to a Meridian server.

use std::io;
use std::net::TcpStream;

use meridian_proto::codec::{read_frame, write_frame};
use meridian_proto::{Request, Response};

/// A framed request/response channel to one server.
pub struct ServerConnection {
    stream: TcpStream,
}

impl ServerConnection {
    /// Connects to `host:port`.
    pub fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// Sends one request.
    pub fn send(&mut self, request: &Request) -> io::Result<()> {
        write_frame(&mut self.stream, request)
    }

    /// Receives one response.
    pub fn recv(&mut self) -> io::Result<Response> {
        read_frame(&mut self.stream)
    }
}
