//! Datagram transport used by a session.

use bytes::{Bytes, BytesMut};
use log::debug;
use std::error;
use std::fmt;
use std::io;
use std::net::UdpSocket;
use std::time::Duration;

/// Errors reported by a [`DatagramChannel`]
#[derive(Debug)]
pub enum ChannelError {
    /// Nothing was received before the timeout expired
    Timeout,
    /// The underlying socket failed
    Transport(io::Error),
    /// The datagram did not fit the receive buffer, carries the bytes read
    MessageTooLarge(usize),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelError::Timeout => write!(f, "receive timed out"),
            ChannelError::Transport(e) => write!(f, "{}", e),
            ChannelError::MessageTooLarge(size) => {
                write!(f, "datagram truncated to {} bytes", size)
            }
        }
    }
}

impl error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ChannelError::Timeout | ChannelError::MessageTooLarge(_) => None,
            ChannelError::Transport(e) => Some(e),
        }
    }
}

impl From<io::Error> for ChannelError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ChannelError::Timeout,
            _ => ChannelError::Transport(e),
        }
    }
}

/// A connected, message oriented transport towards the TURN server.
pub trait DatagramChannel {
    /// Sends one datagram
    fn send(&mut self, buffer: &[u8]) -> Result<(), ChannelError>;

    /// Waits at most `timeout` for one datagram
    fn recv_timeout(&mut self, timeout: Duration) -> Result<Bytes, ChannelError>;
}

/// [`DatagramChannel`] over a UDP socket the caller has already opened
/// and connected to the server.
#[derive(Debug)]
pub struct UdpChannel {
    socket: UdpSocket,
    capacity: usize,
}

impl UdpChannel {
    /// Wraps `socket`. Datagrams up to `max_message_size` bytes are
    /// received whole, a larger one fails with
    /// [`ChannelError::MessageTooLarge`].
    pub fn new(socket: UdpSocket, max_message_size: usize) -> Self {
        Self {
            socket,
            capacity: max_message_size + 1,
        }
    }

    /// Returns the wrapped socket
    pub fn into_inner(self) -> UdpSocket {
        self.socket
    }
}

impl DatagramChannel for UdpChannel {
    fn send(&mut self, buffer: &[u8]) -> Result<(), ChannelError> {
        let size = self.socket.send(buffer).map_err(ChannelError::Transport)?;
        debug!("Sent {} bytes to {:?}", size, self.socket.peer_addr().ok());
        Ok(())
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Result<Bytes, ChannelError> {
        if timeout.is_zero() {
            return Err(ChannelError::Timeout);
        }
        self.socket
            .set_read_timeout(Some(timeout))
            .map_err(ChannelError::Transport)?;

        let mut buffer = BytesMut::zeroed(self.capacity);
        let size = self.socket.recv(buffer.as_mut())?;
        // The buffer is one byte over the limit, filling it means the
        // kernel cut the datagram
        if size >= self.capacity {
            return Err(ChannelError::MessageTooLarge(size));
        }
        buffer.truncate(size);
        Ok(buffer.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_pair() -> (UdpSocket, UdpSocket) {
        let a = UdpSocket::bind("127.0.0.1:0").expect("Can not bind socket");
        let b = UdpSocket::bind("127.0.0.1:0").expect("Can not bind socket");
        a.connect(b.local_addr().expect("No local address"))
            .expect("Can not connect socket");
        b.connect(a.local_addr().expect("No local address"))
            .expect("Can not connect socket");
        (a, b)
    }

    fn server_send(socket: &UdpSocket, buffer: &[u8]) {
        socket.send(buffer).expect("Can not send");
    }

    #[test]
    fn udp_channel_send_recv() {
        let (a, b) = connected_pair();
        let mut client = UdpChannel::new(a, 8);
        let server = b;

        client.send(&[0x01, 0x02, 0x03]).expect("Can not send");
        let mut buffer = [0u8; 16];
        let size = server.recv(&mut buffer).expect("Can not receive");
        assert_eq!(buffer[..size], [0x01, 0x02, 0x03]);

        server.send(&[0xff; 8]).expect("Can not send");
        let datagram = client
            .recv_timeout(Duration::from_secs(1))
            .expect("Can not receive");
        assert_eq!(datagram.len(), 8);
    }

    #[test]
    fn udp_channel_oversize_datagram() {
        let (a, b) = connected_pair();
        let mut client = UdpChannel::new(a, 8);

        server_send(&b, &[0xff; 20]);
        let error = client
            .recv_timeout(Duration::from_secs(1))
            .expect_err("Error expected");
        // Cut to the buffer, one byte over the maximum
        assert!(matches!(error, ChannelError::MessageTooLarge(9)));

        // Exactly one byte over the maximum
        server_send(&b, &[0xff; 9]);
        let error = client
            .recv_timeout(Duration::from_secs(1))
            .expect_err("Error expected");
        assert!(matches!(error, ChannelError::MessageTooLarge(9)));
    }

    #[test]
    fn udp_channel_timeout() {
        let (a, _b) = connected_pair();
        let mut client = UdpChannel::new(a, 2048);
        let error = client
            .recv_timeout(Duration::from_millis(10))
            .expect_err("Timeout expected");
        assert!(matches!(error, ChannelError::Timeout));
    }
}
