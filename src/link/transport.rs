//! Trait abstraction for the vehicle socket to enable testing

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};

/// Datagram I/O with the vehicle
///
/// Send and receive take `&self` so the foreground sender and the receiver
/// task can use the same handle concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one datagram
    async fn send(&self, data: &[u8]) -> io::Result<usize>;

    /// Receive one datagram into `buf`, returning its length
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Whether a receive error means the peer actively refused us
///
/// Windows reports `ConnectionReset`; Linux reports `ConnectionRefused` after
/// an ICMP port-unreachable on a connected socket.
pub fn is_reset(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
    )
}

/// UDP socket bound to a local port and connected to the vehicle
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpTransport {
    /// Bind `local` and connect to `remote`
    ///
    /// # Errors
    ///
    /// Returns `Setup` if the port is taken or the address is unreachable.
    pub async fn connect(local: SocketAddr, remote: SocketAddr) -> Result<Self> {
        debug!("Binding UDP socket on {}", local);
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| BridgeError::Setup(format!("Failed to bind {}: {}", local, e)))?;

        socket
            .connect(remote)
            .await
            .map_err(|e| BridgeError::Setup(format!("Failed to connect to {}: {}", remote, e)))?;

        info!("UDP socket {} associated with vehicle at {}", local, remote);
        Ok(Self { socket, remote })
    }

    /// Vehicle endpoint
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Locally bound endpoint
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> io::Result<usize> {
        self.socket.send(data).await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_kinds() {
        assert!(is_reset(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(is_reset(&io::Error::from(io::ErrorKind::ConnectionRefused)));
        assert!(!is_reset(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(!is_reset(&io::Error::from(io::ErrorKind::WouldBlock)));
    }

    #[tokio::test]
    async fn test_connect_loopback() {
        let vehicle = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let remote = vehicle.local_addr().unwrap();

        let transport = UdpTransport::connect("127.0.0.1:0".parse().unwrap(), remote)
            .await
            .unwrap();
        assert_eq!(transport.remote(), remote);

        transport.send(b"command").await.unwrap();
        let mut buf = [0u8; 16];
        let (n, from) = vehicle.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"command");
        assert_eq!(from, transport.local_addr().unwrap());

        vehicle.send_to(b"ok", from).await.unwrap();
        let n = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ok");
    }

    #[tokio::test]
    async fn test_bind_taken_port_is_setup_error() {
        let holder = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let taken = holder.local_addr().unwrap();

        let result = UdpTransport::connect(taken, "127.0.0.1:8889".parse().unwrap()).await;
        match result {
            Err(BridgeError::Setup(msg)) => assert!(msg.contains("Failed to bind")),
            other => panic!("Expected Setup error, got: {:?}", other),
        }
    }
}
