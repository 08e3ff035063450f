//! TCP queries and the shared UDP socket.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use crate::cipher;
use crate::error::KasaError;

/// Largest datagram a device sends.
const MAX_DATAGRAM: usize = 4096;

/// Largest TCP reply body accepted. Strip sysinfo with realtime data stays
/// well below this.
const MAX_FRAME: usize = 64 * 1024;

/// One TCP round trip: connect, send `command`, read one framed reply.
///
/// Connect and read together are bounded by `timeout`.
pub(crate) async fn query(addr: SocketAddr, command: &str, timeout: Duration) -> Result<String, KasaError> {
    tokio::time::timeout(timeout, round_trip(addr, command))
        .await
        .map_err(|_| KasaError::Timeout)?
}

async fn round_trip(addr: SocketAddr, command: &str) -> Result<String, KasaError> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(&cipher::frame(command.as_bytes())).await?;

    let mut header = [0_u8; cipher::HEADER_LEN];
    stream.read_exact(&mut header).await?;
    let len = cipher::frame_len(header);
    if len > MAX_FRAME {
        return Err(KasaError::FrameTooLarge(len));
    }
    let mut body = vec![0_u8; len];
    stream.read_exact(&mut body).await?;

    Ok(String::from_utf8_lossy(&cipher::decrypt(&body)).into_owned())
}

/// The single UDP socket shared by probes and the reply listener.
#[derive(Debug)]
pub(crate) struct UdpChannel {
    socket: UdpSocket,
}

impl UdpChannel {
    pub(crate) async fn bind(addr: &str) -> Result<Self, KasaError> {
        let socket = UdpSocket::bind(addr).await?;
        socket.set_broadcast(true)?;
        Ok(Self { socket })
    }

    /// Fire-and-forget send of `command`.
    pub(crate) async fn probe(&self, target: SocketAddr, command: &str) -> Result<(), KasaError> {
        self.socket.send_to(&cipher::encrypt(command.as_bytes()), target).await?;
        Ok(())
    }

    /// Wait for the next datagram; returns its source IP and decrypted payload.
    pub(crate) async fn recv(&self) -> Result<(IpAddr, String), KasaError> {
        let mut buf = vec![0_u8; MAX_DATAGRAM];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        let payload = String::from_utf8_lossy(&cipher::decrypt(&buf[..len])).into_owned();
        Ok((from.ip(), payload))
    }

    #[cfg(test)]
    pub(crate) fn local_addr(&self) -> Result<SocketAddr, KasaError> {
        Ok(self.socket.local_addr()?)
    }
}
