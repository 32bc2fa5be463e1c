//! Single round-trip UDP exchange with an upstream name server.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::dns::MAX_PACKET_SIZE;
use crate::error::DnsError;

/// Default deadline for one round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// One query/response exchange with a name server.
///
/// The iterative resolver needs nothing else from the network, and tests
/// script this seam instead of talking to real servers.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Send `query` to `server` and return the reply datagram verbatim.
    async fn exchange(&self, query: &[u8], server: SocketAddr) -> Result<Vec<u8>, DnsError>;
}

/// Real exchange over an ephemeral UDP socket.
pub struct UdpUpstream {
    timeout: Duration,
}

impl UdpUpstream {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for UdpUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Upstream for UdpUpstream {
    async fn exchange(&self, query: &[u8], server: SocketAddr) -> Result<Vec<u8>, DnsError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.send_to(query, server).await?;

        let mut buf = [0u8; MAX_PACKET_SIZE];
        let (len, _) = timeout(self.timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| DnsError::UpstreamTimeout)??;
        Ok(buf[..len].to_vec())
    }
}
