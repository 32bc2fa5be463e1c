//! UDP listener and per-datagram dispatch.
//!
//! One loop blocks on the socket; every datagram is handed to its own task
//! so no query blocks another. Handlers reply concurrently on the shared
//! socket, which is atomic per datagram at the OS level.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::dns::{Message, MAX_PACKET_SIZE};
use crate::filter::Blocklist;
use crate::resolver::Resolver;
use crate::upstream::UdpUpstream;
use crate::zone::{ZoneError, ZoneStore};

/// How often accumulated stats are reported.
const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// Server configuration, assembled by the CLI.
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub zones_dir: PathBuf,
    pub blocklist_path: Option<PathBuf>,
    pub zone_enabled: bool,
    pub sinkhole_enabled: bool,
}

/// Startup failures. Anything past startup is handled per query.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),

    #[error(transparent)]
    Zones(#[from] ZoneError),

    #[error("failed to load block-list: {0}")]
    Blocklist(#[source] std::io::Error),

    #[error("--sinkhole requires a block-list file")]
    MissingBlocklist,
}

/// Load the collaborators named by `config`, bind the listener, and serve
/// until the process is killed.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let zones = if config.zone_enabled {
        ZoneStore::load_dir(&config.zones_dir)?
    } else {
        ZoneStore::default()
    };
    let blocklist = if config.sinkhole_enabled {
        let path = config
            .blocklist_path
            .as_deref()
            .ok_or(ServerError::MissingBlocklist)?;
        Blocklist::from_file(path).map_err(ServerError::Blocklist)?
    } else {
        Blocklist::default()
    };

    let resolver = Arc::new(Resolver::new(zones, blocklist, Arc::new(UdpUpstream::new())));

    let socket = UdpSocket::bind(config.bind_addr)
        .await
        .map_err(|e| ServerError::Bind(config.bind_addr, e))?;
    info!(
        addr = %config.bind_addr,
        zones = resolver.zone_count(),
        blocked = resolver.blocked_count(),
        "dns server listening"
    );

    serve(socket, resolver).await;
    Ok(())
}

/// The listener loop with an already-wired resolver.
pub async fn serve(socket: UdpSocket, resolver: Arc<Resolver>) {
    let socket = Arc::new(socket);
    tokio::spawn(report_stats(resolver.clone()));

    let mut buf = [0u8; MAX_PACKET_SIZE];
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(error) => {
                warn!(%error, "recv error");
                continue;
            }
        };
        let datagram = buf[..len].to_vec();
        tokio::spawn(handle(socket.clone(), resolver.clone(), datagram, peer));
    }
}

async fn handle(
    socket: Arc<UdpSocket>,
    resolver: Arc<Resolver>,
    datagram: Vec<u8>,
    peer: SocketAddr,
) {
    let start = Instant::now();
    // Undecodable datagrams are dropped without a reply.
    let mut query = match Message::decode(&datagram) {
        Ok(message) => message,
        Err(error) => {
            debug!(%peer, %error, "dropping undecodable datagram");
            return;
        }
    };
    debug!(
        %peer,
        name = %query.question.name,
        qtype = %query.question.qtype,
        "query"
    );

    match resolver.build_response(&mut query).await {
        Ok(reply) => {
            if let Err(error) = socket.send_to(&reply, peer).await {
                warn!(%peer, %error, "failed to send reply");
            }
        }
        Err(error) => {
            debug!(%peer, %error, "dropping unanswerable query");
        }
    }
    resolver
        .stats()
        .record_handle_time(start.elapsed().as_secs_f64() * 1000.0);
}

async fn report_stats(resolver: Arc<Resolver>) {
    let mut interval = tokio::time::interval(STATS_INTERVAL);
    interval.tick().await; // the first tick fires immediately
    loop {
        interval.tick().await;
        let stats = resolver.stats().snapshot_and_reset();
        if stats.requests > 0 {
            info!(
                requests = stats.requests,
                sinkholed = stats.sinkholed,
                cache_hits = stats.cache_hits,
                authoritative = stats.authoritative,
                recursive = stats.recursive,
                failed = stats.failed,
                avg_handle_ms = stats.avg_handle_ms,
                "stats"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{RecordType, CLASS_IN};
    use crate::upstream::Upstream;
    use async_trait::async_trait;
    use rand::Rng;
    use std::net::Ipv4Addr;

    struct UnreachableUpstream;

    #[async_trait]
    impl Upstream for UnreachableUpstream {
        async fn exchange(
            &self,
            _query: &[u8],
            server: SocketAddr,
        ) -> Result<Vec<u8>, crate::error::DnsError> {
            panic!("unexpected upstream exchange with {server}");
        }
    }

    async fn start_test_server(blocklist: &str, zone_yaml: Option<&str>) -> SocketAddr {
        let mut zones = ZoneStore::default();
        if let Some(yaml) = zone_yaml {
            zones.insert(serde_yaml::from_str(yaml).unwrap());
        }
        let resolver = Arc::new(Resolver::new(
            zones,
            Blocklist::from_lines(blocklist),
            Arc::new(UnreachableUpstream),
        ));
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(serve(socket, resolver));
        addr
    }

    async fn ask(server: SocketAddr, query: &[u8]) -> Vec<u8> {
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(query, server).await.unwrap();
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .expect("no reply from server")
            .unwrap();
        buf[..len].to_vec()
    }

    #[tokio::test]
    async fn end_to_end_sinkhole_over_udp() {
        let server = start_test_server("ads.example.\n", None).await;

        let id = rand::thread_rng().gen::<u16>();
        let query = Message::new_query(id, "ads.example.", RecordType::A).unwrap();
        let reply = Message::decode(&ask(server, &query.bytes).await).unwrap();

        assert_eq!(reply.header.id, id);
        assert!(reply.header.qr);
        assert_eq!(reply.header.ancount, 1);
        assert_eq!(reply.answers[0].ipv4(), Some(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn end_to_end_concurrent_clients() {
        let zone = "origin: example.local.\na:\n  - name: \"@\"\n    value: 10.0.0.1\n";
        let server = start_test_server("", Some(zone)).await;

        let mut tasks = Vec::new();
        for client_id in 0..10u16 {
            tasks.push(tokio::spawn(async move {
                for request in 0..5u16 {
                    let id = client_id << 8 | request;
                    let query =
                        Message::new_query(id, "example.local.", RecordType::A).unwrap();
                    let reply = Message::decode(&ask(server, &query.bytes).await).unwrap();
                    assert_eq!(reply.header.id, id);
                    assert_eq!(reply.answers[0].class, CLASS_IN);
                    assert_eq!(reply.answers[0].ipv4(), Some([10, 0, 0, 1].into()));
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn malformed_datagrams_get_no_reply() {
        let server = start_test_server("ads.example.\n", None).await;

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        // Shorter than a header; the server must stay silent.
        client.send_to(&[0x12, 0x34], server).await.unwrap();

        let mut buf = [0u8; MAX_PACKET_SIZE];
        let outcome =
            tokio::time::timeout(Duration::from_millis(200), client.recv_from(&mut buf)).await;
        assert!(outcome.is_err());
    }
}
