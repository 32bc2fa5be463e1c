//! Per-query resolution pipeline.
//!
//! Every query takes exactly one of four paths, checked in priority order:
//!
//! 1. Sinkhole: blocked names get a local A answer pointing at loopback.
//! 2. Cache: a previous positive answer that has not expired.
//! 3. Zone: authoritative data loaded at startup.
//! 4. Recursion: iterative resolution from the DNS root.
//!
//! Resolution failures surface to the client as RCODEs; only undecodable
//! input is dropped without a reply.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::dns::{Message, RecordType, ResourceRecord};
use crate::error::DnsError;
use crate::filter::Blocklist;
use crate::recurse::{self, ROOT_SERVER};
use crate::stats::Stats;
use crate::upstream::Upstream;
use crate::zone::{Zone, ZoneStore};

/// Address every sinkholed name resolves to.
const SINKHOLE_ADDR: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// RCODE 2, Server Failure.
const RCODE_SERVER_FAILURE: u8 = 2;
/// RCODE 4, Not Implemented.
const RCODE_NOT_IMPLEMENTED: u8 = 4;

/// The shared resolution pipeline behind all handler tasks.
///
/// Zone data and the block-list are immutable after construction; the cache
/// serializes its own access internally.
pub struct Resolver {
    zones: ZoneStore,
    blocklist: Blocklist,
    cache: ResponseCache,
    upstream: Arc<dyn Upstream>,
    root: SocketAddr,
    stats: Stats,
}

impl Resolver {
    pub fn new(zones: ZoneStore, blocklist: Blocklist, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            zones,
            blocklist,
            cache: ResponseCache::new(),
            upstream,
            root: ROOT_SERVER,
            stats: Stats::new(),
        }
    }

    /// Override the initial name server for recursion, mostly for tests.
    pub fn with_root(mut self, root: SocketAddr) -> Self {
        self.root = root;
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn blocked_count(&self) -> usize {
        self.blocklist.len()
    }

    /// Answer `query` in place and encode the reply.
    ///
    /// `Err` means the reply itself could not be encoded and the datagram
    /// should be dropped; resolution failures come back as `Ok` replies
    /// carrying an RCODE.
    pub async fn build_response(&self, query: &mut Message) -> Result<Vec<u8>, DnsError> {
        let name = query.question.name.clone();
        // Queries carry no authority records worth echoing back.
        query.authority.clear();
        query.header.ra = true;

        if self.blocklist.is_blocked(&name) {
            debug!(%name, "sinkholed");
            self.sinkhole(query);
            self.stats.record_sinkholed();
        } else if let Some(cached) = self.cache.get(&name) {
            debug!(%name, "cache hit");
            query.answers = cached.answers;
            query.authority = cached.authority;
            query.additional = cached.additional;
            self.stats.record_cache_hit();
        } else if let Some(zone) = self.zones.get(&name) {
            match authoritative(query, zone) {
                Ok(()) => {
                    debug!(%name, answers = query.answers.len(), "authoritative");
                    self.cache.set(&name, query.clone());
                    self.stats.record_authoritative();
                }
                Err(error) => {
                    debug!(%name, qtype = %query.question.qtype, %error, "zone cannot answer");
                    query.answers.clear();
                    query.header.rcode = RCODE_NOT_IMPLEMENTED;
                    self.stats.record_failed();
                }
            }
        } else {
            debug!(%name, "cache miss, resolving from root");
            match recurse::resolve(query, self.upstream.as_ref(), self.root).await {
                Ok(()) => {
                    self.cache.set(&name, query.clone());
                    self.stats.record_recursive();
                }
                Err(error) => {
                    warn!(%name, %error, "recursive resolution failed");
                    query.answers.clear();
                    query.header.rcode = RCODE_SERVER_FAILURE;
                    self.stats.record_failed();
                }
            }
        }

        query.header.qr = true;
        query.encode()
    }

    fn sinkhole(&self, query: &mut Message) {
        query.additional.clear();
        query.answers.push(ResourceRecord {
            name: query.question.name.clone(),
            rtype: query.question.qtype,
            class: query.question.qclass,
            ttl: 0,
            rdata: SINKHOLE_ADDR.octets().to_vec(),
        });
    }
}

/// Answer from zone data. Only A questions are served.
fn authoritative(query: &mut Message, zone: &Zone) -> Result<(), DnsError> {
    if query.question.qtype != RecordType::A {
        return Err(DnsError::ZoneTypeUnsupported);
    }
    query.additional.clear();
    for record in &zone.a {
        query.answers.push(ResourceRecord {
            name: query.question.name.clone(),
            rtype: query.question.qtype,
            class: query.question.qclass,
            ttl: 0,
            rdata: record.value.octets().to_vec(),
        });
    }
    query.header.aa = true;
    Ok(())
}
