//! Iterative resolution by referral chasing.
//!
//! A query starts at a root server. Each reply either answers the question
//! or refers us to name servers for a deeper zone, with glue A records in
//! the Additional section carrying their addresses. The chain is followed
//! until an answer arrives or the depth bound trips.

use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use tracing::{debug, warn};

use crate::dns::{Message, RecordType, ResourceRecord};
use crate::error::DnsError;
use crate::upstream::Upstream;

/// a.root-servers.net, the default starting point.
pub const ROOT_SERVER: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(198, 41, 0, 4), 53));

/// Referral chains longer than this fail instead of looping.
pub const MAX_REFERRALS: usize = 16;

const DNS_PORT: u16 = 53;

/// Follow the delegation chain from `server` until `query` is answered.
///
/// Answers whose TYPE matches the question are appended to `query` and the
/// message is flagged as a response. Glue candidates from one referral are
/// tried in order when an exchange fails; running out of candidates, depth,
/// or glue fails with [`DnsError::Unresolvable`].
pub async fn resolve(
    query: &mut Message,
    upstream: &dyn Upstream,
    server: SocketAddr,
) -> Result<(), DnsError> {
    let mut candidates = VecDeque::from([server]);

    for _ in 0..MAX_REFERRALS {
        let (reply, server) = exchange_any(query, upstream, &mut candidates).await?;

        let matching: Vec<ResourceRecord> = reply
            .answers
            .iter()
            .filter(|answer| answer.rtype == query.question.qtype)
            .cloned()
            .collect();
        if !matching.is_empty() {
            debug!(name = %query.question.name, %server, answers = matching.len(), "answered");
            query.answers.extend(matching);
            query.header.qr = true;
            query.header.ra = true;
            return Ok(());
        }

        if reply.authority.is_empty() {
            return Err(DnsError::Unresolvable);
        }
        candidates = glue_candidates(&reply);
        if candidates.is_empty() {
            // Glueless delegation, no way forward without sub-queries.
            return Err(DnsError::Unresolvable);
        }
        debug!(name = %query.question.name, %server, next = %candidates[0], "referral");
    }

    Err(DnsError::Unresolvable)
}

/// Pop candidates until one produces a decodable reply.
async fn exchange_any(
    query: &Message,
    upstream: &dyn Upstream,
    candidates: &mut VecDeque<SocketAddr>,
) -> Result<(Message, SocketAddr), DnsError> {
    while let Some(server) = candidates.pop_front() {
        match upstream.exchange(&query.bytes, server).await {
            Ok(wire) => match Message::decode(&wire) {
                Ok(reply) => return Ok((reply, server)),
                Err(error) => {
                    debug!(%server, %error, "discarding undecodable reply");
                }
            },
            Err(error) => {
                warn!(%server, %error, "upstream exchange failed");
            }
        }
    }
    Err(DnsError::Unresolvable)
}

/// A-typed additionals are in-bailiwick glue; each one is a next-hop
/// candidate on the standard port.
fn glue_candidates(reply: &Message) -> VecDeque<SocketAddr> {
    reply
        .additional
        .iter()
        .filter(|record| record.rtype == RecordType::A)
        .filter_map(|record| record.ipv4())
        .map(|ip| SocketAddr::new(ip.into(), DNS_PORT))
        .collect()
}
