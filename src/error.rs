//! Error kinds for the wire codec and the resolution pipeline.

use thiserror::Error;

/// Protocol and resolution failures.
///
/// Codec failures cause the offending datagram to be dropped and are never
/// surfaced to clients; resolution failures surface as RCODEs in the reply.
#[derive(Debug, Error)]
pub enum DnsError {
    /// Datagram shorter than the 12 byte header.
    #[error("message shorter than the DNS header")]
    ShortMessage,

    /// Message structure does not decode.
    #[error("malformed message")]
    Malformed,

    /// Domain name does not decode: bad length octet, bad pointer, overrun,
    /// or a pointer loop.
    #[error("malformed domain name")]
    MalformedName,

    /// A textual label exceeds the wire limit.
    #[error("label exceeds maximum length of 63 octets")]
    LabelTooLong,

    /// No reply from an upstream server within the deadline.
    #[error("upstream query timed out")]
    UpstreamTimeout,

    /// Socket failure talking to an upstream server.
    #[error("upstream i/o error: {0}")]
    UpstreamIo(#[from] std::io::Error),

    /// The referral chain ran out of answers and glue.
    #[error("no resolution path for the query")]
    Unresolvable,

    /// The zone matched the question but does not serve this record type.
    #[error("record type not supported by authoritative zone")]
    ZoneTypeUnsupported,
}
