//! DNS wire protocol, the RFC 1035 subset this server speaks.
//!
//! `name` holds the label codec, `message` the header, question, and
//! resource record framing built on top of it.

pub mod message;
pub mod name;

pub use message::{Header, Message, Question, RecordType, ResourceRecord, HEADER_LEN};
pub use name::{decode_name, encode_name, normalize, MAX_LABEL_LEN, MAX_NAME_LEN};

/// Largest datagram accepted from clients or upstream servers.
pub const MAX_PACKET_SIZE: usize = 2048;

/// The IN class code.
pub const CLASS_IN: u16 = 1;
