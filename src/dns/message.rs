//! DNS message framing: header, question, resource records.
//!
//! The layout follows RFC 1035 section 4.1:
//!
//! ```text
//!     +---------------------+
//!     |        Header       |
//!     +---------------------+
//!     |       Question      |
//!     +---------------------+
//!     |        Answer       |
//!     +---------------------+
//!     |      Authority      |
//!     +---------------------+
//!     |      Additional     |
//!     +---------------------+
//! ```
//!
//! All multi-octet fields are big-endian. RDATA is carried opaquely; only
//! A record payloads are ever interpreted, for delegation chasing.

use std::fmt;
use std::net::Ipv4Addr;

use crate::dns::name::{decode_name, encode_name};
use crate::dns::CLASS_IN;
use crate::error::DnsError;

/// Fixed size of the wire header.
pub const HEADER_LEN: usize = 12;

/// Message header.
///
/// The flags share the second 16-bit word:
/// `QR<<15 | Opcode<<11 | AA<<10 | TC<<9 | RD<<8 | RA<<7 | Z<<4 | RCODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub id: u16,
    /// Query (false) or response (true).
    pub qr: bool,
    pub opcode: u8,
    /// Authoritative answer.
    pub aa: bool,
    /// Truncated.
    pub tc: bool,
    /// Recursion desired.
    pub rd: bool,
    /// Recursion available.
    pub ra: bool,
    /// Reserved, zero on send.
    pub z: u8,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let flags = u16::from(self.qr) << 15
            | u16::from(self.opcode & 0x0F) << 11
            | u16::from(self.aa) << 10
            | u16::from(self.tc) << 9
            | u16::from(self.rd) << 8
            | u16::from(self.ra) << 7
            | u16::from(self.z & 0x07) << 4
            | u16::from(self.rcode & 0x0F);

        let mut wire = [0u8; HEADER_LEN];
        wire[0..2].copy_from_slice(&self.id.to_be_bytes());
        wire[2..4].copy_from_slice(&flags.to_be_bytes());
        wire[4..6].copy_from_slice(&self.qdcount.to_be_bytes());
        wire[6..8].copy_from_slice(&self.ancount.to_be_bytes());
        wire[8..10].copy_from_slice(&self.nscount.to_be_bytes());
        wire[10..12].copy_from_slice(&self.arcount.to_be_bytes());
        wire
    }

    pub fn decode(data: &[u8]) -> Result<Self, DnsError> {
        if data.len() < HEADER_LEN {
            return Err(DnsError::ShortMessage);
        }
        let flags = u16::from_be_bytes([data[2], data[3]]);
        Ok(Self {
            id: u16::from_be_bytes([data[0], data[1]]),
            qr: flags >> 15 & 1 == 1,
            opcode: (flags >> 11 & 0x0F) as u8,
            aa: flags >> 10 & 1 == 1,
            tc: flags >> 9 & 1 == 1,
            rd: flags >> 8 & 1 == 1,
            ra: flags >> 7 & 1 == 1,
            z: (flags >> 4 & 0x07) as u8,
            rcode: (flags & 0x0F) as u8,
            qdcount: u16::from_be_bytes([data[4], data[5]]),
            ancount: u16::from_be_bytes([data[6], data[7]]),
            nscount: u16::from_be_bytes([data[8], data[9]]),
            arcount: u16::from_be_bytes([data[10], data[11]]),
        })
    }
}

/// RFC 1035 section 3.2.2 TYPE codes. Unknown codes pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Ns,
    Md,
    Mf,
    Cname,
    Soa,
    Mb,
    Mg,
    Mr,
    Null,
    Wks,
    Ptr,
    Hinfo,
    Minfo,
    Mx,
    Txt,
    Other(u16),
}

impl RecordType {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::A,
            2 => Self::Ns,
            3 => Self::Md,
            4 => Self::Mf,
            5 => Self::Cname,
            6 => Self::Soa,
            7 => Self::Mb,
            8 => Self::Mg,
            9 => Self::Mr,
            10 => Self::Null,
            11 => Self::Wks,
            12 => Self::Ptr,
            13 => Self::Hinfo,
            14 => Self::Minfo,
            15 => Self::Mx,
            16 => Self::Txt,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Md => 3,
            Self::Mf => 4,
            Self::Cname => 5,
            Self::Soa => 6,
            Self::Mb => 7,
            Self::Mg => 8,
            Self::Mr => 9,
            Self::Null => 10,
            Self::Wks => 11,
            Self::Ptr => 12,
            Self::Hinfo => 13,
            Self::Minfo => 14,
            Self::Mx => 15,
            Self::Txt => 16,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self {
            Self::A => "a",
            Self::Ns => "ns",
            Self::Md => "md",
            Self::Mf => "mf",
            Self::Cname => "cname",
            Self::Soa => "soa",
            Self::Mb => "mb",
            Self::Mg => "mg",
            Self::Mr => "mr",
            Self::Null => "null",
            Self::Wks => "wks",
            Self::Ptr => "ptr",
            Self::Hinfo => "hinfo",
            Self::Minfo => "minfo",
            Self::Mx => "mx",
            Self::Txt => "txt",
            Self::Other(code) => return write!(f, "type{code}"),
        };
        f.write_str(mnemonic)
    }
}

/// The question section entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: RecordType,
    pub qclass: u16,
}

impl Question {
    pub fn encode(&self) -> Result<Vec<u8>, DnsError> {
        let mut wire = encode_name(&self.name)?;
        wire.extend_from_slice(&self.qtype.code().to_be_bytes());
        wire.extend_from_slice(&self.qclass.to_be_bytes());
        Ok(wire)
    }

    /// Decode at `offset`, returning the question and the bytes consumed,
    /// QTYPE and QCLASS included.
    pub fn decode(message: &[u8], offset: usize) -> Result<(Self, usize), DnsError> {
        let (name, name_len) = decode_name(message, offset)?;
        let pos = offset + name_len;
        let fixed = message.get(pos..pos + 4).ok_or(DnsError::Malformed)?;
        let question = Self {
            name,
            qtype: RecordType::from_code(u16::from_be_bytes([fixed[0], fixed[1]])),
            qclass: u16::from_be_bytes([fixed[2], fixed[3]]),
        };
        Ok((question, name_len + 4))
    }
}

/// A resource record, shared by the answer, authority, and additional
/// sections. RDATA is opaque; its length on the wire is `rdata.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: RecordType,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

/// Wire offset of the question name, the target of owner-name compression.
const QUESTION_POINTER: [u8; 2] = [0xC0, 0x0C];

impl ResourceRecord {
    /// Encode the record. An owner equal to the question name compresses to
    /// a pointer at the question section, the only compression the encoder
    /// produces.
    pub fn encode(&self, question_name: &str) -> Result<Vec<u8>, DnsError> {
        let mut wire = if self.name == question_name {
            QUESTION_POINTER.to_vec()
        } else {
            encode_name(&self.name)?
        };
        wire.extend_from_slice(&self.rtype.code().to_be_bytes());
        wire.extend_from_slice(&self.class.to_be_bytes());
        wire.extend_from_slice(&self.ttl.to_be_bytes());
        wire.extend_from_slice(&(self.rdata.len() as u16).to_be_bytes());
        wire.extend_from_slice(&self.rdata);
        Ok(wire)
    }

    /// Decode at `offset`, returning the record and the bytes consumed.
    pub fn decode(message: &[u8], offset: usize) -> Result<(Self, usize), DnsError> {
        let (name, name_len) = decode_name(message, offset)?;
        let pos = offset + name_len;
        let fixed = message.get(pos..pos + 10).ok_or(DnsError::Malformed)?;
        let rdlength = usize::from(u16::from_be_bytes([fixed[8], fixed[9]]));
        let rdata = message
            .get(pos + 10..pos + 10 + rdlength)
            .ok_or(DnsError::Malformed)?
            .to_vec();
        let record = Self {
            name,
            rtype: RecordType::from_code(u16::from_be_bytes([fixed[0], fixed[1]])),
            class: u16::from_be_bytes([fixed[2], fixed[3]]),
            ttl: u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]),
            rdata,
        };
        Ok((record, name_len + 10 + rdlength))
    }

    /// Four-octet A RDATA as an address; `None` for any other shape.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        <[u8; 4]>::try_from(self.rdata.as_slice())
            .ok()
            .map(Ipv4Addr::from)
    }
}

/// A full DNS message.
///
/// This server only handles single-question messages; `decode` rejects any
/// other QDCount. The original request datagram is kept on the message so
/// the recursive path can forward it verbatim.
#[derive(Debug, Clone)]
pub struct Message {
    pub header: Header,
    pub question: Question,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
    pub bytes: Vec<u8>,
}

impl Message {
    /// Build a recursion-desired query with its wire form attached.
    pub fn new_query(id: u16, name: &str, qtype: RecordType) -> Result<Self, DnsError> {
        let mut message = Self {
            header: Header {
                id,
                rd: true,
                qdcount: 1,
                ..Header::default()
            },
            question: Question {
                name: name.to_string(),
                qtype,
                qclass: CLASS_IN,
            },
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            bytes: Vec::new(),
        };
        message.bytes = message.encode()?;
        Ok(message)
    }

    pub fn decode(data: &[u8]) -> Result<Self, DnsError> {
        let header = Header::decode(data)?;
        if header.qdcount != 1 {
            return Err(DnsError::Malformed);
        }
        let (question, question_len) = Question::decode(data, HEADER_LEN)?;
        let mut pos = HEADER_LEN + question_len;
        let answers = decode_section(data, &mut pos, header.ancount)?;
        let authority = decode_section(data, &mut pos, header.nscount)?;
        let additional = decode_section(data, &mut pos, header.arcount)?;
        Ok(Self {
            header,
            question,
            answers,
            authority,
            additional,
            bytes: data.to_vec(),
        })
    }

    /// Encode the message. The four section counts are refreshed from the
    /// actual lists first, so they always agree with what goes on the wire.
    pub fn encode(&mut self) -> Result<Vec<u8>, DnsError> {
        self.header.qdcount = 1;
        self.header.ancount = self.answers.len() as u16;
        self.header.nscount = self.authority.len() as u16;
        self.header.arcount = self.additional.len() as u16;

        let mut wire = Vec::with_capacity(512);
        wire.extend_from_slice(&self.header.encode());
        wire.extend_from_slice(&self.question.encode()?);
        for record in self
            .answers
            .iter()
            .chain(&self.authority)
            .chain(&self.additional)
        {
            wire.extend_from_slice(&record.encode(&self.question.name)?);
        }
        Ok(wire)
    }
}

fn decode_section(
    data: &[u8],
    pos: &mut usize,
    count: u16,
) -> Result<Vec<ResourceRecord>, DnsError> {
    let mut records = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let (record, len) = ResourceRecord::decode(data, *pos)?;
        *pos += len;
        records.push(record);
    }
    Ok(records)
}
