//! Domain name label codec.
//!
//! Names travel on the wire as length-prefixed labels terminated by a zero
//! octet. Messages may compress names with two-byte pointers back into
//! earlier parts of the message; the decoder follows those, the encoder
//! never emits them (record owners are compressed separately in `message`).

use rustc_hash::FxHashSet;

use crate::error::DnsError;

/// Longest single label, RFC 1035 section 2.3.4.
pub const MAX_LABEL_LEN: usize = 63;

/// Longest whole name in wire form, terminal zero octet included.
pub const MAX_NAME_LEN: usize = 255;

/// Top two bits of a length octet marking a compression pointer.
const POINTER_MASK: u8 = 0xC0;

/// Encode a textual domain name to wire format.
///
/// A single trailing dot is stripped; the empty string and `"."` both encode
/// as the bare root label `{0x00}`.
pub fn encode_name(name: &str) -> Result<Vec<u8>, DnsError> {
    if name.is_empty() || name == "." {
        return Ok(vec![0]);
    }
    let name = name.strip_suffix('.').unwrap_or(name);
    let mut wire = Vec::with_capacity(name.len() + 2);
    for label in name.split('.') {
        if label.len() > MAX_LABEL_LEN {
            return Err(DnsError::LabelTooLong);
        }
        wire.push(label.len() as u8);
        wire.extend_from_slice(label.as_bytes());
    }
    wire.push(0);
    Ok(wire)
}

/// Decode a name from `message` starting at `offset`.
///
/// Returns the name in canonical form (lowercase, trailing dot) and the
/// number of bytes the name occupies at `offset` itself; a compression
/// pointer occupies two bytes no matter where it leads.
pub fn decode_name(message: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
    let mut name = String::new();
    let mut pos = offset;
    let mut wire_len = 1; // terminal zero octet
    let mut jumped: Option<usize> = None;
    let mut visited = FxHashSet::default();

    loop {
        let octet = *message.get(pos).ok_or(DnsError::MalformedName)?;
        match octet & POINTER_MASK {
            POINTER_MASK => {
                let low = *message.get(pos + 1).ok_or(DnsError::MalformedName)?;
                let target = usize::from(octet & !POINTER_MASK) << 8 | usize::from(low);
                // The bytes consumed at `offset` are fixed by the first jump.
                if jumped.is_none() {
                    jumped = Some(pos + 2 - offset);
                }
                // A revisited target means the pointers form a cycle.
                if !visited.insert(target) {
                    return Err(DnsError::MalformedName);
                }
                pos = target;
            }
            0 => {
                if octet == 0 {
                    let consumed = jumped.unwrap_or(pos + 1 - offset);
                    if name.is_empty() {
                        name.push('.');
                    }
                    return Ok((name, consumed));
                }
                let len = usize::from(octet);
                wire_len += len + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(DnsError::MalformedName);
                }
                let label = message
                    .get(pos + 1..pos + 1 + len)
                    .ok_or(DnsError::MalformedName)?;
                let label = std::str::from_utf8(label).map_err(|_| DnsError::MalformedName)?;
                name.push_str(&label.to_ascii_lowercase());
                name.push('.');
                pos += len + 1;
            }
            // 0x40 and 0x80 are reserved combinations.
            _ => return Err(DnsError::MalformedName),
        }
    }
}

/// Canonical textual form shared by cache keys, zone origins, and the
/// block-list: lowercase with a trailing dot.
pub fn normalize(name: &str) -> String {
    let mut name = name.to_ascii_lowercase();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_simple_domain() {
        let wire = encode_name("example.com").unwrap();
        assert_eq!(
            wire,
            [
                &[7u8][..],
                b"example",
                &[3],
                b"com",
                &[0]
            ]
            .concat()
        );
    }

    #[test]
    fn encode_subdomain() {
        let wire = encode_name("sub.example.com").unwrap();
        assert_eq!(
            wire,
            [&[3u8][..], b"sub", &[7], b"example", &[3], b"com", &[0]].concat()
        );
    }

    #[test]
    fn encode_root_and_empty() {
        assert_eq!(encode_name(".").unwrap(), vec![0]);
        assert_eq!(encode_name("").unwrap(), vec![0]);
    }

    #[test]
    fn encode_strips_trailing_dot() {
        assert_eq!(
            encode_name("example.com.").unwrap(),
            encode_name("example.com").unwrap()
        );
    }

    #[test]
    fn encode_single_label() {
        let wire = encode_name("localhost").unwrap();
        assert_eq!(wire, [&[9u8][..], b"localhost", &[0]].concat());
    }

    #[test]
    fn encode_63_octet_label() {
        let label = "a".repeat(63);
        let wire = encode_name(&format!("{label}.com")).unwrap();
        assert_eq!(wire[0], 63);
        assert_eq!(wire.len(), 1 + 63 + 1 + 3 + 1);
    }

    #[test]
    fn encode_64_octet_label_fails() {
        let label = "a".repeat(64);
        let err = encode_name(&format!("{label}.com.")).unwrap_err();
        assert!(matches!(err, DnsError::LabelTooLong));
    }

    #[test]
    fn decode_simple_domain() {
        let wire = [&[7u8][..], b"example", &[3], b"com", &[0]].concat();
        let (name, consumed) = decode_name(&wire, 0).unwrap();
        assert_eq!(name, "example.com.");
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn decode_root() {
        let (name, consumed) = decode_name(&[0], 0).unwrap();
        assert_eq!(name, ".");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn decode_lowercases() {
        let wire = [&[7u8][..], b"EXAMPLE", &[3], b"CoM", &[0]].concat();
        let (name, _) = decode_name(&wire, 0).unwrap();
        assert_eq!(name, "example.com.");
    }

    #[test]
    fn decode_at_offset() {
        let wire = [&[0xFFu8, 0xFF][..], &[3], b"com", &[0]].concat();
        let (name, consumed) = decode_name(&wire, 2).unwrap();
        assert_eq!(name, "com.");
        assert_eq!(consumed, 5);
    }

    #[test]
    fn decode_pointer() {
        // "example.com." at offset 0, then a pointer back to it at 13.
        let mut wire = [&[7u8][..], b"example", &[3], b"com", &[0]].concat();
        wire.extend_from_slice(&[0xC0, 0x00]);
        let (name, consumed) = decode_name(&wire, 13).unwrap();
        assert_eq!(name, "example.com.");
        assert_eq!(consumed, 2);
    }

    #[test]
    fn decode_pointer_after_labels() {
        // "www" followed by a pointer to "example.com." at offset 0.
        let mut wire = [&[7u8][..], b"example", &[3], b"com", &[0]].concat();
        let start = wire.len();
        wire.extend_from_slice(&[3]);
        wire.extend_from_slice(b"www");
        wire.extend_from_slice(&[0xC0, 0x00]);
        let (name, consumed) = decode_name(&wire, start).unwrap();
        assert_eq!(name, "www.example.com.");
        assert_eq!(consumed, 6);
    }

    #[test]
    fn decode_pointer_loop_fails() {
        // Two pointers referring to each other.
        let wire = [0xC0, 0x02, 0xC0, 0x00];
        let err = decode_name(&wire, 0).unwrap_err();
        assert!(matches!(err, DnsError::MalformedName));
    }

    #[test]
    fn decode_reserved_bits_fail() {
        // 0x63 has top bits 01, a reserved combination.
        let wire = [0x63, b'a', b'b', 0x00];
        let err = decode_name(&wire, 0).unwrap_err();
        assert!(matches!(err, DnsError::MalformedName));
    }

    #[test]
    fn decode_overrun_fails() {
        // Length 5 with only two octets following.
        let wire = [0x05, b'a', b'b'];
        let err = decode_name(&wire, 0).unwrap_err();
        assert!(matches!(err, DnsError::MalformedName));
    }

    #[test]
    fn decode_255_octet_name() {
        // Four 62-octet labels plus one of 2: 4 * 63 + 3 = 255 wire octets
        // with the terminator, the largest legal name.
        let mut wire = Vec::new();
        for _ in 0..4 {
            wire.push(62);
            wire.extend_from_slice(&[b'x'; 62]);
        }
        wire.push(1);
        wire.push(b'y');
        wire.push(0);
        assert_eq!(wire.len(), 255);
        let (name, consumed) = decode_name(&wire, 0).unwrap();
        assert_eq!(consumed, 255);
        assert_eq!(name.len(), 4 * 63 + 2);
    }

    #[test]
    fn decode_overlong_name_fails() {
        // One more octet than the 255 limit allows.
        let mut wire = Vec::new();
        for _ in 0..4 {
            wire.push(62);
            wire.extend_from_slice(&[b'x'; 62]);
        }
        wire.push(2);
        wire.extend_from_slice(b"yz");
        wire.push(0);
        let err = decode_name(&wire, 0).unwrap_err();
        assert!(matches!(err, DnsError::MalformedName));
    }

    #[test]
    fn round_trip_is_canonical() {
        for input in ["Example.COM", "a.b.c.d", "localhost", "x.y."] {
            let wire = encode_name(input).unwrap();
            let (name, _) = decode_name(&wire, 0).unwrap();
            assert_eq!(name, normalize(&input.to_ascii_lowercase()));
        }
    }

    #[test]
    fn normalize_forms() {
        assert_eq!(normalize("Ads.Example"), "ads.example.");
        assert_eq!(normalize("ads.example."), "ads.example.");
    }
}
