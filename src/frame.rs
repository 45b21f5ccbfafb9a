//! The vendor framing layer.
//!
//! Both directions use the same envelope:
//!
//! Section    | Bytes | Meaning
//! -----------|-------|--------------------------------------------------------
//! SOH STX    | 2     | Constant header `0x01 0x02`
//! length     | 2..   | ASCII decimal, total frame size *including these digits*
//! message    | n     | `|`-separated ASCII fields, starting with a `|`
//! ETX        | 1     | Constant terminator `0x03`
//! checksum   | 2     | XOR of SOH..ETX, as two lowercase hex digits
//!
//! The length field is self-referential: growing the length value by a digit
//! grows the frame, which can grow the length value. [`build_query`] resolves
//! it by fixed-point iteration.
//!
//! Responses are only loosely validated. The device is not known to emit a
//! verifiable checksum after ETX, so [`extract_message`] takes everything from
//! the first `|` to the first ETX and ignores any trailer.

use crate::error::Error;

pub(crate) const SOH: u8 = 0x01;
pub(crate) const STX: u8 = 0x02;
pub(crate) const ETX: u8 = 0x03;

const SEPARATOR: char = '|';

/// The strings that identify a meter/battery pair on the wire.
///
/// Hardware addresses must already be in the device's canonical form
/// (hex digits, no separators); no normalization happens here.
#[derive(Debug, Clone)]
pub struct QueryIdentity {
    /// Battery device type identifier, e.g. `HMG-50`.
    pub device_type: String,
    /// Battery hardware address.
    pub battery_mac: String,
    /// CT clamp type identifier, e.g. `HME-4`.
    pub ct_type: String,
    /// CT clamp hardware address.
    pub ct_mac: String,
}

/// Build the query frame for the given identity.
///
/// Deterministic and pure. Fails only if an identity string contains a
/// non-ASCII character, since the wire format is single-byte ASCII.
pub(crate) fn build_query(identity: &QueryIdentity) -> Result<Vec<u8>, Error> {
    let fields = [
        identity.device_type.as_str(),
        identity.battery_mac.as_str(),
        identity.ct_type.as_str(),
        identity.ct_mac.as_str(),
        // Two zero-value fields, meaning unknown but required by the device.
        "0",
        "0",
    ];

    let mut message = String::new();
    for field in fields {
        if !field.is_ascii() {
            return Err(Error::Encoding(field.to_owned()));
        }
        message.push(SEPARATOR);
        message.push_str(field);
    }

    // Frame size before the length digits themselves:
    // SOH + STX + message + ETX + two checksum digits.
    let base = 2 + message.len() + 1 + 2;
    let length = resolve_length(base);

    let mut frame = Vec::with_capacity(base + length.len());
    frame.push(SOH);
    frame.push(STX);
    frame.extend_from_slice(length.as_bytes());
    frame.extend_from_slice(message.as_bytes());
    frame.push(ETX);

    let checksum = xor_checksum(&frame);
    frame.extend_from_slice(hex::encode([checksum]).as_bytes());

    Ok(frame)
}

/// Find the length string for a frame whose size without the length digits
/// is `base`.
///
/// The embedded length counts its own digits, so we iterate
/// `total = base + digits(total)` until the string representation stops
/// changing. This terminates: the digit count of `base + k` for small `k`
/// can grow past a power of ten at most once, after which the total is fixed.
fn resolve_length(base: usize) -> String {
    let mut length = base.to_string();
    loop {
        let total = base + length.len();
        let next = total.to_string();
        if next == length {
            return length;
        }
        length = next;
    }
}

/// XOR of every byte in `data`.
pub(crate) fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, b| acc ^ b)
}

/// Extract the ASCII message of a response frame: the text from the first
/// `|` up to (excluding) the first ETX, leading `|` included.
pub(crate) fn extract_message(data: &[u8]) -> Result<&str, Error> {
    let etx = data
        .iter()
        .position(|&b| b == ETX)
        .ok_or(Error::MalformedFrame("ETX not found"))?;

    // Header bytes before the first separator (SOH, STX, length digits)
    // are not otherwise interpreted.
    let header = &data[..etx];
    let pipe = header
        .iter()
        .position(|&b| b == SEPARATOR as u8)
        .ok_or(Error::MalformedFrame("separator not found"))?;

    let message = &header[pipe..];
    if !message.is_ascii() {
        return Err(Error::MalformedFrame("invalid ascii"));
    }
    std::str::from_utf8(message).map_err(|_| Error::MalformedFrame("invalid ascii"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> QueryIdentity {
        QueryIdentity {
            device_type: "HMG-50".into(),
            battery_mac: "AABBCCDDEEFF".into(),
            ct_type: "HME-4".into(),
            ct_mac: "112233445566".into(),
        }
    }

    #[test]
    fn test_build_query_layout() {
        let frame = build_query(&identity()).unwrap();

        assert_eq!(&frame[..2], &[SOH, STX]);
        let message = b"|HMG-50|AABBCCDDEEFF|HME-4|112233445566|0|0";
        let pos = frame
            .windows(message.len())
            .position(|w| w == &message[..])
            .expect("message not embedded in frame");
        assert_eq!(frame[pos + message.len()], ETX);
        assert_eq!(pos + message.len() + 1 + 2, frame.len());
    }

    #[test]
    fn test_build_query_length_is_self_consistent() {
        let frame = build_query(&identity()).unwrap();

        let etx = frame.iter().position(|&b| b == ETX).unwrap();
        let pipe = frame.iter().position(|&b| b == b'|').unwrap();
        let length: usize = std::str::from_utf8(&frame[2..pipe])
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(length, frame.len());
        assert!(etx < frame.len());
    }

    #[test]
    fn test_build_query_checksum() {
        let frame = build_query(&identity()).unwrap();

        let etx = frame.iter().position(|&b| b == ETX).unwrap();
        let expected = xor_checksum(&frame[..=etx]);
        let embedded = hex::decode(&frame[etx + 1..]).unwrap();
        assert_eq!(embedded, [expected]);
        // XOR of the whole frame with the checksum byte folded back in is zero.
        assert_eq!(xor_checksum(&frame[..=etx]) ^ embedded[0], 0);
    }

    #[test]
    fn test_build_query_is_deterministic() {
        assert_eq!(build_query(&identity()).unwrap(), build_query(&identity()).unwrap());
    }

    #[test]
    fn test_build_query_rejects_non_ascii() {
        let mut id = identity();
        id.device_type = "Gerät".into();
        match build_query(&id) {
            Err(Error::Encoding(s)) => assert_eq!(s, "Gerät"),
            other => panic!("expected encoding error, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_length_fixed_point() {
        // Spot-check totals either side of a power of ten.
        for base in [1, 7, 8, 9, 95, 96, 97, 98, 996, 997, 998, 4242] {
            let length = resolve_length(base);
            let total: usize = length.parse().unwrap();
            assert_eq!(total, base + length.len(), "base {base}");
        }
    }

    #[test]
    fn test_extract_message() {
        let data = b"\x01\x0247|HMG-50|AABBCCDDEEFF\x03a5 trailing junk";
        let message = extract_message(data).unwrap();
        assert_eq!(message, "|HMG-50|AABBCCDDEEFF");
    }

    #[test]
    fn test_extract_message_no_etx() {
        match extract_message(b"\x01\x0247|HMG-50|AABBCCDDEEFF") {
            Err(Error::MalformedFrame(reason)) => assert_eq!(reason, "ETX not found"),
            other => panic!("expected malformed frame, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_message_no_separator() {
        match extract_message(b"\x01\x0247 no fields here \x03") {
            Err(Error::MalformedFrame(reason)) => assert_eq!(reason, "separator not found"),
            other => panic!("expected malformed frame, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_message_non_ascii() {
        match extract_message(b"\x01\x0247|HMG\xff50\x03") {
            Err(Error::MalformedFrame(reason)) => assert_eq!(reason, "invalid ascii"),
            other => panic!("expected malformed frame, got {other:?}"),
        }
    }
}
