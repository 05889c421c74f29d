use std::net::Ipv4Addr;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Standard alphabet, padding optional; guest metadata is written both ways.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes a base64 address payload into an IPv4 address.
///
/// Four bytes are taken as-is. Sixteen bytes are an IPv6-mapped address and
/// the IPv4 part is the last four. Any other length is rejected.
pub fn decode_client_address(encoded: &str) -> Result<Ipv4Addr, String> {
    let bytes = LENIENT
        .decode(encoded.trim())
        .map_err(|e| format!("invalid base64: {e}"))?;

    let octets: [u8; 4] = match bytes.len() {
        4 => [bytes[0], bytes[1], bytes[2], bytes[3]],
        16 => [bytes[12], bytes[13], bytes[14], bytes[15]],
        n => return Err(format!("expected 4 or 16 bytes, got {n}")),
    };
    Ok(Ipv4Addr::from(octets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_byte_form() {
        assert_eq!(
            decode_client_address("ChFtcg==").unwrap().to_string(),
            "10.17.109.114"
        );
    }

    #[test]
    fn mapped_sixteen_byte_form_uses_last_four() {
        assert_eq!(
            decode_client_address("AAAAAAAAAAAAAP//wKhkFg==").unwrap().to_string(),
            "192.168.100.22"
        );
    }

    #[test]
    fn accepts_missing_padding() {
        assert_eq!(
            decode_client_address("ChFtcg").unwrap(),
            Ipv4Addr::new(10, 17, 109, 114)
        );
    }

    #[test]
    fn rejects_bad_lengths_and_garbage() {
        // 5 bytes
        assert!(decode_client_address("AQIDBAU=").unwrap_err().contains("got 5"));
        assert!(decode_client_address("not base64!").is_err());
        assert!(decode_client_address("").unwrap_err().contains("got 0"));
    }
}
