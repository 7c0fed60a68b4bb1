// copyright 2017 Kaz Wesley

//! Hex text at the API boundary.

use crate::algo::Params;
use crate::error::{Error, Result};

/// Two digits per byte, either case.
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| Error::InvalidEncoding(e.to_string()))
}

/// Lowercase, two digits per byte.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Hash a hex-encoded blob, returning the digest as hex.
pub fn hash_hex(input: &str, params: &Params) -> Result<String> {
    let blob = decode_hex(input)?;
    Ok(encode_hex(&crate::hash(&blob, params)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_is_strict() {
        assert_eq!(decode_hex("00ffAb").unwrap(), vec![0x00, 0xff, 0xab]);
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert!(matches!(decode_hex("abc"), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode_hex("zz"), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode_hex("0x00"), Err(Error::InvalidEncoding(_))));
    }

    #[test]
    fn encode_is_lowercase() {
        assert_eq!(encode_hex(&[0xde, 0xad, 0x01]), "dead01");
        assert_eq!(encode_hex(&[]), "");
    }

    #[test]
    fn decode_inverts_encode() {
        let every_byte: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_hex(&encode_hex(&every_byte)).unwrap(), every_byte);
        assert_eq!(
            decode_hex(&encode_hex(&every_byte).to_uppercase()).unwrap(),
            every_byte
        );
        let mut x = 0x9e37_79b9u32;
        for len in 0..=130 {
            let buf: Vec<u8> = (0..len)
                .map(|_| {
                    x ^= x << 13;
                    x ^= x >> 17;
                    x ^= x << 5;
                    x as u8
                })
                .collect();
            let text = encode_hex(&buf);
            assert_eq!(text.len(), 2 * len);
            assert_eq!(decode_hex(&text).unwrap(), buf);
        }
        for fill in &[0x00u8, 0xff] {
            let buf = vec![*fill; 64];
            assert_eq!(decode_hex(&encode_hex(&buf)).unwrap(), buf);
        }
    }

    #[test]
    fn hash_hex_rejects_bad_text_before_hashing() {
        assert!(matches!(
            hash_hex("6", &Params::default()),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            hash_hex("", &Params::default()),
            Err(Error::InvalidInputLength { len: 0, .. })
        ));
    }
}
