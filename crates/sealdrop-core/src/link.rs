//! Capability link codec.
//!
//! A capability link is `https://<host>/<id>#<b64 key>.<b64 nonce>.<b64 checksum>`.
//! The object id travels in the URL path (visible to the server); the key
//! material travels only in the fragment, which user agents never transmit,
//! so the server can never see it. Possession of the full link is the sole
//! access-control mechanism.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::checksum::{LinkChecksum, CHECKSUM_LEN};
use crate::crypto::{FileKey, FileNonce, KEY_LEN, NONCE_LEN};
use crate::AppError;

const SEGMENT_SEPARATOR: char = '.';

/// Characters escaped when the object id is placed in the URL path.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/');

/// Key material carried in the URL fragment. Never persisted server-side and
/// never sent in any HTTP request by a conforming client.
#[derive(Clone, PartialEq, Eq)]
pub struct CapabilityLinkPayload {
    pub key: FileKey,
    pub nonce: FileNonce,
    pub checksum: LinkChecksum,
}

impl std::fmt::Debug for CapabilityLinkPayload {
    // Key bytes stay out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityLinkPayload")
            .field("key", &"<redacted>")
            .field("nonce", &"<redacted>")
            .field("checksum", &hex_string(&self.checksum))
            .finish()
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A capability link split back into its server-visible and fragment parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLink {
    pub id: String,
    pub payload: CapabilityLinkPayload,
}

/// Encode the payload as the three-segment base64 fragment.
pub fn encode_fragment(payload: &CapabilityLinkPayload) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        STANDARD.encode(payload.key),
        STANDARD.encode(payload.nonce),
        STANDARD.encode(payload.checksum),
        sep = SEGMENT_SEPARATOR,
    )
}

/// Decode a fragment. Only the exact three-segment shape with the exact
/// decoded lengths is accepted; anything else is `MalformedLink`.
pub fn decode_fragment(fragment: &str) -> Result<CapabilityLinkPayload, AppError> {
    let segments: Vec<&str> = fragment.split(SEGMENT_SEPARATOR).collect();
    if segments.len() != 3 {
        return Err(AppError::MalformedLink(format!(
            "expected 3 fragment segments, found {}",
            segments.len()
        )));
    }

    let key = decode_segment::<KEY_LEN>(segments[0], "key")?;
    let nonce = decode_segment::<NONCE_LEN>(segments[1], "nonce")?;
    let checksum = decode_segment::<CHECKSUM_LEN>(segments[2], "checksum")?;

    Ok(CapabilityLinkPayload {
        key,
        nonce,
        checksum,
    })
}

fn decode_segment<const N: usize>(segment: &str, what: &str) -> Result<[u8; N], AppError> {
    let bytes = STANDARD
        .decode(segment)
        .map_err(|_| AppError::MalformedLink(format!("{} segment is not valid base64", what)))?;
    <[u8; N]>::try_from(bytes).map_err(|_| {
        AppError::MalformedLink(format!("{} segment has the wrong length", what))
    })
}

/// Build the full shareable link: id in the path, key material in the fragment.
pub fn build_url(origin: &str, id: &str, payload: &CapabilityLinkPayload) -> String {
    format!(
        "{}/{}#{}",
        origin.trim_end_matches('/'),
        utf8_percent_encode(id, PATH_SEGMENT),
        encode_fragment(payload),
    )
}

/// Parse a full capability link back into id + payload.
pub fn parse_url(url: &str) -> Result<ParsedLink, AppError> {
    let (base, fragment) = url
        .split_once('#')
        .ok_or_else(|| AppError::MalformedLink("link has no fragment".to_string()))?;

    let path = base.split('?').next().unwrap_or(base);
    let raw_id = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    if raw_id.is_empty() {
        return Err(AppError::MalformedLink(
            "link carries no object id".to_string(),
        ));
    }

    let id = percent_decode_str(raw_id)
        .decode_utf8()
        .map_err(|_| AppError::MalformedLink("object id is not valid UTF-8".to_string()))?
        .into_owned();

    Ok(ParsedLink {
        id,
        payload: decode_fragment(fragment)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CapabilityLinkPayload {
        CapabilityLinkPayload {
            key: [0x11; KEY_LEN],
            nonce: [0x22; NONCE_LEN],
            checksum: [0x33; CHECKSUM_LEN],
        }
    }

    #[test]
    fn test_fragment_round_trip() {
        let original = payload();
        let decoded = decode_fragment(&encode_fragment(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_fragment_rejects_wrong_segment_count() {
        for fragment in ["", "onlyone", "two.segments", "a.b.c.d"] {
            assert!(
                matches!(decode_fragment(fragment), Err(AppError::MalformedLink(_))),
                "should reject {:?}",
                fragment
            );
        }
    }

    #[test]
    fn test_fragment_rejects_bad_base64() {
        let fragment = format!("!!!.{}.{}", STANDARD.encode([0u8; NONCE_LEN]), STANDARD.encode([0u8; CHECKSUM_LEN]));
        assert!(matches!(
            decode_fragment(&fragment),
            Err(AppError::MalformedLink(_))
        ));
    }

    #[test]
    fn test_fragment_rejects_wrong_lengths() {
        // Valid base64, but a 16-byte key where 32 is required.
        let fragment = format!(
            "{}.{}.{}",
            STANDARD.encode([0u8; 16]),
            STANDARD.encode([0u8; NONCE_LEN]),
            STANDARD.encode([0u8; CHECKSUM_LEN]),
        );
        assert!(matches!(
            decode_fragment(&fragment),
            Err(AppError::MalformedLink(_))
        ));
    }

    #[test]
    fn test_url_round_trip() {
        let url = build_url(
            "https://files.example.com/",
            "0f8fad5b-d9cb-469f-a165-70867728950e",
            &payload(),
        );
        assert!(url.starts_with(
            "https://files.example.com/0f8fad5b-d9cb-469f-a165-70867728950e#"
        ));

        let parsed = parse_url(&url).unwrap();
        assert_eq!(parsed.id, "0f8fad5b-d9cb-469f-a165-70867728950e");
        assert_eq!(parsed.payload, payload());
    }

    #[test]
    fn test_url_without_fragment_is_malformed() {
        assert!(matches!(
            parse_url("https://files.example.com/some-id"),
            Err(AppError::MalformedLink(_))
        ));
    }

    #[test]
    fn test_flipped_character_in_key_segment_changes_payload() {
        let url = build_url("https://files.example.com", "id-1", &payload());
        let (base, fragment) = url.split_once('#').unwrap();
        let mut chars: Vec<char> = fragment.chars().collect();
        // Flip one character inside the key segment.
        chars[1] = if chars[1] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        match parse_url(&format!("{}#{}", base, tampered)) {
            // Either the base64 no longer parses...
            Err(AppError::MalformedLink(_)) => {}
            // ...or it parses to a different key, which the checksum layer catches.
            Ok(parsed) => assert_ne!(parsed.payload.key, payload().key),
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
}
