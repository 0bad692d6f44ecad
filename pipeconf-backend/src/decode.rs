use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pipeconf_core::FetchError;

/// Standard-alphabet base64 decode. Line breaks are ignored, as hosting APIs
/// wrap long payloads.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, FetchError> {
    let compact: String = encoded.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| FetchError::Decode(format!("invalid base64: {}", e)))
}

pub fn into_text(bytes: Vec<u8>) -> Result<String, FetchError> {
    String::from_utf8(bytes).map_err(|e| FetchError::Decode(format!("content is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_with_line_breaks() {
        let bytes = decode_base64("c3RlcHM6CiAg\nLSBuYW1lOiBi\r\ndWlsZA==\n").unwrap();
        assert_eq!(into_text(bytes).unwrap(), "steps:\n  - name: build");
    }

    #[test]
    fn test_decode_base64_rejects_garbage() {
        assert!(matches!(decode_base64("not base64!"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_into_text_rejects_invalid_utf8() {
        assert!(matches!(into_text(vec![0xff, 0xfe, 0x00]), Err(FetchError::Decode(_))));
    }
}
