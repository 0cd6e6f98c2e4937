//! Gzip decompression of origin payloads

use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::{Result, ViewerError};

/// Decompress a complete gzip payload
///
/// Truncated or corrupt input fails; a partially inflated buffer is never
/// returned.
pub fn gunzip(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.is_empty() {
        return Err(ViewerError::Decode("empty payload".to_string()));
    }

    let mut decoder = GzDecoder::new(payload);
    let mut out = Vec::with_capacity(payload.len() * 4);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ViewerError::Decode(e.to_string()))?;
    Ok(out)
}

/// Awaitable decompression stage
pub async fn decompress(payload: Vec<u8>) -> Result<Vec<u8>> {
    gunzip(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::gzip;

    #[test]
    fn test_gunzip_round_trip() {
        let packed = gzip(b"glTF payload bytes");
        assert_eq!(gunzip(&packed).unwrap(), b"glTF payload bytes");
    }

    #[test]
    fn test_truncated_payload_fails() {
        let packed = gzip(&[7u8; 4096]);
        let truncated = &packed[..packed.len() / 2];
        assert!(matches!(gunzip(truncated), Err(ViewerError::Decode(_))));
    }

    #[test]
    fn test_not_gzip_fails() {
        assert!(matches!(gunzip(b"plain text"), Err(ViewerError::Decode(_))));
        assert!(matches!(gunzip(&[]), Err(ViewerError::Decode(_))));
    }
}
