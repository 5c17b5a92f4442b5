// Data-URI handling for the captured selfie.
//
// The TUI stores the capture as `data:<mime>;base64,<payload>` so the whole
// wizard state stays JSON-serializable; this module converts between that
// form and raw bytes for the multipart upload.

use anyhow::Result;
use base64::Engine;

/// Decode a `data:` URI into `(mime_type, bytes)`.
pub fn decode(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow::anyhow!("Not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("Data URI has no payload separator"))?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    if !is_base64 {
        return Err(anyhow::anyhow!("Only base64-encoded data URIs are supported"));
    }
    let mime = if mime.is_empty() {
        "application/octet-stream".to_string()
    } else {
        mime.to_string()
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| anyhow::anyhow!("Invalid base64 payload: {}", e))?;
    if bytes.is_empty() {
        return Err(anyhow::anyhow!("Data URI payload is empty"));
    }
    Ok((mime, bytes))
}

/// Encode raw bytes as a base64 `data:` URI.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_jpeg_bytes() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        let uri = encode("image/jpeg", &bytes);
        let (mime, decoded) = decode(&uri).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn rejects_non_data_uris_and_empty_payloads() {
        assert!(decode("https://example.com/a.jpg").is_err());
        assert!(decode("data:image/jpeg;base64,").is_err());
        assert!(decode("data:image/jpeg,rawtext").is_err());
    }
}
