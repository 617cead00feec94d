use std::io::Read;

use anyhow::Result;
use axum::http::HeaderMap;
use flate2::read::GzDecoder;

use backend_domain::{CheckInRequest, RuntimeConfig};

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Decodes a check-in body, gunzipping it first when the client says so.
pub fn parse_check_in(headers: &HeaderMap, body: &[u8]) -> Result<CheckInRequest> {
    let content = maybe_gunzip(headers, body)?;
    let request: CheckInRequest = serde_json::from_str(&content)?;
    Ok(request)
}

fn maybe_gunzip(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    if let Some(encoding) = headers.get("Content-Encoding") {
        if encoding.to_str().unwrap_or("").trim().eq_ignore_ascii_case("gzip") {
            let mut decoder = GzDecoder::new(body);
            let mut out = String::new();
            decoder.read_to_string(&mut out)?;
            return Ok(out);
        }
    }
    Ok(String::from_utf8(body.to_vec())?)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const BODY: &str = r#"{"worker_id":"W1","latitude":28.7,"longitude":77.1,"device_fingerprint":"DEV-X"}"#;

    #[test]
    fn token_is_optional_until_configured() {
        let mut config = RuntimeConfig::default();
        let mut headers = HeaderMap::new();
        assert!(authorize(&config, &headers));

        config.api_token = Some("s3cret".to_string());
        assert!(!authorize(&config, &headers));

        headers.insert("Authorization", HeaderValue::from_static("Bearer wrong"));
        assert!(!authorize(&config, &headers));

        headers.insert("Authorization", HeaderValue::from_static("Bearer s3cret"));
        assert!(authorize(&config, &headers));
    }

    #[test]
    fn plain_and_gzip_bodies_parse_alike() {
        let plain = parse_check_in(&HeaderMap::new(), BODY.as_bytes()).expect("plain");
        assert_eq!(plain.worker_id, "W1");
        assert_eq!(plain.device_fingerprint.as_deref(), Some("DEV-X"));
        assert!(plain.check_in_time.is_none());

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(BODY.as_bytes()).expect("write");
        let compressed = encoder.finish().expect("finish");
        let mut headers = HeaderMap::new();
        headers.insert("Content-Encoding", HeaderValue::from_static("gzip"));
        let gz = parse_check_in(&headers, &compressed).expect("gzip");
        assert_eq!(gz.worker_id, plain.worker_id);
        assert_eq!(gz.latitude, plain.latitude);
    }

    #[test]
    fn garbage_bodies_are_rejected() {
        assert!(parse_check_in(&HeaderMap::new(), b"{not json").is_err());
        let mut headers = HeaderMap::new();
        headers.insert("Content-Encoding", HeaderValue::from_static("gzip"));
        assert!(parse_check_in(&headers, BODY.as_bytes()).is_err());
    }
}
