use axum::http::{header::USER_AGENT, HeaderMap};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

const RESET_TOKEN_BYTES: usize = 32;

/// Random single-use token handed to the user; only its digest is stored.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Client address as reported by the proxy in front of the service.
pub fn extract_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(',').next().unwrap_or(value).trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reset_tokens_are_unique_hex() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_stable_and_not_the_token() {
        let token = "abc123";
        assert_eq!(digest_token(token), digest_token(" abc123 "));
        assert_ne!(digest_token(token), token);
        assert_eq!(digest_token(token).len(), 64);
    }

    #[test]
    fn extract_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(extract_ip(&headers).as_deref(), Some("203.0.113.7"));

        headers.remove("x-forwarded-for");
        assert_eq!(extract_ip(&headers).as_deref(), Some("10.0.0.9"));
    }

    #[test]
    fn extract_user_agent_reads_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_user_agent(&headers), None);
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));
        assert_eq!(extract_user_agent(&headers).as_deref(), Some("curl/8.0"));
    }
}
