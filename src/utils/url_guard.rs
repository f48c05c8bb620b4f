//! Destination URL validation, including the SSRF guard.
//!
//! Every destination accepted by the service goes through [`validate_long_url`]
//! so the engine never mints a link pointing at internal infrastructure.

use std::net::IpAddr;

use serde_json::json;
use url::{Host, Url};

use crate::error::AppError;

/// Hostname fragments rejected outright when the host is not a literal IP.
const BLOCKED_HOST_FRAGMENTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0"];

/// Validates a destination URL for link creation or update.
///
/// # Rules
///
/// 1. Must parse as an absolute URL
/// 2. Scheme must be exactly `http` or `https`
/// 3. Literal IP hosts must not be private, loopback, link-local,
///    multicast, or unspecified
/// 4. Hostname hosts must not textually contain `localhost`, `127.0.0.1`,
///    or `0.0.0.0`
/// 5. The raw input must not carry a `file://` prefix or a `javascript:`
///    payload anywhere in the string
///
/// # Errors
///
/// Returns [`AppError::Validation`] describing the violated rule. The full
/// URL is never echoed into error details.
pub fn validate_long_url(raw: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(raw)
        .map_err(|e| AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() })))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::bad_request(
                "Invalid URL scheme: only http and https allowed",
                json!({ "scheme": scheme }),
            ));
        }
    }

    match parsed.host() {
        Some(Host::Ipv4(addr)) => check_ip(IpAddr::V4(addr))?,
        Some(Host::Ipv6(addr)) => check_ip(IpAddr::V6(addr))?,
        Some(Host::Domain(domain)) => check_hostname(domain)?,
        None => {
            return Err(AppError::bad_request(
                "Invalid URL: missing host",
                json!({}),
            ));
        }
    }

    if raw.starts_with("file://") || raw.contains("javascript:") {
        return Err(AppError::bad_request(
            "Invalid URL: disallowed protocol or scheme",
            json!({}),
        ));
    }

    Ok(parsed)
}

fn check_ip(ip: IpAddr) -> Result<(), AppError> {
    let blocked = match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
                || v6.is_multicast()
                || v6.is_unspecified()
        }
    };

    if blocked {
        return Err(AppError::bad_request(
            "Invalid URL: private, loopback, or reserved addresses not allowed",
            json!({}),
        ));
    }

    Ok(())
}

fn check_hostname(host: &str) -> Result<(), AppError> {
    let lowered = host.to_ascii_lowercase();

    if BLOCKED_HOST_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
    {
        return Err(AppError::bad_request(
            "Invalid URL: localhost or zero address not allowed",
            json!({}),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rejected(raw: &str) {
        let result = validate_long_url(raw);
        assert!(
            matches!(result, Err(AppError::Validation { .. })),
            "expected {} to be rejected",
            raw
        );
    }

    #[test]
    fn test_accepts_public_http_and_https() {
        assert!(validate_long_url("https://example.com/path?q=1").is_ok());
        assert!(validate_long_url("http://example.com").is_ok());
        assert!(validate_long_url("https://sub.example.co.uk:8443/a/b").is_ok());
        assert!(validate_long_url("http://93.184.216.34/page").is_ok());
    }

    #[test]
    fn test_rejects_unparseable() {
        assert_rejected("not a url");
        assert_rejected("");
        assert_rejected("example.com/no-scheme");
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert_rejected("ftp://example.com/file");
        assert_rejected("data:text/plain,hello");
        assert_rejected("mailto:user@example.com");
    }

    #[test]
    fn test_rejects_loopback_and_unspecified() {
        assert_rejected("http://127.0.0.1/admin");
        assert_rejected("http://127.0.0.53:53/");
        assert_rejected("http://0.0.0.0:8080/");
        assert_rejected("http://[::1]/");
    }

    #[test]
    fn test_rejects_private_ranges() {
        assert_rejected("http://10.0.0.1/");
        assert_rejected("http://172.16.5.4/internal");
        assert_rejected("http://192.168.1.1/router");
        assert_rejected("http://[fd00::1]/");
    }

    #[test]
    fn test_rejects_link_local_and_multicast() {
        assert_rejected("http://169.254.169.254/latest/meta-data");
        assert_rejected("http://224.0.0.1/");
        assert_rejected("http://[fe80::1]/");
        assert_rejected("http://[ff02::1]/");
    }

    #[test]
    fn test_rejects_localhost_hostnames() {
        assert_rejected("http://localhost/");
        assert_rejected("http://localhost:3000/dev");
        assert_rejected("http://LOCALHOST/");
        assert_rejected("http://my.localhost.evil.com/");
    }

    #[test]
    fn test_rejects_embedded_javascript() {
        assert_rejected("http://example.com/javascript:alert(1)");
        assert_rejected("https://example.com/?next=javascript:void(0)");
    }

    #[test]
    fn test_file_scheme_rejected() {
        // Caught by the scheme whitelist before the raw prefix check.
        assert_rejected("file:///etc/passwd");
    }
}
