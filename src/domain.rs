//! Host extraction for link-like scan payloads.

use crate::error::{AppError, Result};
use url::Url;

/// Extracts the host name (e.g., "example.com") from an absolute URL string.
///
/// Unlike a browser address bar, no scheme is assumed: the scanned text must
/// already be an absolute URL.
///
/// # Arguments
/// * `text` - The scanned text that matched the APK or URL rule.
///
/// # Returns
/// * `Ok(String)` containing the host as normalized by the URL parser.
/// * `Err(AppError::MalformedUrl)` if the text cannot be parsed or has no host.
pub(crate) fn host_from_url(text: &str) -> Result<String> {
    tracing::debug!("Attempting to extract host from: {}", text);

    let url = Url::parse(text).map_err(|e| {
        tracing::debug!("Failed to parse '{}' as an absolute URL: {}", text, e);
        AppError::MalformedUrl {
            input: text.to_string(),
            reason: e.to_string(),
        }
    })?;

    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(|| {
        tracing::debug!("Parsed URL has no host: {}", text);
        AppError::MalformedUrl {
            input: text.to_string(),
            reason: "URL has no host".to_string(),
        }
    })?;

    tracing::debug!("Extracted host '{}' from '{}'", host, text);
    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_from_url_simple() {
        assert_eq!(
            host_from_url("https://example.com/page").unwrap(),
            "example.com"
        );
        assert_eq!(
            host_from_url("http://www.example.com").unwrap(),
            "www.example.com"
        );
    }

    #[test]
    fn test_host_from_url_edge_cases() {
        assert_eq!(
            host_from_url("https://EXAMPLE.com/path?query=1").unwrap(),
            "example.com"
        );
        assert_eq!(
            host_from_url("http://example.com:8080/app.apk").unwrap(),
            "example.com"
        );
        assert_eq!(
            host_from_url("https://sub.domain.example.co.uk").unwrap(),
            "sub.domain.example.co.uk"
        );
    }

    #[test]
    fn test_host_from_url_invalid() {
        assert!(matches!(
            host_from_url("example.com"),
            Err(AppError::MalformedUrl { .. })
        ));
        assert!(host_from_url("http://").is_err());
        assert!(host_from_url("").is_err());
        assert!(host_from_url("mailto:someone.apk").is_err());
    }
}
