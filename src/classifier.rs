//! Classifies raw scanned text into a typed [`ScanResult`].
//!
//! Classification is an ordered rule chain: each rule pairs a predicate with
//! an extractor, and the first rule whose predicate holds produces the result.
//! Text no rule claims becomes [`ScanResult::Text`].

use crate::config::Config;
use crate::domain::host_from_url;
use crate::error::Result;
use crate::models::{ScanResult, ScanTag};
use crate::payload::{parse_service, parse_vcard, parse_wifi};
use once_cell::sync::Lazy;
use regex::Regex;

/// The APK-hosting link recognized even when it does not end in `.apk`.
pub(crate) const DEFAULT_APK_URL: &str = "https://dl.scanlens.app/android/latest";

const WIFI_PREFIX: &str = "WIFI:";
const VCARD_PREFIX: &str = "BEGIN:VCARD";
const SERVICE_PREFIX: &str = "service:";

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9\s-]{10,}$")
        .expect("Failed to compile phone regex pattern. This should not happen.")
});

/// One step of the classification chain.
struct Rule {
    tag: ScanTag,
    matches: fn(&Classifier, &str) -> bool,
    extract: fn(&Classifier, &str) -> Result<ScanResult>,
}

/// Evaluated top to bottom; first match wins. WiFi and vCard prefixes are
/// checked ahead of the `@`/`.` email heuristic so that such a payload
/// containing an address keeps its own type. Service codes come last.
const RULES: &[Rule] = &[
    Rule {
        tag: ScanTag::Apk,
        matches: is_apk,
        extract: extract_apk,
    },
    Rule {
        tag: ScanTag::Url,
        matches: is_url,
        extract: extract_url,
    },
    Rule {
        tag: ScanTag::Wifi,
        matches: is_wifi,
        extract: extract_wifi,
    },
    Rule {
        tag: ScanTag::Contact,
        matches: is_vcard,
        extract: extract_vcard,
    },
    Rule {
        tag: ScanTag::Email,
        matches: is_email,
        extract: extract_email,
    },
    Rule {
        tag: ScanTag::Phone,
        matches: is_phone,
        extract: extract_phone,
    },
    Rule {
        tag: ScanTag::Service,
        matches: is_service,
        extract: extract_service,
    },
];

/// Stateless payload classifier. Holds only the configurable rule inputs.
#[derive(Debug, Clone)]
pub(crate) struct Classifier {
    known_apk_urls: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(vec![DEFAULT_APK_URL.to_string()])
    }
}

impl Classifier {
    pub(crate) fn new(known_apk_urls: Vec<String>) -> Self {
        Self { known_apk_urls }
    }

    pub(crate) fn from_config(config: &Config) -> Self {
        Self::new(config.known_apk_urls.clone())
    }

    /// Classifies one scanned payload.
    ///
    /// Callers are expected to reject blank input beforehand; an empty
    /// string still classifies as text.
    ///
    /// # Returns
    /// * `Ok(ScanResult)` for every input except the case below.
    /// * `Err(AppError::MalformedUrl)` if the APK or URL rule matched but the
    ///   text is not an absolute URL with a host.
    pub(crate) fn classify(&self, text: &str) -> Result<ScanResult> {
        for rule in RULES {
            if (rule.matches)(self, text) {
                tracing::debug!(target: "classify", "Matched rule '{}' for {:?}", rule.tag, text);
                return (rule.extract)(self, text);
            }
        }
        tracing::debug!(target: "classify", "No rule matched, falling back to text");
        Ok(ScanResult::text(text))
    }
}

fn is_apk(classifier: &Classifier, text: &str) -> bool {
    text.contains(".apk")
        || classifier
            .known_apk_urls
            .iter()
            .any(|url| !url.is_empty() && text.contains(url.as_str()))
}

fn is_url(_: &Classifier, text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

fn is_wifi(_: &Classifier, text: &str) -> bool {
    text.starts_with(WIFI_PREFIX)
}

fn is_vcard(_: &Classifier, text: &str) -> bool {
    text.starts_with(VCARD_PREFIX)
}

fn is_service(_: &Classifier, text: &str) -> bool {
    text.starts_with(SERVICE_PREFIX)
}

fn is_email(_: &Classifier, text: &str) -> bool {
    text.contains('@') && text.contains('.')
}

fn is_phone(_: &Classifier, text: &str) -> bool {
    PHONE_REGEX.is_match(text)
}

fn extract_apk(_: &Classifier, text: &str) -> Result<ScanResult> {
    Ok(ScanResult::Apk {
        content: text.to_string(),
        domain: host_from_url(text)?,
    })
}

fn extract_url(_: &Classifier, text: &str) -> Result<ScanResult> {
    Ok(ScanResult::Url {
        content: text.to_string(),
        domain: host_from_url(text)?,
    })
}

fn extract_wifi(_: &Classifier, text: &str) -> Result<ScanResult> {
    let fields = parse_wifi(&text[WIFI_PREFIX.len()..]);
    Ok(ScanResult::Wifi {
        content: text.to_string(),
        ssid: fields.ssid,
        password: fields.password,
        security: fields.security,
        hidden: fields.hidden,
    })
}

fn extract_vcard(_: &Classifier, text: &str) -> Result<ScanResult> {
    let fields = parse_vcard(text);
    Ok(ScanResult::Contact {
        content: text.to_string(),
        name: fields.name,
        email: fields.email,
        phone: fields.phone,
    })
}

fn extract_service(_: &Classifier, text: &str) -> Result<ScanResult> {
    let (service_type, content) = parse_service(&text[SERVICE_PREFIX.len()..]);
    Ok(ScanResult::Service {
        content,
        service_type,
    })
}

fn extract_email(_: &Classifier, text: &str) -> Result<ScanResult> {
    Ok(ScanResult::Email {
        content: text.to_string(),
        email: text.to_string(),
    })
}

fn extract_phone(_: &Classifier, text: &str) -> Result<ScanResult> {
    Ok(ScanResult::Phone {
        content: text.to_string(),
        phone: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn classify(text: &str) -> Result<ScanResult> {
        Classifier::default().classify(text)
    }

    #[test]
    fn test_apk_link() {
        let result = classify("https://example.com/app.apk").unwrap();
        assert_eq!(
            result,
            ScanResult::Apk {
                content: "https://example.com/app.apk".to_string(),
                domain: "example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_known_apk_host_without_extension() {
        let result = classify(DEFAULT_APK_URL).unwrap();
        assert_eq!(result.tag(), ScanTag::Apk);
        assert!(matches!(result, ScanResult::Apk { domain, .. } if domain == "dl.scanlens.app"));

        let custom = Classifier::new(vec!["https://files.example.org/build".to_string()]);
        let result = custom
            .classify("https://files.example.org/build?id=7")
            .unwrap();
        assert_eq!(result.tag(), ScanTag::Apk);
        assert_eq!(
            classify("https://files.example.org/build?id=7")
                .unwrap()
                .tag(),
            ScanTag::Url
        );
    }

    #[test]
    fn test_url() {
        let result = classify("https://example.com/page").unwrap();
        assert_eq!(
            result,
            ScanResult::Url {
                content: "https://example.com/page".to_string(),
                domain: "example.com".to_string(),
            }
        );
        assert_eq!(classify("http://localhost:3000").unwrap().tag(), ScanTag::Url);
    }

    #[test]
    fn test_email() {
        let result = classify("person@example.com").unwrap();
        assert_eq!(
            result,
            ScanResult::Email {
                content: "person@example.com".to_string(),
                email: "person@example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_email_heuristic_is_loose() {
        assert_eq!(
            classify("meet me @ the cafe. 5pm").unwrap().tag(),
            ScanTag::Email
        );
    }

    #[test]
    fn test_phone() {
        let result = classify("+1 555-123-4567").unwrap();
        assert_eq!(
            result,
            ScanResult::Phone {
                content: "+1 555-123-4567".to_string(),
                phone: "+1 555-123-4567".to_string(),
            }
        );
        assert_eq!(classify("0123456789").unwrap().tag(), ScanTag::Phone);
    }

    #[test]
    fn test_phone_too_short_or_invalid() {
        assert_eq!(classify("555-1234").unwrap().tag(), ScanTag::Text);
        assert_eq!(classify("++15551234567").unwrap().tag(), ScanTag::Text);
        assert_eq!(classify("555 123 456x").unwrap().tag(), ScanTag::Text);
    }

    #[test]
    fn test_wifi() {
        let result = classify("WIFI:S:MyNetwork;T:WPA;P:secret123;;").unwrap();
        match result {
            ScanResult::Wifi {
                ssid,
                password,
                security,
                ..
            } => {
                assert_eq!(ssid.as_deref(), Some("MyNetwork"));
                assert_eq!(password.as_deref(), Some("secret123"));
                assert_eq!(security.as_deref(), Some("WPA"));
            }
            other => panic!("expected wifi, got {:?}", other),
        }
    }

    #[test]
    fn test_wifi_without_password() {
        let result = classify("WIFI:S:Guest;T:nopass;;").unwrap();
        assert!(matches!(
            result,
            ScanResult::Wifi { password: None, ssid: Some(ref s), .. } if s == "Guest"
        ));
    }

    #[test]
    fn test_contact() {
        let card = "BEGIN:VCARD\nFN:Jane Doe\nEMAIL:jane@x.com\nTEL:555000";
        let result = classify(card).unwrap();
        assert_eq!(
            result,
            ScanResult::Contact {
                content: card.to_string(),
                name: Some("Jane Doe".to_string()),
                email: Some("jane@x.com".to_string()),
                phone: Some("555000".to_string()),
            }
        );
    }

    #[test]
    fn test_service() {
        let result = classify("service:laundry;machine=4;slot=2").unwrap();
        assert_eq!(
            result,
            ScanResult::Service {
                content: "machine=4;slot=2".to_string(),
                service_type: "laundry".to_string(),
            }
        );
    }

    #[test]
    fn test_plain_text() {
        let result = classify("plain text with no markers").unwrap();
        assert_eq!(result, ScanResult::text("plain text with no markers"));
        assert_eq!(classify("").unwrap(), ScanResult::text(""));
    }

    #[test]
    fn test_prefixes_are_case_sensitive() {
        assert_eq!(classify("wifi:S:Net;;").unwrap().tag(), ScanTag::Text);
        assert_eq!(classify("HTTPS://EXAMPLE.COM").unwrap().tag(), ScanTag::Text);
    }

    #[test]
    fn test_earlier_rule_shadows_later() {
        // URL before email
        assert_eq!(
            classify("https://example.com/u/me@example.com").unwrap().tag(),
            ScanTag::Url
        );
        // WiFi and vCard before email
        assert_eq!(
            classify("WIFI:S:me@home.net;P:x;;").unwrap().tag(),
            ScanTag::Wifi
        );
        // Email and phone before service
        assert_eq!(
            classify("service:mail;to=ops@example.com").unwrap().tag(),
            ScanTag::Email
        );
        assert_eq!(classify("service:mail;to=ops").unwrap().tag(), ScanTag::Service);
        // Email before phone is unreachable for digit-only strings, so check a mix
        assert_eq!(
            classify("555-123-4567@x.y").unwrap().tag(),
            ScanTag::Email
        );
        // APK before WiFi
        assert!(classify("WIFI:S:net.apk;;").is_err());
    }

    #[test]
    fn test_malformed_apk_text_fails() {
        let err = classify(".apk inside some notes").unwrap_err();
        assert!(matches!(err, AppError::MalformedUrl { ref input, .. } if input == ".apk inside some notes"));

        let err = classify("download app.apk here").unwrap_err();
        assert!(matches!(err, AppError::MalformedUrl { .. }));
    }

    #[test]
    fn test_malformed_url_fails() {
        assert!(matches!(
            classify("http://"),
            Err(AppError::MalformedUrl { .. })
        ));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let inputs = [
            "https://example.com/app.apk",
            "person@example.com",
            "WIFI:S:MyNetwork;T:WPA;P:secret123;;",
            "BEGIN:VCARD\nFN:Jane Doe\nEND:VCARD",
            "+1 555-123-4567",
            "just words",
        ];
        let classifier = Classifier::default();
        for input in inputs {
            assert_eq!(
                classifier.classify(input).unwrap(),
                classifier.classify(input).unwrap()
            );
        }
    }
}
