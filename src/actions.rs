//! Derives the follow-up action offered for a classified scan.

use crate::models::{Product, ScanResult};
use serde::{Deserialize, Serialize};

/// What the result view lets the user do next.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum ScanAction {
    OpenLink { url: String },
    ComposeEmail { mailto: String },
    Dial { tel: String },
    JoinWifi {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        ssid: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        password: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        security: Option<String>,
    },
    SaveContact {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        email: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        phone: Option<String>,
    },
    /// Hand the link to the package downloader.
    InstallApk { url: String },
    OpenService {
        service_type: String,
        payload: String,
    },
    AddToCart { product: Product },
    CopyText { text: String },
}

/// Strips the separators the phone heuristic tolerates, keeping a leading `+`.
fn dial_string(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Picks the action for a result. A catalog match takes precedence for
/// plain text and phone-like serials, since barcodes on products decode to
/// digit strings.
pub(crate) fn action_for(result: &ScanResult, product: Option<&Product>) -> ScanAction {
    if let Some(product) = product {
        if matches!(result, ScanResult::Text { .. } | ScanResult::Phone { .. }) {
            return ScanAction::AddToCart {
                product: product.clone(),
            };
        }
    }

    match result {
        ScanResult::Apk { content, .. } => ScanAction::InstallApk {
            url: content.clone(),
        },
        ScanResult::Url { content, .. } => ScanAction::OpenLink {
            url: content.clone(),
        },
        ScanResult::Email { email, .. } => ScanAction::ComposeEmail {
            mailto: format!("mailto:{}", email),
        },
        ScanResult::Phone { phone, .. } => ScanAction::Dial {
            tel: format!("tel:{}", dial_string(phone)),
        },
        ScanResult::Wifi {
            ssid,
            password,
            security,
            ..
        } => ScanAction::JoinWifi {
            ssid: ssid.clone(),
            password: password.clone(),
            security: security.clone(),
        },
        ScanResult::Contact {
            name, email, phone, ..
        } => ScanAction::SaveContact {
            name: name.clone(),
            email: email.clone(),
            phone: phone.clone(),
        },
        ScanResult::Service {
            content,
            service_type,
        } => ScanAction::OpenService {
            service_type: service_type.clone(),
            payload: content.clone(),
        },
        ScanResult::Text { content } => ScanAction::CopyText {
            text: content.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_and_phone_actions() {
        let email = ScanResult::Email {
            content: "a@b.co".to_string(),
            email: "a@b.co".to_string(),
        };
        assert_eq!(
            action_for(&email, None),
            ScanAction::ComposeEmail {
                mailto: "mailto:a@b.co".to_string()
            }
        );

        let phone = ScanResult::Phone {
            content: "+1 555-123-4567".to_string(),
            phone: "+1 555-123-4567".to_string(),
        };
        assert_eq!(
            action_for(&phone, None),
            ScanAction::Dial {
                tel: "tel:+15551234567".to_string()
            }
        );
    }

    #[test]
    fn test_apk_goes_to_installer() {
        let apk = ScanResult::Apk {
            content: "https://example.com/app.apk".to_string(),
            domain: "example.com".to_string(),
        };
        assert_eq!(
            action_for(&apk, None),
            ScanAction::InstallApk {
                url: "https://example.com/app.apk".to_string()
            }
        );
    }

    #[test]
    fn test_product_match_adds_to_cart() {
        let product = Product {
            serial: "4006381333931".to_string(),
            name: "Highlighter".to_string(),
            price: 2.49,
        };
        let serial = ScanResult::Phone {
            content: "4006381333931".to_string(),
            phone: "4006381333931".to_string(),
        };
        assert_eq!(
            action_for(&serial, Some(&product)),
            ScanAction::AddToCart {
                product: product.clone()
            }
        );

        let url = ScanResult::Url {
            content: "https://example.com".to_string(),
            domain: "example.com".to_string(),
        };
        assert!(matches!(
            action_for(&url, Some(&product)),
            ScanAction::OpenLink { .. }
        ));
    }

    #[test]
    fn test_action_serializes_with_tag() {
        let action = action_for(&ScanResult::text("hello"), None);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "copy_text");
        assert_eq!(json["text"], "hello");
    }
}
