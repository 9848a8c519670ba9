//! Defines the core data structures used in the scanlens application.

use crate::actions::ScanAction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of categories a scanned payload can be classified into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ScanTag {
    Apk,
    Url,
    Email,
    Phone,
    Wifi,
    Contact,
    Service,
    Text,
}

impl ScanTag {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ScanTag::Apk => "apk",
            ScanTag::Url => "url",
            ScanTag::Email => "email",
            ScanTag::Phone => "phone",
            ScanTag::Wifi => "wifi",
            ScanTag::Contact => "contact",
            ScanTag::Service => "service",
            ScanTag::Text => "text",
        }
    }
}

impl fmt::Display for ScanTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The typed result of classifying one scanned payload.
/// Exactly one variant is produced per scan; optional metadata is `None`
/// when the payload did not carry the corresponding field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ScanResult {
    /// A link to an installable Android package.
    Apk { content: String, domain: String },
    /// An http(s) link.
    Url { content: String, domain: String },
    Email { content: String, email: String },
    Phone { content: String, phone: String },
    /// A `WIFI:` network configuration payload.
    Wifi {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        ssid: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        password: Option<String>,
        /// Authentication type from the `T:` field (WPA, WEP, nopass).
        #[serde(skip_serializing_if = "Option::is_none", default)]
        security: Option<String>,
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        hidden: bool,
    },
    /// A `BEGIN:VCARD` contact card.
    Contact {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        email: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        phone: Option<String>,
    },
    /// A `service:` code; `content` holds everything after the service type.
    Service {
        content: String,
        #[serde(rename = "serviceType")]
        service_type: String,
    },
    Text { content: String },
}

impl ScanResult {
    pub(crate) fn tag(&self) -> ScanTag {
        match self {
            ScanResult::Apk { .. } => ScanTag::Apk,
            ScanResult::Url { .. } => ScanTag::Url,
            ScanResult::Email { .. } => ScanTag::Email,
            ScanResult::Phone { .. } => ScanTag::Phone,
            ScanResult::Wifi { .. } => ScanTag::Wifi,
            ScanResult::Contact { .. } => ScanTag::Contact,
            ScanResult::Service { .. } => ScanTag::Service,
            ScanResult::Text { .. } => ScanTag::Text,
        }
    }

    /// The `content` field shared by every variant.
    pub(crate) fn content(&self) -> &str {
        match self {
            ScanResult::Apk { content, .. }
            | ScanResult::Url { content, .. }
            | ScanResult::Email { content, .. }
            | ScanResult::Phone { content, .. }
            | ScanResult::Wifi { content, .. }
            | ScanResult::Contact { content, .. }
            | ScanResult::Service { content, .. }
            | ScanResult::Text { content } => content,
        }
    }

    /// The heading a result view shows for this kind of payload.
    pub(crate) fn title(&self) -> &'static str {
        match self {
            ScanResult::Apk { .. } => "Android App",
            ScanResult::Url { .. } => "Website",
            ScanResult::Email { .. } => "Email Address",
            ScanResult::Phone { .. } => "Phone Number",
            ScanResult::Wifi { .. } => "WiFi Network",
            ScanResult::Contact { .. } => "Contact",
            ScanResult::Service { .. } => "Service Code",
            ScanResult::Text { .. } => "Text",
        }
    }

    pub(crate) fn text(content: impl Into<String>) -> Self {
        ScanResult::Text {
            content: content.into(),
        }
    }
}

/// A product that can be matched by scanning its serial number.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Product {
    /// The serial number printed in the product's barcode.
    pub serial: String,
    pub name: String,
    pub price: f64,
}

/// A line in the shopping cart.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl CartItem {
    pub(crate) fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Represents the output for one processed scan: the raw input, its
/// classification and the follow-up the user is offered.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct ScanRecord {
    /// The raw decoded text as received from the capture device.
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ScanAction>,
    /// Catalog product whose serial equals the scanned text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,

    // Status/Error fields
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    #[serde(default)]
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Set when classification failed and the payload was degraded to text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_result_serializes_with_type_tag() {
        let result = ScanResult::Url {
            content: "https://example.com".to_string(),
            domain: "example.com".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "url");
        assert_eq!(json["domain"], "example.com");
    }

    #[test]
    fn test_absent_metadata_is_omitted() {
        let result = ScanResult::Wifi {
            content: "WIFI:S:Home;;".to_string(),
            ssid: Some("Home".to_string()),
            password: None,
            security: None,
            hidden: false,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ssid"], "Home");
        assert!(json.get("password").is_none());
        assert!(json.get("hidden").is_none());
    }

    #[test]
    fn test_service_type_field_name() {
        let result = ScanResult::Service {
            content: "slot=4".to_string(),
            service_type: "laundry".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "service");
        assert_eq!(json["serviceType"], "laundry");
    }

    #[test]
    fn test_cart_item_line_total() {
        let item = CartItem {
            product_id: "4006381333931".to_string(),
            name: "Pen".to_string(),
            price: 1.5,
            quantity: 3,
        };
        assert!((item.line_total() - 4.5).abs() < f64::EPSILON);
    }
}
