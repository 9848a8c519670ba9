//! Field extraction for the structured payload formats (WiFi, vCard, service codes).
//!
//! Fields are split on their raw delimiters. Escape sequences such as `\;`
//! are not interpreted.

/// Fields read from the part of a `WIFI:` payload after the prefix.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct WifiFields {
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub security: Option<String>,
    pub hidden: bool,
}

/// Fields read from a vCard.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct VcardFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Returns the value of the first field starting with `prefix`.
fn first_with_prefix<'a, I>(fields: I, prefix: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    fields
        .into_iter()
        .find_map(|field| field.strip_prefix(prefix))
        .map(str::to_string)
}

/// Parses the `;`-delimited field list following `WIFI:`.
pub(crate) fn parse_wifi(rest: &str) -> WifiFields {
    let fields: Vec<&str> = rest.split(';').collect();
    WifiFields {
        ssid: first_with_prefix(fields.iter().copied(), "S:"),
        password: first_with_prefix(fields.iter().copied(), "P:"),
        security: first_with_prefix(fields.iter().copied(), "T:"),
        hidden: first_with_prefix(fields.iter().copied(), "H:")
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
    }
}

/// Scans a vCard line by line. The first line carrying each prefix wins.
pub(crate) fn parse_vcard(text: &str) -> VcardFields {
    VcardFields {
        name: first_with_prefix(text.lines(), "FN:"),
        email: first_with_prefix(text.lines(), "EMAIL:"),
        phone: first_with_prefix(text.lines(), "TEL:"),
    }
}

/// Splits the part after `service:` into `(service_type, content)`.
pub(crate) fn parse_service(rest: &str) -> (String, String) {
    match rest.split_once(';') {
        Some((service_type, content)) => (service_type.to_string(), content.to_string()),
        None => (rest.to_string(), String::new()),
    }
}
