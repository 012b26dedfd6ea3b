//! Read-only view over a provider payload.
//!
//! ipinfo.io and ip-api.com name the same facts differently (`ip` vs `query`,
//! `loc` vs `lat`/`lon`, `country` as code vs name). [`IpDetails`] hides
//! those differences from the host.

use serde_json::Value;

use super::types::LookupData;
use crate::provider::ProviderId;

/// Flag shown when no two-letter country code is available.
pub const UNKNOWN_FLAG: &str = "🌐";

const IPINFO_DISPLAY_KEYS: &[(&str, &str)] = &[
    ("ip", "IP Address"),
    ("hostname", "Hostname"),
    ("org", "Organization"),
    ("city", "City"),
    ("region", "Region"),
    ("country", "Country"),
    ("loc", "Location"),
    ("postal", "Postal"),
    ("timezone", "Timezone"),
];

const IP_API_DISPLAY_KEYS: &[(&str, &str)] = &[
    ("query", "IP Address"),
    ("country", "Country"),
    ("regionName", "Region"),
    ("city", "City"),
    ("zip", "Postal"),
    ("lat", "Latitude"),
    ("lon", "Longitude"),
    ("timezone", "Timezone"),
    ("isp", "ISP"),
    ("org", "Organization"),
    ("as", "AS"),
];

/// Renders a scalar JSON value for display. Empty, zero, false and null
/// values render as `None`.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Fills in `loc` as `"<lat>, <lon>"` when the payload has coordinates but
/// no `loc` field.
pub fn normalize_location(data: &mut LookupData) {
    if data.get("loc").and_then(display_value).is_some() {
        return;
    }
    let lat = data.get("lat").and_then(display_value);
    let lon = data.get("lon").and_then(display_value);
    if let (Some(lat), Some(lon)) = (lat, lon) {
        data.insert("loc".to_string(), Value::String(format!("{}, {}", lat, lon)));
    }
}

/// Regional-indicator flag for a two-letter country code.
///
/// # Examples
///
/// ```
/// use ip_finder::lookup::flag_emoji;
///
/// assert_eq!(flag_emoji(Some("de")), "🇩🇪");
/// assert_eq!(flag_emoji(Some("Germany")), "🌐");
/// assert_eq!(flag_emoji(None), "🌐");
/// ```
pub fn flag_emoji(country_code: Option<&str>) -> String {
    let Some(code) = country_code else {
        return UNKNOWN_FLAG.to_string();
    };
    if code.chars().count() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return UNKNOWN_FLAG.to_string();
    }
    code.chars()
        .filter_map(|c| char::from_u32(0x1F1E6 + (c.to_ascii_uppercase() as u32 - 'A' as u32)))
        .collect()
}

/// Label/value rows shown in the details panel, in provider order.
///
/// Custom providers use the ip-api.com layout.
pub fn display_rows(data: &LookupData, provider: ProviderId) -> Vec<(&'static str, String)> {
    let keys = match provider {
        ProviderId::IpInfoIo => IPINFO_DISPLAY_KEYS,
        ProviderId::IpApiCom | ProviderId::Custom => IP_API_DISPLAY_KEYS,
    };
    keys.iter()
        .filter_map(|(key, label)| {
            data.get(*key)
                .and_then(display_value)
                .map(|value| (*label, value))
        })
        .collect()
}

/// `"VPN: Yes | Proxy: No | Tor: No | Hosting: No"` from a `privacy` object.
pub fn privacy_summary(data: &LookupData) -> Option<String> {
    let privacy = data.get("privacy")?.as_object()?;
    let flag = |key: &str| {
        if privacy.get(key).and_then(Value::as_bool).unwrap_or(false) {
            "Yes"
        } else {
            "No"
        }
    };
    Some(format!(
        "VPN: {} | Proxy: {} | Tor: {} | Hosting: {}",
        flag("vpn"),
        flag("proxy"),
        flag("tor"),
        flag("hosting")
    ))
}

/// Typed view over a successful lookup payload.
#[derive(Debug, Clone, Copy)]
pub struct IpDetails<'a> {
    data: &'a LookupData,
}

impl<'a> IpDetails<'a> {
    /// View over `data`.
    pub fn new(data: &'a LookupData) -> Self {
        Self { data }
    }

    fn text(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(display_value)
    }

    /// Public IP (`ip` on ipinfo.io, `query` on ip-api.com).
    pub fn ip(&self) -> Option<String> {
        self.text("ip").or_else(|| self.text("query"))
    }

    /// Country code, falling back to `country`.
    pub fn country_code(&self) -> Option<String> {
        self.text("countryCode").or_else(|| self.text("country"))
    }

    /// Flag emoji for the country code, or a globe when unknown.
    pub fn flag(&self) -> String {
        flag_emoji(self.country_code().as_deref())
    }

    /// `"lat,lon"` location, derived from `lat`/`lon` when `loc` is absent.
    pub fn location(&self) -> Option<String> {
        self.text("loc").or_else(|| {
            let lat = self.text("lat")?;
            let lon = self.text("lon")?;
            Some(format!("{}, {}", lat, lon))
        })
    }

    /// Organization or ISP.
    pub fn organization(&self) -> Option<String> {
        self.text("org").or_else(|| self.text("isp"))
    }

    /// City name.
    pub fn city(&self) -> Option<String> {
        self.text("city")
    }

    /// Region or state.
    pub fn region(&self) -> Option<String> {
        self.text("region").or_else(|| self.text("regionName"))
    }

    /// Postal code.
    pub fn postal(&self) -> Option<String> {
        self.text("postal").or_else(|| self.text("zip"))
    }

    /// IANA time zone.
    pub fn timezone(&self) -> Option<String> {
        self.text("timezone")
    }

    /// Short summary of the ipinfo.io privacy flags, if present.
    pub fn privacy_summary(&self) -> Option<String> {
        privacy_summary(self.data)
    }
}
