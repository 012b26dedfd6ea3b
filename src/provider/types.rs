//! Provider data structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::CUSTOM_URL_PLACEHOLDER;

/// Identifier of a geolocation provider, as stored in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// ipinfo.io
    IpInfoIo,
    /// ip-api.com
    IpApiCom,
    /// User-supplied URL template
    Custom,
}

impl ProviderId {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::IpInfoIo => "ipinfo.io",
            ProviderId::IpApiCom => "ip-api.com",
            ProviderId::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved geolocation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// ipinfo.io
    IpInfoIo,
    /// ip-api.com
    IpApiCom,
    /// URL template containing `%s` where the queried IP goes
    Custom(String),
}

impl Provider {
    /// Settings identifier of this provider.
    pub fn id(&self) -> ProviderId {
        match self {
            Provider::IpInfoIo => ProviderId::IpInfoIo,
            Provider::IpApiCom => ProviderId::IpApiCom,
            Provider::Custom(_) => ProviderId::Custom,
        }
    }
}

/// Request budget of a provider: at most `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    /// Bucket capacity
    pub max_requests: u32,
    /// Time in which a full bucket refills
    pub window: Duration,
}

impl RateBudget {
    /// Budget of `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Tokens regained per elapsed millisecond.
    pub fn refill_per_ms(&self) -> f64 {
        let window_ms = self.window.as_millis().max(1) as f64;
        f64::from(self.max_requests) / window_ms
    }
}

/// One lookup request: whose IP to query plus extra query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    /// IP to look up; `None` looks up the caller's own public IP
    pub target_ip: Option<String>,
    /// Extra `key=value` query parameters
    pub params: Vec<(String, String)>,
}

impl LookupRequest {
    /// Lookup of the caller's own public IP.
    pub fn own_ip() -> Self {
        Self::default()
    }

    /// Lookup of a specific IP.
    pub fn for_ip(ip: impl Into<String>) -> Self {
        Self {
            target_ip: Some(ip.into()),
            params: Vec::new(),
        }
    }

    /// Adds a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    fn target(&self) -> &str {
        self.target_ip.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Everything needed to query one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Which provider this is
    pub provider: Provider,
    /// Endpoint root (unused for custom providers, which carry a template)
    pub base_url: String,
    /// Value of the `fields` parameter restricting the returned JSON
    pub fields: Option<String>,
    /// API token appended as `token=`
    pub token: Option<String>,
    /// `None` disables rate limiting
    pub rate_budget: Option<RateBudget>,
}

impl ProviderConfig {
    /// Settings identifier of the provider.
    pub fn id(&self) -> ProviderId {
        self.provider.id()
    }

    /// Whether the payload carries a `status` field that may report `fail`.
    pub fn reports_status(&self) -> bool {
        self.provider == Provider::IpApiCom
    }

    /// Builds the full request URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use ip_finder::provider::{LookupRequest, ProviderRegistry, ProviderId};
    ///
    /// let registry = ProviderRegistry::new(false);
    /// let config = registry.get(ProviderId::IpInfoIo);
    /// assert_eq!(config.build_url(&LookupRequest::own_ip()), "https://ipinfo.io/json");
    /// assert_eq!(
    ///     config.build_url(&LookupRequest::for_ip("8.8.8.8")),
    ///     "https://ipinfo.io/8.8.8.8/json"
    /// );
    /// ```
    pub fn build_url(&self, request: &LookupRequest) -> String {
        let target = request.target();
        let base = self.base_url.trim_end_matches('/');
        let endpoint = match &self.provider {
            Provider::IpInfoIo if target.is_empty() => format!("{}/json", base),
            Provider::IpInfoIo => format!("{}/{}/json", base, target),
            Provider::IpApiCom => format!("{}/{}", base, target),
            Provider::Custom(template) => template.replace(CUSTOM_URL_PLACEHOLDER, target),
        };

        let query = self.build_query(&request.params);
        if query.is_empty() {
            endpoint
        } else if endpoint.contains('?') {
            format!("{}&{}", endpoint, query)
        } else {
            format!("{}?{}", endpoint, query)
        }
    }

    /// Percent-encodes request parameters plus the provider's own parameters.
    pub fn build_query(&self, params: &[(String, String)]) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            serializer.append_pair(key, value);
        }
        if let Some(fields) = &self.fields {
            serializer.append_pair("fields", fields);
        }
        if let Some(token) = &self.token {
            serializer.append_pair("token", token);
        }
        serializer.finish()
    }

    /// URL without query string, safe to log.
    pub fn redacted_url(&self, request: &LookupRequest) -> String {
        let url = self.build_url(request);
        match url.split_once('?') {
            Some((endpoint, _)) => endpoint.to_string(),
            None => url,
        }
    }
}
