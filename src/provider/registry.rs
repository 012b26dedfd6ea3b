//! Provider registry.
//!
//! Maps provider ids to endpoints, query fields and rate budgets, and
//! resolves the provider selected in settings.

use log::{debug, warn};

use super::types::{Provider, ProviderConfig, ProviderId, RateBudget};
use crate::config::{
    WidgetSettings, FORCE_HTTPS_ENV, IPINFO_IO_RATE_LIMIT, IPINFO_IO_URL, IPINFO_IO_WINDOW,
    IP_API_COM_FIELDS, IP_API_COM_HTTPS_URL, IP_API_COM_RATE_LIMIT, IP_API_COM_URL,
    IP_API_COM_WINDOW,
};

/// Provider used when the custom provider is selected without a URL.
pub const FALLBACK_PROVIDER: ProviderId = ProviderId::IpInfoIo;

/// Registry of the built-in providers.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    ipinfo_io: ProviderConfig,
    ip_api_com: ProviderConfig,
}

impl Default for ProviderRegistry {
    /// Registry honoring the `IP_FINDER_FORCE_HTTPS` environment variable.
    fn default() -> Self {
        Self::new(std::env::var_os(FORCE_HTTPS_ENV).is_some())
    }
}

impl ProviderRegistry {
    /// Creates the registry with ipinfo.io and ip-api.com.
    ///
    /// `force_https` selects the HTTPS ip-api.com endpoint.
    pub fn new(force_https: bool) -> Self {
        let ip_api_url = if force_https {
            IP_API_COM_HTTPS_URL
        } else {
            IP_API_COM_URL
        };
        Self {
            ipinfo_io: ProviderConfig {
                provider: Provider::IpInfoIo,
                base_url: IPINFO_IO_URL.to_string(),
                fields: None,
                token: None,
                rate_budget: Some(RateBudget::new(IPINFO_IO_RATE_LIMIT, IPINFO_IO_WINDOW)),
            },
            ip_api_com: ProviderConfig {
                provider: Provider::IpApiCom,
                base_url: ip_api_url.to_string(),
                fields: Some(IP_API_COM_FIELDS.to_string()),
                token: None,
                rate_budget: Some(RateBudget::new(IP_API_COM_RATE_LIMIT, IP_API_COM_WINDOW)),
            },
        }
    }

    fn builtin_mut(&mut self, id: ProviderId) -> Option<&mut ProviderConfig> {
        match id {
            ProviderId::IpInfoIo => Some(&mut self.ipinfo_io),
            ProviderId::IpApiCom => Some(&mut self.ip_api_com),
            ProviderId::Custom => None,
        }
    }

    /// Points a built-in provider at another endpoint (mirrors, tests).
    pub fn with_base_url(mut self, id: ProviderId, base_url: impl Into<String>) -> Self {
        if let Some(config) = self.builtin_mut(id) {
            config.base_url = base_url.into();
        }
        self
    }

    /// Sets the ipinfo.io API token.
    pub fn with_ipinfo_token(mut self, token: impl Into<String>) -> Self {
        self.ipinfo_io.token = Some(token.into());
        self
    }

    /// Overrides the rate budget of a built-in provider.
    pub fn with_rate_budget(mut self, id: ProviderId, budget: Option<RateBudget>) -> Self {
        if let Some(config) = self.builtin_mut(id) {
            config.rate_budget = budget;
        }
        self
    }

    /// Configuration of a provider.
    ///
    /// `ProviderId::Custom` has no built-in entry; it resolves to the fallback
    /// provider here. Use [`ProviderRegistry::custom`] or
    /// [`ProviderRegistry::resolve`] for custom templates.
    pub fn get(&self, id: ProviderId) -> ProviderConfig {
        match id {
            ProviderId::IpApiCom => self.ip_api_com.clone(),
            ProviderId::IpInfoIo | ProviderId::Custom => self.ipinfo_io.clone(),
        }
    }

    /// Configuration for a custom URL template. Custom providers are never
    /// rate limited.
    pub fn custom(&self, url_template: &str) -> ProviderConfig {
        ProviderConfig {
            provider: Provider::Custom(url_template.trim().to_string()),
            base_url: url_template.trim().to_string(),
            fields: None,
            token: None,
            rate_budget: None,
        }
    }

    /// Resolves the provider selected in `settings`.
    ///
    /// A custom selection with an empty URL is a configuration problem that
    /// falls back silently to ipinfo.io instead of failing the lookup.
    pub fn resolve(&self, settings: &WidgetSettings) -> ProviderConfig {
        match settings.api_service {
            ProviderId::Custom => {
                let template = settings.custom_api_url.trim();
                if template.is_empty() {
                    debug!(
                        "Custom API selected but no URL provided. Falling back to {}",
                        FALLBACK_PROVIDER
                    );
                    self.get(FALLBACK_PROVIDER)
                } else {
                    if url::Url::parse(&template.replace('%', "")).is_err() {
                        warn!("Custom API URL does not look like a URL: {}", template);
                    }
                    self.custom(template)
                }
            }
            id => self.get(id),
        }
    }
}
