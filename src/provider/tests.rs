use super::*;
use crate::config::{WidgetSettings, IP_API_COM_FIELDS};

#[test]
fn test_builtin_budgets() {
    let registry = ProviderRegistry::new(false);
    let ip_api = registry.get(ProviderId::IpApiCom);
    let budget = ip_api.rate_budget.unwrap();
    assert_eq!(budget.max_requests, 45);
    assert_eq!(budget.window.as_millis(), 60_000);

    let ipinfo = registry.get(ProviderId::IpInfoIo);
    let budget = ipinfo.rate_budget.unwrap();
    assert_eq!(budget.max_requests, 1000);
    assert_eq!(budget.window.as_millis(), 86_400_000);
}

#[test]
fn test_force_https_selects_secure_ip_api() {
    assert!(ProviderRegistry::new(false)
        .get(ProviderId::IpApiCom)
        .base_url
        .starts_with("http://"));
    assert!(ProviderRegistry::new(true)
        .get(ProviderId::IpApiCom)
        .base_url
        .starts_with("https://"));
}

#[test]
fn test_ip_api_url_includes_fields() {
    let config = ProviderRegistry::new(false).get(ProviderId::IpApiCom);
    let url = config.build_url(&LookupRequest::for_ip("1.1.1.1"));
    assert!(url.starts_with("http://ip-api.com/json/1.1.1.1?fields="));
    let parsed = url::Url::parse(&url).unwrap();
    let fields = parsed
        .query_pairs()
        .find(|(k, _)| k == "fields")
        .map(|(_, v)| v.into_owned());
    assert_eq!(fields.as_deref(), Some(IP_API_COM_FIELDS));
}

#[test]
fn test_ip_api_own_ip_url() {
    let config = ProviderRegistry::new(false).get(ProviderId::IpApiCom);
    let url = config.build_url(&LookupRequest::own_ip());
    assert!(url.starts_with("http://ip-api.com/json/?fields="));
}

#[test]
fn test_ipinfo_token_is_appended() {
    let config = ProviderRegistry::new(false)
        .with_ipinfo_token("abc123")
        .get(ProviderId::IpInfoIo);
    assert_eq!(
        config.build_url(&LookupRequest::own_ip()),
        "https://ipinfo.io/json?token=abc123"
    );
    // Never logged
    assert_eq!(
        config.redacted_url(&LookupRequest::own_ip()),
        "https://ipinfo.io/json"
    );
}

#[test]
fn test_custom_template_substitution() {
    let registry = ProviderRegistry::new(false);
    let config = registry.custom("https://geo.example.com/lookup/%s?format=json");
    assert_eq!(
        config.build_url(&LookupRequest::for_ip("9.9.9.9")),
        "https://geo.example.com/lookup/9.9.9.9?format=json"
    );
    assert_eq!(
        config.build_url(&LookupRequest::own_ip()),
        "https://geo.example.com/lookup/?format=json"
    );
    assert!(config.rate_budget.is_none());
}

#[test]
fn test_params_join_with_existing_query() {
    let registry = ProviderRegistry::new(false);
    let config = registry.custom("https://geo.example.com/%s?format=json");
    let request = LookupRequest::for_ip("9.9.9.9").param("lang", "de en");
    assert_eq!(
        config.build_url(&request),
        "https://geo.example.com/9.9.9.9?format=json&lang=de+en"
    );

    let config = registry.custom("https://geo.example.com/%s");
    let request = LookupRequest::for_ip("9.9.9.9").param("lang", "de");
    assert_eq!(
        config.build_url(&request),
        "https://geo.example.com/9.9.9.9?lang=de"
    );
}

#[test]
fn test_resolve_selected_provider() {
    let registry = ProviderRegistry::new(false);
    let mut settings = WidgetSettings::default();
    assert_eq!(registry.resolve(&settings).id(), ProviderId::IpInfoIo);

    settings.api_service = ProviderId::IpApiCom;
    assert_eq!(registry.resolve(&settings).id(), ProviderId::IpApiCom);

    settings.api_service = ProviderId::Custom;
    settings.custom_api_url = "https://geo.example.com/%s".to_string();
    let resolved = registry.resolve(&settings);
    assert_eq!(
        resolved.provider,
        Provider::Custom("https://geo.example.com/%s".to_string())
    );
}

#[test]
fn test_resolve_empty_custom_falls_back_to_ipinfo() {
    let registry = ProviderRegistry::new(false);
    let settings = WidgetSettings {
        api_service: ProviderId::Custom,
        custom_api_url: "   ".to_string(),
        ..WidgetSettings::default()
    };
    let resolved = registry.resolve(&settings);
    assert_eq!(resolved.id(), FALLBACK_PROVIDER);
    assert_eq!(resolved.base_url, "https://ipinfo.io");
}

#[test]
fn test_with_base_url_overrides_endpoint() {
    let registry = ProviderRegistry::new(false).with_base_url(ProviderId::IpInfoIo, "http://127.0.0.1:9999/");
    let config = registry.get(ProviderId::IpInfoIo);
    assert_eq!(
        config.build_url(&LookupRequest::own_ip()),
        "http://127.0.0.1:9999/json"
    );
}

#[test]
fn test_reports_status_only_for_ip_api() {
    let registry = ProviderRegistry::new(false);
    assert!(registry.get(ProviderId::IpApiCom).reports_status());
    assert!(!registry.get(ProviderId::IpInfoIo).reports_status());
    assert!(!registry.custom("https://x/%s").reports_status());
}

#[test]
fn test_refill_rate() {
    let budget = RateBudget::new(45, std::time::Duration::from_millis(60_000));
    assert!((budget.refill_per_ms() - 0.00075).abs() < 1e-12);
}
