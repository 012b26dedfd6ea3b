//! Refresh orchestration.
//!
//! [`IpFinder`] is the one object the host owns. Each refresh cycle
//! classifies the VPN state, resolves the provider, asks the rate limiter,
//! runs the retrying lookup and updates the map tile. At most one cycle is in
//! flight: starting a new one cancels the previous one, whose report then
//! comes back as [`RefreshLookup::Superseded`].

mod report;


use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

pub use report::{NetworkSnapshot, RefreshLookup, RefreshReport};

use crate::config::{SettingsEffect, SettingsKey, WidgetSettings, REFRESH_DEBOUNCE};
use crate::error_handling::{FailureKind, InitializationError, TileError};
use crate::initialization::init_client;
use crate::lookup::{
    normalize_location, Execute, IpDetails, LookupFailure, LookupResult, RequestExecutor,
    RetryController,
};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::provider::{LookupRequest, ProviderRegistry};
use crate::rate_limiter::RateLimiter;
use crate::tile::{locate, TileFetcher};
use crate::vpn::{active_connection_ids, classify, VpnVerdict};

/// Whether `candidate` is an IPv4 or IPv6 address.
pub fn is_valid_ip(candidate: &str) -> bool {
    IpAddr::from_str(candidate.trim()).is_ok()
}

/// Lookup orchestrator.
pub struct IpFinder<E: Execute = RequestExecutor> {
    settings: RwLock<WidgetSettings>,
    registry: ProviderRegistry,
    rate_limiter: RateLimiter,
    retry: RetryController<E>,
    tiles: TileFetcher,
    metrics: Arc<MetricsCollector>,
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
    next_cycle: AtomicU64,
}

impl IpFinder<RequestExecutor> {
    /// Wires up all components from `settings`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the HTTP client
    /// cannot be built.
    pub fn new(settings: WidgetSettings) -> Result<Self, InitializationError> {
        let metrics = Arc::new(MetricsCollector::new());
        let client = init_client(&settings)?;
        let executor = RequestExecutor::new(
            Arc::clone(&client),
            Duration::from_millis(settings.request_timeout_ms),
            settings.user_agent.clone(),
            Arc::clone(&metrics),
        );
        let tiles = TileFetcher::new(client, settings.map_cache_dir.clone());
        Ok(Self::with_parts(
            settings,
            ProviderRegistry::default(),
            RateLimiter::new(Arc::clone(&metrics)),
            RetryController::new(executor, Arc::clone(&metrics)),
            tiles,
            metrics,
        ))
    }
}

impl<E: Execute> IpFinder<E> {
    /// Assembles an orchestrator from prepared components.
    ///
    /// `rate_limiter` and `retry` should share `metrics`.
    pub fn with_parts(
        settings: WidgetSettings,
        registry: ProviderRegistry,
        rate_limiter: RateLimiter,
        retry: RetryController<E>,
        tiles: TileFetcher,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            settings: RwLock::new(settings),
            registry,
            rate_limiter,
            retry,
            tiles,
            metrics,
            in_flight: Mutex::new(None),
            next_cycle: AtomicU64::new(1),
        }
    }

    /// Copy of the current settings.
    pub fn settings(&self) -> WidgetSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point-in-time copy of the lookup counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Per-provider token buckets.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Map tile cache.
    pub fn tiles(&self) -> &TileFetcher {
        &self.tiles
    }

    /// Whether the VPN widget should be visible for `verdict`.
    pub fn should_show_vpn_status(&self, verdict: &VpnVerdict) -> bool {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .should_show_vpn_status(verdict)
    }

    /// Stores changed settings and tells the host how to react to `key`.
    pub fn apply_setting(&self, key: SettingsKey, settings: WidgetSettings) -> SettingsEffect {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
        let effect = key.effect();
        debug!("Setting {} changed: {:?}", key.as_ref(), effect);
        effect
    }

    /// Like [`IpFinder::apply_setting`] for a raw key name. Keys the core
    /// does not react to still store the settings and return `None`.
    pub fn apply_setting_named(&self, key: &str, settings: WidgetSettings) -> Option<SettingsEffect> {
        match SettingsKey::from_str(key) {
            Ok(key) => Some(self.apply_setting(key, settings)),
            Err(_) => {
                *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
                None
            }
        }
    }

    /// Aborts the cycle in flight, if any.
    pub fn cancel_in_flight(&self) {
        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((cycle, token)) = previous {
            debug!("Cancelling refresh cycle {}", cycle);
            token.cancel();
        }
    }

    /// Runs a refresh cycle for the caller's own IP.
    pub async fn refresh(&self, snapshot: &NetworkSnapshot) -> RefreshReport {
        let (cycle, token) = self.begin_cycle();
        self.run_cycle(cycle, &token, snapshot, &LookupRequest::own_ip(), None)
            .await
    }

    /// Runs a refresh cycle for a user-entered IP.
    ///
    /// An invalid address ends the cycle with a `Config` failure without
    /// any network call.
    pub async fn refresh_for_ip(&self, snapshot: &NetworkSnapshot, ip: &str) -> RefreshReport {
        let (cycle, token) = self.begin_cycle();
        if !is_valid_ip(ip) {
            warn!("Ignoring invalid IP address: {}", ip);
            let mut report = self.base_report(snapshot);
            report.lookup = RefreshLookup::Completed(
                LookupFailure::new(FailureKind::Config, format!("Invalid IP address: {}", ip))
                    .into(),
            );
            self.finish_cycle(cycle);
            return report;
        }
        let request = LookupRequest::for_ip(ip.trim());
        self.run_cycle(cycle, &token, snapshot, &request, None).await
    }

    /// Runs a refresh cycle after the debounce delay.
    ///
    /// Bursts of network events collapse into one lookup: every call cancels
    /// the previous pending or running cycle.
    pub async fn schedule_refresh(&self, snapshot: &NetworkSnapshot) -> RefreshReport {
        let (cycle, token) = self.begin_cycle();
        self.run_cycle(
            cycle,
            &token,
            snapshot,
            &LookupRequest::own_ip(),
            Some(REFRESH_DEBOUNCE),
        )
        .await
    }

    fn begin_cycle(&self) -> (u64, CancellationToken) {
        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((cycle, token.clone()));
        if let Some((previous_cycle, previous_token)) = previous {
            debug!(
                "Refresh cycle {} supersedes cycle {}",
                cycle, previous_cycle
            );
            previous_token.cancel();
        }
        (cycle, token)
    }

    fn finish_cycle(&self, cycle: u64) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight.as_ref().is_some_and(|(current, _)| *current == cycle) {
            *in_flight = None;
        }
    }

    fn base_report(&self, snapshot: &NetworkSnapshot) -> RefreshReport {
        let settings = self.settings();
        let vpn_types: HashSet<String> = settings.vpn_connection_types.iter().cloned().collect();
        let whitelist: HashSet<String> =
            settings.vpn_connections_whitelist.iter().cloned().collect();
        let verdict = classify(&snapshot.connections, &vpn_types, &whitelist);
        let show = settings.should_show_vpn_status(&verdict);
        RefreshReport::new(verdict, active_connection_ids(&snapshot.connections), show)
    }

    async fn run_cycle(
        &self,
        cycle: u64,
        token: &CancellationToken,
        snapshot: &NetworkSnapshot,
        request: &LookupRequest,
        debounce: Option<Duration>,
    ) -> RefreshReport {
        let report = self.run_cycle_inner(token, snapshot, request, debounce).await;
        self.finish_cycle(cycle);
        report
    }

    async fn run_cycle_inner(
        &self,
        token: &CancellationToken,
        snapshot: &NetworkSnapshot,
        request: &LookupRequest,
        debounce: Option<Duration>,
    ) -> RefreshReport {
        if let Some(delay) = debounce {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    let mut report = self.base_report(snapshot);
                    report.lookup = RefreshLookup::Superseded;
                    return report;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let mut report = self.base_report(snapshot);
        if snapshot.is_offline() {
            info!("No network connection, skipping lookup");
            report.lookup = RefreshLookup::NoConnection;
            return report;
        }

        let settings = self.settings();
        let config = self.registry.resolve(&settings);
        report.provider = Some(config.id());

        if !self.rate_limiter.try_acquire(&config) {
            warn!("Rate limit reached for {}, skipping lookup", config.id());
            report.lookup = RefreshLookup::Completed(LookupFailure::rate_limited().into());
            return report;
        }

        let mut result = self.retry.execute_with_retry(&config, request, token).await;
        if token.is_cancelled() {
            debug!("Lookup via {} superseded", config.id());
            report.lookup = RefreshLookup::Superseded;
            return report;
        }

        if let LookupResult::Success { data } = &mut result {
            normalize_location(data);
            let location = IpDetails::new(data).location();
            let coords = locate(location.as_deref(), settings.tile_zoom());
            report.tile_coordinate = Some(coords);
            match self.tiles.fetch_if_changed(&coords, token).await {
                Ok(outcome) => report.tile = Some(Ok(outcome)),
                Err(TileError::Cancelled) => {
                    report.lookup = RefreshLookup::Superseded;
                    return report;
                }
                Err(e) => {
                    warn!("Failed to update map tile {}: {}", coords.path(), e);
                    report.tile = Some(Err(e.to_string()));
                }
            }
        }

        report.lookup = RefreshLookup::Completed(result);
        report
    }
}
