//! What one refresh cycle tells the host.

use serde::{Deserialize, Serialize};

use crate::lookup::{display_rows, IpDetails, LookupData, LookupResult};
use crate::provider::ProviderId;
use crate::tile::{TileCoordinate, TileOutcome};
use crate::vpn::{Connection, Connectivity, VpnVerdict};

/// Network state reported by the host at the start of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Overall connectivity
    #[serde(default)]
    pub connectivity: Connectivity,
    /// Active connections
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl NetworkSnapshot {
    /// Snapshot from host-supplied parts.
    pub fn new(connectivity: Connectivity, connections: Vec<Connection>) -> Self {
        Self {
            connectivity,
            connections,
        }
    }

    /// Whether a lookup is pointless: no network or no active connection.
    pub fn is_offline(&self) -> bool {
        self.connectivity == Connectivity::None || self.connections.is_empty()
    }
}

/// Lookup part of a refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshLookup {
    /// Skipped: the host reported no connectivity
    NoConnection,
    /// The lookup ran to completion (successfully or not)
    Completed(LookupResult),
    /// A newer cycle started; the host should keep what it shows
    Superseded,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    /// VPN classification of the snapshot
    pub verdict: VpnVerdict,
    /// Ids of all reported connections, for the whitelist picker
    pub connection_ids: Vec<String>,
    /// Whether the VPN widget should be visible for `verdict`
    pub show_vpn_status: bool,
    /// Provider that served (or would have served) the lookup
    pub provider: Option<ProviderId>,
    /// What happened to the lookup
    pub lookup: RefreshLookup,
    /// Tile for the looked-up location, on success
    pub tile_coordinate: Option<TileCoordinate>,
    /// Tile fetch outcome; errors are reduced to their message
    pub tile: Option<Result<TileOutcome, String>>,
}

impl RefreshReport {
    pub(crate) fn new(verdict: VpnVerdict, connection_ids: Vec<String>, show_vpn_status: bool) -> Self {
        Self {
            verdict,
            connection_ids,
            show_vpn_status,
            provider: None,
            lookup: RefreshLookup::NoConnection,
            tile_coordinate: None,
            tile: None,
        }
    }

    /// Whether a newer cycle replaced this one.
    pub fn is_superseded(&self) -> bool {
        self.lookup == RefreshLookup::Superseded
    }

    /// Payload of a successful lookup.
    pub fn data(&self) -> Option<&LookupData> {
        match &self.lookup {
            RefreshLookup::Completed(result) => result.data(),
            _ => None,
        }
    }

    /// Display view over the lookup data, on success.
    pub fn details(&self) -> Option<IpDetails<'_>> {
        self.data().map(IpDetails::new)
    }

    /// Detail rows in the layout of the serving provider.
    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        match (self.data(), self.provider) {
            (Some(data), Some(provider)) => display_rows(data, provider),
            _ => Vec::new(),
        }
    }

    /// Panel label: the IP, `"Error!"` or `"No Connection"`.
    ///
    /// `None` for a superseded cycle, whose label must not replace the
    /// current one.
    pub fn panel_text(&self) -> Option<String> {
        match &self.lookup {
            RefreshLookup::NoConnection => Some("No Connection".to_string()),
            RefreshLookup::Superseded => None,
            RefreshLookup::Completed(LookupResult::Failure(_)) => Some("Error!".to_string()),
            RefreshLookup::Completed(LookupResult::Success { data }) => Some(
                IpDetails::new(data)
                    .ip()
                    .unwrap_or_else(|| "Unavailable".to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupFailure;
    use serde_json::json;

    fn report(lookup: RefreshLookup) -> RefreshReport {
        let mut report = RefreshReport::new(VpnVerdict::default(), Vec::new(), true);
        report.provider = Some(ProviderId::IpInfoIo);
        report.lookup = lookup;
        report
    }

    #[test]
    fn test_panel_text() {
        assert_eq!(
            report(RefreshLookup::NoConnection).panel_text().as_deref(),
            Some("No Connection")
        );
        assert_eq!(report(RefreshLookup::Superseded).panel_text(), None);
        assert_eq!(
            report(RefreshLookup::Completed(LookupFailure::parse().into()))
                .panel_text()
                .as_deref(),
            Some("Error!")
        );

        let data = json!({"ip": "8.8.8.8"}).as_object().cloned().unwrap();
        let ok = report(RefreshLookup::Completed(LookupResult::success(data)));
        assert_eq!(ok.panel_text().as_deref(), Some("8.8.8.8"));
        assert_eq!(ok.display_rows(), vec![("IP Address", "8.8.8.8".to_string())]);

        let empty = report(RefreshLookup::Completed(LookupResult::success(LookupData::new())));
        assert_eq!(empty.panel_text().as_deref(), Some("Unavailable"));
    }

    #[test]
    fn test_offline_snapshots() {
        assert!(NetworkSnapshot::default().is_offline());
        let conn = Connection::new("eth0", "802-3-ethernet", crate::vpn::ConnectionState::Activated);
        assert!(NetworkSnapshot::new(Connectivity::None, vec![conn.clone()]).is_offline());
        assert!(!NetworkSnapshot::new(Connectivity::Full, vec![conn.clone()]).is_offline());
        // Unknown connectivity still attempts a lookup
        assert!(!NetworkSnapshot::new(Connectivity::Unknown, vec![conn]).is_offline());
    }
}
