//! VPN detection.
//!
//! The host reports its active network connections; a connection counts as a
//! VPN when it is fully activated and either its type is one of the configured
//! VPN types or its id is whitelisted.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};


/// Lifecycle state of an active connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// State not reported
    #[default]
    Unknown,
    /// Connecting
    Activating,
    /// Up
    Activated,
    /// Disconnecting
    Deactivating,
    /// Down
    Deactivated,
}

/// Overall connectivity as reported by the host's network manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Not reported yet
    #[default]
    Unknown,
    /// No network at all; lookups are skipped
    None,
    /// Behind a captive portal
    Portal,
    /// Network without internet access
    Limited,
    /// Internet reachable
    Full,
}

/// One active network connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Connection id as shown by the host
    pub id: String,
    /// Connection type name, e.g. `wireguard`
    #[serde(rename = "type")]
    pub connection_type: String,
    /// Lifecycle state
    #[serde(default)]
    pub state: ConnectionState,
}

impl Connection {
    /// Connection with the given id, type and state.
    pub fn new(
        id: impl Into<String>,
        connection_type: impl Into<String>,
        state: ConnectionState,
    ) -> Self {
        Self {
            id: id.into(),
            connection_type: connection_type.into(),
            state,
        }
    }
}

/// Result of VPN classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VpnVerdict {
    /// Whether a qualifying VPN connection is up
    pub is_vpn_on: bool,
    /// Id of the connection that was classified as VPN
    pub connection_name: Option<String>,
}

impl VpnVerdict {
    /// Text for the VPN status widget.
    pub fn display_name(&self) -> &str {
        match (&self.connection_name, self.is_vpn_on) {
            (Some(name), true) => name.as_str(),
            (None, true) => "On",
            (_, false) => "Off",
        }
    }
}

/// Classifies `connections` into a VPN verdict.
///
/// Every connection is inspected; when several qualify, the last one names
/// the verdict.
pub fn classify(
    connections: &[Connection],
    vpn_types: &HashSet<String>,
    whitelist: &HashSet<String>,
) -> VpnVerdict {
    let mut verdict = VpnVerdict::default();
    for conn in connections {
        let qualifies = conn.state == ConnectionState::Activated
            && (vpn_types.contains(&conn.connection_type) || whitelist.contains(&conn.id));
        if qualifies {
            debug!("VPN connection detected: {}", conn.id);
            verdict.is_vpn_on = true;
            verdict.connection_name = Some(conn.id.clone());
        } else {
            debug!("Non-VPN connection: {}", conn.id);
        }
    }
    verdict
}

/// Ids of all reported connections, in order.
pub fn active_connection_ids(connections: &[Connection]) -> Vec<String> {
    connections.iter().map(|c| c.id.clone()).collect()
}
