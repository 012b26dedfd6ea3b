//! Configuration constants.
//!
//! Every tunable used by the lookup core lives here so defaults can be
//! overridden in one place.

use std::time::Duration;

// Request execution
/// Hard per-attempt request timeout in milliseconds
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;
/// TCP connection timeout in seconds
///
/// Keeps DNS/TCP stalls from eating the whole request timeout.
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Number of body characters kept in `HTTP <code>: <body>` failure messages
pub const ERROR_BODY_PREVIEW_CHARS: usize = 100;

/// User-Agent sent with every provider and tile request.
pub const DEFAULT_USER_AGENT: &str = "IP-Finder-Widget/1.0";

// Retry strategy
/// Total attempts for a provider lookup (initial attempt + retries)
pub const RETRY_MAX_ATTEMPTS: usize = 3;
/// Delay before the first retry in milliseconds
pub const RETRY_BASE_BACKOFF_MS: u64 = 1000;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Upper bound for a single retry delay in milliseconds
pub const RETRY_MAX_BACKOFF_MS: u64 = 10_000;

// Metrics
/// Rate-limit rejections that raise an alert (the counter then restarts at 0)
pub const RATE_LIMIT_ALERT_THRESHOLD: usize = 10;

// Providers
/// ip-api.com endpoint (the free tier is plain HTTP only)
pub const IP_API_COM_URL: &str = "http://ip-api.com/json";
/// ip-api.com endpoint used when `IP_FINDER_FORCE_HTTPS` is set
pub const IP_API_COM_HTTPS_URL: &str = "https://ip-api.com/json";
/// Fields requested from ip-api.com
pub const IP_API_COM_FIELDS: &str =
    "status,message,country,countryCode,region,regionName,city,zip,lat,lon,timezone,isp,org,as,query";
/// ip-api.com free tier: 45 requests per minute
pub const IP_API_COM_RATE_LIMIT: u32 = 45;
/// ip-api.com budget window
pub const IP_API_COM_WINDOW: Duration = Duration::from_millis(60_000);

/// ipinfo.io endpoint root
pub const IPINFO_IO_URL: &str = "https://ipinfo.io";
/// ipinfo.io free tier: 1000 requests per day
pub const IPINFO_IO_RATE_LIMIT: u32 = 1000;
/// ipinfo.io budget window
pub const IPINFO_IO_WINDOW: Duration = Duration::from_millis(86_400_000);

/// Token in a custom URL template that is replaced by the queried IP
pub const CUSTOM_URL_PLACEHOLDER: &str = "%s";
/// Environment variable that switches ip-api.com to HTTPS
pub const FORCE_HTTPS_ENV: &str = "IP_FINDER_FORCE_HTTPS";

// Map tiles
/// OpenStreetMap tile server root
pub const TILE_SERVER_URL: &str = "https://tile.openstreetmap.org";
/// Lowest zoom offered to the user
pub const MIN_TILE_ZOOM: u8 = 7;
/// Highest zoom offered to the user
pub const MAX_TILE_ZOOM: u8 = 13;
/// Zoom used when the setting is missing
pub const DEFAULT_TILE_ZOOM: u8 = 9;
/// File name of the cached tile inside the map cache directory
pub const LATEST_MAP_FILE: &str = "latest_map.png";
/// Download target, renamed onto `LATEST_MAP_FILE` once complete
pub const PARTIAL_MAP_FILE: &str = "latest_map.png.part";
/// Default directory for the cached tile
pub const DEFAULT_MAP_CACHE_DIR: &str = "./icons";

// Refresh
/// Quiet period before a scheduled refresh actually starts
pub const REFRESH_DEBOUNCE: Duration = Duration::from_secs(2);

/// Connection types treated as VPNs out of the box.
pub const DEFAULT_VPN_CONNECTION_TYPES: &[&str] = &["vpn", "wireguard"];
