//! Map tiles.
//!
//! Converts a `"lat, lon"` location into OpenStreetMap slippy-map tile
//! coordinates (Web Mercator) and downloads the matching tile.

mod fetch;

use std::f64::consts::PI;

pub use fetch::{TileFetcher, TileOutcome};

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    /// Zoom level
    pub zoom: u8,
    /// Column, counted eastwards from -180°
    pub x_tile: u32,
    /// Row, counted southwards from the north edge
    pub y_tile: u32,
}

impl TileCoordinate {
    /// Tile (0, 0) at `zoom`, used when no usable location is known.
    pub fn origin(zoom: u8) -> Self {
        Self {
            zoom,
            x_tile: 0,
            y_tile: 0,
        }
    }

    /// `"<z>/<x>/<y>"`, the key used to detect an unchanged tile.
    pub fn cache_key(&self) -> String {
        self.path()
    }

    /// `"<z>/<x>/<y>"` path on the tile server.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.zoom, self.x_tile, self.y_tile)
    }

    /// Full tile URL below `server_url`.
    pub fn url(&self, server_url: &str) -> String {
        format!("{}/{}.png", server_url.trim_end_matches('/'), self.path())
    }
}

fn parse_location(location: &str) -> Option<(f64, f64)> {
    let mut parts = location.split(',');
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
}

/// Tile containing `location` (`"lat, lon"`) at `zoom`.
///
/// Missing or malformed input yields tile (0, 0). Coordinates outside the
/// Mercator range are clamped onto the edge tiles.
///
/// # Examples
///
/// ```
/// use ip_finder::tile::locate;
///
/// let tile = locate(Some("52.52, 13.405"), 9);
/// assert_eq!((tile.x_tile, tile.y_tile), (275, 167));
/// assert_eq!(locate(None, 9).x_tile, 0);
/// ```
pub fn locate(location: Option<&str>, zoom: u8) -> TileCoordinate {
    let Some((lat, lon)) = location.and_then(parse_location) else {
        return TileCoordinate::origin(zoom);
    };

    let n = 2.0_f64.powi(i32::from(zoom));
    let max_index = n - 1.0;

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    // NaN (e.g. tan at the poles) lands on 0
    let clamp = |v: f64| {
        if v.is_nan() {
            0
        } else {
            v.clamp(0.0, max_index) as u32
        }
    };

    TileCoordinate {
        zoom,
        x_tile: clamp(x),
        y_tile: clamp(y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_berlin() {
        let tile = locate(Some("52.52, 13.405"), 9);
        assert_eq!(tile, TileCoordinate { zoom: 9, x_tile: 275, y_tile: 167 });
    }

    #[test]
    fn test_locate_without_space() {
        assert_eq!(locate(Some("52.52,13.405"), 9), locate(Some("52.52, 13.405"), 9));
    }

    #[test]
    fn test_locate_null_island_zoom_one() {
        // x = floor(0.5 * 2), y = floor(0.5 * 2)
        assert_eq!(
            locate(Some("0,0"), 1),
            TileCoordinate { zoom: 1, x_tile: 1, y_tile: 1 }
        );
    }

    #[test]
    fn test_locate_malformed_input() {
        for input in [None, Some(""), Some("52.52"), Some("abc, def"), Some("NaN, 1"), Some("inf, 3")] {
            assert_eq!(locate(input, 9), TileCoordinate::origin(9), "{:?}", input);
        }
    }

    #[test]
    fn test_locate_extra_fields_ignored() {
        assert_eq!(locate(Some("52.52, 13.405, 34"), 9).x_tile, 275);
    }

    #[test]
    fn test_locate_is_clamped_into_range() {
        let n = 2u32.pow(7);
        let east = locate(Some("0, 180"), 7);
        assert_eq!(east.x_tile, n - 1);
        let north = locate(Some("89.9, 0"), 7);
        assert_eq!(north.y_tile, 0);
        let south = locate(Some("-89.9, 0"), 7);
        assert_eq!(south.y_tile, n - 1);
        let far_west = locate(Some("0, -500"), 7);
        assert_eq!(far_west.x_tile, 0);
    }

    #[test]
    fn test_locate_coordinates_always_in_range() {
        for zoom in 7..=13u8 {
            let n = 2u32.pow(u32::from(zoom));
            for lat in (-90..=90).step_by(15) {
                for lon in (-180..=180).step_by(30) {
                    let tile = locate(Some(&format!("{}, {}", lat, lon)), zoom);
                    assert!(tile.x_tile < n && tile.y_tile < n, "{:?}", tile);
                }
            }
        }
    }

    #[test]
    fn test_cache_key_includes_zoom() {
        let z9 = TileCoordinate::origin(9);
        let z10 = TileCoordinate::origin(10);
        assert_ne!(z9.cache_key(), z10.cache_key());
    }

    #[test]
    fn test_tile_paths() {
        let tile = TileCoordinate { zoom: 9, x_tile: 275, y_tile: 167 };
        assert_eq!(tile.cache_key(), "9/275/167");
        assert_eq!(tile.path(), "9/275/167");
        assert_eq!(
            tile.url("https://tile.openstreetmap.org/"),
            "https://tile.openstreetmap.org/9/275/167.png"
        );
    }
}
