//! Tile download and cache.
//!
//! Only one tile is kept: the latest one, written to `latest_map.png` in the
//! cache directory. Downloads are not retried.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use super::TileCoordinate;
use crate::config::{LATEST_MAP_FILE, PARTIAL_MAP_FILE, TILE_SERVER_URL};
use crate::error_handling::TileError;

/// Outcome of [`TileFetcher::fetch_if_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileOutcome {
    /// The cached file already shows this tile
    Cached(PathBuf),
    /// A new tile was downloaded
    Fetched(PathBuf),
}

impl TileOutcome {
    /// Location of the tile on disk.
    pub fn path(&self) -> &Path {
        match self {
            TileOutcome::Cached(path) | TileOutcome::Fetched(path) => path,
        }
    }
}

/// Downloads map tiles into a cache directory.
#[derive(Debug)]
pub struct TileFetcher {
    client: Arc<reqwest::Client>,
    server_url: String,
    cache_dir: PathBuf,
    last_key: Mutex<Option<String>>,
}

impl TileFetcher {
    /// Fetcher for the OpenStreetMap tile server.
    pub fn new(client: Arc<reqwest::Client>, cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_server(client, TILE_SERVER_URL, cache_dir)
    }

    /// Fetcher for another tile server (mirrors, tests).
    pub fn with_server(
        client: Arc<reqwest::Client>,
        server_url: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            server_url: server_url.into(),
            cache_dir: cache_dir.into(),
            last_key: Mutex::new(None),
        }
    }

    /// Path of the cached tile.
    pub fn latest_map_path(&self) -> PathBuf {
        self.cache_dir.join(LATEST_MAP_FILE)
    }

    /// Key of the last successfully fetched tile.
    pub fn last_key(&self) -> Option<String> {
        self.last_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Restores the key (`"<z>/<x>/<y>"`) of a tile fetched in an earlier
    /// session.
    pub fn restore_last_key(&self, key: impl Into<String>) {
        *self.last_key.lock().unwrap_or_else(PoisonError::into_inner) = Some(key.into());
    }

    /// Downloads `coords` and stores it as `latest_map.png`.
    ///
    /// The body is written to a side file and renamed into place, so the
    /// cached tile is never half written. The remembered key is cleared
    /// before the swap and only set again once the rename succeeded.
    ///
    /// # Errors
    ///
    /// - `TileError::Status` if the server does not answer 200
    /// - `TileError::Request` if the request or body read fails
    /// - `TileError::Io` if the cache directory or file cannot be written
    pub async fn fetch_tile(&self, coords: &TileCoordinate) -> Result<PathBuf, TileError> {
        let url = coords.url(&self.server_url);
        debug!("Fetching map tile {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "image/png")
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(TileError::Status(response.status().as_u16()));
        }
        let bytes = response.bytes().await?;

        // From here on latest_map.png may be replaced, so the old key no
        // longer describes it until the new one is stored.
        self.last_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let partial = self.cache_dir.join(PARTIAL_MAP_FILE);
        let path = self.latest_map_path();
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        *self.last_key.lock().unwrap_or_else(PoisonError::into_inner) = Some(coords.cache_key());
        info!("Map tile {} saved to {}", coords.path(), path.display());
        Ok(path)
    }

    /// Downloads `coords` unless the cached file already shows it.
    ///
    /// The tile counts as cached when the last fetched key matches and
    /// `latest_map.png` still exists.
    pub async fn fetch_if_changed(
        &self,
        coords: &TileCoordinate,
        cancel: &CancellationToken,
    ) -> Result<TileOutcome, TileError> {
        let path = self.latest_map_path();
        let unchanged = self.last_key().as_deref() == Some(coords.cache_key().as_str());
        if unchanged && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("Map tile {} unchanged, using cache", coords.cache_key());
            return Ok(TileOutcome::Cached(path));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TileError::Cancelled),
            result = self.fetch_tile(coords) => result.map(TileOutcome::Fetched),
        }
    }
}
