//! World configuration
//!
//! Every field has a default, so a partial (or empty) JSON object is a valid
//! config. Persisted separately from the save in LocalStorage on the web.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::SpawnRules;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Cell edge length in degrees
    pub tile_degrees: f64,
    /// Visibility window radius in cells
    pub visibility_radius: u32,
    /// Chance a cell holds a cache (0.0 - 1.0)
    pub spawn_probability: f64,
    /// Fresh caches hold fewer than this many coins
    pub max_initial_coins: u32,
    /// Max distance in cells for collect/deposit
    pub interaction_radius: u32,
    /// Where a new (or reset) game starts, as (lat, lng)
    pub start_position: DVec2,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_degrees: TILE_DEGREES,
            visibility_radius: NEIGHBORHOOD_SIZE,
            spawn_probability: CACHE_SPAWN_PROBABILITY,
            max_initial_coins: MAX_INITIAL_COINS,
            interaction_radius: INTERACTION_RADIUS,
            start_position: DVec2::new(START_LAT, START_LNG),
        }
    }
}

impl WorldConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Replace out-of-range values with something usable
    pub fn sanitized(mut self) -> Self {
        if !(self.tile_degrees.is_finite() && self.tile_degrees > 0.0) {
            log::warn!(
                "Invalid tile_degrees {}, using {}",
                self.tile_degrees,
                TILE_DEGREES
            );
            self.tile_degrees = TILE_DEGREES;
        }
        if !self.spawn_probability.is_finite() {
            self.spawn_probability = CACHE_SPAWN_PROBABILITY;
        }
        self.spawn_probability = self.spawn_probability.clamp(0.0, 1.0);
        if self.visibility_radius > MAX_VISIBILITY_RADIUS {
            log::warn!(
                "visibility_radius {} too large, using {}",
                self.visibility_radius,
                MAX_VISIBILITY_RADIUS
            );
            self.visibility_radius = MAX_VISIBILITY_RADIUS;
        }
        if !self.start_position.is_finite() {
            self.start_position = DVec2::new(START_LAT, START_LNG);
        }
        self
    }

    pub fn spawn_rules(&self) -> SpawnRules {
        SpawnRules {
            spawn_probability: self.spawn_probability,
            max_initial_coins: self.max_initial_coins,
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "geocoin_config";

    /// Load config from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Bad config {} ({}), using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Can't read config {} ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(config) = Self::from_json(&json) {
                    log::info!("Loaded config from LocalStorage");
                    return config;
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }
}
