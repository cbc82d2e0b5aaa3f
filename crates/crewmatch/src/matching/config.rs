use serde::{Deserialize, Serialize};

pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// Radius policy handed to the matcher at construction.
///
/// With `strict_radius` off, the radius only annotates results (`within_radius`); candidates
/// outside it are still returned. With it on, located candidates beyond the radius are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPolicy {
    pub default_radius_km: f64,
    pub strict_radius: bool,
}

impl MatchPolicy {
    pub fn lenient(default_radius_km: f64) -> Self {
        Self {
            default_radius_km,
            strict_radius: false,
        }
    }

    pub fn strict(default_radius_km: f64) -> Self {
        Self {
            default_radius_km,
            strict_radius: true,
        }
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::lenient(DEFAULT_RADIUS_KM)
    }
}
