use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::domain::JobWithDistance;
use super::error::MarketplaceError;
use super::geo::GeoPoint;
use super::repository::JobRepository;
use crate::config::SearchConfig;

/// Query-string shape of a nearby search: `?lat=..&lng=..&radius=..`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub radius: Option<f64>,
}

/// Radius clamping policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPolicy {
    default_radius_km: f64,
    max_radius_km: f64,
}

impl SearchPolicy {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            default_radius_km: config.default_radius_km,
            max_radius_km: config.max_radius_km,
        }
    }

    pub fn max_radius_km(&self) -> f64 {
        self.max_radius_km
    }

    /// Requested radius if positive, otherwise the default, capped at the
    /// configured maximum. NaN counts as missing.
    pub fn effective_radius(&self, requested: Option<f64>) -> f64 {
        let radius = match requested {
            Some(radius) if radius > 0.0 => radius,
            _ => self.default_radius_km,
        };
        radius.min(self.max_radius_km)
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

/// Finds open jobs around a point under the radius policy.
pub struct NearbySearch<S> {
    store: Arc<S>,
    policy: SearchPolicy,
}

impl<S> NearbySearch<S>
where
    S: JobRepository + 'static,
{
    pub fn new(store: Arc<S>, policy: SearchPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> SearchPolicy {
        self.policy
    }

    pub fn nearby(&self, query: NearbyQuery) -> Result<Vec<JobWithDistance>, MarketplaceError> {
        let origin = GeoPoint::new(query.lat, query.lng)?;
        let radius_km = self.policy.effective_radius(query.radius);
        debug!(
            lat = origin.latitude,
            lng = origin.longitude,
            requested = ?query.radius,
            radius_km,
            "searching nearby jobs"
        );
        Ok(self.store.open_jobs_within(&origin, radius_km)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(default_radius_km: f64, max_radius_km: f64) -> SearchPolicy {
        SearchPolicy::new(SearchConfig {
            default_radius_km,
            max_radius_km,
        })
    }

    #[test]
    fn missing_or_non_positive_radius_uses_default() {
        let policy = policy(3.0, 5.0);
        assert_eq!(policy.effective_radius(None), 3.0);
        assert_eq!(policy.effective_radius(Some(0.0)), 3.0);
        assert_eq!(policy.effective_radius(Some(-2.0)), 3.0);
        assert_eq!(policy.effective_radius(Some(f64::NAN)), 3.0);
    }

    #[test]
    fn requested_radius_is_capped() {
        let policy = policy(3.0, 5.0);
        assert_eq!(policy.effective_radius(Some(1.5)), 1.5);
        assert_eq!(policy.effective_radius(Some(5.0)), 5.0);
        assert_eq!(policy.effective_radius(Some(50.0)), 5.0);
        assert_eq!(policy.effective_radius(Some(f64::INFINITY)), 5.0);
        assert_eq!(policy.effective_radius(Some(f64::NEG_INFINITY)), 3.0);
    }

    #[test]
    fn default_is_capped_too() {
        assert_eq!(policy(3.0, 2.0).effective_radius(None), 2.0);
    }
}
