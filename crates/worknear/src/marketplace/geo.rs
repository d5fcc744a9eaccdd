//! Great-circle distance and the brute-force radius scan used by storage adapters
//! that have no spatial index.

use serde::{Deserialize, Serialize};

use super::domain::{Job, JobStatus, JobWithDistance};
use super::error::ValidationError;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting coordinates outside the valid degree ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        distance_km(self, other)
    }
}

/// Spherical law of cosines. The cosine is clamped to [-1, 1] so rounding at
/// identical or antipodal points cannot push `acos` out of its domain.
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let cos_angle = lat1.cos() * lat2.cos() * delta_lng.cos() + lat1.sin() * lat2.sin();
    EARTH_RADIUS_KM * cos_angle.clamp(-1.0, 1.0).acos()
}

/// Open jobs strictly closer than `radius_km` to `origin`, nearest first.
/// Equal distances keep the iteration order of `jobs`.
pub fn open_within<'a, I>(origin: &GeoPoint, radius_km: f64, jobs: I) -> Vec<JobWithDistance>
where
    I: IntoIterator<Item = &'a Job>,
{
    let mut hits: Vec<JobWithDistance> = jobs
        .into_iter()
        .filter(|job| job.status == JobStatus::Open)
        .filter_map(|job| {
            let distance = distance_km(origin, &job.location);
            (distance < radius_km).then(|| JobWithDistance {
                job: job.clone(),
                distance,
            })
        })
        .collect();

    hits.sort_by(|left, right| left.distance.total_cmp(&right.distance));
    hits
}
