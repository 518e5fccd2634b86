//! Flat-earth geometry for short city distances.
//!
//! Degrees are converted to km with a single constant for both axes. This
//! over-estimates east-west spans away from the equator, which is acceptable
//! for ranking stores inside one metro area.

use std::f64::consts::TAU;

use pantry_core::Coordinate;
use rand::Rng;

/// Approximate km per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.32;

/// Planar distance between two coordinates in km.
#[must_use]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    (to.lat - from.lat).hypot(to.lng - from.lng) * KM_PER_DEGREE
}

/// Uniform-by-area random point inside a disk of `radius_km` around `center`.
///
/// Uses the polar method: the radius is scaled by `sqrt(u)` so points do not
/// cluster at the centre.
pub fn random_point_in_disk<R: Rng + ?Sized>(
    rng: &mut R,
    center: Coordinate,
    radius_km: f64,
) -> Coordinate {
    let radius_deg = radius_km / KM_PER_DEGREE;
    let u: f64 = rng.random();
    let v: f64 = rng.random();
    let w = radius_deg * u.sqrt();
    let t = TAU * v;
    Coordinate {
        lat: center.lat + w * t.cos(),
        lng: center.lng + w * t.sin(),
    }
}

/// Random point at a bearing-uniform offset of `min_deg..max_deg` degrees.
pub fn random_offset<R: Rng + ?Sized>(
    rng: &mut R,
    origin: Coordinate,
    min_deg: f64,
    max_deg: f64,
) -> Coordinate {
    let angle = rng.random::<f64>() * TAU;
    let offset = min_deg + rng.random::<f64>() * (max_deg - min_deg);
    Coordinate {
        lat: origin.lat + angle.cos() * offset,
        lng: origin.lng + angle.sin() * offset,
    }
}
