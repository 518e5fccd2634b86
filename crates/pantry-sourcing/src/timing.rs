//! Travel-time and ETA estimates for shipments.

use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timing {
    /// Travel plus prep, e.g. `"27 mins"`.
    pub eta: String,
    /// Driving minutes only.
    pub travel_time: u32,
}

/// Converts a driving distance into an arrival estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingModel {
    pub minutes_per_km: f64,
    /// Traffic multiplier is drawn from `traffic_min..traffic_max`.
    pub traffic_min: f64,
    pub traffic_max: f64,
    /// Store prep minutes are drawn from `prep_min..=prep_max`.
    pub prep_min: u32,
    pub prep_max: u32,
}

impl Default for TimingModel {
    fn default() -> Self {
        Self {
            minutes_per_km: 2.2,
            traffic_min: 1.0,
            traffic_max: 1.3,
            prep_min: 10,
            prep_max: 14,
        }
    }
}

impl TimingModel {
    pub fn estimate<R: Rng + ?Sized>(&self, rng: &mut R, distance_km: f64) -> Timing {
        let traffic = if self.traffic_max > self.traffic_min {
            rng.random_range(self.traffic_min..self.traffic_max)
        } else {
            self.traffic_min
        };
        let raw_minutes = (distance_km * self.minutes_per_km * traffic).ceil().max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let travel_time = raw_minutes.min(f64::from(u32::MAX)) as u32;

        let prep = rng.random_range(self.prep_min..=self.prep_max.max(self.prep_min));

        Timing {
            eta: format!("{} mins", travel_time.saturating_add(prep)),
            travel_time,
        }
    }
}

/// [`TimingModel::default`] applied to `distance_km`.
pub fn calculate_timing<R: Rng + ?Sized>(rng: &mut R, distance_km: f64) -> Timing {
    TimingModel::default().estimate(rng, distance_km)
}
