//! Distance and severity classification.
//!
//! Both functions are pure. The keyword tiers are configuration data
//! ([`ClassifierConfig`]); the classifier lowercases them once at
//! construction and then does plain substring matching.

use crate::config::ClassifierConfig;
use crate::util::serde::{GeoPoint, PriorityClass};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two coordinates (haversine).
#[must_use]
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// [`distance`] between two points.
#[must_use]
pub fn distance_between(a: GeoPoint, b: GeoPoint) -> f64 {
    distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Estimated arrival in whole minutes, rounded up.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimated_arrival_minutes(distance_km: f64, minutes_per_km: f64) -> u32 {
    let minutes = (distance_km * minutes_per_km).ceil();
    if minutes.is_nan() || minutes <= 0.0 {
        0
    } else if minutes >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        minutes as u32
    }
}

/// Keyword-tier severity classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    tiers: Vec<(PriorityClass, Vec<String>)>,
}

impl Classifier {
    /// Build from configured keyword tiers.
    #[must_use]
    pub fn new(config: &ClassifierConfig) -> Self {
        let lower = |words: &[String]| {
            words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
        };
        Self {
            tiers: vec![
                (PriorityClass::Critical, lower(&config.critical)),
                (PriorityClass::High, lower(&config.high)),
                (PriorityClass::Medium, lower(&config.medium)),
                (PriorityClass::Low, lower(&config.low)),
            ],
        }
    }

    /// Classify free-text symptoms. Tiers are checked most severe first, so a
    /// text matching several tiers gets the most severe one. No match is low.
    #[must_use]
    pub fn classify(&self, symptoms: &str) -> PriorityClass {
        let text = symptoms.to_lowercase();
        self.tiers
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map_or(PriorityClass::Low, |(class, _)| *class)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = GeoPoint::new(40.7128, -74.0060);
        let b = GeoPoint::new(40.7306, -73.9352);
        assert!((distance_between(a, b) - distance_between(b, a)).abs() < 1e-9);
        assert!(distance_between(a, a).abs() < 1e-9);
    }

    #[test]
    fn eta_rounds_up() {
        assert_eq!(estimated_arrival_minutes(12.0, 3.0), 36);
        assert_eq!(estimated_arrival_minutes(0.1, 3.0), 1);
        assert_eq!(estimated_arrival_minutes(0.0, 3.0), 0);
    }

    #[test]
    fn critical_tier_wins_over_medium() {
        let c = Classifier::default();
        assert_eq!(c.classify("patient has chest pain and nausea"), PriorityClass::Critical);
    }

    #[test]
    fn case_insensitive_and_defaults_low() {
        let c = Classifier::default();
        assert_eq!(c.classify("Suspected FRACTURE of the wrist"), PriorityClass::High);
        assert_eq!(c.classify("mild fever"), PriorityClass::Medium);
        assert_eq!(c.classify("feeling a bit off"), PriorityClass::Low);
    }

    #[test]
    fn keywords_come_from_config() {
        let config = ClassifierConfig {
            critical: vec!["Stroke".into()],
            high: vec![],
            medium: vec![],
            low: vec!["checkup".into()],
        };
        let c = Classifier::new(&config);
        assert_eq!(c.classify("possible stroke"), PriorityClass::Critical);
        assert_eq!(c.classify("chest pain"), PriorityClass::Low);
    }
}
