//! Presentation status of a reading.
//!
//! Classification is a pure function of the values; there is no hysteresis, so a
//! value sitting on a boundary flips status from one sample to the next.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::req::{Metric, Reading};

/// Ordered from least to most severe; `Stale` only appears after [`Status::displayed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    Good,
    Warning,
    Stale,
    Critical,
}

impl Status {
    /// Status as shown to the operator: old data reads `Stale` unless it is critical.
    pub fn displayed(self, stale: bool) -> Status {
        if stale && self != Status::Critical {
            Status::Stale
        } else {
            self
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Good => "Good",
            Status::Warning => "Warning",
            Status::Stale => "Stale",
            Status::Critical => "Critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn temperature(celsius: f32) -> Status {
    if celsius < 20.0 {
        Status::Critical
    } else if celsius <= 30.0 {
        Status::Good
    } else if celsius <= 35.0 {
        Status::Warning
    } else {
        Status::Critical
    }
}

pub fn humidity(percent: f32) -> Status {
    if !(30.0..=70.0).contains(&percent) {
        Status::Critical
    } else if !(40.0..=60.0).contains(&percent) {
        Status::Warning
    } else {
        Status::Good
    }
}

fn upper_bounded(value: f32, warning_above: f32, critical_above: f32) -> Status {
    if value > critical_above {
        Status::Critical
    } else if value > warning_above {
        Status::Warning
    } else {
        Status::Good
    }
}

pub fn air_quality_index(index: f32) -> Status {
    upper_bounded(index, 50.0, 100.0)
}

pub fn uv_radiation(mw_per_cm2: f32) -> Status {
    upper_bounded(mw_per_cm2, 3.0, 5.0)
}

pub fn light_intensity(lux: f32) -> Status {
    upper_bounded(lux, 1000.0, 2000.0)
}

pub fn flame(detected: bool) -> Status {
    if detected {
        Status::Critical
    } else {
        Status::Good
    }
}

pub fn metric(metric: Metric, value: f32) -> Status {
    match metric {
        Metric::Temperature => temperature(value),
        Metric::Humidity => humidity(value),
        Metric::AirQualityIndex => air_quality_index(value),
        Metric::UvRadiation => uv_radiation(value),
        Metric::LightIntensity => light_intensity(value),
    }
}

/// Worst status over every field of the reading.
pub fn classify(reading: &Reading) -> Status {
    Metric::ALL
        .iter()
        .map(|m| metric(*m, reading.value(*m)))
        .chain(std::iter::once(flame(reading.flame_detected)))
        .max()
        .unwrap_or(Status::Good)
}

/// A reading is stale once `stale_after` has passed since it was delivered.
pub fn is_stale(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>, stale_after: Duration) -> bool {
    match last_updated {
        Some(at) => now - at >= stale_after,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_reading() -> Reading {
        Reading {
            temperature: 25.0,
            humidity: 50.0,
            air_quality_index: 20.0,
            uv_radiation: 1.0,
            flame_detected: false,
            light_intensity: 400.0,
            camera_feed: String::new(),
        }
    }

    #[test]
    fn temperature_bands() {
        assert_eq!(temperature(36.0), Status::Critical);
        assert_eq!(temperature(32.0), Status::Warning);
        assert_eq!(temperature(25.0), Status::Good);
        assert_eq!(temperature(19.9), Status::Critical);
        assert_eq!(temperature(30.0), Status::Good);
        assert_eq!(temperature(35.0), Status::Warning);
    }

    #[test]
    fn humidity_bands() {
        assert_eq!(humidity(29.0), Status::Critical);
        assert_eq!(humidity(71.0), Status::Critical);
        assert_eq!(humidity(35.0), Status::Warning);
        assert_eq!(humidity(65.0), Status::Warning);
        assert_eq!(humidity(40.0), Status::Good);
        assert_eq!(humidity(60.0), Status::Good);
    }

    #[test]
    fn upper_bounded_metrics() {
        assert_eq!(air_quality_index(50.0), Status::Good);
        assert_eq!(air_quality_index(75.0), Status::Warning);
        assert_eq!(air_quality_index(101.0), Status::Critical);
        assert_eq!(uv_radiation(3.0), Status::Good);
        assert_eq!(uv_radiation(4.0), Status::Warning);
        assert_eq!(uv_radiation(5.5), Status::Critical);
        assert_eq!(light_intensity(1000.0), Status::Good);
        assert_eq!(light_intensity(2000.0), Status::Warning);
        assert_eq!(light_intensity(2500.0), Status::Critical);
    }

    #[test]
    fn reading_takes_worst_field() {
        let mut reading = good_reading();
        assert_eq!(classify(&reading), Status::Good);

        reading.temperature = 32.0;
        assert_eq!(classify(&reading), Status::Warning);

        reading.temperature = 36.0;
        assert_eq!(classify(&reading), Status::Critical);
    }

    #[test]
    fn flame_is_always_critical() {
        let mut reading = good_reading();
        reading.flame_detected = true;
        assert_eq!(classify(&reading), Status::Critical);
    }

    #[test]
    fn stale_display_keeps_critical() {
        assert_eq!(Status::Good.displayed(true), Status::Stale);
        assert_eq!(Status::Warning.displayed(true), Status::Stale);
        assert_eq!(Status::Critical.displayed(true), Status::Critical);
        assert_eq!(Status::Warning.displayed(false), Status::Warning);
    }

    #[test]
    fn staleness_starts_at_the_interval() {
        let t0 = Utc::now();
        let interval = Duration::seconds(60);
        assert!(!is_stale(None, t0, interval));
        assert!(!is_stale(Some(t0), t0 + Duration::milliseconds(59_999), interval));
        assert!(is_stale(Some(t0), t0 + Duration::seconds(60), interval));
        assert!(is_stale(Some(t0), t0 + Duration::seconds(90), interval));
    }
}
