use crate::{
    bucket::TimeBucketKey,
    req::{Metric, Reading},
};

/// Readings observed during one dashboard session, in arrival order.
///
/// Every metric column is index-aligned with `keys`. Arrival order is not
/// necessarily chronological: jumping between historical and live selections
/// appends whatever arrives next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    keys: Vec<TimeBucketKey>,
    temperature: Vec<f32>,
    humidity: Vec<f32>,
    air_quality_index: Vec<f32>,
    uv_radiation: Vec<f32>,
    light_intensity: Vec<f32>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one sample. Repeated keys are appended again.
    pub fn record(&mut self, key: TimeBucketKey, reading: &Reading) {
        self.keys.push(key);
        self.temperature.push(reading.temperature);
        self.humidity.push(reading.humidity);
        self.air_quality_index.push(reading.air_quality_index);
        self.uv_radiation.push(reading.uv_radiation);
        self.light_intensity.push(reading.light_intensity);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[TimeBucketKey] {
        &self.keys
    }

    pub fn values(&self, metric: Metric) -> &[f32] {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
            Metric::AirQualityIndex => &self.air_quality_index,
            Metric::UvRadiation => &self.uv_radiation,
            Metric::LightIntensity => &self.light_intensity,
        }
    }

    pub fn points(&self, metric: Metric) -> impl Iterator<Item = (&TimeBucketKey, f32)> + '_ {
        self.keys.iter().zip(self.values(metric).iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub key_min: TimeBucketKey,
    pub key_max: TimeBucketKey,
    pub y_min: f32,
    pub y_max: f32,
}

impl SeriesStats {
    pub fn y_range(&self) -> f32 {
        self.y_max - self.y_min
    }
}

pub trait Stats {
    /// Min and max of one metric, `None` when nothing has been recorded.
    fn stats(&self, metric: Metric) -> Option<SeriesStats>;
}

impl Stats for TimeSeries {
    fn stats(&self, metric: Metric) -> Option<SeriesStats> {
        let mut stats: Option<SeriesStats> = None;

        for (key, y) in self.points(metric) {
            if y.is_nan() {
                continue;
            }
            match stats.as_mut() {
                None => {
                    stats = Some(SeriesStats {
                        key_min: key.clone(),
                        key_max: key.clone(),
                        y_min: y,
                        y_max: y,
                    })
                }
                Some(s) => {
                    if s.y_max < y {
                        s.y_max = y;
                        s.key_max = key.clone();
                    }
                    if s.y_min > y {
                        s.y_min = y;
                        s.key_min = key.clone();
                    }
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temperature: f32) -> Reading {
        Reading {
            temperature,
            humidity: 50.0,
            air_quality_index: 10.0,
            uv_radiation: 0.5,
            flame_detected: false,
            light_intensity: 200.0,
            camera_feed: String::new(),
        }
    }

    fn key(s: &str) -> TimeBucketKey {
        TimeBucketKey::parse(s).unwrap()
    }

    #[test]
    fn record_keeps_columns_aligned() {
        let mut series = TimeSeries::new();
        series.record(key("2024-03-05_09-07"), &reading(25.0));
        series.record(key("2024-03-05_09-08"), &reading(26.0));

        assert_eq!(series.len(), 2);
        for metric in Metric::ALL {
            assert_eq!(series.values(metric).len(), 2);
        }
        assert_eq!(series.values(Metric::Temperature), &[25.0, 26.0]);
        assert_eq!(series.keys()[1].as_str(), "2024-03-05_09-08");
    }

    #[test]
    fn duplicate_keys_are_appended() {
        let mut series = TimeSeries::new();
        series.record(key("2024-03-05_09-07"), &reading(25.0));
        series.record(key("2024-03-05_09-07"), &reading(25.0));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn stats_track_extremes() {
        let mut series = TimeSeries::new();
        assert!(series.stats(Metric::Temperature).is_none());

        series.record(key("2024-03-05_09-07"), &reading(25.0));
        series.record(key("2024-03-05_09-08"), &reading(31.5));
        series.record(key("2024-03-05_09-09"), &reading(22.0));

        let stats = series.stats(Metric::Temperature).unwrap();
        assert_eq!(stats.y_max, 31.5);
        assert_eq!(stats.key_max.as_str(), "2024-03-05_09-08");
        assert_eq!(stats.y_min, 22.0);
        assert_eq!(stats.key_min.as_str(), "2024-03-05_09-09");
        assert_eq!(stats.y_range(), 9.5);
    }
}
