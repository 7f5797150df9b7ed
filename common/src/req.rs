// keep in sync with db.rs of backend
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// One sample of incubator telemetry, as stored in the `values` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub temperature: f32,       // °C
    pub humidity: f32,          // percent
    pub air_quality_index: f32, // unitless
    pub uv_radiation: f32,      // mW/cm²
    pub flame_detected: bool,
    pub light_intensity: f32, // lux
    #[serde(default)]
    pub camera_feed: String,
}

impl Reading {
    pub fn value(&self, metric: Metric) -> f32 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::AirQualityIndex => self.air_quality_index,
            Metric::UvRadiation => self.uv_radiation,
            Metric::LightIntensity => self.light_intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Metric {
    Temperature = 1 << 0,
    Humidity = 1 << 1,
    AirQualityIndex = 1 << 2,
    UvRadiation = 1 << 3,
    LightIntensity = 1 << 4,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::AirQualityIndex,
        Metric::UvRadiation,
        Metric::LightIntensity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::AirQualityIndex => "Air Quality Index",
            Metric::UvRadiation => "UV Radiation",
            Metric::LightIntensity => "Light Intensity",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::AirQualityIndex => "",
            Metric::UvRadiation => "mW/cm²",
            Metric::LightIntensity => "lux",
        }
    }

    /// Chart legend label, e.g. "Temperature (°C)".
    pub fn label(&self) -> String {
        match self.unit() {
            "" => self.name().to_string(),
            unit => format!("{} ({unit})", self.name()),
        }
    }
}

/// Set of metrics selected for charting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricMask(pub u32);

impl MetricMask {
    pub fn is_set(&self, other: Metric) -> bool {
        self.0 & other as u32 > 0
    }

    pub fn set(&mut self, other: Metric, active: bool) {
        if active {
            self.0 |= other as u32;
        } else {
            self.0 &= !(other as u32);
        }
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        Metric::ALL.into_iter().filter(|m| self.is_set(*m))
    }

    pub const ALL: Self = Self(0xFFFFFFFF);
}

impl Default for MetricMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub doctor_name: String,
    #[serde(rename = "doctorID")]
    pub doctor_id: String,
    pub doctor_password: String,
}

/// Doctor fields as entered on the registration and edit forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorFields {
    pub doctor_name: String,
    #[serde(rename = "doctorID")]
    pub doctor_id: String,
    pub doctor_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incubator {
    pub id: String,
    pub parent_name: String,
    #[serde(rename = "parentID")]
    pub parent_id: String,
    pub parent_password: String,
    pub baby_gender: String,
    #[serde(rename = "babyDOB")]
    pub baby_dob: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncubatorFields {
    pub parent_name: String,
    #[serde(rename = "parentID")]
    pub parent_id: String,
    pub parent_password: String,
    pub baby_gender: String,
    #[serde(rename = "babyDOB")]
    pub baby_dob: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredentialCheck {
    pub valid: bool,
}

/// Who is logging in; selects the collection the credentials are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "parent" => Ok(Role::Parent),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_uses_console_field_names() {
        let json = r#"{
            "temperature": 25.5,
            "humidity": 45.0,
            "airQualityIndex": 30.0,
            "uvRadiation": 1.2,
            "flameDetected": false,
            "lightIntensity": 300.0,
            "cameraFeed": "http://192.168.61.246/"
        }"#;
        let reading: Reading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.air_quality_index, 30.0);
        assert_eq!(reading.value(Metric::LightIntensity), 300.0);
        assert_eq!(reading.camera_feed, "http://192.168.61.246/");
    }

    #[test]
    fn camera_feed_is_optional() {
        let json = r#"{"temperature":1,"humidity":2,"airQualityIndex":3,"uvRadiation":4,"flameDetected":true,"lightIntensity":5}"#;
        let reading: Reading = serde_json::from_str(json).unwrap();
        assert!(reading.camera_feed.is_empty());
        assert!(reading.flame_detected);
    }

    #[test]
    fn record_ids_keep_upper_case_suffix() {
        let doctor = DoctorFields {
            doctor_name: "Ada".into(),
            doctor_id: "d-1".into(),
            doctor_password: "pw".into(),
        };
        let json = serde_json::to_value(&doctor).unwrap();
        assert_eq!(json["doctorID"], "d-1");
        assert_eq!(json["doctorName"], "Ada");

        let incubator: IncubatorFields = serde_json::from_str(
            r#"{"parentName":"P","parentID":"p-1","parentPassword":"x","babyGender":"F","babyDOB":"2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(incubator.parent_id, "p-1");
        assert_eq!(incubator.baby_dob, "2024-01-01");
    }

    #[test]
    fn mask_toggles_metrics() {
        let mut mask = MetricMask::default();
        assert_eq!(mask.metrics().count(), 5);
        mask.set(Metric::Humidity, false);
        assert!(!mask.is_set(Metric::Humidity));
        assert!(mask.is_set(Metric::Temperature));
        mask.set(Metric::Humidity, true);
        assert!(mask.is_set(Metric::Humidity));
    }

    #[test]
    fn role_round_trips_through_path_segment() {
        assert_eq!("doctor".parse::<Role>(), Ok(Role::Doctor));
        assert_eq!(Role::Parent.to_string(), "parent");
        assert!("admin".parse::<Role>().is_err());
    }
}
