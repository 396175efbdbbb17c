//! Device entity adapters
//!
//! Each entity presents one field (or a small coherent cluster) of a
//! vehicle's cached snapshot under a stable id of the form
//! `tesla_<vin>_<kind>`. Entities never call the network to read:
//! `refresh()` re-reads the coordinator's snapshot into local state, and
//! the platform glue re-refreshes them whenever the vehicle's update
//! channel fires. Writable entities wake the vehicle, issue the remote
//! action, and trigger a notifying category refresh so sibling entities
//! converge.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

pub mod climate;
pub mod sensor;
pub mod switch;
pub mod tracker;

pub use climate::{ClimateEntity, ClimateState};
pub use sensor::{SensorEntity, SensorKind, SensorState};
pub use switch::{ChargingSwitch, ChargingSwitchState};
pub use tracker::{LocationEntity, LocationState};

/// Prefix of every entity id
pub const ENTITY_PREFIX: &str = "tesla";

/// Build the stable id for one entity of one vehicle
pub fn entity_id(vin: &str, kind: &str) -> String {
    format!("{}_{}_{}", ENTITY_PREFIX, vin, kind)
}

/// A single addressable view over one vehicle's snapshot
#[async_trait::async_trait]
pub trait VehicleEntity: Send + Sync {
    /// Stable identifier derived from VIN and field
    fn unique_id(&self) -> &str;

    /// Re-read the coordinator's snapshot into local state
    async fn refresh(&mut self) -> Result<()>;
}

/// Temperature unit from the vehicle's GUI settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Derive the unit from a cached `gui_settings` payload.
    /// Defaults to Celsius when the payload is missing.
    pub fn from_gui(gui: Option<&Value>) -> Self {
        match gui
            .and_then(|g| g.get("gui_temperature_units"))
            .and_then(Value::as_str)
        {
            Some("F") => TemperatureUnit::Fahrenheit,
            _ => TemperatureUnit::Celsius,
        }
    }

    /// Convert a Celsius reading (the API's native unit) to this unit
    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

/// Distance unit from the vehicle's GUI settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DistanceUnit {
    #[default]
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
}

const KM_PER_MILE: f64 = 1.609_344;

impl DistanceUnit {
    /// Derive the unit from a cached `gui_settings` payload
    /// (`gui_distance_units` is `"km/hr"` or `"mi/hr"`).
    pub fn from_gui(gui: Option<&Value>) -> Self {
        match gui
            .and_then(|g| g.get("gui_distance_units"))
            .and_then(Value::as_str)
        {
            Some(units) if units.starts_with("mi") => DistanceUnit::Miles,
            _ => DistanceUnit::Kilometers,
        }
    }

    /// Convert a miles reading (the API's native unit) to this unit
    pub fn from_miles(&self, miles: f64) -> f64 {
        match self {
            DistanceUnit::Kilometers => miles * KM_PER_MILE,
            DistanceUnit::Miles => miles,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }
}

/// Device classification for sensor-like entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Battery,
    Temperature,
    Distance,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Battery => "battery",
            DeviceClass::Temperature => "temperature",
            DeviceClass::Distance => "distance",
        }
    }
}

/// Fetch a float field out of an opaque category payload
pub(crate) fn payload_f64(payload: Option<&Value>, field: &str) -> Option<f64> {
    payload.and_then(|p| p.get(field)).and_then(Value::as_f64)
}

/// Fetch a bool field out of an opaque category payload
pub(crate) fn payload_bool(payload: Option<&Value>, field: &str) -> Option<bool> {
    payload.and_then(|p| p.get(field)).and_then(Value::as_bool)
}

/// Fetch a string field out of an opaque category payload
pub(crate) fn payload_str<'a>(payload: Option<&'a Value>, field: &str) -> Option<&'a str> {
    payload.and_then(|p| p.get(field)).and_then(Value::as_str)
}
