//! Read-only sensor entities
//!
//! One struct covers all sensor kinds; the kind selects the snapshot
//! field, the device class, and the unit handling. Range values arrive
//! in miles and temperatures in Celsius; both are converted to whatever
//! the vehicle's GUI settings select.

use crate::coordinator::{Category, VehicleDataCoordinator};
use crate::entity::{
    DeviceClass, DistanceUnit, TemperatureUnit, VehicleEntity, entity_id, payload_f64,
};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// The sensor readings exposed per vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    BatteryLevel,
    Range,
    InsideTemperature,
    OutsideTemperature,
}

impl SensorKind {
    /// All kinds instantiated for every vehicle
    pub const ALL: [SensorKind; 4] = [
        SensorKind::BatteryLevel,
        SensorKind::Range,
        SensorKind::InsideTemperature,
        SensorKind::OutsideTemperature,
    ];

    /// Field discriminator used in the entity id
    pub fn key(&self) -> &'static str {
        match self {
            SensorKind::BatteryLevel => "battery_level",
            SensorKind::Range => "range",
            SensorKind::InsideTemperature => "inside_temperature",
            SensorKind::OutsideTemperature => "outside_temperature",
        }
    }

    pub fn device_class(&self) -> DeviceClass {
        match self {
            SensorKind::BatteryLevel => DeviceClass::Battery,
            SensorKind::Range => DeviceClass::Distance,
            SensorKind::InsideTemperature | SensorKind::OutsideTemperature => {
                DeviceClass::Temperature
            }
        }
    }
}

/// Rendered sensor state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorState {
    pub value: Option<f64>,
    pub unit: &'static str,
    pub device_class: &'static str,
}

/// One read-only measurement over one vehicle's cached snapshot
pub struct SensorEntity {
    coordinator: Arc<VehicleDataCoordinator>,
    vin: String,
    kind: SensorKind,
    unique_id: String,
    state: SensorState,
}

impl SensorEntity {
    pub fn new(coordinator: Arc<VehicleDataCoordinator>, vin: &str, kind: SensorKind) -> Self {
        Self {
            coordinator,
            vin: vin.to_string(),
            kind,
            unique_id: entity_id(vin, kind.key()),
            state: SensorState {
                value: None,
                unit: "",
                device_class: kind.device_class().as_str(),
            },
        }
    }

    /// Every sensor kind for one vehicle
    pub fn all_for(coordinator: &Arc<VehicleDataCoordinator>, vin: &str) -> Vec<SensorEntity> {
        SensorKind::ALL
            .iter()
            .map(|kind| SensorEntity::new(Arc::clone(coordinator), vin, *kind))
            .collect()
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Last state read from the snapshot
    pub fn state(&self) -> &SensorState {
        &self.state
    }
}

#[async_trait::async_trait]
impl VehicleEntity for SensorEntity {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    async fn refresh(&mut self) -> Result<()> {
        let snapshot = self.coordinator.snapshot(&self.vin).await?;
        let gui = snapshot.get(Category::Gui);
        let device_class = self.kind.device_class().as_str();

        self.state = match self.kind {
            SensorKind::BatteryLevel => SensorState {
                value: payload_f64(snapshot.get(Category::Charge), "battery_level"),
                unit: "%",
                device_class,
            },
            SensorKind::Range => {
                let unit = DistanceUnit::from_gui(gui);
                SensorState {
                    value: payload_f64(snapshot.get(Category::Charge), "battery_range")
                        .map(|mi| unit.from_miles(mi)),
                    unit: unit.symbol(),
                    device_class,
                }
            }
            SensorKind::InsideTemperature => {
                let unit = TemperatureUnit::from_gui(gui);
                SensorState {
                    value: payload_f64(snapshot.get(Category::Climate), "inside_temp")
                        .map(|c| unit.from_celsius(c)),
                    unit: unit.symbol(),
                    device_class,
                }
            }
            SensorKind::OutsideTemperature => {
                let unit = TemperatureUnit::from_gui(gui);
                SensorState {
                    value: payload_f64(snapshot.get(Category::Climate), "outside_temp")
                        .map(|c| unit.from_celsius(c)),
                    unit: unit.symbol(),
                    device_class,
                }
            }
        };
        Ok(())
    }
}
