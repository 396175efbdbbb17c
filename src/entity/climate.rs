//! HVAC entity: on/off plus current and target temperature
//!
//! Temperatures come from the `climate` category (always Celsius on the
//! wire) and are rendered in the unit the vehicle's GUI settings select.

use crate::coordinator::{Category, VehicleDataCoordinator};
use crate::entity::{TemperatureUnit, VehicleEntity, entity_id, payload_bool, payload_f64};
use crate::error::Result;
use crate::logging::{LogContext, get_logger_with_context};
use crate::retry::retry_request;
use serde::Serialize;
use std::sync::Arc;

/// Rendered climate state for one vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClimateState {
    pub is_on: Option<bool>,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub unit: TemperatureUnit,
}

/// Climate view over one vehicle's cached snapshot
pub struct ClimateEntity {
    coordinator: Arc<VehicleDataCoordinator>,
    vin: String,
    unique_id: String,
    state: ClimateState,
    logger: crate::logging::StructuredLogger,
}

impl ClimateEntity {
    pub fn new(coordinator: Arc<VehicleDataCoordinator>, vin: &str) -> Self {
        Self {
            coordinator,
            vin: vin.to_string(),
            unique_id: entity_id(vin, "climate"),
            state: ClimateState::default(),
            logger: get_logger_with_context(LogContext::new("climate").with_vin(vin)),
        }
    }

    /// Last state read from the snapshot
    pub fn state(&self) -> &ClimateState {
        &self.state
    }

    /// Wake the vehicle, start HVAC, and refresh the climate category
    /// with notification so sibling entities converge.
    pub async fn turn_on(&self) -> Result<()> {
        self.coordinator.wake_vehicle(&self.vin).await?;

        let api = self.coordinator.api();
        let vin = self.vin.clone();
        retry_request(
            self.coordinator.retry_policy(),
            &format!("start_climate for {}", vin),
            || async { api.start_climate(&vin).await },
        )
        .await?;

        self.coordinator
            .refresh_category(&self.vin, Category::Climate, true)
            .await?;
        self.logger.debug("Turned climate on");
        Ok(())
    }

    /// Wake the vehicle, stop HVAC, and refresh the climate category
    pub async fn turn_off(&self) -> Result<()> {
        self.coordinator.wake_vehicle(&self.vin).await?;

        let api = self.coordinator.api();
        let vin = self.vin.clone();
        retry_request(
            self.coordinator.retry_policy(),
            &format!("stop_climate for {}", vin),
            || async { api.stop_climate(&vin).await },
        )
        .await?;

        self.coordinator
            .refresh_category(&self.vin, Category::Climate, true)
            .await?;
        self.logger.debug("Turned climate off");
        Ok(())
    }
}

#[async_trait::async_trait]
impl VehicleEntity for ClimateEntity {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    async fn refresh(&mut self) -> Result<()> {
        let snapshot = self.coordinator.snapshot(&self.vin).await?;
        let unit = TemperatureUnit::from_gui(snapshot.get(Category::Gui));
        let climate = snapshot.get(Category::Climate);

        self.state = ClimateState {
            is_on: payload_bool(climate, "is_climate_on"),
            current_temperature: payload_f64(climate, "inside_temp").map(|c| unit.from_celsius(c)),
            target_temperature: payload_f64(climate, "driver_temp_setting")
                .map(|c| unit.from_celsius(c)),
            unit,
        };
        Ok(())
    }
}
