//! Charging switch entity
//!
//! On iff the cached `charging_state` is anything but `"Stopped"`,
//! matching how the charge port reports an active or pending charge.

use crate::coordinator::{Category, VehicleDataCoordinator};
use crate::entity::{VehicleEntity, entity_id, payload_str};
use crate::error::Result;
use crate::logging::{LogContext, get_logger_with_context};
use crate::retry::retry_request;
use serde::Serialize;
use std::sync::Arc;

/// Rendered charging switch state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChargingSwitchState {
    /// None until the charge category has been fetched once
    pub is_on: Option<bool>,
    pub charging_state: Option<String>,
}

/// Charging on/off view over one vehicle's cached snapshot
pub struct ChargingSwitch {
    coordinator: Arc<VehicleDataCoordinator>,
    vin: String,
    unique_id: String,
    state: ChargingSwitchState,
    logger: crate::logging::StructuredLogger,
}

impl ChargingSwitch {
    pub fn new(coordinator: Arc<VehicleDataCoordinator>, vin: &str) -> Self {
        Self {
            coordinator,
            vin: vin.to_string(),
            unique_id: entity_id(vin, "charging"),
            state: ChargingSwitchState::default(),
            logger: get_logger_with_context(LogContext::new("switch").with_vin(vin)),
        }
    }

    /// Last state read from the snapshot
    pub fn state(&self) -> &ChargingSwitchState {
        &self.state
    }

    /// Wake the vehicle, start charging, refresh the charge category
    pub async fn turn_on(&self) -> Result<()> {
        self.command(true).await
    }

    /// Wake the vehicle, stop charging, refresh the charge category
    pub async fn turn_off(&self) -> Result<()> {
        self.command(false).await
    }

    async fn command(&self, start: bool) -> Result<()> {
        self.coordinator.wake_vehicle(&self.vin).await?;

        let api = self.coordinator.api();
        let vin = self.vin.clone();
        let name = if start { "start_charging" } else { "stop_charging" };
        retry_request(
            self.coordinator.retry_policy(),
            &format!("{} for {}", name, vin),
            || async {
                if start {
                    api.start_charging(&vin).await
                } else {
                    api.stop_charging(&vin).await
                }
            },
        )
        .await?;

        self.coordinator
            .refresh_category(&self.vin, Category::Charge, true)
            .await?;
        self.logger
            .debug(&format!("Turned charging switch {}", if start { "on" } else { "off" }));
        Ok(())
    }
}

#[async_trait::async_trait]
impl VehicleEntity for ChargingSwitch {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    async fn refresh(&mut self) -> Result<()> {
        let snapshot = self.coordinator.snapshot(&self.vin).await?;
        let charge = snapshot.get(Category::Charge);
        let charging_state = payload_str(charge, "charging_state").map(str::to_string);

        self.state = ChargingSwitchState {
            is_on: charging_state.as_deref().map(|s| s != "Stopped"),
            charging_state,
        };
        Ok(())
    }
}
