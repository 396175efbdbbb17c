//! Location tracker entity
//!
//! Mirrors the `drive_state` category: GPS coordinates, heading, and
//! speed as last reported by the vehicle.

use crate::coordinator::{Category, VehicleDataCoordinator};
use crate::entity::{VehicleEntity, entity_id, payload_f64};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Rendered location state for one vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationState {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Compass heading in degrees
    pub heading: Option<f64>,
    /// Speed in the API's native miles per hour; None while parked
    pub speed: Option<f64>,
    /// Unix timestamp of the GPS fix
    pub gps_as_of: Option<f64>,
}

/// Location view over one vehicle's cached snapshot
pub struct LocationEntity {
    coordinator: Arc<VehicleDataCoordinator>,
    vin: String,
    unique_id: String,
    state: LocationState,
}

impl LocationEntity {
    pub fn new(coordinator: Arc<VehicleDataCoordinator>, vin: &str) -> Self {
        Self {
            coordinator,
            vin: vin.to_string(),
            unique_id: entity_id(vin, "location"),
            state: LocationState::default(),
        }
    }

    /// Last state read from the snapshot
    pub fn state(&self) -> &LocationState {
        &self.state
    }
}

#[async_trait::async_trait]
impl VehicleEntity for LocationEntity {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    async fn refresh(&mut self) -> Result<()> {
        let snapshot = self.coordinator.snapshot(&self.vin).await?;
        let drive = snapshot.get(Category::Drive);

        self.state = LocationState {
            latitude: payload_f64(drive, "latitude"),
            longitude: payload_f64(drive, "longitude"),
            heading: payload_f64(drive, "heading"),
            speed: payload_f64(drive, "speed"),
            gps_as_of: payload_f64(drive, "gps_as_of"),
        };
        Ok(())
    }
}
