//! Vehicle cloud API abstraction
//!
//! The coordinator and the entity adapters talk to the vehicle cloud
//! through the [`VehicleApi`] trait so they can be exercised against a
//! mock in tests. The concrete Tesla owner API client lives in
//! [`tesla`].

use crate::commands::ControlAction;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod tesla;

/// Handle for one vehicle known to the account.
///
/// The VIN is the unique key for all per-vehicle state; the numeric id
/// is what the remote API addresses requests by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleHandle {
    /// Remote API identifier
    pub id: u64,

    /// Vehicle identification number
    pub vin: String,

    /// User-assigned vehicle name
    pub display_name: String,
}

/// Remote vehicle API operations.
///
/// State getters return the opaque JSON payload of the corresponding
/// remote call; the coordinator caches them wholesale without looking
/// inside. Any method may fail with a transient error, which callers
/// are expected to retry with [`crate::retry::retry_request`].
#[async_trait::async_trait]
pub trait VehicleApi: Send + Sync {
    /// List the vehicles on the account
    async fn list_vehicles(&self) -> Result<Vec<VehicleHandle>>;

    /// Bring a sleeping vehicle online
    async fn wake_up(&self, vin: &str) -> Result<()>;

    /// Rollup vehicle state (odometer, lock state, ...)
    async fn vehicle_state(&self, vin: &str) -> Result<Value>;

    /// Position, heading and speed
    async fn drive_state(&self, vin: &str) -> Result<Value>;

    /// Per-vehicle unit settings (C/F, km/mi)
    async fn gui_settings(&self, vin: &str) -> Result<Value>;

    /// Battery and charging state
    async fn charge_state(&self, vin: &str) -> Result<Value>;

    /// HVAC state
    async fn climate_state(&self, vin: &str) -> Result<Value>;

    async fn start_charging(&self, vin: &str) -> Result<()>;

    async fn stop_charging(&self, vin: &str) -> Result<()>;

    async fn start_climate(&self, vin: &str) -> Result<()>;

    async fn stop_climate(&self, vin: &str) -> Result<()>;

    /// Invoke one of the named zero-argument control actions
    async fn control(&self, vin: &str, action: ControlAction) -> Result<()>;
}
