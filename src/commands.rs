//! Named control actions and their dispatch
//!
//! Commands arrive as `{vin, action}` pairs from the web surface. The
//! action set is a closed enum mapped to fixed API endpoints; anything
//! outside it is rejected at parse time instead of being resolved
//! dynamically against the client.

use crate::coordinator::VehicleDataCoordinator;
use crate::error::{KeraunosError, Result};
use crate::logging::get_logger;
use crate::retry::retry_request;
use serde::{Deserialize, Serialize};

/// The zero-argument control actions a vehicle supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    FlashLights,
    HonkHorn,
}

impl ControlAction {
    /// Remote command endpoint for this action
    pub fn endpoint(&self) -> &'static str {
        match self {
            ControlAction::FlashLights => "flash_lights",
            ControlAction::HonkHorn => "honk_horn",
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl std::str::FromStr for ControlAction {
    type Err = KeraunosError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flash_lights" => Ok(ControlAction::FlashLights),
            "honk_horn" => Ok(ControlAction::HonkHorn),
            other => Err(KeraunosError::validation(
                "action",
                &format!("Unsupported control action: {}", other),
            )),
        }
    }
}

/// Resolve a vehicle by VIN, wake it, and invoke the named action.
///
/// An unknown VIN is reported to the caller and logged, never fatal.
pub async fn dispatch_control(
    coordinator: &VehicleDataCoordinator,
    vin: &str,
    action: ControlAction,
) -> Result<()> {
    let logger = get_logger("commands");

    let vehicle = match coordinator.get_vehicle(vin) {
        Ok(v) => v,
        Err(e) => {
            logger.warn(&format!("Dropping {} command: {}", action, e));
            return Err(e);
        }
    };

    coordinator.wake_vehicle(&vehicle.vin).await?;

    let api = coordinator.api();
    let target = vehicle.vin.clone();
    retry_request(
        coordinator.retry_policy(),
        &format!("{} for {}", action, target),
        || async { api.control(&target, action).await },
    )
    .await?;

    logger.debug(&format!("Dispatched {} to {}", action, vin));
    Ok(())
}
