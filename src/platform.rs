//! Platform wiring between the coordinator and the entity adapters
//!
//! For every vehicle the coordinator knows, one task owns that vehicle's
//! full entity set and re-refreshes it whenever the vehicle's update
//! channel fires. Entities therefore track the cache passively; nothing
//! here touches the network.

use crate::coordinator::VehicleDataCoordinator;
use crate::entity::{
    ChargingSwitch, ClimateEntity, LocationEntity, SensorEntity, VehicleEntity,
};
use crate::logging::{LogContext, get_logger_with_context};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// The full entity set for one vehicle: climate, charging switch, the
/// four sensors, and the location tracker.
pub fn build_entities(
    coordinator: &Arc<VehicleDataCoordinator>,
    vin: &str,
) -> Vec<Box<dyn VehicleEntity>> {
    let mut entities: Vec<Box<dyn VehicleEntity>> = vec![
        Box::new(ClimateEntity::new(Arc::clone(coordinator), vin)),
        Box::new(ChargingSwitch::new(Arc::clone(coordinator), vin)),
        Box::new(LocationEntity::new(Arc::clone(coordinator), vin)),
    ];
    for sensor in SensorEntity::all_for(coordinator, vin) {
        entities.push(Box::new(sensor));
    }
    entities
}

/// Spawn one refresh task per known vehicle.
///
/// Each task blocks on the vehicle's update channel and re-reads every
/// entity on each event. A lagged receiver just catches up on the next
/// event, since entities read the latest snapshot anyway. Tasks end when
/// the coordinator (and with it the channel sender) is dropped.
pub fn spawn_entity_tasks(coordinator: &Arc<VehicleDataCoordinator>) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();
    for vehicle in coordinator.vehicles() {
        let vin = vehicle.vin.clone();
        let Ok(mut rx) = coordinator.subscribe(&vin) else {
            // Unreachable for VINs from vehicles(), but don't panic the caller
            continue;
        };
        let coordinator = Arc::clone(coordinator);
        handles.push(tokio::spawn(async move {
            let logger =
                get_logger_with_context(LogContext::new("platform").with_vin(&vin));
            let mut entities = build_entities(&coordinator, &vin);
            logger.info(&format!("Tracking {} entities", entities.len()));

            loop {
                match rx.recv().await {
                    Ok(_update) => {
                        for entity in entities.iter_mut() {
                            if let Err(e) = entity.refresh().await {
                                logger.debug(&format!(
                                    "Entity {} refresh failed: {}",
                                    entity.unique_id(),
                                    e
                                ));
                            }
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        logger.debug(&format!("Missed {} update events", missed));
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }
    handles
}
