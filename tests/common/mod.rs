//! Shared test support: a scriptable in-memory vehicle API
#![allow(dead_code)]

use async_trait::async_trait;
use keraunos::api::{VehicleApi, VehicleHandle};
use keraunos::commands::ControlAction;
use keraunos::error::{KeraunosError, Result};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

pub fn handle(id: u64, vin: &str, name: &str) -> VehicleHandle {
    VehicleHandle {
        id,
        vin: vin.to_string(),
        display_name: name.to_string(),
    }
}

/// In-memory [`VehicleApi`] with call counters and scriptable payloads
/// and transient failures.
pub struct MockVehicleApi {
    vehicles: Vec<VehicleHandle>,
    payloads: Mutex<HashMap<(String, String), Value>>,
    pub wake_calls: AtomicU32,
    pub fetch_calls: AtomicU32,
    pub charge_command_calls: AtomicU32,
    pub climate_command_calls: AtomicU32,
    pub control_calls: AtomicU32,
    fail_next: AtomicU32,
    failing_vin: Mutex<Option<String>>,
}

impl MockVehicleApi {
    pub fn new(vehicles: Vec<VehicleHandle>) -> Self {
        Self {
            vehicles,
            payloads: Mutex::new(HashMap::new()),
            wake_calls: AtomicU32::new(0),
            fetch_calls: AtomicU32::new(0),
            charge_command_calls: AtomicU32::new(0),
            climate_command_calls: AtomicU32::new(0),
            control_calls: AtomicU32::new(0),
            fail_next: AtomicU32::new(0),
            failing_vin: Mutex::new(None),
        }
    }

    /// Payload returned for one VIN/category pair; unset pairs yield `{}`
    pub fn set_payload(&self, vin: &str, category: &str, payload: Value) {
        self.payloads
            .lock()
            .unwrap()
            .insert((vin.to_string(), category.to_string()), payload);
    }

    /// Make the next `count` remote calls fail with a transient error
    pub fn fail_next_transient(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Make every remote call for one VIN fail with a transient error
    pub fn fail_vin_transient(&self, vin: &str) {
        *self.failing_vin.lock().unwrap() = Some(vin.to_string());
    }

    pub fn total_remote_calls(&self) -> u32 {
        self.wake_calls.load(Ordering::SeqCst)
            + self.fetch_calls.load(Ordering::SeqCst)
            + self.charge_command_calls.load(Ordering::SeqCst)
            + self.climate_command_calls.load(Ordering::SeqCst)
            + self.control_calls.load(Ordering::SeqCst)
    }

    fn maybe_fail(&self, vin: &str) -> Result<()> {
        if self.failing_vin.lock().unwrap().as_deref() == Some(vin) {
            return Err(KeraunosError::transient("vehicle unavailable"));
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(KeraunosError::transient("vehicle unavailable"));
        }
        Ok(())
    }

    fn check_vin(&self, vin: &str) -> Result<()> {
        if self.vehicles.iter().any(|v| v.vin == vin) {
            Ok(())
        } else {
            Err(KeraunosError::not_found(vin))
        }
    }

    fn fetch(&self, vin: &str, category: &str) -> Result<Value> {
        self.check_vin(vin)?;
        self.maybe_fail(vin)?;
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .payloads
            .lock()
            .unwrap()
            .get(&(vin.to_string(), category.to_string()))
            .cloned()
            .unwrap_or_else(|| json!({})))
    }
}

#[async_trait]
impl VehicleApi for MockVehicleApi {
    async fn list_vehicles(&self) -> Result<Vec<VehicleHandle>> {
        Ok(self.vehicles.clone())
    }

    async fn wake_up(&self, vin: &str) -> Result<()> {
        self.check_vin(vin)?;
        self.maybe_fail(vin)?;
        self.wake_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn vehicle_state(&self, vin: &str) -> Result<Value> {
        self.fetch(vin, "state")
    }

    async fn drive_state(&self, vin: &str) -> Result<Value> {
        self.fetch(vin, "drive")
    }

    async fn gui_settings(&self, vin: &str) -> Result<Value> {
        self.fetch(vin, "gui")
    }

    async fn charge_state(&self, vin: &str) -> Result<Value> {
        self.fetch(vin, "charge")
    }

    async fn climate_state(&self, vin: &str) -> Result<Value> {
        self.fetch(vin, "climate")
    }

    async fn start_charging(&self, vin: &str) -> Result<()> {
        self.check_vin(vin)?;
        self.maybe_fail(vin)?;
        self.charge_command_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_charging(&self, vin: &str) -> Result<()> {
        self.check_vin(vin)?;
        self.maybe_fail(vin)?;
        self.charge_command_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn start_climate(&self, vin: &str) -> Result<()> {
        self.check_vin(vin)?;
        self.maybe_fail(vin)?;
        self.climate_command_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_climate(&self, vin: &str) -> Result<()> {
        self.check_vin(vin)?;
        self.maybe_fail(vin)?;
        self.climate_command_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn control(&self, vin: &str, _action: ControlAction) -> Result<()> {
        self.check_vin(vin)?;
        self.maybe_fail(vin)?;
        self.control_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

use keraunos::coordinator::VehicleDataCoordinator;
use keraunos::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Retry policy with millisecond delays so retries don't slow tests down
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2))
}

/// A coordinator over a fresh mock with the given vehicles
pub fn coordinator_with(
    vehicles: Vec<VehicleHandle>,
) -> (Arc<MockVehicleApi>, Arc<VehicleDataCoordinator>) {
    let api = Arc::new(MockVehicleApi::new(vehicles.clone()));
    let coordinator = Arc::new(VehicleDataCoordinator::new(
        Arc::clone(&api) as Arc<dyn VehicleApi>,
        vehicles,
        fast_retry(),
    ));
    (api, coordinator)
}
