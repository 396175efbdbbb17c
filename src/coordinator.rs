//! Vehicle data coordinator
//!
//! [`VehicleDataCoordinator`] owns the per-VIN snapshot cache, drives the
//! periodic refresh loop, serves on-demand category refreshes, and
//! republishes a typed "vehicle updated" event per VIN after each
//! successful cache write. Consumers hold an `Arc` to the coordinator and
//! re-read [`VehicleDataCoordinator::snapshot`] when notified; events
//! carry no vehicle state of their own.

use crate::api::{VehicleApi, VehicleHandle};
use crate::error::{KeraunosError, Result};
use crate::logging::get_logger;
use crate::retry::{RetryPolicy, retry_request};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, broadcast, mpsc};
use tokio::time::interval;

/// Capacity of each per-vehicle update channel. Consumers that lag by
/// more than this many refresh cycles see a `Lagged` recv error and
/// simply re-read the snapshot.
const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// One of the five remote-state groupings cached per vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Charge,
    Climate,
    Drive,
    Gui,
    State,
}

impl Category {
    /// All categories, in the order `refresh_all` fetches them
    pub const ALL: [Category; 5] = [
        Category::Charge,
        Category::Climate,
        Category::Drive,
        Category::Gui,
        Category::State,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Charge => "charge",
            Category::Climate => "climate",
            Category::Drive => "drive",
            Category::Gui => "gui",
            Category::State => "state",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cached category payload and when it was fetched
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRecord {
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

/// The cached, possibly partial, set of category payloads for one vehicle.
///
/// A category is present only after at least one successful refresh of
/// that category; each write replaces the payload wholesale.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VehicleSnapshot {
    categories: HashMap<Category, CategoryRecord>,
}

impl VehicleSnapshot {
    /// Payload of a category, if it has been fetched at least once
    pub fn get(&self, category: Category) -> Option<&Value> {
        self.categories.get(&category).map(|r| &r.payload)
    }

    /// When a category was last fetched
    pub fn fetched_at(&self, category: Category) -> Option<DateTime<Utc>> {
        self.categories.get(&category).map(|r| r.fetched_at)
    }

    /// True until the first successful refresh of any category
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn insert(&mut self, category: Category, payload: Value) {
        self.categories.insert(
            category,
            CategoryRecord {
                payload,
                fetched_at: Utc::now(),
            },
        );
    }
}

/// Event published after a successful cache write for a vehicle.
///
/// Carries only the VIN and a timestamp; subscribers re-read the
/// snapshot rather than receiving state in the event.
#[derive(Debug, Clone)]
pub struct VehicleUpdated {
    pub vin: String,
    pub at: DateTime<Utc>,
}

/// Owns the per-VIN cache and refresh scheduling
pub struct VehicleDataCoordinator {
    api: Arc<dyn VehicleApi>,
    vehicles: Vec<VehicleHandle>,
    cache: RwLock<HashMap<String, VehicleSnapshot>>,
    update_channels: HashMap<String, broadcast::Sender<VehicleUpdated>>,
    retry_policy: RetryPolicy,
    // Serializes whole-refresh sequences so a timer-driven refresh and an
    // action-triggered refresh cannot interleave partial snapshots.
    refresh_guard: Mutex<()>,
    logger: crate::logging::StructuredLogger,
}

impl VehicleDataCoordinator {
    /// Create a coordinator for the given vehicles.
    ///
    /// Every VIN known here has a cache entry (initially empty) and an
    /// update channel for its entire lifetime; entries are never removed.
    pub fn new(
        api: Arc<dyn VehicleApi>,
        vehicles: Vec<VehicleHandle>,
        retry_policy: RetryPolicy,
    ) -> Self {
        let mut cache = HashMap::with_capacity(vehicles.len());
        let mut update_channels = HashMap::with_capacity(vehicles.len());
        for vehicle in &vehicles {
            cache.insert(vehicle.vin.clone(), VehicleSnapshot::default());
            let (tx, _rx) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
            update_channels.insert(vehicle.vin.clone(), tx);
        }

        Self {
            api,
            vehicles,
            cache: RwLock::new(cache),
            update_channels,
            retry_policy,
            refresh_guard: Mutex::new(()),
            logger: get_logger("coordinator"),
        }
    }

    /// Vehicles known at construction time, in listing order
    pub fn vehicles(&self) -> &[VehicleHandle] {
        &self.vehicles
    }

    /// Handle to the remote API client
    pub fn api(&self) -> Arc<dyn VehicleApi> {
        Arc::clone(&self.api)
    }

    /// The retry policy applied to every remote call
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Look up a vehicle handle by VIN. Never touches the network.
    pub fn get_vehicle(&self, vin: &str) -> Result<&VehicleHandle> {
        self.vehicles
            .iter()
            .find(|v| v.vin == vin)
            .ok_or_else(|| KeraunosError::not_found(vin))
    }

    /// Current cached snapshot for a VIN. Never blocks on the network.
    pub async fn snapshot(&self, vin: &str) -> Result<VehicleSnapshot> {
        self.cache
            .read()
            .await
            .get(vin)
            .cloned()
            .ok_or_else(|| KeraunosError::not_found(vin))
    }

    /// Subscribe to update events for one vehicle
    pub fn subscribe(&self, vin: &str) -> Result<broadcast::Receiver<VehicleUpdated>> {
        self.update_channels
            .get(vin)
            .map(|tx| tx.subscribe())
            .ok_or_else(|| KeraunosError::not_found(vin))
    }

    /// Refresh every category of every known vehicle.
    ///
    /// Vehicles are processed in listing order: wake, then the five
    /// categories sequentially, then one update event. A vehicle that
    /// still fails after retry exhaustion is logged and skipped so the
    /// remaining vehicles stay fresh.
    pub async fn refresh_all(&self) -> Result<()> {
        let _flight = self.refresh_guard.lock().await;
        for vehicle in &self.vehicles {
            if let Err(e) = self.refresh_vehicle_inner(vehicle).await {
                self.logger
                    .error(&format!("Refresh failed for {}: {}", vehicle.vin, e));
            }
        }
        Ok(())
    }

    /// Refresh every category of a single vehicle on demand
    pub async fn refresh_vehicle(&self, vin: &str) -> Result<()> {
        let vehicle = self.get_vehicle(vin)?.clone();
        let _flight = self.refresh_guard.lock().await;
        self.refresh_vehicle_inner(&vehicle).await
    }

    async fn refresh_vehicle_inner(&self, vehicle: &VehicleHandle) -> Result<()> {
        let vin = vehicle.vin.as_str();
        self.wake(vin).await?;
        for category in Category::ALL {
            self.fetch_and_store(vin, category).await?;
        }
        self.notify(vin);
        self.logger.debug(&format!("Refreshed {}", vin));
        Ok(())
    }

    /// Fetch one category payload and replace it in the cache.
    ///
    /// With `notify` set, one update event is emitted after the write;
    /// entity adapters use this after commanding the vehicle so every
    /// sibling observing the same VIN converges on the new value.
    pub async fn refresh_category(&self, vin: &str, category: Category, notify: bool) -> Result<()> {
        self.get_vehicle(vin)?;
        let _flight = self.refresh_guard.lock().await;
        self.fetch_and_store(vin, category).await?;
        if notify {
            self.notify(vin);
        }
        Ok(())
    }

    /// Bring a vehicle online, with the usual retry policy
    pub async fn wake_vehicle(&self, vin: &str) -> Result<()> {
        self.get_vehicle(vin)?;
        self.wake(vin).await
    }

    async fn wake(&self, vin: &str) -> Result<()> {
        let api = &self.api;
        retry_request(&self.retry_policy, &format!("wake_up {}", vin), || async {
            api.wake_up(vin).await
        })
        .await
    }

    async fn fetch_and_store(&self, vin: &str, category: Category) -> Result<()> {
        let api = &self.api;
        let operation = format!("{} state for {}", category, vin);
        let payload = retry_request(&self.retry_policy, &operation, || async {
            match category {
                Category::Charge => api.charge_state(vin).await,
                Category::Climate => api.climate_state(vin).await,
                Category::Drive => api.drive_state(vin).await,
                Category::Gui => api.gui_settings(vin).await,
                Category::State => api.vehicle_state(vin).await,
            }
        })
        .await?;

        let mut cache = self.cache.write().await;
        if let Some(snapshot) = cache.get_mut(vin) {
            snapshot.insert(category, payload);
        }
        Ok(())
    }

    fn notify(&self, vin: &str) {
        if let Some(tx) = self.update_channels.get(vin) {
            // Nobody listening is fine
            let _ = tx.send(VehicleUpdated {
                vin: vin.to_string(),
                at: Utc::now(),
            });
        }
    }

    /// Periodic refresh loop.
    ///
    /// Runs `refresh_all` on every tick (the first tick fires
    /// immediately) until a shutdown signal arrives. Errors inside a
    /// cycle are logged; the loop keeps going.
    pub async fn run(
        &self,
        scan_interval: Duration,
        mut shutdown_rx: mpsc::UnboundedReceiver<()>,
    ) -> Result<()> {
        self.logger.info(&format!(
            "Starting refresh loop for {} vehicles every {:?}",
            self.vehicles.len(),
            scan_interval
        ));

        let mut tick = interval(scan_interval);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.refresh_all().await {
                        self.logger.error(&format!("Refresh cycle failed: {}", e));
                    }
                }
                _ = shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names() {
        assert_eq!(Category::Charge.as_str(), "charge");
        assert_eq!(Category::Gui.to_string(), "gui");
        assert_eq!(Category::ALL.len(), 5);
    }

    #[test]
    fn snapshot_starts_empty() {
        let snapshot = VehicleSnapshot::default();
        assert!(snapshot.is_empty());
        for category in Category::ALL {
            assert!(snapshot.get(category).is_none());
            assert!(snapshot.fetched_at(category).is_none());
        }
    }

    #[test]
    fn snapshot_replaces_wholesale() {
        let mut snapshot = VehicleSnapshot::default();
        snapshot.insert(
            Category::Charge,
            serde_json::json!({"battery_level": 80, "charge_rate": 32}),
        );
        snapshot.insert(Category::Charge, serde_json::json!({"battery_level": 81}));

        let charge = snapshot.get(Category::Charge).unwrap();
        assert_eq!(charge["battery_level"], 81);
        // The old payload is gone entirely, not merged
        assert!(charge.get("charge_rate").is_none());
    }

    #[test]
    fn snapshot_serializes_category_keys() {
        let mut snapshot = VehicleSnapshot::default();
        snapshot.insert(Category::Climate, serde_json::json!({"is_climate_on": true}));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["categories"]["climate"]["payload"]["is_climate_on"]
            .as_bool()
            .unwrap());
    }
}
