//! Entity adapters over the coordinator's cached snapshots

mod common;

use common::{coordinator_with, handle};
use keraunos::entity::{
    ChargingSwitch, ClimateEntity, LocationEntity, SensorEntity, SensorKind, TemperatureUnit,
    VehicleEntity,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;

const VIN: &str = "5YJ3E1EA7KF000001";

fn vehicles() -> Vec<keraunos::api::VehicleHandle> {
    vec![handle(1, VIN, "Aristaeus")]
}

#[tokio::test]
async fn climate_renders_fahrenheit_when_gui_says_so() {
    let (api, coordinator) = coordinator_with(vehicles());
    api.set_payload(VIN, "gui", json!({"gui_temperature_units": "F"}));
    api.set_payload(
        VIN,
        "climate",
        json!({"is_climate_on": true, "inside_temp": 20.0, "driver_temp_setting": 21.0}),
    );
    coordinator.refresh_vehicle(VIN).await.unwrap();

    let mut entity = ClimateEntity::new(Arc::clone(&coordinator), VIN);
    entity.refresh().await.unwrap();

    let state = entity.state();
    assert_eq!(state.is_on, Some(true));
    assert_eq!(state.unit, TemperatureUnit::Fahrenheit);
    assert!((state.current_temperature.unwrap() - 68.0).abs() < 1e-9);
    assert!((state.target_temperature.unwrap() - 69.8).abs() < 1e-9);
    assert_eq!(entity.unique_id(), format!("tesla_{}_climate", VIN));
}

#[tokio::test]
async fn climate_defaults_to_celsius_without_gui_settings() {
    let (api, coordinator) = coordinator_with(vehicles());
    api.set_payload(VIN, "climate", json!({"is_climate_on": false, "inside_temp": 19.5}));
    coordinator.refresh_vehicle(VIN).await.unwrap();

    let mut entity = ClimateEntity::new(Arc::clone(&coordinator), VIN);
    entity.refresh().await.unwrap();

    let state = entity.state();
    assert_eq!(state.is_on, Some(false));
    assert_eq!(state.unit, TemperatureUnit::Celsius);
    assert!((state.current_temperature.unwrap() - 19.5).abs() < f64::EPSILON);
    // No driver_temp_setting in the payload
    assert!(state.target_temperature.is_none());
}

#[tokio::test]
async fn climate_turn_on_commands_and_notifies() {
    let (api, coordinator) = coordinator_with(vehicles());
    coordinator.refresh_vehicle(VIN).await.unwrap();
    let mut rx = coordinator.subscribe(VIN).unwrap();

    let entity = ClimateEntity::new(Arc::clone(&coordinator), VIN);
    entity.turn_on().await.unwrap();

    assert_eq!(api.climate_command_calls.load(Ordering::SeqCst), 1);
    // Siblings observing the VIN learn about the refresh
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn charging_switch_tracks_charging_state() {
    let (api, coordinator) = coordinator_with(vehicles());
    api.set_payload(VIN, "charge", json!({"charging_state": "Charging"}));
    coordinator.refresh_vehicle(VIN).await.unwrap();

    let mut entity = ChargingSwitch::new(Arc::clone(&coordinator), VIN);
    entity.refresh().await.unwrap();
    assert_eq!(entity.state().is_on, Some(true));

    // Only "Stopped" counts as off
    api.set_payload(VIN, "charge", json!({"charging_state": "Stopped"}));
    coordinator.refresh_vehicle(VIN).await.unwrap();
    entity.refresh().await.unwrap();
    assert_eq!(entity.state().is_on, Some(false));
}

#[tokio::test]
async fn charging_switch_commands_the_charger() {
    let (api, coordinator) = coordinator_with(vehicles());
    coordinator.refresh_vehicle(VIN).await.unwrap();

    let entity = ChargingSwitch::new(Arc::clone(&coordinator), VIN);
    entity.turn_on().await.unwrap();
    entity.turn_off().await.unwrap();

    assert_eq!(api.charge_command_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn sensors_convert_to_gui_units() {
    let (api, coordinator) = coordinator_with(vehicles());
    api.set_payload(
        VIN,
        "gui",
        json!({"gui_temperature_units": "C", "gui_distance_units": "km/hr"}),
    );
    api.set_payload(VIN, "charge", json!({"battery_level": 80, "battery_range": 100.0}));
    api.set_payload(VIN, "climate", json!({"inside_temp": 20.0, "outside_temp": 5.0}));
    coordinator.refresh_vehicle(VIN).await.unwrap();

    let mut sensors = SensorEntity::all_for(&coordinator, VIN);
    for sensor in sensors.iter_mut() {
        sensor.refresh().await.unwrap();
    }

    for sensor in &sensors {
        let state = sensor.state();
        match sensor.kind() {
            SensorKind::BatteryLevel => {
                assert_eq!(state.value, Some(80.0));
                assert_eq!(state.unit, "%");
                assert_eq!(state.device_class, "battery");
            }
            SensorKind::Range => {
                // The API reports miles; the GUI wants kilometers
                assert!((state.value.unwrap() - 160.9344).abs() < 1e-9);
                assert_eq!(state.unit, "km");
                assert_eq!(state.device_class, "distance");
            }
            SensorKind::InsideTemperature => {
                assert_eq!(state.value, Some(20.0));
                assert_eq!(state.unit, "°C");
                assert_eq!(state.device_class, "temperature");
            }
            SensorKind::OutsideTemperature => {
                assert_eq!(state.value, Some(5.0));
                assert_eq!(state.unit, "°C");
            }
        }
    }
}

#[tokio::test]
async fn range_sensor_stays_in_miles_for_imperial_guis() {
    let (api, coordinator) = coordinator_with(vehicles());
    api.set_payload(VIN, "gui", json!({"gui_distance_units": "mi/hr"}));
    api.set_payload(VIN, "charge", json!({"battery_range": 100.0}));
    coordinator.refresh_vehicle(VIN).await.unwrap();

    let mut sensor = SensorEntity::new(Arc::clone(&coordinator), VIN, SensorKind::Range);
    sensor.refresh().await.unwrap();

    assert!((sensor.state().value.unwrap() - 100.0).abs() < f64::EPSILON);
    assert_eq!(sensor.state().unit, "mi");
}

#[tokio::test]
async fn location_mirrors_drive_state() {
    let (api, coordinator) = coordinator_with(vehicles());
    api.set_payload(
        VIN,
        "drive",
        json!({"latitude": 52.37, "longitude": 4.89, "heading": 180, "speed": null}),
    );
    coordinator.refresh_vehicle(VIN).await.unwrap();

    let mut entity = LocationEntity::new(Arc::clone(&coordinator), VIN);
    entity.refresh().await.unwrap();

    let state = entity.state();
    assert!((state.latitude.unwrap() - 52.37).abs() < 1e-9);
    assert!((state.longitude.unwrap() - 4.89).abs() < 1e-9);
    assert_eq!(state.heading, Some(180.0));
    // Parked vehicles report a null speed
    assert!(state.speed.is_none());
    assert_eq!(entity.unique_id(), format!("tesla_{}_location", VIN));
}

#[tokio::test]
async fn entities_report_none_before_first_refresh() {
    let (_api, coordinator) = coordinator_with(vehicles());

    let mut entity = ClimateEntity::new(Arc::clone(&coordinator), VIN);
    entity.refresh().await.unwrap();
    assert!(entity.state().is_on.is_none());
    assert!(entity.state().current_temperature.is_none());

    let mut switch = ChargingSwitch::new(Arc::clone(&coordinator), VIN);
    switch.refresh().await.unwrap();
    assert!(switch.state().is_on.is_none());
}
