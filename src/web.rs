//! Axum-based HTTP surface over the coordinator
//!
//! Read endpoints serve entity views computed from the cached snapshot;
//! write endpoints wake the vehicle and issue remote commands. Remote
//! failures map to 502, unknown VINs to 404, malformed actions to 400.

use crate::commands::{ControlAction, dispatch_control};
use crate::coordinator::VehicleDataCoordinator;
use crate::entity::{
    ChargingSwitch, ClimateEntity, LocationEntity, SensorEntity, VehicleEntity,
};
use crate::error::KeraunosError;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<VehicleDataCoordinator>,
}

#[derive(Deserialize)]
pub struct SwitchBody {
    pub on: bool,
}

#[derive(Deserialize)]
pub struct CommandBody {
    pub action: String,
}

/// Map a domain error onto an HTTP response
fn error_response(e: KeraunosError) -> Response {
    let status = match &e {
        KeraunosError::NotFound { .. } => StatusCode::NOT_FOUND,
        KeraunosError::Validation { .. } => StatusCode::BAD_REQUEST,
        KeraunosError::Auth { .. }
        | KeraunosError::Transient { .. }
        | KeraunosError::Timeout { .. }
        | KeraunosError::RetryExhausted { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn vehicles(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.coordinator.vehicles().to_vec())
}

async fn vehicle_snapshot(
    State(state): State<AppState>,
    Path(vin): Path<String>,
) -> Response {
    match state.coordinator.snapshot(&vin).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => error_response(e),
    }
}

async fn climate_state(State(state): State<AppState>, Path(vin): Path<String>) -> Response {
    if let Err(e) = state.coordinator.get_vehicle(&vin) {
        return error_response(e);
    }
    let mut entity = ClimateEntity::new(Arc::clone(&state.coordinator), &vin);
    match entity.refresh().await {
        Ok(()) => Json(entity.state().clone()).into_response(),
        Err(e) => error_response(e),
    }
}

async fn set_climate(
    State(state): State<AppState>,
    Path(vin): Path<String>,
    Json(body): Json<SwitchBody>,
) -> Response {
    if let Err(e) = state.coordinator.get_vehicle(&vin) {
        return error_response(e);
    }
    let entity = ClimateEntity::new(Arc::clone(&state.coordinator), &vin);
    let result = if body.on {
        entity.turn_on().await
    } else {
        entity.turn_off().await
    };
    match result {
        Ok(()) => Json(serde_json::json!({"status": "ok"})).into_response(),
        Err(e) => error_response(e),
    }
}

async fn sensors(State(state): State<AppState>, Path(vin): Path<String>) -> Response {
    if let Err(e) = state.coordinator.get_vehicle(&vin) {
        return error_response(e);
    }
    let mut readings = serde_json::Map::new();
    for mut sensor in SensorEntity::all_for(&state.coordinator, &vin) {
        if let Err(e) = sensor.refresh().await {
            return error_response(e);
        }
        let Ok(value) = serde_json::to_value(sensor.state()) else {
            return error_response(KeraunosError::web("Failed to render sensor state"));
        };
        readings.insert(sensor.kind().key().to_string(), value);
    }
    Json(serde_json::Value::Object(readings)).into_response()
}

async fn location(State(state): State<AppState>, Path(vin): Path<String>) -> Response {
    if let Err(e) = state.coordinator.get_vehicle(&vin) {
        return error_response(e);
    }
    let mut entity = LocationEntity::new(Arc::clone(&state.coordinator), &vin);
    match entity.refresh().await {
        Ok(()) => Json(entity.state().clone()).into_response(),
        Err(e) => error_response(e),
    }
}

async fn charging_state(State(state): State<AppState>, Path(vin): Path<String>) -> Response {
    if let Err(e) = state.coordinator.get_vehicle(&vin) {
        return error_response(e);
    }
    let mut entity = ChargingSwitch::new(Arc::clone(&state.coordinator), &vin);
    match entity.refresh().await {
        Ok(()) => Json(entity.state().clone()).into_response(),
        Err(e) => error_response(e),
    }
}

async fn set_charging(
    State(state): State<AppState>,
    Path(vin): Path<String>,
    Json(body): Json<SwitchBody>,
) -> Response {
    if let Err(e) = state.coordinator.get_vehicle(&vin) {
        return error_response(e);
    }
    let entity = ChargingSwitch::new(Arc::clone(&state.coordinator), &vin);
    let result = if body.on {
        entity.turn_on().await
    } else {
        entity.turn_off().await
    };
    match result {
        Ok(()) => Json(serde_json::json!({"status": "ok"})).into_response(),
        Err(e) => error_response(e),
    }
}

async fn command(
    State(state): State<AppState>,
    Path(vin): Path<String>,
    Json(body): Json<CommandBody>,
) -> Response {
    let action = match ControlAction::from_str(&body.action) {
        Ok(action) => action,
        Err(e) => return error_response(e),
    };
    match dispatch_control(&state.coordinator, &vin, action).await {
        Ok(()) => Json(serde_json::json!({"status": "ok"})).into_response(),
        Err(e) => error_response(e),
    }
}

async fn refresh(State(state): State<AppState>, Path(vin): Path<String>) -> Response {
    match state.coordinator.refresh_vehicle(&vin).await {
        Ok(()) => Json(serde_json::json!({"status": "ok"})).into_response(),
        Err(e) => error_response(e),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/vehicles", get(vehicles))
        .route("/api/vehicles/{vin}", get(vehicle_snapshot))
        .route("/api/vehicles/{vin}/climate", get(climate_state).post(set_climate))
        .route("/api/vehicles/{vin}/sensors", get(sensors))
        .route("/api/vehicles/{vin}/location", get(location))
        .route("/api/vehicles/{vin}/charging", get(charging_state).post(set_charging))
        .route("/api/vehicles/{vin}/command", post(command))
        .route("/api/vehicles/{vin}/refresh", post(refresh))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(
    coordinator: Arc<VehicleDataCoordinator>,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let state = AppState { coordinator };
    let router = build_router(state);

    let logger = crate::logging::get_logger("web");
    let (addr, parsed_ok): (SocketAddr, bool) = match host.parse::<IpAddr>() {
        Ok(ip) => (SocketAddr::new(ip, port), true),
        Err(_) => (([127, 0, 0, 1], port).into(), false),
    };
    if !parsed_ok {
        logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{}",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
