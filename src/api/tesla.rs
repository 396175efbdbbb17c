//! Tesla owner API client
//!
//! Implements [`VehicleApi`] over the HTTPS owner API: password-grant
//! token fetch, bearer-authenticated requests, and mapping of HTTP
//! statuses onto the crate error taxonomy (401/403 auth, 408/429/5xx
//! and transport failures transient, everything else permanent).

use crate::api::{VehicleApi, VehicleHandle};
use crate::commands::ControlAction;
use crate::error::{KeraunosError, Result};
use crate::logging::get_logger;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "https://owner-api.teslamotors.com";

// Public client credentials of the historical owner API, the same ones
// every third-party client shipped with.
const OAUTH_CLIENT_ID: &str = "81527cff06843c8634fdc09e8ac0abefb46ac849f38fe1e431c2ef2106796384";
const OAUTH_CLIENT_SECRET: &str =
    "c7257eb71a564034f9419ee651c7d0e5f7aa6bfbd18bafb5c5c033b093bb2fa3";

/// Tesla owner API client
pub struct TeslaApiClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    access_token: RwLock<Option<String>>,
    // VIN -> remote numeric id, filled by list_vehicles
    vehicle_ids: RwLock<HashMap<String, u64>>,
    logger: crate::logging::StructuredLogger,
}

impl TeslaApiClient {
    /// Create a client for the production owner API
    pub fn new(username: String, password: String) -> Result<Self> {
        Self::with_base_url(username, password, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a custom endpoint (tests, proxies)
    pub fn with_base_url(username: String, password: String, base_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KeraunosError::api(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            username,
            password,
            access_token: RwLock::new(None),
            vehicle_ids: RwLock::new(HashMap::new()),
            logger: get_logger("tesla"),
        })
    }

    /// Obtain an access token with the password grant.
    ///
    /// Must succeed before any other call; a rejected login is an
    /// [`KeraunosError::Auth`] and the daemon does not start.
    pub async fn authenticate(&self) -> Result<()> {
        let url = format!("{}/oauth/token", self.base_url);
        let body = serde_json::json!({
            "grant_type": "password",
            "client_id": OAUTH_CLIENT_ID,
            "client_secret": OAUTH_CLIENT_SECRET,
            "email": self.username,
            "password": self.password,
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(KeraunosError::auth("Login rejected by the Tesla API"));
        }
        if !status.is_success() {
            return Err(Self::error_for_status(status, "oauth/token"));
        }

        let payload: Value = response.json().await?;
        let token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| KeraunosError::auth("Token response without access_token"))?;

        *self.access_token.write().await = Some(token.to_string());
        self.logger.info("Authenticated with the Tesla API");
        Ok(())
    }

    async fn bearer_token(&self) -> Result<String> {
        self.access_token
            .read()
            .await
            .clone()
            .ok_or_else(|| KeraunosError::auth("Not authenticated"))
    }

    async fn vehicle_id(&self, vin: &str) -> Result<u64> {
        if let Some(id) = self.vehicle_ids.read().await.get(vin) {
            return Ok(*id);
        }
        Err(KeraunosError::not_found(vin))
    }

    /// Map a non-success HTTP status onto the error taxonomy
    fn error_for_status(status: StatusCode, what: &str) -> KeraunosError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                KeraunosError::auth(format!("{}: HTTP {}", what, status))
            }
            // 408 is what the API answers while the vehicle is asleep
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                KeraunosError::transient(format!("{}: HTTP {}", what, status))
            }
            s if s.is_server_error() => {
                KeraunosError::transient(format!("{}: HTTP {}", what, status))
            }
            _ => KeraunosError::api(format!("{}: HTTP {}", what, status)),
        }
    }

    /// GET an owner API path and unwrap the `{"response": ...}` envelope
    async fn get_json(&self, path: &str) -> Result<Value> {
        let token = self.bearer_token().await?;
        let url = format!("{}{}", self.base_url, path);
        self.logger.trace(&format!("GET {}", path));

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for_status(status, path));
        }

        let mut payload: Value = response.json().await?;
        match payload.get_mut("response") {
            Some(inner) => Ok(inner.take()),
            None => Err(KeraunosError::api(format!(
                "{}: response without payload envelope",
                path
            ))),
        }
    }

    /// POST an owner API path, checking the command result flag
    async fn post_command(&self, path: &str) -> Result<()> {
        let token = self.bearer_token().await?;
        let url = format!("{}{}", self.base_url, path);
        self.logger.debug(&format!("POST {}", path));

        let response = self.http.post(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_for_status(status, path));
        }

        let payload: Value = response.json().await.unwrap_or(Value::Null);
        if let Some(result) = payload.pointer("/response/result")
            && result == &Value::Bool(false)
        {
            let reason = payload
                .pointer("/response/reason")
                .and_then(Value::as_str)
                .unwrap_or("unspecified");
            return Err(KeraunosError::api(format!(
                "{}: command rejected ({})",
                path, reason
            )));
        }
        Ok(())
    }

    async fn get_data(&self, vin: &str, endpoint: &str) -> Result<Value> {
        let id = self.vehicle_id(vin).await?;
        self.get_json(&format!("/api/1/vehicles/{}/data_request/{}", id, endpoint))
            .await
    }

    async fn command(&self, vin: &str, endpoint: &str) -> Result<()> {
        let id = self.vehicle_id(vin).await?;
        self.post_command(&format!("/api/1/vehicles/{}/command/{}", id, endpoint))
            .await
    }
}

#[async_trait::async_trait]
impl VehicleApi for TeslaApiClient {
    async fn list_vehicles(&self) -> Result<Vec<VehicleHandle>> {
        let payload = self.get_json("/api/1/vehicles").await?;
        let vehicles: Vec<VehicleHandle> = serde_json::from_value(payload)?;

        let mut ids = self.vehicle_ids.write().await;
        for vehicle in &vehicles {
            ids.insert(vehicle.vin.clone(), vehicle.id);
        }

        self.logger
            .debug(&format!("Account lists {} vehicles", vehicles.len()));
        Ok(vehicles)
    }

    async fn wake_up(&self, vin: &str) -> Result<()> {
        let id = self.vehicle_id(vin).await?;
        self.post_command(&format!("/api/1/vehicles/{}/wake_up", id))
            .await
    }

    async fn vehicle_state(&self, vin: &str) -> Result<Value> {
        self.get_data(vin, "vehicle_state").await
    }

    async fn drive_state(&self, vin: &str) -> Result<Value> {
        self.get_data(vin, "drive_state").await
    }

    async fn gui_settings(&self, vin: &str) -> Result<Value> {
        self.get_data(vin, "gui_settings").await
    }

    async fn charge_state(&self, vin: &str) -> Result<Value> {
        self.get_data(vin, "charge_state").await
    }

    async fn climate_state(&self, vin: &str) -> Result<Value> {
        self.get_data(vin, "climate_state").await
    }

    async fn start_charging(&self, vin: &str) -> Result<()> {
        self.command(vin, "charge_start").await
    }

    async fn stop_charging(&self, vin: &str) -> Result<()> {
        self.command(vin, "charge_stop").await
    }

    async fn start_climate(&self, vin: &str) -> Result<()> {
        self.command(vin, "auto_conditioning_start").await
    }

    async fn stop_climate(&self, vin: &str) -> Result<()> {
        self.command(vin, "auto_conditioning_stop").await
    }

    async fn control(&self, vin: &str, action: ControlAction) -> Result<()> {
        self.command(vin, action.endpoint()).await
    }
}
