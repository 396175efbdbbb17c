//! # Keraunos - Tesla vehicle bridge daemon
//!
//! A standalone Rust daemon that polls the Tesla owner API on a fixed
//! interval, caches per-vehicle state snapshots, and exposes them as
//! typed entity views over a REST API.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration with validation
//! - `logging`: Structured logging and tracing
//! - `error`: Shared error type
//! - `api`: The remote vehicle API trait and its Tesla implementation
//! - `retry`: Bounded retry with exponential backoff for remote calls
//! - `coordinator`: Per-VIN snapshot cache, refresh loop, update events
//! - `entity`: Climate, sensor, switch and location adapters
//! - `commands`: Named control action dispatch
//! - `platform`: Entity lifecycle wiring per vehicle
//! - `web`: HTTP server and REST API

pub mod api;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod logging;
pub mod platform;
pub mod retry;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::VehicleDataCoordinator;
pub use error::{KeraunosError, Result};
