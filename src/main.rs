use anyhow::Result;
use keraunos::api::VehicleApi;
use keraunos::api::tesla::TeslaApiClient;
use keraunos::config::Config;
use keraunos::coordinator::VehicleDataCoordinator;
use keraunos::retry::RetryPolicy;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    keraunos::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Keraunos Tesla bridge starting up");

    // Authentication failure is fatal and reported exactly once
    let api = TeslaApiClient::new(
        config.tesla.username.clone(),
        config.tesla.password.clone(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to build API client: {}", e))?;
    api.authenticate()
        .await
        .map_err(|e| anyhow::anyhow!("Tesla authentication failed: {}", e))?;

    let vehicles = api
        .list_vehicles()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list vehicles: {}", e))?;
    info!("Discovered {} vehicles", vehicles.len());

    let coordinator = Arc::new(VehicleDataCoordinator::new(
        Arc::new(api),
        vehicles,
        RetryPolicy::from(&config.retry),
    ));

    let entity_tasks = keraunos::platform::spawn_entity_tasks(&coordinator);

    // Spawn web server
    let web_coordinator = Arc::clone(&coordinator);
    let web_host = config.web.host.clone();
    let web_port = config.web.port;
    let web_task = tokio::spawn(async move {
        if let Err(e) = keraunos::web::serve(web_coordinator, &web_host, web_port).await {
            error!("Web server error: {}", e);
        }
    });

    // Ctrl-C stops the refresh loop
    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel::<()>();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let result = coordinator.run(config.scan_interval(), shutdown_rx).await;

    web_task.abort();
    for task in entity_tasks {
        task.abort();
    }

    match result {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Refresh loop failed: {}", e);
            Err(anyhow::anyhow!("Coordinator error: {}", e))
        }
    }
}
