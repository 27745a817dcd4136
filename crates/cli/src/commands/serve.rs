//! `switchyard serve` — Start the HTTP gateway.

use std::sync::Arc;
use switchyard_config::AppConfig;
use switchyard_runtime::Runtime;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let runtime = Arc::new(Runtime::connect(&config).await?);
    switchyard_gateway::serve(&config, runtime).await
}
