//! Server mode
//!
//! Starts the fetch loop and the HTTP server exposing the metrics.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::exporter_routes;
use crate::config::StaticConfig;
use crate::runtime::lifetime::{self, startup::StartupContext};

/// Request timeouts of the HTTP server
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the exporter
///
/// This function:
/// 1. Builds the exporter and performs the initial fetch
/// 2. Spawns the periodic fetch loop
/// 3. Serves the metrics until the server exits or a shutdown signal arrives
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {:#}", e);
            e
        })?;

    serve(config, startup).await
}

/// Serve an already prepared exporter.
pub async fn serve(config: &StaticConfig, startup: StartupContext) -> Result<()> {
    let StartupContext {
        exporter,
        metrics,
        route_config,
    } = startup;

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} CPU cores for the server", cpu_count);

    let shutdown = CancellationToken::new();
    let fetch_loop = {
        let exporter = exporter.clone();
        let token = shutdown.clone();
        tokio::spawn(async move { exporter.run(token).await })
    };

    let telemetry_path = route_config.telemetry_path.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(web::Data::from(metrics.clone()))
            .configure(exporter_routes(&telemetry_path))
    })
    .keep_alive(HTTP_TIMEOUT)
    .client_request_timeout(HTTP_TIMEOUT)
    .client_disconnect_timeout(HTTP_TIMEOUT)
    .shutdown_timeout(HTTP_TIMEOUT.as_secs())
    .disable_signals()
    .workers(cpu_count)
    .bind(&route_config.bind_address)?
    .run();

    warn!(
        "Serving metrics at http://{}{}",
        route_config.bind_address, route_config.telemetry_path
    );

    let handle = server.handle();
    let mut server = std::pin::pin!(server);
    let exited = tokio::select! {
        res = &mut server => Some(res),
        _ = lifetime::shutdown::listen_for_shutdown() => None,
    };

    let result = match exited {
        Some(res) => res,
        None => {
            // 停止接收新连接，等待进行中的请求完成
            handle.stop(true).await;
            server.await
        }
    };

    shutdown.cancel();
    if let Err(e) = fetch_loop.await {
        warn!("Fetch loop terminated abnormally: {}", e);
    }

    info!("Exporter stopped");
    result.map_err(anyhow::Error::from)
}
