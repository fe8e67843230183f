use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{FoxEssClient, RealtimeDataSource};
use crate::config::StaticConfig;
use crate::config::validators::{normalize_listen_address, validate_telemetry_path};
use crate::exporter::{Exporter, ExporterSettings};
use crate::metrics::ExporterMetrics;

pub struct StartupContext {
    pub exporter: Arc<Exporter>,
    pub metrics: Arc<ExporterMetrics>,
    pub route_config: RouteConfig,
}

#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub bind_address: String,
    pub telemetry_path: String,
}

impl RouteConfig {
    pub fn from_config(config: &StaticConfig) -> Result<Self> {
        validate_telemetry_path(&config.server.telemetry_path)
            .map_err(|e| anyhow::anyhow!("Invalid server.telemetry_path: {}", e))?;

        Ok(Self {
            bind_address: normalize_listen_address(&config.server.listen_address),
            telemetry_path: config.server.telemetry_path.clone(),
        })
    }
}

/// 准备服务器启动的上下文
///
/// 构建 API 客户端和 exporter，并完成首次拉取。
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let source: Arc<dyn RealtimeDataSource> =
        Arc::new(FoxEssClient::new(&config.api).context("Failed to create FoxESS Cloud client")?);
    prepare_with_source(config, source).await
}

/// Same as [`prepare_server_startup`] with an explicit data source.
pub async fn prepare_with_source(
    config: &StaticConfig,
    source: Arc<dyn RealtimeDataSource>,
) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let route_config = RouteConfig::from_config(config)?;

    let settings =
        ExporterSettings::from_config(&config.api).context("Invalid exporter settings")?;
    info!(
        "Polling {} inverters every {:?} via {}",
        settings.inverters.len(),
        settings.fetch_interval,
        source.name()
    );

    let exporter = Arc::new(Exporter::new(settings, source).context("Failed to create exporter")?);

    // 首次拉取失败直接退出
    exporter
        .start()
        .await
        .context("Initial inverter data fetch failed")?;

    let metrics = Arc::new(
        ExporterMetrics::new(exporter.clone()).context("Failed to register metrics")?,
    );

    debug!("Pre-startup completed in {:?}", start_time.elapsed());

    Ok(StartupContext {
        exporter,
        metrics,
        route_config,
    })
}
