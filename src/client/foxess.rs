//! FoxESS Cloud Open API 实现
//!
//! Blocking `ureq` requests executed on the tokio blocking pool, the same
//! way the rest of the codebase wraps synchronous HTTP calls.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use ureq::Agent;

use super::{RealtimeData, RealtimeDataSource};
use crate::config::ApiConfig;
use crate::errors::{ExporterError, Result};

/// Realtime query endpoint path, also part of the request signature.
pub const REALTIME_QUERY_PATH: &str = "/op/v0/device/real/query";

/// Upper bound for a single request when no tighter deadline applies.
const HTTP_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("foxesscloud_exporter/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct RealtimeQuery<'a> {
    sn: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    errno: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    result: Option<T>,
}

/// Compute the request signature.
///
/// The vendor hashes the path, token and timestamp joined by the literal
/// four characters `\r\n`, not by a CRLF.
pub fn signature(path: &str, token: &str, timestamp_ms: i64) -> String {
    let payload = format!(r"{}\r\n{}\r\n{}", path, token, timestamp_ms);
    format!("{:x}", Md5::digest(payload.as_bytes()))
}

/// FoxESS Cloud client
pub struct FoxEssClient {
    agent: Agent,
    base_url: String,
    token: String,
}

impl FoxEssClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(ExporterError::config("API token is required"));
        }

        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into();

        Ok(Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.trim().to_string(),
        })
    }

    fn query_realtime_sync(
        agent: Agent,
        url: String,
        token: String,
        device_sn: String,
        timeout: Duration,
    ) -> Result<Vec<RealtimeData>> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let sig = signature(REALTIME_QUERY_PATH, &token, timestamp);

        trace!("POST {} for inverter {}", url, device_sn);

        let resp = agent
            .post(&url)
            .header("token", &token)
            .header("timestamp", &timestamp.to_string())
            .header("signature", &sig)
            .header("lang", "en")
            .header("User-Agent", USER_AGENT)
            .config()
            .timeout_global(Some(timeout))
            .build()
            .send_json(&RealtimeQuery { sn: &device_sn })?;

        let body: ApiResponse<Vec<RealtimeData>> = resp
            .into_body()
            .read_json()
            .map_err(|e| ExporterError::serialization(format!("invalid API response: {}", e)))?;

        if body.errno != 0 {
            return Err(ExporterError::api(body.errno, body.msg));
        }

        Ok(body.result.unwrap_or_default())
    }
}

#[async_trait]
impl RealtimeDataSource for FoxEssClient {
    async fn realtime_data(&self, device_sn: &str, deadline: Instant) -> Result<Vec<RealtimeData>> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ExporterError::timeout(format!(
                "deadline exceeded before querying inverter {}",
                device_sn
            )));
        }

        let agent = self.agent.clone();
        let url = format!("{}{}", self.base_url, REALTIME_QUERY_PATH);
        let token = self.token.clone();
        let sn = device_sn.to_string();

        // 使用 spawn_blocking 在线程池中执行同步 HTTP 请求
        tokio::task::spawn_blocking(move || {
            Self::query_realtime_sync(agent, url, token, sn, remaining)
        })
        .await
        .unwrap_or_else(|e| {
            warn!("FoxESS spawn_blocking failed: {}", e);
            Err(ExporterError::transport(format!("request task failed: {}", e)))
        })
    }

    fn name(&self) -> &'static str {
        "FoxESSCloud"
    }
}
