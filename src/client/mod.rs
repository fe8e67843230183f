//! FoxESS Cloud API client
//!
//! The exporter only needs one vendor operation: "latest realtime reading
//! for an inverter". [`RealtimeDataSource`] abstracts it so the fetch
//! pipeline can run against the real cloud client or a test double.

mod foxess;

pub use foxess::{FoxEssClient, REALTIME_QUERY_PATH, signature};

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::Result;

/// Source of realtime inverter readings.
///
/// Implementations must be thread-safe (Send + Sync); the tick loop and
/// tests share them behind an `Arc`.
#[async_trait]
pub trait RealtimeDataSource: Send + Sync {
    /// Query the latest reading of one device.
    ///
    /// `deadline` is shared by the whole batch the caller is assembling;
    /// implementations should not keep I/O running past it.
    async fn realtime_data(&self, device_sn: &str, deadline: Instant) -> Result<Vec<RealtimeData>>;

    fn name(&self) -> &'static str;
}

/// One realtime reading as returned by the vendor API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeData {
    #[serde(rename = "deviceSN", default)]
    pub device_sn: String,
    #[serde(default, deserialize_with = "deserialize_api_time")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub datas: Vec<DataItem>,
}

/// A single (variable, value) pair inside a reading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataItem {
    #[serde(default)]
    pub variable: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "deserialize_value")]
    pub value: f64,
}

impl DataItem {
    pub fn new(variable: impl Into<String>, value: f64) -> Self {
        Self {
            variable: variable.into(),
            name: None,
            unit: None,
            value,
        }
    }
}

/// Parse the vendor timestamp format.
///
/// The API reports times like `2024-05-01 12:30:00 CEST+0200`: a local
/// date-time followed by a zone abbreviation glued to a numeric offset.
/// Only the numeric offset is meaningful.
pub fn parse_api_time(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    let (date_time, zone) = match input.rsplit_once(' ') {
        Some((dt, zone)) if zone.contains(['+', '-']) => (dt, zone),
        _ => {
            // 没有时区信息时按 UTC 处理
            return NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc());
        }
    };

    let offset_at = zone.find(['+', '-'])?;
    let offset = &zone[offset_at..];

    DateTime::parse_from_str(&format!("{} {}", date_time, offset), "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_api_time<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_api_time))
}

/// Values come back as numbers, numeric strings or occasionally
/// something else entirely; everything unusable reads as zero.
fn deserialize_value<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or_default(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or_default(),
        _ => 0.0,
    })
}
