//! Snapshot fetcher
//!
//! Pulls one reading per inverter and assembles them into a [`Snapshot`].
//! A batch either succeeds for every inverter or fails as a whole.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::schema::MetricData;
use crate::client::RealtimeDataSource;
use crate::errors::{ExporterError, Result};

/// Immutable set of inverter records from one complete fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    records: Vec<MetricData>,
}

impl Snapshot {
    pub fn new(records: Vec<MetricData>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MetricData] {
        &self.records
    }

    pub fn get(&self, inverter_sn: &str) -> Option<&MetricData> {
        self.records.iter().find(|r| r.inverter_sn == inverter_sn)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent vendor update time across all records.
    pub fn latest_update(&self) -> Option<DateTime<Utc>> {
        self.records.iter().map(|r| r.update_time).max()
    }
}

/// Fetch the latest reading of every inverter.
///
/// `timeout` bounds the whole batch, not each inverter.
pub async fn fetch_snapshot(
    source: &dyn RealtimeDataSource,
    inverters: &[String],
    timeout: Duration,
) -> Result<Snapshot> {
    let deadline = Instant::now().checked_add(timeout).ok_or_else(|| {
        ExporterError::config(format!("fetch timeout {:?} is out of range", timeout))
    })?;

    let batch = async {
        let mut records = Vec::with_capacity(inverters.len());
        for inverter_sn in inverters {
            records.push(fetch_inverter_data(source, inverter_sn, deadline).await?);
        }
        Ok(Snapshot::new(records))
    };

    match tokio::time::timeout(timeout, batch).await {
        Ok(result) => result,
        Err(_) => Err(ExporterError::timeout(format!(
            "fetching {} inverters from {} exceeded {:?}",
            inverters.len(),
            source.name(),
            timeout
        ))),
    }
}

async fn fetch_inverter_data(
    source: &dyn RealtimeDataSource,
    inverter_sn: &str,
    deadline: Instant,
) -> Result<MetricData> {
    debug!(inverter_sn, "fetching inverter data");

    let items = source.realtime_data(inverter_sn, deadline).await?;

    debug!(inverter_sn, num_items = items.len(), "fetched inverter data");

    let Some(item) = items.first() else {
        return Err(ExporterError::empty_response(format!(
            "no data for inverter {}",
            inverter_sn
        )));
    };

    Ok(MetricData::from_reading(inverter_sn, item))
}
