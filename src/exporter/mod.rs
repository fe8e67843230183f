//! Inverter metrics exporter
//!
//! - `schema`: metric catalogue and the per-inverter record
//! - `labels`: static label parsing
//! - `fetcher`: one fetch batch into an immutable [`Snapshot`]
//! - `publisher`: the tick loop and the Prometheus collector

mod fetcher;
mod labels;
mod publisher;
mod schema;

pub use fetcher::{Snapshot, fetch_snapshot};
pub use labels::{INVERTER_SN_LABEL, build_labels, parse_labels};
pub use publisher::{Exporter, ExporterCollector, MAX_DURATION};
pub use schema::{MetricData, MetricDefinition, MetricKind, NAMESPACE, build_metrics};

use std::time::Duration;

use crate::config::ApiConfig;
use crate::config::validators::{normalize_inverters, parse_duration};
use crate::errors::{ExporterError, Result};

const DEFAULT_FETCH_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime settings of an [`Exporter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExporterSettings {
    pub inverters: Vec<String>,
    pub fetch_interval: Duration,
    pub fetch_timeout: Duration,
    /// Static labels in the form "label1=value1 label2=value2".
    pub default_labels: String,
}

impl ExporterSettings {
    pub fn new<I, S>(inverters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            inverters: normalize_inverters(inverters),
            fetch_interval: DEFAULT_FETCH_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            default_labels: String::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.fetch_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_labels(mut self, labels: impl Into<String>) -> Self {
        self.default_labels = labels.into();
        self
    }

    /// Build settings from the `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let fetch_interval = parse_duration(&config.fetch_interval)
            .map_err(|e| ExporterError::config(format!("api.fetch_interval: {}", e)))?;
        let fetch_timeout = parse_duration(&config.fetch_timeout)
            .map_err(|e| ExporterError::config(format!("api.fetch_timeout: {}", e)))?;

        if fetch_interval.is_zero() {
            return Err(ExporterError::config(
                "api.fetch_interval must be greater than zero",
            ));
        }
        if fetch_timeout.is_zero() {
            return Err(ExporterError::config(
                "api.fetch_timeout must be greater than zero",
            ));
        }

        Ok(Self::new(&config.inverters)
            .with_interval(fetch_interval)
            .with_timeout(fetch_timeout)
            .with_labels(config.default_labels.clone()))
    }
}
