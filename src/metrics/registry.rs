//! Exporter metrics registry
//!
//! One registry per running exporter: the inverter collector, the build
//! info gauge and the process metrics.

use std::sync::Arc;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use super::system::ProcessMetrics;
use crate::errors::{ExporterError, Result};
use crate::exporter::{Exporter, ExporterCollector, NAMESPACE};

/// Prefix of the exporter's own metrics.
pub const EXPORTER_PREFIX: &str = "foxesscloud_exporter";

pub struct ExporterMetrics {
    registry: Registry,
    /// Constant 1, labelled with the running version
    pub build_info: GaugeVec,
    pub process: ProcessMetrics,
}

impl ExporterMetrics {
    pub fn new(exporter: Arc<Exporter>) -> Result<Self> {
        let registry = Registry::new();

        registry.register(Box::new(ExporterCollector::new(exporter)))?;

        let build_info = GaugeVec::new(
            Opts::new(
                format!("{}_build_info", EXPORTER_PREFIX),
                format!(
                    "A metric with a constant '1' value labeled by version \
                     from which {}_exporter was built.",
                    NAMESPACE
                ),
            ),
            &["version"],
        )?;
        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1.0);
        registry.register(Box::new(build_info.clone()))?;

        let process = ProcessMetrics::new()?;
        process.register(&registry)?;

        Ok(Self {
            registry,
            build_info,
            process,
        })
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String> {
        self.process.update();

        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| {
                ExporterError::metrics(format!("metrics output is not valid UTF-8: {}", e))
            })
    }
}
