//! Metric publisher
//!
//! Owns the fetch loop and the currently published [`Snapshot`]. The
//! snapshot lives in an `ArcSwapOption`: the loop builds a complete new
//! snapshot and swaps it in with a single store, scrapes load whichever
//! snapshot is current. Neither side ever waits on the other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, MetricFamily};
use prometheus::{Counter, Gauge, Opts};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::ExporterSettings;
use super::fetcher::{Snapshot, fetch_snapshot};
use super::labels::{build_labels, parse_labels};
use super::schema::{MetricData, MetricDefinition, MetricKind, NAMESPACE, build_metrics};
use crate::client::RealtimeDataSource;
use crate::errors::{ExporterError, Result};

/// Longest accepted fetch interval or timeout, `i64::MAX` nanoseconds.
///
/// Deadlines are computed as `Instant + Duration`; anything longer could
/// overflow the clock.
pub const MAX_DURATION: Duration = Duration::from_nanos(i64::MAX as u64);

pub struct Exporter {
    inverters: Vec<String>,
    const_labels: HashMap<String, String>,
    metrics: Vec<MetricDefinition>,
    descs: Vec<Desc>,
    source: Arc<dyn RealtimeDataSource>,
    snapshot: ArcSwapOption<Snapshot>,
    interval: Duration,
    timeout: Duration,
}

impl Exporter {
    /// Create an exporter for the configured inverters.
    ///
    /// Fails without touching the network when no inverters are configured,
    /// a duration is zero or above [`MAX_DURATION`], or the static
    /// labels are not valid Prometheus label names.
    pub fn new(
        settings: ExporterSettings,
        source: Arc<dyn RealtimeDataSource>,
    ) -> Result<Self> {
        if settings.inverters.is_empty() {
            return Err(ExporterError::config("no inverters defined"));
        }
        if settings.fetch_interval.is_zero() {
            return Err(ExporterError::config("fetch interval must be greater than zero"));
        }
        if settings.fetch_timeout.is_zero() {
            return Err(ExporterError::config("fetch timeout must be greater than zero"));
        }
        for (name, value) in [
            ("fetch interval", settings.fetch_interval),
            ("fetch timeout", settings.fetch_timeout),
        ] {
            if value > MAX_DURATION {
                return Err(ExporterError::config(format!(
                    "{} {:?} exceeds the maximum of {:?}",
                    name, value, MAX_DURATION
                )));
            }
        }

        let const_labels = parse_labels(&settings.default_labels);
        let metrics = build_metrics();

        let mut descs = Vec::with_capacity(settings.inverters.len() * metrics.len());
        for inverter_sn in &settings.inverters {
            let labels = build_labels(&const_labels, inverter_sn);
            for metric in &metrics {
                let desc = Desc::new(
                    metric.fq_name(),
                    metric.help.to_string(),
                    Vec::new(),
                    labels.clone(),
                )
                .map_err(|e| {
                    ExporterError::config(format!("invalid metric labels {:?}: {}", labels, e))
                })?;
                descs.push(desc);
            }
        }

        debug!(
            "Exporter configured with {} inverters, {} metrics, labels {:?}",
            settings.inverters.len(),
            metrics.len(),
            const_labels
        );

        Ok(Self {
            inverters: settings.inverters,
            const_labels,
            metrics,
            descs,
            source,
            snapshot: ArcSwapOption::empty(),
            interval: settings.fetch_interval,
            timeout: settings.fetch_timeout,
        })
    }

    pub fn inverters(&self) -> &[String] {
        &self.inverters
    }

    pub fn const_labels(&self) -> &HashMap<String, String> {
        &self.const_labels
    }

    pub fn metric_definitions(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    /// Currently published snapshot, `None` before the first successful fetch.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.load_full()
    }

    /// Initial synchronous fetch.
    ///
    /// Must succeed before the exporter is served; there is no earlier
    /// state to fall back on.
    pub async fn start(&self) -> Result<()> {
        let snapshot = fetch_snapshot(self.source.as_ref(), &self.inverters, self.timeout).await?;
        info!(
            "Initial fetch completed for {} inverters from {}",
            snapshot.len(),
            self.source.name()
        );
        self.publish(snapshot);
        Ok(())
    }

    /// One tick: fetch and publish, or keep the previous snapshot.
    pub async fn refresh(&self) -> Result<()> {
        match fetch_snapshot(self.source.as_ref(), &self.inverters, self.timeout).await {
            Ok(snapshot) => {
                self.publish(snapshot);
                Ok(())
            }
            Err(e) => {
                error!("could not fetch inverter data: {}", e);
                Err(e)
            }
        }
    }

    fn publish(&self, snapshot: Snapshot) {
        debug!(
            "Publishing snapshot with {} records, latest update {:?}",
            snapshot.len(),
            snapshot.latest_update()
        );
        self.snapshot.store(Some(Arc::new(snapshot)));
    }

    /// Run the fetch loop until `shutdown` is cancelled.
    ///
    /// The first tick fires one interval after the call. Cancellation is
    /// checked between ticks; a fetch in progress runs to completion or to
    /// its own timeout.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Fetch loop started, interval {:?}, timeout {:?}", self.interval, self.timeout);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Fetch loop stopped");
                    return;
                }
                _ = ticker.tick() => {
                    // 失败已记录日志，保留上一次的快照
                    let _ = self.refresh().await;
                }
            }
        }
    }

    /// Descriptions for every inverter × metric pair.
    pub fn describe(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    /// Samples for every metric × inverter record in the current snapshot.
    pub fn collect_families(&self) -> Vec<MetricFamily> {
        let Some(snapshot) = self.snapshot() else {
            return Vec::new();
        };

        let mut families = Vec::with_capacity(self.metrics.len() * snapshot.len());
        for metric in &self.metrics {
            for record in snapshot.records() {
                match self.sample(metric, record) {
                    Ok(mut mfs) => families.append(&mut mfs),
                    Err(e) => warn!(
                        "Skipping {} {} for inverter {}: {}",
                        metric.kind.as_str(),
                        metric.name,
                        record.inverter_sn,
                        e
                    ),
                }
            }
        }
        families
    }

    fn sample(
        &self,
        metric: &MetricDefinition,
        record: &MetricData,
    ) -> prometheus::Result<Vec<MetricFamily>> {
        let opts = Opts::new(metric.name, metric.help)
            .namespace(NAMESPACE)
            .const_labels(build_labels(&self.const_labels, &record.inverter_sn));
        let value = (metric.extract)(record);

        match metric.kind {
            MetricKind::Gauge => {
                let gauge = Gauge::with_opts(opts)?;
                gauge.set(value);
                Ok(gauge.collect())
            }
            MetricKind::Counter => {
                // inc_by 不接受负值，直接写入原始读数
                let mut raw = proto::Counter::default();
                raw.set_value(value);

                let mut families = Counter::with_opts(opts)?.collect();
                for family in &mut families {
                    for sample in family.mut_metric() {
                        sample.set_counter(raw.clone());
                    }
                }
                Ok(families)
            }
        }
    }
}

/// Registry adapter exposing an [`Exporter`] as a Prometheus collector.
#[derive(Clone)]
pub struct ExporterCollector(Arc<Exporter>);

impl ExporterCollector {
    pub fn new(exporter: Arc<Exporter>) -> Self {
        Self(exporter)
    }
}

impl Collector for ExporterCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.0.describe()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.0.collect_families()
    }
}
