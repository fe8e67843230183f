//! Metric schema
//!
//! The per-inverter value record, the vendor variable mapping and the
//! fixed catalogue of exported metrics.

use chrono::{DateTime, Utc};

use crate::client::RealtimeData;

/// Namespace prepended to every exported metric name.
pub const NAMESPACE: &str = "foxesscloud";

/// Prometheus value kind of an exported metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Normalized reading of one inverter.
///
/// Fields the vendor did not report stay at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricData {
    pub inverter_sn: String,
    pub running_state: f64,
    pub fault_count: f64,

    pub ambient_temperature: f64,
    pub boost_temperature: f64,
    pub inverter_temperature: f64,

    pub photovoltaic_power: f64,
    pub feed_in_power: f64,
    pub today_generated_power: f64,
    pub total_generated_power: f64,
    pub load_power: f64,
    pub output_power: f64,
    pub grid_consumption_power: f64,

    pub pv1_power: f64,
    pub pv1_voltage: f64,
    pub pv1_current: f64,

    pub pv2_power: f64,
    pub pv2_voltage: f64,
    pub pv2_current: f64,

    pub pv3_power: f64,
    pub pv3_voltage: f64,
    pub pv3_current: f64,

    pub pv4_power: f64,
    pub pv4_voltage: f64,
    pub pv4_current: f64,

    pub reference_power: f64,
    pub reference_voltage: f64,
    pub reference_current: f64,
    pub reference_frequency: f64,

    pub secondary_power: f64,
    pub secondary_voltage: f64,
    pub secondary_current: f64,
    pub secondary_frequency: f64,

    pub tertiary_power: f64,
    pub tertiary_voltage: f64,
    pub tertiary_current: f64,
    pub tertiary_frequency: f64,

    pub update_time: DateTime<Utc>,
}

impl MetricData {
    pub fn new(inverter_sn: impl Into<String>) -> Self {
        Self {
            inverter_sn: inverter_sn.into(),
            ..Self::default()
        }
    }

    /// Build a record from one vendor reading.
    pub fn from_reading(inverter_sn: impl Into<String>, reading: &RealtimeData) -> Self {
        let mut data = Self::new(inverter_sn);
        if let Some(time) = reading.time {
            data.update_time = time;
        }
        for item in &reading.datas {
            data.apply(&item.variable, item.value);
        }
        data
    }

    /// Store `value` in the field mapped to `variable`.
    ///
    /// Returns false for variables outside the known vocabulary, which are
    /// ignored.
    pub fn apply(&mut self, variable: &str, value: f64) -> bool {
        match self.field_mut(variable) {
            Some(field) => {
                *field = value;
                true
            }
            None => false,
        }
    }

    fn field_mut(&mut self, variable: &str) -> Option<&mut f64> {
        let field = match variable {
            "generation" => &mut self.total_generated_power,
            "todayYield" => &mut self.today_generated_power,
            "feedinPower" => &mut self.feed_in_power,
            "pvPower" => &mut self.photovoltaic_power,
            "loadsPower" => &mut self.load_power,
            "generationPower" => &mut self.output_power,
            "gridConsumptionPower" => &mut self.grid_consumption_power,
            "ambientTemperation" => &mut self.ambient_temperature,
            "boostTemperation" => &mut self.boost_temperature,
            "invTemperation" => &mut self.inverter_temperature,
            "pv1Volt" => &mut self.pv1_voltage,
            "pv1Current" => &mut self.pv1_current,
            "pv1Power" => &mut self.pv1_power,
            "pv2Volt" => &mut self.pv2_voltage,
            "pv2Current" => &mut self.pv2_current,
            "pv2Power" => &mut self.pv2_power,
            "pv3Volt" => &mut self.pv3_voltage,
            "pv3Current" => &mut self.pv3_current,
            "pv3Power" => &mut self.pv3_power,
            "pv4Volt" => &mut self.pv4_voltage,
            "pv4Current" => &mut self.pv4_current,
            "pv4Power" => &mut self.pv4_power,
            "RPower" => &mut self.reference_power,
            "RVolt" => &mut self.reference_voltage,
            "RCurrent" => &mut self.reference_current,
            "RFreq" => &mut self.reference_frequency,
            "SPower" => &mut self.secondary_power,
            "SVolt" => &mut self.secondary_voltage,
            "SCurrent" => &mut self.secondary_current,
            "SFreq" => &mut self.secondary_frequency,
            "TPower" => &mut self.tertiary_power,
            "TVolt" => &mut self.tertiary_voltage,
            "TCurrent" => &mut self.tertiary_current,
            "TFreq" => &mut self.tertiary_frequency,
            "runningState" => &mut self.running_state,
            "currentFaultCount" => &mut self.fault_count,
            _ => return None,
        };
        Some(field)
    }
}

/// Static description of one exported metric.
#[derive(Clone, Copy)]
pub struct MetricDefinition {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub extract: fn(&MetricData) -> f64,
}

impl MetricDefinition {
    /// Fully qualified metric name, including the namespace.
    pub fn fq_name(&self) -> String {
        format!("{}_{}", NAMESPACE, self.name)
    }
}

impl std::fmt::Debug for MetricDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

const fn gauge(
    name: &'static str,
    help: &'static str,
    extract: fn(&MetricData) -> f64,
) -> MetricDefinition {
    MetricDefinition {
        name,
        help,
        kind: MetricKind::Gauge,
        extract,
    }
}

const fn counter(
    name: &'static str,
    help: &'static str,
    extract: fn(&MetricData) -> f64,
) -> MetricDefinition {
    MetricDefinition {
        name,
        help,
        kind: MetricKind::Counter,
        extract,
    }
}

/// Build the metric catalogue.
///
/// Names and kinds are part of the exporter's public contract; dashboards
/// depend on them.
pub fn build_metrics() -> Vec<MetricDefinition> {
    vec![
        gauge(
            "ambient_temperature_celsius",
            "Internal temperature of the inverter in celsius.",
            |d| d.ambient_temperature,
        ),
        gauge(
            "boost_temperature_celsius",
            "Boost temperature of the inverter in celsius.",
            |d| d.boost_temperature,
        ),
        gauge(
            "inverter_temperature_celsius",
            "Temperature of the inverter in celsius.",
            |d| d.inverter_temperature,
        ),
        counter("generated_power_today_kwh", "Today generated power", |d| d.today_generated_power),
        counter("generated_power_total_kwh", "Total generated power", |d| d.total_generated_power),
        gauge("photovoltaic_power_kwh", "Photovoltaic power", |d| d.photovoltaic_power),
        gauge("load_power_kw", "Load power", |d| d.load_power),
        gauge("output_power_kw", "Output power", |d| d.output_power),
        gauge("grid_consumption_power_kw", "Grid consumption power", |d| d.grid_consumption_power),
        gauge("pv1_voltage_v", "PV1 voltage", |d| d.pv1_voltage),
        gauge("pv1_current_amp", "PV1 current", |d| d.pv1_current),
        gauge("pv1_power_kw", "PV1 power", |d| d.pv1_power),
        gauge("pv2_voltage_v", "PV2 voltage", |d| d.pv2_voltage),
        gauge("pv2_current_amp", "PV2 current", |d| d.pv2_current),
        gauge("pv2_power_kw", "PV2 power", |d| d.pv2_power),
        gauge("pv3_voltage_v", "PV3 voltage", |d| d.pv3_voltage),
        gauge("pv3_current_amp", "PV3 current", |d| d.pv3_current),
        gauge("pv3_power_kw", "PV3 power", |d| d.pv3_power),
        gauge("pv4_voltage_v", "PV4 voltage", |d| d.pv4_voltage),
        gauge("pv4_current_amp", "PV4 current", |d| d.pv4_current),
        gauge("pv4_power_kw", "PV4 power", |d| d.pv4_power),
        gauge("reference_frequency_hz", "Reference frequency", |d| d.reference_frequency),
        gauge("reference_voltage_v", "Reference voltage", |d| d.reference_voltage),
        gauge("reference_current_amp", "Reference current", |d| d.reference_current),
        gauge("reference_power_kw", "Reference power", |d| d.reference_power),
        gauge("secondary_frequency_hz", "Secondary frequency", |d| d.secondary_frequency),
        gauge("secondary_voltage_v", "Secondary voltage", |d| d.secondary_voltage),
        gauge("secondary_current_amp", "Secondary current", |d| d.secondary_current),
        gauge("secondary_power_kw", "Secondary power", |d| d.secondary_power),
        gauge("tertiary_frequency_hz", "Tertiary frequency", |d| d.tertiary_frequency),
        gauge("tertiary_voltage_v", "Tertiary voltage", |d| d.tertiary_voltage),
        gauge("tertiary_current_amp", "Tertiary current", |d| d.tertiary_current),
        gauge("tertiary_power_kw", "Tertiary power", |d| d.tertiary_power),
        counter("fault_count", "Number of errors reported.", |d| d.fault_count),
        gauge("running_state", "Running state.", |d| d.running_state),
        counter(
            "last_updated_timestamp_seconds",
            "Timestamp of the last update in seconds.",
            |d| d.update_time.timestamp() as f64,
        ),
    ]
}
