//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use foxesscloud_exporter::client::{DataItem, RealtimeData, RealtimeDataSource};
use foxesscloud_exporter::errors::Result;

type Script = dyn Fn(&str, usize) -> Result<Vec<RealtimeData>> + Send + Sync;

/// Data source answering from a closure of (inverter, call index).
///
/// Call indices count every `realtime_data` invocation, starting at 0.
pub struct ScriptedSource {
    script: Box<Script>,
    calls: AtomicUsize,
    delay: Option<(usize, Duration)>,
}

impl ScriptedSource {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str, usize) -> Result<Vec<RealtimeData>> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep `delay` on every call from `from_call` onwards.
    pub fn with_delay(mut self, from_call: usize, delay: Duration) -> Self {
        self.delay = Some((from_call, delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RealtimeDataSource for ScriptedSource {
    async fn realtime_data(
        &self,
        device_sn: &str,
        _deadline: Instant,
    ) -> Result<Vec<RealtimeData>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((from_call, delay)) = self.delay
            && call >= from_call
        {
            tokio::time::sleep(delay).await;
        }
        (self.script)(device_sn, call)
    }

    fn name(&self) -> &'static str {
        "Scripted"
    }
}

/// One reading with the given (variable, value) pairs.
pub fn reading(device_sn: &str, values: &[(&str, f64)]) -> Vec<RealtimeData> {
    vec![RealtimeData {
        device_sn: device_sn.to_string(),
        time: None,
        datas: values
            .iter()
            .map(|(variable, value)| DataItem::new(*variable, *value))
            .collect(),
    }]
}

/// One sample line of the text exposition format.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

/// Parse sample lines, skipping `# HELP` / `# TYPE` comments.
pub fn parse_samples(text: &str) -> Vec<Sample> {
    text.lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_sample_line)
        .collect()
}

fn parse_sample_line(line: &str) -> Sample {
    let (series, value) = line.rsplit_once(' ').expect("sample line has a value");
    let value = match value {
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        "NaN" => f64::NAN,
        v => v.parse().expect("numeric sample value"),
    };

    let Some((name, rest)) = series.split_once('{') else {
        return Sample {
            name: series.to_string(),
            labels: BTreeMap::new(),
            value,
        };
    };

    let body = rest.trim_end_matches('}');
    let labels = body
        .split("\",")
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once("=\"").expect("label pair");
            (k.to_string(), v.trim_end_matches('"').to_string())
        })
        .collect();

    Sample {
        name: name.to_string(),
        labels,
        value,
    }
}

/// Find the sample with `name` whose `inverter_sn` label is `sn`.
pub fn find<'a>(samples: &'a [Sample], name: &str, sn: &str) -> Option<&'a Sample> {
    samples.iter().find(|s| {
        s.name == name && s.labels.get("inverter_sn").map(String::as_str) == Some(sn)
    })
}
