//! Exporter integration tests
//!
//! Fetch loop, snapshot publication and collector output, driven by a
//! scripted data source instead of the FoxESS Cloud API.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedSource, find, parse_samples, reading};
use foxesscloud_exporter::errors::ExporterError;
use foxesscloud_exporter::exporter::{
    Exporter, ExporterCollector, ExporterSettings, INVERTER_SN_LABEL, MAX_DURATION, fetch_snapshot,
};
use prometheus::core::Collector;
use prometheus::{Encoder, Registry, TextEncoder};
use tokio_util::sync::CancellationToken;

const INTERVAL: Duration = Duration::from_secs(10);

fn exporter_with(source: Arc<ScriptedSource>, settings: ExporterSettings) -> Arc<Exporter> {
    Arc::new(Exporter::new(settings, source).expect("valid exporter"))
}

fn render(exporter: &Arc<Exporter>) -> String {
    let registry = Registry::new();
    registry
        .register(Box::new(ExporterCollector::new(exporter.clone())))
        .expect("register collector");
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .expect("encode");
    String::from_utf8(buffer).expect("utf-8")
}

fn generation(exporter: &Exporter, sn: &str) -> f64 {
    exporter
        .snapshot()
        .expect("snapshot published")
        .get(sn)
        .expect("inverter present")
        .total_generated_power
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test]
async fn test_empty_inverter_list_fails_without_fetching() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[]))));
    let settings = ExporterSettings::new(Vec::<String>::new());

    let result = Exporter::new(settings, source.clone());

    assert!(matches!(result, Err(ExporterError::Config(_))));
    assert_eq!(source.calls(), 0);
}

#[test]
fn test_invalid_static_label_name_is_rejected() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[]))));
    let settings = ExporterSettings::new(["SN1"]).with_labels("bad-name=x");

    let result = Exporter::new(settings, source);
    assert!(matches!(result, Err(ExporterError::Config(_))));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[]))));
    let settings = ExporterSettings::new(["SN1"]).with_timeout(Duration::ZERO);

    assert!(Exporter::new(settings, source).is_err());
}

#[test]
fn test_out_of_range_durations_are_rejected() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[]))));

    let huge_timeout =
        ExporterSettings::new(["SN1"]).with_timeout(Duration::from_secs(u64::MAX));
    let result = Exporter::new(huge_timeout, source.clone());
    assert!(matches!(result, Err(ExporterError::Config(_))));

    let huge_interval =
        ExporterSettings::new(["SN1"]).with_interval(MAX_DURATION + Duration::from_nanos(1));
    let result = Exporter::new(huge_interval, source.clone());
    assert!(matches!(result, Err(ExporterError::Config(_))));

    let longest = ExporterSettings::new(["SN1"])
        .with_interval(MAX_DURATION)
        .with_timeout(MAX_DURATION);
    assert!(Exporter::new(longest, source.clone()).is_ok());
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_fetch_with_unbounded_timeout_fails_cleanly() {
    let source = ScriptedSource::new(|sn, _| Ok(reading(sn, &[])));

    let err = fetch_snapshot(&source, &["SN1".to_string()], Duration::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, ExporterError::Config(_)));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_start_with_longest_timeout_does_not_panic() {
    let source = Arc::new(ScriptedSource::new(|sn, _| {
        Ok(reading(sn, &[("generation", 1.0)]))
    }));
    let exporter = exporter_with(
        source,
        ExporterSettings::new(["SN1"]).with_timeout(MAX_DURATION),
    );

    exporter.start().await.unwrap();
    assert_eq!(generation(&exporter, "SN1"), 1.0);
}

// =============================================================================
// Startup fetch
// =============================================================================

#[tokio::test]
async fn test_start_publishes_first_snapshot() {
    let source = Arc::new(ScriptedSource::new(|sn, _| {
        Ok(reading(sn, &[("generation", 42.0)]))
    }));
    let exporter = exporter_with(source.clone(), ExporterSettings::new(["SN1", "SN2"]));

    assert!(exporter.snapshot().is_none());
    exporter.start().await.unwrap();

    let snapshot = exporter.snapshot().unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(generation(&exporter, "SN1"), 42.0);
    assert_eq!(generation(&exporter, "SN2"), 42.0);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_start_fails_on_api_error() {
    let source = Arc::new(ScriptedSource::new(|_, _| {
        Err(ExporterError::api(40256, "illegal signature"))
    }));
    let exporter = exporter_with(source, ExporterSettings::new(["SN1"]));

    let err = exporter.start().await.unwrap_err();
    assert!(matches!(err, ExporterError::Api { errno: 40256, .. }));
    assert!(exporter.snapshot().is_none());
}

#[tokio::test]
async fn test_start_fails_on_empty_response() {
    let source = Arc::new(ScriptedSource::new(|sn, _| {
        if sn == "SN2" { Ok(Vec::new()) } else { Ok(reading(sn, &[])) }
    }));
    let exporter = exporter_with(source, ExporterSettings::new(["SN1", "SN2"]));

    let err = exporter.start().await.unwrap_err();
    assert!(matches!(err, ExporterError::EmptyResponse(_)));
    assert!(exporter.snapshot().is_none());
}

// =============================================================================
// Tick loop
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_snapshot_follows_latest_tick() {
    // 第 N 次调用返回 generation = N
    let source = Arc::new(ScriptedSource::new(|sn, call| {
        Ok(reading(sn, &[("generation", call as f64)]))
    }));
    let exporter = exporter_with(
        source.clone(),
        ExporterSettings::new(["SN1"]).with_interval(INTERVAL),
    );
    exporter.start().await.unwrap();
    assert_eq!(generation(&exporter, "SN1"), 0.0);

    let token = CancellationToken::new();
    let task = {
        let exporter = exporter.clone();
        let token = token.clone();
        tokio::spawn(async move { exporter.run(token).await })
    };

    tokio::time::sleep(INTERVAL * 3 + INTERVAL / 2).await;
    assert_eq!(source.calls(), 4);
    assert_eq!(generation(&exporter, "SN1"), 3.0);

    token.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_tick_keeps_previous_snapshot() {
    let source = Arc::new(ScriptedSource::new(|sn, call| {
        if call == 2 {
            Err(ExporterError::transport("connection reset"))
        } else {
            Ok(reading(sn, &[("generation", call as f64)]))
        }
    }));
    let exporter = exporter_with(
        source.clone(),
        ExporterSettings::new(["SN1"]).with_interval(INTERVAL),
    );
    exporter.start().await.unwrap();

    let token = CancellationToken::new();
    let task = {
        let exporter = exporter.clone();
        let token = token.clone();
        tokio::spawn(async move { exporter.run(token).await })
    };

    tokio::time::sleep(INTERVAL + INTERVAL / 2).await;
    let after_first = exporter.snapshot().unwrap();
    assert_eq!(after_first.get("SN1").unwrap().total_generated_power, 1.0);

    tokio::time::sleep(INTERVAL).await;
    let after_failure = exporter.snapshot().unwrap();
    assert_eq!(*after_failure, *after_first);

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(generation(&exporter, "SN1"), 3.0);

    token.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_partial_failure_publishes_nothing() {
    let source = Arc::new(ScriptedSource::new(|sn, call| {
        // 第二批次中 SN2 失败
        if call == 3 {
            Err(ExporterError::transport("boom"))
        } else {
            Ok(reading(sn, &[("generation", call as f64)]))
        }
    }));
    let exporter = exporter_with(source, ExporterSettings::new(["SN1", "SN2"]));
    exporter.start().await.unwrap();
    let before = exporter.snapshot().unwrap();

    assert!(exporter.refresh().await.is_err());

    let after = exporter.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.get("SN1").unwrap().total_generated_power, 0.0);
    assert_eq!(after.get("SN2").unwrap().total_generated_power, 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_does_not_block_collect() {
    let source = Arc::new(
        ScriptedSource::new(|sn, _| Ok(reading(sn, &[("generation", 7.0)])))
            .with_delay(1, Duration::from_secs(60)),
    );
    let exporter = exporter_with(
        source,
        ExporterSettings::new(["SN1"]).with_timeout(Duration::from_millis(500)),
    );
    exporter.start().await.unwrap();

    let refresh = {
        let exporter = exporter.clone();
        tokio::spawn(async move { exporter.refresh().await })
    };
    tokio::task::yield_now().await;

    // 拉取进行中时仍可读取旧快照
    let samples = parse_samples(&render(&exporter));
    let sample = find(&samples, "foxesscloud_generated_power_total_kwh", "SN1").unwrap();
    assert_eq!(sample.value, 7.0);

    let err = refresh.await.unwrap().unwrap_err();
    assert!(matches!(err, ExporterError::Timeout(_)));
    assert_eq!(generation(&exporter, "SN1"), 7.0);
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_on_cancel() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[]))));
    let exporter = exporter_with(
        source.clone(),
        ExporterSettings::new(["SN1"]).with_interval(INTERVAL),
    );

    let token = CancellationToken::new();
    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), exporter.run(token))
        .await
        .expect("loop exits after cancellation");
    assert_eq!(source.calls(), 0);
}

// =============================================================================
// Describe / Collect
// =============================================================================

fn desc_keys(exporter: &Exporter) -> BTreeSet<(String, u64, u64)> {
    exporter
        .describe()
        .into_iter()
        .map(|desc| (desc.fq_name.clone(), desc.id, desc.dim_hash))
        .collect()
}

#[tokio::test]
async fn test_describe_is_stable_before_and_after_data() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[("generation", 1.0)]))));
    let exporter = exporter_with(
        source,
        ExporterSettings::new(["SN1", "SN2"]).with_labels("env=prod"),
    );

    let before = desc_keys(&exporter);
    let metric_count = exporter.metric_definitions().len();
    assert_eq!(before.len(), 2 * metric_count);
    assert!(exporter.collect_families().is_empty());

    exporter.start().await.unwrap();
    let after = desc_keys(&exporter);
    assert_eq!(before, after);

    // 同名指标在不同逆变器间的标签键一致
    let names: BTreeSet<_> = after.iter().map(|(name, _, dim)| (name.clone(), *dim)).collect();
    assert_eq!(names.len(), metric_count);
    assert!(names.iter().any(|(name, _)| name == "foxesscloud_fault_count"));
}

#[tokio::test]
async fn test_collect_two_inverters() {
    let source = Arc::new(ScriptedSource::new(|sn, _| match sn {
        "SN1" => Ok(reading(sn, &[("generation", 100.5), ("todayYield", 3.2)])),
        _ => Ok(reading(sn, &[("generation", 200.0)])),
    }));
    let exporter = exporter_with(source, ExporterSettings::new(["SN1", "SN2"]));
    exporter.start().await.unwrap();

    let text = render(&exporter);
    let samples = parse_samples(&text);
    let metric_count = exporter.metric_definitions().len();
    assert_eq!(samples.len(), 2 * metric_count);

    let total = "foxesscloud_generated_power_total_kwh";
    let today = "foxesscloud_generated_power_today_kwh";
    assert_eq!(find(&samples, total, "SN1").unwrap().value, 100.5);
    assert_eq!(find(&samples, today, "SN1").unwrap().value, 3.2);
    assert_eq!(find(&samples, total, "SN2").unwrap().value, 200.0);

    let sn2_others: Vec<_> = samples
        .iter()
        .filter(|s| s.labels.get(INVERTER_SN_LABEL).map(String::as_str) == Some("SN2"))
        .filter(|s| s.name != total)
        .collect();
    assert_eq!(sn2_others.len(), metric_count - 1);
    assert!(sn2_others.iter().all(|s| s.value == 0.0));

    assert!(text.contains("# TYPE foxesscloud_generated_power_total_kwh counter"));
    assert!(text.contains("# TYPE foxesscloud_pv1_voltage_v gauge"));
    assert!(text.contains("# HELP foxesscloud_fault_count Number of errors reported."));
}

#[tokio::test]
async fn test_collect_applies_static_labels() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[("pv1Volt", 230.0)]))));
    let exporter = exporter_with(
        source,
        ExporterSettings::new(["SN1"]).with_labels("env=prod region=eu"),
    );
    exporter.start().await.unwrap();

    let samples = parse_samples(&render(&exporter));
    assert!(!samples.is_empty());
    for sample in &samples {
        assert_eq!(sample.labels.len(), 3, "labels of {}", sample.name);
        assert_eq!(sample.labels["env"], "prod");
        assert_eq!(sample.labels["region"], "eu");
        assert_eq!(sample.labels[INVERTER_SN_LABEL], "SN1");
    }
    assert_eq!(find(&samples, "foxesscloud_pv1_voltage_v", "SN1").unwrap().value, 230.0);
}

#[tokio::test]
async fn test_collect_without_static_labels() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[]))));
    let exporter = exporter_with(source, ExporterSettings::new(["SN1"]));
    exporter.start().await.unwrap();

    let samples = parse_samples(&render(&exporter));
    assert!(samples.iter().all(|s| s.labels.len() == 1));
}

#[tokio::test]
async fn test_counter_exports_raw_reading() {
    let source = Arc::new(ScriptedSource::new(|sn, _| {
        Ok(reading(
            sn,
            &[
                ("currentFaultCount", -3.0),
                ("runningState", -1.0),
                ("generation", 1234.5),
            ],
        ))
    }));
    let exporter = exporter_with(source, ExporterSettings::new(["SN1"]));
    exporter.start().await.unwrap();

    let output = render(&exporter);
    assert!(output.contains("# TYPE foxesscloud_fault_count counter"));

    let samples = parse_samples(&output);
    assert_eq!(find(&samples, "foxesscloud_fault_count", "SN1").unwrap().value, -3.0);
    assert_eq!(find(&samples, "foxesscloud_running_state", "SN1").unwrap().value, -1.0);
    assert_eq!(
        find(&samples, "foxesscloud_generated_power_total_kwh", "SN1").unwrap().value,
        1234.5
    );
}

#[tokio::test]
async fn test_counter_exports_nan_reading() {
    let source = Arc::new(ScriptedSource::new(|sn, _| {
        Ok(reading(sn, &[("currentFaultCount", f64::NAN)]))
    }));
    let exporter = exporter_with(source, ExporterSettings::new(["SN1"]));
    exporter.start().await.unwrap();

    let samples = parse_samples(&render(&exporter));
    assert!(find(&samples, "foxesscloud_fault_count", "SN1").unwrap().value.is_nan());
}

#[tokio::test]
async fn test_collector_trait_matches_exporter() {
    let source = Arc::new(ScriptedSource::new(|sn, _| Ok(reading(sn, &[]))));
    let exporter = exporter_with(source, ExporterSettings::new(["SN1"]));
    exporter.start().await.unwrap();

    let collector = ExporterCollector::new(exporter.clone());
    assert_eq!(collector.desc().len(), exporter.describe().len());
    assert_eq!(collector.collect().len(), exporter.metric_definitions().len());
}
