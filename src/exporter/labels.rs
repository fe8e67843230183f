use std::collections::HashMap;

/// Label carrying the inverter serial number on every series.
pub const INVERTER_SN_LABEL: &str = "inverter_sn";

/// Parse static labels in the form `label1=value1 label2=value2`.
///
/// Items without `=` are skipped; the value may itself contain `=`.
pub fn parse_labels(input: &str) -> HashMap<String, String> {
    input
        .split(' ')
        .filter(|item| !item.is_empty())
        .filter_map(|item| item.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Label set for one inverter: the static labels plus `inverter_sn`.
///
/// The inverter label always wins over a static label of the same name.
pub fn build_labels(
    const_labels: &HashMap<String, String>,
    inverter_sn: &str,
) -> HashMap<String, String> {
    let mut labels = const_labels.clone();
    labels.insert(INVERTER_SN_LABEL.to_string(), inverter_sn.to_string());
    labels
}
