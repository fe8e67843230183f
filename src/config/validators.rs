//! 配置值解析与验证
//!
//! Helpers that turn the raw strings of [`StaticConfig`](super::StaticConfig)
//! into the typed values the exporter runs with.

use std::time::Duration;

/// Parse a comma separated list of inverter serial numbers.
///
/// Entries are trimmed, empty entries dropped and duplicates removed while
/// keeping first-seen order.
pub fn parse_inverters(input: &str) -> Vec<String> {
    normalize_inverters(input.split(','))
}

/// Normalize an already split inverter list, see [`parse_inverters`].
pub fn normalize_inverters<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut res: Vec<String> = Vec::new();
    for item in items {
        let clean = item.as_ref().trim();
        if clean.is_empty() || res.iter().any(|s| s == clean) {
            continue;
        }
        res.push(clean.to_string());
    }
    res
}

/// 单位对应的纳秒数
fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" | "sec" => 1_000_000_000,
        "m" | "min" => 60_000_000_000,
        "h" => 3_600_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

/// 解析持续时间字符串，格式与 Go 的 `time.ParseDuration` 一致：
/// - 500ms, 10s, 5m, 1h, 250us, 100ns
/// - 1m30s, 1h2m3s
/// - 1.5s, .5h
/// - 纯数字按秒处理
///
/// Values above `i64::MAX` nanoseconds are rejected, as Go does.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    const MAX_NANOS: u128 = i64::MAX as u128;

    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut remaining = input.strip_prefix('+').unwrap_or(input);
    if remaining == "0" {
        return Ok(Duration::ZERO);
    }
    // 无单位时按秒处理
    let bare_seconds = remaining.chars().all(|c| c.is_ascii_digit() || c == '.');

    let mut total: u128 = 0;
    while !remaining.is_empty() {
        // 整数部分
        let int_len = remaining
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(remaining.len());
        let int_digits = &remaining[..int_len];
        remaining = &remaining[int_len..];

        // 小数部分
        let mut frac_digits = "";
        if let Some(rest) = remaining.strip_prefix('.') {
            let frac_len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            frac_digits = &rest[..frac_len];
            remaining = &rest[frac_len..];
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(format!("invalid duration: '{}'", input));
        }

        // 单位
        let unit_len = if bare_seconds {
            0
        } else {
            remaining
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(remaining.len())
        };
        let unit = &remaining[..unit_len];
        remaining = &remaining[unit_len..];
        let scale = if bare_seconds {
            1_000_000_000
        } else if unit.is_empty() {
            return Err(format!("missing unit in duration: '{}'", input));
        } else {
            unit_nanos(unit).ok_or_else(|| format!("unsupported duration unit: '{}'", unit))?
        };

        let out_of_range = || format!("duration out of range: '{}'", input);

        let whole = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse::<u128>().map_err(|_| out_of_range())?
        };
        let mut part = whole.checked_mul(scale).ok_or_else(out_of_range)?;

        // 超过 18 位的小数不影响纳秒精度
        let frac_digits = &frac_digits[..frac_digits.len().min(18)];
        if !frac_digits.is_empty() {
            let frac: u128 = frac_digits.parse().map_err(|_| out_of_range())?;
            let divisor = 10u128.pow(frac_digits.len() as u32);
            part = part
                .checked_add(frac * scale / divisor)
                .ok_or_else(out_of_range)?;
        }

        total = total.checked_add(part).ok_or_else(out_of_range)?;
        if total > MAX_NANOS {
            return Err(out_of_range());
        }
        if bare_seconds && !remaining.is_empty() {
            return Err(format!("invalid duration: '{}'", input));
        }
    }

    Ok(Duration::from_nanos(total as u64))
}

/// Accept Go-style `:PORT` listen addresses by binding all interfaces.
pub fn normalize_listen_address(addr: &str) -> String {
    let addr = addr.trim();
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Telemetry path must be absolute and must not shadow the landing page.
pub fn validate_telemetry_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("telemetry path must start with '/': '{}'", path));
    }
    if path == "/" {
        return Err("telemetry path must not be '/'".to_string());
    }
    Ok(())
}
