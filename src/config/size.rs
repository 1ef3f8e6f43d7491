use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;

static REGEX_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)\s*([KMGT]?B?)$").expect("Invalid regex")
});

const KIB: u64 = 1024;

/// Parses sizes like `2G`, `500M`, `1.5GB` or `1024` into bytes (binary multiples).
pub fn parse_size(text: &str) -> Result<u64> {
    let normalized = text.trim().to_uppercase();
    if normalized.is_empty() {
        bail!("empty size string");
    }

    let captures = REGEX_SIZE
        .captures(&normalized)
        .with_context(|| format!("invalid size: {text} (use B, K/KB, M/MB, G/GB, T/TB)"))?;

    let value: f64 = captures[1]
        .parse()
        .with_context(|| format!("invalid numeric value: {}", &captures[1]))?;

    let multiplier = match captures[2].trim_end_matches('B') {
        "" => 1,
        "K" => KIB,
        "M" => KIB.pow(2),
        "G" => KIB.pow(3),
        "T" => KIB.pow(4),
        unit => bail!("unknown unit: {unit}"),
    };

    Ok((value * multiplier as f64) as u64)
}

/// Human readable size with decimal units, e.g. `1.50 MB`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Bytes(u64),
    Text(String),
}

/// Accepts either a byte count or a size string in settings files.
pub fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeValue::deserialize(deserializer)? {
        SizeValue::Bytes(bytes) => Ok(bytes),
        SizeValue::Text(text) => parse_size(&text).map_err(serde::de::Error::custom),
    }
}
