use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub const UNKNOWN_MODEL: &str = "Unknown Model";
pub const UNKNOWN_CPU: &str = "Unknown CPU";

pub const ELAPSED_TIME: &str = "elapsed_time";
pub const CPU_USAGE: &str = "cpu_usage";
pub const MEMORY_MB: &str = "memory_mb";
pub const CPU_PACKAGE_POWER: &str = "cpu_package_power";
pub const CPU_PACKAGE_TEMP: &str = "cpu_package_temp";
pub const POWER_WATT: &str = "power_watt";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A scalar from the `Main` sheet, typed by what the cell holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl MetaValue {
    /// Parses free text into the most specific variant: number, then date, then text.
    pub fn parse_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<f64>() {
            return MetaValue::Number(value);
        }
        if let Some(date) = parse_date(trimmed) {
            return MetaValue::Date(date);
        }
        MetaValue::Text(trimmed.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Number(value) => Some(*value),
            MetaValue::Text(raw) => raw.trim().parse::<f64>().ok(),
            MetaValue::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            MetaValue::Date(date) => Some(*date),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Number(value) => write!(f, "{value}"),
            MetaValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d %H:%M:%S")),
            MetaValue::Text(text) => f.write_str(text),
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Flat key/value block from a workbook's `Main` sheet.
///
/// Lookups never fail: absent keys resolve to `None` or to the caller's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MainMetadata {
    fields: BTreeMap<String, MetaValue>,
}

impl MainMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    /// Returns the value rendered as text, or `default` when the key is absent.
    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map(|value| value.to_string())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(MetaValue::as_f64)
    }

    /// Numeric lookup where an absent or non-numeric field is an undefined statistic.
    pub fn number_or_nan(&self, key: &str) -> f64 {
        self.number(key).unwrap_or(f64::NAN)
    }

    pub fn date(&self, key: &str) -> Option<NaiveDateTime> {
        self.get(key).and_then(MetaValue::as_date)
    }

    pub fn model(&self) -> String {
        self.text_or("model", UNKNOWN_MODEL)
    }

    pub fn cpu(&self) -> String {
        self.text_or("cpu", UNKNOWN_CPU)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, MetaValue)> for MainMetadata {
    fn from_iter<I: IntoIterator<Item = (K, MetaValue)>>(iter: I) -> Self {
        let mut metadata = MainMetadata::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionRecord {
    pub time: f64,
    pub score: f64,
    pub is_correct: bool,
}

/// One sampling tick. Channels absent from the source row are simply not present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesSample {
    pub elapsed_time: f64,
    pub channels: BTreeMap<String, f64>,
}

impl TimeSeriesSample {
    pub fn new(elapsed_time: f64) -> Self {
        Self {
            elapsed_time,
            channels: BTreeMap::new(),
        }
    }

    pub fn with_channel(mut self, name: impl Into<String>, value: f64) -> Self {
        self.channels.insert(name.into(), value);
        self
    }

    pub fn channel(&self, name: &str) -> Option<f64> {
        self.channels.get(name).copied()
    }
}

#[derive(Debug, Clone)]
pub struct AccuracyRun {
    pub source: PathBuf,
    pub main: MainMetadata,
    pub detections: Vec<DetectionRecord>,
}

#[derive(Debug, Clone)]
pub struct PerformanceRun {
    pub source: PathBuf,
    pub main: MainMetadata,
    pub resource_usage: Vec<TimeSeriesSample>,
    pub power_usage: Vec<TimeSeriesSample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_values_are_typed_by_content() {
        assert_eq!(MetaValue::parse_text(" 12.5 "), MetaValue::Number(12.5));
        assert!(matches!(
            MetaValue::parse_text("2024-05-01 13:45:00"),
            MetaValue::Date(_)
        ));
        assert!(matches!(
            MetaValue::parse_text("2024-05-01"),
            MetaValue::Date(_)
        ));
        assert_eq!(
            MetaValue::parse_text("yolov8s"),
            MetaValue::Text("yolov8s".to_string())
        );
    }

    #[test]
    fn missing_model_and_cpu_resolve_to_unknown() {
        let metadata = MainMetadata::new();
        assert_eq!(metadata.model(), UNKNOWN_MODEL);
        assert_eq!(metadata.cpu(), UNKNOWN_CPU);
        assert!(metadata.number_or_nan("fps").is_nan());
    }

    #[test]
    fn lookups_return_stored_values() {
        let metadata: MainMetadata = [
            ("model", MetaValue::Text("yolov8s".to_string())),
            ("fps", MetaValue::Number(24.0)),
            ("date", MetaValue::parse_text("2024-05-01 10:00:00")),
        ]
        .into_iter()
        .collect();

        assert_eq!(metadata.model(), "yolov8s");
        assert_eq!(metadata.number("fps"), Some(24.0));
        assert!(metadata.date("date").is_some());
        assert_eq!(metadata.number("model"), None);
        assert_eq!(metadata.len(), 3);
    }
}
