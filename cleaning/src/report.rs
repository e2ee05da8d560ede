//! Diagnostic side channel filled by cleaning calls.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

/// A single diagnostic value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Path(PathBuf),
    /// Duration in seconds.
    Seconds(f64),
    Count(usize),
    /// Signed count, e.g. a difference of pixel counts.
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<PathBuf> for ReportValue {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ReportValue {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Duration> for ReportValue {
    fn from(duration: Duration) -> Self {
        Self::Seconds(duration.as_secs_f64())
    }
}

impl From<usize> for ReportValue {
    fn from(count: usize) -> Self {
        Self::Count(count)
    }
}

impl From<i64> for ReportValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ReportValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for ReportValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Caller-owned key/value map that cleaning algorithms write diagnostics into.
///
/// Algorithms only ever insert; a missing report simply skips diagnostics.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Report {
    entries: BTreeMap<String, ReportValue>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ReportValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Record into an optional report without unwrapping at every call site.
pub(crate) trait ReportSink {
    fn record(&mut self, key: &str, value: impl Into<ReportValue>);
}

impl ReportSink for Option<&mut Report> {
    #[inline]
    fn record(&mut self, key: &str, value: impl Into<ReportValue>) {
        if let Some(report) = self.as_deref_mut() {
            report.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites() {
        let mut report = Report::new();
        report.insert("img_cleaned_num_islands", 2usize);
        report.insert("img_cleaned_num_islands", 3usize);
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get("img_cleaned_num_islands"),
            Some(&ReportValue::Count(3))
        );
    }

    #[test]
    fn test_duration_is_seconds() {
        let mut report = Report::new();
        report.insert("exec_time_sec", Duration::from_millis(1500));
        assert_eq!(report.get("exec_time_sec"), Some(&ReportValue::Seconds(1.5)));
    }

    #[test]
    fn test_sink_without_report_is_noop() {
        let mut sink: Option<&mut Report> = None;
        sink.record("anything", 1.0);

        let mut report = Report::new();
        let mut sink = Some(&mut report);
        sink.record("delta", 1.0);
        sink.record("path", Path::new("/tmp/x.fits"));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_json_is_flat_map() {
        let mut report = Report::new();
        report.insert("a_count", 4usize);
        report.insert("a_delta", -2i64);
        report.insert("b_path", PathBuf::from("/tmp/in.fits"));
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["a_count"], 4);
        assert_eq!(json["a_delta"], -2);
        assert_eq!(json["b_path"], "/tmp/in.fits");
    }
}
