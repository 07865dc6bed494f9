//! In-memory time-series log
//!
//! A [`TelemetryLog`] maps metric keys to [`Series`] of timestamped values.
//! Live sources allocate a fresh log per connection epoch and insert into it
//! through one of two operations:
//!
//! - [`TelemetryLog::put_value`] stores a JSON value as a single point
//! - [`TelemetryLog::put_json`] flattens nested objects and arrays into
//!   `parent/child` keys, one point per leaf

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Separator between a parent key and a flattened child key
pub const KEY_SEPARATOR: char = '/';

/// A single logged value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum LogValue {
    Number(f64),
    Boolean(bool),
    String(String),
    NumberArray(Vec<f64>),
    BooleanArray(Vec<bool>),
    StringArray(Vec<String>),
    /// Anything without a typed representation
    Raw(Value),
}

impl LogValue {
    /// Convert a JSON value, or `None` for `null`
    pub fn from_json(value: &Value) -> Option<Self> {
        let converted = match value {
            Value::Null => return None,
            Value::Bool(b) => LogValue::Boolean(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => LogValue::Number(f),
                None => LogValue::Raw(value.clone()),
            },
            Value::String(s) => LogValue::String(s.clone()),
            Value::Array(items) => typed_array(items).unwrap_or_else(|| LogValue::Raw(value.clone())),
            Value::Object(_) => LogValue::Raw(value.clone()),
        };
        Some(converted)
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Number(n) => write!(f, "{n}"),
            LogValue::Boolean(b) => write!(f, "{b}"),
            LogValue::String(s) => write!(f, "{s:?}"),
            LogValue::NumberArray(v) => write!(f, "{v:?}"),
            LogValue::BooleanArray(v) => write!(f, "{v:?}"),
            LogValue::StringArray(v) => write!(f, "{v:?}"),
            LogValue::Raw(v) => write!(f, "{v}"),
        }
    }
}

/// Arrays where every element has the same primitive type
fn typed_array(items: &[Value]) -> Option<LogValue> {
    if items.is_empty() {
        return None;
    }
    if let Some(numbers) = items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>() {
        return Some(LogValue::NumberArray(numbers));
    }
    if let Some(bools) = items.iter().map(Value::as_bool).collect::<Option<Vec<_>>>() {
        return Some(LogValue::BooleanArray(bools));
    }
    items
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect::<Option<Vec<_>>>()
        .map(LogValue::StringArray)
}

/// One timestamped value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Session-relative time in seconds
    pub timestamp: f64,
    pub value: LogValue,
}

/// Points for one key, sorted by timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    points: Vec<Point>,
}

impl Series {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points at or after `timestamp`, in timestamp order
    pub fn starting_at(&self, timestamp: f64) -> &[Point] {
        let idx = self.points.partition_point(|p| p.timestamp < timestamp);
        &self.points[idx..]
    }

    /// Latest value at or before `timestamp`
    pub fn value_at(&self, timestamp: f64) -> Option<&LogValue> {
        let idx = self.points.partition_point(|p| p.timestamp <= timestamp);
        idx.checked_sub(1).map(|i| &self.points[i].value)
    }

    fn insert(&mut self, timestamp: f64, value: LogValue) {
        let point = Point { timestamp, value };
        match self.points.last() {
            Some(last) if last.timestamp > timestamp => {
                let idx = self.points.partition_point(|p| p.timestamp <= timestamp);
                self.points.insert(idx, point);
            }
            _ => self.points.push(point),
        }
    }
}

/// Time-series log for one connection epoch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryLog {
    series: BTreeMap<String, Series>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` as one point on `key`. `null` is ignored.
    pub fn put_value(&mut self, key: &str, timestamp: f64, value: &Value) {
        if let Some(value) = LogValue::from_json(value) {
            self.insert(key, timestamp, value);
        }
    }

    /// Record `value`, flattening objects and mixed arrays into child keys
    pub fn put_json(&mut self, key: &str, timestamp: f64, value: &Value) {
        match value {
            Value::Null => {}
            Value::Object(fields) => {
                for (child, child_value) in fields {
                    self.put_json(&child_key(key, child), timestamp, child_value);
                }
            }
            Value::Array(items) => match typed_array(items) {
                Some(array) => self.insert(key, timestamp, array),
                None => {
                    for (idx, item) in items.iter().enumerate() {
                        self.put_json(&child_key(key, &idx.to_string()), timestamp, item);
                    }
                }
            },
            _ => self.put_value(key, timestamp, value),
        }
    }

    /// Record an already-typed value
    pub fn insert(&mut self, key: &str, timestamp: f64, value: LogValue) {
        self.series
            .entry(key.to_string())
            .or_default()
            .insert(timestamp, value);
    }

    pub fn series(&self, key: &str) -> Option<&Series> {
        self.series.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.series.iter().map(|(k, s)| (k.as_str(), s))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of points across all keys
    pub fn point_count(&self) -> usize {
        self.series.values().map(Series::len).sum()
    }

    /// Earliest and latest timestamp across all keys
    pub fn timestamp_range(&self) -> Option<(f64, f64)> {
        self.series
            .values()
            .filter_map(|s| Some((s.points.first()?.timestamp, s.points.last()?.timestamp)))
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
    }

    pub fn value_at(&self, key: &str, timestamp: f64) -> Option<&LogValue> {
        self.series.get(key)?.value_at(timestamp)
    }
}

fn child_key(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{KEY_SEPARATOR}{child}")
    }
}
