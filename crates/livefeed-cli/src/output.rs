//! Printing new points as they arrive

use livefeed_core::{LogValue, TelemetryLog, TimeSupplier};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Newest timestamp printed for a key, and how many points at exactly that
/// timestamp have been printed
#[derive(Debug, Clone, Copy)]
struct PrintMark {
    timestamp: f64,
    count: usize,
}

/// Renders the points added to a log since the previous call
///
/// Each connection epoch comes with a fresh log and a new clock baseline;
/// a baseline change resets what has been printed. Points that land behind
/// the newest printed timestamp are not printed.
#[derive(Debug)]
pub struct FeedPrinter {
    format: OutputFormat,
    printed: HashMap<String, PrintMark>,
    baseline: Option<f64>,
}

impl FeedPrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            printed: HashMap::new(),
            baseline: None,
        }
    }

    pub fn render(&mut self, log: &TelemetryLog, time: &TimeSupplier) -> Vec<String> {
        if time.baseline() != self.baseline {
            self.printed.clear();
            self.baseline = time.baseline();
        }

        let mut lines = Vec::new();
        for (key, series) in log.iter() {
            let fresh = match self.printed.get(key) {
                Some(mark) => series
                    .starting_at(mark.timestamp)
                    .get(mark.count..)
                    .unwrap_or(&[]),
                None => series.points(),
            };
            let Some(newest) = fresh.last() else {
                continue;
            };

            for point in fresh {
                lines.push(self.format_point(key, point.timestamp, &point.value));
            }
            let mark = PrintMark {
                timestamp: newest.timestamp,
                count: series.starting_at(newest.timestamp).len(),
            };
            self.printed.insert(key.to_string(), mark);
        }
        lines
    }

    fn format_point(&self, key: &str, timestamp: f64, value: &LogValue) -> String {
        match self.format {
            OutputFormat::Text => format!("[{timestamp:>9.3}] {key} = {value}"),
            OutputFormat::Json => serde_json::json!({
                "timestamp": timestamp,
                "key": key,
                "value": value,
            })
            .to_string(),
        }
    }
}
