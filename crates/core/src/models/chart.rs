use serde::{Deserialize, Serialize};

/// A single chart data point.
///
/// The core computes the numbers; presentation only renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Human time bucket, e.g. "Mar 4" (or "Unknown" when the block time is unresolved)
    pub label: String,

    /// Decimal quantity already scaled by the asset's precision
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Output of the series builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultSeries {
    /// Price per share at each of the most recent events, oldest first
    pub price_series: Vec<SeriesPoint>,

    /// Net asset flow per calendar day, oldest day first
    pub flow_series: Vec<SeriesPoint>,

    /// True while the event store is loading or the series are being rebuilt
    pub loading: bool,
}

impl VaultSeries {
    /// Net of all flow buckets.
    pub fn net_flow(&self) -> f64 {
        self.flow_series.iter().map(|p| p.value).sum()
    }
}
