//! Summary statistics and chart series derived from a prediction.
//!
//! Everything here is a pure function of a [`PredictionResult`]. Totals are
//! recomputed from the per-slot list rather than taken from the response.

use std::fmt;

use crate::{error::DeriveError, models::PredictionResult};

/// Seats per bus.
pub const BUS_CAPACITY: u32 = 50;

// ==================== Derived Metrics ====================

#[derive(Debug, Clone, PartialEq)]
pub struct SlotUtilization {
    pub time_slot: String,
    /// Percentage of offered seats filled, rounded to one decimal place.
    pub utilization_percent: f64,
}

impl SlotUtilization {
    /// `"100.0%"`
    pub fn display(&self) -> String {
        format!("{:.1}%", self.utilization_percent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub total_predicted_demand: u64,
    pub total_buses_needed: u64,
    pub average_demand_per_slot: u64,
    pub peak_demand: u32,
    pub average_buses_per_slot: u64,
    pub per_slot_utilization: Vec<SlotUtilization>,
}

/// Integer division rounded half-up. `count` must be non-zero.
fn round_half_up(total: u64, count: u64) -> u64 {
    (2 * total + count) / (2 * count)
}

/// Seat utilization for one slot, rounded half-up to one decimal place.
///
/// Rounding happens on integer tenths of a percent, so exact halves such as
/// 7.25% always round up.
pub fn utilization_percent(predicted_demand: u32, buses_needed: u32) -> Option<f64> {
    if buses_needed == 0 {
        return None;
    }
    // tenths = demand / (buses * capacity) * 1000
    let tenths = round_half_up(
        1000 * u64::from(predicted_demand),
        u64::from(buses_needed) * u64::from(BUS_CAPACITY),
    );
    Some(tenths as f64 / 10.0)
}

/// Summarize a prediction.
///
/// Fails on an empty slot list, and on any slot that needs zero buses.
pub fn derive(result: &PredictionResult) -> Result<DerivedMetrics, DeriveError> {
    let slots = &result.predictions;
    if slots.is_empty() {
        return Err(DeriveError::EmptyResult);
    }

    let per_slot_utilization = slots
        .iter()
        .map(|slot| {
            utilization_percent(slot.predicted_demand, slot.buses_needed)
                .map(|utilization_percent| SlotUtilization {
                    time_slot: slot.time_slot.clone(),
                    utilization_percent,
                })
                .ok_or_else(|| DeriveError::DivisionByZero {
                    time_slot: slot.time_slot.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total_predicted_demand: u64 = slots.iter().map(|s| u64::from(s.predicted_demand)).sum();
    let total_buses_needed: u64 = slots.iter().map(|s| u64::from(s.buses_needed)).sum();

    if total_predicted_demand != result.total_predicted_demand
        || total_buses_needed != result.total_buses_needed
    {
        tracing::warn!(
            "Service totals ({} tickets, {} buses) disagree with slot sums ({}, {}); using slot sums",
            result.total_predicted_demand,
            result.total_buses_needed,
            total_predicted_demand,
            total_buses_needed
        );
    }

    let count = slots.len() as u64;
    let peak_demand = slots
        .iter()
        .map(|s| s.predicted_demand)
        .max()
        .unwrap_or_default();

    Ok(DerivedMetrics {
        total_predicted_demand,
        total_buses_needed,
        average_demand_per_slot: round_half_up(total_predicted_demand, count),
        peak_demand,
        average_buses_per_slot: round_half_up(total_buses_needed, count),
        per_slot_utilization,
    })
}

// ==================== Chart Series ====================

/// RGBA color as understood by the charting widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

const TEAL: Rgba = Rgba::new(75, 192, 192, 1.0);
const PURPLE: Rgba = Rgba::new(153, 102, 255, 1.0);

/// Slice colors of the distribution chart, reused in order when there are
/// more than four slots.
pub const DISTRIBUTION_PALETTE: [Rgba; 4] = [
    Rgba::new(255, 99, 132, 1.0),
    Rgba::new(54, 162, 235, 1.0),
    Rgba::new(255, 206, 86, 1.0),
    Rgba::new(75, 192, 192, 1.0),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesKind {
    Bar,
    /// Filled, smoothed line.
    Area { tension: f32 },
    Pie,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: &'static str,
    pub kind: SeriesKind,
    pub data: Vec<u32>,
    /// One entry for uniform series, one per point for the distribution.
    pub background: Vec<Rgba>,
    pub border: Vec<Rgba>,
}

/// Chart-ready arrays keyed by time slot, in response order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub demand: Dataset,
    pub buses: Dataset,
    pub trend: Dataset,
    pub distribution: Dataset,
}

pub fn chart_series(result: &PredictionResult) -> ChartSeries {
    let slots = &result.predictions;
    let labels = slots.iter().map(|s| s.time_slot.clone()).collect();
    let demand: Vec<u32> = slots.iter().map(|s| s.predicted_demand).collect();
    let buses = slots.iter().map(|s| s.buses_needed).collect();
    let palette = (0..slots.len()).map(|i| DISTRIBUTION_PALETTE[i % DISTRIBUTION_PALETTE.len()]);

    ChartSeries {
        labels,
        demand: Dataset {
            label: "Predicted Demand (Tickets)",
            kind: SeriesKind::Bar,
            data: demand.clone(),
            background: vec![TEAL.with_alpha(0.6)],
            border: vec![TEAL],
        },
        buses: Dataset {
            label: "Buses Needed",
            kind: SeriesKind::Bar,
            data: buses,
            background: vec![PURPLE.with_alpha(0.6)],
            border: vec![PURPLE],
        },
        trend: Dataset {
            label: "Demand Trend",
            kind: SeriesKind::Area { tension: 0.4 },
            data: demand.clone(),
            background: vec![TEAL.with_alpha(0.2)],
            border: vec![TEAL],
        },
        distribution: Dataset {
            label: "Demand Distribution",
            kind: SeriesKind::Pie,
            data: demand,
            background: palette.clone().map(|c| c.with_alpha(0.6)).collect(),
            border: palette.collect(),
        },
    }
}
