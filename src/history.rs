use std::{fmt::Display, path::Path};

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};

use crate::{
    error::{GatewayError, WorkflowError},
    models::HistoryRecord,
    prediction::FORM_ROUTE,
    traits::PredictionGateway,
    workflow::{Ticket, Workflow, WorkflowState},
};

pub const HISTORY_FAILED: &str = "Failed to load prediction history. Please try again later.";

/// A history record formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: i64,
    pub date: String,
    pub route: String,
    pub time_period: String,
    pub occasion: String,
    pub season: String,
    pub total_demand: u64,
    pub buses_needed: u64,
}

impl HistoryRow {
    /// Format with the timestamp in the local timezone.
    pub fn from_record(record: &HistoryRecord) -> Self {
        Self::from_record_in(record, &Local)
    }

    pub fn from_record_in<Tz>(record: &HistoryRecord, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            id: record.id,
            date: record
                .timestamp
                .with_timezone(tz)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            route: format!(
                "{} to {}",
                record.start_location_name, record.end_location_name
            ),
            time_period: record.time_period.label().to_string(),
            occasion: record.occasion.to_string(),
            season: record.season.to_string(),
            total_demand: record.total_predicted_demand,
            buses_needed: record.total_buses_needed,
        }
    }
}

/// What the history screen renders. Exactly one branch at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryPresentation<'a> {
    Loading,
    Error {
        message: &'a str,
        back_to: &'static str,
    },
    Empty {
        back_to: &'static str,
    },
    Table(&'a [HistoryRecord]),
}

/// Past predictions, shown in the order the service returned them.
#[derive(Debug)]
pub struct HistoryView {
    workflow: Workflow<Vec<HistoryRecord>>,
}

impl Default for HistoryView {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryView {
    pub fn new() -> Self {
        Self {
            workflow: Workflow::new(HISTORY_FAILED),
        }
    }

    /// Fetch the history. Called once when the screen is shown.
    ///
    /// Dropping the future before the gateway answers leaves the view `Idle`.
    pub async fn mount<G: PredictionGateway>(&mut self, gateway: &G) {
        let pending = match self.workflow.begin_pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::debug!("Skipping history fetch: {}", e);
                return;
            }
        };
        let outcome = gateway.list_history().await;
        pending.resolve(outcome);
    }

    /// Start a fetch whose gateway call the caller drives.
    pub fn begin_load(&mut self) -> Result<Ticket, WorkflowError> {
        self.workflow.begin()
    }

    /// Finish a fetch started with [`begin_load`](Self::begin_load).
    /// Returns false if the outcome arrived too late and was discarded.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<HistoryRecord>, GatewayError>,
    ) -> bool {
        self.workflow.resolve(ticket, outcome)
    }

    pub fn state(&self) -> &WorkflowState<Vec<HistoryRecord>> {
        self.workflow.state()
    }

    pub fn present(&self) -> HistoryPresentation<'_> {
        match self.workflow.state() {
            // Fetching starts on mount, so an unmounted view reads as loading.
            WorkflowState::Idle | WorkflowState::Loading => HistoryPresentation::Loading,
            WorkflowState::Error(message) => HistoryPresentation::Error {
                message,
                back_to: FORM_ROUTE,
            },
            WorkflowState::Success(records) if records.is_empty() => HistoryPresentation::Empty {
                back_to: FORM_ROUTE,
            },
            WorkflowState::Success(records) => HistoryPresentation::Table(records),
        }
    }

    /// Display rows, empty unless loaded.
    pub fn rows(&self) -> Vec<HistoryRow> {
        self.workflow
            .state()
            .success()
            .map(|records| records.iter().map(HistoryRow::from_record).collect())
            .unwrap_or_default()
    }

    /// Write the loaded records to a CSV file. Returns the number written.
    pub async fn export_csv(&self, path: &Path) -> Result<usize> {
        let records = self
            .workflow
            .state()
            .success()
            .cloned()
            .context("Prediction history has not been loaded")?;
        let count = records.len();
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut wtr = csv::Writer::from_path(&path).context("Failed to create CSV writer")?;

            for record in records {
                wtr.serialize(record)
                    .context("Failed to serialize history record")?;
            }

            wtr.flush().context("Failed to flush CSV writer")?;
            Ok(())
        })
        .await
        .context("CSV export task failed")??;

        Ok(count)
    }

    pub fn dispose(&mut self) {
        self.workflow.dispose();
    }
}
