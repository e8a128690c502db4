//! Prediction form and results screen.
//!
//! The screen owns the location directory, the form draft and one workflow
//! whose success payload is the fully derived dashboard. A response that
//! cannot be summarized ends in the error branch, never in a partial view.

use crate::{
    builder::PredictionRequestBuilder,
    error::{DeriveError, GatewayError, PredictionError, SubmitError},
    locations::LocationDirectory,
    metrics::{self, ChartSeries, DerivedMetrics, SlotUtilization},
    models::{PredictionRequest, PredictionResult, TimeSlotPrediction},
    traits::PredictionGateway,
    workflow::{Ticket, Workflow, WorkflowState},
};

pub const PREDICTION_FAILED: &str = "Failed to make prediction. Please try again later.";

/// Navigation target of the prediction form.
pub const FORM_ROUTE: &str = "/predict";
pub const HISTORY_ROUTE: &str = "/history";

/// Everything the results view shows for one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionDashboard {
    pub result: PredictionResult,
    pub metrics: DerivedMetrics,
    pub charts: ChartSeries,
}

/// One line of the detailed predictions table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow<'a> {
    pub prediction: &'a TimeSlotPrediction,
    pub utilization: &'a SlotUtilization,
}

impl PredictionDashboard {
    pub fn from_result(result: PredictionResult) -> Result<Self, DeriveError> {
        let metrics = metrics::derive(&result)?;
        let charts = metrics::chart_series(&result);
        Ok(Self {
            result,
            metrics,
            charts,
        })
    }

    pub fn rows(&self) -> Vec<ResultRow<'_>> {
        self.result
            .predictions
            .iter()
            .zip(&self.metrics.per_slot_utilization)
            .map(|(prediction, utilization)| ResultRow {
                prediction,
                utilization,
            })
            .collect()
    }
}

/// The mutually exclusive branches the results area can render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PredictionView<'a> {
    /// Nothing submitted yet.
    NoPrediction { back_to: &'static str },
    Loading,
    Error {
        message: &'a str,
        back_to: &'static str,
    },
    Ready(&'a PredictionDashboard),
}

#[derive(Debug)]
pub struct PredictionScreen {
    directory: LocationDirectory,
    form: PredictionRequestBuilder,
    workflow: Workflow<PredictionDashboard>,
}

impl Default for PredictionScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionScreen {
    pub fn new() -> Self {
        Self {
            directory: LocationDirectory::new(),
            form: PredictionRequestBuilder::new(),
            workflow: Workflow::new(PREDICTION_FAILED),
        }
    }

    /// Load the selectable locations.
    pub async fn mount<G: PredictionGateway>(&mut self, gateway: &G) {
        self.directory.load(gateway).await;
    }

    pub fn directory(&self) -> &LocationDirectory {
        &self.directory
    }

    pub fn form(&self) -> &PredictionRequestBuilder {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PredictionRequestBuilder {
        &mut self.form
    }

    pub fn state(&self) -> &WorkflowState<PredictionDashboard> {
        self.workflow.state()
    }

    /// Validate the draft and, if it passes, request a prediction.
    ///
    /// Validation failures and a request already in flight are returned to the
    /// caller without touching the gateway or the workflow. Remote and
    /// data-shape failures end in the workflow's `Error` state. If the
    /// returned future is dropped before the gateway answers, the request is
    /// abandoned and the screen goes back to `Idle`.
    pub async fn submit<G: PredictionGateway>(&mut self, gateway: &G) -> Result<(), SubmitError> {
        let request = self.form.build_for(&self.directory)?;
        let pending = self.workflow.begin_pending()?;

        let outcome = gateway.submit_prediction(request).await;
        pending.resolve(summarize(outcome));
        Ok(())
    }

    /// First half of [`submit`](Self::submit) for callers that run the
    /// gateway call themselves. The screen is not borrowed while the request
    /// is out, so it can be disposed or resubmitted in the meantime.
    pub fn begin_submit(&mut self) -> Result<(Ticket, PredictionRequest), SubmitError> {
        let request = self.form.build_for(&self.directory)?;
        let ticket = self.workflow.begin()?;
        Ok((ticket, request))
    }

    /// Second half of [`begin_submit`](Self::begin_submit). Returns false if
    /// the ticket is stale and the outcome was discarded.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<PredictionResult, GatewayError>,
    ) -> bool {
        self.workflow.resolve(ticket, summarize(outcome))
    }

    /// Give up on a request started with [`begin_submit`](Self::begin_submit).
    pub fn cancel(&mut self, ticket: Ticket) -> bool {
        self.workflow.abandon(ticket)
    }

    pub fn view(&self) -> PredictionView<'_> {
        match self.workflow.state() {
            WorkflowState::Idle => PredictionView::NoPrediction {
                back_to: FORM_ROUTE,
            },
            WorkflowState::Loading => PredictionView::Loading,
            WorkflowState::Error(message) => PredictionView::Error {
                message,
                back_to: FORM_ROUTE,
            },
            WorkflowState::Success(dashboard) => PredictionView::Ready(dashboard),
        }
    }

    /// Tear down; late responses are discarded.
    pub fn dispose(&mut self) {
        self.directory.dispose();
        self.workflow.dispose();
    }
}

fn summarize(
    outcome: Result<PredictionResult, GatewayError>,
) -> Result<PredictionDashboard, PredictionError> {
    Ok(PredictionDashboard::from_result(outcome?)?)
}
