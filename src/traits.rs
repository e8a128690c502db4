//! Abstractions over the remote prediction service.
//!
//! Screens receive a `PredictionGateway` instead of reaching for a global
//! client, so tests can substitute `MockGateway` and inspect what was sent.

use std::{
    future::Future,
    sync::{Arc, Mutex},
};

use crate::{
    error::GatewayError,
    models::{HistoryRecord, Location, PredictionRequest, PredictionResult},
};

// ==================== Gateway Trait ====================

/// The three one-shot operations offered by the prediction service.
///
/// Implementations perform no retries and keep no cache between calls.
pub trait PredictionGateway: Send + Sync {
    /// Fetch every selectable location.
    fn list_locations(&self) -> impl Future<Output = Result<Vec<Location>, GatewayError>> + Send;

    /// Request a demand prediction for a validated request.
    fn submit_prediction(
        &self,
        request: PredictionRequest,
    ) -> impl Future<Output = Result<PredictionResult, GatewayError>> + Send;

    /// Fetch past predictions in the order the service keeps them (newest first).
    fn list_history(&self) -> impl Future<Output = Result<Vec<HistoryRecord>, GatewayError>> + Send;
}

// ==================== Mock Gateway ====================

/// A call observed by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListLocations,
    SubmitPrediction(PredictionRequest),
    ListHistory,
}

#[derive(Debug)]
struct MockGatewayState {
    locations: Result<Vec<Location>, GatewayError>,
    prediction: Result<PredictionResult, GatewayError>,
    history: Result<Vec<HistoryRecord>, GatewayError>,
    calls: Vec<GatewayCall>,
}

/// In-memory gateway with canned responses that records every call.
#[derive(Debug, Clone)]
pub struct MockGateway {
    state: Arc<Mutex<MockGatewayState>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockGatewayState {
                locations: Ok(Vec::new()),
                prediction: Err(GatewayError::Network(
                    "no prediction configured".to_string(),
                )),
                history: Ok(Vec::new()),
                calls: Vec::new(),
            })),
        }
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locations(self, locations: Vec<Location>) -> Self {
        self.state.lock().unwrap().locations = Ok(locations);
        self
    }

    pub fn with_prediction(self, result: PredictionResult) -> Self {
        self.state.lock().unwrap().prediction = Ok(result);
        self
    }

    pub fn with_history(self, history: Vec<HistoryRecord>) -> Self {
        self.state.lock().unwrap().history = Ok(history);
        self
    }

    pub fn fail_locations(self, error: GatewayError) -> Self {
        self.state.lock().unwrap().locations = Err(error);
        self
    }

    pub fn fail_prediction(self, error: GatewayError) -> Self {
        self.state.lock().unwrap().prediction = Err(error);
        self
    }

    pub fn fail_history(self, error: GatewayError) -> Self {
        self.state.lock().unwrap().history = Err(error);
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Number of `submit_prediction` calls.
    pub fn submissions(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::SubmitPrediction(_)))
            .count()
    }

    pub fn was_called(&self) -> bool {
        !self.state.lock().unwrap().calls.is_empty()
    }
}

impl PredictionGateway for MockGateway {
    async fn list_locations(&self) -> Result<Vec<Location>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::ListLocations);
        state.locations.clone()
    }

    async fn submit_prediction(
        &self,
        request: PredictionRequest,
    ) -> Result<PredictionResult, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::SubmitPrediction(request));
        state.prediction.clone()
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::ListHistory);
        state.history.clone()
    }
}
