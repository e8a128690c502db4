//! Bus Demand Library
//!
//! Client-side core of the bus demand planner: typed access to the
//! prediction service, form validation, per-screen request workflows and the
//! metrics derived from a prediction.

pub mod api;
pub mod builder;
pub mod config;
pub mod error;
pub mod history;
pub mod locations;
pub mod metrics;
pub mod models;
pub mod prediction;
pub mod traits;
pub mod workflow;

// Re-export commonly used types
pub use api::ApiClient;
pub use builder::PredictionRequestBuilder;
pub use config::AppConfig;
pub use error::{
    DeriveError, GatewayError, PredictionError, SubmitError, ValidationError, WorkflowError,
};
pub use history::{HistoryPresentation, HistoryRow, HistoryView};
pub use locations::LocationDirectory;
pub use metrics::{BUS_CAPACITY, ChartSeries, DerivedMetrics, chart_series, derive};
pub use models::{
    HistoryRecord, Location, Occasion, PredictionRequest, PredictionResult, RouteEndpoints,
    Season, TimePeriod, TimeSlotPrediction,
};
pub use prediction::{PredictionDashboard, PredictionScreen, PredictionView};
pub use traits::{GatewayCall, MockGateway, PredictionGateway};
pub use workflow::{Pending, Ticket, Workflow, WorkflowState};
