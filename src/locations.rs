use std::collections::HashSet;

use crate::{
    error::GatewayError,
    models::Location,
    traits::PredictionGateway,
    workflow::{Workflow, WorkflowState},
};

pub const LOCATIONS_FAILED: &str = "Failed to load locations. Please try again later.";

/// Locations available to the prediction form, fetched once per form session.
#[derive(Debug)]
pub struct LocationDirectory {
    workflow: Workflow<Vec<Location>>,
}

impl Default for LocationDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationDirectory {
    pub fn new() -> Self {
        Self {
            workflow: Workflow::new(LOCATIONS_FAILED),
        }
    }

    /// A directory that is already loaded.
    pub fn from_locations(locations: Vec<Location>) -> Self {
        let mut workflow = Workflow::new(LOCATIONS_FAILED);
        if let Ok(ticket) = workflow.begin() {
            workflow.succeed(ticket, locations);
        }
        Self { workflow }
    }

    /// Fetch the list. A no-op once the list has loaded; retries after a failure.
    ///
    /// A list with a non-positive or repeated id is treated as a malformed
    /// response.
    pub async fn load<G: PredictionGateway>(&mut self, gateway: &G) {
        if self.is_loaded() {
            return;
        }
        let pending = match self.workflow.begin_pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::debug!("Skipping location fetch: {}", e);
                return;
            }
        };
        let outcome = gateway.list_locations().await;
        pending.resolve(outcome.and_then(check_ids));
    }

    pub fn state(&self) -> &WorkflowState<Vec<Location>> {
        self.workflow.state()
    }

    pub fn is_loaded(&self) -> bool {
        self.workflow.state().success().is_some()
    }

    /// Loaded locations; empty until the fetch succeeds.
    pub fn locations(&self) -> &[Location] {
        self.workflow
            .state()
            .success()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get(&self, id: i64) -> Option<&Location> {
        self.locations().iter().find(|location| location.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    pub fn dispose(&mut self) {
        self.workflow.dispose();
    }
}

/// Ids must be positive and unique.
fn check_ids(locations: Vec<Location>) -> Result<Vec<Location>, GatewayError> {
    let mut seen = HashSet::with_capacity(locations.len());
    for location in &locations {
        if location.id <= 0 {
            return Err(GatewayError::MalformedResponse(format!(
                "location {:?} has non-positive id {}",
                location.name, location.id
            )));
        }
        if !seen.insert(location.id) {
            return Err(GatewayError::MalformedResponse(format!(
                "duplicate location id {}",
                location.id
            )));
        }
    }
    Ok(locations)
}
