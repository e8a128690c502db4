//! Per-screen request lifecycle.
//!
//! A screen's interaction with the service is a single `WorkflowState`:
//! `Idle -> Loading -> Success(payload) | Error(message)`. A new user action
//! re-enters `Loading` from either terminal state; nothing leaves a terminal
//! state on its own.
//!
//! [`Workflow`] wraps the state with a generation counter. `begin` hands out
//! a [`Ticket`]; only the ticket of the current generation may complete the
//! request, so a response arriving after the screen was disposed (or after a
//! newer request started) is dropped instead of overwriting state.
//!
//! Screens that await the gateway while borrowing their workflow hold a
//! [`Pending`] instead of a bare ticket. Dropping it before it resolves (the
//! caller timed out or gave up on the future) abandons the request and
//! returns the workflow to `Idle`, so the next user action can start.

use std::fmt::Display;

use crate::error::WorkflowError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> WorkflowState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkflowState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, WorkflowState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            WorkflowState::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            WorkflowState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Proof that a request was started by [`Workflow::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a ticket is needed to complete the request"]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug)]
pub struct Workflow<T> {
    state: WorkflowState<T>,
    generation: u64,
    disposed: bool,
    failure_message: &'static str,
}

impl<T> Workflow<T> {
    /// `failure_message` is what the screen shows when the remote call fails.
    pub fn new(failure_message: &'static str) -> Self {
        Self {
            state: WorkflowState::Idle,
            generation: 0,
            disposed: false,
            failure_message,
        }
    }

    pub fn state(&self) -> &WorkflowState<T> {
        &self.state
    }

    pub fn failure_message(&self) -> &'static str {
        self.failure_message
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Enter `Loading` for a new user action.
    ///
    /// Refuses while a request is already in flight, and after disposal.
    pub fn begin(&mut self) -> Result<Ticket, WorkflowError> {
        if self.disposed {
            return Err(WorkflowError::Disposed);
        }
        if self.state.is_loading() {
            return Err(WorkflowError::InFlight);
        }
        self.generation += 1;
        self.state = WorkflowState::Loading;
        Ok(Ticket {
            generation: self.generation,
        })
    }

    fn accepts(&self, ticket: Ticket) -> bool {
        !self.disposed && ticket.generation == self.generation && self.state.is_loading()
    }

    /// `Loading -> Success`. Returns false if the ticket is stale.
    pub fn succeed(&mut self, ticket: Ticket, payload: T) -> bool {
        if !self.accepts(ticket) {
            tracing::warn!(
                "Discarding late result (ticket generation {}, current {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        self.state = WorkflowState::Success(payload);
        true
    }

    /// `Loading -> Error(message)`. Returns false if the ticket is stale.
    pub fn fail(&mut self, ticket: Ticket, message: impl Into<String>) -> bool {
        if !self.accepts(ticket) {
            tracing::warn!(
                "Discarding late failure (ticket generation {}, current {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        self.state = WorkflowState::Error(message.into());
        true
    }

    /// Complete with a gateway outcome, mapping any error to the screen's
    /// failure message.
    pub fn resolve<E: Display>(&mut self, ticket: Ticket, outcome: Result<T, E>) -> bool {
        match outcome {
            Ok(payload) => self.succeed(ticket, payload),
            Err(e) => {
                tracing::error!("{} ({})", self.failure_message, e);
                let message = self.failure_message;
                self.fail(ticket, message)
            }
        }
    }

    /// Like [`begin`](Self::begin), but the returned guard abandons the
    /// request if it is dropped unresolved.
    pub fn begin_pending(&mut self) -> Result<Pending<'_, T>, WorkflowError> {
        let ticket = self.begin()?;
        Ok(Pending {
            workflow: self,
            ticket: Some(ticket),
        })
    }

    /// `Loading -> Idle` for a request nobody will complete.
    ///
    /// The ticket becomes stale. Returns false if it already was.
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        tracing::debug!("Abandoning request (generation {})", ticket.generation);
        self.generation += 1;
        self.state = WorkflowState::Idle;
        true
    }

    /// Tear the screen down. Any outstanding ticket becomes stale.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.generation += 1;
    }
}

/// An in-flight request that borrows its workflow until resolved.
#[must_use = "dropping a pending request abandons it"]
#[derive(Debug)]
pub struct Pending<'a, T> {
    workflow: &'a mut Workflow<T>,
    ticket: Option<Ticket>,
}

impl<T> Pending<'_, T> {
    pub fn ticket(&self) -> Option<Ticket> {
        self.ticket
    }

    pub fn resolve<E: Display>(mut self, outcome: Result<T, E>) -> bool {
        match self.ticket.take() {
            Some(ticket) => self.workflow.resolve(ticket, outcome),
            None => false,
        }
    }
}

impl<T> Drop for Pending<'_, T> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.workflow.abandon(ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAILED: &str = "Failed to load things. Please try again later.";

    #[test]
    fn test_starts_idle() {
        let workflow: Workflow<u32> = Workflow::new(FAILED);
        assert!(workflow.state().is_idle());
        assert!(!workflow.is_disposed());
    }

    #[test]
    fn test_loading_then_success() {
        let mut workflow = Workflow::new(FAILED);
        let ticket = workflow.begin().unwrap();
        assert!(workflow.state().is_loading());

        assert!(workflow.succeed(ticket, 42));
        assert_eq!(workflow.state(), &WorkflowState::Success(42));
        assert_eq!(workflow.state().success(), Some(&42));
    }

    #[test]
    fn test_resolve_error_uses_screen_message() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);
        let ticket = workflow.begin().unwrap();

        assert!(workflow.resolve(ticket, Err::<u32, _>("connection refused")));
        assert_eq!(workflow.state().error(), Some(FAILED));
    }

    #[test]
    fn test_begin_rejected_while_loading() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);
        let _ticket = workflow.begin().unwrap();
        assert_eq!(workflow.begin(), Err(WorkflowError::InFlight));
    }

    #[test]
    fn test_retry_from_terminal_states() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);

        let ticket = workflow.begin().unwrap();
        workflow.fail(ticket, "boom");
        let ticket = workflow.begin().expect("retry from Error");
        assert!(workflow.state().is_loading());

        workflow.succeed(ticket, 1);
        let ticket = workflow.begin().expect("retry from Success");
        assert!(workflow.succeed(ticket, 2));
        assert_eq!(workflow.state().success(), Some(&2));
    }

    #[test]
    fn test_terminal_state_does_not_change_without_ticket() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);
        let ticket = workflow.begin().unwrap();
        workflow.succeed(ticket, 7);

        // Same ticket cannot complete twice.
        assert!(!workflow.fail(ticket, "late"));
        assert_eq!(workflow.state().success(), Some(&7));
    }

    #[test]
    fn test_late_result_after_dispose_is_ignored() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);
        let ticket = workflow.begin().unwrap();
        workflow.dispose();

        assert!(!workflow.succeed(ticket, 5));
        assert!(workflow.state().is_loading());
        assert_eq!(workflow.begin(), Err(WorkflowError::Disposed));
    }

    #[test]
    fn test_stale_ticket_from_previous_generation() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);
        let first = workflow.begin().unwrap();
        workflow.fail(first, "boom");
        let second = workflow.begin().unwrap();

        assert!(!workflow.succeed(first, 1));
        assert!(workflow.succeed(second, 2));
        assert_eq!(workflow.state().success(), Some(&2));
    }

    // ==================== Pending Guard Tests ====================

    #[test]
    fn test_pending_resolves_like_ticket() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);
        let pending = workflow.begin_pending().unwrap();
        assert!(pending.ticket().is_some());

        assert!(pending.resolve(Ok::<_, String>(9)));
        assert_eq!(workflow.state().success(), Some(&9));
    }

    #[test]
    fn test_dropped_pending_returns_to_idle() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);
        let pending = workflow.begin_pending().unwrap();
        drop(pending);

        assert!(workflow.state().is_idle());
        let ticket = workflow.begin().expect("free to start again");
        assert!(workflow.succeed(ticket, 3));
    }

    #[test]
    fn test_abandoned_ticket_is_stale() {
        let mut workflow: Workflow<u32> = Workflow::new(FAILED);
        let ticket = workflow.begin().unwrap();

        assert!(workflow.abandon(ticket));
        assert!(!workflow.abandon(ticket));
        assert!(!workflow.succeed(ticket, 1));
        assert!(workflow.state().is_idle());
    }
}
