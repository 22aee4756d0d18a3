//! Two-phase request/confirm guard for destructive operations.
//!
//! `Idle -> Pending(target) -> Idle` on cancel, or
//! `Pending(target) -> Executing(target) -> Idle` on confirm.
//! A single slot holds the pending request; a new request overwrites it.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ConfirmationError, DeletionTarget, RequestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Pending(DeletionTarget),
    Executing(DeletionTarget),
}

/// Performs the delete a confirmed target calls for.
#[async_trait]
pub trait DeletionExecutor: Send + Sync {
    async fn delete(&self, target: DeletionTarget) -> Result<(), RequestError>;
}

pub struct ConfirmationGate {
    state: Mutex<GateState>,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
        }
    }

    pub async fn state(&self) -> GateState {
        *self.state.lock().await
    }

    pub async fn pending(&self) -> Option<DeletionTarget> {
        match *self.state.lock().await {
            GateState::Pending(target) => Some(target),
            _ => None,
        }
    }

    /// Returns the target this request replaced, if one was pending.
    pub async fn request_confirmation(&self, target: DeletionTarget) -> Option<DeletionTarget> {
        let mut state = self.state.lock().await;
        let replaced = match *state {
            GateState::Pending(previous) => Some(previous),
            _ => None,
        };
        *state = GateState::Pending(target);
        debug!(%target, replaced = replaced.is_some(), "confirmation: requested");
        replaced
    }

    /// Drops the pending request without side effects.
    pub async fn cancel(&self) -> Option<DeletionTarget> {
        let mut state = self.state.lock().await;
        match *state {
            GateState::Pending(target) => {
                *state = GateState::Idle;
                debug!(%target, "confirmation: cancelled");
                Some(target)
            }
            _ => None,
        }
    }

    /// Runs the pending delete through `executor`.
    ///
    /// Fails fast with [`ConfirmationError::NothingPending`] unless a request
    /// is pending. The slot is not held while the delete is in flight, so a
    /// request made meanwhile survives the return to `Idle`.
    pub async fn confirm(
        &self,
        executor: &dyn DeletionExecutor,
    ) -> Result<DeletionTarget, ConfirmationError> {
        let target = {
            let mut state = self.state.lock().await;
            let GateState::Pending(target) = *state else {
                warn!(state = ?*state, "confirmation: confirm without pending request");
                return Err(ConfirmationError::NothingPending);
            };
            *state = GateState::Executing(target);
            target
        };

        let outcome = executor.delete(target).await;

        {
            let mut state = self.state.lock().await;
            if *state == GateState::Executing(target) {
                *state = GateState::Idle;
            }
        }

        match outcome {
            Ok(()) => {
                info!(%target, "confirmation: delete executed");
                Ok(target)
            }
            Err(source) => Err(ConfirmationError::Delete { target, source }),
        }
    }
}

#[cfg(test)]
#[path = "tests/confirmation_tests.rs"]
mod tests;
