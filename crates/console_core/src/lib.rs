use std::sync::Arc;

pub mod api;
pub mod assignment;
pub mod config;
pub mod confirmation;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod forms;
pub mod session;
pub mod transport;

pub use api::ConsoleApi;
pub use assignment::{AssignmentRequest, AssignmentWorkflow};
pub use config::{load_settings, load_settings_file, ConsoleSettings};
pub use confirmation::{ConfirmationGate, DeletionExecutor, GateState};
pub use dashboard::{DashboardController, DashboardState, EmployeeDraft, OfficeDraft};
pub use error::{
    AuthError, ConfirmationError, ConsoleError, DeletionTarget, NotFoundWarning, RequestError,
    Severity, ValidationError,
};
pub use events::{DashboardEvent, Notification};
pub use forms::{EmployeeForm, OfficeForm};
pub use session::{AuthSession, Credential};
pub use transport::RequestClient;

/// Wires the request client, api and session for `settings`.
pub fn connect(settings: &ConsoleSettings) -> anyhow::Result<Arc<AuthSession>> {
    let client = RequestClient::new(settings)?;
    tracing::info!(api_root = client.api_root(), "console: using service");
    Ok(AuthSession::new(ConsoleApi::new(client)))
}

#[cfg(test)]
#[path = "tests/fake_service.rs"]
mod fake_service;
