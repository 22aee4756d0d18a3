//! Events the dashboard publishes to whatever renders it.

use chrono::{DateTime, Utc};
use shared::domain::Employee;

use crate::error::{ConsoleError, DeletionTarget, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub detail: Option<String>,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.into(),
            detail: None,
            raised_at: Utc::now(),
        }
    }

    pub fn from_error(title: impl Into<String>, err: &ConsoleError) -> Self {
        Self {
            severity: err.severity(),
            title: title.into(),
            detail: Some(err.to_string()),
            raised_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Notification(Notification),
    ListsRefreshed { employees: usize, offices: usize },
    SearchResult(Option<Employee>),
    ConfirmationRequested(DeletionTarget),
    ConfirmationCleared,
    /// The credential is gone or was rejected; the caller must sign in again.
    SessionEnded,
}
