//! Error taxonomy shared by the request layer, the session and the controller.

use shared::domain::{EmployeeId, OfficeId};
use thiserror::Error;

/// Transport or HTTP failure, normalized to a single human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestError {
    /// HTTP status when the service answered; `None` for transport failures.
    pub status: Option<u16>,
    pub message: String,
}

impl RequestError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|status| status.as_u16()),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Employee,
    Office,
}

impl FormKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Office => "office",
        }
    }
}

/// Local, pre-network rejection. Never reaches the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("all {} fields must be filled in (missing: {})", .form.label(), .fields.join(", "))]
    MissingFields {
        form: FormKind,
        fields: Vec<&'static str>,
    },
    #[error("an employee must be selected first")]
    NoEmployeeSelected,
    #[error("an employee id must be entered")]
    BlankSearchId,
}

/// Non-fatal outcome of a by-id employee search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("employee {id} not found: {reason}")]
pub struct NotFoundWarning {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    BlankCredentials,
    #[error("login response did not carry a token")]
    MissingToken,
    #[error(transparent)]
    Rejected(#[from] RequestError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeletionTarget {
    Employee(EmployeeId),
    Office(OfficeId),
}

impl std::fmt::Display for DeletionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Employee(id) => write!(f, "employee {id}"),
            Self::Office(id) => write!(f, "office {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmationError {
    #[error("no deletion is awaiting confirmation")]
    NothingPending,
    #[error("failed to delete {target}: {source}")]
    Delete {
        target: DeletionTarget,
        source: RequestError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    NotFound(#[from] NotFoundWarning),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),
    #[error("not signed in")]
    Unauthenticated,
    #[error("the dashboard is not mounted")]
    NotMounted,
}

impl ConsoleError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Validation(_) | Self::NotFound(_) => Severity::Warning,
            Self::Confirmation(ConfirmationError::NothingPending) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// True when the service rejected the credential, or there is none.
    pub fn requires_reauth(&self) -> bool {
        match self {
            Self::Unauthenticated => true,
            Self::Request(err)
            | Self::Auth(AuthError::Rejected(err))
            | Self::Confirmation(ConfirmationError::Delete { source: err, .. }) => {
                err.requires_reauth()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_lists_offending_fields() {
        let err = ValidationError::MissingFields {
            form: FormKind::Office,
            fields: vec!["name", "location"],
        };
        assert_eq!(
            err.to_string(),
            "all office fields must be filled in (missing: name, location)"
        );
    }

    #[test]
    fn severity_separates_warnings_from_failures() {
        let warning = ConsoleError::from(NotFoundWarning {
            id: "9".into(),
            reason: "Not Found".into(),
        });
        assert_eq!(warning.severity(), Severity::Warning);
        assert_eq!(
            ConsoleError::from(ValidationError::BlankSearchId).severity(),
            Severity::Warning
        );
        assert_eq!(
            ConsoleError::from(RequestError::new(Some(500), "boom")).severity(),
            Severity::Error
        );
    }

    #[test]
    fn unauthorized_statuses_require_reauth() {
        assert!(ConsoleError::Unauthenticated.requires_reauth());
        assert!(ConsoleError::from(RequestError::new(Some(401), "Unauthorized")).requires_reauth());
        assert!(ConsoleError::from(ConfirmationError::Delete {
            target: DeletionTarget::Office(OfficeId(1)),
            source: RequestError::new(Some(403), "Forbidden"),
        })
        .requires_reauth());
        assert!(!ConsoleError::from(RequestError::new(Some(404), "Not Found")).requires_reauth());
        assert!(!ConsoleError::from(RequestError::transport("connection refused")).requires_reauth());
        assert!(!ConsoleError::NotMounted.requires_reauth());
    }
}
