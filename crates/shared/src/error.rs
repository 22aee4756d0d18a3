use serde::{Deserialize, Serialize};

/// Error payload returned by the service on non-2xx responses.
///
/// Depending on which handler produced it, the service fills `error`,
/// `message`, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// `error` wins over `message`; blank values are skipped.
    pub fn best_message(&self) -> Option<&str> {
        [self.error.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_error_over_message() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"status":400,"error":"Bad Request","message":"dni already registered"}"#,
        )
        .expect("json");
        assert_eq!(body.best_message(), Some("Bad Request"));
    }

    #[test]
    fn falls_back_to_message_when_error_is_blank() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"  ","message":"office not found"}"#).expect("json");
        assert_eq!(body.best_message(), Some("office not found"));
        assert_eq!(ErrorBody::default().best_message(), None);
    }
}
