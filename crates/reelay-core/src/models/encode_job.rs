use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Lifecycle state of an HLS transcode job.
///
/// Transitions are monotonic: pending → processing → {success | failed}.
/// A terminal state is never overwritten.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EncodeJobState {
    Pending,
    Processing,
    Success,
    Failed,
}

impl EncodeJobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EncodeJobState::Success | EncodeJobState::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: EncodeJobState) -> bool {
        matches!(
            (self, next),
            (EncodeJobState::Pending, EncodeJobState::Processing)
                | (EncodeJobState::Processing, EncodeJobState::Success)
                | (EncodeJobState::Processing, EncodeJobState::Failed)
        )
    }
}

impl Display for EncodeJobState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EncodeJobState::Pending => write!(f, "pending"),
            EncodeJobState::Processing => write!(f, "processing"),
            EncodeJobState::Success => write!(f, "success"),
            EncodeJobState::Failed => write!(f, "failed"),
        }
    }
}

/// Persisted status record for one video's transcode lifecycle.
///
/// Created at enqueue time and retained after completion as an audit record;
/// callers poll it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeJob {
    pub id: String,
    pub state: EncodeJobState,
    /// Diagnostic message, populated when the job fails.
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EncodeJob {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: EncodeJobState::Pending,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Wire form of an [`EncodeJob`] for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EncodeJobResponse {
    pub id: String,
    pub state: EncodeJobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EncodeJob> for EncodeJobResponse {
    fn from(job: EncodeJob) -> Self {
        Self {
            id: job.id,
            state: job.state,
            message: job.message,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_pending() {
        let job = EncodeJob::new("abc");
        assert_eq!(job.state, EncodeJobState::Pending);
        assert!(job.message.is_none());
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn legal_transitions() {
        use EncodeJobState::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Success));
        assert!(Processing.can_transition_to(Failed));
    }

    #[test]
    fn illegal_transitions() {
        use EncodeJobState::*;
        assert!(!Pending.can_transition_to(Success));
        assert!(!Pending.can_transition_to(Failed));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Success.can_transition_to(Processing));
        assert!(!Success.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Success));
        assert!(!Failed.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states() {
        assert!(EncodeJobState::Success.is_terminal());
        assert!(EncodeJobState::Failed.is_terminal());
        assert!(!EncodeJobState::Pending.is_terminal());
        assert!(!EncodeJobState::Processing.is_terminal());
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EncodeJobState::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn response_omits_message_when_absent() {
        let response = EncodeJobResponse::from(EncodeJob::new("abc"));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("message").is_none());
        assert_eq!(json.get("state").and_then(|v| v.as_str()), Some("pending"));
    }
}
