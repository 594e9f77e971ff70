use serde::{Deserialize, Serialize};

use desk_core::{seq, Workflow};

// ---------------------------------------------------------------------------
// RequestKind
// ---------------------------------------------------------------------------

/// Which kind of public request this is. Determines the number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    /// New account provisioning (`REQ-` numbers).
    Account,
    /// Credential reset (`RST-` numbers).
    Reset,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "ACCOUNT",
            Self::Reset => "RESET",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACCOUNT" => Some(Self::Account),
            "RESET" => Some(Self::Reset),
            _ => None,
        }
    }

    pub fn seq_kind(&self) -> seq::RequestKind {
        match self {
            Self::Account => seq::RequestKind::Account,
            Self::Reset => seq::RequestKind::Reset,
        }
    }
}

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of an account/reset request.
///
/// ```text
/// PENDING → IN_PROGRESS / ON_HOLD / COMPLETED / REJECTED
/// IN_PROGRESS → COMPLETED / REJECTED
/// ON_HOLD     → COMPLETED / REJECTED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    InProgress,
    OnHold,
    Completed,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::OnHold => "ON_HOLD",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "ON_HOLD" => Some(Self::OnHold),
            "COMPLETED" => Some(Self::Completed),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl Workflow for RequestStatus {
    fn allowed_targets(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[
                Self::InProgress,
                Self::OnHold,
                Self::Completed,
                Self::Rejected,
            ],
            Self::InProgress | Self::OnHold => &[Self::Completed, Self::Rejected],
            Self::Completed | Self::Rejected => &[],
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SignupRequest
// ---------------------------------------------------------------------------

/// A public account or reset request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub id: String,

    /// `REQ-...` / `RST-...`. Assigned exactly once at creation.
    pub request_number: String,

    pub kind: RequestKind,
    pub applicant_name: String,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,

    /// Applicant's free-form explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    pub status: RequestStatus,

    /// Administrator notes, attached during disposition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: String,

    /// Set when the request reaches COMPLETED, never otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Request / query types
// ---------------------------------------------------------------------------

/// Body of `POST /signup/requests` (public submission).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Body of `POST /signup/requests/{id}/@transition`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
    /// Optional administrator note attached with the transition.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Filters for `GET /signup/requests`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestListQuery {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        use RequestStatus::*;
        assert!(Pending.can_transition(InProgress));
        assert!(Pending.can_transition(Completed));
        assert!(Pending.can_transition(Rejected));
        assert!(InProgress.can_transition(Completed));
        assert!(OnHold.can_transition(Rejected));
        assert!(!InProgress.can_transition(OnHold));
        assert!(!OnHold.can_transition(InProgress));
        assert!(Completed.is_terminal());
        assert!(Rejected.is_terminal());
    }

    #[test]
    fn kind_roundtrip() {
        assert_eq!(RequestKind::from_str("ACCOUNT"), Some(RequestKind::Account));
        assert_eq!(RequestKind::from_str("RESET"), Some(RequestKind::Reset));
        assert_eq!(RequestKind::from_str("OTHER"), None);
    }

    #[test]
    fn request_json_roundtrip() {
        let r = SignupRequest {
            id: "r001".into(),
            request_number: "REQ-ABC12345678".into(),
            kind: RequestKind::Account,
            applicant_name: "Dana Smith".into(),
            email: "dana@example.org".into(),
            school_name: Some("Lincoln High School".into()),
            details: None,
            status: RequestStatus::Pending,
            notes: None,
            created_at: "2024-05-01T09:00:00+00:00".into(),
            completed_at: None,
        };
        let json = serde_json::to_string(&r).unwrap();
        let back: SignupRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
        assert!(json.contains("\"requestNumber\""));
    }
}
