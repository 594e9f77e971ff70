use serde::{Deserialize, Serialize};

use desk_core::Workflow;

// ---------------------------------------------------------------------------
// TicketStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a support ticket.
///
/// ```text
/// PENDING → IN_PROGRESS ↔ ON_HOLD
///    ↓            ↓         ↓
///    COMPLETED / REJECTED (also directly from PENDING)
/// ```
///
/// COMPLETED, REJECTED and ARCHIVED are terminal. ARCHIVED is reached only
/// through the dedicated archive operation, never a plain transition, and is
/// refused while the ticket is IN_PROGRESS or ON_HOLD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Pending,
    InProgress,
    OnHold,
    Completed,
    Rejected,
    Archived,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::OnHold => "ON_HOLD",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "ON_HOLD" => Some(Self::OnHold),
            "COMPLETED" => Some(Self::Completed),
            "REJECTED" => Some(Self::Rejected),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Whether closing this status stamps `closed_at`.
    pub fn closes_ticket(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl Workflow for TicketStatus {
    fn allowed_targets(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[
                Self::InProgress,
                Self::OnHold,
                Self::Completed,
                Self::Rejected,
            ],
            Self::InProgress => &[Self::OnHold, Self::Completed, Self::Rejected],
            Self::OnHold => &[Self::InProgress, Self::Completed, Self::Rejected],
            Self::Completed | Self::Rejected | Self::Archived => &[],
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TicketCategory
// ---------------------------------------------------------------------------

/// What kind of asset the ticket is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketCategory {
    Hardware,
    Software,
}

impl TicketCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hardware => "HARDWARE",
            Self::Software => "SOFTWARE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "HARDWARE" => Some(Self::Hardware),
            "SOFTWARE" => Some(Self::Software),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ticket — the core data model, maps to the tickets table
// ---------------------------------------------------------------------------

/// A support ticket.
///
/// Indexed columns (number, status, category, requestor) are duplicated out
/// of the JSON `data` column for filtering; the JSON is the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,

    /// Human-readable ticket number (`TKT-...`). Immutable, assigned once.
    pub ticket_number: String,

    pub requestor: String,
    pub category: TicketCategory,

    /// What the requestor is asking for.
    pub request: String,

    #[serde(default)]
    pub comments: String,

    /// Stored attachment filenames, in upload order.
    #[serde(default)]
    pub attachments: Vec<String>,

    pub status: TicketStatus,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// Set when the ticket reaches COMPLETED or REJECTED, never otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Request / query types
// ---------------------------------------------------------------------------

/// One uploaded attachment in a create request (JSON-bodied upload).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentUpload {
    pub name: String,
    /// Base64-encoded file content.
    pub content: String,
}

/// Body of `POST /helpdesk/tickets`.
///
/// Required fields are Options so their absence surfaces as a
/// VALIDATION_FAILED error instead of a bare deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[serde(default)]
    pub requestor: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub request: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentUpload>,
}

/// Body of `POST /helpdesk/tickets/{id}/@transition`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

/// Filters for `GET /helpdesk/tickets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub requestor: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}
