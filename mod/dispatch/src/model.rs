use serde::{Deserialize, Serialize};

use desk_core::Workflow;

// ---------------------------------------------------------------------------
// BatchStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a device batch: PENDING until the school confirms
/// receipt, then RECEIVED (terminal, no reverse transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Pending,
    Received,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Received => "RECEIVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "RECEIVED" => Some(Self::Received),
            _ => None,
        }
    }
}

impl Workflow for BatchStatus {
    fn allowed_targets(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Received],
            Self::Received => &[],
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Device / Batch
// ---------------------------------------------------------------------------

/// One device line in a batch. Attached at creation, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_type: String,
    pub serial_number: String,
}

/// A shipment of devices sent to one school.
///
/// `batch_number` has the form `YYYYMMDD-NNNN`; NNNN is a zero-padded
/// counter that is contiguous within the calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub batch_number: String,
    pub school_code: String,
    pub school_name: String,
    pub send_date: String,
    pub status: BatchStatus,
    /// Set when the batch reaches RECEIVED, never otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_date: Option<String>,
    pub devices: Vec<Device>,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Request / query types
// ---------------------------------------------------------------------------

/// One device line in a create request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInput {
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
}

/// Body of `POST /dispatch/batches`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    #[serde(default)]
    pub school_code: Option<String>,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub send_date: Option<String>,
    #[serde(default)]
    pub devices: Vec<DeviceInput>,
}

/// Filters for `GET /dispatch/batches`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub school_code: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        assert!(BatchStatus::Pending.can_transition(BatchStatus::Received));
        assert!(!BatchStatus::Received.can_transition(BatchStatus::Pending));
        assert!(BatchStatus::Received.is_terminal());
    }

    #[test]
    fn batch_json_roundtrip() {
        let b = Batch {
            id: "b001".into(),
            batch_number: "20240501-0001".into(),
            school_code: "LHS".into(),
            school_name: "Lincoln High School".into(),
            send_date: "2024-05-01".into(),
            status: BatchStatus::Pending,
            received_date: None,
            devices: vec![Device {
                device_type: "Laptop".into(),
                serial_number: "A1".into(),
            }],
            created_at: "2024-05-01T08:00:00+00:00".into(),
        };
        let json = serde_json::to_string(&b).unwrap();
        let back: Batch = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
        assert!(json.contains("\"batchNumber\""));
        assert!(!json.contains("receivedDate"));
    }
}
