use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    Pending,
    Approved,
    PreSchedule,
    Rejected,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::PreSchedule => "pre-schedule",
            EventStatus::Rejected => "rejected",
        }
    }

    /// Only approved and pre-scheduled events occupy a trainer's agenda.
    pub fn counts_for_availability(&self) -> bool {
        matches!(self, EventStatus::Approved | EventStatus::PreSchedule)
    }

    pub fn availability_statuses() -> &'static [EventStatus] {
        &[EventStatus::Approved, EventStatus::PreSchedule]
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EventStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "pre-schedule" => Ok(EventStatus::PreSchedule),
            "rejected" => Ok(EventStatus::Rejected),
            other => Err(format!("unsupported event status: {other}")),
        }
    }
}

/// A scheduled training session. Invariant: `end_at > start_at`, enforced
/// at the store boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub trainer_ids: Vec<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: String,
    pub status: EventStatus,
}

impl EventRecord {
    pub fn duration_minutes(&self) -> i64 {
        self.end_at.signed_duration_since(self.start_at).num_minutes()
    }

    pub fn involves(&self, trainer_id: &str) -> bool {
        self.trainer_ids.iter().any(|id| id == trainer_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventCreateInput {
    pub title: String,
    pub trainer_ids: Vec<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<EventStatus>,
}
