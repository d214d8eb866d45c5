use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// The trainer is unavailable for the whole day, regardless of the
    /// stored start/end times.
    Total,
    /// The trainer is unavailable only for the stored sub-day window.
    Partial,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Total => "total",
            BlockKind::Partial => "partial",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BlockKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "total" => Ok(BlockKind::Total),
            "partial" => Ok(BlockKind::Partial),
            other => Err(format!("unsupported block kind: {other}")),
        }
    }
}

/// Explicit unavailability record for a trainer on one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedPeriod {
    pub id: String,
    pub trainer_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: BlockKind,
    /// Free text; absent reasons degrade to an empty string.
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedPeriodCreateInput {
    pub trainer_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: BlockKind,
    #[serde(default)]
    pub reason: Option<String>,
}
