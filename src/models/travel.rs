use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum party size of a single travel log entry. The log is a bounded
/// multi-party record, not a graph of individual itineraries.
pub const MAX_TRAVEL_PARTY: usize = 6;

/// One day of travel between two municipalities for up to
/// [`MAX_TRAVEL_PARTY`] trainers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TravelRecord {
    pub id: String,
    pub date: NaiveDate,
    pub origin: String,
    pub destination: String,
    pub trainer_ids: Vec<String>,
}

impl TravelRecord {
    pub fn involves(&self, trainer_id: &str) -> bool {
        self.trainer_ids.iter().any(|id| id == trainer_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TravelRecordCreateInput {
    pub date: NaiveDate,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    pub trainer_ids: Vec<String>,
}
