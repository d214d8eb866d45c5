use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    TotalBlock,
    PartialBlock,
    Overlap,
    TravelBuffer,
    DailyCapacity,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::TotalBlock => "total-block",
            ConflictKind::PartialBlock => "partial-block",
            ConflictKind::Overlap => "overlap",
            ConflictKind::TravelBuffer => "travel-buffer",
            ConflictKind::DailyCapacity => "daily-capacity",
        }
    }

    /// Blocks and overlaps veto a booking; buffer and capacity findings
    /// only ask for a human look.
    pub fn severity(&self) -> ConflictSeverity {
        match self {
            ConflictKind::TotalBlock | ConflictKind::PartialBlock | ConflictKind::Overlap => {
                ConflictSeverity::Error
            }
            ConflictKind::TravelBuffer | ConflictKind::DailyCapacity => ConflictSeverity::Warning,
        }
    }

    /// Legacy single-letter code, for the presentation boundary only.
    /// Classifiers and reports always carry the full variant.
    pub fn display_code(&self) -> &'static str {
        match self {
            ConflictKind::TotalBlock => "B",
            ConflictKind::PartialBlock => "P",
            ConflictKind::Overlap => "O",
            ConflictKind::TravelBuffer => "V",
            ConflictKind::DailyCapacity => "C",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConflictKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        match value {
            "total-block" => Ok(ConflictKind::TotalBlock),
            "partial-block" => Ok(ConflictKind::PartialBlock),
            "overlap" => Ok(ConflictKind::Overlap),
            "travel-buffer" => Ok(ConflictKind::TravelBuffer),
            "daily-capacity" => Ok(ConflictKind::DailyCapacity),
            other => Err(format!("unsupported conflict kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Error,
    Warning,
}

impl ConflictSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Error => "error",
            ConflictSeverity::Warning => "warning",
        }
    }
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding of one classifier. Built once per evaluation and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    pub kind: ConflictKind,
    pub severity: ConflictSeverity,
    pub message: String,
    pub detail: JsonValue,
}

impl ConflictEntry {
    pub fn new(kind: ConflictKind, message: impl Into<String>, detail: JsonValue) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            detail,
        }
    }
}

/// Per-trainer conflict lists for one candidate booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub conflicts: BTreeMap<String, Vec<ConflictEntry>>,
    /// True when the candidate carried no usable location and the travel
    /// classifier was skipped for the whole evaluation.
    pub travel_check_skipped: bool,
}

impl ConflictReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.values().all(|entries| entries.is_empty())
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConflictEntry> {
        self.conflicts.values().flatten()
    }

    pub fn total_entries(&self) -> usize {
        self.conflicts.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSummary {
    pub total: usize,
    pub by_kind: BTreeMap<ConflictKind, usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Approve,
    Reject,
    Review,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Approve => "approve",
            RecommendedAction::Reject => "reject",
            RecommendedAction::Review => "review",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory verdict derived from a report. The approval workflow owns the
/// actual decision and must revalidate at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub action: RecommendedAction,
    pub confidence: f64,
}
