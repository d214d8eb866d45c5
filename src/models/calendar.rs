use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How an empty cell is rendered: `-` when the caller treats the grid as a
/// sparse report, `V` when it distinguishes "checked, confirmed free" from
/// "not evaluated".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyCellPolicy {
    #[default]
    NotEvaluated,
    ConfirmedFree,
}

/// One cell of the availability grid. The token vocabulary is consumed by
/// existing calendar views and must stay bit-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `T` — total block, no other activity that day.
    TotalBlock,
    /// `P` — partial block, no other activity that day.
    PartialBlock,
    /// `X` — a block colliding with events or travel.
    BlockedBusy,
    /// `D` — travel only.
    TravelOnly,
    /// `D1` — travel plus coincident event activity.
    TravelWithEvents,
    /// `1`, `2`, ... — event count for the day.
    Events(u32),
    /// `-` — no data for the cell.
    Empty,
    /// `V` — explicitly confirmed available.
    Available,
}

impl Marker {
    pub fn token(&self) -> String {
        match self {
            Marker::TotalBlock => "T".to_string(),
            Marker::PartialBlock => "P".to_string(),
            Marker::BlockedBusy => "X".to_string(),
            Marker::TravelOnly => "D".to_string(),
            Marker::TravelWithEvents => "D1".to_string(),
            Marker::Events(count) => count.to_string(),
            Marker::Empty => "-".to_string(),
            Marker::Available => "V".to_string(),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

/// Marker matrix for a roster over an explicit day list. Each row is
/// aligned index-for-index with `days`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarGrid {
    /// Day-of-month numbers, in the order the rows are laid out.
    pub days: Vec<u32>,
    pub markers: BTreeMap<String, Vec<String>>,
}
