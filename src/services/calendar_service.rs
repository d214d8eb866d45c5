use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::db::store::AvailabilityStore;
use crate::error::{AppError, AppResult};
use crate::models::calendar::{CalendarGrid, EmptyCellPolicy, Marker};
use crate::models::event::EventStatus;
use crate::models::range::DateRange;
use crate::services::schedule_utils::{self, EdgePolicy};

/// Everything known about one (trainer, day) cell after the bulk fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellActivity {
    pub has_total_block: bool,
    pub has_partial_block: bool,
    pub has_travel: bool,
    pub event_count: u32,
}

impl CellActivity {
    fn is_busy(&self) -> bool {
        self.has_travel || self.event_count > 0
    }
}

/// The one marker precedence table. Both the batch grid and the single-cell
/// lookup resolve through this function; there is deliberately no second
/// copy of this logic anywhere.
pub fn resolve_marker(cell: &CellActivity, empty: EmptyCellPolicy) -> Marker {
    if cell.has_total_block {
        return if cell.is_busy() {
            Marker::BlockedBusy
        } else {
            Marker::TotalBlock
        };
    }
    if cell.has_partial_block {
        return if cell.is_busy() {
            Marker::BlockedBusy
        } else {
            Marker::PartialBlock
        };
    }
    if cell.has_travel {
        return if cell.event_count > 0 {
            Marker::TravelWithEvents
        } else {
            Marker::TravelOnly
        };
    }
    match cell.event_count {
        0 => match empty {
            EmptyCellPolicy::NotEvaluated => Marker::Empty,
            EmptyCellPolicy::ConfirmedFree => Marker::Available,
        },
        count => Marker::Events(count),
    }
}

/// Per-(trainer, day) index over one bulk fetch per record family. Holds
/// the request-scoped cache; nothing here outlives the call that built it.
struct ActivityIndex {
    cells: HashMap<(String, NaiveDate), CellActivity>,
}

impl ActivityIndex {
    fn build<S: AvailabilityStore>(
        store: &S,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> AppResult<Self> {
        let mut cells: HashMap<(String, NaiveDate), CellActivity> = HashMap::new();

        let blocks = store.blocked_periods(trainer_ids, range)?;
        for block in &blocks {
            let cell = cells
                .entry((block.trainer_id.clone(), block.date))
                .or_default();
            match block.kind {
                crate::models::block::BlockKind::Total => cell.has_total_block = true,
                crate::models::block::BlockKind::Partial => cell.has_partial_block = true,
            }
        }

        let travel = store.travel_records(trainer_ids, range)?;
        for record in &travel {
            for trainer_id in &record.trainer_ids {
                cells
                    .entry((trainer_id.clone(), record.date))
                    .or_default()
                    .has_travel = true;
            }
        }

        let events = store.events(trainer_ids, range, EventStatus::availability_statuses())?;
        for event in &events {
            for date in schedule_utils::dates_covered(event.start_at, event.end_at) {
                if !range.contains(date) {
                    continue;
                }
                let (day_start, day_end) = schedule_utils::day_bounds(date);
                if !schedule_utils::overlaps(
                    &event.start_at,
                    &event.end_at,
                    &day_start,
                    &day_end,
                    EdgePolicy::TouchingAllowed,
                ) {
                    continue;
                }
                for trainer_id in &event.trainer_ids {
                    cells
                        .entry((trainer_id.clone(), date))
                        .or_default()
                        .event_count += 1;
                }
            }
        }

        debug!(
            target: "app::calendar",
            blocks = blocks.len(),
            travel = travel.len(),
            events = events.len(),
            cells = cells.len(),
            "activity index built"
        );

        Ok(Self { cells })
    }

    fn cell(&self, trainer_id: &str, date: NaiveDate) -> CellActivity {
        self.cells
            .get(&(trainer_id.to_string(), date))
            .copied()
            .unwrap_or_default()
    }
}

/// Renders rosters as month grids of single-token markers. All data is
/// pulled in three bulk queries per call, never per cell.
pub struct CalendarService<'a, S: AvailabilityStore> {
    store: &'a S,
}

impl<'a, S: AvailabilityStore> CalendarService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// One marker per (trainer, day), rows aligned with `days`. Empty
    /// rosters or day lists produce an empty grid.
    pub fn build_grid(
        &self,
        trainer_ids: &[String],
        days: &[NaiveDate],
        empty: EmptyCellPolicy,
    ) -> AppResult<CalendarGrid> {
        let unique_ids: Vec<String> = trainer_ids
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let day_numbers: Vec<u32> = days.iter().map(|day| day.day()).collect();
        if unique_ids.is_empty() || days.is_empty() {
            return Ok(CalendarGrid {
                days: day_numbers,
                markers: Default::default(),
            });
        }

        let start = *days.iter().min().expect("non-empty day list");
        let end = *days.iter().max().expect("non-empty day list");
        let range = DateRange::new(start, end)?;
        let index = ActivityIndex::build(self.store, &unique_ids, &range)?;

        let mut grid = CalendarGrid {
            days: day_numbers,
            markers: Default::default(),
        };
        for trainer_id in &unique_ids {
            let row = days
                .iter()
                .map(|day| resolve_marker(&index.cell(trainer_id, *day), empty).token())
                .collect();
            grid.markers.insert(trainer_id.clone(), row);
        }

        debug!(
            target: "app::calendar",
            trainers = unique_ids.len(),
            days = days.len(),
            "calendar grid built"
        );
        Ok(grid)
    }

    /// Whole-month convenience wrapper; `days` in the result are 1..=N.
    pub fn month_grid(
        &self,
        trainer_ids: &[String],
        year: i32,
        month: u32,
        empty: EmptyCellPolicy,
    ) -> AppResult<CalendarGrid> {
        let days = month_days(year, month)?;
        self.build_grid(trainer_ids, &days, empty)
    }

    /// Ad hoc single-cell lookup. Runs through the same index and the same
    /// precedence function as the batch path.
    pub fn day_marker(
        &self,
        trainer_id: &str,
        date: NaiveDate,
        empty: EmptyCellPolicy,
    ) -> AppResult<Marker> {
        let ids = vec![trainer_id.to_string()];
        let range = DateRange::single_day(date);
        let index = ActivityIndex::build(self.store, &ids, &range)?;
        Ok(resolve_marker(&index.cell(trainer_id, date), empty))
    }
}

fn month_days(year: i32, month: u32) -> AppResult<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("invalid month: {year}-{month}")))?;
    let mut days = Vec::with_capacity(31);
    let mut current = first;
    while current.month() == month {
        days.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(days)
}
