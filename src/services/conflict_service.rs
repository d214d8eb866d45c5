use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::db::store::AvailabilityStore;
use crate::error::{AppError, AppResult};
use crate::models::block::{BlockKind, BlockedPeriod};
use crate::models::conflict::{
    ConflictEntry, ConflictKind, ConflictReport, ConflictSeverity, ConflictSummary,
    Recommendation, RecommendedAction,
};
use crate::models::event::{EventRecord, EventStatus};
use crate::models::range::DateRange;
use crate::services::schedule_utils::{self, EdgePolicy};

/// A booking being evaluated: one or more trainers, a window, optionally a
/// location and an event under edit to exclude from the comparison set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBooking {
    pub trainer_ids: Vec<String>,
    #[serde(default)]
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub exclude_event_id: Option<String>,
}

impl CandidateBooking {
    fn normalized_location(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .map(str::to_string)
    }
}

/// Runs the four classifiers per trainer in fixed order and merges their
/// findings. Reads go through the store exactly three times per call
/// (roster, blocks, events); classification itself is in-memory.
pub struct ConflictService<'a, S: AvailabilityStore> {
    store: &'a S,
    config: EngineConfig,
}

impl<'a, S: AvailabilityStore> ConflictService<'a, S> {
    pub fn new(store: &'a S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Full conflict report for a candidate booking. Classifiers never
    /// short-circuit: the caller needs the complete picture, not the first
    /// objection.
    pub fn detect(&self, candidate: &CandidateBooking) -> AppResult<ConflictReport> {
        schedule_utils::ensure_window(candidate.start_at, candidate.end_at)?;

        let trainer_ids: Vec<String> = candidate
            .trainer_ids
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if trainer_ids.is_empty() {
            return Err(AppError::validation("candidate needs at least one trainer"));
        }

        let roster = self.store.trainers(&trainer_ids)?;
        let known: BTreeSet<&str> = roster.iter().map(|t| t.id.as_str()).collect();
        let missing: Vec<&String> = trainer_ids
            .iter()
            .filter(|id| !known.contains(id.as_str()))
            .collect();
        if !missing.is_empty() {
            warn!(target: "app::conflict", ?missing, "unknown trainer ids in candidate");
            return Err(AppError::not_found());
        }

        let location = candidate.normalized_location();
        let travel_check_skipped = location.is_none();
        if travel_check_skipped {
            debug!(
                target: "app::conflict",
                "candidate has no usable location; travel classifier skipped"
            );
        }

        let fetch_range = padded_range(
            candidate.start_at,
            candidate.end_at,
            self.config.travel_buffer_minutes,
        )?;
        let blocks = self.store.blocked_periods(&trainer_ids, &fetch_range)?;
        let events = self.store.events(
            &trainer_ids,
            &fetch_range,
            EventStatus::availability_statuses(),
        )?;

        debug!(
            target: "app::conflict",
            trainers = trainer_ids.len(),
            blocks = blocks.len(),
            events = events.len(),
            start = %candidate.start_at,
            end = %candidate.end_at,
            "running classifiers"
        );

        let mut conflicts = BTreeMap::new();
        for trainer_id in &trainer_ids {
            let mut entries = Vec::new();
            entries.extend(self.classify_blocks(trainer_id, candidate, &blocks));
            entries.extend(self.classify_overlaps(trainer_id, candidate, &events));
            if let Some(location) = &location {
                entries.extend(self.classify_travel(trainer_id, candidate, location, &events));
            }
            entries.extend(self.classify_capacity(trainer_id, candidate, &events)?);
            conflicts.insert(trainer_id.clone(), entries);
        }

        let report = ConflictReport {
            conflicts,
            travel_check_skipped,
        };
        info!(
            target: "app::conflict",
            total = report.total_entries(),
            travel_check_skipped,
            "conflict detection finished"
        );
        Ok(report)
    }

    pub fn summarize(&self, report: &ConflictReport) -> ConflictSummary {
        summarize(report)
    }

    pub fn recommend(&self, report: &ConflictReport) -> Recommendation {
        recommend(report)
    }

    /// Explicit unavailability. A total block claims the whole day; a
    /// partial block conflicts under the touching-counts rule, so a block
    /// bordering the requested window still claims the edge minute.
    fn classify_blocks(
        &self,
        trainer_id: &str,
        candidate: &CandidateBooking,
        blocks: &[BlockedPeriod],
    ) -> Vec<ConflictEntry> {
        let mut entries = Vec::new();
        for date in schedule_utils::dates_covered(candidate.start_at, candidate.end_at) {
            for block in blocks
                .iter()
                .filter(|b| b.trainer_id == trainer_id && b.date == date)
            {
                match block.kind {
                    BlockKind::Total => entries.push(ConflictEntry::new(
                        ConflictKind::TotalBlock,
                        format!("trainer is blocked for the whole day of {date}"),
                        json!({
                            "trainerId": trainer_id,
                            "date": date.to_string(),
                            "reason": block.reason,
                        }),
                    )),
                    BlockKind::Partial => {
                        let (block_start, block_end) = block_window(block, date);
                        if schedule_utils::overlaps(
                            &candidate.start_at,
                            &candidate.end_at,
                            &block_start,
                            &block_end,
                            EdgePolicy::TouchingConflicts,
                        ) {
                            entries.push(ConflictEntry::new(
                                ConflictKind::PartialBlock,
                                format!(
                                    "trainer is blocked {} to {} on {date}",
                                    block.start_time, block.end_time
                                ),
                                json!({
                                    "trainerId": trainer_id,
                                    "date": date.to_string(),
                                    "blockStart": block_start.to_rfc3339(),
                                    "blockEnd": block_end.to_rfc3339(),
                                    "reason": block.reason,
                                }),
                            ));
                        }
                    }
                }
            }
        }
        entries
    }

    /// Existing approved or pre-scheduled events of the same trainer.
    /// Touching endpoints are allowed: back-to-back sessions are legal.
    fn classify_overlaps(
        &self,
        trainer_id: &str,
        candidate: &CandidateBooking,
        events: &[EventRecord],
    ) -> Vec<ConflictEntry> {
        relevant_events(trainer_id, candidate, events)
            .filter(|event| {
                schedule_utils::overlaps(
                    &candidate.start_at,
                    &candidate.end_at,
                    &event.start_at,
                    &event.end_at,
                    EdgePolicy::TouchingAllowed,
                )
            })
            .map(|event| {
                ConflictEntry::new(
                    ConflictKind::Overlap,
                    format!(
                        "overlaps event \"{}\" ({} - {})",
                        event.title, event.start_at, event.end_at
                    ),
                    json!({
                        "trainerId": trainer_id,
                        "eventId": event.id,
                        "eventTitle": event.title,
                        "eventStart": event.start_at.to_rfc3339(),
                        "eventEnd": event.end_at.to_rfc3339(),
                        "location": event.location,
                    }),
                )
            })
            .collect()
    }

    /// Transition time between events in different municipalities. Events at
    /// the same location never need a buffer; overlapping pairs are already
    /// reported by the overlap classifier.
    fn classify_travel(
        &self,
        trainer_id: &str,
        candidate: &CandidateBooking,
        candidate_location: &str,
        events: &[EventRecord],
    ) -> Vec<ConflictEntry> {
        let buffer = self.config.travel_buffer_minutes;
        let mut entries = Vec::new();

        for event in relevant_events(trainer_id, candidate, events) {
            let event_location = event.location.trim();
            if event_location.is_empty()
                || event_location.eq_ignore_ascii_case(candidate_location)
            {
                continue;
            }
            if schedule_utils::overlaps(
                &candidate.start_at,
                &candidate.end_at,
                &event.start_at,
                &event.end_at,
                EdgePolicy::TouchingAllowed,
            ) {
                continue;
            }

            let gap = if event.end_at <= candidate.start_at {
                candidate.start_at - event.end_at
            } else {
                event.start_at - candidate.end_at
            };
            let gap_minutes = gap.num_minutes();
            if gap_minutes < buffer {
                entries.push(ConflictEntry::new(
                    ConflictKind::TravelBuffer,
                    format!(
                        "only {gap_minutes} min to change location from \"{}\" to \"{}\" ({buffer} min required)",
                        event.location, candidate_location
                    ),
                    json!({
                        "trainerId": trainer_id,
                        "eventId": event.id,
                        "eventTitle": event.title,
                        "eventLocation": event.location,
                        "candidateLocation": candidate_location,
                        "gapMinutes": gap_minutes,
                        "requiredMinutes": buffer,
                    }),
                ));
            }
        }
        entries
    }

    /// Cumulative booked duration on the candidate's calendar day against
    /// the configured ceiling. Emits at most one entry per trainer.
    fn classify_capacity(
        &self,
        trainer_id: &str,
        candidate: &CandidateBooking,
        events: &[EventRecord],
    ) -> AppResult<Vec<ConflictEntry>> {
        let ceiling = self.config.daily_capacity_minutes();
        let date = candidate.start_at.date_naive();
        let candidate_minutes =
            schedule_utils::duration_minutes(candidate.start_at, candidate.end_at)?;

        let mut total_minutes = candidate_minutes;
        let mut event_count = 1usize;
        for event in relevant_events(trainer_id, candidate, events) {
            if event.start_at.date_naive() == date {
                total_minutes += event.duration_minutes();
                event_count += 1;
            }
        }

        if total_minutes <= ceiling {
            return Ok(Vec::new());
        }

        let excess_minutes = total_minutes - ceiling;
        Ok(vec![ConflictEntry::new(
            ConflictKind::DailyCapacity,
            format!(
                "{:.1}h booked on {date} exceeds the {:.1}h daily ceiling across {event_count} events",
                total_minutes as f64 / 60.0,
                ceiling as f64 / 60.0,
            ),
            json!({
                "trainerId": trainer_id,
                "date": date.to_string(),
                "totalMinutes": total_minutes,
                "ceilingMinutes": ceiling,
                "excessMinutes": excess_minutes,
                "eventCount": event_count,
            }),
        )])
    }
}

pub fn summarize(report: &ConflictReport) -> ConflictSummary {
    let mut by_kind: BTreeMap<ConflictKind, usize> = BTreeMap::new();
    for entry in report.entries() {
        *by_kind.entry(entry.kind).or_insert(0) += 1;
    }
    ConflictSummary {
        total: report.total_entries(),
        by_kind,
    }
}

/// Advisory mapping: any blocking finding rejects, warnings alone ask for
/// review, a clean report approves. Confidence decays with the number of
/// findings but stays deterministic.
pub fn recommend(report: &ConflictReport) -> Recommendation {
    let mut errors = 0usize;
    let mut warnings = 0usize;
    for entry in report.entries() {
        match entry.severity {
            ConflictSeverity::Error => errors += 1,
            ConflictSeverity::Warning => warnings += 1,
        }
    }

    if errors > 0 {
        Recommendation {
            action: RecommendedAction::Reject,
            confidence: (0.95 - 0.05 * (errors as f64 - 1.0)).max(0.7),
        }
    } else if warnings > 0 {
        Recommendation {
            action: RecommendedAction::Review,
            confidence: (0.8 - 0.05 * (warnings as f64 - 1.0)).max(0.5),
        }
    } else {
        Recommendation {
            action: RecommendedAction::Approve,
            confidence: 1.0,
        }
    }
}

fn relevant_events<'e>(
    trainer_id: &'e str,
    candidate: &'e CandidateBooking,
    events: &'e [EventRecord],
) -> impl Iterator<Item = &'e EventRecord> {
    events.iter().filter(move |event| {
        event.involves(trainer_id)
            && event.status.counts_for_availability()
            && candidate.exclude_event_id.as_deref() != Some(event.id.as_str())
    })
}

fn block_window(block: &BlockedPeriod, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(block.start_time));
    let end = Utc.from_utc_datetime(&date.and_time(block.end_time));
    (start, end)
}

fn padded_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    margin_minutes: i64,
) -> AppResult<DateRange> {
    let margin = Duration::minutes(margin_minutes.max(0));
    DateRange::new((start - margin).date_naive(), (end + margin).date_naive())
}
