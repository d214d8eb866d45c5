use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use tempfile::NamedTempFile;

use formacal::config::EngineConfig;
use formacal::db::store::SqliteStore;
use formacal::db::DbPool;
use formacal::error::AppError;
use formacal::models::block::{BlockKind, BlockedPeriodCreateInput};
use formacal::models::conflict::{ConflictKind, RecommendedAction};
use formacal::models::event::{EventCreateInput, EventStatus};
use formacal::models::trainer::{Trainer, TrainerCreateInput};
use formacal::services::conflict_service::{CandidateBooking, ConflictService};

fn dt(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap(),
    )
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn setup() -> (NamedTempFile, SqliteStore, Trainer) {
    let temp_file = NamedTempFile::new().unwrap();
    let pool = DbPool::new(temp_file.path()).unwrap();
    let store = SqliteStore::new(pool);
    let trainer = store
        .create_trainer(TrainerCreateInput {
            name: "Ana Ferrer".to_string(),
            active: Some(true),
        })
        .unwrap();
    (temp_file, store, trainer)
}

fn candidate(trainer: &Trainer, start: DateTime<Utc>, end: DateTime<Utc>) -> CandidateBooking {
    CandidateBooking {
        trainer_ids: vec![trainer.id.clone()],
        title: "new session".to_string(),
        start_at: start,
        end_at: end,
        location: Some("Valencia".to_string()),
        exclude_event_id: None,
    }
}

#[test]
fn total_block_plus_event_yields_reject_with_both_entries() {
    let (_guard, store, trainer) = setup();

    store
        .create_blocked_period(BlockedPeriodCreateInput {
            trainer_id: trainer.id.clone(),
            date: date(10),
            start_time: time(0, 0),
            end_time: time(23, 59),
            kind: BlockKind::Total,
            reason: Some("annual leave".to_string()),
        })
        .unwrap();
    store
        .create_event(EventCreateInput {
            title: "Digital skills workshop".to_string(),
            trainer_ids: vec![trainer.id.clone()],
            start_at: dt(10, 9, 0),
            end_at: dt(10, 11, 0),
            location: Some("Valencia".to_string()),
            status: Some(EventStatus::Approved),
        })
        .unwrap();

    let service = ConflictService::new(&store, EngineConfig::default());
    let report = service
        .detect(&candidate(&trainer, dt(10, 10, 0), dt(10, 12, 0)))
        .unwrap();

    let entries = &report.conflicts[&trainer.id];
    let kinds: Vec<ConflictKind> = entries.iter().map(|entry| entry.kind).collect();
    assert!(kinds.contains(&ConflictKind::TotalBlock));
    assert!(kinds.contains(&ConflictKind::Overlap));

    let recommendation = service.recommend(&report);
    assert_eq!(recommendation.action, RecommendedAction::Reject);

    let summary = service.summarize(&report);
    assert_eq!(summary.total, entries.len());
    assert_eq!(summary.by_kind[&ConflictKind::TotalBlock], 1);
}

#[test]
fn clean_report_approves() {
    let (_guard, store, trainer) = setup();
    let service = ConflictService::new(&store, EngineConfig::default());
    let report = service
        .detect(&candidate(&trainer, dt(12, 9, 0), dt(12, 11, 0)))
        .unwrap();
    assert!(report.is_clean());
    assert!(!report.travel_check_skipped);

    let recommendation = service.recommend(&report);
    assert_eq!(recommendation.action, RecommendedAction::Approve);
    assert_eq!(recommendation.confidence, 1.0);
}

#[test]
fn unknown_trainer_fails_the_whole_call() {
    let (_guard, store, trainer) = setup();
    let service = ConflictService::new(&store, EngineConfig::default());
    let mut cand = candidate(&trainer, dt(12, 9, 0), dt(12, 11, 0));
    cand.trainer_ids.push("no-such-trainer".to_string());
    assert!(matches!(service.detect(&cand), Err(AppError::NotFound)));
}

#[test]
fn pending_and_rejected_events_are_invisible() {
    let (_guard, store, trainer) = setup();
    for status in [EventStatus::Pending, EventStatus::Rejected] {
        store
            .create_event(EventCreateInput {
                title: format!("{status} session"),
                trainer_ids: vec![trainer.id.clone()],
                start_at: dt(12, 9, 0),
                end_at: dt(12, 11, 0),
                location: Some("Valencia".to_string()),
                status: Some(status),
            })
            .unwrap();
    }

    let service = ConflictService::new(&store, EngineConfig::default());
    let report = service
        .detect(&candidate(&trainer, dt(12, 9, 0), dt(12, 11, 0)))
        .unwrap();
    assert!(report.is_clean());
}

#[test]
fn tight_transition_between_municipalities_asks_for_review() {
    let (_guard, store, trainer) = setup();
    store
        .create_event(EventCreateInput {
            title: "Morning course".to_string(),
            trainer_ids: vec![trainer.id.clone()],
            start_at: dt(12, 8, 0),
            end_at: dt(12, 10, 0),
            location: Some("Madrid".to_string()),
            status: Some(EventStatus::PreSchedule),
        })
        .unwrap();

    let service = ConflictService::new(&store, EngineConfig::default());
    // 60 minute gap against the default 90 minute buffer.
    let report = service
        .detect(&candidate(&trainer, dt(12, 11, 0), dt(12, 13, 0)))
        .unwrap();

    let entries = &report.conflicts[&trainer.id];
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ConflictKind::TravelBuffer);
    assert_eq!(entries[0].detail["gapMinutes"], 60);
    assert_eq!(entries[0].detail["requiredMinutes"], 90);

    assert_eq!(service.recommend(&report).action, RecommendedAction::Review);
}

#[test]
fn missing_location_skips_travel_but_keeps_other_classifiers() {
    let (_guard, store, trainer) = setup();
    store
        .create_event(EventCreateInput {
            title: "Morning course".to_string(),
            trainer_ids: vec![trainer.id.clone()],
            start_at: dt(12, 8, 0),
            end_at: dt(12, 10, 0),
            location: Some("Madrid".to_string()),
            status: Some(EventStatus::Approved),
        })
        .unwrap();

    let service = ConflictService::new(&store, EngineConfig::default());
    let mut cand = candidate(&trainer, dt(12, 9, 0), dt(12, 12, 0));
    cand.location = None;
    let report = service.detect(&cand).unwrap();

    assert!(report.travel_check_skipped);
    let entries = &report.conflicts[&trainer.id];
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ConflictKind::Overlap);
}

#[test]
fn editing_an_event_excludes_it_from_its_own_report() {
    let (_guard, store, trainer) = setup();
    let event = store
        .create_event(EventCreateInput {
            title: "Existing session".to_string(),
            trainer_ids: vec![trainer.id.clone()],
            start_at: dt(12, 9, 0),
            end_at: dt(12, 11, 0),
            location: Some("Valencia".to_string()),
            status: Some(EventStatus::Approved),
        })
        .unwrap();

    let service = ConflictService::new(&store, EngineConfig::default());
    let mut cand = candidate(&trainer, dt(12, 9, 30), dt(12, 11, 30));
    cand.exclude_event_id = Some(event.id.clone());
    let report = service.detect(&cand).unwrap();
    assert!(report.is_clean());
}

#[test]
fn adjacent_event_is_legal_but_adjacent_partial_block_is_not() {
    let (_guard, store, trainer) = setup();
    store
        .create_event(EventCreateInput {
            title: "Early session".to_string(),
            trainer_ids: vec![trainer.id.clone()],
            start_at: dt(12, 9, 0),
            end_at: dt(12, 11, 0),
            location: Some("Valencia".to_string()),
            status: Some(EventStatus::Approved),
        })
        .unwrap();

    let service = ConflictService::new(&store, EngineConfig::default());
    let report = service
        .detect(&candidate(&trainer, dt(12, 11, 0), dt(12, 13, 0)))
        .unwrap();
    assert!(report.conflicts[&trainer.id]
        .iter()
        .all(|entry| entry.kind != ConflictKind::Overlap));

    store
        .create_blocked_period(BlockedPeriodCreateInput {
            trainer_id: trainer.id.clone(),
            date: date(13),
            start_time: time(9, 0),
            end_time: time(11, 0),
            kind: BlockKind::Partial,
            reason: None,
        })
        .unwrap();
    let report = service
        .detect(&candidate(&trainer, dt(13, 11, 0), dt(13, 13, 0)))
        .unwrap();
    let entries = &report.conflicts[&trainer.id];
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ConflictKind::PartialBlock);
}
