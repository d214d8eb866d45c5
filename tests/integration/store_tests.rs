use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use tempfile::NamedTempFile;

use formacal::db::store::{AvailabilityStore, SqliteStore};
use formacal::db::DbPool;
use formacal::models::block::{BlockKind, BlockedPeriodCreateInput};
use formacal::models::event::{EventCreateInput, EventStatus};
use formacal::models::range::DateRange;
use formacal::models::trainer::{Trainer, TrainerCreateInput};
use formacal::models::travel::TravelRecordCreateInput;

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
            active: None,
        })
        .unwrap();
    (temp_file, store, trainer)
}

#[test]
fn logging_init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    formacal::utils::logger::init_logging(dir.path()).unwrap();
    formacal::utils::logger::init_logging(dir.path()).unwrap();
}

#[test]
fn trainer_roundtrip_defaults_to_active() {
    let (_guard, store, trainer) = setup();
    assert!(trainer.active);

    let loaded = store.trainers(&[trainer.id.clone()]).unwrap();
    assert_eq!(loaded, vec![trainer]);

    let missing = store.trainers(&["ghost".to_string()]).unwrap();
    assert!(missing.is_empty());
}

#[test]
fn blocked_periods_filter_by_trainer_and_date() {
    let (_guard, store, trainer) = setup();
    for day in [9, 10, 20] {
        store
            .create_blocked_period(BlockedPeriodCreateInput {
                trainer_id: trainer.id.clone(),
                date: date(day),
                start_time: time(9, 0),
                end_time: time(11, 0),
                kind: BlockKind::Partial,
                reason: Some("medical".to_string()),
            })
            .unwrap();
    }

    let range = DateRange::new(date(9), date(12)).unwrap();
    let blocks = store
        .blocked_periods(&[trainer.id.clone()], &range)
        .unwrap();
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|block| block.reason == "medical"));

    let none = store
        .blocked_periods(&["ghost".to_string()], &range)
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn events_filter_by_status_and_window() {
    let (_guard, store, trainer) = setup();
    for (status, day) in [
        (EventStatus::Approved, 10),
        (EventStatus::PreSchedule, 11),
        (EventStatus::Pending, 10),
        (EventStatus::Rejected, 10),
    ] {
        store
            .create_event(EventCreateInput {
                title: format!("{status} on day {day}"),
                trainer_ids: vec![trainer.id.clone()],
                start_at: dt(day, 9, 0),
                end_at: dt(day, 11, 0),
                location: None,
                status: Some(status),
            })
            .unwrap();
    }

    let range = DateRange::new(date(10), date(11)).unwrap();
    let events = store
        .events(
            &[trainer.id.clone()],
            &range,
            EventStatus::availability_statuses(),
        )
        .unwrap();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|event| event.status.counts_for_availability()));
    assert!(events.iter().all(|event| event.involves(&trainer.id)));

    let narrow = DateRange::new(date(11), date(11)).unwrap();
    let events = store
        .events(
            &[trainer.id.clone()],
            &narrow,
            EventStatus::availability_statuses(),
        )
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, EventStatus::PreSchedule);
}

#[test]
fn event_status_update_changes_visibility() {
    let (_guard, store, trainer) = setup();
    let event = store
        .create_event(EventCreateInput {
            title: "awaiting approval".to_string(),
            trainer_ids: vec![trainer.id.clone()],
            start_at: dt(10, 9, 0),
            end_at: dt(10, 11, 0),
            location: None,
            status: None,
        })
        .unwrap();
    assert_eq!(event.status, EventStatus::Pending);

    let range = DateRange::new(date(10), date(10)).unwrap();
    let visible = store
        .events(
            &[trainer.id.clone()],
            &range,
            EventStatus::availability_statuses(),
        )
        .unwrap();
    assert!(visible.is_empty());

    store
        .set_event_status(&event.id, EventStatus::Approved)
        .unwrap();
    let visible = store
        .events(
            &[trainer.id.clone()],
            &range,
            EventStatus::availability_statuses(),
        )
        .unwrap();
    assert_eq!(visible.len(), 1);
}

#[test]
fn invalid_records_are_rejected() {
    let (_guard, store, trainer) = setup();

    let inverted_event = store.create_event(EventCreateInput {
        title: "inverted".to_string(),
        trainer_ids: vec![trainer.id.clone()],
        start_at: dt(10, 11, 0),
        end_at: dt(10, 9, 0),
        location: None,
        status: None,
    });
    assert!(inverted_event.is_err());

    let inverted_block = store.create_blocked_period(BlockedPeriodCreateInput {
        trainer_id: trainer.id.clone(),
        date: date(10),
        start_time: time(11, 0),
        end_time: time(9, 0),
        kind: BlockKind::Partial,
        reason: None,
    });
    assert!(inverted_block.is_err());

    let oversized_party = store.create_travel_record(TravelRecordCreateInput {
        date: date(10),
        origin: Some("Madrid".to_string()),
        destination: Some("Valencia".to_string()),
        trainer_ids: (0..7).map(|i| format!("t{i}")).collect(),
    });
    assert!(oversized_party.is_err());

    let no_trainers = store.create_event(EventCreateInput {
        title: "orphan".to_string(),
        trainer_ids: Vec::new(),
        start_at: dt(10, 9, 0),
        end_at: dt(10, 11, 0),
        location: None,
        status: None,
    });
    assert!(no_trainers.is_err());
}

#[test]
fn total_block_with_inverted_times_is_accepted() {
    // Total blocks span the whole day; stored times are irrelevant.
    let (_guard, store, trainer) = setup();
    let block = store
        .create_blocked_period(BlockedPeriodCreateInput {
            trainer_id: trainer.id.clone(),
            date: date(10),
            start_time: time(11, 0),
            end_time: time(9, 0),
            kind: BlockKind::Total,
            reason: None,
        })
        .unwrap();
    assert_eq!(block.kind, BlockKind::Total);
    assert_eq!(block.reason, "");
}

#[test]
fn travel_records_filter_by_range_and_keep_party() {
    let (_guard, store, trainer) = setup();
    let second = store
        .create_trainer(TrainerCreateInput {
            name: "Luis Prado".to_string(),
            active: None,
        })
        .unwrap();

    store
        .create_travel_record(TravelRecordCreateInput {
            date: date(10),
            origin: Some("Madrid".to_string()),
            destination: Some("Valencia".to_string()),
            trainer_ids: vec![trainer.id.clone(), second.id.clone()],
        })
        .unwrap();
    store
        .create_travel_record(TravelRecordCreateInput {
            date: date(20),
            origin: Some("Valencia".to_string()),
            destination: Some("Madrid".to_string()),
            trainer_ids: vec![trainer.id.clone()],
        })
        .unwrap();

    let range = DateRange::new(date(9), date(12)).unwrap();
    let records = store
        .travel_records(&[trainer.id.clone()], &range)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trainer_ids.len(), 2);
    assert!(records[0].involves(&second.id));
}
