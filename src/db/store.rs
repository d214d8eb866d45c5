use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::db::repositories::block_repository::BlockRepository;
use crate::db::repositories::event_repository::EventRepository;
use crate::db::repositories::trainer_repository::TrainerRepository;
use crate::db::repositories::travel_repository::TravelRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::block::{BlockKind, BlockedPeriod, BlockedPeriodCreateInput};
use crate::models::event::{EventCreateInput, EventRecord, EventStatus};
use crate::models::range::DateRange;
use crate::models::trainer::{Trainer, TrainerCreateInput};
use crate::models::travel::{TravelRecord, TravelRecordCreateInput, MAX_TRAVEL_PARTY};
use crate::services::schedule_utils;

/// Read-only view of the scheduling data the engine computes over. The
/// engine issues only these four bulk queries; everything else it does is
/// in-memory. Implementations belong to the host application (this crate
/// ships a SQLite one).
pub trait AvailabilityStore {
    fn blocked_periods(
        &self,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> AppResult<Vec<BlockedPeriod>>;

    fn events(
        &self,
        trainer_ids: &[String],
        range: &DateRange,
        statuses: &[EventStatus],
    ) -> AppResult<Vec<EventRecord>>;

    fn travel_records(
        &self,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> AppResult<Vec<TravelRecord>>;

    fn trainers(&self, trainer_ids: &[String]) -> AppResult<Vec<Trainer>>;
}

/// SQLite-backed store. Reads implement [`AvailabilityStore`]; the write
/// helpers exist for host applications and tests and enforce the record
/// invariants the engine assumes.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn create_trainer(&self, input: TrainerCreateInput) -> AppResult<Trainer> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("trainer name must not be empty"));
        }
        let trainer = Trainer {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            active: input.active.unwrap_or(true),
        };
        self.pool
            .with_connection(|conn| TrainerRepository::insert(conn, &trainer))?;
        debug!(target: "app::db", trainer_id = %trainer.id, "trainer created");
        Ok(trainer)
    }

    pub fn create_blocked_period(
        &self,
        input: BlockedPeriodCreateInput,
    ) -> AppResult<BlockedPeriod> {
        if input.kind == BlockKind::Partial && input.end_time <= input.start_time {
            return Err(AppError::validation_with_details(
                "partial block end time must be after start time",
                json!({
                    "startTime": input.start_time.to_string(),
                    "endTime": input.end_time.to_string(),
                }),
            ));
        }
        let record = BlockedPeriod {
            id: Uuid::new_v4().to_string(),
            trainer_id: input.trainer_id,
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            kind: input.kind,
            reason: input.reason.unwrap_or_default(),
        };
        self.pool
            .with_connection(|conn| BlockRepository::insert(conn, &record))?;
        debug!(
            target: "app::db",
            trainer_id = %record.trainer_id,
            date = %record.date,
            kind = %record.kind,
            "blocked period created"
        );
        Ok(record)
    }

    pub fn create_event(&self, input: EventCreateInput) -> AppResult<EventRecord> {
        schedule_utils::ensure_window(input.start_at, input.end_at)?;
        if input.trainer_ids.is_empty() {
            return Err(AppError::validation("event needs at least one trainer"));
        }
        let record = EventRecord {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            trainer_ids: input.trainer_ids,
            start_at: input.start_at,
            end_at: input.end_at,
            location: input.location.unwrap_or_default(),
            status: input.status.unwrap_or(EventStatus::Pending),
        };
        self.pool
            .with_connection(|conn| EventRepository::insert(conn, &record))?;
        debug!(
            target: "app::db",
            event_id = %record.id,
            status = %record.status,
            "event created"
        );
        Ok(record)
    }

    pub fn set_event_status(&self, event_id: &str, status: EventStatus) -> AppResult<()> {
        self.pool
            .with_connection(|conn| EventRepository::update_status(conn, event_id, status))
    }

    pub fn create_travel_record(&self, input: TravelRecordCreateInput) -> AppResult<TravelRecord> {
        if input.trainer_ids.is_empty() {
            return Err(AppError::validation("travel record needs at least one trainer"));
        }
        if input.trainer_ids.len() > MAX_TRAVEL_PARTY {
            return Err(AppError::validation_with_details(
                "travel record exceeds maximum party size",
                json!({"trainers": input.trainer_ids.len(), "max": MAX_TRAVEL_PARTY}),
            ));
        }
        let record = TravelRecord {
            id: Uuid::new_v4().to_string(),
            date: input.date,
            origin: input.origin.unwrap_or_default(),
            destination: input.destination.unwrap_or_default(),
            trainer_ids: input.trainer_ids,
        };
        self.pool
            .with_connection(|conn| TravelRepository::insert(conn, &record))?;
        debug!(
            target: "app::db",
            travel_record_id = %record.id,
            date = %record.date,
            "travel record created"
        );
        Ok(record)
    }
}

impl AvailabilityStore for SqliteStore {
    fn blocked_periods(
        &self,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> AppResult<Vec<BlockedPeriod>> {
        self.pool.with_connection(|conn| {
            BlockRepository::list_for_trainers_in_range(conn, trainer_ids, range)
        })
    }

    fn events(
        &self,
        trainer_ids: &[String],
        range: &DateRange,
        statuses: &[EventStatus],
    ) -> AppResult<Vec<EventRecord>> {
        let (window_start, _) = schedule_utils::day_bounds(range.start);
        let (_, window_end) = schedule_utils::day_bounds(range.end);
        self.pool.with_connection(|conn| {
            EventRepository::list_for_trainers_in_window(
                conn,
                trainer_ids,
                window_start,
                window_end,
                statuses,
            )
        })
    }

    fn travel_records(
        &self,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> AppResult<Vec<TravelRecord>> {
        self.pool.with_connection(|conn| {
            TravelRepository::list_for_trainers_in_range(conn, trainer_ids, range)
        })
    }

    fn trainers(&self, trainer_ids: &[String]) -> AppResult<Vec<Trainer>> {
        self.pool
            .with_connection(|conn| TrainerRepository::list_by_ids(conn, trainer_ids))
    }
}
