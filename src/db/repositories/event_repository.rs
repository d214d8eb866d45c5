use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{named_params, params_from_iter, Connection, Row};

use crate::db::repositories::{format_datetime, parse_datetime, sql_placeholders};
use crate::error::{AppError, AppResult};
use crate::models::event::{EventRecord, EventStatus};

#[derive(Debug, Clone)]
pub struct EventRow {
    pub id: String,
    pub title: String,
    pub start_at: String,
    pub end_at: String,
    pub location: String,
    pub status: String,
}

impl EventRow {
    pub fn into_record(self, trainer_ids: Vec<String>) -> AppResult<EventRecord> {
        Ok(EventRecord {
            id: self.id,
            title: self.title,
            trainer_ids,
            start_at: parse_datetime(&self.start_at)?,
            end_at: parse_datetime(&self.end_at)?,
            location: self.location,
            status: EventStatus::try_from(self.status.as_str()).map_err(AppError::validation)?,
        })
    }
}

impl TryFrom<&Row<'_>> for EventRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            start_at: row.get("start_at")?,
            end_at: row.get("end_at")?,
            location: row.get("location")?,
            status: row.get("status")?,
        })
    }
}

pub struct EventRepository;

impl EventRepository {
    pub fn insert(conn: &Connection, record: &EventRecord) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO events (id, title, start_at, end_at, location, status)
                VALUES (:id, :title, :start_at, :end_at, :location, :status)
            "#,
            named_params! {
                ":id": &record.id,
                ":title": &record.title,
                ":start_at": format_datetime(record.start_at),
                ":end_at": format_datetime(record.end_at),
                ":location": &record.location,
                ":status": record.status.as_str(),
            },
        )?;

        for trainer_id in &record.trainer_ids {
            conn.execute(
                r#"
                    INSERT INTO event_trainers (event_id, trainer_id)
                    VALUES (:event_id, :trainer_id)
                "#,
                named_params! {
                    ":event_id": &record.id,
                    ":trainer_id": trainer_id,
                },
            )?;
        }

        Ok(())
    }

    pub fn update_status(conn: &Connection, event_id: &str, status: EventStatus) -> AppResult<()> {
        let changed = conn.execute(
            "UPDATE events SET status = :status WHERE id = :id",
            named_params! {":status": status.as_str(), ":id": event_id},
        )?;
        if changed == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    /// Events of the given trainers and statuses whose `[start, end)` window
    /// intersects `[window_start, window_end)`, ordered by start. Trainer
    /// sets are attached from the join table in a single second query.
    pub fn list_for_trainers_in_window(
        conn: &Connection,
        trainer_ids: &[String],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        statuses: &[EventStatus],
    ) -> AppResult<Vec<EventRecord>> {
        if trainer_ids.is_empty() || statuses.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
                SELECT DISTINCT e.id, e.title, e.start_at, e.end_at, e.location, e.status
                FROM events e
                JOIN event_trainers et ON et.event_id = e.id
                WHERE et.trainer_id IN ({})
                  AND e.status IN ({})
                  AND e.start_at < ?
                  AND e.end_at > ?
                ORDER BY e.start_at, e.id
            "#,
            sql_placeholders(trainer_ids.len()),
            sql_placeholders(statuses.len()),
        );

        let mut params: Vec<String> = trainer_ids.to_vec();
        params.extend(statuses.iter().map(|status| status.as_str().to_string()));
        params.push(format_datetime(window_end));
        params.push(format_datetime(window_start));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                EventRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let event_ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let mut trainers_by_event = Self::trainers_for_events(conn, &event_ids)?;

        rows.into_iter()
            .map(|row| {
                let trainers = trainers_by_event.remove(&row.id).unwrap_or_default();
                row.into_record(trainers)
            })
            .collect()
    }

    fn trainers_for_events(
        conn: &Connection,
        event_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<String>>> {
        let sql = format!(
            r#"
                SELECT event_id, trainer_id
                FROM event_trainers
                WHERE event_id IN ({})
                ORDER BY trainer_id
            "#,
            sql_placeholders(event_ids.len())
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        let pairs = stmt
            .query_map(params_from_iter(event_ids.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for (event_id, trainer_id) in pairs {
            map.entry(event_id).or_default().push(trainer_id);
        }

        Ok(map)
    }
}
