use std::collections::HashMap;

use rusqlite::{named_params, params_from_iter, Connection, Row};

use crate::db::repositories::{format_date, parse_date, sql_placeholders};
use crate::error::AppResult;
use crate::models::range::DateRange;
use crate::models::travel::TravelRecord;

#[derive(Debug, Clone)]
pub struct TravelRow {
    pub id: String,
    pub date: String,
    pub origin: String,
    pub destination: String,
}

impl TravelRow {
    pub fn into_record(self, trainer_ids: Vec<String>) -> AppResult<TravelRecord> {
        Ok(TravelRecord {
            id: self.id,
            date: parse_date(&self.date)?,
            origin: self.origin,
            destination: self.destination,
            trainer_ids,
        })
    }
}

impl TryFrom<&Row<'_>> for TravelRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            origin: row.get("origin")?,
            destination: row.get("destination")?,
        })
    }
}

pub struct TravelRepository;

impl TravelRepository {
    pub fn insert(conn: &Connection, record: &TravelRecord) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO travel_records (id, date, origin, destination)
                VALUES (:id, :date, :origin, :destination)
            "#,
            named_params! {
                ":id": &record.id,
                ":date": format_date(record.date),
                ":origin": &record.origin,
                ":destination": &record.destination,
            },
        )?;

        for trainer_id in &record.trainer_ids {
            conn.execute(
                r#"
                    INSERT INTO travel_record_trainers (travel_record_id, trainer_id)
                    VALUES (:travel_record_id, :trainer_id)
                "#,
                named_params! {
                    ":travel_record_id": &record.id,
                    ":trainer_id": trainer_id,
                },
            )?;
        }

        Ok(())
    }

    pub fn list_for_trainers_in_range(
        conn: &Connection,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> AppResult<Vec<TravelRecord>> {
        if trainer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
                SELECT DISTINCT t.id, t.date, t.origin, t.destination
                FROM travel_records t
                JOIN travel_record_trainers tt ON tt.travel_record_id = t.id
                WHERE tt.trainer_id IN ({})
                  AND t.date >= ?
                  AND t.date <= ?
                ORDER BY t.date, t.id
            "#,
            sql_placeholders(trainer_ids.len())
        );

        let mut params: Vec<String> = trainer_ids.to_vec();
        params.push(format_date(range.start));
        params.push(format_date(range.end));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                TravelRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let record_ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let mut trainers_by_record = Self::trainers_for_records(conn, &record_ids)?;

        rows.into_iter()
            .map(|row| {
                let trainers = trainers_by_record.remove(&row.id).unwrap_or_default();
                row.into_record(trainers)
            })
            .collect()
    }

    fn trainers_for_records(
        conn: &Connection,
        record_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<String>>> {
        let sql = format!(
            r#"
                SELECT travel_record_id, trainer_id
                FROM travel_record_trainers
                WHERE travel_record_id IN ({})
                ORDER BY trainer_id
            "#,
            sql_placeholders(record_ids.len())
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        let pairs = stmt
            .query_map(params_from_iter(record_ids.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for (record_id, trainer_id) in pairs {
            map.entry(record_id).or_default().push(trainer_id);
        }

        Ok(map)
    }
}
