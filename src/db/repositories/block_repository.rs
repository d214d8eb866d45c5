use rusqlite::{named_params, params_from_iter, Connection, Row};

use crate::db::repositories::{
    format_date, format_time, parse_date, parse_time, sql_placeholders,
};
use crate::error::AppResult;
use crate::models::block::{BlockKind, BlockedPeriod};
use crate::models::range::DateRange;

#[derive(Debug, Clone)]
pub struct BlockRow {
    pub id: String,
    pub trainer_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub kind: String,
    pub reason: String,
}

impl BlockRow {
    pub fn from_record(record: &BlockedPeriod) -> Self {
        Self {
            id: record.id.clone(),
            trainer_id: record.trainer_id.clone(),
            date: format_date(record.date),
            start_time: format_time(record.start_time),
            end_time: format_time(record.end_time),
            kind: record.kind.as_str().to_string(),
            reason: record.reason.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<BlockedPeriod> {
        Ok(BlockedPeriod {
            id: self.id,
            trainer_id: self.trainer_id,
            date: parse_date(&self.date)?,
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
            kind: BlockKind::try_from(self.kind.as_str())
                .map_err(crate::error::AppError::validation)?,
            reason: self.reason,
        })
    }
}

impl TryFrom<&Row<'_>> for BlockRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            trainer_id: row.get("trainer_id")?,
            date: row.get("date")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            kind: row.get("kind")?,
            reason: row.get("reason")?,
        })
    }
}

pub struct BlockRepository;

impl BlockRepository {
    pub fn insert(conn: &Connection, record: &BlockedPeriod) -> AppResult<()> {
        let row = BlockRow::from_record(record);
        conn.execute(
            r#"
                INSERT INTO blocked_periods (
                    id, trainer_id, date, start_time, end_time, kind, reason
                ) VALUES (
                    :id, :trainer_id, :date, :start_time, :end_time, :kind, :reason
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":trainer_id": &row.trainer_id,
                ":date": &row.date,
                ":start_time": &row.start_time,
                ":end_time": &row.end_time,
                ":kind": &row.kind,
                ":reason": &row.reason,
            },
        )?;
        Ok(())
    }

    /// All blocks of the given trainers whose date falls inside `range`,
    /// ordered by date then start time.
    pub fn list_for_trainers_in_range(
        conn: &Connection,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> AppResult<Vec<BlockedPeriod>> {
        if trainer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
                SELECT id, trainer_id, date, start_time, end_time, kind, reason
                FROM blocked_periods
                WHERE trainer_id IN ({}) AND date >= ? AND date <= ?
                ORDER BY date, start_time
            "#,
            sql_placeholders(trainer_ids.len())
        );

        let mut params: Vec<String> = trainer_ids.to_vec();
        params.push(format_date(range.start));
        params.push(format_date(range.end));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                BlockRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(BlockRow::into_record).collect()
    }
}
