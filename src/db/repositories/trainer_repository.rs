use rusqlite::{named_params, params_from_iter, Connection, Row};

use crate::db::repositories::sql_placeholders;
use crate::error::AppResult;
use crate::models::trainer::Trainer;

#[derive(Debug, Clone)]
pub struct TrainerRow {
    pub id: String,
    pub name: String,
    pub active: i64,
}

impl TrainerRow {
    pub fn into_record(self) -> Trainer {
        Trainer {
            id: self.id,
            name: self.name,
            active: self.active != 0,
        }
    }
}

impl TryFrom<&Row<'_>> for TrainerRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            active: row.get("active")?,
        })
    }
}

pub struct TrainerRepository;

impl TrainerRepository {
    pub fn insert(conn: &Connection, trainer: &Trainer) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO trainers (id, name, active)
                VALUES (:id, :name, :active)
            "#,
            named_params! {
                ":id": &trainer.id,
                ":name": &trainer.name,
                ":active": trainer.active as i64,
            },
        )?;
        Ok(())
    }

    pub fn list_by_ids(conn: &Connection, ids: &[String]) -> AppResult<Vec<Trainer>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name, active FROM trainers WHERE id IN ({}) ORDER BY id",
            sql_placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                TrainerRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().map(TrainerRow::into_record).collect())
    }
}
