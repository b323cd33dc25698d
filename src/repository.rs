use async_trait::async_trait;
use log::{debug, warn};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::{Database, DbConnection};
use crate::error::ScheduleError;
use crate::paging::{page_offset, PagedResult};
use crate::schedules::{Schedule, ScheduleProperty, ScheduleStart};

/// Query/command access to stored schedules.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Looks a schedule up by its external key. A missing row is `Ok(None)`.
    async fn get_schedule(&self, schedule_key: Uuid) -> Result<Option<Schedule>, ScheduleError>;

    /// Returns page `page_index` (zero-based) of all schedules in insertion
    /// order, with the total row count. A page past the end is empty.
    async fn get_schedules(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<PagedResult<Schedule>, ScheduleError>;

    async fn exists(&self, schedule_key: Uuid) -> Result<bool, ScheduleError>;

    /// Stores `schedule` and returns its key, or `Ok(None)` without inserting
    /// when the key is already taken. `None` as input is an invalid argument.
    async fn add_schedule(&self, schedule: Option<Schedule>) -> Result<Option<Uuid>, ScheduleError>;
}

/// [`ScheduleRepository`] over the SQLite store. rusqlite is blocking, so
/// every call runs on tokio's blocking pool with its own pooled connection.
#[derive(Clone)]
pub struct SqliteScheduleRepository {
    db: Database,
}

impl SqliteScheduleRepository {
    pub fn new(db: Database) -> Self {
        SqliteScheduleRepository { db }
    }

    async fn with_connection<T, F>(&self, func: F) -> Result<T, ScheduleError>
    where
        F: FnOnce(&mut DbConnection) -> Result<T, ScheduleError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            func(&mut conn)
        })
        .await
        .map_err(|e| ScheduleError::Error(format!("Database task failed: {}", e)))?
    }

    pub async fn add_property(&self, property: ScheduleProperty) -> Result<(), ScheduleError> {
        property.validate()?;

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO schedule_properties (schedule_property_id, schedule_id, name, value)
                VALUES (?, ?, ?, ?)",
                params![
                    property.schedule_property_id.to_string(),
                    property.schedule_id,
                    property.name,
                    property.value,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn properties_for(
        &self,
        schedule_id: i64,
    ) -> Result<Vec<ScheduleProperty>, ScheduleError> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT schedule_property_id, schedule_id, name, value
                FROM schedule_properties
                WHERE schedule_id = ?
                ORDER BY name ASC",
            )?;
            let rows = stmt.query_map([schedule_id], ScheduleProperty::from_row)?;
            let properties = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(properties)
        })
        .await
    }

    pub async fn add_start(&self, start: ScheduleStart) -> Result<(), ScheduleError> {
        start.validate()?;

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO schedule_starts (
                    schedule_start_id, schedule_id, name, start, type,
                    duration_minutes, value_min, value_max
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    start.schedule_start_id.to_string(),
                    start.schedule_id,
                    start.name,
                    start.start,
                    start.start_type,
                    start.duration_minutes,
                    start.value_min,
                    start.value_max,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Starts of a schedule in chronological order. Offsets are normalized
    /// to UTC for the comparison, so the stored text order is not used.
    pub async fn starts_for(&self, schedule_id: i64) -> Result<Vec<ScheduleStart>, ScheduleError> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT schedule_start_id, schedule_id, name, start, type,
                    duration_minutes, value_min, value_max
                FROM schedule_starts
                WHERE schedule_id = ?
                ORDER BY julianday(start) ASC, schedule_start_id ASC",
            )?;
            let rows = stmt.query_map([schedule_id], ScheduleStart::from_row)?;
            let starts = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(starts)
        })
        .await
    }
}

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepository {
    async fn get_schedule(&self, schedule_key: Uuid) -> Result<Option<Schedule>, ScheduleError> {
        debug!("Attempting to get Schedule with ScheduleKey {}", schedule_key);

        let result = self
            .with_connection(move |conn| {
                let schedule = conn
                    .query_row(
                        &format!(
                            "SELECT {} FROM schedules WHERE schedule_key = ?",
                            Schedule::COLUMNS
                        ),
                        [schedule_key.to_string()],
                        Schedule::from_row,
                    )
                    .optional()?;
                Ok(schedule)
            })
            .await?;

        match &result {
            Some(schedule) => debug!(
                "Got Schedule for ScheduleKey {}. Id {}",
                schedule_key, schedule.schedule_id
            ),
            None => debug!("Unable to get a Schedule with ScheduleKey {}", schedule_key),
        }

        Ok(result)
    }

    async fn get_schedules(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<PagedResult<Schedule>, ScheduleError> {
        self.with_connection(move |conn| {
            // Count and slice from the same snapshot
            let tx = conn.transaction()?;

            let total_count: i64 =
                tx.query_row("SELECT count(*) FROM schedules", [], |row| row.get(0))?;

            let data = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {} FROM schedules ORDER BY schedule_id ASC LIMIT ? OFFSET ?",
                    Schedule::COLUMNS
                ))?;
                let rows = stmt.query_map(
                    params![i64::from(page_size), page_offset(page_index, page_size)],
                    Schedule::from_row,
                )?;
                rows.collect::<Result<Vec<_>, _>>()?
            };

            tx.commit()?;

            Ok(PagedResult::new(data, total_count, page_index, page_size))
        })
        .await
    }

    async fn exists(&self, schedule_key: Uuid) -> Result<bool, ScheduleError> {
        self.with_connection(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM schedules WHERE schedule_key = ?)",
                [schedule_key.to_string()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn add_schedule(
        &self,
        schedule: Option<Schedule>,
    ) -> Result<Option<Uuid>, ScheduleError> {
        let schedule = schedule
            .ok_or_else(|| ScheduleError::invalid_argument("schedule", "value was not provided"))?;
        schedule.validate()?;

        let schedule_key = schedule.schedule_key;

        // Existence check and insert are one statement, so two concurrent
        // inserts of the same key cannot both succeed or surface a constraint error
        let inserted_id: Option<i64> = self
            .with_connection(move |conn| {
                let id = conn
                    .query_row(
                        "INSERT INTO schedules (
                            schedule_key, name, default_min_value, default_max_value,
                            minimum_difference
                        ) VALUES (?, ?, ?, ?, ?)
                        ON CONFLICT (schedule_key) DO NOTHING
                        RETURNING schedule_id",
                        params![
                            schedule.schedule_key.to_string(),
                            schedule.name,
                            schedule.default_min_value,
                            schedule.default_max_value,
                            schedule.minimum_difference,
                        ],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(id)
            })
            .await?;

        match inserted_id {
            Some(schedule_id) => {
                debug!(
                    "Added Schedule with ScheduleKey {}. Id {}",
                    schedule_key, schedule_id
                );
                Ok(Some(schedule_key))
            }
            None => {
                warn!(
                    "Duplicate ScheduleKey attempted to be added {}",
                    schedule_key
                );
                Ok(None)
            }
        }
    }
}
