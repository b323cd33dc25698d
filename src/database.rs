use log::{debug, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OptionalExtension;
use std::path::Path;
use std::time::Duration;

use crate::error::ScheduleError;
use crate::schema::{CREATE_SCHEMA_SQL, SCHEMA_VERSION};

pub const DB_FILENAME: &str = "schedules.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Handle to the schedule store. Cloning is cheap; all clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens (creating if needed) the SQLite file at `db_path` and makes sure
    /// the schema is present and at the expected version.
    pub fn new(
        db_path: &Path,
        pool_size: u32,
        connection_timeout: Duration,
    ) -> Result<Self, ScheduleError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // foreign_keys is per-connection in SQLite, so every pooled handle needs it
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(connection_timeout)
            .build(manager)?;

        let db = Database { pool };
        db.ensure_schema()?;

        info!("Database opened at: {}", db_path.display());

        Ok(db)
    }

    pub fn get_connection(&self) -> Result<DbConnection, ScheduleError> {
        self.pool.get().map_err(ScheduleError::PoolError)
    }

    /// Trivial round trip used by the health endpoint.
    pub fn ping(&self) -> Result<(), ScheduleError> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<Option<String>, ScheduleError> {
        let conn = self.get_connection()?;
        let version = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    fn ensure_schema(&self) -> Result<(), ScheduleError> {
        let conn = self.get_connection()?;

        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            debug!("Creating schema version {}", SCHEMA_VERSION);
            conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(ScheduleError::Error(format!(
                "Schema version mismatch: database is at '{}', expected '{}'",
                other, SCHEMA_VERSION
            ))),
            None => Err(ScheduleError::Error("Schema version missing".to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// A database in a throwaway directory. Keep the `TempDir` alive for as
    /// long as the database is in use.
    pub fn temp_database() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(&dir.path().join(DB_FILENAME), 4, Duration::from_secs(5)).unwrap();
        (dir, db)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_database;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_schema() {
        let (_dir, db) = temp_database();
        assert_eq!(db.schema_version().unwrap().as_deref(), Some(SCHEMA_VERSION));

        let conn = db.get_connection().unwrap();
        for table in ["schedules", "schedule_properties", "schedule_starts"] {
            let count: i32 = conn
                .query_row(
                    "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_reopen_existing_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DB_FILENAME);

        let db = Database::new(&path, 2, Duration::from_secs(5)).unwrap();
        drop(db);

        let db = Database::new(&path, 2, Duration::from_secs(5)).unwrap();
        assert!(db.ping().is_ok());
    }

    #[test]
    fn test_schema_version_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DB_FILENAME);

        let db = Database::new(&path, 2, Duration::from_secs(5)).unwrap();
        db.get_connection()
            .unwrap()
            .execute(
                "UPDATE meta SET value = '999' WHERE key = 'schema_version'",
                [],
            )
            .unwrap();
        drop(db);

        match Database::new(&path, 2, Duration::from_secs(5)) {
            Err(err) => assert!(err.to_string().contains("Schema version mismatch")),
            Ok(_) => panic!("mismatched schema version should be rejected"),
        }
    }

    #[test]
    fn test_foreign_keys_enabled_on_every_connection() {
        let (_dir, db) = temp_database();
        let first = db.get_connection().unwrap();
        let second = db.get_connection().unwrap();
        for conn in [&first, &second] {
            let enabled: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(enabled, 1);
        }
    }
}
