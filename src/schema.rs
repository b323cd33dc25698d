pub const SCHEMA_VERSION: &str = "1";

pub const CREATE_SCHEMA_SQL: &str = r#"
BEGIN TRANSACTION;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', '1');

-- schedule_id is the internal surrogate; schedule_key is the only externally visible key
CREATE TABLE IF NOT EXISTS schedules (
    schedule_id INTEGER PRIMARY KEY AUTOINCREMENT,
    schedule_key TEXT NOT NULL,
    name TEXT NOT NULL CHECK (length(name) <= 255),
    default_min_value REAL NOT NULL,
    default_max_value REAL,
    minimum_difference REAL NOT NULL CHECK (minimum_difference >= 0)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_schedules_key ON schedules (schedule_key);

CREATE TABLE IF NOT EXISTS schedule_properties (
    schedule_property_id TEXT PRIMARY KEY,
    schedule_id INTEGER NOT NULL,
    name TEXT NOT NULL CHECK (length(name) <= 512),
    value TEXT NOT NULL CHECK (length(value) <= 1024),
    FOREIGN KEY (schedule_id) REFERENCES schedules(schedule_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_schedule_properties_name ON schedule_properties (name);
CREATE UNIQUE INDEX IF NOT EXISTS idx_schedule_properties_schedule_name
    ON schedule_properties (schedule_id, name);

CREATE TABLE IF NOT EXISTS schedule_starts (
    schedule_start_id TEXT PRIMARY KEY,
    schedule_id INTEGER NOT NULL,
    name TEXT NOT NULL CHECK (length(name) <= 255),
    start TEXT NOT NULL,                -- ISO 8601 text with offset
    type INTEGER NOT NULL,
    duration_minutes INTEGER,
    value_min REAL NOT NULL,
    value_max REAL,
    FOREIGN KEY (schedule_id) REFERENCES schedules(schedule_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_schedule_starts_schedule ON schedule_starts (schedule_id);
CREATE INDEX IF NOT EXISTS idx_schedule_starts_start_type ON schedule_starts (start, type);

COMMIT;
"#;
