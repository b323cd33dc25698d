use chrono::{DateTime, FixedOffset};
use rusqlite::Row;
use uuid::Uuid;

use crate::error::ScheduleError;

pub const NAME_MAX_LEN: usize = 255;
pub const PROPERTY_NAME_MAX_LEN: usize = 512;
pub const PROPERTY_VALUE_MAX_LEN: usize = 1024;
pub const START_NAME_MAX_LEN: usize = 255;

/// A named value range. `schedule_id` is assigned by the store on insert and
/// is never used as a lookup key outside of it; clients address a schedule
/// by `schedule_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub schedule_id: i64,
    pub schedule_key: Uuid,
    pub name: String,
    pub default_min_value: f64,
    pub default_max_value: Option<f64>,
    pub minimum_difference: f64,
}

impl Schedule {
    /// Builds a schedule that has not been stored yet (`schedule_id` of 0).
    pub fn new(
        schedule_key: Uuid,
        name: impl Into<String>,
        default_min_value: f64,
        default_max_value: Option<f64>,
        minimum_difference: f64,
    ) -> Self {
        Schedule {
            schedule_id: 0,
            schedule_key,
            name: name.into(),
            default_min_value,
            default_max_value,
            minimum_difference,
        }
    }

    /// Checks the fields the store would otherwise reject.
    ///
    /// `default_max_value - default_min_value >= minimum_difference` is
    /// not checked here.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.name.is_empty() {
            return Err(ScheduleError::invalid_argument("name", "name is required"));
        }
        if self.name.chars().count() > NAME_MAX_LEN {
            return Err(ScheduleError::invalid_argument(
                "name",
                format!("name must be at most {} characters", NAME_MAX_LEN),
            ));
        }
        if !self.default_min_value.is_finite() {
            return Err(ScheduleError::invalid_argument(
                "default_min_value",
                "default_min_value must be a finite number",
            ));
        }
        if let Some(max) = self.default_max_value {
            if !max.is_finite() {
                return Err(ScheduleError::invalid_argument(
                    "default_max_value",
                    "default_max_value must be a finite number",
                ));
            }
        }
        if !self.minimum_difference.is_finite() || self.minimum_difference < 0.0 {
            return Err(ScheduleError::invalid_argument(
                "minimum_difference",
                "minimum_difference must be a finite, non-negative number",
            ));
        }
        Ok(())
    }

    pub(crate) const COLUMNS: &'static str =
        "schedule_id, schedule_key, name, default_min_value, default_max_value, minimum_difference";

    /// Maps a row selected with [`Schedule::COLUMNS`].
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Schedule {
            schedule_id: row.get(0)?,
            schedule_key: uuid_column(row, 1)?,
            name: row.get(2)?,
            default_min_value: row.get(3)?,
            default_max_value: row.get(4)?,
            minimum_difference: row.get(5)?,
        })
    }
}

/// A named string attribute attached to a schedule. At most one property of a
/// given name exists per schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleProperty {
    pub schedule_property_id: Uuid,
    pub schedule_id: i64,
    pub name: String,
    pub value: String,
}

impl ScheduleProperty {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.name.is_empty() || self.name.chars().count() > PROPERTY_NAME_MAX_LEN {
            return Err(ScheduleError::invalid_argument(
                "name",
                format!("name must be 1 to {} characters", PROPERTY_NAME_MAX_LEN),
            ));
        }
        if self.value.chars().count() > PROPERTY_VALUE_MAX_LEN {
            return Err(ScheduleError::invalid_argument(
                "value",
                format!("value must be at most {} characters", PROPERTY_VALUE_MAX_LEN),
            ));
        }
        Ok(())
    }

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ScheduleProperty {
            schedule_property_id: uuid_column(row, 0)?,
            schedule_id: row.get(1)?,
            name: row.get(2)?,
            value: row.get(3)?,
        })
    }
}

/// A dated activation of a value range. `start_type` is stored as an opaque
/// integer tag; nothing in this crate interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleStart {
    pub schedule_start_id: Uuid,
    pub schedule_id: i64,
    pub name: String,
    pub start: DateTime<FixedOffset>,
    pub start_type: i32,
    pub duration_minutes: Option<i32>,
    pub value_min: f64,
    pub value_max: Option<f64>,
}

impl ScheduleStart {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.name.is_empty() || self.name.chars().count() > START_NAME_MAX_LEN {
            return Err(ScheduleError::invalid_argument(
                "name",
                format!("name must be 1 to {} characters", START_NAME_MAX_LEN),
            ));
        }
        Ok(())
    }

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ScheduleStart {
            schedule_start_id: uuid_column(row, 0)?,
            schedule_id: row.get(1)?,
            name: row.get(2)?,
            start: row.get(3)?,
            start_type: row.get(4)?,
            duration_minutes: row.get(5)?,
            value_min: row.get(6)?,
            value_max: row.get(7)?,
        })
    }
}

// Keys are stored as hyphenated TEXT
fn uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
