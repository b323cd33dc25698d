use std::sync::Arc;

use crate::database::Database;
use crate::service::ScheduleService;

/// Shared application state passed to all Axum handlers via `.with_state()`.
#[derive(Clone)]
pub struct AppState {
    pub schedules: Arc<dyn ScheduleService>,
    pub database: Database,
}

impl AppState {
    pub fn new(schedules: Arc<dyn ScheduleService>, database: Database) -> Self {
        Self {
            schedules,
            database,
        }
    }
}
