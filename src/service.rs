use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::notify::Publisher;
use crate::paging::PagedResult;
use crate::repository::ScheduleRepository;
use crate::schedules::Schedule;

/// Read operations exposed to the HTTP layer.
#[async_trait]
pub trait ScheduleService: Send + Sync {
    async fn get_schedule(&self, schedule_key: Uuid) -> Result<Option<Schedule>, ScheduleError>;

    /// `Ok(None)` is tolerated by callers and treated as an empty page.
    async fn get_schedules(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<Option<PagedResult<Schedule>>, ScheduleError>;
}

/// Pass-through over a [`ScheduleRepository`] that logs every call.
pub struct DefaultScheduleService {
    repository: Arc<dyn ScheduleRepository>,
    // Held for write paths; no read operation publishes
    #[allow(dead_code)]
    publisher: Arc<dyn Publisher>,
}

impl DefaultScheduleService {
    pub fn new(repository: Arc<dyn ScheduleRepository>, publisher: Arc<dyn Publisher>) -> Self {
        DefaultScheduleService {
            repository,
            publisher,
        }
    }
}

#[async_trait]
impl ScheduleService for DefaultScheduleService {
    async fn get_schedule(&self, schedule_key: Uuid) -> Result<Option<Schedule>, ScheduleError> {
        debug!("Getting schedule {}", schedule_key);

        let schedule = self.repository.get_schedule(schedule_key).await?;

        match &schedule {
            Some(s) => debug!("Found schedule {} ('{}')", schedule_key, s.name),
            None => info!("No schedule with key {}", schedule_key),
        }

        Ok(schedule)
    }

    async fn get_schedules(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<Option<PagedResult<Schedule>>, ScheduleError> {
        debug!(
            "Getting schedules page {} (page size {})",
            page_index, page_size
        );

        let page = self.repository.get_schedules(page_index, page_size).await?;

        debug!(
            "Returning {} of {} schedules for page {}",
            page.data.len(),
            page.total_count,
            page_index
        );

        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogPublisher;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRepository {
        schedules: Vec<Schedule>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ScheduleRepository for RecordingRepository {
        async fn get_schedule(
            &self,
            schedule_key: Uuid,
        ) -> Result<Option<Schedule>, ScheduleError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("get_schedule {}", schedule_key));
            Ok(self
                .schedules
                .iter()
                .find(|s| s.schedule_key == schedule_key)
                .cloned())
        }

        async fn get_schedules(
            &self,
            page_index: u32,
            page_size: u32,
        ) -> Result<PagedResult<Schedule>, ScheduleError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("get_schedules {} {}", page_index, page_size));
            let data = self
                .schedules
                .iter()
                .skip((page_index * page_size) as usize)
                .take(page_size as usize)
                .cloned()
                .collect();
            Ok(PagedResult::new(
                data,
                self.schedules.len() as i64,
                page_index,
                page_size,
            ))
        }

        async fn exists(&self, schedule_key: Uuid) -> Result<bool, ScheduleError> {
            Ok(self.schedules.iter().any(|s| s.schedule_key == schedule_key))
        }

        async fn add_schedule(
            &self,
            _schedule: Option<Schedule>,
        ) -> Result<Option<Uuid>, ScheduleError> {
            Err(ScheduleError::Error("read-only fake".to_string()))
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl ScheduleRepository for FailingRepository {
        async fn get_schedule(&self, _: Uuid) -> Result<Option<Schedule>, ScheduleError> {
            Err(ScheduleError::Error("store unavailable".to_string()))
        }

        async fn get_schedules(
            &self,
            _: u32,
            _: u32,
        ) -> Result<PagedResult<Schedule>, ScheduleError> {
            Err(ScheduleError::Error("store unavailable".to_string()))
        }

        async fn exists(&self, _: Uuid) -> Result<bool, ScheduleError> {
            Err(ScheduleError::Error("store unavailable".to_string()))
        }

        async fn add_schedule(
            &self,
            _: Option<Schedule>,
        ) -> Result<Option<Uuid>, ScheduleError> {
            Err(ScheduleError::Error("store unavailable".to_string()))
        }
    }

    fn service_over(repository: Arc<RecordingRepository>) -> DefaultScheduleService {
        DefaultScheduleService::new(repository, Arc::new(LogPublisher))
    }

    fn numbered(count: usize) -> Vec<Schedule> {
        (0..count)
            .map(|i| {
                let mut s =
                    Schedule::new(Uuid::new_v4(), format!("Test Name {}", i), 1.0, None, 0.0);
                s.schedule_id = i as i64 + 1;
                s
            })
            .collect()
    }

    #[tokio::test]
    async fn test_get_schedule_delegates_to_repository() {
        let schedules = numbered(3);
        let wanted = schedules[1].clone();
        let repository = Arc::new(RecordingRepository {
            schedules,
            ..Default::default()
        });
        let service = service_over(Arc::clone(&repository));

        let found = service.get_schedule(wanted.schedule_key).await.unwrap();
        assert_eq!(found, Some(wanted.clone()));

        let missing = service.get_schedule(Uuid::new_v4()).await.unwrap();
        assert_eq!(missing, None);

        let calls = repository.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], format!("get_schedule {}", wanted.schedule_key));
    }

    #[tokio::test]
    async fn test_get_schedules_passes_page_through_unchanged() {
        let repository = Arc::new(RecordingRepository {
            schedules: numbered(100),
            ..Default::default()
        });
        let service = service_over(Arc::clone(&repository));

        let page = service.get_schedules(3, 15).await.unwrap().unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 15);
        assert_eq!(page.total_count, 100);
        assert_eq!(page.data.first().map(|s| s.name.as_str()), Some("Test Name 45"));
        assert_eq!(page.data.len(), 15);

        assert_eq!(
            repository.calls.lock().unwrap().as_slice(),
            ["get_schedules 3 15".to_string()]
        );
    }

    #[tokio::test]
    async fn test_repository_errors_propagate() {
        let service =
            DefaultScheduleService::new(Arc::new(FailingRepository), Arc::new(LogPublisher));

        assert!(service.get_schedule(Uuid::new_v4()).await.is_err());
        assert!(service.get_schedules(0, 10).await.is_err());
    }
}
