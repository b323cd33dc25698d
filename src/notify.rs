use async_trait::async_trait;
use log::debug;

use crate::error::ScheduleError;

/// Outbound notification channel (for example a message bus) that the
/// service can announce changes on.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), ScheduleError>;
}

/// Publisher that only records what would have been sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), ScheduleError> {
        debug!("Publish to '{}' ({} bytes)", topic, payload.len());
        Ok(())
    }
}
