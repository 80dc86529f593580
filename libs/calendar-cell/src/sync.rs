use async_trait::async_trait;
use uuid::Uuid;

use crate::models::CalendarEventRef;

/// External calendar-provider contract. The implementation owns credentials,
/// the provider API and persisting the returned event id back onto the
/// appointment.
#[async_trait]
pub trait CalendarSync: Send + Sync {
    async fn execute(&self, appointment_id: Uuid) -> anyhow::Result<CalendarEventRef>;
}
