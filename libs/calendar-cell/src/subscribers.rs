// libs/calendar-cell/src/subscribers.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use appointment_cell::events::{AppointmentEvent, AppointmentEventHandler};

use crate::sync::CalendarSync;

/// Reacts to the Scheduled event: appointments whose sync flag is set are
/// pushed to the external calendar provider. Best-effort by design; a sync
/// failure is logged by the dispatcher and never rolls back the booking.
pub struct CalendarSyncHandler {
    sync: Arc<dyn CalendarSync>,
}

impl CalendarSyncHandler {
    pub fn new(sync: Arc<dyn CalendarSync>) -> Self {
        Self { sync }
    }
}

#[async_trait]
impl AppointmentEventHandler for CalendarSyncHandler {
    fn name(&self) -> &str {
        "google-calendar-sync"
    }

    async fn handle(&self, event: &AppointmentEvent) -> anyhow::Result<()> {
        if !event.sync_with_google_calendar {
            debug!(
                "Appointment {} is not flagged for calendar sync, skipping",
                event.appointment_id
            );
            return Ok(());
        }

        let event_ref = self.sync.execute(event.appointment_id).await?;
        info!(
            "Appointment {} synced to calendar event {}",
            event.appointment_id, event_ref.event_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use appointment_cell::events::AppointmentEventKind;

    use crate::models::CalendarEventRef;

    #[derive(Default)]
    struct RecordingSync {
        calls: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl CalendarSync for RecordingSync {
        async fn execute(&self, appointment_id: Uuid) -> anyhow::Result<CalendarEventRef> {
            self.calls.lock().unwrap().push(appointment_id);
            Ok(CalendarEventRef {
                event_id: "evt_123".to_string(),
                event_link: "https://calendar.example.com/evt_123".to_string(),
            })
        }
    }

    fn scheduled_event(sync_flag: bool) -> AppointmentEvent {
        let start = Utc::now() + Duration::days(1);
        AppointmentEvent {
            kind: AppointmentEventKind::Scheduled,
            appointment_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            starts_at: start,
            ends_at: start + Duration::minutes(60),
            sync_with_google_calendar: sync_flag,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn flagged_appointments_are_pushed_to_the_provider() {
        let sync = Arc::new(RecordingSync::default());
        let handler = CalendarSyncHandler::new(sync.clone());
        let event = scheduled_event(true);

        handler.handle(&event).await.unwrap();

        assert_eq!(*sync.calls.lock().unwrap(), vec![event.appointment_id]);
    }

    #[tokio::test]
    async fn unflagged_appointments_are_skipped() {
        let sync = Arc::new(RecordingSync::default());
        let handler = CalendarSyncHandler::new(sync.clone());

        handler.handle(&scheduled_event(false)).await.unwrap();

        assert!(sync.calls.lock().unwrap().is_empty());
    }
}
