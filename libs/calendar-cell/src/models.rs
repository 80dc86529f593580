use serde::{Deserialize, Serialize};

/// Reference to the provider-side calendar event backing an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventRef {
    pub event_id: String,
    pub event_link: String,
}
