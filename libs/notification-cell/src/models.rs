use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    AppointmentScheduled,
    AppointmentConfirmed,
    AppointmentCancelled,
}

/// Payload handed to the external delivery transport. This cell only builds
/// it; email/WhatsApp sending happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient_id: Uuid,
    pub title: String,
    pub content: String,
    pub reminder_type: ReminderType,
}
