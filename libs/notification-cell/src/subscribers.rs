// libs/notification-cell/src/subscribers.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use appointment_cell::events::{
    AppointmentEvent, AppointmentEventHandler, AppointmentEventKind,
};
use shared_models::professional::ProfessionalRepository;

use crate::models::{NotificationRequest, ReminderType};
use crate::sender::NotificationSender;

/// Builds notification payloads off appointment transitions. Register it for
/// every event kind it should react to; the client is always notified, the
/// professional only when their settings have any channel enabled.
pub struct AppointmentNotificationHandler {
    sender: Arc<dyn NotificationSender>,
    professionals: Arc<dyn ProfessionalRepository>,
}

impl AppointmentNotificationHandler {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        professionals: Arc<dyn ProfessionalRepository>,
    ) -> Self {
        Self {
            sender,
            professionals,
        }
    }

    fn payload_for(event: &AppointmentEvent) -> (ReminderType, String, String) {
        let when = event.starts_at.format("%Y-%m-%d %H:%M UTC");
        match event.kind {
            AppointmentEventKind::Scheduled => (
                ReminderType::AppointmentScheduled,
                "Appointment scheduled".to_string(),
                format!("Your appointment was scheduled for {}.", when),
            ),
            AppointmentEventKind::Confirmed => (
                ReminderType::AppointmentConfirmed,
                "Appointment confirmed".to_string(),
                format!("Your appointment on {} is confirmed.", when),
            ),
            AppointmentEventKind::Cancelled => (
                ReminderType::AppointmentCancelled,
                "Appointment cancelled".to_string(),
                format!("Your appointment on {} was cancelled.", when),
            ),
        }
    }
}

#[async_trait]
impl AppointmentEventHandler for AppointmentNotificationHandler {
    fn name(&self) -> &str {
        "appointment-notifications"
    }

    async fn handle(&self, event: &AppointmentEvent) -> anyhow::Result<()> {
        let (reminder_type, title, content) = Self::payload_for(event);

        self.sender
            .execute(NotificationRequest {
                recipient_id: event.client_id,
                title: title.clone(),
                content: content.clone(),
                reminder_type,
            })
            .await?;

        let notify_professional = self
            .professionals
            .find_by_id(event.professional_id)
            .await?
            .map(|professional| professional.notification_settings.any_enabled())
            .unwrap_or(false);

        if notify_professional {
            self.sender
                .execute(NotificationRequest {
                    recipient_id: event.professional_id,
                    title,
                    content,
                    reminder_type,
                })
                .await?;
        } else {
            debug!(
                "Professional {} has notifications disabled, client-only delivery",
                event.professional_id
            );
        }

        Ok(())
    }
}
