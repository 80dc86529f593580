// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::SchedulingError;
use crate::repository::AppointmentRepository;

/// Open-interval overlap: touching endpoints do not conflict.
pub fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub struct ConflictDetectionService {
    appointments: Arc<dyn AppointmentRepository>,
}

impl ConflictDetectionService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    /// Rejects with NoAvailability when any calendar-occupying appointment of
    /// the professional overlaps the requested window. Effective windows are
    /// compared, so a rescheduled appointment blocks its new slot, not its
    /// original one.
    pub async fn ensure_window_free(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        debug!(
            "Checking conflicts for professional {} from {} to {}",
            professional_id, start, end
        );

        let existing = self
            .appointments
            .find_overlapping(professional_id, start, end)
            .await?;

        let conflicting = existing.iter().find(|appointment| {
            appointment.status().occupies_calendar()
                && Some(appointment.id()) != exclude_appointment_id
                && windows_overlap(
                    start,
                    end,
                    appointment.effective_start_date_time(),
                    appointment.effective_end_date_time(),
                )
        });

        if let Some(appointment) = conflicting {
            warn!(
                "Conflict detected for professional {}: appointment {} occupies the window",
                professional_id,
                appointment.id()
            );
            return Err(SchedulingError::NoAvailability(
                "the requested time overlaps an existing appointment".to_string(),
            ));
        }

        Ok(())
    }
}
