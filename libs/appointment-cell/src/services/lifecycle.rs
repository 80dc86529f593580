// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Appointment, SchedulingError};
use crate::repository::AppointmentRepository;

/// Drives a session through start, pause, resume and complete. The entity
/// owns every guard; this service only loads, applies the verb with the
/// current instant and persists.
pub struct SessionLifecycleService {
    appointments: Arc<dyn AppointmentRepository>,
}

impl SessionLifecycleService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn start_session(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        debug!("Starting session for appointment {}", appointment_id);
        let mut appointment = self.load(appointment_id).await?;
        appointment.start(Utc::now())?;
        self.appointments.save(&appointment).await?;
        info!("Session started for appointment {}", appointment_id);
        Ok(appointment)
    }

    pub async fn pause_session(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        debug!("Pausing session for appointment {}", appointment_id);
        let mut appointment = self.load(appointment_id).await?;
        appointment.pause(Utc::now())?;
        self.appointments.save(&appointment).await?;
        Ok(appointment)
    }

    pub async fn resume_session(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Resuming session for appointment {}", appointment_id);
        let mut appointment = self.load(appointment_id).await?;
        appointment.resume(Utc::now())?;
        self.appointments.save(&appointment).await?;
        Ok(appointment)
    }

    pub async fn complete_session(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Completing session for appointment {}", appointment_id);
        let mut appointment = self.load(appointment_id).await?;
        appointment.complete(Utc::now())?;
        self.appointments.save(&appointment).await?;
        info!(
            "Session completed for appointment {} with {} ms elapsed",
            appointment_id,
            appointment.total_elapsed_ms().unwrap_or(0)
        );
        Ok(appointment)
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.appointments
            .find_by_id(appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)
    }
}
