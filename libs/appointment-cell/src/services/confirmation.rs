// libs/appointment-cell/src/services/confirmation.rs
use std::sync::Arc;

use tracing::{debug, info};

use shared_models::client::ClientRepository;
use shared_models::professional::ProfessionalRepository;

use crate::events::AppointmentEventDispatcher;
use crate::models::{
    Appointment, AppointmentStatus, ConfirmAppointmentRequest, SchedulingError,
};
use crate::repository::AppointmentRepository;

pub struct AppointmentConfirmationService {
    appointments: Arc<dyn AppointmentRepository>,
    professionals: Arc<dyn ProfessionalRepository>,
    clients: Arc<dyn ClientRepository>,
    dispatcher: Arc<AppointmentEventDispatcher>,
}

impl AppointmentConfirmationService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        professionals: Arc<dyn ProfessionalRepository>,
        clients: Arc<dyn ClientRepository>,
        dispatcher: Arc<AppointmentEventDispatcher>,
    ) -> Self {
        Self {
            appointments,
            professionals,
            clients,
            dispatcher,
        }
    }

    /// Unlike cancellation, confirming is not idempotent at this boundary:
    /// only an appointment that is still exactly scheduled can be confirmed.
    pub async fn confirm_appointment(
        &self,
        request: ConfirmAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Confirming appointment {}", request.appointment_id);

        let mut appointment = self
            .appointments
            .find_by_id(request.appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;
        let professional = self
            .professionals
            .find_by_id(request.professional_id)
            .await?
            .ok_or(SchedulingError::ProfessionalNotFound)?;
        self.clients
            .find_by_id(appointment.client_id())
            .await?
            .ok_or(SchedulingError::ClientNotFound)?;

        if appointment.professional_id() != professional.id {
            return Err(SchedulingError::NotAllowed(
                "appointment does not belong to the confirming professional".to_string(),
            ));
        }

        if appointment.status() != AppointmentStatus::Scheduled {
            return Err(SchedulingError::BadRequest(format!(
                "only a scheduled appointment can be confirmed, current status is {}",
                appointment.status()
            )));
        }

        appointment.confirm()?;
        // Confirmation settles the session in place of a real payment flow.
        appointment.mark_paid();

        self.appointments.save(&appointment).await?;
        self.dispatcher.dispatch(&appointment.take_events()).await;

        info!("Appointment {} confirmed and marked paid", appointment.id());
        Ok(appointment)
    }
}
