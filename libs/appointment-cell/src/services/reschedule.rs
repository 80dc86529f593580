// libs/appointment-cell/src/services/reschedule.rs
use std::sync::Arc;

use tracing::{debug, info};

use professional_cell::repository::CancellationPolicyRepository;
use shared_models::client::ClientRepository;
use shared_models::professional::ProfessionalRepository;

use crate::models::{
    Appointment, AppointmentStatus, RescheduleAppointmentRequest, SchedulingError, TimeWindow,
};
use crate::repository::AppointmentRepository;
use crate::services::conflict::ConflictDetectionService;

pub struct AppointmentRescheduleService {
    appointments: Arc<dyn AppointmentRepository>,
    clients: Arc<dyn ClientRepository>,
    professionals: Arc<dyn ProfessionalRepository>,
    policies: Arc<dyn CancellationPolicyRepository>,
    conflicts: ConflictDetectionService,
}

impl AppointmentRescheduleService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        clients: Arc<dyn ClientRepository>,
        professionals: Arc<dyn ProfessionalRepository>,
        policies: Arc<dyn CancellationPolicyRepository>,
    ) -> Self {
        let conflicts = ConflictDetectionService::new(Arc::clone(&appointments));
        Self {
            appointments,
            clients,
            professionals,
            policies,
            conflicts,
        }
    }

    pub async fn reschedule_appointment(
        &self,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Rescheduling appointment {}", request.appointment_id);

        let mut appointment = self
            .appointments
            .find_by_id(request.appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        if appointment.status() != AppointmentStatus::Scheduled {
            return Err(SchedulingError::NoAvailability(format!(
                "a {} appointment can no longer be rescheduled",
                appointment.status()
            )));
        }

        if request.new_start_date_time < appointment.start_date_time()
            || request.new_end_date_time < appointment.start_date_time()
        {
            return Err(SchedulingError::NoAvailability(
                "the rescheduled window cannot precede the original start".to_string(),
            ));
        }

        let client = self
            .clients
            .find_by_id(request.client_id)
            .await?
            .ok_or(SchedulingError::ClientNotFound)?;
        let professional = self
            .professionals
            .find_by_id(request.professional_id)
            .await?
            .ok_or(SchedulingError::ProfessionalNotFound)?;

        if appointment.client_id() != client.id || appointment.professional_id() != professional.id
        {
            return Err(SchedulingError::NotAllowed(
                "appointment does not belong to the requesting parties".to_string(),
            ));
        }

        let allows_reschedule = self
            .policies
            .find_by_professional_id(professional.id)
            .await?
            .map(|policy| policy.allow_reschedule)
            .unwrap_or(false);
        if !allows_reschedule {
            return Err(SchedulingError::NoAvailability(
                "the professional's cancellation policy does not allow rescheduling".to_string(),
            ));
        }

        self.conflicts
            .ensure_window_free(
                professional.id,
                request.new_start_date_time,
                request.new_end_date_time,
                Some(appointment.id()),
            )
            .await?;

        appointment.reschedule(TimeWindow {
            start: request.new_start_date_time,
            end: request.new_end_date_time,
        })?;
        self.appointments.save(&appointment).await?;

        info!(
            "Appointment {} rescheduled to {}",
            appointment.id(),
            request.new_start_date_time
        );
        Ok(appointment)
    }
}
