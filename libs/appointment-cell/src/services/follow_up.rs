// libs/appointment-cell/src/services/follow_up.rs
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use professional_cell::repository::{
    CancellationPolicyRepository, ScheduleConfigurationRepository,
};
use shared_models::client::ClientRepository;
use shared_models::professional::ProfessionalRepository;

use crate::events::AppointmentEventDispatcher;
use crate::models::{
    Appointment, AppointmentStatus, FollowUpAppointmentRequest, NewAppointment, SchedulingError,
};
use crate::repository::{AppointmentQuery, AppointmentRepository};
use crate::services::conflict::ConflictDetectionService;
use crate::services::locks::ProfessionalScheduleLocks;

/// Books the client's follow-up session. The earliest allowed start is the
/// end of the last completed appointment plus the policy's day gap; exactly
/// at that instant is accepted.
pub struct FollowUpSchedulingService {
    clients: Arc<dyn ClientRepository>,
    professionals: Arc<dyn ProfessionalRepository>,
    configurations: Arc<dyn ScheduleConfigurationRepository>,
    policies: Arc<dyn CancellationPolicyRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    conflicts: ConflictDetectionService,
    locks: Arc<ProfessionalScheduleLocks>,
    dispatcher: Arc<AppointmentEventDispatcher>,
}

impl FollowUpSchedulingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        professionals: Arc<dyn ProfessionalRepository>,
        configurations: Arc<dyn ScheduleConfigurationRepository>,
        policies: Arc<dyn CancellationPolicyRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        locks: Arc<ProfessionalScheduleLocks>,
        dispatcher: Arc<AppointmentEventDispatcher>,
    ) -> Self {
        let conflicts = ConflictDetectionService::new(Arc::clone(&appointments));
        Self {
            clients,
            professionals,
            configurations,
            policies,
            appointments,
            conflicts,
            locks,
            dispatcher,
        }
    }

    pub async fn schedule_follow_up(
        &self,
        request: FollowUpAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Scheduling follow-up for client {} with professional {}",
            request.client_id, request.professional_id
        );

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
        let configuration = self
            .configurations
            .find_by_professional_id(professional.id)
            .await?
            .ok_or(SchedulingError::ScheduleConfigurationNotFound)?;
        let policy = self
            .policies
            .find_by_professional_id(professional.id)
            .await?
            .ok_or(SchedulingError::CancellationPolicyNotFound)?;

        let completed = self
            .appointments
            .find_many(&AppointmentQuery {
                client_id: Some(client.id),
                professional_id: Some(professional.id),
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            })
            .await?;
        let last_completed = completed
            .into_iter()
            .max_by_key(|appointment| appointment.effective_end_date_time())
            .ok_or(SchedulingError::NoCompletedAppointments)?;

        let earliest_start = last_completed.effective_end_date_time()
            + Duration::days(policy.min_days_before_next_appointment);
        if request.start_date_time < earliest_start {
            return Err(SchedulingError::NotAllowed(format!(
                "the next appointment cannot start before {}",
                earliest_start
            )));
        }

        let start = request.start_date_time;
        let end = start + Duration::minutes(configuration.session_duration_minutes);

        let guard = self.locks.acquire(professional.id).await;

        self.conflicts
            .ensure_window_free(professional.id, start, end, None)
            .await?;

        let mut appointment = Appointment::schedule(NewAppointment {
            client_id: client.id,
            professional_id: professional.id,
            start_date_time: start,
            end_date_time: end,
            modality: request.modality,
            agreed_price: professional.session_price,
            google_meet_link: request.google_meet_link,
            sync_with_google_calendar: configuration.sync_with_google_calendar,
        });

        self.appointments.create(&appointment).await?;
        drop(guard);

        self.dispatcher.dispatch(&appointment.take_events()).await;

        info!(
            "Follow-up appointment {} scheduled for client {}",
            appointment.id(),
            client.id
        );
        Ok(appointment)
    }
}
