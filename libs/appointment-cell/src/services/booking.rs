// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use professional_cell::repository::ScheduleConfigurationRepository;
use shared_config::AppConfig;
use shared_models::client::ClientRepository;
use shared_models::professional::ProfessionalRepository;

use crate::events::AppointmentEventDispatcher;
use crate::models::{Appointment, BookAppointmentRequest, NewAppointment, SchedulingError};
use crate::repository::AppointmentRepository;
use crate::services::conflict::ConflictDetectionService;
use crate::services::locks::ProfessionalScheduleLocks;

pub struct AppointmentBookingService {
    clients: Arc<dyn ClientRepository>,
    professionals: Arc<dyn ProfessionalRepository>,
    configurations: Arc<dyn ScheduleConfigurationRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    conflicts: ConflictDetectionService,
    locks: Arc<ProfessionalScheduleLocks>,
    dispatcher: Arc<AppointmentEventDispatcher>,
    min_lead_time: Duration,
}

impl AppointmentBookingService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        professionals: Arc<dyn ProfessionalRepository>,
        configurations: Arc<dyn ScheduleConfigurationRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        locks: Arc<ProfessionalScheduleLocks>,
        dispatcher: Arc<AppointmentEventDispatcher>,
        config: &AppConfig,
    ) -> Self {
        let conflicts = ConflictDetectionService::new(Arc::clone(&appointments));
        Self {
            clients,
            professionals,
            configurations,
            appointments,
            conflicts,
            locks,
            dispatcher,
            min_lead_time: Duration::hours(config.min_booking_lead_hours),
        }
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for client {} with professional {} at {}",
            request.client_id, request.professional_id, request.start_date_time
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

        let start = request.start_date_time;
        let end = start + Duration::minutes(configuration.session_duration_minutes);

        // Overlap check and insert are serialized per professional so two
        // concurrent bookings cannot both pass the check before either
        // commits.
        let guard = self.locks.acquire(professional.id).await;

        self.conflicts
            .ensure_window_free(professional.id, start, end, None)
            .await?;

        if start < Utc::now() + self.min_lead_time {
            warn!(
                "Booking for client {} rejected: start {} is inside the {}h lead window",
                client.id,
                start,
                self.min_lead_time.num_hours()
            );
            return Err(SchedulingError::NoAvailability(format!(
                "appointments must be booked at least {} hours in advance",
                self.min_lead_time.num_hours()
            )));
        }

        // Unreachable while the session duration is positive; kept as an
        // explicit invariant check.
        if end < start {
            return Err(SchedulingError::BadRequest(
                "appointment end precedes its start".to_string(),
            ));
        }

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

        let events = appointment.take_events();
        self.dispatcher.dispatch(&events).await;

        info!(
            "Appointment {} booked for client {} with professional {}",
            appointment.id(),
            client.id,
            professional.id
        );
        Ok(appointment)
    }
}
