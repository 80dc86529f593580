// libs/appointment-cell/src/services/cancellation.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use professional_cell::models::CancellationPolicy;
use professional_cell::repository::CancellationPolicyRepository;
use shared_models::client::ClientRepository;
use shared_models::professional::ProfessionalRepository;

use crate::events::AppointmentEventDispatcher;
use crate::models::{
    Appointment, AppointmentStatus, CancelAppointmentRequest, SchedulingError,
};
use crate::repository::AppointmentRepository;

/// Seam for the fee applied when a cancellation lands inside the policy's
/// notice window. Charging is parked until a payments context exists, so the
/// shipped strategy waives everything; the use-case only surfaces what a
/// strategy computes.
pub trait CancellationFeeStrategy: Send + Sync {
    fn late_cancellation_fee(
        &self,
        policy: &CancellationPolicy,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Option<f64>;
}

pub struct WaivedCancellationFees;

impl CancellationFeeStrategy for WaivedCancellationFees {
    fn late_cancellation_fee(
        &self,
        policy: &CancellationPolicy,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Option<f64> {
        let notice_window = Duration::hours(policy.min_hours_before_cancellation);
        let inside_notice_window = now > appointment.effective_start_date_time() - notice_window;
        if inside_notice_window {
            debug!(
                "Cancellation of appointment {} falls inside the {}h notice window; fee waived",
                appointment.id(),
                policy.min_hours_before_cancellation
            );
        }
        None
    }
}

pub struct AppointmentCancellationService {
    appointments: Arc<dyn AppointmentRepository>,
    clients: Arc<dyn ClientRepository>,
    professionals: Arc<dyn ProfessionalRepository>,
    policies: Arc<dyn CancellationPolicyRepository>,
    fees: Arc<dyn CancellationFeeStrategy>,
    dispatcher: Arc<AppointmentEventDispatcher>,
}

impl AppointmentCancellationService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        clients: Arc<dyn ClientRepository>,
        professionals: Arc<dyn ProfessionalRepository>,
        policies: Arc<dyn CancellationPolicyRepository>,
        fees: Arc<dyn CancellationFeeStrategy>,
        dispatcher: Arc<AppointmentEventDispatcher>,
    ) -> Self {
        Self {
            appointments,
            clients,
            professionals,
            policies,
            fees,
            dispatcher,
        }
    }

    pub async fn cancel_appointment(
        &self,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Cancelling appointment {}", request.appointment_id);

        let mut appointment = self
            .appointments
            .find_by_id(request.appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;
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
        if professional.cancellation_policy_id.is_none() {
            return Err(SchedulingError::CancellationPolicyNotFound);
        }
        let policy = self
            .policies
            .find_by_professional_id(professional.id)
            .await?
            .ok_or(SchedulingError::CancellationPolicyNotFound)?;

        if appointment.client_id() != client.id || appointment.professional_id() != professional.id
        {
            return Err(SchedulingError::NotAllowed(
                "appointment does not belong to the requesting parties".to_string(),
            ));
        }

        let now = Utc::now();
        if appointment.effective_start_date_time() < now {
            return Err(SchedulingError::CannotCancelAppointment);
        }
        if matches!(
            appointment.status(),
            AppointmentStatus::Cancelled | AppointmentStatus::Completed
        ) {
            return Err(SchedulingError::AlreadyCancelled);
        }

        if let Some(fee) = self
            .fees
            .late_cancellation_fee(&policy, &appointment, now)
        {
            info!(
                "Late-cancellation fee of {:.2} computed for appointment {} (not applied)",
                fee,
                appointment.id()
            );
        }

        appointment.cancel()?;
        self.appointments.save(&appointment).await?;
        self.dispatcher.dispatch(&appointment.take_events()).await;

        info!("Appointment {} cancelled", appointment.id());
        Ok(appointment)
    }
}
