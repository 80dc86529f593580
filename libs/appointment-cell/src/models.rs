// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use shared_models::repository::RepositoryError;

use crate::events::{AppointmentEvent, AppointmentEventKind};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    /// Assigned by an external no-show detection job, never by a transition here.
    NoShow,
    Rescheduled,
}

impl AppointmentStatus {
    /// Completed and in-progress appointments reject every mutating verb.
    pub fn is_immutable(&self) -> bool {
        matches!(self, AppointmentStatus::InProgress | AppointmentStatus::Completed)
    }

    /// Whether the appointment still blocks its time window. Cancellation
    /// releases the slot; every other status keeps it occupied.
    pub fn occupies_calendar(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InPerson,
    Online,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The appointment aggregate. State only moves through the transition verbs
/// below; there is no public way to assign a status from outside, and
/// business-significant transitions queue exactly one domain event drained by
/// the owning use-case after a successful persist.
#[derive(Debug, Clone)]
pub struct Appointment {
    id: Uuid,
    client_id: Uuid,
    professional_id: Uuid,
    start_date_time: DateTime<Utc>,
    end_date_time: DateTime<Utc>,
    modality: Modality,
    agreed_price: f64,
    status: AppointmentStatus,
    payment_status: PaymentStatus,
    is_paid: bool,
    google_meet_link: Option<String>,
    reschedule_date_time: Option<TimeWindow>,
    started_at: Option<DateTime<Utc>>,
    total_elapsed_ms: Option<i64>,
    google_calendar_event_id: Option<String>,
    sync_with_google_calendar: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pending_events: Vec<AppointmentEvent>,
}

/// Input for a brand-new booking.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub modality: Modality,
    pub agreed_price: f64,
    pub google_meet_link: Option<String>,
    pub sync_with_google_calendar: bool,
}

/// Persistence shape of an appointment. Adapters materialize this and hand it
/// to `Appointment::from_record`; rehydration never raises events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub modality: Modality,
    pub agreed_price: f64,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub is_paid: bool,
    pub google_meet_link: Option<String>,
    pub reschedule_date_time: Option<TimeWindow>,
    pub started_at: Option<DateTime<Utc>>,
    pub total_elapsed_ms: Option<i64>,
    pub google_calendar_event_id: Option<String>,
    pub sync_with_google_calendar: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Books a new appointment and queues the Scheduled event.
    pub fn schedule(details: NewAppointment) -> Self {
        let now = Utc::now();
        let mut appointment = Self {
            id: Uuid::new_v4(),
            client_id: details.client_id,
            professional_id: details.professional_id,
            start_date_time: details.start_date_time,
            end_date_time: details.end_date_time,
            modality: details.modality,
            agreed_price: details.agreed_price,
            status: AppointmentStatus::Scheduled,
            payment_status: PaymentStatus::Pending,
            is_paid: false,
            google_meet_link: details.google_meet_link,
            reschedule_date_time: None,
            started_at: None,
            total_elapsed_ms: None,
            google_calendar_event_id: None,
            sync_with_google_calendar: details.sync_with_google_calendar,
            created_at: now,
            updated_at: now,
            pending_events: Vec::new(),
        };
        appointment.raise(AppointmentEventKind::Scheduled);
        appointment
    }

    /// Rehydrates an already-persisted appointment. Raises nothing.
    pub fn from_record(record: AppointmentRecord) -> Self {
        Self {
            id: record.id,
            client_id: record.client_id,
            professional_id: record.professional_id,
            start_date_time: record.start_date_time,
            end_date_time: record.end_date_time,
            modality: record.modality,
            agreed_price: record.agreed_price,
            status: record.status,
            payment_status: record.payment_status,
            is_paid: record.is_paid,
            google_meet_link: record.google_meet_link,
            reschedule_date_time: record.reschedule_date_time,
            started_at: record.started_at,
            total_elapsed_ms: record.total_elapsed_ms,
            google_calendar_event_id: record.google_calendar_event_id,
            sync_with_google_calendar: record.sync_with_google_calendar,
            created_at: record.created_at,
            updated_at: record.updated_at,
            pending_events: Vec::new(),
        }
    }

    pub fn to_record(&self) -> AppointmentRecord {
        AppointmentRecord {
            id: self.id,
            client_id: self.client_id,
            professional_id: self.professional_id,
            start_date_time: self.start_date_time,
            end_date_time: self.end_date_time,
            modality: self.modality,
            agreed_price: self.agreed_price,
            status: self.status,
            payment_status: self.payment_status,
            is_paid: self.is_paid,
            google_meet_link: self.google_meet_link.clone(),
            reschedule_date_time: self.reschedule_date_time,
            started_at: self.started_at,
            total_elapsed_ms: self.total_elapsed_ms,
            google_calendar_event_id: self.google_calendar_event_id.clone(),
            sync_with_google_calendar: self.sync_with_google_calendar,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // -- accessors ------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn professional_id(&self) -> Uuid {
        self.professional_id
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn agreed_price(&self) -> f64 {
        self.agreed_price
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    pub fn google_meet_link(&self) -> Option<&str> {
        self.google_meet_link.as_deref()
    }

    pub fn reschedule_date_time(&self) -> Option<TimeWindow> {
        self.reschedule_date_time
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn total_elapsed_ms(&self) -> Option<i64> {
        self.total_elapsed_ms
    }

    pub fn google_calendar_event_id(&self) -> Option<&str> {
        self.google_calendar_event_id.as_deref()
    }

    pub fn sync_with_google_calendar(&self) -> bool {
        self.sync_with_google_calendar
    }

    pub fn start_date_time(&self) -> DateTime<Utc> {
        self.start_date_time
    }

    pub fn end_date_time(&self) -> DateTime<Utc> {
        self.end_date_time
    }

    /// The window the appointment actually occupies: the reschedule window
    /// while status is rescheduled, the original one otherwise. The slot
    /// engine and every downstream consumer read these, never the raw fields.
    pub fn effective_start_date_time(&self) -> DateTime<Utc> {
        match (self.status, self.reschedule_date_time) {
            (AppointmentStatus::Rescheduled, Some(window)) => window.start,
            _ => self.start_date_time,
        }
    }

    pub fn effective_end_date_time(&self) -> DateTime<Utc> {
        match (self.status, self.reschedule_date_time) {
            (AppointmentStatus::Rescheduled, Some(window)) => window.end,
            _ => self.end_date_time,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // -- transitions ----------------------------------------------------------

    /// Idempotent when already confirmed.
    pub fn confirm(&mut self) -> Result<(), TransitionError> {
        self.guard_mutable("confirm")?;
        if self.status == AppointmentStatus::Confirmed {
            return Ok(());
        }
        self.status = AppointmentStatus::Confirmed;
        self.touch();
        self.raise(AppointmentEventKind::Confirmed);
        Ok(())
    }

    /// Idempotent when already cancelled.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.guard_mutable("cancel")?;
        if self.status == AppointmentStatus::Cancelled {
            return Ok(());
        }
        self.status = AppointmentStatus::Cancelled;
        self.touch();
        self.raise(AppointmentEventKind::Cancelled);
        Ok(())
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != AppointmentStatus::Scheduled {
            return Err(TransitionError::NotStartable(self.status));
        }
        self.status = AppointmentStatus::InProgress;
        self.started_at = Some(now);
        self.touch();
        Ok(())
    }

    /// Folds the running interval into the elapsed total. A paused session is
    /// in-progress with no `started_at`.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.guard_in_progress("pause")?;
        let started_at = self.started_at.ok_or(TransitionError::NotRunning)?;
        self.accumulate_elapsed(started_at, now);
        self.started_at = None;
        self.touch();
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.guard_in_progress("resume")?;
        if self.started_at.is_some() {
            return Err(TransitionError::AlreadyRunning);
        }
        self.started_at = Some(now);
        self.touch();
        Ok(())
    }

    /// Completing a running session folds the final interval first.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.guard_in_progress("complete")?;
        if let Some(started_at) = self.started_at {
            self.accumulate_elapsed(started_at, now);
        }
        self.status = AppointmentStatus::Completed;
        self.started_at = None;
        self.touch();
        Ok(())
    }

    /// Mechanical state change only; the reschedule use-case owns policy and
    /// overlap checks.
    pub fn reschedule(&mut self, window: TimeWindow) -> Result<(), TransitionError> {
        self.guard_mutable("reschedule")?;
        self.reschedule_date_time = Some(window);
        self.status = AppointmentStatus::Rescheduled;
        self.touch();
        Ok(())
    }

    pub fn mark_paid(&mut self) {
        self.payment_status = PaymentStatus::Paid;
        self.is_paid = true;
        self.touch();
    }

    /// Invoked by the external payment-deadline job for unpaid appointments.
    pub fn cancel_due_to_payment_timeout(&mut self) -> Result<(), TransitionError> {
        if self.is_paid {
            return Err(TransitionError::AlreadyPaid);
        }
        self.cancel()
    }

    /// Records the external calendar event backing this appointment.
    pub fn link_calendar_event(&mut self, event_id: String) {
        self.google_calendar_event_id = Some(event_id);
        self.touch();
    }

    /// Drains the queued domain events; called by use-cases after persisting.
    pub fn take_events(&mut self) -> Vec<AppointmentEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // -- internals ------------------------------------------------------------

    fn guard_mutable(&self, action: &'static str) -> Result<(), TransitionError> {
        if self.status.is_immutable() {
            return Err(TransitionError::Immutable {
                action,
                status: self.status,
            });
        }
        Ok(())
    }

    fn guard_in_progress(&self, action: &'static str) -> Result<(), TransitionError> {
        if self.status != AppointmentStatus::InProgress {
            return Err(TransitionError::NotInProgress {
                action,
                status: self.status,
            });
        }
        Ok(())
    }

    fn accumulate_elapsed(&mut self, started_at: DateTime<Utc>, now: DateTime<Utc>) {
        let elapsed = (now - started_at).num_milliseconds();
        self.total_elapsed_ms = Some(self.total_elapsed_ms.unwrap_or(0) + elapsed);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn raise(&mut self, kind: AppointmentEventKind) {
        self.pending_events.push(AppointmentEvent {
            kind,
            appointment_id: self.id,
            client_id: self.client_id,
            professional_id: self.professional_id,
            starts_at: self.effective_start_date_time(),
            ends_at: self.effective_end_date_time(),
            sync_with_google_calendar: self.sync_with_google_calendar,
            occurred_at: Utc::now(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} an appointment that is {status}")]
    Immutable {
        action: &'static str,
        status: AppointmentStatus,
    },

    #[error("only a scheduled appointment can be started, current status is {0}")]
    NotStartable(AppointmentStatus),

    #[error("appointment must be in progress to {action}, current status is {status}")]
    NotInProgress {
        action: &'static str,
        status: AppointmentStatus,
    },

    #[error("session timer is not running")]
    NotRunning,

    #[error("session timer is already running")]
    AlreadyRunning,

    #[error("appointment is already paid")]
    AlreadyPaid,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start_date_time: DateTime<Utc>,
    pub modality: Modality,
    pub google_meet_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmAppointmentRequest {
    pub appointment_id: Uuid,
    pub professional_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub new_start_date_time: DateTime<Utc>,
    pub new_end_date_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpAppointmentRequest {
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start_date_time: DateTime<Utc>,
    pub modality: Modality,
    pub google_meet_link: Option<String>,
}

/// A bookable interval produced by the availability engine; not yet an
/// appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

// ==============================================================================
// ERROR TAXONOMY
// ==============================================================================

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Client not found")]
    ClientNotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Professional has no schedule configuration")]
    ScheduleConfigurationNotFound,

    #[error("Professional has no cancellation policy")]
    CancellationPolicyNotFound,

    #[error("Client has no completed appointments yet")]
    NoCompletedAppointments,

    #[error("Not allowed: {0}")]
    NotAllowed(String),

    #[error("No availability: {0}")]
    NoAvailability(String),

    #[error("Appointment is already cancelled or completed")]
    AlreadyCancelled,

    #[error("Past appointments cannot be cancelled")]
    CannotCancelAppointment,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Storage(String),
}

impl From<TransitionError> for SchedulingError {
    fn from(error: TransitionError) -> Self {
        SchedulingError::BadRequest(error.to_string())
    }
}

impl From<RepositoryError> for SchedulingError {
    fn from(error: RepositoryError) -> Self {
        SchedulingError::Storage(error.to_string())
    }
}

impl From<SchedulingError> for shared_models::error::AppError {
    fn from(error: SchedulingError) -> Self {
        use shared_models::error::AppError;
        let message = error.to_string();
        match error {
            SchedulingError::ClientNotFound
            | SchedulingError::ProfessionalNotFound
            | SchedulingError::AppointmentNotFound
            | SchedulingError::ScheduleConfigurationNotFound
            | SchedulingError::CancellationPolicyNotFound
            | SchedulingError::NoCompletedAppointments => AppError::NotFound(message),
            SchedulingError::NotAllowed(_) => AppError::Forbidden(message),
            SchedulingError::NoAvailability(_) | SchedulingError::AlreadyCancelled => {
                AppError::Conflict(message)
            }
            SchedulingError::CannotCancelAppointment => AppError::UnprocessableEntity(message),
            SchedulingError::BadRequest(_) => AppError::BadRequest(message),
            SchedulingError::Storage(_) => AppError::Database(message),
        }
    }
}
