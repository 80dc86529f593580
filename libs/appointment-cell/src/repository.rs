// libs/appointment-cell/src/repository.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::repository::RepositoryError;

use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentQuery {
    pub client_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create(&self, appointment: &Appointment) -> Result<(), RepositoryError>;
    async fn save(&self, appointment: &Appointment) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, RepositoryError>;

    /// All appointments of the professional whose effective window intersects
    /// `[start, end]`, regardless of status; callers decide which statuses
    /// still occupy the calendar.
    async fn find_overlapping(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, RepositoryError>;

    async fn find_many(&self, query: &AppointmentQuery)
        -> Result<Vec<Appointment>, RepositoryError>;

    async fn find_by_calendar_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<Appointment>, RepositoryError>;
}
