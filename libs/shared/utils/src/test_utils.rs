// libs/shared/utils/src/test_utils.rs
//
// In-memory repository fakes and fixture builders shared by the cells'
// integration tests. The fakes honor the same contracts persistence adapters
// implement in production, down to effective-window overlap matching.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentRecord};
use appointment_cell::repository::{AppointmentQuery, AppointmentRepository};
use appointment_cell::services::conflict::windows_overlap;
use professional_cell::models::{CancellationPolicy, ScheduleConfiguration, WorkingHours};
use professional_cell::repository::{
    CancellationPolicyRepository, ScheduleConfigurationRepository,
};
use shared_models::client::{Client, ClientRepository};
use shared_models::professional::{
    NotificationSettings, Professional, ProfessionalRepository,
};
use shared_models::repository::RepositoryError;

// ==============================================================================
// IN-MEMORY REPOSITORIES
// ==============================================================================

#[derive(Default)]
pub struct InMemoryClients {
    clients: Mutex<HashMap<Uuid, Client>>,
}

impl InMemoryClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(clients: impl IntoIterator<Item = Client>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.clients.lock().unwrap();
            for client in clients {
                guard.insert(client.id, client);
            }
        }
        store
    }
}

#[async_trait]
impl ClientRepository for InMemoryClients {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, RepositoryError> {
        Ok(self.clients.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, client: &Client) -> Result<(), RepositoryError> {
        self.clients
            .lock()
            .unwrap()
            .insert(client.id, client.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProfessionals {
    professionals: Mutex<HashMap<Uuid, Professional>>,
}

impl InMemoryProfessionals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(professionals: impl IntoIterator<Item = Professional>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.professionals.lock().unwrap();
            for professional in professionals {
                guard.insert(professional.id, professional);
            }
        }
        store
    }
}

#[async_trait]
impl ProfessionalRepository for InMemoryProfessionals {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Professional>, RepositoryError> {
        Ok(self.professionals.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, professional: &Professional) -> Result<(), RepositoryError> {
        self.professionals
            .lock()
            .unwrap()
            .insert(professional.id, professional.clone());
        Ok(())
    }

    async fn assign_cancellation_policy(
        &self,
        professional_id: Uuid,
        policy_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let mut professionals = self.professionals.lock().unwrap();
        let professional = professionals
            .get_mut(&professional_id)
            .ok_or_else(|| RepositoryError::new("professional not found"))?;
        professional.cancellation_policy_id = Some(policy_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryScheduleConfigurations {
    configurations: Mutex<HashMap<Uuid, ScheduleConfiguration>>,
}

impl InMemoryScheduleConfigurations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(configurations: impl IntoIterator<Item = ScheduleConfiguration>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.configurations.lock().unwrap();
            for configuration in configurations {
                guard.insert(configuration.professional_id, configuration);
            }
        }
        store
    }
}

#[async_trait]
impl ScheduleConfigurationRepository for InMemoryScheduleConfigurations {
    async fn find_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> Result<Option<ScheduleConfiguration>, RepositoryError> {
        Ok(self
            .configurations
            .lock()
            .unwrap()
            .get(&professional_id)
            .cloned())
    }

    async fn create(&self, configuration: &ScheduleConfiguration) -> Result<(), RepositoryError> {
        self.configurations
            .lock()
            .unwrap()
            .insert(configuration.professional_id, configuration.clone());
        Ok(())
    }

    async fn save(&self, configuration: &ScheduleConfiguration) -> Result<(), RepositoryError> {
        self.create(configuration).await
    }
}

#[derive(Default)]
pub struct InMemoryCancellationPolicies {
    policies: Mutex<HashMap<Uuid, CancellationPolicy>>,
}

impl InMemoryCancellationPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(policies: impl IntoIterator<Item = CancellationPolicy>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.policies.lock().unwrap();
            for policy in policies {
                guard.insert(policy.professional_id, policy);
            }
        }
        store
    }
}

#[async_trait]
impl CancellationPolicyRepository for InMemoryCancellationPolicies {
    async fn find_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> Result<Option<CancellationPolicy>, RepositoryError> {
        Ok(self.policies.lock().unwrap().get(&professional_id).cloned())
    }

    async fn create(&self, policy: &CancellationPolicy) -> Result<(), RepositoryError> {
        self.policies
            .lock()
            .unwrap()
            .insert(policy.professional_id, policy.clone());
        Ok(())
    }

    async fn save(&self, policy: &CancellationPolicy) -> Result<(), RepositoryError> {
        self.create(policy).await
    }
}

/// Stores records, like a real adapter: pending domain events never survive a
/// round trip through persistence.
#[derive(Default)]
pub struct InMemoryAppointments {
    records: Mutex<HashMap<Uuid, AppointmentRecord>>,
}

impl InMemoryAppointments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(appointments: impl IntoIterator<Item = Appointment>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.records.lock().unwrap();
            for appointment in appointments {
                guard.insert(appointment.id(), appointment.to_record());
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointments {
    async fn create(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.records
            .lock()
            .unwrap()
            .insert(appointment.id(), appointment.to_record());
        Ok(())
    }

    async fn save(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.create(appointment).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .map(Appointment::from_record))
    }

    async fn find_overlapping(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|record| record.professional_id == professional_id)
            .cloned()
            .map(Appointment::from_record)
            .filter(|appointment| {
                windows_overlap(
                    start,
                    end,
                    appointment.effective_start_date_time(),
                    appointment.effective_end_date_time(),
                )
            })
            .collect())
    }

    async fn find_many(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .cloned()
            .map(Appointment::from_record)
            .filter(|appointment| {
                query
                    .client_id
                    .map(|id| appointment.client_id() == id)
                    .unwrap_or(true)
                    && query
                        .professional_id
                        .map(|id| appointment.professional_id() == id)
                        .unwrap_or(true)
                    && query
                        .status
                        .map(|status| appointment.status() == status)
                        .unwrap_or(true)
                    && query
                        .from_date
                        .map(|from| appointment.effective_start_date_time() >= from)
                        .unwrap_or(true)
                    && query
                        .to_date
                        .map(|to| appointment.effective_start_date_time() <= to)
                        .unwrap_or(true)
            })
            .collect())
    }

    async fn find_by_calendar_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .find(|record| record.google_calendar_event_id.as_deref() == Some(event_id))
            .cloned()
            .map(Appointment::from_record))
    }
}

// ==============================================================================
// FIXTURES
// ==============================================================================

pub fn client() -> Client {
    let now = Utc::now();
    Client {
        id: Uuid::new_v4(),
        full_name: "Alex Moreira".to_string(),
        email: "alex@example.com".to_string(),
        phone: Some("+5511999990000".to_string()),
        created_at: now,
        updated_at: now,
    }
}

pub fn professional(session_price: f64) -> Professional {
    let now = Utc::now();
    Professional {
        id: Uuid::new_v4(),
        full_name: "Dr. Camila Duarte".to_string(),
        email: "camila@example.com".to_string(),
        session_price,
        schedule_configuration_id: None,
        cancellation_policy_id: None,
        notification_settings: NotificationSettings::default(),
        created_at: now,
        updated_at: now,
    }
}

/// Monday through Friday, 09:00-17:00, hour-long sessions with a ten-minute
/// buffer.
pub fn weekday_configuration(professional_id: Uuid) -> ScheduleConfiguration {
    ScheduleConfiguration::new(
        professional_id,
        vec![1, 2, 3, 4, 5],
        WorkingHours::parse("09:00", "17:00").unwrap(),
        60,
        10,
        vec![],
        true,
        true,
    )
    .unwrap()
}

pub fn configuration_with_hours(
    professional_id: Uuid,
    start: &str,
    end: &str,
    session_minutes: i64,
    buffer_minutes: i64,
    holidays: Vec<NaiveDate>,
) -> ScheduleConfiguration {
    ScheduleConfiguration::new(
        professional_id,
        vec![1, 2, 3, 4, 5],
        WorkingHours::parse(start, end).unwrap(),
        session_minutes,
        buffer_minutes,
        holidays,
        true,
        true,
    )
    .unwrap()
}

pub fn cancellation_policy(professional_id: Uuid, allow_reschedule: bool) -> CancellationPolicy {
    CancellationPolicy::new(professional_id, 24, 2, 50.0, allow_reschedule, None).unwrap()
}
