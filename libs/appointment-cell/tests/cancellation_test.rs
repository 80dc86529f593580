use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use appointment_cell::events::{
    AppointmentEvent, AppointmentEventDispatcher, AppointmentEventHandler, AppointmentEventKind,
};
use appointment_cell::models::{
    Appointment, AppointmentStatus, CancelAppointmentRequest, Modality, NewAppointment,
    SchedulingError,
};
use appointment_cell::repository::AppointmentRepository;
use appointment_cell::services::{AppointmentCancellationService, WaivedCancellationFees};
use shared_models::client::Client;
use shared_models::professional::Professional;
use shared_utils::test_utils::{
    self, InMemoryAppointments, InMemoryCancellationPolicies, InMemoryClients,
    InMemoryProfessionals,
};

#[derive(Default)]
struct CountingHandler {
    seen: Mutex<Vec<AppointmentEventKind>>,
}

#[async_trait]
impl AppointmentEventHandler for CountingHandler {
    fn name(&self) -> &str {
        "counting"
    }

    async fn handle(&self, event: &AppointmentEvent) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(event.kind);
        Ok(())
    }
}

fn appointment_at(client_id: Uuid, professional_id: Uuid, start: DateTime<Utc>) -> Appointment {
    Appointment::schedule(NewAppointment {
        client_id,
        professional_id,
        start_date_time: start,
        end_date_time: start + Duration::minutes(60),
        modality: Modality::Online,
        agreed_price: 150.0,
        google_meet_link: None,
        sync_with_google_calendar: false,
    })
}

fn service_over(
    appointments: Arc<InMemoryAppointments>,
    clients: Vec<Client>,
    professionals: Vec<Professional>,
    policies: InMemoryCancellationPolicies,
    dispatcher: AppointmentEventDispatcher,
) -> AppointmentCancellationService {
    AppointmentCancellationService::new(
        appointments,
        Arc::new(InMemoryClients::with(clients)),
        Arc::new(InMemoryProfessionals::with(professionals)),
        Arc::new(policies),
        Arc::new(WaivedCancellationFees),
        Arc::new(dispatcher),
    )
}

#[tokio::test]
async fn cancellation_persists_the_transition_and_dispatches() {
    let client = test_utils::client();
    let mut professional = test_utils::professional(150.0);
    let policy = test_utils::cancellation_policy(professional.id, true);
    professional.cancellation_policy_id = Some(policy.id);

    let appointment =
        appointment_at(client.id, professional.id, Utc::now() + Duration::days(3));
    let request = CancelAppointmentRequest {
        appointment_id: appointment.id(),
        client_id: client.id,
        professional_id: professional.id,
    };

    let store = Arc::new(InMemoryAppointments::with([appointment]));
    let handler = Arc::new(CountingHandler::default());
    let mut dispatcher = AppointmentEventDispatcher::new();
    dispatcher.register(AppointmentEventKind::Cancelled, handler.clone());

    let service = service_over(
        Arc::clone(&store),
        vec![client],
        vec![professional],
        InMemoryCancellationPolicies::with([policy]),
        dispatcher,
    );

    let cancelled = service.cancel_appointment(request.clone()).await.unwrap();

    assert_eq!(cancelled.status(), AppointmentStatus::Cancelled);
    let stored = store
        .find_by_id(request.appointment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), AppointmentStatus::Cancelled);
    assert_eq!(
        *handler.seen.lock().unwrap(),
        vec![AppointmentEventKind::Cancelled]
    );
}

#[tokio::test]
async fn cancellation_rejects_parties_that_do_not_own_the_appointment() {
    let owner = test_utils::client();
    let intruder = test_utils::client();
    let mut professional = test_utils::professional(150.0);
    let policy = test_utils::cancellation_policy(professional.id, true);
    professional.cancellation_policy_id = Some(policy.id);

    let appointment =
        appointment_at(owner.id, professional.id, Utc::now() + Duration::days(3));
    let request = CancelAppointmentRequest {
        appointment_id: appointment.id(),
        client_id: intruder.id,
        professional_id: professional.id,
    };

    let service = service_over(
        Arc::new(InMemoryAppointments::with([appointment])),
        vec![owner, intruder],
        vec![professional],
        InMemoryCancellationPolicies::with([policy]),
        AppointmentEventDispatcher::new(),
    );

    let result = service.cancel_appointment(request).await;
    assert_matches!(result, Err(SchedulingError::NotAllowed(_)));
}

#[tokio::test]
async fn past_appointments_cannot_be_cancelled() {
    let client = test_utils::client();
    let mut professional = test_utils::professional(150.0);
    let policy = test_utils::cancellation_policy(professional.id, true);
    professional.cancellation_policy_id = Some(policy.id);

    let past = appointment_at(client.id, professional.id, Utc::now() - Duration::hours(2));
    let request = CancelAppointmentRequest {
        appointment_id: past.id(),
        client_id: client.id,
        professional_id: professional.id,
    };

    let service = service_over(
        Arc::new(InMemoryAppointments::with([past])),
        vec![client],
        vec![professional],
        InMemoryCancellationPolicies::with([policy]),
        AppointmentEventDispatcher::new(),
    );

    let result = service.cancel_appointment(request).await;
    assert_matches!(result, Err(SchedulingError::CannotCancelAppointment));
}

#[tokio::test]
async fn already_cancelled_appointments_are_rejected() {
    let client = test_utils::client();
    let mut professional = test_utils::professional(150.0);
    let policy = test_utils::cancellation_policy(professional.id, true);
    professional.cancellation_policy_id = Some(policy.id);

    let mut cancelled =
        appointment_at(client.id, professional.id, Utc::now() + Duration::days(3));
    cancelled.cancel().unwrap();
    let request = CancelAppointmentRequest {
        appointment_id: cancelled.id(),
        client_id: client.id,
        professional_id: professional.id,
    };

    let service = service_over(
        Arc::new(InMemoryAppointments::with([cancelled])),
        vec![client],
        vec![professional],
        InMemoryCancellationPolicies::with([policy]),
        AppointmentEventDispatcher::new(),
    );

    let result = service.cancel_appointment(request).await;
    assert_matches!(result, Err(SchedulingError::AlreadyCancelled));
}

#[tokio::test]
async fn a_professional_without_policy_cannot_process_cancellations() {
    let client = test_utils::client();
    let professional = test_utils::professional(150.0);

    let appointment =
        appointment_at(client.id, professional.id, Utc::now() + Duration::days(3));
    let request = CancelAppointmentRequest {
        appointment_id: appointment.id(),
        client_id: client.id,
        professional_id: professional.id,
    };

    let service = service_over(
        Arc::new(InMemoryAppointments::with([appointment])),
        vec![client],
        vec![professional],
        InMemoryCancellationPolicies::new(),
        AppointmentEventDispatcher::new(),
    );

    let result = service.cancel_appointment(request).await;
    assert_matches!(result, Err(SchedulingError::CancellationPolicyNotFound));
}

#[tokio::test]
async fn missing_appointment_is_not_found() {
    let client = test_utils::client();
    let mut professional = test_utils::professional(150.0);
    let policy = test_utils::cancellation_policy(professional.id, true);
    professional.cancellation_policy_id = Some(policy.id);

    let request = CancelAppointmentRequest {
        appointment_id: Uuid::new_v4(),
        client_id: client.id,
        professional_id: professional.id,
    };

    let service = service_over(
        Arc::new(InMemoryAppointments::new()),
        vec![client],
        vec![professional],
        InMemoryCancellationPolicies::with([policy]),
        AppointmentEventDispatcher::new(),
    );

    let result = service.cancel_appointment(request).await;
    assert_matches!(result, Err(SchedulingError::AppointmentNotFound));
}
