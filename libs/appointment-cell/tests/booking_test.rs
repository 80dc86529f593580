use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use appointment_cell::events::{
    AppointmentEvent, AppointmentEventDispatcher, AppointmentEventHandler, AppointmentEventKind,
};
use appointment_cell::models::{
    AppointmentStatus, BookAppointmentRequest, Modality, SchedulingError,
};
use appointment_cell::services::{AppointmentBookingService, ProfessionalScheduleLocks};
use shared_config::AppConfig;
use shared_utils::test_utils::{
    self, InMemoryAppointments, InMemoryClients, InMemoryProfessionals,
    InMemoryScheduleConfigurations,
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

struct BookingEnv {
    service: AppointmentBookingService,
    appointments: Arc<InMemoryAppointments>,
    handler: Arc<CountingHandler>,
    client_id: Uuid,
    professional_id: Uuid,
}

fn booking_env() -> BookingEnv {
    let client = test_utils::client();
    let professional = test_utils::professional(150.0);
    let configuration = test_utils::weekday_configuration(professional.id);

    let client_id = client.id;
    let professional_id = professional.id;

    let appointments = Arc::new(InMemoryAppointments::new());
    let handler = Arc::new(CountingHandler::default());
    let mut dispatcher = AppointmentEventDispatcher::new();
    dispatcher.register(AppointmentEventKind::Scheduled, handler.clone());

    let service = AppointmentBookingService::new(
        Arc::new(InMemoryClients::with([client])),
        Arc::new(InMemoryProfessionals::with([professional])),
        Arc::new(InMemoryScheduleConfigurations::with([configuration])),
        Arc::clone(&appointments) as Arc<dyn appointment_cell::repository::AppointmentRepository>,
        Arc::new(ProfessionalScheduleLocks::new()),
        Arc::new(dispatcher),
        &AppConfig::default(),
    );

    BookingEnv {
        service,
        appointments,
        handler,
        client_id,
        professional_id,
    }
}

fn request(env: &BookingEnv, start: chrono::DateTime<Utc>) -> BookAppointmentRequest {
    BookAppointmentRequest {
        client_id: env.client_id,
        professional_id: env.professional_id,
        start_date_time: start,
        modality: Modality::Online,
        google_meet_link: None,
    }
}

#[tokio::test]
async fn booking_creates_a_scheduled_appointment_and_dispatches() {
    let env = booking_env();
    let start = Utc::now() + Duration::days(2);

    let appointment = env.service.book_appointment(request(&env, start)).await.unwrap();

    assert_eq!(appointment.status(), AppointmentStatus::Scheduled);
    assert_eq!(appointment.agreed_price(), 150.0);
    assert_eq!(appointment.end_date_time(), start + Duration::minutes(60));
    assert!(appointment.sync_with_google_calendar());
    assert_eq!(env.appointments.len(), 1);
    assert_eq!(
        *env.handler.seen.lock().unwrap(),
        vec![AppointmentEventKind::Scheduled]
    );
}

#[tokio::test]
async fn booking_rejects_starts_inside_the_lead_window() {
    let env = booking_env();
    let start = Utc::now() + Duration::hours(1);

    let result = env.service.book_appointment(request(&env, start)).await;

    assert_matches!(result, Err(SchedulingError::NoAvailability(_)));
    assert!(env.appointments.is_empty());
    assert!(env.handler.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn booking_rejects_overlapping_windows_but_not_touching_ones() {
    let env = booking_env();
    let start = Utc::now() + Duration::days(2);

    env.service.book_appointment(request(&env, start)).await.unwrap();

    // Same window and a half-overlapping one both conflict.
    let same = env.service.book_appointment(request(&env, start)).await;
    assert_matches!(same, Err(SchedulingError::NoAvailability(_)));
    let shifted = env
        .service
        .book_appointment(request(&env, start + Duration::minutes(30)))
        .await;
    assert_matches!(shifted, Err(SchedulingError::NoAvailability(_)));

    // Back-to-back is fine: touching endpoints do not conflict.
    let adjacent = env
        .service
        .book_appointment(request(&env, start + Duration::minutes(60)))
        .await;
    assert_matches!(adjacent, Ok(_));
    assert_eq!(env.appointments.len(), 2);
}

#[tokio::test]
async fn booking_distinguishes_missing_entities() {
    let env = booking_env();
    let start = Utc::now() + Duration::days(2);

    let unknown_client = BookAppointmentRequest {
        client_id: Uuid::new_v4(),
        ..request(&env, start)
    };
    assert_matches!(
        env.service.book_appointment(unknown_client).await,
        Err(SchedulingError::ClientNotFound)
    );

    let unknown_professional = BookAppointmentRequest {
        professional_id: Uuid::new_v4(),
        ..request(&env, start)
    };
    assert_matches!(
        env.service.book_appointment(unknown_professional).await,
        Err(SchedulingError::ProfessionalNotFound)
    );
}

#[tokio::test]
async fn booking_requires_a_schedule_configuration() {
    let client = test_utils::client();
    let professional = test_utils::professional(150.0);
    let client_id = client.id;
    let professional_id = professional.id;

    let service = AppointmentBookingService::new(
        Arc::new(InMemoryClients::with([client])),
        Arc::new(InMemoryProfessionals::with([professional])),
        Arc::new(InMemoryScheduleConfigurations::new()),
        Arc::new(InMemoryAppointments::new()),
        Arc::new(ProfessionalScheduleLocks::new()),
        Arc::new(AppointmentEventDispatcher::new()),
        &AppConfig::default(),
    );

    let result = service
        .book_appointment(BookAppointmentRequest {
            client_id,
            professional_id,
            start_date_time: Utc::now() + Duration::days(2),
            modality: Modality::InPerson,
            google_meet_link: None,
        })
        .await;

    assert_matches!(result, Err(SchedulingError::ScheduleConfigurationNotFound));
}

#[tokio::test]
async fn concurrent_bookings_for_one_slot_produce_a_single_winner() {
    let env = booking_env();
    let service = Arc::new(env.service);
    let start = Utc::now() + Duration::days(2);

    let first = tokio::spawn({
        let service = Arc::clone(&service);
        let request = BookAppointmentRequest {
            client_id: env.client_id,
            professional_id: env.professional_id,
            start_date_time: start,
            modality: Modality::Online,
            google_meet_link: None,
        };
        async move { service.book_appointment(request).await }
    });
    let second = tokio::spawn({
        let service = Arc::clone(&service);
        let request = BookAppointmentRequest {
            client_id: env.client_id,
            professional_id: env.professional_id,
            start_date_time: start + Duration::minutes(30),
            modality: Modality::Online,
            google_meet_link: None,
        };
        async move { service.book_appointment(request).await }
    });

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();

    assert_eq!(winners, 1);
    assert_eq!(env.appointments.len(), 1);
    assert_matches!(
        outcomes.iter().find(|outcome| outcome.is_err()),
        Some(Err(SchedulingError::NoAvailability(_)))
    );
}
