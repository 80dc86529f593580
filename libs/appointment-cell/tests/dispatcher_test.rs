use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use appointment_cell::events::{
    AppointmentEvent, AppointmentEventDispatcher, AppointmentEventHandler, AppointmentEventKind,
};
use appointment_cell::models::{
    Appointment, AppointmentStatus, CancelAppointmentRequest, Modality, NewAppointment,
};
use appointment_cell::repository::AppointmentRepository;
use appointment_cell::services::{AppointmentCancellationService, WaivedCancellationFees};
use shared_utils::test_utils::{
    self, InMemoryAppointments, InMemoryCancellationPolicies, InMemoryClients,
    InMemoryProfessionals,
};

struct RecordingHandler {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
    fail: bool,
}

#[async_trait]
impl AppointmentEventHandler for RecordingHandler {
    fn name(&self) -> &str {
        self.label
    }

    async fn handle(&self, _event: &AppointmentEvent) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(self.label);
        if self.fail {
            Err(anyhow!("{} deliberately failed", self.label))
        } else {
            Ok(())
        }
    }
}

fn sample_event(kind: AppointmentEventKind) -> AppointmentEvent {
    let start = Utc::now() + Duration::days(1);
    AppointmentEvent {
        kind,
        appointment_id: Uuid::new_v4(),
        client_id: Uuid::new_v4(),
        professional_id: Uuid::new_v4(),
        starts_at: start,
        ends_at: start + Duration::minutes(60),
        sync_with_google_calendar: false,
        occurred_at: Utc::now(),
    }
}

#[tokio::test]
async fn handlers_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = AppointmentEventDispatcher::new();
    dispatcher.register(
        AppointmentEventKind::Scheduled,
        Arc::new(RecordingHandler {
            label: "first",
            log: log.clone(),
            fail: false,
        }),
    );
    dispatcher.register(
        AppointmentEventKind::Scheduled,
        Arc::new(RecordingHandler {
            label: "second",
            log: log.clone(),
            fail: false,
        }),
    );

    dispatcher
        .dispatch(&[sample_event(AppointmentEventKind::Scheduled)])
        .await;

    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn a_failing_handler_does_not_block_the_next_one() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = AppointmentEventDispatcher::new();
    dispatcher.register(
        AppointmentEventKind::Cancelled,
        Arc::new(RecordingHandler {
            label: "failing",
            log: log.clone(),
            fail: true,
        }),
    );
    dispatcher.register(
        AppointmentEventKind::Cancelled,
        Arc::new(RecordingHandler {
            label: "surviving",
            log: log.clone(),
            fail: false,
        }),
    );

    dispatcher
        .dispatch(&[sample_event(AppointmentEventKind::Cancelled)])
        .await;

    assert_eq!(*log.lock().unwrap(), vec!["failing", "surviving"]);
}

#[tokio::test]
async fn events_without_handlers_are_ignored() {
    let dispatcher = AppointmentEventDispatcher::new();
    dispatcher
        .dispatch(&[sample_event(AppointmentEventKind::Confirmed)])
        .await;
}

#[tokio::test]
async fn handler_failures_never_undo_the_persisted_transition() {
    let client = test_utils::client();
    let mut professional = test_utils::professional(150.0);
    let policy = test_utils::cancellation_policy(professional.id, true);
    professional.cancellation_policy_id = Some(policy.id);

    let start = Utc::now() + Duration::days(3);
    let appointment = Appointment::schedule(NewAppointment {
        client_id: client.id,
        professional_id: professional.id,
        start_date_time: start,
        end_date_time: start + Duration::minutes(60),
        modality: Modality::Online,
        agreed_price: 150.0,
        google_meet_link: None,
        sync_with_google_calendar: false,
    });
    let request = CancelAppointmentRequest {
        appointment_id: appointment.id(),
        client_id: client.id,
        professional_id: professional.id,
    };

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = AppointmentEventDispatcher::new();
    dispatcher.register(
        AppointmentEventKind::Cancelled,
        Arc::new(RecordingHandler {
            label: "failing",
            log: log.clone(),
            fail: true,
        }),
    );
    dispatcher.register(
        AppointmentEventKind::Cancelled,
        Arc::new(RecordingHandler {
            label: "surviving",
            log: log.clone(),
            fail: false,
        }),
    );

    let store = Arc::new(InMemoryAppointments::with([appointment]));
    let service = AppointmentCancellationService::new(
        Arc::clone(&store) as Arc<dyn AppointmentRepository>,
        Arc::new(InMemoryClients::with([client])),
        Arc::new(InMemoryProfessionals::with([professional])),
        Arc::new(InMemoryCancellationPolicies::with([policy])),
        Arc::new(WaivedCancellationFees),
        Arc::new(dispatcher),
    );

    let cancelled = service.cancel_appointment(request.clone()).await.unwrap();
    assert_eq!(cancelled.status(), AppointmentStatus::Cancelled);

    // The failing handler ran, the next one still ran, and the committed
    // transition stayed committed.
    assert_eq!(*log.lock().unwrap(), vec!["failing", "surviving"]);
    let stored = store
        .find_by_id(request.appointment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), AppointmentStatus::Cancelled);
}
