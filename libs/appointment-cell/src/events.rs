// libs/appointment-cell/src/events.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentEventKind {
    Scheduled,
    Confirmed,
    Cancelled,
}

/// Snapshot of the aggregate at the moment of the transition. Handlers get
/// the effective window, never the raw one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentEvent {
    pub kind: AppointmentEventKind,
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub sync_with_google_calendar: bool,
    pub occurred_at: DateTime<Utc>,
}

#[async_trait]
pub trait AppointmentEventHandler: Send + Sync {
    fn name(&self) -> &str;
    async fn handle(&self, event: &AppointmentEvent) -> anyhow::Result<()>;
}

/// In-process publish/subscribe registry. Built once at startup, handlers
/// registered before the dispatcher is shared, then dispatch runs handlers
/// synchronously and sequentially in registration order.
///
/// Delivery is at-most-once and best-effort: by the time events reach the
/// dispatcher the aggregate write is already committed, so a failing handler
/// is logged and skipped without touching the persisted state or the
/// remaining handlers.
#[derive(Default)]
pub struct AppointmentEventDispatcher {
    handlers: HashMap<AppointmentEventKind, Vec<Arc<dyn AppointmentEventHandler>>>,
}

impl AppointmentEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        kind: AppointmentEventKind,
        handler: Arc<dyn AppointmentEventHandler>,
    ) {
        debug!("Registering handler '{}' for {:?} events", handler.name(), kind);
        self.handlers.entry(kind).or_default().push(handler);
    }

    pub async fn dispatch(&self, events: &[AppointmentEvent]) {
        for event in events {
            let Some(handlers) = self.handlers.get(&event.kind) else {
                continue;
            };
            for handler in handlers {
                if let Err(error) = handler.handle(event).await {
                    warn!(
                        "Event handler '{}' failed for {:?} event on appointment {}: {:#}",
                        handler.name(),
                        event.kind,
                        event.appointment_id,
                        error
                    );
                }
            }
        }
    }
}
