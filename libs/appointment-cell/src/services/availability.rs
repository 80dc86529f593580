// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use professional_cell::models::ScheduleConfiguration;
use professional_cell::repository::ScheduleConfigurationRepository;

use crate::models::{AvailableSlot, SchedulingError};
use crate::repository::AppointmentRepository;
use crate::services::conflict::windows_overlap;

/// Computes open slots for a professional over a date range. The walk is a
/// pure recomputation over the configuration and the appointments fetched per
/// day; nothing is cached between calls.
pub struct SlotAvailabilityService {
    appointments: Arc<dyn AppointmentRepository>,
    configurations: Arc<dyn ScheduleConfigurationRepository>,
}

impl SlotAvailabilityService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        configurations: Arc<dyn ScheduleConfigurationRepository>,
    ) -> Self {
        Self {
            appointments,
            configurations,
        }
    }

    pub async fn available_slots(
        &self,
        professional_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        let configuration = self
            .configurations
            .find_by_professional_id(professional_id)
            .await?
            .ok_or(SchedulingError::ScheduleConfigurationNotFound)?;

        self.slots_for_configuration(&configuration, professional_id, range_start, range_end)
            .await
    }

    /// Day granularity is the UTC calendar, whatever the caller's local time.
    pub async fn slots_for_configuration(
        &self,
        configuration: &ScheduleConfiguration,
        professional_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        debug!(
            "Computing available slots for professional {} between {} and {}",
            professional_id, range_start, range_end
        );

        let session = Duration::minutes(configuration.session_duration_minutes);
        let buffer = Duration::minutes(configuration.buffer_interval_minutes);

        let mut slots = Vec::new();
        let mut day = range_start.date_naive();
        let last_day = range_end.date_naive();

        while day <= last_day {
            let weekday_number = day.weekday().num_days_from_sunday() as u8;
            if configuration.works_on(weekday_number) && !configuration.is_holiday(day) {
                let work_start = day.and_time(configuration.working_hours.start).and_utc();
                // Never offer a slot past the requested range, even when the
                // working window would extend further on the final day.
                let work_end = day
                    .and_time(configuration.working_hours.end)
                    .and_utc()
                    .min(range_end);

                // One batch fetch per day, not per slot.
                let booked = self
                    .appointments
                    .find_overlapping(professional_id, work_start, work_end)
                    .await?;
                let busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = booked
                    .iter()
                    .filter(|appointment| appointment.status().occupies_calendar())
                    .map(|appointment| {
                        (
                            appointment.effective_start_date_time(),
                            appointment.effective_end_date_time(),
                        )
                    })
                    .collect();

                let mut cursor = work_start;
                loop {
                    let slot_end = cursor + session;
                    if slot_end > work_end {
                        break;
                    }
                    let blocked = busy
                        .iter()
                        .any(|(start, end)| windows_overlap(cursor, slot_end, *start, *end));
                    if blocked {
                        cursor += session;
                    } else {
                        slots.push(AvailableSlot {
                            start_date: cursor,
                            end_date: slot_end,
                        });
                        cursor = slot_end + buffer;
                    }
                }
            }

            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        debug!(
            "Found {} available slots for professional {}",
            slots.len(),
            professional_id
        );
        Ok(slots)
    }
}
