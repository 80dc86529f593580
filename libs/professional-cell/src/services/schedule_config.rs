// libs/professional-cell/src/services/schedule_config.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::professional::ProfessionalRepository;

use crate::models::{
    normalize_holidays, normalize_working_days, ConfigurationError,
    CreateScheduleConfigurationRequest, ScheduleConfiguration,
    UpdateScheduleConfigurationRequest, WorkingHours,
};
use crate::repository::ScheduleConfigurationRepository;

pub struct ScheduleConfigurationService {
    professionals: Arc<dyn ProfessionalRepository>,
    configurations: Arc<dyn ScheduleConfigurationRepository>,
}

impl ScheduleConfigurationService {
    pub fn new(
        professionals: Arc<dyn ProfessionalRepository>,
        configurations: Arc<dyn ScheduleConfigurationRepository>,
    ) -> Self {
        Self {
            professionals,
            configurations,
        }
    }

    /// Creates the professional's one schedule configuration. A second
    /// creation for the same professional is a conflict.
    pub async fn create_configuration(
        &self,
        professional_id: Uuid,
        request: CreateScheduleConfigurationRequest,
    ) -> Result<ScheduleConfiguration, ConfigurationError> {
        debug!("Creating schedule configuration for professional {}", professional_id);

        self.professionals
            .find_by_id(professional_id)
            .await?
            .ok_or(ConfigurationError::ProfessionalNotFound)?;

        if self
            .configurations
            .find_by_professional_id(professional_id)
            .await?
            .is_some()
        {
            return Err(ConfigurationError::ScheduleConfigurationExists);
        }

        let working_hours =
            WorkingHours::parse(&request.working_hours_start, &request.working_hours_end)?;
        let configuration = ScheduleConfiguration::new(
            professional_id,
            request.working_days,
            working_hours,
            request.session_duration_minutes,
            request.buffer_interval_minutes,
            request.holidays,
            request.enable_google_meet,
            request.sync_with_google_calendar,
        )?;

        self.configurations.create(&configuration).await?;

        info!(
            "Schedule configuration {} created for professional {}",
            configuration.id, professional_id
        );
        Ok(configuration)
    }

    pub async fn update_configuration(
        &self,
        professional_id: Uuid,
        request: UpdateScheduleConfigurationRequest,
    ) -> Result<ScheduleConfiguration, ConfigurationError> {
        debug!("Updating schedule configuration for professional {}", professional_id);

        let mut configuration = self
            .configurations
            .find_by_professional_id(professional_id)
            .await?
            .ok_or(ConfigurationError::ScheduleConfigurationNotFound)?;

        if let Some(days) = request.working_days {
            configuration.working_days = normalize_working_days(days);
        }
        if request.working_hours_start.is_some() || request.working_hours_end.is_some() {
            let start = match &request.working_hours_start {
                Some(raw) => raw.clone(),
                None => configuration.working_hours.start.format("%H:%M").to_string(),
            };
            let end = match &request.working_hours_end {
                Some(raw) => raw.clone(),
                None => configuration.working_hours.end.format("%H:%M").to_string(),
            };
            configuration.working_hours = WorkingHours::parse(&start, &end)?;
        }
        if let Some(minutes) = request.session_duration_minutes {
            configuration.session_duration_minutes = minutes;
        }
        if let Some(minutes) = request.buffer_interval_minutes {
            configuration.buffer_interval_minutes = minutes;
        }
        if let Some(holidays) = request.holidays {
            configuration.holidays = normalize_holidays(holidays);
        }
        if let Some(enabled) = request.enable_google_meet {
            configuration.enable_google_meet = enabled;
        }
        if let Some(enabled) = request.sync_with_google_calendar {
            configuration.sync_with_google_calendar = enabled;
        }

        configuration.validate()?;
        configuration.updated_at = Utc::now();

        self.configurations.save(&configuration).await?;

        info!(
            "Schedule configuration {} updated for professional {}",
            configuration.id, professional_id
        );
        Ok(configuration)
    }
}
