// libs/professional-cell/src/services/cancellation_policy.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::professional::ProfessionalRepository;

use crate::models::{
    CancellationPolicy, ConfigurationError, CreateCancellationPolicyRequest,
    UpdateCancellationPolicyRequest,
};
use crate::repository::CancellationPolicyRepository;

pub struct CancellationPolicyService {
    professionals: Arc<dyn ProfessionalRepository>,
    policies: Arc<dyn CancellationPolicyRepository>,
}

impl CancellationPolicyService {
    pub fn new(
        professionals: Arc<dyn ProfessionalRepository>,
        policies: Arc<dyn CancellationPolicyRepository>,
    ) -> Self {
        Self {
            professionals,
            policies,
        }
    }

    /// Creates the professional's one cancellation policy and records the
    /// association on the professional aggregate.
    pub async fn create_policy(
        &self,
        professional_id: Uuid,
        request: CreateCancellationPolicyRequest,
    ) -> Result<CancellationPolicy, ConfigurationError> {
        debug!("Creating cancellation policy for professional {}", professional_id);

        self.professionals
            .find_by_id(professional_id)
            .await?
            .ok_or(ConfigurationError::ProfessionalNotFound)?;

        if self
            .policies
            .find_by_professional_id(professional_id)
            .await?
            .is_some()
        {
            return Err(ConfigurationError::CancellationPolicyExists);
        }

        let policy = CancellationPolicy::new(
            professional_id,
            request.min_hours_before_cancellation,
            request.min_days_before_next_appointment,
            request.cancellation_fee_percentage,
            request.allow_reschedule,
            request.description,
        )?;

        self.policies.create(&policy).await?;
        self.professionals
            .assign_cancellation_policy(professional_id, policy.id)
            .await?;

        info!(
            "Cancellation policy {} created for professional {}",
            policy.id, professional_id
        );
        Ok(policy)
    }

    /// Edits are free to lower the notice below the creation floor.
    pub async fn update_policy(
        &self,
        professional_id: Uuid,
        request: UpdateCancellationPolicyRequest,
    ) -> Result<CancellationPolicy, ConfigurationError> {
        debug!("Updating cancellation policy for professional {}", professional_id);

        let mut policy = self
            .policies
            .find_by_professional_id(professional_id)
            .await?
            .ok_or(ConfigurationError::CancellationPolicyNotFound)?;

        if let Some(hours) = request.min_hours_before_cancellation {
            policy.min_hours_before_cancellation = hours;
        }
        if let Some(days) = request.min_days_before_next_appointment {
            policy.min_days_before_next_appointment = days;
        }
        if let Some(percentage) = request.cancellation_fee_percentage {
            policy.cancellation_fee_percentage = percentage;
        }
        if let Some(allowed) = request.allow_reschedule {
            policy.allow_reschedule = allowed;
        }
        if let Some(description) = request.description {
            policy.description = Some(description);
        }

        policy.validate()?;
        policy.updated_at = Utc::now();

        self.policies.save(&policy).await?;

        info!(
            "Cancellation policy {} updated for professional {}",
            policy.id, professional_id
        );
        Ok(policy)
    }
}
