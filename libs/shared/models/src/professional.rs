use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::RepositoryError;

/// A practitioner offering sessions. The engine reads the session price and
/// follows the two policy associations; everything profile-shaped belongs to
/// an external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub session_price: f64,
    pub schedule_configuration_id: Option<Uuid>,
    pub cancellation_policy_id: Option<Uuid>,
    pub notification_settings: NotificationSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub whatsapp_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            whatsapp_enabled: true,
        }
    }
}

impl NotificationSettings {
    pub fn any_enabled(&self) -> bool {
        self.email_enabled || self.whatsapp_enabled
    }
}

#[async_trait]
pub trait ProfessionalRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Professional>, RepositoryError>;
    async fn save(&self, professional: &Professional) -> Result<(), RepositoryError>;

    /// Records the one-to-one policy association on the professional.
    async fn assign_cancellation_policy(
        &self,
        professional_id: Uuid,
        policy_id: Uuid,
    ) -> Result<(), RepositoryError>;
}
