use async_trait::async_trait;
use uuid::Uuid;

use shared_models::repository::RepositoryError;

use crate::models::{CancellationPolicy, ScheduleConfiguration};

#[async_trait]
pub trait ScheduleConfigurationRepository: Send + Sync {
    async fn find_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> Result<Option<ScheduleConfiguration>, RepositoryError>;
    async fn create(&self, configuration: &ScheduleConfiguration) -> Result<(), RepositoryError>;
    async fn save(&self, configuration: &ScheduleConfiguration) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CancellationPolicyRepository: Send + Sync {
    async fn find_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> Result<Option<CancellationPolicy>, RepositoryError>;
    async fn create(&self, policy: &CancellationPolicy) -> Result<(), RepositoryError>;
    async fn save(&self, policy: &CancellationPolicy) -> Result<(), RepositoryError>;
}
