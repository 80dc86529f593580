pub mod cancellation_policy;
pub mod schedule_config;

pub use cancellation_policy::CancellationPolicyService;
pub use schedule_config::ScheduleConfigurationService;
