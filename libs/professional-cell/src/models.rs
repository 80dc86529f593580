// libs/professional-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// SCHEDULE CONFIGURATION
// ==============================================================================

/// Daily working window, parsed from `HH:MM` wall-clock strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingHours {
    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleValidationError> {
        let start = parse_wall_clock(start)?;
        let end = parse_wall_clock(end)?;
        if start >= end {
            return Err(ScheduleValidationError::InvertedWorkingHours);
        }
        Ok(Self { start, end })
    }
}

fn parse_wall_clock(raw: &str) -> Result<NaiveTime, ScheduleValidationError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| ScheduleValidationError::InvalidTimeFormat(raw.to_string()))
}

/// Per-professional scheduling policy: which days and hours are bookable,
/// how long a session runs and how much recovery time follows it.
///
/// One-to-one with the professional; created once, edited afterwards, never
/// deleted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfiguration {
    pub id: Uuid,
    pub professional_id: Uuid,
    /// Weekday numbers, 0 = Sunday through 6 = Saturday, deduplicated and sorted.
    pub working_days: Vec<u8>,
    pub working_hours: WorkingHours,
    pub session_duration_minutes: i64,
    pub buffer_interval_minutes: i64,
    pub holidays: Vec<NaiveDate>,
    pub enable_google_meet: bool,
    pub sync_with_google_calendar: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const MAX_SESSION_DURATION_MINUTES: i64 = 480;
pub const MAX_BUFFER_INTERVAL_MINUTES: i64 = 120;

impl ScheduleConfiguration {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        professional_id: Uuid,
        working_days: Vec<u8>,
        working_hours: WorkingHours,
        session_duration_minutes: i64,
        buffer_interval_minutes: i64,
        holidays: Vec<NaiveDate>,
        enable_google_meet: bool,
        sync_with_google_calendar: bool,
    ) -> Result<Self, ScheduleValidationError> {
        let now = Utc::now();
        let configuration = Self {
            id: Uuid::new_v4(),
            professional_id,
            working_days: normalize_working_days(working_days),
            working_hours,
            session_duration_minutes,
            buffer_interval_minutes,
            holidays: normalize_holidays(holidays),
            enable_google_meet,
            sync_with_google_calendar,
            created_at: now,
            updated_at: now,
        };
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        if self.working_days.is_empty() {
            return Err(ScheduleValidationError::NoWorkingDays);
        }
        if let Some(day) = self.working_days.iter().find(|day| **day > 6) {
            return Err(ScheduleValidationError::InvalidWeekday(*day));
        }
        if self.working_hours.start >= self.working_hours.end {
            return Err(ScheduleValidationError::InvertedWorkingHours);
        }
        if self.session_duration_minutes <= 0
            || self.session_duration_minutes > MAX_SESSION_DURATION_MINUTES
        {
            return Err(ScheduleValidationError::SessionDurationOutOfRange(
                self.session_duration_minutes,
            ));
        }
        if self.buffer_interval_minutes < 0
            || self.buffer_interval_minutes > MAX_BUFFER_INTERVAL_MINUTES
        {
            return Err(ScheduleValidationError::BufferIntervalOutOfRange(
                self.buffer_interval_minutes,
            ));
        }
        Ok(())
    }

    pub fn works_on(&self, weekday_number: u8) -> bool {
        self.working_days.contains(&weekday_number)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.binary_search(&date).is_ok()
    }
}

pub fn normalize_working_days(days: Vec<u8>) -> Vec<u8> {
    let mut days = days;
    days.sort_unstable();
    days.dedup();
    days
}

pub fn normalize_holidays(holidays: Vec<NaiveDate>) -> Vec<NaiveDate> {
    let mut holidays = holidays;
    holidays.sort_unstable();
    holidays.dedup();
    holidays
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleValidationError {
    #[error("working hours must use the HH:MM format, got '{0}'")]
    InvalidTimeFormat(String),

    #[error("working hours must start before they end")]
    InvertedWorkingHours,

    #[error("session duration must be between 1 and 480 minutes, got {0}")]
    SessionDurationOutOfRange(i64),

    #[error("buffer interval must be between 0 and 120 minutes, got {0}")]
    BufferIntervalOutOfRange(i64),

    #[error("at least one working day is required")]
    NoWorkingDays,

    #[error("weekday {0} is outside the 0 (Sunday) to 6 (Saturday) range")]
    InvalidWeekday(u8),
}

// ==============================================================================
// CANCELLATION POLICY
// ==============================================================================

pub const MIN_CANCELLATION_NOTICE_HOURS: i64 = 3;

/// Per-professional cancellation rules. The notice floor is only enforced at
/// creation; edits may lower it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationPolicy {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub min_hours_before_cancellation: i64,
    pub min_days_before_next_appointment: i64,
    pub cancellation_fee_percentage: f64,
    pub allow_reschedule: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CancellationPolicy {
    pub fn new(
        professional_id: Uuid,
        min_hours_before_cancellation: i64,
        min_days_before_next_appointment: i64,
        cancellation_fee_percentage: f64,
        allow_reschedule: bool,
        description: Option<String>,
    ) -> Result<Self, PolicyValidationError> {
        if min_hours_before_cancellation < MIN_CANCELLATION_NOTICE_HOURS {
            return Err(PolicyValidationError::NoticeBelowFloor(
                min_hours_before_cancellation,
            ));
        }
        let now = Utc::now();
        let policy = Self {
            id: Uuid::new_v4(),
            professional_id,
            min_hours_before_cancellation,
            min_days_before_next_appointment,
            cancellation_fee_percentage,
            allow_reschedule,
            description,
            created_at: now,
            updated_at: now,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Invariants that hold for the whole lifetime of the policy. The creation
    /// notice floor is checked separately in `new`.
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.min_hours_before_cancellation < 0 {
            return Err(PolicyValidationError::NegativeNoticeHours(
                self.min_hours_before_cancellation,
            ));
        }
        if self.min_days_before_next_appointment < 0 {
            return Err(PolicyValidationError::NegativeDayGap(
                self.min_days_before_next_appointment,
            ));
        }
        if self.cancellation_fee_percentage < 0.0 {
            return Err(PolicyValidationError::NegativeFee(
                self.cancellation_fee_percentage,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyValidationError {
    #[error("cancellation notice must be at least {MIN_CANCELLATION_NOTICE_HOURS} hours at creation, got {0}")]
    NoticeBelowFloor(i64),

    #[error("cancellation notice hours cannot be negative, got {0}")]
    NegativeNoticeHours(i64),

    #[error("day gap before the next appointment cannot be negative, got {0}")]
    NegativeDayGap(i64),

    #[error("cancellation fee percentage cannot be negative, got {0}")]
    NegativeFee(f64),
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleConfigurationRequest {
    pub working_days: Vec<u8>,
    pub working_hours_start: String,
    pub working_hours_end: String,
    pub session_duration_minutes: i64,
    pub buffer_interval_minutes: i64,
    pub holidays: Vec<NaiveDate>,
    pub enable_google_meet: bool,
    pub sync_with_google_calendar: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleConfigurationRequest {
    pub working_days: Option<Vec<u8>>,
    pub working_hours_start: Option<String>,
    pub working_hours_end: Option<String>,
    pub session_duration_minutes: Option<i64>,
    pub buffer_interval_minutes: Option<i64>,
    pub holidays: Option<Vec<NaiveDate>>,
    pub enable_google_meet: Option<bool>,
    pub sync_with_google_calendar: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCancellationPolicyRequest {
    pub min_hours_before_cancellation: i64,
    pub min_days_before_next_appointment: i64,
    pub cancellation_fee_percentage: f64,
    pub allow_reschedule: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCancellationPolicyRequest {
    pub min_hours_before_cancellation: Option<i64>,
    pub min_days_before_next_appointment: Option<i64>,
    pub cancellation_fee_percentage: Option<f64>,
    pub allow_reschedule: Option<bool>,
    pub description: Option<String>,
}

// ==============================================================================
// CELL ERROR
// ==============================================================================

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Schedule configuration not found")]
    ScheduleConfigurationNotFound,

    #[error("Cancellation policy not found")]
    CancellationPolicyNotFound,

    #[error("Professional already has a schedule configuration")]
    ScheduleConfigurationExists,

    #[error("Professional already has a cancellation policy")]
    CancellationPolicyExists,

    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleValidationError),

    #[error(transparent)]
    InvalidPolicy(#[from] PolicyValidationError),

    #[error("Database error: {0}")]
    Storage(String),
}

impl From<shared_models::repository::RepositoryError> for ConfigurationError {
    fn from(error: shared_models::repository::RepositoryError) -> Self {
        ConfigurationError::Storage(error.to_string())
    }
}

impl From<ConfigurationError> for shared_models::error::AppError {
    fn from(error: ConfigurationError) -> Self {
        use shared_models::error::AppError;
        let message = error.to_string();
        match error {
            ConfigurationError::ProfessionalNotFound
            | ConfigurationError::ScheduleConfigurationNotFound
            | ConfigurationError::CancellationPolicyNotFound => AppError::NotFound(message),
            ConfigurationError::ScheduleConfigurationExists
            | ConfigurationError::CancellationPolicyExists => AppError::Conflict(message),
            ConfigurationError::InvalidSchedule(_) | ConfigurationError::InvalidPolicy(_) => {
                AppError::ValidationError(message)
            }
            ConfigurationError::Storage(_) => AppError::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_hours() -> WorkingHours {
        WorkingHours::parse("09:00", "17:00").unwrap()
    }

    #[test]
    fn working_hours_reject_bad_format() {
        assert_matches!(
            WorkingHours::parse("9am", "17:00"),
            Err(ScheduleValidationError::InvalidTimeFormat(raw)) if raw == "9am"
        );
    }

    #[test]
    fn working_hours_reject_inverted_range() {
        assert_matches!(
            WorkingHours::parse("18:00", "09:00"),
            Err(ScheduleValidationError::InvertedWorkingHours)
        );
        assert_matches!(
            WorkingHours::parse("09:00", "09:00"),
            Err(ScheduleValidationError::InvertedWorkingHours)
        );
    }

    #[test]
    fn configuration_collapses_duplicate_days() {
        let configuration = ScheduleConfiguration::new(
            Uuid::new_v4(),
            vec![5, 1, 3, 1, 5],
            sample_hours(),
            60,
            10,
            vec![],
            false,
            false,
        )
        .unwrap();
        assert_eq!(configuration.working_days, vec![1, 3, 5]);
    }

    #[test]
    fn configuration_requires_a_working_day() {
        let result = ScheduleConfiguration::new(
            Uuid::new_v4(),
            vec![],
            sample_hours(),
            60,
            10,
            vec![],
            false,
            false,
        );
        assert_matches!(result, Err(ScheduleValidationError::NoWorkingDays));
    }

    #[test]
    fn configuration_rejects_weekday_above_saturday() {
        let result = ScheduleConfiguration::new(
            Uuid::new_v4(),
            vec![1, 7],
            sample_hours(),
            60,
            10,
            vec![],
            false,
            false,
        );
        assert_matches!(result, Err(ScheduleValidationError::InvalidWeekday(7)));
    }

    #[test]
    fn configuration_bounds_session_duration() {
        for minutes in [0, -30, 481] {
            let result = ScheduleConfiguration::new(
                Uuid::new_v4(),
                vec![1],
                sample_hours(),
                minutes,
                10,
                vec![],
                false,
                false,
            );
            assert_matches!(
                result,
                Err(ScheduleValidationError::SessionDurationOutOfRange(_))
            );
        }
    }

    #[test]
    fn configuration_bounds_buffer_interval() {
        for minutes in [-1, 121] {
            let result = ScheduleConfiguration::new(
                Uuid::new_v4(),
                vec![1],
                sample_hours(),
                60,
                minutes,
                vec![],
                false,
                false,
            );
            assert_matches!(
                result,
                Err(ScheduleValidationError::BufferIntervalOutOfRange(_))
            );
        }
    }

    #[test]
    fn holiday_lookup_is_calendar_day_based() {
        let holiday = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let configuration = ScheduleConfiguration::new(
            Uuid::new_v4(),
            vec![1, 2, 3, 4, 5],
            sample_hours(),
            60,
            10,
            vec![holiday],
            false,
            false,
        )
        .unwrap();
        assert!(configuration.is_holiday(holiday));
        assert!(!configuration.is_holiday(holiday.succ_opt().unwrap()));
    }

    #[test]
    fn policy_enforces_notice_floor_at_creation() {
        let result = CancellationPolicy::new(Uuid::new_v4(), 2, 1, 0.0, true, None);
        assert_matches!(result, Err(PolicyValidationError::NoticeBelowFloor(2)));

        let policy = CancellationPolicy::new(Uuid::new_v4(), 3, 1, 0.0, true, None).unwrap();
        assert_eq!(policy.min_hours_before_cancellation, 3);
    }

    #[test]
    fn policy_rejects_negative_values() {
        assert_matches!(
            CancellationPolicy::new(Uuid::new_v4(), 24, -1, 0.0, true, None),
            Err(PolicyValidationError::NegativeDayGap(-1))
        );
        assert_matches!(
            CancellationPolicy::new(Uuid::new_v4(), 24, 1, -5.0, true, None),
            Err(PolicyValidationError::NegativeFee(_))
        );
    }

    #[test]
    fn edited_policy_may_drop_below_creation_floor() {
        let mut policy = CancellationPolicy::new(Uuid::new_v4(), 24, 1, 0.0, true, None).unwrap();
        policy.min_hours_before_cancellation = 1;
        assert_matches!(policy.validate(), Ok(()));
    }
}
