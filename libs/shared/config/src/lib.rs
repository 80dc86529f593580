use std::env;
use tracing::warn;

/// System-wide scheduling settings, read once at startup.
///
/// The minimum booking lead time is deliberately independent of the
/// per-professional cancellation-policy values (notice hours, day gap):
/// it is a floor the whole platform enforces on new bookings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub min_booking_lead_hours: i64,
}

const DEFAULT_MIN_BOOKING_LEAD_HOURS: i64 = 3;

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            min_booking_lead_hours: read_i64(
                "MIN_BOOKING_LEAD_HOURS",
                DEFAULT_MIN_BOOKING_LEAD_HOURS,
            ),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_booking_lead_hours: DEFAULT_MIN_BOOKING_LEAD_HOURS,
        }
    }
}

fn read_i64(key: &str, default: i64) -> i64 {
    match env::var(key) {
        Ok(raw) => match raw.parse::<i64>() {
            Ok(value) if value >= 0 => value,
            _ => {
                warn!("{} is not a non-negative integer, using default {}", key, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_floor() {
        let config = AppConfig::default();
        assert_eq!(config.min_booking_lead_hours, 3);
    }
}
