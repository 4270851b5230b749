use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub notification_service_url: Option<String>,
    pub user_service_url: Option<String>,
    pub booking_granularity_minutes: u32,
    pub density_range_max_days: i64,
    pub reserve_retry_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            notification_service_url: optional_var("NOTIFICATION_SERVICE_URL"),
            user_service_url: optional_var("USER_SERVICE_URL"),
            booking_granularity_minutes: parsed_var("BOOKING_GRANULARITY_MINUTES", 15),
            density_range_max_days: parsed_var("DENSITY_RANGE_MAX_DAYS", 60),
            reserve_retry_attempts: parsed_var("RESERVE_RETRY_ATTEMPTS", 3),
        };

        if !config.has_notifications() {
            warn!("NOTIFICATION_SERVICE_URL not set - booking notifications disabled");
        }
        if !config.has_directory() {
            warn!("USER_SERVICE_URL not set - patient/doctor identity checks disabled");
        }

        config
    }

    pub fn has_notifications(&self) -> bool {
        self.notification_service_url.is_some()
    }

    pub fn has_directory(&self) -> bool {
        self.user_service_url.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notification_service_url: None,
            user_service_url: None,
            booking_granularity_minutes: 15,
            density_range_max_days: 60,
            reserve_retry_attempts: 3,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parsed_var<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}
