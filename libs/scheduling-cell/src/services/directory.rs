// libs/scheduling-cell/src/services/directory.rs
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

/// Best-effort identity resolver against the external user directory. The
/// directory being unreachable never blocks a booking; only a definitive
/// "this id does not exist" answer is acted on.
pub struct DirectoryClient {
    client: Client,
    base_url: Option<String>,
}

/// Outcome of an existence probe: `None` means the directory could not answer.
#[derive(Debug)]
pub enum DirectoryAnswer {
    Exists(Value),
    Absent,
}

impl DirectoryClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.user_service_url.clone(),
        }
    }

    pub async fn lookup(&self, user_id: Uuid) -> Option<DirectoryAnswer> {
        let base = self.base_url.as_ref()?;
        let url = format!("{}/api/users/{}", base.trim_end_matches('/'), user_id);

        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                Some(DirectoryAnswer::Absent)
            }
            Ok(response) if response.status().is_success() => match response.json::<Value>().await
            {
                Ok(profile) => Some(DirectoryAnswer::Exists(profile)),
                Err(e) => {
                    warn!("Directory returned an unreadable profile for {}: {}", user_id, e);
                    None
                }
            },
            Ok(response) => {
                warn!(
                    "Directory responded {} for user {}, skipping identity check",
                    response.status(),
                    user_id
                );
                None
            }
            Err(e) => {
                debug!("Directory unreachable for user {}: {}", user_id, e);
                None
            }
        }
    }

    /// Human-readable display name, cached onto the appointment when available.
    pub async fn display_name(&self, user_id: Uuid) -> Option<String> {
        match self.lookup(user_id).await? {
            DirectoryAnswer::Absent => None,
            DirectoryAnswer::Exists(profile) => {
                if let Some(full_name) = profile["full_name"].as_str() {
                    if !full_name.is_empty() {
                        return Some(full_name.to_string());
                    }
                }
                let first = profile["first_name"].as_str().unwrap_or("");
                let last = profile["last_name"].as_str().unwrap_or("");
                let combined = format!("{} {}", first, last).trim().to_string();
                if !combined.is_empty() {
                    return Some(combined);
                }
                profile["username"].as_str().map(|u| u.to_string())
            }
        }
    }
}
