// libs/scheduling-cell/src/services/notify.rs
use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

/// Fire-and-forget notification emitter. Delivery failure must never fail or
/// roll back the booking that triggered it, so every outcome short of success
/// is only logged.
pub struct NotificationClient {
    client: Client,
    endpoint: Option<String>,
}

impl NotificationClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.notification_service_url.clone(),
        }
    }

    pub async fn send(&self, recipient_id: Uuid, message: &str) {
        let Some(endpoint) = &self.endpoint else {
            debug!("Notification delivery disabled, skipping message to {}", recipient_id);
            return;
        };

        let payload = json!({
            "recipient_id": recipient_id,
            "message": message,
            "notification_type": "SYSTEM"
        });

        match self
            .client
            .post(endpoint)
            .json(&payload)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("Notification delivered to {}", recipient_id);
            }
            Ok(response) => {
                warn!(
                    "Notification service responded {} for recipient {}",
                    response.status(),
                    recipient_id
                );
            }
            Err(e) => {
                warn!("Could not deliver notification to {}: {}", recipient_id, e);
            }
        }
    }
}
