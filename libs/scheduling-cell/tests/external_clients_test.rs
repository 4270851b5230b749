// libs/scheduling-cell/tests/external_clients_test.rs
//
// Wiremock-backed coverage of the outbound collaborators: the fire-and-forget
// notifier and the best-effort identity directory.
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::models::{
    day_of_week_index, AppointmentPriority, BookAppointmentRequest, CreateWorkTemplateRequest,
};
use scheduling_cell::services::directory::{DirectoryAnswer, DirectoryClient};
use scheduling_cell::services::notify::NotificationClient;
use scheduling_cell::services::SchedulingState;
use scheduling_cell::store::SchedulingStore;
use scheduling_cell::SchedulingError;
use shared_config::AppConfig;

fn config_with(notification_url: Option<String>, user_url: Option<String>) -> AppConfig {
    AppConfig {
        notification_service_url: notification_url,
        user_service_url: user_url,
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn notifier_posts_the_expected_payload() {
    let mock_server = MockServer::start().await;
    let recipient = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/notify/send"))
        .and(body_partial_json(json!({
            "recipient_id": recipient,
            "notification_type": "SYSTEM"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_with(Some(format!("{}/api/notify/send", mock_server.uri())), None);
    let client = NotificationClient::new(&config);
    client.send(recipient, "Your appointment has been booked").await;
}

#[tokio::test]
async fn notifier_swallows_server_failures() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = config_with(Some(format!("{}/api/notify/send", mock_server.uri())), None);
    let client = NotificationClient::new(&config);
    // Only the log line changes; the call itself must not fail
    client.send(Uuid::new_v4(), "unreachable").await;
}

#[tokio::test]
async fn notifier_is_silent_when_unconfigured() {
    let client = NotificationClient::new(&AppConfig::default());
    client.send(Uuid::new_v4(), "dropped").await;
}

#[tokio::test]
async fn directory_distinguishes_absent_from_unreachable() {
    let mock_server = MockServer::start().await;
    let known = Uuid::new_v4();
    let unknown = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/users/{}", known)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": known,
            "first_name": "An",
            "last_name": "Tran"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/users/{}", unknown)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = config_with(None, Some(mock_server.uri()));
    let client = DirectoryClient::new(&config);

    assert_matches!(client.lookup(known).await, Some(DirectoryAnswer::Exists(_)));
    assert_matches!(client.lookup(unknown).await, Some(DirectoryAnswer::Absent));
    assert_eq!(client.display_name(known).await.as_deref(), Some("An Tran"));

    // Unconfigured directory cannot answer
    let silent = DirectoryClient::new(&AppConfig::default());
    assert!(silent.lookup(known).await.is_none());
}

#[tokio::test]
async fn booking_rejects_a_definitively_unknown_patient() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = config_with(None, Some(mock_server.uri()));
    let state = Arc::new(SchedulingState::new(&config));

    let doctor_id = Uuid::new_v4();
    let date = (Utc::now() + Duration::days(3)).date_naive();
    state
        .store
        .insert_template(
            CreateWorkTemplateRequest {
                doctor_id,
                day_of_week: day_of_week_index(date),
                start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                visit_duration_minutes: 30,
                max_patients_per_hour: 4,
            }
            .into_template(),
        )
        .await
        .unwrap();

    let result = state
        .ledger
        .book(BookAppointmentRequest {
            patient_id: Uuid::new_v4(),
            doctor_id,
            scheduled_time: date.and_hms_opt(9, 0, 0).unwrap().and_utc(),
            reason: "check-up".to_string(),
            priority: AppointmentPriority::Routine,
            notes: None,
        })
        .await;

    assert_matches!(result, Err(SchedulingError::NotFound(_)));
}

#[tokio::test]
async fn booking_proceeds_when_the_directory_is_unreachable() {
    // Point at a closed port: transport failure, not a definitive answer
    let config = config_with(None, Some("http://127.0.0.1:9".to_string()));
    let state = Arc::new(SchedulingState::new(&config));

    let doctor_id = Uuid::new_v4();
    let date = (Utc::now() + Duration::days(3)).date_naive();
    state
        .store
        .insert_template(
            CreateWorkTemplateRequest {
                doctor_id,
                day_of_week: day_of_week_index(date),
                start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                visit_duration_minutes: 30,
                max_patients_per_hour: 4,
            }
            .into_template(),
        )
        .await
        .unwrap();

    let appointment = state
        .ledger
        .book(BookAppointmentRequest {
            patient_id: Uuid::new_v4(),
            doctor_id,
            scheduled_time: date.and_hms_opt(9, 0, 0).unwrap().and_utc(),
            reason: "check-up".to_string(),
            priority: AppointmentPriority::Routine,
            notes: None,
        })
        .await
        .unwrap();

    assert!(appointment.patient_name.is_none());
}
