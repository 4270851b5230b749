// libs/scheduling-cell/tests/allocator_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use scheduling_cell::models::{day_of_week_index, CreateWorkTemplateRequest};
use scheduling_cell::services::SchedulingState;
use scheduling_cell::store::SchedulingStore;
use scheduling_cell::SchedulingError;
use shared_config::AppConfig;

fn test_state() -> Arc<SchedulingState> {
    Arc::new(SchedulingState::new(&AppConfig::default()))
}

fn future_date(days_ahead: i64) -> NaiveDate {
    (Utc::now() + Duration::days(days_ahead)).date_naive()
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

async fn seed_template(
    state: &SchedulingState,
    doctor_id: Uuid,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    visit_duration_minutes: i32,
    max_patients_per_hour: i32,
) {
    let request = CreateWorkTemplateRequest {
        doctor_id,
        day_of_week: day_of_week_index(date),
        start_time: start,
        end_time: end,
        visit_duration_minutes,
        max_patients_per_hour,
    };
    state
        .store
        .insert_template(request.into_template())
        .await
        .unwrap();
}

#[tokio::test]
async fn creates_slot_with_capacity_from_template() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, hm(8, 0), hm(12, 0), 30, 4).await;

    let slot = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(9, 0))
        .await
        .unwrap();

    // 4 patients/hour at two 30-minute visits/hour -> 2 per slot
    assert_eq!(slot.capacity, 2);
    assert_eq!(slot.booked_count, 0);
    assert_eq!(slot.end_time, hm(9, 30));
}

#[tokio::test]
async fn capacity_floors_at_one() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    // 1 patient/hour with 15-minute visits would compute to zero
    seed_template(&state, doctor_id, date, hm(8, 0), hm(10, 0), 15, 1).await;

    let slot = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(8, 15))
        .await
        .unwrap();

    assert_eq!(slot.capacity, 1);
}

#[tokio::test]
async fn slot_derivation_is_idempotent() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, hm(8, 0), hm(12, 0), 30, 4).await;

    let first = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(10, 0))
        .await
        .unwrap();
    let second = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(10, 0))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.capacity, second.capacity);
}

#[tokio::test]
async fn existing_slot_keeps_its_booked_count() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, hm(8, 0), hm(12, 0), 30, 4).await;

    let slot = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(8, 30))
        .await
        .unwrap();
    state.store.reserve_slot(&slot.key()).await.unwrap();

    let refetched = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(8, 30))
        .await
        .unwrap();
    assert_eq!(refetched.id, slot.id);
    assert_eq!(refetched.booked_count, 1);
}

#[tokio::test]
async fn rejects_time_outside_any_template() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, hm(8, 0), hm(12, 0), 30, 4).await;

    let result = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(14, 0))
        .await;
    assert_matches!(result, Err(SchedulingError::NoSchedule));

    // end_time is exclusive
    let result = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(12, 0))
        .await;
    assert_matches!(result, Err(SchedulingError::NoSchedule));
}

#[tokio::test]
async fn lists_every_slot_implied_by_the_days_templates() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, hm(8, 0), hm(12, 0), 30, 4).await;
    seed_template(&state, doctor_id, date, hm(14, 0), hm(16, 0), 20, 3).await;

    let slots = state.allocator.list_slots(doctor_id, date).await.unwrap();

    // 8 morning slots of 30 minutes plus 6 afternoon slots of 20 minutes
    assert_eq!(slots.len(), 14);
    assert_eq!(slots[0].start_time, hm(8, 0));
    assert_eq!(slots[8].start_time, hm(14, 0));

    // Walking the day again creates nothing new
    let again = state.allocator.list_slots(doctor_id, date).await.unwrap();
    assert_eq!(again.len(), 14);
    assert_eq!(again[0].id, slots[0].id);
}

#[tokio::test]
async fn release_is_floored_at_zero() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, hm(8, 0), hm(12, 0), 30, 2).await;

    let slot = state
        .allocator
        .get_or_create_slot(doctor_id, date, hm(8, 0))
        .await
        .unwrap();

    let released = state.store.release_slot(&slot.key()).await.unwrap();
    assert_eq!(released.booked_count, 0);
}

#[tokio::test]
async fn template_write_surface_rejects_overlaps() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, hm(8, 0), hm(12, 0), 30, 4).await;

    let overlapping = CreateWorkTemplateRequest {
        doctor_id,
        day_of_week: day_of_week_index(date),
        start_time: hm(11, 0),
        end_time: hm(13, 0),
        visit_duration_minutes: 30,
        max_patients_per_hour: 4,
    };
    let result = state
        .store
        .insert_template(overlapping.into_template())
        .await;
    assert_matches!(result, Err(SchedulingError::InvalidTemplate(_)));

    let inverted = CreateWorkTemplateRequest {
        doctor_id,
        day_of_week: day_of_week_index(date),
        start_time: hm(15, 0),
        end_time: hm(14, 0),
        visit_duration_minutes: 30,
        max_patients_per_hour: 4,
    };
    let result = state.store.insert_template(inverted.into_template()).await;
    assert_matches!(result, Err(SchedulingError::InvalidTemplate(_)));
}
