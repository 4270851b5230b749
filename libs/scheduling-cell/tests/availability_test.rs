// libs/scheduling-cell/tests/availability_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    day_of_week_index, AppointmentPriority, BookAppointmentRequest, CreateWorkTemplateRequest,
    DensityStatus,
};
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

fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour, minute, 0).unwrap().and_utc()
}

async fn seed_template(
    state: &SchedulingState,
    doctor_id: Uuid,
    date: NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
    visit_duration_minutes: i32,
    max_patients_per_hour: i32,
) {
    let request = CreateWorkTemplateRequest {
        doctor_id,
        day_of_week: day_of_week_index(date),
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        visit_duration_minutes,
        max_patients_per_hour,
    };
    state
        .store
        .insert_template(request.into_template())
        .await
        .unwrap();
}

async fn book(state: &SchedulingState, doctor_id: Uuid, scheduled_time: DateTime<Utc>) {
    state
        .ledger
        .book(BookAppointmentRequest {
            patient_id: Uuid::new_v4(),
            doctor_id,
            scheduled_time,
            reason: "check-up".to_string(),
            priority: AppointmentPriority::Routine,
            notes: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_day_is_vacant() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, (8, 0), (12, 0), 30, 4).await;

    let density = state
        .aggregator
        .daily_density(doctor_id, date)
        .await
        .unwrap()
        .unwrap();

    // 8 slots of 30 minutes, 2 patients per slot
    assert_eq!(density.total_slots, 16);
    assert_eq!(density.available_slots, 16);
    assert_eq!(density.percent_booked, 0.0);
    assert_eq!(density.status, DensityStatus::Vacant);
}

#[tokio::test]
async fn fully_booking_six_of_eight_slots_reads_busy() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, (8, 0), (12, 0), 30, 4).await;

    // 6 slots to their capacity of 2: 12 of 16 reservations taken
    for slot_index in 0..6 {
        let minutes = slot_index * 30;
        let time = at(date, 8 + minutes / 60, minutes % 60);
        book(&state, doctor_id, time).await;
        book(&state, doctor_id, time).await;
    }

    let density = state
        .aggregator
        .daily_density(doctor_id, date)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(density.total_slots, 16);
    assert_eq!(density.available_slots, 4);
    assert_eq!(density.percent_booked, 75.0);
    assert_eq!(density.status, DensityStatus::Busy);
    assert_eq!(density.morning_status, DensityStatus::Busy);
    assert_eq!(density.afternoon_status, DensityStatus::Vacant);
}

#[tokio::test]
async fn moderate_band_starts_at_thirty_percent() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, (8, 0), (12, 0), 30, 4).await;

    // 5 of 16 reservations -> 31.3%
    for slot_index in 0..5 {
        let minutes = slot_index * 30;
        book(&state, doctor_id, at(date, 8 + minutes / 60, minutes % 60)).await;
    }

    let density = state
        .aggregator
        .daily_density(doctor_id, date)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(density.percent_booked, 31.3);
    assert_eq!(density.status, DensityStatus::Moderate);
}

#[tokio::test]
async fn morning_and_afternoon_are_classified_independently() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, (8, 0), (12, 0), 30, 4).await;
    // 2 patients/hour at 30-minute visits -> capacity 1, 8 afternoon slots
    seed_template(&state, doctor_id, date, (13, 0), (17, 0), 30, 2).await;

    for slot_index in 0..8 {
        let minutes = slot_index * 30;
        book(&state, doctor_id, at(date, 13 + minutes / 60, minutes % 60)).await;
    }

    let density = state
        .aggregator
        .daily_density(doctor_id, date)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(density.total_slots, 24);
    assert_eq!(density.morning_status, DensityStatus::Vacant);
    assert_eq!(density.afternoon_status, DensityStatus::Busy);
    // 8 of 24 overall
    assert_eq!(density.status, DensityStatus::Moderate);
}

#[tokio::test]
async fn non_working_days_are_omitted_from_the_range() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, (8, 0), (12, 0), 30, 4).await;

    let results = state
        .aggregator
        .range_density(doctor_id, future_date(1), future_date(6))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].date, date);
}

#[tokio::test]
async fn range_is_capped() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();

    let start = future_date(0);
    let result = state
        .aggregator
        .range_density(doctor_id, start, start + Duration::days(61))
        .await;

    assert_matches!(
        result,
        Err(SchedulingError::RangeTooLarge {
            days: 61,
            max_days: 60
        })
    );

    // 60 days inclusive is still allowed
    let result = state
        .aggregator
        .range_density(doctor_id, start, start + Duration::days(60))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn density_counts_only_reservations_not_slot_rows() {
    let state = test_state();
    let doctor_id = Uuid::new_v4();
    let date = future_date(3);
    seed_template(&state, doctor_id, date, (8, 0), (12, 0), 30, 4).await;

    // Materializing slot rows without booking must not move the needle
    state.allocator.list_slots(doctor_id, date).await.unwrap();

    let density = state
        .aggregator
        .daily_density(doctor_id, date)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(density.percent_booked, 0.0);
    assert_eq!(density.status, DensityStatus::Vacant);
}
