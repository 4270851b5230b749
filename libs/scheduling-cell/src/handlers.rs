// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::error::SchedulingError;
use crate::models::{
    AppointmentStatus, BookAppointmentRequest, CreateWorkTemplateRequest, DailyAvailabilityResponse,
    DaySlotsResponse, RescheduleAppointmentRequest, SlotView, UpdateAppointmentStatusRequest,
};
use crate::services::SchedulingState;
use crate::store::SchedulingStore;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQueryParams {
    pub doctor_id: Uuid,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DailyAvailabilityParams {
    pub doctor_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SchedulesQueryParams {
    pub doctor_id: Uuid,
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.ledger.book(request).await.map_err(AppError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .ledger
        .get(appointment_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let appointments = match (params.patient_id, params.doctor_id) {
        (Some(patient_id), _) => state
            .ledger
            .appointments_for_patient(patient_id, params.status, params.date)
            .await
            .map_err(AppError::from)?,
        (None, Some(doctor_id)) => state
            .ledger
            .appointments_for_doctor(doctor_id, params.status, params.date)
            .await
            .map_err(AppError::from)?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "patient_id or doctor_id is required".to_string(),
            ))
        }
    };

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .ledger
        .cancel(appointment_id)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Response, AppError> {
    match state.ledger.reschedule(appointment_id, request.new_time).await {
        Ok(appointment) => Ok(Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment rescheduled successfully"
        }))
        .into_response()),
        // The partial-failure signal carries whether the old reservation is
        // already gone, so the caller can react.
        Err(SchedulingError::RescheduleFailed {
            released_old,
            source,
        }) => Ok((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Reschedule failed",
                "released_old": released_old,
                "reason": source.to_string()
            })),
        )
            .into_response()),
        Err(e) => Err(AppError::from(e)),
    }
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .ledger
        .update_status(appointment_id, request.status)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

// ==============================================================================
// SLOT AND AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn available_slots(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<SlotsQueryParams>,
) -> Result<Json<DaySlotsResponse>, AppError> {
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());

    let slots = state
        .allocator
        .list_slots(params.doctor_id, date)
        .await
        .map_err(AppError::from)?;

    Ok(Json(DaySlotsResponse {
        doctor_id: params.doctor_id,
        date,
        slots: slots.iter().map(SlotView::from_slot).collect(),
    }))
}

#[axum::debug_handler]
pub async fn daily_availability(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<DailyAvailabilityParams>,
) -> Result<Json<DailyAvailabilityResponse>, AppError> {
    let start_date = params.start_date.unwrap_or_else(|| Utc::now().date_naive());
    let end_date = params.end_date.unwrap_or(start_date + Duration::days(30));

    if end_date < start_date {
        return Err(AppError::BadRequest(
            "end_date must not be before start_date".to_string(),
        ));
    }

    let availability = state
        .aggregator
        .range_density(params.doctor_id, start_date, end_date)
        .await
        .map_err(AppError::from)?;

    Ok(Json(DailyAvailabilityResponse {
        doctor_id: params.doctor_id,
        start_date,
        end_date,
        availability,
    }))
}

// ==============================================================================
// SCHEDULE TEMPLATE HANDLERS (doctor-management write surface)
// ==============================================================================

#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<SchedulesQueryParams>,
) -> Result<Json<Value>, AppError> {
    let templates = state
        .store
        .templates_for_doctor(params.doctor_id)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({ "schedules": templates })))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<CreateWorkTemplateRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let template = state
        .store
        .insert_template(request.into_template())
        .await
        .map_err(AppError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "schedule": template
        })),
    ))
}

// ==============================================================================
// DASHBOARD STATISTICS HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn patient_stats(
    State(state): State<Arc<SchedulingState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let stats = state
        .ledger
        .patient_stats(patient_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn doctor_stats(
    State(state): State<Arc<SchedulingState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let stats = state
        .ledger
        .doctor_stats(doctor_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(json!(stats)))
}
