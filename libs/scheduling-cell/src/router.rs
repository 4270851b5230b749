// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::services::SchedulingState;

pub fn scheduling_routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        // Appointment lifecycle
        .route(
            "/appointments",
            post(handlers::book_appointment).get(handlers::search_appointments),
        )
        .route("/appointments/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/appointments/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .route(
            "/appointments/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .route(
            "/appointments/{appointment_id}/status",
            post(handlers::update_appointment_status),
        )
        // Dashboard statistics
        .route(
            "/appointments/stats/patients/{patient_id}",
            get(handlers::patient_stats),
        )
        .route(
            "/appointments/stats/doctors/{doctor_id}",
            get(handlers::doctor_stats),
        )
        // Slots and density views
        .route("/slots", get(handlers::available_slots))
        .route("/availability/daily", get(handlers::daily_availability))
        // Work template surface for the doctor-management collaborator
        .route(
            "/schedules",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .with_state(state)
}
