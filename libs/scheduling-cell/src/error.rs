use thiserror::Error;

use crate::models::AppointmentStatus;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Requested time is in the past")]
    PastTime,

    #[error("Requested time must start on a {granularity_minutes}-minute boundary")]
    MisalignedTime { granularity_minutes: u32 },

    #[error("Doctor has no working schedule covering this time")]
    NoSchedule,

    #[error("Time slot is fully booked")]
    SlotFull,

    #[error("Date range spans {days} days, maximum is {max_days}")]
    RangeTooLarge { days: i64, max_days: i64 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Scheduling store is contended, retry the request")]
    Contention,

    #[error("Cannot transition appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Invalid schedule template: {0}")]
    InvalidTemplate(String),

    #[error("Inconsistent scheduling state: {0}")]
    InconsistentState(String),

    #[error("Reschedule failed, original reservation already released: {source}")]
    RescheduleFailed {
        released_old: bool,
        #[source]
        source: Box<SchedulingError>,
    },

    #[error("Store error: {0}")]
    Store(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match &err {
            SchedulingError::PastTime
            | SchedulingError::MisalignedTime { .. }
            | SchedulingError::NoSchedule
            | SchedulingError::RangeTooLarge { .. }
            | SchedulingError::InvalidStatusTransition { .. }
            | SchedulingError::InvalidTemplate(_) => AppError::BadRequest(err.to_string()),
            SchedulingError::SlotFull
            | SchedulingError::Contention
            | SchedulingError::RescheduleFailed { .. } => AppError::Conflict(err.to_string()),
            SchedulingError::NotFound(_) => AppError::NotFound(err.to_string()),
            SchedulingError::InconsistentState(_) | SchedulingError::Store(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
