// libs/scheduling-cell/src/services/validator.rs
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{day_of_week_index, Slot};
use crate::services::allocator::SlotAllocator;
use crate::services::catalog::ScheduleCatalog;

/// Validates a candidate booking time without reserving anything. The checks
/// run in a fixed order and the first failure wins; reservation itself is a
/// separate atomic step owned by the ledger, since time may pass between
/// validation and commit.
pub struct BookingValidator {
    catalog: Arc<ScheduleCatalog>,
    allocator: Arc<SlotAllocator>,
    granularity_minutes: u32,
}

impl BookingValidator {
    pub fn new(
        catalog: Arc<ScheduleCatalog>,
        allocator: Arc<SlotAllocator>,
        granularity_minutes: u32,
    ) -> Self {
        Self {
            catalog,
            allocator,
            granularity_minutes: granularity_minutes.max(1),
        }
    }

    pub async fn validate(
        &self,
        doctor_id: Uuid,
        requested_time: DateTime<Utc>,
    ) -> Result<Slot, SchedulingError> {
        if requested_time <= Utc::now() {
            return Err(SchedulingError::PastTime);
        }

        if requested_time.minute() % self.granularity_minutes != 0
            || requested_time.second() != 0
            || requested_time.nanosecond() != 0
        {
            return Err(SchedulingError::MisalignedTime {
                granularity_minutes: self.granularity_minutes,
            });
        }

        let date = requested_time.date_naive();
        let time = requested_time.time();
        let day_of_week = day_of_week_index(date);

        if self
            .catalog
            .template_covering(doctor_id, day_of_week, time)
            .await?
            .is_none()
        {
            return Err(SchedulingError::NoSchedule);
        }

        let slot = self.allocator.get_or_create_slot(doctor_id, date, time).await?;
        if !slot.is_available() {
            debug!(
                "Slot for doctor {} at {} is full ({}/{})",
                doctor_id, requested_time, slot.booked_count, slot.capacity
            );
            return Err(SchedulingError::SlotFull);
        }

        Ok(slot)
    }
}
