// libs/scheduling-cell/src/services/allocator.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{day_of_week_index, Slot, WorkTemplate};
use crate::services::catalog::ScheduleCatalog;
use crate::store::SchedulingStore;

/// Derives concrete, date-specific slots from the weekly templates, lazily and
/// idempotently. Slot capacity is fixed at creation; an existing row is always
/// returned unchanged so capacity never shrinks under live bookings.
pub struct SlotAllocator {
    catalog: Arc<ScheduleCatalog>,
    store: Arc<dyn SchedulingStore>,
}

impl SlotAllocator {
    pub fn new(catalog: Arc<ScheduleCatalog>, store: Arc<dyn SchedulingStore>) -> Self {
        Self { catalog, store }
    }

    pub async fn get_or_create_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Slot, SchedulingError> {
        let day_of_week = day_of_week_index(date);
        let template = self
            .catalog
            .template_covering(doctor_id, day_of_week, start_time)
            .await?
            .ok_or(SchedulingError::NoSchedule)?;

        let candidate = Slot {
            id: Uuid::new_v4(),
            doctor_id,
            date,
            start_time,
            end_time: start_time + Duration::minutes(template.visit_duration_minutes as i64),
            capacity: slot_capacity(&template),
            booked_count: 0,
        };

        let slot = self.store.insert_or_fetch_slot(candidate).await?;
        debug!(
            "Slot for doctor {} on {} at {}: {}/{} booked",
            doctor_id, date, start_time, slot.booked_count, slot.capacity
        );
        Ok(slot)
    }

    /// Every slot implied by that date's templates, walking each template's
    /// range in visit-duration steps. Idempotent: re-running creates nothing
    /// new and existing rows keep their counts.
    pub async fn list_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, SchedulingError> {
        let day_of_week = day_of_week_index(date);
        let templates = self.catalog.templates_for(doctor_id, day_of_week).await?;

        let mut slots = Vec::new();
        for template in &templates {
            // Step count, not a time cursor: NaiveTime arithmetic wraps at midnight.
            let steps = template.span_minutes() / template.visit_duration_minutes as i64;
            for i in 0..steps {
                let start = template.start_time
                    + Duration::minutes(i * template.visit_duration_minutes as i64);
                slots.push(self.get_or_create_slot(doctor_id, date, start).await?);
            }
        }
        Ok(slots)
    }
}

/// `max(1, max_patients_per_hour / visits_per_hour)` where a visit longer than
/// an hour still counts as one visit per hour.
pub fn slot_capacity(template: &WorkTemplate) -> i32 {
    let visits_per_hour = (60 / template.visit_duration_minutes.max(1)).max(1);
    (template.max_patients_per_hour / visits_per_hour).max(1)
}
