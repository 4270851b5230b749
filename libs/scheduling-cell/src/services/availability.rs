// libs/scheduling-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Timelike};
use tracing::debug;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{day_of_week_index, DailyDensity, DensityStatus};
use crate::services::allocator::slot_capacity;
use crate::services::catalog::ScheduleCatalog;
use crate::store::SchedulingStore;

/// Read-only occupancy aggregation for calendar and density views. Totals are
/// capacity-weighted: a day's denominator is the sum over templates of
/// slot count x per-slot capacity, and the numerator sums booked counts over
/// the slot rows that already exist for that date.
pub struct AvailabilityAggregator {
    catalog: Arc<ScheduleCatalog>,
    store: Arc<dyn SchedulingStore>,
    max_range_days: i64,
}

impl AvailabilityAggregator {
    pub fn new(
        catalog: Arc<ScheduleCatalog>,
        store: Arc<dyn SchedulingStore>,
        max_range_days: i64,
    ) -> Self {
        Self {
            catalog,
            store,
            max_range_days,
        }
    }

    pub async fn daily_density(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DailyDensity>, SchedulingError> {
        let day_of_week = day_of_week_index(date);
        let templates = self.catalog.templates_for(doctor_id, day_of_week).await?;
        if templates.is_empty() {
            return Ok(None);
        }

        let mut total: i64 = 0;
        let mut morning_total: i64 = 0;
        let mut afternoon_total: i64 = 0;

        for template in &templates {
            let slots_in_range = template.span_minutes() / template.visit_duration_minutes as i64;
            let per_slot = slot_capacity(template) as i64;
            let template_total = slots_in_range * per_slot;

            total += template_total;
            if template.start_time.hour() < 12 {
                morning_total += template_total;
            } else {
                afternoon_total += template_total;
            }
        }

        let mut booked: i64 = 0;
        let mut morning_booked: i64 = 0;
        let mut afternoon_booked: i64 = 0;

        for slot in self.store.slots_for_date(doctor_id, date).await? {
            booked += slot.booked_count as i64;
            if slot.start_time.hour() < 12 {
                morning_booked += slot.booked_count as i64;
            } else {
                afternoon_booked += slot.booked_count as i64;
            }
        }

        let percent_booked = percent(booked, total);
        debug!(
            "Density for doctor {} on {}: {}/{} booked ({}%)",
            doctor_id, date, booked, total, percent_booked
        );

        Ok(Some(DailyDensity {
            date,
            status: DensityStatus::classify(percent_booked),
            total_slots: total,
            available_slots: (total - booked).max(0),
            morning_status: DensityStatus::classify(percent(morning_booked, morning_total)),
            afternoon_status: DensityStatus::classify(percent(afternoon_booked, afternoon_total)),
            percent_booked,
        }))
    }

    /// Per-day densities over an inclusive date range, capped to bound the
    /// computation cost. Days the doctor does not work are omitted.
    pub async fn range_density(
        &self,
        doctor_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyDensity>, SchedulingError> {
        if end_date < start_date {
            return Ok(Vec::new());
        }

        let days = (end_date - start_date).num_days();
        if days > self.max_range_days {
            return Err(SchedulingError::RangeTooLarge {
                days,
                max_days: self.max_range_days,
            });
        }

        let mut results = Vec::new();
        let mut current = start_date;
        while current <= end_date {
            if let Some(density) = self.daily_density(doctor_id, current).await? {
                results.push(density);
            }
            current += Duration::days(1);
        }
        Ok(results)
    }
}

fn percent(booked: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = booked as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}
