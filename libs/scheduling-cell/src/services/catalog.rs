// libs/scheduling-cell/src/services/catalog.rs
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::WorkTemplate;
use crate::store::SchedulingStore;

/// Read-only lookup surface over the doctors' recurring weekly templates.
/// Template writes belong to the doctor-management collaborator; overlap
/// rejection happens at that write surface, so at most one template can cover
/// any given instant here.
pub struct ScheduleCatalog {
    store: Arc<dyn SchedulingStore>,
}

impl ScheduleCatalog {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Active templates for one weekday, ordered by start time. Empty when the
    /// doctor does not work that day.
    pub async fn templates_for(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Result<Vec<WorkTemplate>, SchedulingError> {
        self.store.templates_for(doctor_id, day_of_week).await
    }

    /// The template whose `[start_time, end_time)` contains `time`, if any.
    pub async fn template_covering(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
        time: chrono::NaiveTime,
    ) -> Result<Option<WorkTemplate>, SchedulingError> {
        let templates = self.store.templates_for(doctor_id, day_of_week).await?;
        let covering = templates.into_iter().find(|t| t.covers(time));
        if covering.is_none() {
            debug!(
                "No template covers doctor {} on weekday {} at {}",
                doctor_id, day_of_week, time
            );
        }
        Ok(covering)
    }
}
