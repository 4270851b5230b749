// libs/scheduling-cell/src/store/mod.rs
//
// Storage seam for the scheduling engine. Persistence technology is the
// caller's choice; services only ever see this trait. Every capacity change
// on a slot row goes through `reserve_slot`/`release_slot`, which the
// implementation must execute as a single guarded read-check-write.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{Appointment, AppointmentStatus, Slot, SlotKey, WorkTemplate};

pub mod memory;

pub use memory::MemoryStore;

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    // --- work templates (written by the doctor-management collaborator) ---

    /// Insert a template after validating the write-time invariants:
    /// weekday range, time ordering, positive duration/capacity, uniqueness on
    /// `(doctor_id, day_of_week, start_time)` and no overlap with an active
    /// template for the same doctor and weekday.
    async fn insert_template(
        &self,
        template: WorkTemplate,
    ) -> Result<WorkTemplate, SchedulingError>;

    /// Active templates for one weekday, ordered by start time.
    async fn templates_for(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Result<Vec<WorkTemplate>, SchedulingError>;

    /// All active templates for a doctor, ordered by weekday then start time.
    async fn templates_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<WorkTemplate>, SchedulingError>;

    // --- slots ---

    /// Atomic insert-or-fetch: if a row already exists for the slot's key it is
    /// returned unchanged, otherwise the given row is stored. Concurrent
    /// creators for the same key converge on a single row.
    async fn insert_or_fetch_slot(&self, slot: Slot) -> Result<Slot, SchedulingError>;

    async fn get_slot(&self, key: &SlotKey) -> Result<Option<Slot>, SchedulingError>;

    async fn slots_for_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, SchedulingError>;

    /// Compare-and-increment: bump `booked_count` only while it is below
    /// capacity, otherwise fail with `SlotFull`. Returns the updated row.
    async fn reserve_slot(&self, key: &SlotKey) -> Result<Slot, SchedulingError>;

    /// Decrement `booked_count`, floored at zero. An underflow attempt is
    /// logged as an inconsistency instead of propagating.
    async fn release_slot(&self, key: &SlotKey) -> Result<Slot, SchedulingError>;

    // --- appointments ---

    async fn insert_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, SchedulingError>;

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, SchedulingError>;

    async fn update_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, SchedulingError>;

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, SchedulingError>;

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
        status: Option<AppointmentStatus>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, SchedulingError>;
}
