// libs/scheduling-cell/src/store/memory.rs
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{Appointment, AppointmentStatus, Slot, SlotKey, WorkTemplate};
use crate::store::SchedulingStore;

/// Bounded attempts to take a row guard before failing fast with `Contention`.
const LOCK_ATTEMPTS: u32 = 64;

/// In-process store. Mutations hold the table guard for the entire
/// read-check-write, so the capacity invariant holds under concurrency; reads
/// take shared guards and run in parallel with each other.
pub struct MemoryStore {
    templates: RwLock<Vec<WorkTemplate>>,
    slots: RwLock<HashMap<SlotKey, Slot>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(Vec::new()),
            slots: RwLock::new(HashMap::new()),
            appointments: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn write_guard<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, SchedulingError> {
    for _ in 0..LOCK_ATTEMPTS {
        match lock.try_write() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::WouldBlock) => std::thread::yield_now(),
            Err(TryLockError::Poisoned(_)) => {
                return Err(SchedulingError::InconsistentState(
                    "store lock poisoned".to_string(),
                ))
            }
        }
    }
    Err(SchedulingError::Contention)
}

fn read_guard<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, SchedulingError> {
    for _ in 0..LOCK_ATTEMPTS {
        match lock.try_read() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::WouldBlock) => std::thread::yield_now(),
            Err(TryLockError::Poisoned(_)) => {
                return Err(SchedulingError::InconsistentState(
                    "store lock poisoned".to_string(),
                ))
            }
        }
    }
    Err(SchedulingError::Contention)
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn insert_template(
        &self,
        template: WorkTemplate,
    ) -> Result<WorkTemplate, SchedulingError> {
        if !(0..=6).contains(&template.day_of_week) {
            return Err(SchedulingError::InvalidTemplate(
                "day_of_week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }
        if template.start_time >= template.end_time {
            return Err(SchedulingError::InvalidTemplate(
                "start_time must be before end_time".to_string(),
            ));
        }
        if template.visit_duration_minutes <= 0 {
            return Err(SchedulingError::InvalidTemplate(
                "visit_duration_minutes must be positive".to_string(),
            ));
        }
        if template.max_patients_per_hour <= 0 {
            return Err(SchedulingError::InvalidTemplate(
                "max_patients_per_hour must be positive".to_string(),
            ));
        }

        let mut templates = write_guard(&self.templates)?;

        for existing in templates.iter().filter(|t| {
            t.is_active
                && t.doctor_id == template.doctor_id
                && t.day_of_week == template.day_of_week
        }) {
            if existing.start_time == template.start_time {
                return Err(SchedulingError::InvalidTemplate(
                    "a template already exists for this doctor, weekday and start time"
                        .to_string(),
                ));
            }
            if template.start_time < existing.end_time && template.end_time > existing.start_time {
                return Err(SchedulingError::InvalidTemplate(
                    "template overlaps an existing schedule for this weekday".to_string(),
                ));
            }
        }

        debug!(
            "Registered work template for doctor {} on weekday {} ({} - {})",
            template.doctor_id, template.day_of_week, template.start_time, template.end_time
        );
        templates.push(template.clone());
        Ok(template)
    }

    async fn templates_for(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Result<Vec<WorkTemplate>, SchedulingError> {
        let templates = read_guard(&self.templates)?;
        let mut matching: Vec<WorkTemplate> = templates
            .iter()
            .filter(|t| t.is_active && t.doctor_id == doctor_id && t.day_of_week == day_of_week)
            .cloned()
            .collect();
        matching.sort_by_key(|t| t.start_time);
        Ok(matching)
    }

    async fn templates_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<WorkTemplate>, SchedulingError> {
        let templates = read_guard(&self.templates)?;
        let mut matching: Vec<WorkTemplate> = templates
            .iter()
            .filter(|t| t.is_active && t.doctor_id == doctor_id)
            .cloned()
            .collect();
        matching.sort_by_key(|t| (t.day_of_week, t.start_time));
        Ok(matching)
    }

    async fn insert_or_fetch_slot(&self, slot: Slot) -> Result<Slot, SchedulingError> {
        let mut slots = write_guard(&self.slots)?;
        let row = slots.entry(slot.key()).or_insert(slot);
        Ok(row.clone())
    }

    async fn get_slot(&self, key: &SlotKey) -> Result<Option<Slot>, SchedulingError> {
        let slots = read_guard(&self.slots)?;
        Ok(slots.get(key).cloned())
    }

    async fn slots_for_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, SchedulingError> {
        let slots = read_guard(&self.slots)?;
        let mut matching: Vec<Slot> = slots
            .values()
            .filter(|s| s.doctor_id == doctor_id && s.date == date)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.start_time);
        Ok(matching)
    }

    async fn reserve_slot(&self, key: &SlotKey) -> Result<Slot, SchedulingError> {
        let mut slots = write_guard(&self.slots)?;
        let slot = slots
            .get_mut(key)
            .ok_or_else(|| SchedulingError::NotFound("slot".to_string()))?;

        if slot.booked_count >= slot.capacity {
            return Err(SchedulingError::SlotFull);
        }
        slot.booked_count += 1;
        Ok(slot.clone())
    }

    async fn release_slot(&self, key: &SlotKey) -> Result<Slot, SchedulingError> {
        let mut slots = write_guard(&self.slots)?;
        let slot = slots
            .get_mut(key)
            .ok_or_else(|| SchedulingError::NotFound("slot".to_string()))?;

        if slot.booked_count <= 0 {
            warn!(
                "Release on slot {} {} {} with no outstanding reservations, flooring at zero",
                slot.doctor_id, slot.date, slot.start_time
            );
            slot.booked_count = 0;
        } else {
            slot.booked_count -= 1;
        }
        Ok(slot.clone())
    }

    async fn insert_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointments = write_guard(&self.appointments)?;
        if appointments.contains_key(&appointment.id) {
            return Err(SchedulingError::Store(format!(
                "appointment {} already exists",
                appointment.id
            )));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        let appointments = read_guard(&self.appointments)?;
        Ok(appointments.get(&id).cloned())
    }

    async fn update_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointments = write_guard(&self.appointments)?;
        if !appointments.contains_key(&appointment.id) {
            return Err(SchedulingError::NotFound("appointment".to_string()));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let appointments = read_guard(&self.appointments)?;
        Ok(filter_appointments(
            appointments.values(),
            |a| a.patient_id == patient_id,
            status,
            date,
        ))
    }

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
        status: Option<AppointmentStatus>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let appointments = read_guard(&self.appointments)?;
        Ok(filter_appointments(
            appointments.values(),
            |a| a.doctor_id == doctor_id,
            status,
            date,
        ))
    }
}

fn filter_appointments<'a>(
    rows: impl Iterator<Item = &'a Appointment>,
    owner: impl Fn(&Appointment) -> bool,
    status: Option<AppointmentStatus>,
    date: Option<NaiveDate>,
) -> Vec<Appointment> {
    let mut matching: Vec<Appointment> = rows
        .filter(|&a| owner(a))
        .filter(|a| status.map_or(true, |s| a.status == s))
        .filter(|a| date.map_or(true, |d| a.scheduled_time.date_naive() == d))
        .cloned()
        .collect();
    matching.sort_by_key(|a| a.scheduled_time);
    matching
}
