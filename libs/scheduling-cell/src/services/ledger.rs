// libs/scheduling-cell/src/services/ledger.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, DoctorStats, PatientStats, Slot,
};
use crate::services::directory::{DirectoryAnswer, DirectoryClient};
use crate::services::notify::NotificationClient;
use crate::services::validator::BookingValidator;
use crate::store::SchedulingStore;

/// Owns the Appointment lifecycle and is the only component that moves a
/// slot's booked count, always through the store's atomic reserve/release.
pub struct BookingLedger {
    store: Arc<dyn SchedulingStore>,
    validator: Arc<BookingValidator>,
    notifier: Arc<NotificationClient>,
    directory: Arc<DirectoryClient>,
    retry_attempts: u32,
}

impl BookingLedger {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        validator: Arc<BookingValidator>,
        notifier: Arc<NotificationClient>,
        directory: Arc<DirectoryClient>,
        retry_attempts: u32,
    ) -> Self {
        Self {
            store,
            validator,
            notifier,
            directory,
            retry_attempts: retry_attempts.max(1),
        }
    }

    /// Book an appointment: re-validate, reserve capacity with an atomic
    /// compare-and-increment, then create the record. The reserve and the
    /// record creation succeed or fail together; a failed creation releases
    /// the reservation before the error propagates.
    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for patient {} with doctor {} at {}",
            request.patient_id, request.doctor_id, request.scheduled_time
        );

        self.check_identity(request.patient_id, "patient").await?;
        self.check_identity(request.doctor_id, "doctor").await?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            // Validation and reservation race against other bookers; the
            // reserve itself is the conditional update that settles it.
            let slot = self
                .validator
                .validate(request.doctor_id, request.scheduled_time)
                .await?;

            match self.store.reserve_slot(&slot.key()).await {
                Ok(reserved) => return self.commit_booking(request, reserved).await,
                Err(SchedulingError::Contention) if attempt < self.retry_attempts => {
                    warn!(
                        "Slot reservation contended, retry {}/{}",
                        attempt, self.retry_attempts
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(25 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Cancel a live appointment and give its reservation back to the slot.
    pub async fn cancel(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        debug!("Cancelling appointment {}", appointment_id);

        let appointment = self.transition_out(appointment_id, AppointmentStatus::Cancelled).await?;
        self.release_reservation(&appointment).await;

        self.notify_later(
            appointment.patient_id,
            format!(
                "Your appointment on {} has been cancelled",
                appointment.scheduled_time.format("%d/%m/%Y %H:%M")
            ),
        );

        info!("Appointment {} cancelled", appointment_id);
        Ok(appointment)
    }

    /// Reschedule as cancel-old + book-new, never an in-place slot swap. When
    /// the second step fails the caller learns the old reservation is already
    /// gone through `RescheduleFailed { released_old: true }`.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_time: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Rescheduling appointment {} to {}", appointment_id, new_time);

        let old = self
            .transition_out(appointment_id, AppointmentStatus::Rescheduled)
            .await?;
        self.release_reservation(&old).await;

        let request = BookAppointmentRequest {
            patient_id: old.patient_id,
            doctor_id: old.doctor_id,
            scheduled_time: new_time,
            reason: old.reason.clone(),
            priority: old.priority,
            notes: old.notes.clone(),
        };

        match self.book(request).await {
            Ok(new_appointment) => {
                info!(
                    "Appointment {} rescheduled to {} as {}",
                    appointment_id, new_time, new_appointment.id
                );
                Ok(new_appointment)
            }
            Err(source) => {
                warn!(
                    "Reschedule of {} failed after releasing the old reservation: {}",
                    appointment_id, source
                );
                Err(SchedulingError::RescheduleFailed {
                    released_old: true,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Forward status transitions. `Cancelled` routes through `cancel` so the
    /// reservation is released; `Rescheduled` only happens via `reschedule`.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        if new_status == AppointmentStatus::Cancelled {
            return self.cancel(appointment_id).await;
        }

        let mut appointment = self
            .store
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?;

        if new_status == AppointmentStatus::Rescheduled
            || !appointment.status.can_transition_to(&new_status)
        {
            return Err(SchedulingError::InvalidStatusTransition {
                from: appointment.status,
                to: new_status,
            });
        }

        appointment.status = new_status;
        appointment.updated_at = Utc::now();
        let updated = self.store.update_appointment(appointment).await?;

        self.notify_later(
            updated.patient_id,
            format!(
                "Your appointment on {} is now {}",
                updated.scheduled_time.format("%d/%m/%Y %H:%M"),
                updated.status
            ),
        );

        Ok(updated)
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.store
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))
    }

    pub async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
        date: Option<chrono::NaiveDate>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.store
            .appointments_for_patient(patient_id, status, date)
            .await
    }

    pub async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
        status: Option<AppointmentStatus>,
        date: Option<chrono::NaiveDate>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.store
            .appointments_for_doctor(doctor_id, status, date)
            .await
    }

    pub async fn patient_stats(&self, patient_id: Uuid) -> Result<PatientStats, SchedulingError> {
        let appointments = self
            .store
            .appointments_for_patient(patient_id, None, None)
            .await?;
        let now = Utc::now();

        let upcoming = appointments
            .iter()
            .filter(|a| a.is_live() && a.scheduled_time >= now)
            .count() as i64;
        let completed = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .count() as i64;

        Ok(PatientStats {
            upcoming_appointments: upcoming,
            completed_appointments: completed,
            total_appointments: upcoming + completed,
        })
    }

    pub async fn doctor_stats(&self, doctor_id: Uuid) -> Result<DoctorStats, SchedulingError> {
        let appointments = self
            .store
            .appointments_for_doctor(doctor_id, None, None)
            .await?;
        let today = Utc::now().date_naive();

        let total = appointments.len() as i64;
        let todays = appointments
            .iter()
            .filter(|a| a.scheduled_time.date_naive() == today)
            .count() as i64;
        let completed = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .count() as i64;
        let pending = appointments.iter().filter(|a| a.is_live()).count() as i64;

        let mut patients: Vec<Uuid> = appointments.iter().map(|a| a.patient_id).collect();
        patients.sort();
        patients.dedup();

        let success_rate = if total > 0 {
            round1(completed as f64 / total as f64 * 100.0)
        } else {
            0.0
        };

        Ok(DoctorStats {
            total_patients: patients.len() as i64,
            todays_appointments: todays,
            pending_appointments: pending,
            completed_appointments: completed,
            total_appointments: total,
            success_rate,
        })
    }

    // ==============================================================================
    // PRIVATE HELPERS
    // ==============================================================================

    async fn commit_booking(
        &self,
        request: BookAppointmentRequest,
        slot: Slot,
    ) -> Result<Appointment, SchedulingError> {
        let now = Utc::now();
        let patient_name = self.directory.display_name(request.patient_id).await;
        let doctor_name = self.directory.display_name(request.doctor_id).await;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            scheduled_time: request.scheduled_time,
            end_time: request.scheduled_time + Duration::minutes(slot.duration_minutes()),
            status: AppointmentStatus::Pending,
            priority: request.priority,
            reason: request.reason,
            notes: request.notes,
            patient_name,
            doctor_name,
            slot_id: slot.id,
            slot_date: slot.date,
            slot_start_time: slot.start_time,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_appointment(appointment).await {
            Ok(created) => {
                info!(
                    "Appointment {} booked for patient {} ({}/{} in slot)",
                    created.id, created.patient_id, slot.booked_count, slot.capacity
                );

                let doctor_label = created
                    .doctor_name
                    .clone()
                    .unwrap_or_else(|| created.doctor_id.to_string());
                self.notify_later(
                    created.patient_id,
                    format!(
                        "Your appointment with Dr. {} on {} has been booked",
                        doctor_label,
                        created.scheduled_time.format("%d/%m/%Y %H:%M")
                    ),
                );

                Ok(created)
            }
            Err(e) => {
                // Reservation and record must succeed or fail together.
                if let Err(release_err) = self.store.release_slot(&slot.key()).await {
                    error!(
                        "Failed to roll back reservation for slot {} {}: {}",
                        slot.date, slot.start_time, release_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Move a live appointment into a terminal state, persisting the change.
    async fn transition_out(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointment = self
            .store
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("appointment".to_string()))?;

        if !appointment.status.can_transition_to(&target) {
            return Err(SchedulingError::InvalidStatusTransition {
                from: appointment.status,
                to: target,
            });
        }

        appointment.status = target;
        appointment.updated_at = Utc::now();
        self.store.update_appointment(appointment).await
    }

    /// Decrement the slot this appointment reserved. A missing slot is an
    /// inconsistency to log, not a failure to surface to the caller.
    async fn release_reservation(&self, appointment: &Appointment) {
        if let Err(e) = self.store.release_slot(&appointment.slot_key()).await {
            warn!(
                "Could not release reservation for appointment {}: {}",
                appointment.id, e
            );
        }
    }

    async fn check_identity(&self, user_id: Uuid, role: &str) -> Result<(), SchedulingError> {
        match self.directory.lookup(user_id).await {
            Some(DirectoryAnswer::Absent) => Err(SchedulingError::NotFound(role.to_string())),
            Some(DirectoryAnswer::Exists(_)) | None => Ok(()),
        }
    }

    fn notify_later(&self, recipient_id: Uuid, message: String) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            notifier.send(recipient_id, &message).await;
        });
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
