// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// WORK TEMPLATES
// ==============================================================================

/// A doctor's recurring weekly availability rule. Owned by the doctor-management
/// collaborator; this cell only reads it when deriving slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkTemplate {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i32, // 0 = Sunday, 6 = Saturday
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub visit_duration_minutes: i32,
    pub max_patients_per_hour: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl WorkTemplate {
    /// Half-open containment: a template covers `[start_time, end_time)`.
    pub fn covers(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }

    pub fn span_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkTemplateRequest {
    pub doctor_id: Uuid,
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub visit_duration_minutes: i32,
    pub max_patients_per_hour: i32,
}

impl CreateWorkTemplateRequest {
    pub fn into_template(self) -> WorkTemplate {
        WorkTemplate {
            id: Uuid::new_v4(),
            doctor_id: self.doctor_id,
            day_of_week: self.day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            visit_duration_minutes: self.visit_duration_minutes,
            max_patients_per_hour: self.max_patients_per_hour,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Map a calendar date onto the template weekday index (0 = Sunday).
pub fn day_of_week_index(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

// ==============================================================================
// SLOTS
// ==============================================================================

/// Identity of a slot row; concurrent creators for the same key converge on one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

/// A concrete, date-specific bookable unit derived from a WorkTemplate.
/// `booked_count` is only ever mutated through the store's atomic
/// reserve/release operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub booked_count: i32,
}

impl Slot {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id,
            date: self.date,
            start_time: self.start_time,
        }
    }

    pub fn is_available(&self) -> bool {
        self.booked_count < self.capacity
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    pub fn fill_status(&self) -> SlotFillStatus {
        let ratio = self.booked_count as f64 / self.capacity.max(1) as f64;
        if ratio >= 1.0 {
            SlotFillStatus::Full
        } else if ratio >= 0.7 {
            SlotFillStatus::Limited
        } else {
            SlotFillStatus::Available
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotFillStatus {
    Available,
    Limited,
    Full,
}

impl fmt::Display for SlotFillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotFillStatus::Available => write!(f, "AVAILABLE"),
            SlotFillStatus::Limited => write!(f, "LIMITED"),
            SlotFillStatus::Full => write!(f, "FULL"),
        }
    }
}

/// Per-slot view returned by the day listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_available: bool,
    pub availability_status: SlotFillStatus,
    pub booked_count: i32,
    pub capacity: i32,
}

impl SlotView {
    pub fn from_slot(slot: &Slot) -> Self {
        Self {
            start_time: slot.date.and_time(slot.start_time).and_utc(),
            end_time: slot.date.and_time(slot.end_time).and_utc(),
            is_available: slot.is_available(),
            availability_status: slot.fill_status(),
            booked_count: slot.booked_count,
            capacity: slot.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySlotsResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub priority: AppointmentPriority,
    pub reason: String,
    pub notes: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub slot_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_start_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Key of the slot whose capacity this appointment reserves.
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id,
            date: self.slot_date,
            start_time: self.slot_start_time,
        }
    }

    /// A live appointment is one still holding its slot reservation.
    pub fn is_live(&self) -> bool {
        matches!(
            self.status,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Forward path `Pending -> Confirmed -> Completed`; `Cancelled` and
    /// `Rescheduled` are terminal and only reachable from a live appointment.
    pub fn can_transition_to(&self, next: &AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Pending, AppointmentStatus::Confirmed)
                | (AppointmentStatus::Confirmed, AppointmentStatus::Completed)
                | (AppointmentStatus::Pending, AppointmentStatus::Cancelled)
                | (AppointmentStatus::Confirmed, AppointmentStatus::Cancelled)
                | (AppointmentStatus::Pending, AppointmentStatus::Rescheduled)
                | (AppointmentStatus::Confirmed, AppointmentStatus::Rescheduled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "PENDING"),
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
            AppointmentStatus::Rescheduled => write!(f, "RESCHEDULED"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentPriority {
    #[default]
    Routine,
    Priority,
    Urgent,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub reason: String,
    #[serde(default)]
    pub priority: AppointmentPriority,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// AVAILABILITY DENSITY
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DensityStatus {
    Vacant,
    Moderate,
    Busy,
}

impl DensityStatus {
    pub fn classify(percent_booked: f64) -> Self {
        if percent_booked >= 70.0 {
            DensityStatus::Busy
        } else if percent_booked >= 30.0 {
            DensityStatus::Moderate
        } else {
            DensityStatus::Vacant
        }
    }
}

impl fmt::Display for DensityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityStatus::Vacant => write!(f, "VACANT"),
            DensityStatus::Moderate => write!(f, "MODERATE"),
            DensityStatus::Busy => write!(f, "BUSY"),
        }
    }
}

/// Aggregated occupancy classification for one working day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDensity {
    pub date: NaiveDate,
    pub status: DensityStatus,
    pub total_slots: i64,
    pub available_slots: i64,
    pub morning_status: DensityStatus,
    pub afternoon_status: DensityStatus,
    pub percent_booked: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAvailabilityResponse {
    pub doctor_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub availability: Vec<DailyDensity>,
}

// ==============================================================================
// DASHBOARD STATISTICS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientStats {
    pub upcoming_appointments: i64,
    pub completed_appointments: i64,
    pub total_appointments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorStats {
    pub total_patients: i64,
    pub todays_appointments: i64,
    pub pending_appointments: i64,
    pub completed_appointments: i64,
    pub total_appointments: i64,
    pub success_rate: f64,
}
