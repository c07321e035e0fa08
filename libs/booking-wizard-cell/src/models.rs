use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// DIRECTORY RECORDS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    #[serde(rename = "time_slot")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// Paged list envelope used by the appointments service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: usize,
}

// ==============================================================================
// PATIENT INPUT & BOOKING REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    #[serde(rename = "idNumber", alias = "id_number")]
    pub id_number: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PatientInfo {
    /// True once every required identity field holds a value.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.id_number.trim().is_empty()
            && !self.phone.trim().is_empty()
    }

    /// Blank email input is treated as absent.
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string)
    }
}

/// Body of `POST /appointments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub patient_name: String,
    pub patient_id_number: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub hospital_id: String,
    pub doctor_id: String,
    pub appointment_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// Booking confirmation returned by the appointments service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub hospital_id: String,
    pub doctor_id: String,
    pub patient_name: String,
    pub patient_id_number: String,
    pub patient_phone: String,
    #[serde(default)]
    pub patient_email: Option<String>,
    pub appointment_time: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

// ==============================================================================
// WIZARD STATE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    #[default]
    CollectIdentity,
    ChooseHospital,
    ChooseDoctor,
    ChooseTimeSlot,
    Confirm,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::CollectIdentity => 1,
            Step::ChooseHospital => 2,
            Step::ChooseDoctor => 3,
            Step::ChooseTimeSlot => 4,
            Step::Confirm => 5,
        }
    }

    pub fn previous(self) -> Option<Step> {
        match self {
            Step::CollectIdentity => None,
            Step::ChooseHospital => Some(Step::CollectIdentity),
            Step::ChooseDoctor => Some(Step::ChooseHospital),
            Step::ChooseTimeSlot => Some(Step::ChooseDoctor),
            Step::Confirm => Some(Step::ChooseTimeSlot),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Step::CollectIdentity => "collect identity",
            Step::ChooseHospital => "choose hospital",
            Step::ChooseDoctor => "choose doctor",
            Step::ChooseTimeSlot => "choose time slot",
            Step::Confirm => "confirm",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.label())
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Step::CollectIdentity),
            2 => Ok(Step::ChooseHospital),
            3 => Ok(Step::ChooseDoctor),
            4 => Ok(Step::ChooseTimeSlot),
            5 => Ok(Step::Confirm),
            other => Err(format!("wizard step must be between 1 and 5, got {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Hospitals,
    Doctors,
    TimeSlots,
}

impl ListKind {
    pub fn load_failed_message(self) -> &'static str {
        match self {
            ListKind::Hospitals => "Unable to load hospitals. Please try again.",
            ListKind::Doctors => "Unable to load doctors. Please try again.",
            ListKind::TimeSlots => "Unable to load time slots. Please try again.",
        }
    }
}

/// A fetched list together with its load status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteList<T> {
    pub status: LoadStatus,
    pub items: Vec<T>,
}

impl<T> Default for RemoteList<T> {
    fn default() -> Self {
        Self {
            status: LoadStatus::Idle,
            items: Vec::new(),
        }
    }
}

impl<T> RemoteList<T> {
    pub fn loading() -> Self {
        Self {
            status: LoadStatus::Loading,
            items: Vec::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.status == LoadStatus::Loaded
    }

    /// Looks an item up, but only in a list that finished loading.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        if !self.is_loaded() {
            return None;
        }
        self.items.iter().find(|item| predicate(item))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: Step,
    pub patient: PatientInfo,
    pub selected_hospital_id: Option<String>,
    pub selected_doctor_id: Option<String>,
    pub selected_time_slot: Option<String>,
    pub last_error: Option<String>,
    pub pending: bool,
    pub hospitals: RemoteList<Hospital>,
    pub doctors: RemoteList<Doctor>,
    pub time_slots: RemoteList<TimeSlot>,
}

impl WizardState {
    /// Step 4 with a loaded but empty slot list: nothing to pick, only back.
    pub fn no_slots_available(&self) -> bool {
        self.step == Step::ChooseTimeSlot
            && self.time_slots.is_loaded()
            && self.time_slots.items.is_empty()
    }

    pub fn selected_hospital(&self) -> Option<&Hospital> {
        let id = self.selected_hospital_id.as_deref()?;
        self.hospitals.items.iter().find(|h| h.id == id)
    }

    pub fn selected_doctor(&self) -> Option<&Doctor> {
        let id = self.selected_doctor_id.as_deref()?;
        self.doctors.items.iter().find(|d| d.id == id)
    }

    /// Name of the first required booking field that is still empty.
    pub fn missing_booking_field(&self) -> Option<&'static str> {
        if !self.patient.is_complete() {
            Some("patient")
        } else if self.selected_hospital_id.is_none() {
            Some("hospital")
        } else if self.selected_doctor_id.is_none() {
            Some("doctor")
        } else if self.selected_time_slot.is_none() {
            Some("time slot")
        } else {
            None
        }
    }

    pub fn booking_request(&self, user_id: Option<Uuid>) -> Option<AppointmentRequest> {
        Some(AppointmentRequest {
            patient_name: self.patient.name.clone(),
            patient_id_number: self.patient.id_number.clone(),
            patient_phone: self.patient.phone.clone(),
            patient_email: self.patient.normalized_email(),
            hospital_id: self.selected_hospital_id.clone()?,
            doctor_id: self.selected_doctor_id.clone()?,
            appointment_time: self.selected_time_slot.clone()?,
            user_id,
        })
    }
}

// ==============================================================================
// NOTIFICATIONS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    StepChanged { step: Step },
    ListLoaded { list: ListKind, count: usize },
    Failed { message: String },
    Confirmed { appointment: Appointment },
}

// ==============================================================================
// HTTP DTOs
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectHospitalRequest {
    pub hospital_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectDoctorRequest {
    pub doctor_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectTimeSlotRequest {
    pub time_slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub state: WizardState,
    pub no_slots_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmationResponse {
    pub appointment: Appointment,
    pub state: WizardState,
}
