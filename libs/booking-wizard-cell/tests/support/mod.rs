#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use booking_wizard_cell::*;

/// Scripted appointments service with call counters and optional gates that
/// hold a call open until the test releases it.
#[derive(Default)]
pub struct ScriptedService {
    hospitals: Vec<Hospital>,
    doctors: HashMap<String, Vec<Doctor>>,
    slots: HashMap<String, Vec<TimeSlot>>,
    validation_failures: Mutex<VecDeque<ServiceError>>,
    hospital_failures: Mutex<VecDeque<ServiceError>>,
    booking_failures: Mutex<VecDeque<ServiceError>>,
    gates: HashMap<String, Arc<Semaphore>>,
    pub validate_calls: AtomicUsize,
    pub hospital_calls: AtomicUsize,
    pub doctor_calls: AtomicUsize,
    pub slot_calls: AtomicUsize,
    pub book_calls: AtomicUsize,
    pub booked: Mutex<Vec<AppointmentRequest>>,
}

impl ScriptedService {
    /// H1 has D1 (no open slots) and D2; H2 has D3.
    pub fn clinic() -> Self {
        Self {
            hospitals: vec![hospital("H1", "Harbour Clinic"), hospital("H2", "Hilltop Hospital")],
            doctors: HashMap::from([
                (
                    "H1".to_string(),
                    vec![doctor("D1", "Dr. Ada Byrne", "H1"), doctor("D2", "Dr. Ben Cole", "H1")],
                ),
                ("H2".to_string(), vec![doctor("D3", "Dr. Cara Doyle", "H2")]),
            ]),
            slots: HashMap::from([
                ("D1".to_string(), vec![]),
                ("D2".to_string(), vec![slot("D2", "09:00 AM"), slot("D2", "10:30 AM")]),
                ("D3".to_string(), vec![slot("D3", "02:00 PM")]),
            ]),
            ..Self::default()
        }
    }

    pub fn reject_validation(self, err: ServiceError) -> Self {
        self.validation_failures.lock().unwrap().push_back(err);
        self
    }

    pub fn fail_hospitals(self, err: ServiceError) -> Self {
        self.hospital_failures.lock().unwrap().push_back(err);
        self
    }

    pub fn reject_booking(self, err: ServiceError) -> Self {
        self.booking_failures.lock().unwrap().push_back(err);
        self
    }

    /// Holds calls for `key` ("validate", "book", "doctors:H1", ...) until
    /// the returned semaphore gets a permit.
    pub fn gate(&mut self, key: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.insert(key.to_string(), gate.clone());
        gate
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self, key: &str) {
        if let Some(gate) = self.gates.get(key) {
            let _permit = gate.acquire().await.expect("gate closed");
        }
    }
}

#[async_trait]
impl AppointmentService for ScriptedService {
    fn backend_name(&self) -> &'static str {
        "scripted"
    }

    async fn validate_user(&self, _patient: PatientInfo) -> ServiceResult<()> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate("validate").await;
        match self.validation_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn list_hospitals(&self) -> ServiceResult<Vec<Hospital>> {
        self.hospital_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate("hospitals").await;
        match self.hospital_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(self.hospitals.clone()),
        }
    }

    async fn list_doctors(&self, hospital_id: String) -> ServiceResult<Vec<Doctor>> {
        self.doctor_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate(&format!("doctors:{}", hospital_id)).await;
        self.doctors
            .get(&hospital_id)
            .cloned()
            .ok_or_else(|| ServiceError::Rejected("Hospital not found".into()))
    }

    async fn list_time_slots(&self, doctor_id: String) -> ServiceResult<Vec<TimeSlot>> {
        self.slot_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate(&format!("slots:{}", doctor_id)).await;
        self.slots
            .get(&doctor_id)
            .cloned()
            .ok_or_else(|| ServiceError::Rejected("Doctor not found".into()))
    }

    async fn create_appointment(&self, request: AppointmentRequest) -> ServiceResult<Appointment> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate("book").await;
        if let Some(err) = self.booking_failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        self.booked.lock().unwrap().push(request.clone());
        Ok(Appointment {
            id: format!("appt-{}", self.booked.lock().unwrap().len()),
            user_id: request.user_id.map(|id| id.to_string()),
            hospital_id: request.hospital_id,
            doctor_id: request.doctor_id,
            patient_name: request.patient_name,
            patient_id_number: request.patient_id_number,
            patient_phone: request.patient_phone,
            patient_email: request.patient_email,
            appointment_time: request.appointment_time,
            status: "pending".to_string(),
        })
    }
}

pub fn hospital(id: &str, name: &str) -> Hospital {
    Hospital {
        id: id.to_string(),
        name: name.to_string(),
        address: "1 Quay St".to_string(),
    }
}

pub fn doctor(id: &str, name: &str, hospital_id: &str) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: name.to_string(),
        specialty: "General Practice".to_string(),
        rating: 4.5,
        hospital_id: Some(hospital_id.to_string()),
    }
}

pub fn slot(doctor_id: &str, label: &str) -> TimeSlot {
    TimeSlot {
        id: format!("{}-{}", doctor_id, label),
        label: label.to_string(),
        doctor_id: Some(doctor_id.to_string()),
        is_available: true,
    }
}

pub fn alice() -> PatientInfo {
    PatientInfo {
        name: "Alice Smith".to_string(),
        id_number: "1234567890".to_string(),
        phone: "5551234567".to_string(),
        email: None,
    }
}

/// Polls the wizard until `ready` holds, failing the test after a second.
pub async fn wait_until(wizard: &BookingWizard, ready: impl Fn(&WizardState) -> bool) -> WizardState {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let state = wizard.state().await;
            if ready(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("wizard never reached the expected state")
}
