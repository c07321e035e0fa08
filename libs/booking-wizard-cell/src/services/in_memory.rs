use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Appointment, AppointmentRequest, Doctor, Hospital, PatientInfo, TimeSlot};
use crate::services::directory::AppointmentService;

const MIN_NAME_CHARS: usize = 2;
const MIN_ID_NUMBER_CHARS: usize = 10;
const MIN_PHONE_CHARS: usize = 10;

#[derive(Debug, Default)]
struct Directory {
    hospitals: Vec<Hospital>,
    doctors: Vec<Doctor>,
    time_slots: Vec<TimeSlot>,
    appointments: HashMap<String, Appointment>,
}

/// Appointments service kept entirely in process.
///
/// Applies the same validation and booking rules as the real service, so the
/// wizard behaves identically against either backend.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentService {
    directory: RwLock<Directory>,
}

impl InMemoryAppointmentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo directory: three hospitals with two doctors each.
    pub fn seeded() -> Self {
        let hospitals = [
            ("1", "City General Hospital", "123 Main St"),
            ("2", "St. Mary Medical Center", "456 Oak Ave"),
            ("3", "University Hospital", "789 College Blvd"),
        ];
        let doctors = [
            ("1", "d1", "Dr. John Smith", "Cardiology", 4.8),
            ("1", "d2", "Dr. Sarah Johnson", "Internal Medicine", 4.9),
            ("2", "d3", "Dr. Michael Brown", "Orthopedics", 4.7),
            ("2", "d4", "Dr. Emily Davis", "Pediatrics", 4.9),
            ("3", "d5", "Dr. Robert Wilson", "Neurology", 4.8),
            ("3", "d6", "Dr. Lisa Anderson", "Dermatology", 4.6),
        ];
        let slots: [(&str, &[&str]); 6] = [
            ("d1", &["09:00 AM", "10:30 AM", "02:00 PM", "03:30 PM"]),
            ("d2", &["08:30 AM", "11:00 AM", "01:30 PM", "04:00 PM"]),
            ("d3", &["09:30 AM", "11:30 AM", "02:30 PM"]),
            ("d4", &["08:00 AM", "10:00 AM", "01:00 PM", "03:00 PM"]),
            ("d5", &["09:00 AM", "02:00 PM", "04:30 PM"]),
            ("d6", &["10:00 AM", "11:00 AM", "03:00 PM", "04:00 PM"]),
        ];

        let mut directory = Directory::default();
        for (id, name, address) in hospitals {
            directory.hospitals.push(Hospital {
                id: id.to_string(),
                name: name.to_string(),
                address: address.to_string(),
            });
        }
        for (hospital_id, id, name, specialty, rating) in doctors {
            directory.doctors.push(Doctor {
                id: id.to_string(),
                name: name.to_string(),
                specialty: specialty.to_string(),
                rating,
                hospital_id: Some(hospital_id.to_string()),
            });
        }
        for (doctor_id, labels) in slots {
            for label in labels {
                directory.time_slots.push(Self::slot(doctor_id, label));
            }
        }

        Self {
            directory: RwLock::new(directory),
        }
    }

    pub fn with_hospital(mut self, id: &str, name: &str, address: &str) -> Self {
        self.directory.get_mut().hospitals.push(Hospital {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
        });
        self
    }

    pub fn with_doctor(mut self, hospital_id: &str, id: &str, name: &str, specialty: &str, rating: f64) -> Self {
        self.directory.get_mut().doctors.push(Doctor {
            id: id.to_string(),
            name: name.to_string(),
            specialty: specialty.to_string(),
            rating,
            hospital_id: Some(hospital_id.to_string()),
        });
        self
    }

    pub fn with_time_slot(mut self, doctor_id: &str, label: &str) -> Self {
        self.directory
            .get_mut()
            .time_slots
            .push(Self::slot(doctor_id, label));
        self
    }

    /// Every appointment booked so far.
    pub async fn appointments(&self) -> Vec<Appointment> {
        let directory = self.directory.read().await;
        directory.appointments.values().cloned().collect()
    }

    fn slot(doctor_id: &str, label: &str) -> TimeSlot {
        TimeSlot {
            id: format!("{}-{}", doctor_id, label.replace([' ', ':'], "")),
            label: label.to_string(),
            doctor_id: Some(doctor_id.to_string()),
            is_available: true,
        }
    }

    fn check_identity(patient: &PatientInfo) -> ServiceResult<()> {
        if patient.name.trim().chars().count() < MIN_NAME_CHARS {
            return Err(ServiceError::Rejected("Name must be at least 2 characters".into()));
        }
        if patient.id_number.trim().chars().count() < MIN_ID_NUMBER_CHARS {
            return Err(ServiceError::Rejected("ID number must be at least 10 characters".into()));
        }
        if patient.phone.trim().chars().count() < MIN_PHONE_CHARS {
            return Err(ServiceError::Rejected("Phone number must be at least 10 characters".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentService for InMemoryAppointmentService {
    fn backend_name(&self) -> &'static str {
        "in_memory"
    }

    async fn validate_user(&self, patient: PatientInfo) -> ServiceResult<()> {
        Self::check_identity(&patient)?;
        debug!("User validation successful");
        Ok(())
    }

    async fn list_hospitals(&self) -> ServiceResult<Vec<Hospital>> {
        let directory = self.directory.read().await;
        Ok(directory.hospitals.clone())
    }

    async fn list_doctors(&self, hospital_id: String) -> ServiceResult<Vec<Doctor>> {
        let directory = self.directory.read().await;

        if !directory.hospitals.iter().any(|h| h.id == hospital_id) {
            return Err(ServiceError::Rejected("Hospital not found".into()));
        }

        Ok(directory
            .doctors
            .iter()
            .filter(|d| d.hospital_id.as_deref() == Some(hospital_id.as_str()))
            .cloned()
            .collect())
    }

    async fn list_time_slots(&self, doctor_id: String) -> ServiceResult<Vec<TimeSlot>> {
        let directory = self.directory.read().await;

        if !directory.doctors.iter().any(|d| d.id == doctor_id) {
            return Err(ServiceError::Rejected("Doctor not found".into()));
        }

        Ok(directory
            .time_slots
            .iter()
            .filter(|s| s.doctor_id.as_deref() == Some(doctor_id.as_str()) && s.is_available)
            .cloned()
            .collect())
    }

    async fn create_appointment(&self, request: AppointmentRequest) -> ServiceResult<Appointment> {
        let mut directory = self.directory.write().await;

        if !directory.hospitals.iter().any(|h| h.id == request.hospital_id) {
            return Err(ServiceError::Rejected("Hospital not found".into()));
        }

        let doctor_hospital = directory
            .doctors
            .iter()
            .find(|d| d.id == request.doctor_id)
            .map(|d| d.hospital_id.clone())
            .ok_or_else(|| ServiceError::Rejected("Doctor not found".into()))?;

        if doctor_hospital.as_deref() != Some(request.hospital_id.as_str()) {
            return Err(ServiceError::Rejected(
                "Doctor does not belong to the selected hospital".into(),
            ));
        }

        let slot = directory
            .time_slots
            .iter_mut()
            .find(|s| {
                s.doctor_id.as_deref() == Some(request.doctor_id.as_str())
                    && s.label == request.appointment_time
                    && s.is_available
            })
            .ok_or_else(|| ServiceError::Rejected("Selected time slot is not available".into()))?;
        slot.is_available = false;

        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id.map(|id| id.to_string()),
            hospital_id: request.hospital_id,
            doctor_id: request.doctor_id,
            patient_name: request.patient_name,
            patient_id_number: request.patient_id_number,
            patient_phone: request.patient_phone,
            patient_email: request.patient_email,
            appointment_time: request.appointment_time,
            status: "pending".to_string(),
        };

        directory
            .appointments
            .insert(appointment.id.clone(), appointment.clone());

        info!(
            "Appointment {} booked with doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.appointment_time
        );

        Ok(appointment)
    }
}
