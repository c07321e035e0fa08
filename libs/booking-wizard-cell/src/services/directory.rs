use async_trait::async_trait;

use crate::error::ServiceResult;
use crate::models::{Appointment, AppointmentRequest, Doctor, Hospital, PatientInfo, TimeSlot};

/// The appointments service as seen by the booking wizard.
///
/// `RemoteAppointmentService` talks to the real service over HTTP;
/// `InMemoryAppointmentService` keeps a seeded directory in process.
#[async_trait]
pub trait AppointmentService: Send + Sync {
    /// Short name reported by the health endpoint.
    fn backend_name(&self) -> &'static str;

    async fn validate_user(&self, patient: PatientInfo) -> ServiceResult<()>;

    async fn list_hospitals(&self) -> ServiceResult<Vec<Hospital>>;

    async fn list_doctors(&self, hospital_id: String) -> ServiceResult<Vec<Doctor>>;

    /// Only slots that are still available.
    async fn list_time_slots(&self, doctor_id: String) -> ServiceResult<Vec<TimeSlot>>;

    async fn create_appointment(&self, request: AppointmentRequest) -> ServiceResult<Appointment>;
}
