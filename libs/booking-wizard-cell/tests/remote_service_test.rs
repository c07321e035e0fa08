use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_wizard_cell::*;
use shared_config::AppConfig;

const BASE_PATH: &str = "/api/v1/appointments";

async fn service_for(server: &MockServer) -> RemoteAppointmentService {
    let config = AppConfig {
        appointments_service_url: format!("{}{}", server.uri(), BASE_PATH),
        request_timeout_secs: 5,
        ..AppConfig::in_memory()
    };
    RemoteAppointmentService::new(&config).unwrap()
}

fn alice() -> PatientInfo {
    PatientInfo {
        name: "Alice Smith".into(),
        id_number: "1234567890".into(),
        phone: "5551234567".into(),
        email: None,
    }
}

#[tokio::test]
async fn test_validate_user_posts_patient_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/validate-user", BASE_PATH)))
        .and(body_json(json!({
            "name": "Alice Smith",
            "idNumber": "1234567890",
            "phone": "5551234567"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "User information validated successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server).await;

    assert_eq!(service.validate_user(alice()).await, Ok(()));
}

#[tokio::test]
async fn test_validation_detail_becomes_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/validate-user", BASE_PATH)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "ID number must be at least 10 characters"
        })))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let result = service
        .validate_user(PatientInfo {
            id_number: "123".into(),
            ..alice()
        })
        .await;

    assert_eq!(
        result,
        Err(ServiceError::Rejected("ID number must be at least 10 characters".into()))
    );
}

#[tokio::test]
async fn test_hospitals_unwrap_list_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/hospitals", BASE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "1", "name": "City General Hospital", "address": "123 Main St"},
                {"id": "2", "name": "St. Mary's Medical Center", "address": "456 Oak Ave"}
            ],
            "count": 2
        })))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let hospitals = service.list_hospitals().await.unwrap();

    assert_eq!(hospitals.len(), 2);
    assert_eq!(hospitals[1].name, "St. Mary's Medical Center");
}

#[tokio::test]
async fn test_doctors_for_hospital() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/hospitals/1/doctors", BASE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "d1",
                "name": "Dr. Sarah Johnson",
                "specialty": "Cardiology",
                "rating": 4.8,
                "hospital_id": "1"
            }],
            "count": 1
        })))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let doctors = service.list_doctors("1".into()).await.unwrap();

    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].specialty, "Cardiology");
    assert_eq!(doctors[0].hospital_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_unknown_hospital_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/hospitals/99/doctors", BASE_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detail": "Hospital not found"
        })))
        .mount(&server)
        .await;

    let service = service_for(&server).await;

    assert_eq!(
        service.list_doctors("99".into()).await,
        Err(ServiceError::Rejected("Hospital not found".into()))
    );
}

#[tokio::test]
async fn test_only_available_time_slots_are_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/doctors/d1/time-slots", BASE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "d1-0900AM", "doctor_id": "d1", "time_slot": "09:00 AM", "is_available": true},
            {"id": "d1-1030AM", "doctor_id": "d1", "time_slot": "10:30 AM", "is_available": false},
            {"id": "d1-0200PM", "doctor_id": "d1", "time_slot": "02:00 PM", "is_available": true}
        ])))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let slots = service.list_time_slots("d1".into()).await.unwrap();

    let labels: Vec<&str> = slots.iter().map(|slot| slot.label.as_str()).collect();
    assert_eq!(labels, vec!["09:00 AM", "02:00 PM"]);
}

#[tokio::test]
async fn test_create_appointment_posts_to_collection_root() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/", BASE_PATH)))
        .and(body_json(json!({
            "patient_name": "Alice Smith",
            "patient_id_number": "1234567890",
            "patient_phone": "5551234567",
            "patient_email": null,
            "hospital_id": "1",
            "doctor_id": "d1",
            "appointment_time": "09:00 AM"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a3f1",
            "hospital_id": "1",
            "doctor_id": "d1",
            "patient_name": "Alice Smith",
            "patient_id_number": "1234567890",
            "patient_phone": "5551234567",
            "patient_email": null,
            "appointment_time": "09:00 AM",
            "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let appointment = service
        .create_appointment(AppointmentRequest {
            patient_name: "Alice Smith".into(),
            patient_id_number: "1234567890".into(),
            patient_phone: "5551234567".into(),
            patient_email: None,
            hospital_id: "1".into(),
            doctor_id: "d1".into(),
            appointment_time: "09:00 AM".into(),
            user_id: None,
        })
        .await
        .unwrap();

    assert_eq!(appointment.id, "a3f1");
    assert_eq!(appointment.status, "pending");
}

#[tokio::test]
async fn test_server_failure_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/hospitals", BASE_PATH)))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    let err = service.list_hospitals().await.unwrap_err();

    assert_matches!(err, ServiceError::Transport(_));
    assert_eq!(
        err.user_message(ListKind::Hospitals.load_failed_message()),
        "Unable to load hospitals. Please try again."
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/hospitals", BASE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let service = service_for(&server).await;

    assert_matches!(service.list_hospitals().await, Err(ServiceError::Decode(_)));
}

#[tokio::test]
async fn test_wizard_books_through_remote_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/validate-user", BASE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/hospitals", BASE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "name": "City General Hospital", "address": "123 Main St"}],
            "count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/hospitals/1/doctors", BASE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "d1", "name": "Dr. Sarah Johnson", "specialty": "Cardiology", "rating": 4.8}],
            "count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/doctors/d1/time-slots", BASE_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "d1-0900AM", "time_slot": "09:00 AM", "is_available": true}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/", BASE_PATH)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Selected time slot is not available"
        })))
        .mount(&server)
        .await;

    let wizard = BookingWizard::new(std::sync::Arc::new(service_for(&server).await));
    wizard.submit_identity(alice()).await.unwrap();
    wizard.select_hospital("1").await.unwrap();
    wizard.select_doctor("d1").await.unwrap();
    wizard.select_time_slot("09:00 AM").await.unwrap();

    assert_matches!(
        wizard.confirm_booking().await,
        Err(WizardError::Booking(message)) if message == "Selected time slot is not available"
    );
    assert_eq!(wizard.state().await.step, Step::Confirm);
}
