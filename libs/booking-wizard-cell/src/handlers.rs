use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Duration;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::error::ServiceError;
use crate::models::{
    BookingConfirmationResponse, CreateSessionRequest, PatientInfo, SelectDoctorRequest,
    SelectHospitalRequest, SelectTimeSlotRequest, SessionResponse, WizardState,
};
use crate::services::{
    AppointmentService, BookingWizard, InMemoryAppointmentService, RemoteAppointmentService,
    WizardSessions,
};

/// Shared state behind the booking routes.
pub struct BookingAppState {
    pub config: Arc<AppConfig>,
    pub sessions: WizardSessions,
}

impl BookingAppState {
    pub fn new(config: Arc<AppConfig>, service: Arc<dyn AppointmentService>) -> Self {
        let ttl = Duration::minutes(config.session_ttl_minutes);
        Self {
            config,
            sessions: WizardSessions::new(service, ttl),
        }
    }

    /// Talks to the configured appointments service, or books against the
    /// in-memory directory when no service URL is set.
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, ServiceError> {
        let service: Arc<dyn AppointmentService> = if config.is_remote_configured() {
            Arc::new(RemoteAppointmentService::new(&config)?)
        } else {
            Arc::new(InMemoryAppointmentService::seeded())
        };

        info!("Booking wizard using {} appointments backend", service.backend_name());
        Ok(Self::new(config, service))
    }

    async fn wizard(&self, session_id: Uuid) -> Result<Arc<BookingWizard>, AppError> {
        self.sessions
            .get(session_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Booking session {} not found", session_id)))
    }
}

fn session_body(session_id: Uuid, state: WizardState) -> Json<Value> {
    let no_slots_available = state.no_slots_available();
    Json(json!(SessionResponse {
        session_id,
        state,
        no_slots_available,
    }))
}

#[axum::debug_handler]
pub async fn health(State(app): State<Arc<BookingAppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "booking-wizard",
        "backend": app.sessions.service().backend_name(),
        "active_sessions": app.sessions.len().await,
    }))
}

#[axum::debug_handler]
pub async fn create_session(
    State(app): State<Arc<BookingAppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> (StatusCode, Json<Value>) {
    let (session_id, wizard) = app.sessions.create(request.user_id).await;
    (StatusCode::CREATED, session_body(session_id, wizard.state().await))
}

#[axum::debug_handler]
pub async fn get_session(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let wizard = app.wizard(session_id).await?;
    Ok(session_body(session_id, wizard.state().await))
}

#[axum::debug_handler]
pub async fn delete_session(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !app.sessions.remove(session_id).await {
        return Err(AppError::NotFound(format!("Booking session {} not found", session_id)));
    }

    Ok(Json(json!({
        "message": "Booking session removed"
    })))
}

#[axum::debug_handler]
pub async fn submit_identity(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
    Json(patient): Json<PatientInfo>,
) -> Result<Json<Value>, AppError> {
    let wizard = app.wizard(session_id).await?;
    let state = wizard.submit_identity(patient).await?;
    Ok(session_body(session_id, state))
}

#[axum::debug_handler]
pub async fn select_hospital(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let wizard = app.wizard(session_id).await?;
    let state = wizard.select_hospital(&request.hospital_id).await?;
    Ok(session_body(session_id, state))
}

#[axum::debug_handler]
pub async fn select_doctor(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let wizard = app.wizard(session_id).await?;
    let state = wizard.select_doctor(&request.doctor_id).await?;
    Ok(session_body(session_id, state))
}

#[axum::debug_handler]
pub async fn select_time_slot(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectTimeSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let wizard = app.wizard(session_id).await?;
    let state = wizard.select_time_slot(&request.time_slot).await?;
    Ok(session_body(session_id, state))
}

#[axum::debug_handler]
pub async fn confirm_booking(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let wizard = app.wizard(session_id).await?;
    let appointment = wizard.confirm_booking().await?;

    Ok(Json(json!(BookingConfirmationResponse {
        appointment,
        state: wizard.state().await,
    })))
}

#[axum::debug_handler]
pub async fn go_back(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let wizard = app.wizard(session_id).await?;
    let state = wizard.go_back().await?;
    Ok(session_body(session_id, state))
}

#[axum::debug_handler]
pub async fn retry_fetch(
    State(app): State<Arc<BookingAppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let wizard = app.wizard(session_id).await?;
    let state = wizard.retry_fetch().await?;
    Ok(session_body(session_id, state))
}
