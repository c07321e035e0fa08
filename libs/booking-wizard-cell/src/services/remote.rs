use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument};

use shared_config::AppConfig;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    Appointment, AppointmentRequest, Doctor, Hospital, Message, Page, PatientInfo, TimeSlot,
};
use crate::services::directory::AppointmentService;

/// HTTP client for the appointments microservice.
pub struct RemoteAppointmentService {
    client: Client,
    base_url: String,
}

impl RemoteAppointmentService {
    pub fn new(config: &AppConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            client,
            base_url: config.appointments_service_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> ServiceResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {} {}", method, url);

        let mut req = self.client.request(method, &url);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Appointments service error ({}): {}", status, error_text);
            return Err(Self::error_from_body(status, &error_text));
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// FastAPI reports refusals as `{"detail": "..."}`; validation failures
    /// from its request parsing come as a list of `{"msg": ...}` entries.
    fn error_from_body(status: StatusCode, body: &str) -> ServiceError {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(Value::String(message)) => Some(message.clone()),
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .next()
                    .map(str::to_string),
                _ => None,
            });

        match detail {
            Some(message) if status.is_client_error() => ServiceError::Rejected(message),
            Some(message) => ServiceError::Transport(format!("{}: {}", status, message)),
            None if status.is_client_error() => ServiceError::Rejected(String::new()),
            None => ServiceError::Transport(status.to_string()),
        }
    }
}

#[async_trait]
impl AppointmentService for RemoteAppointmentService {
    fn backend_name(&self) -> &'static str {
        "remote"
    }

    #[instrument(skip(self, patient))]
    async fn validate_user(&self, patient: PatientInfo) -> ServiceResult<()> {
        let body = serde_json::to_value(&patient)
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        let message: Message = self
            .request(Method::POST, "/validate-user", Some(body))
            .await?;

        debug!("User validation: {}", message.message);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_hospitals(&self) -> ServiceResult<Vec<Hospital>> {
        let page: Page<Hospital> = self.request(Method::GET, "/hospitals", None).await?;
        debug!("Fetched {} of {} hospitals", page.data.len(), page.count);
        Ok(page.data)
    }

    #[instrument(skip(self))]
    async fn list_doctors(&self, hospital_id: String) -> ServiceResult<Vec<Doctor>> {
        let path = format!("/hospitals/{}/doctors", hospital_id);
        let page: Page<Doctor> = self.request(Method::GET, &path, None).await?;
        debug!("Fetched {} doctors for hospital {}", page.data.len(), hospital_id);
        Ok(page.data)
    }

    #[instrument(skip(self))]
    async fn list_time_slots(&self, doctor_id: String) -> ServiceResult<Vec<TimeSlot>> {
        let path = format!("/doctors/{}/time-slots", doctor_id);
        let slots: Vec<TimeSlot> = self.request(Method::GET, &path, None).await?;
        Ok(slots.into_iter().filter(|slot| slot.is_available).collect())
    }

    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id))]
    async fn create_appointment(&self, request: AppointmentRequest) -> ServiceResult<Appointment> {
        let body = serde_json::to_value(&request)
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        self.request(Method::POST, "/", Some(body)).await
    }
}
