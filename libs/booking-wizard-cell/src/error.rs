use thiserror::Error;

use shared_models::error::AppError;

use crate::models::Step;

pub const VALIDATION_FAILED_MESSAGE: &str =
    "User validation failed. Please check your information and try again.";
pub const BOOKING_FAILED_MESSAGE: &str = "Booking failed. Please try again.";

/// Failure reported by an appointments service implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The service understood the request and refused it.
    #[error("{0}")]
    Rejected(String),

    #[error("Appointments service unavailable: {0}")]
    Transport(String),

    #[error("Unexpected response from appointments service: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Message to surface to the user: the service's own wording when it gave
    /// one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ServiceError::Rejected(message) if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// True when the service answered and refused; false when it could not
    /// be reached or its answer could not be read.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ServiceError::Rejected(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("A request is already in progress")]
    Busy,

    #[error("Operation requires {expected}, wizard is at {actual}")]
    WrongStep { expected: Step, actual: Step },

    #[error("Cannot go back from {0}")]
    NoPreviousStep(Step),

    #[error("Hospital {0} is not in the loaded hospital list")]
    UnknownHospital(String),

    #[error("Doctor {0} is not in the loaded doctor list")]
    UnknownDoctor(String),

    #[error("Time slot {0} is not in the loaded time slot list")]
    UnknownTimeSlot(String),

    #[error("Booking details are incomplete: missing {0}")]
    Incomplete(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Booking(String),

    /// Validation or booking failed because the service was unreachable.
    #[error("{0}")]
    Unavailable(String),

    #[error("The request was interrupted before it completed")]
    Interrupted,
}

impl WizardError {
    /// Usage errors are rejected before any state change.
    pub fn is_usage_error(&self) -> bool {
        !matches!(
            self,
            WizardError::Validation(_)
                | WizardError::Booking(_)
                | WizardError::Unavailable(_)
                | WizardError::Interrupted
        )
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Busy
            | WizardError::WrongStep { .. }
            | WizardError::NoPreviousStep(_) => AppError::Conflict(err.to_string()),
            WizardError::UnknownHospital(_)
            | WizardError::UnknownDoctor(_)
            | WizardError::UnknownTimeSlot(_)
            | WizardError::Incomplete(_) => AppError::BadRequest(err.to_string()),
            WizardError::Validation(message) => AppError::ValidationError(message),
            WizardError::Booking(message) => AppError::BadRequest(message),
            WizardError::Unavailable(message) => AppError::ExternalService(message),
            WizardError::Interrupted => AppError::Internal(err.to_string()),
        }
    }
}
