// libs/booking-wizard-cell/src/lib.rs
//! # Booking Wizard Cell
//!
//! Step-by-step appointment booking: the patient identifies themselves, then
//! picks a hospital, a doctor and a time slot, and confirms.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                 Booking Wizard Cell                 |
//! +-----------------------------------------------------+
//! |  handlers.rs    |  HTTP endpoint handlers           |
//! |  router.rs      |  Route definitions                |
//! |  models.rs      |  Wizard state, records & DTOs     |
//! |  error.rs       |  Wizard and service errors        |
//! |  services/      |                                   |
//! |    wizard.rs    |  The five-step state machine      |
//! |    directory.rs |  Appointments service trait       |
//! |    remote.rs    |  HTTP appointments service client |
//! |    in_memory.rs |  Seeded in-process directory      |
//! |    sessions.rs  |  Live wizard sessions             |
//! +-----------------------------------------------------+
//! ```
//!
//! ## Steps
//!
//! 1. Collect identity: validated by the appointments service.
//! 2. Choose hospital: from the hospital directory.
//! 3. Choose doctor: doctors of the chosen hospital.
//! 4. Choose time slot: open slots of the chosen doctor. An empty list has no
//!    way forward; the patient goes back.
//! 5. Confirm: books the slot and starts the wizard over.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use booking_wizard_cell::{BookingWizard, InMemoryAppointmentService, PatientInfo};
//!
//! # async fn run() -> Result<(), booking_wizard_cell::WizardError> {
//! let wizard = BookingWizard::new(Arc::new(InMemoryAppointmentService::seeded()));
//!
//! wizard.submit_identity(PatientInfo {
//!     name: "Alice Smith".into(),
//!     id_number: "1234567890".into(),
//!     phone: "5551234567".into(),
//!     email: None,
//! }).await?;
//! wizard.select_hospital("1").await?;
//! wizard.select_doctor("d1").await?;
//! wizard.select_time_slot("09:00 AM").await?;
//!
//! let appointment = wizard.confirm_booking().await?;
//! println!("Booked {}", appointment.id);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::*;
pub use handlers::BookingAppState;
pub use models::*;
pub use router::booking_wizard_routes;
pub use services::*;
