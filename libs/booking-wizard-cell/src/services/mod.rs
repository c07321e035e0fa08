pub mod directory;
pub mod in_memory;
pub mod remote;
pub mod sessions;
pub mod wizard;

pub use directory::AppointmentService;
pub use in_memory::InMemoryAppointmentService;
pub use remote::RemoteAppointmentService;
pub use sessions::WizardSessions;
pub use wizard::BookingWizard;
