use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::error::{WizardError, BOOKING_FAILED_MESSAGE, VALIDATION_FAILED_MESSAGE};
use crate::models::{
    Appointment, AppointmentRequest, Doctor, Hospital, ListKind, LoadStatus, PatientInfo,
    RemoteList, Step, TimeSlot, WizardEvent, WizardState,
};
use crate::services::directory::AppointmentService;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Request generation per fetched list. A response is applied only while its
/// generation is still the latest one issued for that list.
#[derive(Debug, Default)]
struct Generations {
    hospitals: u64,
    doctors: u64,
    time_slots: u64,
}

impl Generations {
    fn counter(&mut self, list: ListKind) -> &mut u64 {
        match list {
            ListKind::Hospitals => &mut self.hospitals,
            ListKind::Doctors => &mut self.doctors,
            ListKind::TimeSlots => &mut self.time_slots,
        }
    }

    fn bump(&mut self, list: ListKind) -> u64 {
        let counter = self.counter(list);
        *counter += 1;
        *counter
    }

    /// Counters only ever grow, so an old response can never match again.
    fn bump_all(&mut self) {
        self.bump(ListKind::Hospitals);
        self.bump(ListKind::Doctors);
        self.bump(ListKind::TimeSlots);
    }

    fn is_current(&mut self, list: ListKind, generation: u64) -> bool {
        *self.counter(list) == generation
    }
}

#[derive(Debug, Default)]
struct Session {
    state: WizardState,
    generations: Generations,
}

#[derive(Debug)]
enum Fetch {
    Hospitals { generation: u64 },
    Doctors { generation: u64, hospital_id: String },
    TimeSlots { generation: u64, doctor_id: String },
}

impl Fetch {
    fn list(&self) -> ListKind {
        match self {
            Fetch::Hospitals { .. } => ListKind::Hospitals,
            Fetch::Doctors { .. } => ListKind::Doctors,
            Fetch::TimeSlots { .. } => ListKind::TimeSlots,
        }
    }

    fn generation(&self) -> u64 {
        match self {
            Fetch::Hospitals { generation }
            | Fetch::Doctors { generation, .. }
            | Fetch::TimeSlots { generation, .. } => *generation,
        }
    }
}

enum Fetched {
    Hospitals(Vec<Hospital>),
    Doctors(Vec<Doctor>),
    TimeSlots(Vec<TimeSlot>),
}

struct WizardCore {
    service: Arc<dyn AppointmentService>,
    user_id: Option<Uuid>,
    session: RwLock<Session>,
    events: broadcast::Sender<WizardEvent>,
}

/// Five-step booking flow: identity, hospital, doctor, time slot, confirm.
///
/// Every operation is async and returns once the remote calls it triggered
/// have resolved. The state lock is never held across a remote call, so other
/// callers can observe `pending`, go back while a list is loading, or
/// supersede an outstanding fetch.
///
/// Remote calls and the state updates that follow them run on a spawned task.
/// A caller that stops waiting (client disconnect, timeout) does not leave the
/// wizard `pending` or a list stuck loading; the outcome is applied anyway.
pub struct BookingWizard {
    core: Arc<WizardCore>,
}

impl BookingWizard {
    pub fn new(service: Arc<dyn AppointmentService>) -> Self {
        Self::for_user(service, None)
    }

    /// Bookings made through this wizard are attributed to `user_id`.
    pub fn for_user(service: Arc<dyn AppointmentService>, user_id: Option<Uuid>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            core: Arc::new(WizardCore {
                service,
                user_id,
                session: RwLock::new(Session::default()),
                events,
            }),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.core.user_id
    }

    pub async fn state(&self) -> WizardState {
        self.core.state().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.core.events.subscribe()
    }

    #[instrument(skip(self, patient))]
    pub async fn submit_identity(&self, patient: PatientInfo) -> Result<WizardState, WizardError> {
        {
            let mut session = self.core.session.write().await;
            ensure_ready(&session.state, Step::CollectIdentity)?;
            session.state.patient = patient.clone();
            session.state.pending = true;
        }

        let core = self.core.clone();
        self.run_detached(async move { core.finish_identity(patient).await })
            .await
    }

    #[instrument(skip(self))]
    pub async fn select_hospital(&self, hospital_id: &str) -> Result<WizardState, WizardError> {
        let fetch = {
            let mut session = self.core.session.write().await;
            ensure_ready(&session.state, Step::ChooseHospital)?;
            if session.state.hospitals.find(|h| h.id == hospital_id).is_none() {
                return Err(WizardError::UnknownHospital(hospital_id.to_string()));
            }

            let state = &mut session.state;
            state.selected_hospital_id = Some(hospital_id.to_string());
            state.selected_doctor_id = None;
            state.selected_time_slot = None;
            state.last_error = None;
            state.step = Step::ChooseDoctor;
            state.doctors = RemoteList::loading();
            state.time_slots = RemoteList::default();

            session.generations.bump(ListKind::TimeSlots);
            Fetch::Doctors {
                generation: session.generations.bump(ListKind::Doctors),
                hospital_id: hospital_id.to_string(),
            }
        };

        self.core.emit(WizardEvent::StepChanged { step: Step::ChooseDoctor });
        self.fetch_detached(fetch).await
    }

    #[instrument(skip(self))]
    pub async fn select_doctor(&self, doctor_id: &str) -> Result<WizardState, WizardError> {
        let fetch = {
            let mut session = self.core.session.write().await;
            ensure_ready(&session.state, Step::ChooseDoctor)?;
            if session.state.doctors.find(|d| d.id == doctor_id).is_none() {
                return Err(WizardError::UnknownDoctor(doctor_id.to_string()));
            }

            let state = &mut session.state;
            state.selected_doctor_id = Some(doctor_id.to_string());
            state.selected_time_slot = None;
            state.last_error = None;
            state.step = Step::ChooseTimeSlot;
            state.time_slots = RemoteList::loading();

            Fetch::TimeSlots {
                generation: session.generations.bump(ListKind::TimeSlots),
                doctor_id: doctor_id.to_string(),
            }
        };

        self.core.emit(WizardEvent::StepChanged { step: Step::ChooseTimeSlot });
        self.fetch_detached(fetch).await
    }

    #[instrument(skip(self))]
    pub async fn select_time_slot(&self, slot_label: &str) -> Result<WizardState, WizardError> {
        let snapshot = {
            let mut session = self.core.session.write().await;
            ensure_ready(&session.state, Step::ChooseTimeSlot)?;
            if session.state.time_slots.find(|s| s.label == slot_label).is_none() {
                return Err(WizardError::UnknownTimeSlot(slot_label.to_string()));
            }

            session.state.selected_time_slot = Some(slot_label.to_string());
            session.state.last_error = None;
            session.state.step = Step::Confirm;
            session.state.clone()
        };

        self.core.emit(WizardEvent::StepChanged { step: Step::Confirm });
        Ok(snapshot)
    }

    /// Books the selected slot. On success the wizard starts over from an
    /// empty state and the service's confirmation is returned.
    #[instrument(skip(self))]
    pub async fn confirm_booking(&self) -> Result<Appointment, WizardError> {
        let request = {
            let mut session = self.core.session.write().await;
            ensure_ready(&session.state, Step::Confirm)?;
            if let Some(missing) = session.state.missing_booking_field() {
                return Err(WizardError::Incomplete(missing));
            }
            let request = session
                .state
                .booking_request(self.core.user_id)
                .ok_or(WizardError::Incomplete("selection"))?;

            session.state.pending = true;
            request
        };

        let core = self.core.clone();
        self.run_detached(async move { core.finish_booking(request).await })
            .await
    }

    /// Steps back once. The selection made on the step being returned to is
    /// dropped along with everything after it; going back to a list step
    /// keeps that list cached.
    #[instrument(skip(self))]
    pub async fn go_back(&self) -> Result<WizardState, WizardError> {
        let snapshot = {
            let mut session = self.core.session.write().await;
            if session.state.pending {
                return Err(WizardError::Busy);
            }
            let current = session.state.step;
            let previous = current
                .previous()
                .ok_or(WizardError::NoPreviousStep(current))?;

            match previous {
                Step::CollectIdentity => {
                    session.state.selected_hospital_id = None;
                }
                Step::ChooseHospital => {
                    session.state.selected_doctor_id = None;
                    session.state.selected_time_slot = None;
                    session.state.doctors = RemoteList::default();
                    session.state.time_slots = RemoteList::default();
                    session.generations.bump(ListKind::Doctors);
                    session.generations.bump(ListKind::TimeSlots);
                }
                Step::ChooseDoctor => {
                    session.state.selected_doctor_id = None;
                    session.state.selected_time_slot = None;
                    session.state.time_slots = RemoteList::default();
                    session.generations.bump(ListKind::TimeSlots);
                }
                Step::ChooseTimeSlot => {
                    session.state.selected_time_slot = None;
                }
                Step::Confirm => {}
            }

            session.state.last_error = None;
            session.state.step = previous;
            session.state.clone()
        };

        debug!("Went back to {}", snapshot.step);
        self.core.emit(WizardEvent::StepChanged { step: snapshot.step });
        Ok(snapshot)
    }

    /// Re-issues the list fetch for the current step.
    #[instrument(skip(self))]
    pub async fn retry_fetch(&self) -> Result<WizardState, WizardError> {
        let fetch = {
            let mut session = self.core.session.write().await;
            if session.state.pending {
                return Err(WizardError::Busy);
            }

            let step = session.state.step;
            match step {
                Step::ChooseHospital => {
                    session.state.hospitals = RemoteList::loading();
                    Fetch::Hospitals {
                        generation: session.generations.bump(ListKind::Hospitals),
                    }
                }
                Step::ChooseDoctor => {
                    let hospital_id = session
                        .state
                        .selected_hospital_id
                        .clone()
                        .ok_or(WizardError::Incomplete("hospital"))?;
                    session.state.doctors = RemoteList::loading();
                    Fetch::Doctors {
                        generation: session.generations.bump(ListKind::Doctors),
                        hospital_id,
                    }
                }
                Step::ChooseTimeSlot => {
                    let doctor_id = session
                        .state
                        .selected_doctor_id
                        .clone()
                        .ok_or(WizardError::Incomplete("doctor"))?;
                    session.state.time_slots = RemoteList::loading();
                    Fetch::TimeSlots {
                        generation: session.generations.bump(ListKind::TimeSlots),
                        doctor_id,
                    }
                }
                actual => {
                    return Err(WizardError::WrongStep {
                        expected: Step::ChooseHospital,
                        actual,
                    })
                }
            }
        };

        self.fetch_detached(fetch).await
    }

    async fn fetch_detached(&self, fetch: Fetch) -> Result<WizardState, WizardError> {
        let core = self.core.clone();
        self.run_detached(async move {
            core.load(fetch).await;
            Ok(core.state().await)
        })
        .await
    }

    /// Runs `work` on its own task and waits for it. Dropping the caller's
    /// future leaves the task running to completion.
    async fn run_detached<T, F>(&self, work: F) -> Result<T, WizardError>
    where
        F: Future<Output = Result<T, WizardError>> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::spawn(work.in_current_span()).await {
            Ok(result) => result,
            Err(err) => {
                error!("Wizard task did not complete: {}", err);
                self.core.session.write().await.state.pending = false;
                Err(WizardError::Interrupted)
            }
        }
    }
}

impl WizardCore {
    async fn state(&self) -> WizardState {
        self.session.read().await.state.clone()
    }

    async fn finish_identity(&self, patient: PatientInfo) -> Result<WizardState, WizardError> {
        debug!("Validating patient identity");
        let outcome = self.service.validate_user(patient).await;

        let fetch = {
            let mut session = self.session.write().await;
            session.state.pending = false;

            if let Err(err) = outcome {
                let message = err.user_message(VALIDATION_FAILED_MESSAGE);
                warn!("Patient identity rejected: {}", err);
                session.state.last_error = Some(message.clone());
                drop(session);

                self.emit(WizardEvent::Failed { message: message.clone() });
                return Err(if err.is_rejection() {
                    WizardError::Validation(message)
                } else {
                    WizardError::Unavailable(message)
                });
            }

            session.state.last_error = None;
            session.state.step = Step::ChooseHospital;
            session.state.hospitals = RemoteList::loading();
            Fetch::Hospitals {
                generation: session.generations.bump(ListKind::Hospitals),
            }
        };

        self.emit(WizardEvent::StepChanged { step: Step::ChooseHospital });
        self.load(fetch).await;
        Ok(self.state().await)
    }

    async fn finish_booking(&self, request: AppointmentRequest) -> Result<Appointment, WizardError> {
        info!(
            "Booking doctor {} at {} ({})",
            request.doctor_id, request.appointment_time, request.hospital_id
        );
        let outcome = self.service.create_appointment(request).await;

        let mut session = self.session.write().await;
        session.state.pending = false;

        match outcome {
            Ok(appointment) => {
                session.state = WizardState::default();
                session.generations.bump_all();
                drop(session);

                info!("Appointment {} confirmed", appointment.id);
                self.emit(WizardEvent::Confirmed { appointment: appointment.clone() });
                self.emit(WizardEvent::StepChanged { step: Step::CollectIdentity });
                Ok(appointment)
            }
            Err(err) => {
                let message = err.user_message(BOOKING_FAILED_MESSAGE);
                warn!("Booking rejected: {}", err);
                session.state.last_error = Some(message.clone());
                drop(session);

                self.emit(WizardEvent::Failed { message: message.clone() });
                Err(if err.is_rejection() {
                    WizardError::Booking(message)
                } else {
                    WizardError::Unavailable(message)
                })
            }
        }
    }

    async fn load(&self, fetch: Fetch) {
        let list = fetch.list();
        let generation = fetch.generation();

        let result = match fetch {
            Fetch::Hospitals { .. } => self.service.list_hospitals().await.map(Fetched::Hospitals),
            Fetch::Doctors { hospital_id, .. } => {
                self.service.list_doctors(hospital_id).await.map(Fetched::Doctors)
            }
            Fetch::TimeSlots { doctor_id, .. } => {
                self.service.list_time_slots(doctor_id).await.map(Fetched::TimeSlots)
            }
        };

        let mut session = self.session.write().await;
        if !session.generations.is_current(list, generation) {
            debug!("Discarding superseded {:?} response", list);
            return;
        }

        let event = match result {
            Ok(fetched) => {
                let count = match fetched {
                    Fetched::Hospitals(items) => fill(&mut session.state.hospitals, items),
                    Fetched::Doctors(items) => fill(&mut session.state.doctors, items),
                    Fetched::TimeSlots(items) => fill(&mut session.state.time_slots, items),
                };
                session.state.last_error = None;
                debug!("Loaded {} {:?}", count, list);
                WizardEvent::ListLoaded { list, count }
            }
            Err(err) => {
                let message = err.user_message(list.load_failed_message());
                warn!("Failed to load {:?}: {}", list, err);
                match list {
                    ListKind::Hospitals => fail(&mut session.state.hospitals),
                    ListKind::Doctors => fail(&mut session.state.doctors),
                    ListKind::TimeSlots => fail(&mut session.state.time_slots),
                }
                session.state.last_error = Some(message.clone());
                WizardEvent::Failed { message }
            }
        };
        drop(session);

        self.emit(event);
    }

    fn emit(&self, event: WizardEvent) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
    }
}

fn ensure_ready(state: &WizardState, expected: Step) -> Result<(), WizardError> {
    if state.pending {
        return Err(WizardError::Busy);
    }
    if state.step != expected {
        return Err(WizardError::WrongStep {
            expected,
            actual: state.step,
        });
    }
    Ok(())
}

fn fill<T>(list: &mut RemoteList<T>, items: Vec<T>) -> usize {
    list.status = LoadStatus::Loaded;
    list.items = items;
    list.items.len()
}

fn fail<T>(list: &mut RemoteList<T>) {
    list.status = LoadStatus::Failed;
    list.items.clear();
}
