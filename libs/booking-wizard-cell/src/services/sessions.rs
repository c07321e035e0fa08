use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::services::directory::AppointmentService;
use crate::services::wizard::BookingWizard;

struct SessionEntry {
    wizard: Arc<BookingWizard>,
    last_active: DateTime<Utc>,
}

/// Live wizard instances keyed by session id.
pub struct WizardSessions {
    service: Arc<dyn AppointmentService>,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    ttl: Duration,
}

impl WizardSessions {
    pub fn new(service: Arc<dyn AppointmentService>, ttl: Duration) -> Self {
        Self {
            service,
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn service(&self) -> &Arc<dyn AppointmentService> {
        &self.service
    }

    pub async fn create(&self, user_id: Option<Uuid>) -> (Uuid, Arc<BookingWizard>) {
        let session_id = Uuid::new_v4();
        let wizard = Arc::new(BookingWizard::for_user(self.service.clone(), user_id));

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session_id,
            SessionEntry {
                wizard: wizard.clone(),
                last_active: Utc::now(),
            },
        );

        debug!("Created booking session {}", session_id);
        (session_id, wizard)
    }

    /// Looks a session up and marks it active.
    pub async fn get(&self, session_id: Uuid) -> Option<Arc<BookingWizard>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&session_id)?;
        entry.last_active = Utc::now();
        Some(entry.wizard.clone())
    }

    pub async fn remove(&self, session_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(&session_id).is_some();
        if removed {
            debug!("Removed booking session {}", session_id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drops sessions idle for longer than the configured TTL.
    pub async fn purge_expired(&self) -> usize {
        self.purge_idle_since(Utc::now() - self.ttl).await
    }

    async fn purge_idle_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_active >= cutoff);
        let purged = before - sessions.len();

        if purged > 0 {
            info!("Purged {} idle booking sessions", purged);
        }
        purged
    }
}
