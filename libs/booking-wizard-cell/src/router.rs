// libs/booking-wizard-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, BookingAppState};

pub fn booking_wizard_routes(state: Arc<BookingAppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/{session_id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        // One route per wizard transition
        .route("/sessions/{session_id}/identity", post(handlers::submit_identity))
        .route("/sessions/{session_id}/hospital", post(handlers::select_hospital))
        .route("/sessions/{session_id}/doctor", post(handlers::select_doctor))
        .route("/sessions/{session_id}/time-slot", post(handlers::select_time_slot))
        .route("/sessions/{session_id}/confirm", post(handlers::confirm_booking))
        .route("/sessions/{session_id}/back", post(handlers::go_back))
        .route("/sessions/{session_id}/retry", post(handlers::retry_fetch))
        .with_state(state)
}
