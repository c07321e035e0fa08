use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_wizard_cell::{booking_wizard_routes, BookingAppState};

pub fn create_router(state: Arc<BookingAppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Booking Wizard API is running!" }))
        .nest("/booking", booking_wizard_routes(state))
}
