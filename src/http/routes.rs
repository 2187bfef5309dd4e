use crate::http::handlers::{payments, summary};
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(payments::health))
        .route("/payments", post(payments::create_payment))
        .route("/payments-summary", get(summary::get_summary))
        .with_state(state)
}
