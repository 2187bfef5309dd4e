use crate::domain::payment::PaymentRequest;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;

pub async fn create_payment(State(state): State<AppState>, Json(req): Json<PaymentRequest>) -> impl IntoResponse {
    if req.amount <= Decimal::ZERO {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "amount must be > 0"})),
        )
            .into_response();
    }

    match state.dispatcher.enqueue_payment(req).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
