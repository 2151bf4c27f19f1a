use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

// POST /api/payment/sandbox
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxPaymentRequest {
    pub reservation_id: Option<String>,
    pub amount: Option<f64>,
    /// Accepted for parity with a real checkout form; never stored or logged.
    #[allow(dead_code)]
    pub card_details: Option<serde_json::Value>,
}

pub async fn sandbox_payment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SandboxPaymentRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (Some(reservation_id), Some(amount)) = (
        body.reservation_id.filter(|v| !v.trim().is_empty()),
        body.amount,
    ) else {
        return Err(AppError::Validation(
            "reservationId and amount are required".to_string(),
        ));
    };
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }

    let outcome = state
        .payments
        .charge(&reservation_id, amount)
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    let mut body = serde_json::to_value(&outcome)?;
    body["reservationId"] = serde_json::json!(reservation_id);
    if outcome.success {
        body["amount"] = serde_json::json!(amount);
    }

    Ok((status, Json(body)).into_response())
}

// GET /api/payment/verify/:transaction_id
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Result<Response, AppError> {
    let verification = state
        .payments
        .verify(&transaction_id)
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    if verification.valid {
        Ok(Json(serde_json::json!({
            "valid": true,
            "status": verification.status,
            "transactionId": transaction_id,
        }))
        .into_response())
    } else {
        Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "valid": false,
                "status": verification.status,
                "message": "Invalid transaction ID",
            })),
        )
            .into_response())
    }
}
