use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{BookingWindow, PackageStatus, ServicePackage};
use crate::services::catalog::{self, NewPackage};
use crate::state::AppState;

// POST /api/packages
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<u32>,
    pub booking_time_windows: Option<Vec<BookingWindow>>,
    pub status: Option<PackageStatus>,
}

pub async fn create_package(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePackageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ServicePackage>), AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (Some(name), Some(description), Some(category), Some(price), Some(duration)) = (
        body.name,
        body.description,
        body.category,
        body.price,
        body.duration,
    ) else {
        return Err(AppError::Validation(
            "name, description, category, price and duration are required".to_string(),
        ));
    };

    let new = NewPackage {
        name,
        description,
        category,
        price,
        duration_minutes: duration,
        booking_windows: body.booking_time_windows,
        status: body.status,
    };

    let pkg = {
        let db = state.conn()?;
        catalog::create_package(&db, new, Utc::now().naive_utc())?
    };

    Ok((StatusCode::CREATED, Json(pkg)))
}

// GET /api/packages/:id
pub async fn get_package(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServicePackage>, AppError> {
    let db = state.conn()?;
    Ok(Json(catalog::get_package(&db, &id)?))
}
