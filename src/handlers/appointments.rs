use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::time::parse_date;
use crate::models::{
    Appointment, AppointmentStatus, Customer, PaymentRecord, PaymentStatus, Reservation,
    ServicePackage, TimeOfDay,
};
use crate::services::reservations::HoldRequest;
use crate::services::{availability, ledger, reservations};
use crate::state::AppState;

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Appointment with its service package inlined.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub service_package: Option<ServicePackage>,
}

impl AppointmentResponse {
    fn load(conn: &rusqlite::Connection, appointment: Appointment) -> Result<Self, AppError> {
        let service_package = queries::get_package(conn, &appointment.service_package_id)?;
        Ok(Self {
            appointment,
            service_package,
        })
    }
}

// GET /api/appointments/available
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableQuery {
    pub date: Option<String>,
    pub service_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    start_time: TimeOfDay,
    end_time: TimeOfDay,
    duration: u32,
    available: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableResponse {
    date: NaiveDate,
    service_id: String,
    service_name: String,
    duration: u32,
    available_slots: Vec<SlotResponse>,
}

pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AvailableQuery>, QueryRejection>,
) -> Result<Json<AvailableResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let date = parse_date(required(&query.date, "date")?)?;
    let service_id = required(&query.service_id, "serviceId")?;

    let listing = {
        let db = state.conn()?;
        availability::available_slots(&db, service_id, date, now(), &state.config.booking)?
    };

    let duration = listing.package.duration_minutes;
    Ok(Json(AvailableResponse {
        date: listing.date,
        service_id: listing.package.id,
        service_name: listing.package.name,
        duration,
        available_slots: listing
            .slots
            .into_iter()
            .map(|slot| SlotResponse {
                start_time: slot.start,
                end_time: slot.end,
                duration,
                available: true,
            })
            .collect(),
    }))
}

// POST /api/appointments/initiate
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub service_package_id: Option<String>,
    pub customer: Option<Customer>,
    pub appointment_date: Option<String>,
    pub start_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    reservation_id: String,
    service_package: Option<ServicePackage>,
    appointment_date: NaiveDate,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
    duration: u32,
    customer: Customer,
    notes: String,
    payment: PaymentRecord,
    expires_at: NaiveDateTime,
}

impl InitiateResponse {
    fn new(reservation: Reservation, service_package: Option<ServicePackage>) -> Self {
        Self {
            reservation_id: reservation.id,
            service_package,
            appointment_date: reservation.appointment_date,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            duration: reservation.duration,
            customer: reservation.customer,
            notes: reservation.notes,
            payment: reservation.payment,
            expires_at: reservation.expires_at,
        }
    }
}

pub async fn initiate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InitiateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InitiateResponse>), AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (Some(service_package_id), Some(customer), Some(date), Some(start)) = (
        body.service_package_id.filter(|v| !v.trim().is_empty()),
        body.customer,
        body.appointment_date,
        body.start_time,
    ) else {
        return Err(AppError::Validation(
            "servicePackageId, customer, appointmentDate, and startTime are required".to_string(),
        ));
    };

    let request = HoldRequest {
        service_package_id: service_package_id.trim().to_string(),
        customer,
        date: parse_date(&date)?,
        start_time: TimeOfDay::parse(start.trim())?,
        notes: body.notes.unwrap_or_default(),
    };

    let response = {
        let mut db = state.conn()?;
        let reservation = reservations::initiate(&mut db, request, now(), &state.config.booking)?;
        let package = queries::get_package(&db, &reservation.service_package_id)?;
        InitiateResponse::new(reservation, package)
    };

    Ok((StatusCode::CREATED, Json(response)))
}

// POST /api/appointments/confirm
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub reservation_id: Option<String>,
    pub transaction_id: Option<String>,
}

pub async fn confirm(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let reservation_id = required(&body.reservation_id, "reservationId")?;
    let transaction_id = required(&body.transaction_id, "transactionId")?;

    let response = {
        let mut db = state.conn()?;
        let appointment = reservations::confirm(&mut db, reservation_id, transaction_id, now())?;
        AppointmentResponse::load(&db, appointment)?
    };

    Ok((StatusCode::CREATED, Json(response)))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let db = state.conn()?;
    let appointment = ledger::get_appointment(&db, &id)?;
    Ok(Json(AppointmentResponse::load(&db, appointment)?))
}

// PUT /api/appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let db = state.conn()?;
    let appointment = ledger::cancel_appointment(&db, &id, now())?;
    Ok(Json(AppointmentResponse::load(&db, appointment)?))
}

// PUT /api/appointments/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<AppointmentStatus>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let status = body
        .status
        .ok_or_else(|| AppError::Validation("status is required".to_string()))?;

    let db = state.conn()?;
    let appointment = ledger::update_status(&db, &id, status, now())?;
    Ok(Json(AppointmentResponse::load(&db, appointment)?))
}

// PUT /api/appointments/:id/payment
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payment_status: Option<PaymentStatus>,
    pub transaction_id: Option<String>,
}

pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePaymentRequest>, JsonRejection>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let payment_status = body
        .payment_status
        .ok_or_else(|| AppError::Validation("paymentStatus is required".to_string()))?;
    let transaction_id = body.transaction_id.unwrap_or_default();

    let db = state.conn()?;
    let appointment = ledger::record_payment(&db, &id, payment_status, &transaction_id, now())?;
    Ok(Json(AppointmentResponse::load(&db, appointment)?))
}

// POST /api/reservations/:id/cancel
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, AppError> {
    let mut db = state.conn()?;
    let reservation = reservations::cancel_reservation(&mut db, &id, now())?;
    Ok(Json(reservation))
}
