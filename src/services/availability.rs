use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::config::BookingPolicy;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ServicePackage, TimeInterval};
use crate::services::conflict::has_conflict;
use crate::services::ledger;

#[derive(Debug, Clone)]
pub struct SlotListing {
    pub date: NaiveDate,
    pub package: ServicePackage,
    pub slots: Vec<TimeInterval>,
}

/// Loads a package that can currently be booked.
pub fn find_active_package(conn: &Connection, id: &str) -> Result<ServicePackage, AppError> {
    match queries::get_package(conn, id)? {
        Some(pkg) if pkg.is_active() => Ok(pkg),
        _ => Err(AppError::NotFound("Service package not found".to_string())),
    }
}

/// Steps through each booking window in configured order, keeping every start
/// whose full duration fits inside the window and clears `commitments`.
pub fn generate_slots(
    pkg: &ServicePackage,
    date: NaiveDate,
    commitments: &[TimeInterval],
    policy: &BookingPolicy,
) -> Result<Vec<TimeInterval>, AppError> {
    let step = policy.slot_step_minutes.max(1);
    let mut slots = Vec::new();

    for window in &pkg.booking_windows {
        let (window_start, window_end) = window.bounds()?;

        let mut start = window_start;
        while start < window_end {
            let candidate = TimeInterval::with_duration(date, start, pkg.duration_minutes);
            if candidate.end > window_end {
                // Later starts only end later.
                break;
            }
            if !has_conflict(&candidate, commitments, policy.buffer_minutes) {
                slots.push(candidate);
            }
            start = start.plus_minutes(step);
        }
    }

    Ok(slots)
}

pub fn available_slots(
    conn: &Connection,
    service_id: &str,
    date: NaiveDate,
    now: NaiveDateTime,
    policy: &BookingPolicy,
) -> Result<SlotListing, AppError> {
    let package = find_active_package(conn, service_id)?;
    let commitments = ledger::commitments_for_day(conn, &date, &now)?;
    let slots = generate_slots(&package, date, &commitments, policy)?;

    tracing::debug!(
        service_id,
        date = %date,
        blocked = commitments.len(),
        available = slots.len(),
        "computed available slots"
    );

    Ok(SlotListing {
        date,
        package,
        slots,
    })
}
