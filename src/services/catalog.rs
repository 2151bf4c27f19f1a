use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::service_package::default_windows;
use crate::models::{BookingWindow, PackageStatus, ServicePackage};

#[derive(Debug, Clone)]
pub struct NewPackage {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub duration_minutes: u32,
    pub booking_windows: Option<Vec<BookingWindow>>,
    pub status: Option<PackageStatus>,
}

pub fn create_package(
    conn: &Connection,
    new: NewPackage,
    now: NaiveDateTime,
) -> Result<ServicePackage, AppError> {
    let pkg = ServicePackage {
        id: Uuid::new_v4().to_string(),
        name: new.name.trim().to_string(),
        description: new.description.trim().to_string(),
        category: new.category.trim().to_string(),
        price: new.price,
        duration_minutes: new.duration_minutes,
        booking_windows: new.booking_windows.unwrap_or_else(default_windows),
        status: new.status.unwrap_or(PackageStatus::Active),
        created_at: now,
    };
    pkg.validate()?;

    queries::create_package(conn, &pkg)?;
    tracing::info!(package_id = %pkg.id, name = %pkg.name, "service package created");

    Ok(pkg)
}

pub fn get_package(conn: &Connection, id: &str) -> Result<ServicePackage, AppError> {
    queries::get_package(conn, id)?
        .ok_or_else(|| AppError::NotFound("Package not found".to_string()))
}
