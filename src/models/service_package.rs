use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::time::{TimeOfDay, MINUTES_PER_DAY};
use crate::errors::AppError;

/// A daily recurring range during which a package may be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingWindow {
    pub start: String,
    pub end: String,
}

impl BookingWindow {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn bounds(&self) -> Result<(TimeOfDay, TimeOfDay), AppError> {
        let start = TimeOfDay::parse(&self.start)?;
        let end = TimeOfDay::parse(&self.end)?;
        if start >= end {
            return Err(AppError::Validation(format!(
                "booking window {}-{} must start before it ends",
                self.start, self.end
            )));
        }
        Ok((start, end))
    }
}

pub fn default_windows() -> Vec<BookingWindow> {
    vec![BookingWindow::new("09:00", "17:00")]
}

/// Parses a stored window list. Overlapping windows are kept as configured.
pub fn windows_from_json(s: &str) -> Result<Vec<BookingWindow>, AppError> {
    let windows: Vec<BookingWindow> = serde_json::from_str(s)?;
    for window in &windows {
        window.bounds()?;
    }
    Ok(windows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Active,
    Inactive,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Active => "active",
            PackageStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "inactive" => PackageStatus::Inactive,
            _ => PackageStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePackage {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    #[serde(rename = "bookingTimeWindows")]
    pub booking_windows: Vec<BookingWindow>,
    pub status: PackageStatus,
    pub created_at: NaiveDateTime,
}

impl ServicePackage {
    pub fn is_active(&self) -> bool {
        self.status == PackageStatus::Active
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("name", &self.name),
            ("description", &self.description),
            ("category", &self.category),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::Validation("price must be zero or more".to_string()));
        }
        if self.duration_minutes == 0 || self.duration_minutes > MINUTES_PER_DAY {
            return Err(AppError::Validation(format!(
                "duration must be between 1 and {MINUTES_PER_DAY} minutes"
            )));
        }
        for window in &self.booking_windows {
            window.bounds()?;
        }
        Ok(())
    }
}
