use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::booking::{Customer, PaymentRecord};
use crate::errors::AppError;
use super::time::{TimeInterval, TimeOfDay};

/// A time-boxed hold on a slot while the customer pays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub service_package_id: String,
    pub customer: Customer,
    pub appointment_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub duration: u32,
    pub notes: String,
    pub status: ReservationStatus,
    pub payment: PaymentRecord,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Reservation {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.appointment_date, self.start_time, self.end_time)
    }

    /// A pending hold expires with time alone; the stored status may lag behind.
    /// Confirmed and cancelled holds are settled and never expire.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        match self.status {
            ReservationStatus::Expired => true,
            ReservationStatus::Pending => now >= self.expires_at,
            ReservationStatus::Confirmed | ReservationStatus::Cancelled => false,
        }
    }

    /// Gate for acting on a hold: settled holds are `InvalidState`, lapsed
    /// ones `Expired`.
    pub fn ensure_actionable(&self, now: NaiveDateTime) -> Result<(), AppError> {
        if matches!(
            self.status,
            ReservationStatus::Confirmed | ReservationStatus::Cancelled
        ) {
            return Err(AppError::InvalidState(format!(
                "Reservation is no longer valid (status: {})",
                self.status.as_str()
            )));
        }
        if self.is_expired(now) {
            return Err(AppError::Expired("Reservation has expired".to_string()));
        }
        Ok(())
    }

    /// Whether the hold still blocks its slot.
    pub fn is_live(&self, now: NaiveDateTime) -> bool {
        self.status == ReservationStatus::Pending && !self.is_expired(now)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "expired" => Some(ReservationStatus::Expired),
            _ => None,
        }
    }
}
