use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, PaymentStatus, TimeInterval};

/// Every interval on `date` that blocks new bookings: appointments that are not
/// cancelled, plus pending holds that have not yet expired at `now`.
pub fn commitments_for_day(
    conn: &Connection,
    date: &NaiveDate,
    now: &NaiveDateTime,
) -> Result<Vec<TimeInterval>, AppError> {
    let appointments = queries::get_active_appointments_for_day(conn, date)?;
    let holds = queries::get_live_reservations_for_day(conn, date, now)?;

    Ok(appointments
        .iter()
        .filter(|a| a.blocks_slot())
        .map(Appointment::interval)
        .chain(holds.iter().filter(|r| r.is_live(*now)).map(|r| r.interval()))
        .collect())
}

pub fn get_appointment(conn: &Connection, id: &str) -> Result<Appointment, AppError> {
    queries::get_appointment(conn, id)?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))
}

/// Cancels an appointment. The record stays; it just stops blocking its slot.
pub fn cancel_appointment(
    conn: &Connection,
    id: &str,
    now: NaiveDateTime,
) -> Result<Appointment, AppError> {
    let updated = queries::update_appointment_status(conn, id, AppointmentStatus::Cancelled, &now)?;
    if !updated {
        return Err(AppError::NotFound("Appointment not found".to_string()));
    }

    tracing::info!(appointment_id = id, "appointment cancelled");

    get_appointment(conn, id)
}

/// Staff status change along the allowed transitions.
pub fn update_status(
    conn: &Connection,
    id: &str,
    to: AppointmentStatus,
    now: NaiveDateTime,
) -> Result<Appointment, AppError> {
    let current = get_appointment(conn, id)?;
    if !current.status.can_transition_to(to) {
        return Err(AppError::InvalidState(format!(
            "cannot move appointment from {} to {}",
            current.status.as_str(),
            to.as_str()
        )));
    }

    if !queries::transition_appointment_status(conn, id, current.status, to, &now)? {
        return Err(AppError::InvalidState(
            "appointment changed while updating".to_string(),
        ));
    }

    tracing::info!(
        appointment_id = id,
        from = current.status.as_str(),
        to = to.as_str(),
        "appointment status updated"
    );

    get_appointment(conn, id)
}

/// Records a payment result against an appointment. A completed payment
/// confirms a pending appointment; a failed one drops a confirmed appointment
/// back to pending.
pub fn record_payment(
    conn: &Connection,
    id: &str,
    payment_status: PaymentStatus,
    transaction_id: &str,
    now: NaiveDateTime,
) -> Result<Appointment, AppError> {
    if payment_status == PaymentStatus::Completed && transaction_id.trim().is_empty() {
        return Err(AppError::Validation(
            "transactionId is required for a completed payment".to_string(),
        ));
    }

    let current = get_appointment(conn, id)?;
    if current.status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "appointment is {}",
            current.status.as_str()
        )));
    }

    let next = match (payment_status, current.status) {
        (PaymentStatus::Completed, AppointmentStatus::Pending) => AppointmentStatus::Confirmed,
        (PaymentStatus::Failed, AppointmentStatus::Confirmed) => AppointmentStatus::Pending,
        (_, status) => status,
    };

    let updated = queries::update_appointment_payment(
        conn,
        id,
        current.status,
        next,
        payment_status,
        transaction_id.trim(),
        &now,
    )?;
    if !updated {
        return Err(AppError::InvalidState(
            "appointment changed while updating".to_string(),
        ));
    }

    tracing::info!(
        appointment_id = id,
        payment_status = payment_status.as_str(),
        status = next.as_str(),
        "appointment payment recorded"
    );

    get_appointment(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::time::parse_date;
    use crate::models::{Customer, PaymentRecord, TimeOfDay};

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn seed(conn: &Connection, status: AppointmentStatus) -> Appointment {
        let created = dt("2025-06-10 10:00");
        let appointment = Appointment {
            id: "appt-1".to_string(),
            reservation_id: None,
            service_package_id: "pkg-1".to_string(),
            customer: Customer {
                name: "Dilan".to_string(),
                email: "dilan@example.com".to_string(),
                phone: "+94779998888".to_string(),
            },
            appointment_date: parse_date("2025-06-16").unwrap(),
            start_time: TimeOfDay::parse("09:00").unwrap(),
            end_time: TimeOfDay::parse("10:00").unwrap(),
            duration: 60,
            notes: String::new(),
            status,
            payment: PaymentRecord {
                amount: 1000.0,
                status: PaymentStatus::Completed,
                transaction_id: "TXN_1_abc".to_string(),
                payment_method: Some("sandbox".to_string()),
            },
            created_at: created,
            updated_at: created,
        };
        queries::create_appointment(conn, &appointment).unwrap();
        appointment
    }

    fn conn() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        conn.execute(
            "INSERT INTO service_packages (id, name, description, category, price, duration_minutes, booking_windows, status, created_at)
             VALUES ('pkg-1', 'Wash', 'Exterior wash', 'detailing', 2500, 60, '[]', 'active', '2025-06-01 08:00:00')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_complete_confirmed_appointment() {
        let conn = conn();
        seed(&conn, AppointmentStatus::Confirmed);

        let done = update_status(&conn, "appt-1", AppointmentStatus::Completed, dt("2025-06-16 10:05")).unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);
        assert_eq!(done.updated_at, dt("2025-06-16 10:05"));

        // Completed appointments still occupy their slot.
        let date = parse_date("2025-06-16").unwrap();
        assert_eq!(commitments_for_day(&conn, &date, &dt("2025-06-16 10:05")).unwrap().len(), 1);
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let conn = conn();
        seed(&conn, AppointmentStatus::Cancelled);

        let result = update_status(&conn, "appt-1", AppointmentStatus::Confirmed, dt("2025-06-16 10:05"));
        assert!(matches!(result, Err(AppError::InvalidState(_))));
        let result = record_payment(&conn, "appt-1", PaymentStatus::Completed, "TXN_2_def", dt("2025-06-16 10:05"));
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_update_status_missing() {
        let conn = conn();
        let result = update_status(&conn, "nope", AppointmentStatus::Completed, dt("2025-06-16 10:05"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_failed_then_completed_payment() {
        let conn = conn();
        seed(&conn, AppointmentStatus::Confirmed);

        let failed = record_payment(&conn, "appt-1", PaymentStatus::Failed, "", dt("2025-06-11 09:00")).unwrap();
        assert_eq!(failed.status, AppointmentStatus::Pending);
        assert_eq!(failed.payment.status, PaymentStatus::Failed);

        let paid = record_payment(&conn, "appt-1", PaymentStatus::Completed, "TXN_9_xyz", dt("2025-06-11 09:30")).unwrap();
        assert_eq!(paid.status, AppointmentStatus::Confirmed);
        assert_eq!(paid.payment.transaction_id, "TXN_9_xyz");
    }

    #[test]
    fn test_completed_payment_needs_transaction() {
        let conn = conn();
        seed(&conn, AppointmentStatus::Pending);
        let result = record_payment(&conn, "appt-1", PaymentStatus::Completed, " ", dt("2025-06-11 09:00"));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unknown_stored_status_is_an_error() {
        let conn = conn();
        seed(&conn, AppointmentStatus::Confirmed);
        conn.execute("UPDATE appointments SET status = 'bogus' WHERE id = 'appt-1'", [])
            .unwrap();
        assert!(matches!(get_appointment(&conn, "appt-1"), Err(AppError::Internal(_))));
    }
}
