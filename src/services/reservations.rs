use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::config::BookingPolicy;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Appointment, AppointmentStatus, Customer, PaymentRecord, PaymentStatus, Reservation,
    ReservationStatus, TimeInterval, TimeOfDay,
};
use crate::services::availability::find_active_package;
use crate::services::conflict::has_conflict;
use crate::services::ledger;

const PAYMENT_METHOD: &str = "sandbox";

#[derive(Debug, Clone)]
pub struct HoldRequest {
    pub service_package_id: String,
    pub customer: Customer,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub notes: String,
}

/// Places a pending hold on the requested slot.
///
/// The conflict check and the insert share one immediate transaction, taken
/// while the caller holds the connection, so two overlapping holds can never
/// both commit.
pub fn initiate(
    conn: &mut Connection,
    request: HoldRequest,
    now: NaiveDateTime,
    policy: &BookingPolicy,
) -> Result<Reservation, AppError> {
    request.customer.validate()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let package = find_active_package(&tx, &request.service_package_id)?;
    let interval =
        TimeInterval::with_duration(request.date, request.start_time, package.duration_minutes);
    if !interval.end.is_same_day() {
        return Err(AppError::Validation(format!(
            "a {} minute service starting at {} would run past midnight",
            package.duration_minutes, request.start_time
        )));
    }

    let commitments = ledger::commitments_for_day(&tx, &request.date, &now)?;
    if has_conflict(&interval, &commitments, policy.buffer_minutes) {
        tracing::warn!(
            service_id = %package.id,
            date = %request.date,
            start = %request.start_time,
            "requested slot is taken"
        );
        return Err(AppError::Conflict(
            "Time slot is no longer available. Please select another time.".to_string(),
        ));
    }

    let reservation = Reservation {
        id: Uuid::new_v4().to_string(),
        service_package_id: package.id,
        customer: request.customer,
        appointment_date: interval.date,
        start_time: interval.start,
        end_time: interval.end,
        duration: package.duration_minutes,
        notes: request.notes,
        status: ReservationStatus::Pending,
        payment: PaymentRecord::pending(policy.booking_fee),
        expires_at: now + Duration::minutes(i64::from(policy.hold_minutes)),
        created_at: now,
    };

    queries::create_reservation(&tx, &reservation)?;
    tx.commit()?;

    tracing::info!(
        reservation_id = %reservation.id,
        date = %reservation.appointment_date,
        start = %reservation.start_time,
        end = %reservation.end_time,
        expires_at = %reservation.expires_at,
        "reservation hold created"
    );

    Ok(reservation)
}

/// Turns a paid hold into an appointment.
///
/// The slot is not re-checked: the live hold already owns it.
pub fn confirm(
    conn: &mut Connection,
    reservation_id: &str,
    transaction_id: &str,
    now: NaiveDateTime,
) -> Result<Appointment, AppError> {
    if transaction_id.trim().is_empty() {
        return Err(AppError::Validation("transactionId is required".to_string()));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let reservation = queries::get_reservation(&tx, reservation_id)?
        .ok_or_else(|| AppError::NotFound("Reservation not found".to_string()))?;

    if let Err(e) = reservation.ensure_actionable(now) {
        tracing::warn!(
            reservation_id,
            status = reservation.status.as_str(),
            expires_at = %reservation.expires_at,
            "confirm rejected"
        );
        return Err(e);
    }

    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        reservation_id: Some(reservation.id.clone()),
        service_package_id: reservation.service_package_id,
        customer: reservation.customer,
        appointment_date: reservation.appointment_date,
        start_time: reservation.start_time,
        end_time: reservation.end_time,
        duration: reservation.duration,
        notes: reservation.notes,
        status: AppointmentStatus::Confirmed,
        payment: PaymentRecord {
            amount: reservation.payment.amount,
            status: PaymentStatus::Completed,
            transaction_id: transaction_id.to_string(),
            payment_method: Some(PAYMENT_METHOD.to_string()),
        },
        created_at: now,
        updated_at: now,
    };

    queries::create_appointment(&tx, &appointment)?;
    if !queries::mark_reservation_paid(&tx, &reservation.id, transaction_id)? {
        return Err(AppError::InvalidState(
            "Reservation is no longer valid".to_string(),
        ));
    }
    tx.commit()?;

    tracing::info!(
        reservation_id,
        appointment_id = %appointment.id,
        transaction_id,
        "reservation confirmed"
    );

    Ok(appointment)
}

/// Releases a pending hold before it lapses.
pub fn cancel_reservation(
    conn: &mut Connection,
    reservation_id: &str,
    now: NaiveDateTime,
) -> Result<Reservation, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut reservation = queries::get_reservation(&tx, reservation_id)?
        .ok_or_else(|| AppError::NotFound("Reservation not found".to_string()))?;

    reservation.ensure_actionable(now)?;

    queries::update_reservation_status(&tx, reservation_id, ReservationStatus::Cancelled)?;
    tx.commit()?;

    tracing::info!(reservation_id, "reservation cancelled");

    reservation.status = ReservationStatus::Cancelled;
    Ok(reservation)
}

/// Maintenance pass flagging lapsed holds as expired. Readers never depend on it.
pub fn sweep_expired_reservations(conn: &Connection, now: NaiveDateTime) -> Result<usize, AppError> {
    let expired = queries::expire_stale_reservations(conn, &now)?;
    if expired > 0 {
        tracing::info!(expired, "swept expired reservations");
    }
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::db;
    use crate::models::service_package::BookingWindow;
    use crate::models::time::parse_date;
    use crate::models::{PackageStatus, ServicePackage};

    const PKG_ID: &str = "pkg-oil";

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        let pkg = ServicePackage {
            id: PKG_ID.to_string(),
            name: "Oil Change".to_string(),
            description: "Engine oil and filter".to_string(),
            category: "maintenance".to_string(),
            price: 8500.0,
            duration_minutes: 30,
            booking_windows: vec![BookingWindow::new("09:00", "17:00")],
            status: PackageStatus::Active,
            created_at: dt("2025-06-01 08:00"),
        };
        queries::create_package(&conn, &pkg).unwrap();
        conn
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn now() -> NaiveDateTime {
        dt("2025-06-10 10:00")
    }

    fn request(start: &str) -> HoldRequest {
        HoldRequest {
            service_package_id: PKG_ID.to_string(),
            customer: Customer {
                name: "Ayesha Fernando".to_string(),
                email: "ayesha@example.com".to_string(),
                phone: "+94712345678".to_string(),
            },
            date: parse_date("2025-06-16").unwrap(),
            start_time: TimeOfDay::parse(start).unwrap(),
            notes: "Toyota Aqua, WP CAB-1234".to_string(),
        }
    }

    fn count_reservations(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM reservations", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_initiate_creates_pending_hold() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        let r = initiate(&mut conn, request("10:00"), now(), &policy).unwrap();

        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(r.end_time.to_string(), "10:30");
        assert_eq!(r.duration, 30);
        assert_eq!(r.payment.amount, 1000.0);
        assert_eq!(r.payment.status, PaymentStatus::Pending);
        assert_eq!(r.expires_at, dt("2025-06-10 10:15"));

        let stored = queries::get_reservation(&conn, &r.id).unwrap().unwrap();
        assert_eq!(stored.customer, r.customer);
        assert_eq!(stored.start_time, r.start_time);
    }

    #[test]
    fn test_initiate_unknown_package() {
        let mut conn = setup_db();
        let mut req = request("10:00");
        req.service_package_id = "nope".to_string();
        let result = initiate(&mut conn, req, now(), &BookingPolicy::default());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_initiate_invalid_customer() {
        let mut conn = setup_db();
        let mut req = request("10:00");
        req.customer.email = "not-an-email".to_string();
        let result = initiate(&mut conn, req, now(), &BookingPolicy::default());
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(count_reservations(&conn), 0);
    }

    #[test]
    fn test_initiate_past_midnight_rejected() {
        let mut conn = setup_db();
        let result = initiate(&mut conn, request("23:45"), now(), &BookingPolicy::default());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_hold_ending_at_midnight_round_trips() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        let r = initiate(&mut conn, request("23:30"), now(), &policy).unwrap();
        assert_eq!(r.end_time.to_string(), "24:00");

        let stored = queries::get_reservation(&conn, &r.id).unwrap().unwrap();
        assert_eq!(stored.end_time, r.end_time);

        let date = parse_date("2025-06-16").unwrap();
        assert_eq!(ledger::commitments_for_day(&conn, &date, &now()).unwrap().len(), 1);
        assert!(initiate(&mut conn, request("09:00"), now(), &policy).is_ok());

        let a = confirm(&mut conn, &r.id, "TXN_1_abc", now()).unwrap();
        let stored = ledger::get_appointment(&conn, &a.id).unwrap();
        assert_eq!(stored.end_time.to_string(), "24:00");
    }

    #[test]
    fn test_oversized_stored_duration_is_rejected_not_panicking() {
        let mut conn = setup_db();
        conn.execute(
            "UPDATE service_packages SET duration_minutes = ?1 WHERE id = ?2",
            rusqlite::params![u32::MAX, PKG_ID],
        )
        .unwrap();

        let result = initiate(&mut conn, request("09:00"), now(), &BookingPolicy::default());
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(count_reservations(&conn), 0);
    }

    #[test]
    fn test_overlapping_hold_conflicts_without_writing() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        initiate(&mut conn, request("10:00"), now(), &policy).unwrap();

        let result = initiate(&mut conn, request("10:15"), now(), &policy);
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(count_reservations(&conn), 1);
    }

    #[test]
    fn test_buffer_enforced_between_holds() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        initiate(&mut conn, request("09:00"), now(), &policy).unwrap();

        assert!(matches!(
            initiate(&mut conn, request("09:35"), now(), &policy),
            Err(AppError::Conflict(_))
        ));
        assert!(initiate(&mut conn, request("09:50"), now(), &policy).is_ok());
    }

    #[test]
    fn test_expired_hold_no_longer_blocks() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        initiate(&mut conn, request("10:00"), now(), &policy).unwrap();

        let later = now() + Duration::minutes(16);
        let date = parse_date("2025-06-16").unwrap();
        assert!(ledger::commitments_for_day(&conn, &date, &later).unwrap().is_empty());
        assert!(initiate(&mut conn, request("10:00"), later, &policy).is_ok());
    }

    #[test]
    fn test_confirm_copies_hold_into_appointment() {
        let mut conn = setup_db();
        let r = initiate(&mut conn, request("11:00"), now(), &BookingPolicy::default()).unwrap();

        let a = confirm(&mut conn, &r.id, "TXN_1_abc", now() + Duration::minutes(5)).unwrap();
        assert_eq!(a.status, AppointmentStatus::Confirmed);
        assert_eq!(a.service_package_id, r.service_package_id);
        assert_eq!(a.customer, r.customer);
        assert_eq!(a.appointment_date, r.appointment_date);
        assert_eq!(a.start_time, r.start_time);
        assert_eq!(a.end_time, r.end_time);
        assert_eq!(a.duration, r.duration);
        assert_eq!(a.notes, r.notes);
        assert_eq!(a.payment.amount, r.payment.amount);
        assert_eq!(a.payment.status, PaymentStatus::Completed);
        assert_eq!(a.payment.transaction_id, "TXN_1_abc");
        assert_eq!(a.reservation_id.as_deref(), Some(r.id.as_str()));

        let stored = queries::get_reservation(&conn, &r.id).unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Confirmed);
        assert_eq!(stored.payment.transaction_id, "TXN_1_abc");
    }

    #[test]
    fn test_confirm_twice_is_invalid_state() {
        let mut conn = setup_db();
        let r = initiate(&mut conn, request("11:00"), now(), &BookingPolicy::default()).unwrap();

        confirm(&mut conn, &r.id, "TXN_1_abc", now()).unwrap();
        let second = confirm(&mut conn, &r.id, "TXN_1_abc", now());
        assert!(matches!(second, Err(AppError::InvalidState(_))));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_confirm_again_after_hold_window_is_invalid_state() {
        let mut conn = setup_db();
        let r = initiate(&mut conn, request("11:00"), now(), &BookingPolicy::default()).unwrap();

        confirm(&mut conn, &r.id, "TXN_1_abc", now() + Duration::minutes(5)).unwrap();
        let later = now() + Duration::minutes(30);
        let second = confirm(&mut conn, &r.id, "TXN_1_abc", later);
        assert!(matches!(second, Err(AppError::InvalidState(_))));

        let cancel = cancel_reservation(&mut conn, &r.id, later);
        assert!(matches!(cancel, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_confirm_after_expiry() {
        let mut conn = setup_db();
        let r = initiate(&mut conn, request("11:00"), now(), &BookingPolicy::default()).unwrap();

        let result = confirm(&mut conn, &r.id, "TXN_1_abc", now() + Duration::minutes(20));
        assert!(matches!(result, Err(AppError::Expired(_))));

        let stored = queries::get_reservation(&conn, &r.id).unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Pending);
    }

    #[test]
    fn test_confirm_missing_reservation() {
        let mut conn = setup_db();
        let result = confirm(&mut conn, "missing", "TXN_1_abc", now());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_confirm_requires_transaction_id() {
        let mut conn = setup_db();
        let r = initiate(&mut conn, request("11:00"), now(), &BookingPolicy::default()).unwrap();
        let result = confirm(&mut conn, &r.id, " ", now());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_confirmed_appointment_keeps_blocking_after_hold_window() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        let r = initiate(&mut conn, request("11:00"), now(), &policy).unwrap();
        confirm(&mut conn, &r.id, "TXN_1_abc", now()).unwrap();

        let next_day = now() + Duration::days(1);
        let result = initiate(&mut conn, request("11:00"), next_day, &policy);
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_cancelled_appointment_frees_slot() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        let r = initiate(&mut conn, request("14:00"), now(), &policy).unwrap();
        let a = confirm(&mut conn, &r.id, "TXN_1_abc", now()).unwrap();

        assert!(matches!(
            initiate(&mut conn, request("14:00"), now(), &policy),
            Err(AppError::Conflict(_))
        ));

        let cancelled = ledger::cancel_appointment(&conn, &a.id, now()).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        assert!(initiate(&mut conn, request("14:00"), now(), &policy).is_ok());
    }

    #[test]
    fn test_cancel_missing_appointment() {
        let conn = setup_db();
        let result = ledger::cancel_appointment(&conn, "missing", now());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_cancel_reservation_releases_slot() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        let r = initiate(&mut conn, request("15:00"), now(), &policy).unwrap();

        let cancelled = cancel_reservation(&mut conn, &r.id, now()).unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert!(initiate(&mut conn, request("15:00"), now(), &policy).is_ok());

        let again = cancel_reservation(&mut conn, &r.id, now());
        assert!(matches!(again, Err(AppError::InvalidState(_))));

        let confirm_cancelled = confirm(&mut conn, &r.id, "TXN_1_abc", now());
        assert!(matches!(confirm_cancelled, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_sweep_marks_lapsed_holds_once() {
        let mut conn = setup_db();
        let policy = BookingPolicy::default();
        let lapsed = initiate(&mut conn, request("09:00"), now(), &policy).unwrap();
        let fresh_time = now() + Duration::minutes(10);
        let fresh = initiate(&mut conn, request("12:00"), fresh_time, &policy).unwrap();

        let sweep_time = now() + Duration::minutes(16);
        assert_eq!(sweep_expired_reservations(&conn, sweep_time).unwrap(), 1);
        assert_eq!(sweep_expired_reservations(&conn, sweep_time).unwrap(), 0);

        let stored = queries::get_reservation(&conn, &lapsed.id).unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Expired);
        let stored = queries::get_reservation(&conn, &fresh.id).unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Pending);

        let result = confirm(&mut conn, &lapsed.id, "TXN_1_abc", now());
        assert!(matches!(result, Err(AppError::Expired(_))));
    }

    #[test]
    fn test_concurrent_overlapping_holds_admit_one() {
        let conn = Arc::new(Mutex::new(setup_db()));
        let starts = ["10:00", "10:00", "10:15", "10:30", "09:45", "10:05"];

        let handles: Vec<_> = starts
            .iter()
            .map(|start| {
                let conn = Arc::clone(&conn);
                let req = request(start);
                std::thread::spawn(move || {
                    let mut guard = conn.lock().unwrap();
                    initiate(&mut guard, req, now(), &BookingPolicy::default())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(AppError::Conflict(_)))));
    }
}
