use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::AppError;
use crate::models::service_package::windows_from_json;
use crate::models::{
    Appointment, AppointmentStatus, Customer, PackageStatus, PaymentRecord, PaymentStatus,
    Reservation, ReservationStatus, ServicePackage, TimeOfDay,
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn parse_stored_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| AppError::Internal(format!("stored date {s:?} is malformed: {e}")))
}

fn parse_stored_datetime(s: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| AppError::Internal(format!("stored timestamp {s:?} is malformed: {e}")))
}

fn parse_stored_time(s: &str) -> Result<TimeOfDay, AppError> {
    TimeOfDay::parse(s).map_err(|e| AppError::Internal(format!("stored time is malformed: {e}")))
}

fn parse_stored_status<T>(s: &str, parse: fn(&str) -> Option<T>) -> Result<T, AppError> {
    parse(s).ok_or_else(|| AppError::Internal(format!("stored status {s:?} is unknown")))
}

// ── Service Packages ──

pub fn create_package(conn: &Connection, pkg: &ServicePackage) -> Result<(), AppError> {
    let windows = serde_json::to_string(&pkg.booking_windows)?;

    conn.execute(
        "INSERT INTO service_packages (id, name, description, category, price, duration_minutes, booking_windows, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            pkg.id,
            pkg.name,
            pkg.description,
            pkg.category,
            pkg.price,
            pkg.duration_minutes,
            windows,
            pkg.status.as_str(),
            format_datetime(&pkg.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_package(conn: &Connection, id: &str) -> Result<Option<ServicePackage>, AppError> {
    let row = conn
        .query_row(
            "SELECT id, name, description, category, price, duration_minutes, booking_windows, status, created_at
             FROM service_packages WHERE id = ?1",
            params![id],
            |row| Ok(parse_package_row(row)),
        )
        .optional()?;

    row.transpose()
}

fn parse_package_row(row: &rusqlite::Row) -> Result<ServicePackage, AppError> {
    let windows_json: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let created_at_str: String = row.get(8)?;

    Ok(ServicePackage {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        price: row.get(4)?,
        duration_minutes: row.get(5)?,
        booking_windows: windows_from_json(&windows_json)?,
        status: PackageStatus::parse(&status_str),
        created_at: parse_stored_datetime(&created_at_str)?,
    })
}

// ── Reservations ──

const RESERVATION_COLUMNS: &str = "id, service_package_id, customer_name, customer_email, customer_phone, \
     appointment_date, start_time, end_time, duration_minutes, notes, status, \
     payment_amount, payment_status, transaction_id, expires_at, created_at";

pub fn create_reservation(conn: &Connection, r: &Reservation) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO reservations (id, service_package_id, customer_name, customer_email, customer_phone,
             appointment_date, start_time, end_time, duration_minutes, notes, status,
             payment_amount, payment_status, transaction_id, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            r.id,
            r.service_package_id,
            r.customer.name,
            r.customer.email,
            r.customer.phone,
            format_date(&r.appointment_date),
            r.start_time.to_string(),
            r.end_time.to_string(),
            r.duration,
            r.notes,
            r.status.as_str(),
            r.payment.amount,
            r.payment.status.as_str(),
            r.payment.transaction_id,
            format_datetime(&r.expires_at),
            format_datetime(&r.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_reservation(conn: &Connection, id: &str) -> Result<Option<Reservation>, AppError> {
    let row = conn
        .query_row(
            &format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1"),
            params![id],
            |row| Ok(parse_reservation_row(row)),
        )
        .optional()?;

    row.transpose()
}

/// Pending holds on `date` whose expiry is still ahead of `now`.
pub fn get_live_reservations_for_day(
    conn: &Connection,
    date: &NaiveDate,
    now: &NaiveDateTime,
) -> Result<Vec<Reservation>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations
         WHERE appointment_date = ?1 AND status = 'pending' AND expires_at > ?2
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(params![format_date(date), format_datetime(now)], |row| {
        Ok(parse_reservation_row(row))
    })?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn update_reservation_status(
    conn: &Connection,
    id: &str,
    status: ReservationStatus,
) -> Result<bool, AppError> {
    let count = conn.execute(
        "UPDATE reservations SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn mark_reservation_paid(
    conn: &Connection,
    id: &str,
    transaction_id: &str,
) -> Result<bool, AppError> {
    let count = conn.execute(
        "UPDATE reservations SET status = 'confirmed', payment_status = 'completed', transaction_id = ?1
         WHERE id = ?2 AND status = 'pending'",
        params![transaction_id, id],
    )?;
    Ok(count > 0)
}

/// Flags pending holds whose expiry has passed. Safe to run repeatedly.
pub fn expire_stale_reservations(conn: &Connection, now: &NaiveDateTime) -> Result<usize, AppError> {
    let count = conn.execute(
        "UPDATE reservations SET status = 'expired' WHERE status = 'pending' AND expires_at <= ?1",
        params![format_datetime(now)],
    )?;
    Ok(count)
}

fn parse_reservation_row(row: &rusqlite::Row) -> Result<Reservation, AppError> {
    let date_str: String = row.get(5)?;
    let start_str: String = row.get(6)?;
    let end_str: String = row.get(7)?;
    let status_str: String = row.get(10)?;
    let payment_status_str: String = row.get(12)?;
    let expires_at_str: String = row.get(14)?;
    let created_at_str: String = row.get(15)?;

    Ok(Reservation {
        id: row.get(0)?,
        service_package_id: row.get(1)?,
        customer: Customer {
            name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
        },
        appointment_date: parse_stored_date(&date_str)?,
        start_time: parse_stored_time(&start_str)?,
        end_time: parse_stored_time(&end_str)?,
        duration: row.get(8)?,
        notes: row.get(9)?,
        status: parse_stored_status(&status_str, ReservationStatus::parse)?,
        payment: PaymentRecord {
            amount: row.get(11)?,
            status: PaymentStatus::parse(&payment_status_str),
            transaction_id: row.get(13)?,
            payment_method: None,
        },
        expires_at: parse_stored_datetime(&expires_at_str)?,
        created_at: parse_stored_datetime(&created_at_str)?,
    })
}

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, reservation_id, service_package_id, customer_name, customer_email, customer_phone, \
     appointment_date, start_time, end_time, duration_minutes, notes, status, \
     payment_amount, payment_status, transaction_id, payment_method, created_at, updated_at";

pub fn create_appointment(conn: &Connection, a: &Appointment) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO appointments (id, reservation_id, service_package_id, customer_name, customer_email, customer_phone,
             appointment_date, start_time, end_time, duration_minutes, notes, status,
             payment_amount, payment_status, transaction_id, payment_method, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            a.id,
            a.reservation_id,
            a.service_package_id,
            a.customer.name,
            a.customer.email,
            a.customer.phone,
            format_date(&a.appointment_date),
            a.start_time.to_string(),
            a.end_time.to_string(),
            a.duration,
            a.notes,
            a.status.as_str(),
            a.payment.amount,
            a.payment.status.as_str(),
            a.payment.transaction_id,
            a.payment.payment_method,
            format_datetime(&a.created_at),
            format_datetime(&a.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &str) -> Result<Option<Appointment>, AppError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            |row| Ok(parse_appointment_row(row)),
        )
        .optional()?;

    row.transpose()
}

/// Appointments on `date` that still occupy their slot.
pub fn get_active_appointments_for_day(
    conn: &Connection,
    date: &NaiveDate,
) -> Result<Vec<Appointment>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE appointment_date = ?1 AND status != 'cancelled'
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(params![format_date(date)], |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
    now: &NaiveDateTime,
) -> Result<bool, AppError> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_datetime(now), id],
    )?;
    Ok(count > 0)
}

/// Moves an appointment from `from` to `to`. Returns false when the row is
/// missing or no longer in `from`.
pub fn transition_appointment_status(
    conn: &Connection,
    id: &str,
    from: AppointmentStatus,
    to: AppointmentStatus,
    now: &NaiveDateTime,
) -> Result<bool, AppError> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        params![to.as_str(), format_datetime(now), id, from.as_str()],
    )?;
    Ok(count > 0)
}

pub fn update_appointment_payment(
    conn: &Connection,
    id: &str,
    from: AppointmentStatus,
    to: AppointmentStatus,
    payment_status: PaymentStatus,
    transaction_id: &str,
    now: &NaiveDateTime,
) -> Result<bool, AppError> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, payment_status = ?2, transaction_id = ?3, updated_at = ?4
         WHERE id = ?5 AND status = ?6",
        params![
            to.as_str(),
            payment_status.as_str(),
            transaction_id,
            format_datetime(now),
            id,
            from.as_str(),
        ],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> Result<Appointment, AppError> {
    let date_str: String = row.get(6)?;
    let start_str: String = row.get(7)?;
    let end_str: String = row.get(8)?;
    let status_str: String = row.get(11)?;
    let payment_status_str: String = row.get(13)?;
    let created_at_str: String = row.get(16)?;
    let updated_at_str: String = row.get(17)?;

    Ok(Appointment {
        id: row.get(0)?,
        reservation_id: row.get(1)?,
        service_package_id: row.get(2)?,
        customer: Customer {
            name: row.get(3)?,
            email: row.get(4)?,
            phone: row.get(5)?,
        },
        appointment_date: parse_stored_date(&date_str)?,
        start_time: parse_stored_time(&start_str)?,
        end_time: parse_stored_time(&end_str)?,
        duration: row.get(9)?,
        notes: row.get(10)?,
        status: parse_stored_status(&status_str, AppointmentStatus::parse)?,
        payment: PaymentRecord {
            amount: row.get(12)?,
            status: PaymentStatus::parse(&payment_status_str),
            transaction_id: row.get(14)?,
            payment_method: row.get(15)?,
        },
        created_at: parse_stored_datetime(&created_at_str)?,
        updated_at: parse_stored_datetime(&updated_at_str)?,
    })
}
