use crate::models::Appointment;

// 24:00 rolls over to 00:00 on the next day.
fn ics_stamp(date: &chrono::NaiveDate, time: crate::models::TimeOfDay) -> String {
    let at = date.and_time(chrono::NaiveTime::MIN)
        + chrono::Duration::minutes(i64::from(time.minutes()));
    at.format("%Y%m%dT%H%M%S").to_string()
}

/// Renders a single-event iCalendar document for a booked service.
pub fn generate_ics(appointment: &Appointment, service_name: &str) -> String {
    let dtstart = ics_stamp(&appointment.appointment_date, appointment.start_time);
    let dtend = ics_stamp(&appointment.appointment_date, appointment.end_time);
    let dtstamp = appointment.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@servicebay", appointment.id);

    let summary = format!("{service_name} for {}", appointment.customer.name);
    let description = if appointment.notes.trim().is_empty() {
        "No additional notes".to_string()
    } else {
        appointment.notes.replace('\n', "\\n")
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//ServiceBay//Appointments//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        status = appointment.status.as_str().to_uppercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use crate::models::{AppointmentStatus, Customer, PaymentRecord, TimeOfDay};

    fn appointment(notes: &str) -> Appointment {
        let created = NaiveDateTime::parse_from_str("2025-03-10 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        Appointment {
            id: "appt-123".to_string(),
            reservation_id: Some("res-9".to_string()),
            service_package_id: "pkg-1".to_string(),
            customer: Customer {
                name: "Ruwan".to_string(),
                email: "ruwan@example.com".to_string(),
                phone: "+94775551234".to_string(),
            },
            appointment_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            start_time: TimeOfDay::parse("14:00").unwrap(),
            end_time: TimeOfDay::parse("15:30").unwrap(),
            duration: 90,
            notes: notes.to_string(),
            status: AppointmentStatus::Confirmed,
            payment: PaymentRecord::pending(1000.0),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_generate_ics() {
        let ics = generate_ics(&appointment("Brake noise on left side"), "Full Service");
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("UID:appt-123@servicebay"));
        assert!(ics.contains("DTSTAMP:20250310T100000"));
        assert!(ics.contains("DTSTART:20250315T140000"));
        assert!(ics.contains("DTEND:20250315T153000"));
        assert!(ics.contains("SUMMARY:Full Service for Ruwan"));
        assert!(ics.contains("DESCRIPTION:Brake noise on left side"));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_midnight_end_rolls_to_next_day() {
        let mut appt = appointment("");
        appt.start_time = TimeOfDay::parse("23:30").unwrap();
        appt.end_time = TimeOfDay::parse("24:00").unwrap();
        let ics = generate_ics(&appt, "Wash");
        assert!(ics.contains("DTSTART:20250315T233000"));
        assert!(ics.contains("DTEND:20250316T000000"));
    }

    #[test]
    fn test_generate_ics_no_notes() {
        let ics = generate_ics(&appointment(""), "Wash");
        assert!(ics.contains("DESCRIPTION:No additional notes"));
    }
}
