pub mod appointment;
pub mod booking;
pub mod reservation;
pub mod service_package;
pub mod time;

pub use appointment::{Appointment, AppointmentStatus};
pub use booking::{Customer, PaymentRecord, PaymentStatus};
pub use reservation::{Reservation, ReservationStatus};
pub use service_package::{BookingWindow, PackageStatus, ServicePackage};
pub use time::{TimeInterval, TimeOfDay};
