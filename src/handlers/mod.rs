pub mod appointments;
pub mod calendar;
pub mod health;
pub mod packages;
pub mod payment;
