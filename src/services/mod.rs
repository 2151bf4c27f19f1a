pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod conflict;
pub mod ledger;
pub mod payment;
pub mod reservations;
