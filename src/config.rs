use std::env;
use std::str::FromStr;

/// Scheduling rules shared by the slot engine and the reservation manager.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingPolicy {
    /// Minimum idle minutes between two bookings.
    pub buffer_minutes: u32,
    /// Distance between candidate start times inside a booking window.
    pub slot_step_minutes: u32,
    /// How long a pending reservation holds its slot.
    pub hold_minutes: u32,
    /// Flat booking fee charged at checkout, independent of the package price.
    pub booking_fee: f64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            buffer_minutes: 20,
            slot_step_minutes: 15,
            hold_minutes: 15,
            booking_fee: 1000.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SandboxSettings {
    pub success_rate: f64,
    pub delay_ms: u64,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            success_rate: 0.9,
            delay_ms: 2000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub booking: BookingPolicy,
    pub sandbox: SandboxSettings,
    /// Interval of the expired-hold sweep; 0 disables it.
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let booking_defaults = BookingPolicy::default();
        let sandbox_defaults = SandboxSettings::default();

        Self {
            port: parse_var("PORT", 5001),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "servicebay.db".to_string()),
            booking: BookingPolicy {
                buffer_minutes: parse_var("BOOKING_BUFFER_MINUTES", booking_defaults.buffer_minutes),
                slot_step_minutes: parse_var("SLOT_STEP_MINUTES", booking_defaults.slot_step_minutes)
                    .max(1),
                hold_minutes: parse_var("RESERVATION_HOLD_MINUTES", booking_defaults.hold_minutes),
                booking_fee: parse_var("BOOKING_FEE", booking_defaults.booking_fee),
            },
            sandbox: SandboxSettings {
                success_rate: parse_var("PAYMENT_SUCCESS_RATE", sandbox_defaults.success_rate)
                    .clamp(0.0, 1.0),
                delay_ms: parse_var("PAYMENT_DELAY_MS", sandbox_defaults.delay_ms),
            },
            sweep_interval_secs: parse_var("RESERVATION_SWEEP_SECS", 60),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
