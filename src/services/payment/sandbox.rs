use std::time::Duration;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::{PaymentGateway, PaymentOutcome, PaymentVerification};
use crate::config::SandboxSettings;

const TRANSACTION_PREFIX: &str = "TXN_";

/// Simulated card processor with configurable latency and approval rate.
pub struct SandboxGateway {
    settings: SandboxSettings,
}

impl SandboxGateway {
    pub fn new(settings: SandboxSettings) -> Self {
        Self { settings }
    }

    fn new_transaction_id() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(char::from)
            .collect();
        format!(
            "{TRANSACTION_PREFIX}{}_{}",
            chrono::Utc::now().timestamp_millis(),
            suffix.to_lowercase()
        )
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn charge(&self, reservation_id: &str, amount: f64) -> anyhow::Result<PaymentOutcome> {
        anyhow::ensure!(amount.is_finite() && amount > 0.0, "amount must be positive");

        if self.settings.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.settings.delay_ms)).await;
        }

        let approved = rand::thread_rng().gen_bool(self.settings.success_rate.clamp(0.0, 1.0));
        if approved {
            let transaction_id = Self::new_transaction_id();
            tracing::info!(reservation_id, amount, transaction_id = %transaction_id, "sandbox payment approved");
            Ok(PaymentOutcome::approved(transaction_id))
        } else {
            tracing::warn!(reservation_id, amount, "sandbox payment declined");
            Ok(PaymentOutcome::declined(
                "Payment failed. Please try again with a different card.",
            ))
        }
    }

    async fn verify(&self, transaction_id: &str) -> anyhow::Result<PaymentVerification> {
        let valid = transaction_id.starts_with(TRANSACTION_PREFIX);
        Ok(PaymentVerification {
            valid,
            status: if valid { "completed" } else { "invalid" }.to_string(),
        })
    }
}
