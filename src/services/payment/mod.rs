pub mod sandbox;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub message: String,
}

impl PaymentOutcome {
    pub fn approved(transaction_id: String) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id),
            message: "Payment processed successfully".to_string(),
        }
    }

    pub fn declined(message: &str) -> Self {
        Self {
            success: false,
            transaction_id: None,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentVerification {
    pub valid: bool,
    pub status: String,
}

/// Charges the booking fee for a reservation. Implementations decide success;
/// the booking flow only consumes the outcome.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, reservation_id: &str, amount: f64) -> anyhow::Result<PaymentOutcome>;

    async fn verify(&self, transaction_id: &str) -> anyhow::Result<PaymentVerification>;
}
