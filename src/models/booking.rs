use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Contact details captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Customer {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("customer name is required".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(AppError::Validation("customer email is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AppError::Validation(format!(
                "invalid customer email: {}",
                self.email
            )));
        }
        if self.phone.trim().is_empty() {
            return Err(AppError::Validation("customer phone is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub amount: f64,
    pub status: PaymentStatus,
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl PaymentRecord {
    /// A fee awaiting payment.
    pub fn pending(amount: f64) -> Self {
        Self {
            amount,
            status: PaymentStatus::Pending,
            transaction_id: String::new(),
            payment_method: None,
        }
    }
}
