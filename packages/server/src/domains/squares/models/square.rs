use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Whether the external payment provider has confirmed the purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "confirmed" => Some(PaymentStatus::Confirmed),
            _ => None,
        }
    }
}

/// Read-time classification of a record (see `lifecycle::status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SquareStatus {
    Pending,
    Active,
    Expired,
}

/// Display payload. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdPayload {
    pub business_name: String,
    pub contact_email: String,
    #[serde(default)]
    pub deal_link: Option<String>,
    #[serde(default)]
    pub logo_reference: Option<String>,
}

/// One purchase occupying one square.
///
/// Rotation only ever rewrites `square_number` and `last_shuffled_at`, and
/// never moves a record off its page, so `page_number` is fixed at purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SquareRecord {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,
    pub square_number: u32,
    pub page_number: u32,
    #[serde(flatten)]
    pub payload: AdPayload,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[builder(default = PaymentStatus::Pending)]
    pub payment_status: PaymentStatus,
    /// Set once the expiry sweep has retired the record and freed its square.
    #[builder(default)]
    pub retired_at: Option<DateTime<Utc>>,
    #[builder(default)]
    pub last_shuffled_at: Option<DateTime<Utc>>,
}

impl SquareRecord {
    /// True while the record still holds its square number.
    ///
    /// Pending and active records both hold their square; a record stops
    /// holding it the instant its expiry passes, swept or not.
    pub fn holds_square(&self, now: DateTime<Utc>) -> bool {
        self.retired_at.is_none() && now < self.expires_at
    }
}
