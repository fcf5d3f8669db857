use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
    strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QrSessionType {
    CheckIn,
    CheckOut,
}

/// A time-boxed token authorizing check-in or check-out scans for one date.
/// At most one session is active per (date, type) at any time.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrSession {
    pub id: u64,
    #[serde(rename = "type")]
    pub session_type: QrSessionType,
    pub token: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub valid_from: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
}

impl QrSession {
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }
}

#[derive(Debug, Clone)]
pub struct NewQrSession {
    pub session_type: QrSessionType,
    pub token: String,
    pub date: NaiveDate,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}
