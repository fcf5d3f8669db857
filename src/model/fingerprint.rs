use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema,
    strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanDirection {
    In,
    Out,
}

/// Raw device evidence, append-only; never mutated after insert.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintLog {
    pub id: u64,
    pub fingerprint_id: String,
    #[schema(value_type = String, format = "date-time")]
    pub scanned_at: DateTime<Utc>,
    pub raw_type: ScanDirection,
}

#[derive(Debug, Clone)]
pub struct NewFingerprintLog {
    pub fingerprint_id: String,
    pub scanned_at: DateTime<Utc>,
    pub raw_type: ScanDirection,
}

/// One line of an import batch, as uploaded. Fields are optional so a
/// malformed line is skipped per-record instead of failing the batch.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RawScanInput {
    #[schema(example = "FP-0042")]
    pub fingerprint_id: Option<String>,
    #[schema(example = "2026-02-02T07:05:00+07:00")]
    pub scanned_at: Option<String>,
    #[schema(example = "IN")]
    pub raw_type: Option<String>,
}
