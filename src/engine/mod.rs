//! The attendance core: schedule resolution, check-in classification, QR
//! session management, and fingerprint bulk reconciliation. Everything here
//! is HTTP-free and generic over the store traits.

pub mod classify;
pub mod qr;
pub mod reconcile;
pub mod resolver;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Calendar date of an instant in the organization's reference frame.
pub fn local_date(at: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// Instant corresponding to a local wall-clock date and time.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: FixedOffset) -> DateTime<Utc> {
    let naive: NaiveDateTime = date.and_time(time);
    let utc_naive = naive - chrono::Duration::seconds(tz.local_minus_utc() as i64);
    DateTime::from_naive_utc_and_offset(utc_naive, Utc)
}
