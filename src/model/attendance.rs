use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema,
    strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Leave,
    Sick,
}

/// One attendance record per teacher per date, mutated only through
/// [`AttendanceEvent`]s applied by the store.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub teacher_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub late_minutes: u32,
}

/// State transitions for an attendance record:
/// no record -> ABSENT placeholder -> PRESENT/LATE via check-in -> check-out
/// fills the out time without touching status or late minutes.
#[derive(Debug, Clone)]
pub enum AttendanceEvent {
    CheckIn {
        time: DateTime<Utc>,
        status: AttendanceStatus,
        late_minutes: u32,
    },
    CheckOut {
        time: DateTime<Utc>,
    },
    /// Bulk reconciliation writes both sides at once (first IN / last OUT).
    Reconciled {
        check_in: Option<DateTime<Utc>>,
        check_out: Option<DateTime<Utc>>,
        status: AttendanceStatus,
        late_minutes: u32,
    },
}

impl AttendanceRecord {
    /// The record created when the first event for a teacher-day is not a
    /// check-in (status fixed up once a check-in arrives, if ever).
    pub fn placeholder(teacher_id: u64, date: NaiveDate) -> Self {
        Self {
            teacher_id,
            date,
            check_in_time: None,
            check_out_time: None,
            status: AttendanceStatus::Absent,
            late_minutes: 0,
        }
    }

    pub fn apply(&mut self, event: &AttendanceEvent) {
        match event {
            AttendanceEvent::CheckIn {
                time,
                status,
                late_minutes,
            } => {
                self.check_in_time = Some(*time);
                self.status = *status;
                self.late_minutes = *late_minutes;
            }
            AttendanceEvent::CheckOut { time } => {
                // Never overwrites status/late_minutes set by a check-in.
                self.check_out_time = Some(*time);
            }
            AttendanceEvent::Reconciled {
                check_in,
                check_out,
                status,
                late_minutes,
            } => {
                self.check_in_time = *check_in;
                self.check_out_time = *check_out;
                self.status = *status;
                self.late_minutes = *late_minutes;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()
    }

    #[test]
    fn check_in_sets_status_and_late_minutes() {
        let mut rec = AttendanceRecord::placeholder(1, date());
        rec.apply(&AttendanceEvent::CheckIn {
            time: at(0, 11),
            status: AttendanceStatus::Late,
            late_minutes: 1,
        });
        assert_eq!(rec.status, AttendanceStatus::Late);
        assert_eq!(rec.late_minutes, 1);
        assert!(rec.check_in_time.is_some());
        assert!(rec.check_out_time.is_none());
    }

    #[test]
    fn check_out_before_check_in_keeps_absent_placeholder() {
        let mut rec = AttendanceRecord::placeholder(1, date());
        rec.apply(&AttendanceEvent::CheckOut { time: at(8, 0) });
        assert_eq!(rec.status, AttendanceStatus::Absent);
        assert_eq!(rec.check_out_time, Some(at(8, 0)));
        assert!(rec.check_in_time.is_none());
    }

    #[test]
    fn late_check_in_preserves_earlier_check_out() {
        let mut rec = AttendanceRecord::placeholder(1, date());
        rec.apply(&AttendanceEvent::CheckOut { time: at(8, 0) });
        rec.apply(&AttendanceEvent::CheckIn {
            time: at(0, 5),
            status: AttendanceStatus::Present,
            late_minutes: 0,
        });
        assert_eq!(rec.status, AttendanceStatus::Present);
        assert_eq!(rec.check_out_time, Some(at(8, 0)));
    }

    #[test]
    fn repeated_check_in_just_resets_the_same_fields() {
        let mut rec = AttendanceRecord::placeholder(1, date());
        let event = AttendanceEvent::CheckIn {
            time: at(0, 5),
            status: AttendanceStatus::Present,
            late_minutes: 0,
        };
        rec.apply(&event);
        let snapshot = rec.clone();
        rec.apply(&event);
        assert_eq!(rec.status, snapshot.status);
        assert_eq!(rec.check_in_time, snapshot.check_in_time);
    }

    #[test]
    fn status_codes_match_wire_format() {
        assert_eq!(AttendanceStatus::Present.to_string(), "PRESENT");
        assert_eq!(
            "LATE".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Late
        );
    }
}
