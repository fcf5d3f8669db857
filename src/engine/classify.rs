//! Check-in classification: PRESENT within start time plus tolerance
//! (boundary inclusive), LATE afterwards. All wall-clock arithmetic happens
//! in the configured organizational offset, never the server's.

use chrono::{DateTime, FixedOffset, NaiveTime, Timelike, Utc};

use crate::model::attendance::AttendanceStatus;
use crate::model::schedule::EffectiveSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: AttendanceStatus,
    pub late_minutes: u32,
}

/// Minutes since local midnight for an instant.
pub fn minutes_since_midnight(at: DateTime<Utc>, tz: FixedOffset) -> u32 {
    let local = at.with_timezone(&tz);
    local.hour() * 60 + local.minute()
}

/// Core comparison, shared by the scan path and bulk reconciliation.
pub fn classify_minutes(check_in_minutes: u32, start: NaiveTime, tolerance: u32) -> Classification {
    let allowed = start.hour() * 60 + start.minute() + tolerance;
    if check_in_minutes <= allowed {
        Classification {
            status: AttendanceStatus::Present,
            late_minutes: 0,
        }
    } else {
        Classification {
            status: AttendanceStatus::Late,
            late_minutes: check_in_minutes - allowed,
        }
    }
}

/// Classify a check-in against a resolved schedule. `None` when the day
/// carries no working hours (holiday variant) — lateness must not be
/// computed then.
pub fn classify(
    check_in: DateTime<Utc>,
    schedule: &EffectiveSchedule,
    tz: FixedOffset,
) -> Option<Classification> {
    let start = schedule.start_time?;
    Some(classify_minutes(
        minutes_since_midnight(check_in, tz),
        start,
        schedule.late_tolerance_minutes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schedule::ScheduleSource;
    use chrono::TimeZone;

    fn seven() -> NaiveTime {
        NaiveTime::from_hms_opt(7, 0, 0).unwrap()
    }

    #[test]
    fn within_tolerance_is_present() {
        let c = classify_minutes(7 * 60 + 9, seven(), 10);
        assert_eq!(c.status, AttendanceStatus::Present);
        assert_eq!(c.late_minutes, 0);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let c = classify_minutes(7 * 60 + 10, seven(), 10);
        assert_eq!(c.status, AttendanceStatus::Present);
        assert_eq!(c.late_minutes, 0);
    }

    #[test]
    fn one_minute_past_tolerance_is_late_by_one() {
        let c = classify_minutes(7 * 60 + 11, seven(), 10);
        assert_eq!(c.status, AttendanceStatus::Late);
        assert_eq!(c.late_minutes, 1);
    }

    #[test]
    fn uses_configured_offset_not_utc() {
        // 00:05 UTC is 07:05 in UTC+7: five minutes after start, inside a
        // ten-minute tolerance.
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let check_in = Utc.with_ymd_and_hms(2026, 2, 2, 0, 5, 0).unwrap();
        assert_eq!(minutes_since_midnight(check_in, tz), 7 * 60 + 5);
        let c = classify_minutes(minutes_since_midnight(check_in, tz), seven(), 10);
        assert_eq!(c.status, AttendanceStatus::Present);
    }

    #[test]
    fn holiday_schedule_yields_no_classification() {
        let schedule = EffectiveSchedule {
            source: ScheduleSource::SpecialDay,
            name: "Hari Libur".into(),
            start_time: None,
            end_time: None,
            late_tolerance_minutes: 0,
            is_overtime: false,
            special_day: None,
        };
        let tz = FixedOffset::east_opt(0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 2, 7, 0, 0).unwrap();
        assert!(classify(now, &schedule, tz).is_none());
    }
}
