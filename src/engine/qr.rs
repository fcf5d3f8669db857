//! QR session management: rotation of time-boxed check-in/check-out tokens
//! and the scan path that turns a valid token into an attendance mutation.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::engine::{classify, local_date, local_to_utc, resolver};
use crate::error::EngineError;
use crate::model::attendance::{AttendanceEvent, AttendanceRecord};
use crate::model::qr::{NewQrSession, QrSession, QrSessionType};
use crate::model::schedule::EffectiveSchedule;
use crate::store::{AttendanceStore, QrSessionStore, ScheduleStore};

/// Minutes around the scheduled start/end that auto-generated windows span.
const CHECK_IN_OPENS_BEFORE: i64 = 15;
const CHECK_IN_CLOSES_AFTER: i64 = 30;
const CHECK_OUT_OPENS_BEFORE: i64 = 30;
const CHECK_OUT_CLOSES_AFTER: i64 = 15;

const DEFAULT_VALIDITY_HOURS: i64 = 2;

/// 32 random bytes, hex encoded. Unique across sessions for any practical
/// purpose; the store still enforces token uniqueness.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, Default)]
pub struct GenerateParams {
    pub date: Option<NaiveDate>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Create a new session for (date, type), deactivating any currently-active
/// ones for the same pair in the same atomic store rotation.
pub async fn generate<S>(
    store: &S,
    session_type: QrSessionType,
    params: GenerateParams,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Result<QrSession, EngineError>
where
    S: QrSessionStore + ?Sized,
{
    let date = params.date.unwrap_or_else(|| local_date(now, tz));
    let valid_from = params.valid_from.unwrap_or(now);
    let valid_until = params
        .valid_until
        .unwrap_or(now + Duration::hours(DEFAULT_VALIDITY_HOURS));
    if valid_until <= valid_from {
        return Err(EngineError::InvalidWindow);
    }
    let new = NewQrSession {
        session_type,
        token: generate_token(),
        date,
        valid_from,
        valid_until,
    };
    let mut created = store
        .rotate_sessions(date, Some(session_type), vec![new])
        .await?;
    created
        .pop()
        .ok_or_else(|| EngineError::Store(anyhow::anyhow!("rotation returned no session")))
}

#[derive(Debug, Clone)]
pub struct AutoGenerated {
    pub date: NaiveDate,
    pub schedule: EffectiveSchedule,
    pub sessions: Vec<QrSession>,
}

/// Derive both windows from the date's resolved schedule and rotate every
/// session for the date (both types) in one atomic step.
pub async fn auto_generate<S>(
    store: &S,
    date: Option<NaiveDate>,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Result<AutoGenerated, EngineError>
where
    S: ScheduleStore + QrSessionStore + ?Sized,
{
    let date = date.unwrap_or_else(|| local_date(now, tz));
    let schedule = resolver::resolve(store, date).await?;
    let (Some(start), Some(end)) = (schedule.start_time, schedule.end_time) else {
        return Err(EngineError::NonWorkingDay(date));
    };

    let start_at = local_to_utc(date, start, tz);
    let end_at = local_to_utc(date, end, tz);
    let check_in = NewQrSession {
        session_type: QrSessionType::CheckIn,
        token: generate_token(),
        date,
        valid_from: start_at - Duration::minutes(CHECK_IN_OPENS_BEFORE),
        valid_until: start_at + Duration::minutes(CHECK_IN_CLOSES_AFTER),
    };
    let check_out = NewQrSession {
        session_type: QrSessionType::CheckOut,
        token: generate_token(),
        date,
        valid_from: end_at - Duration::minutes(CHECK_OUT_OPENS_BEFORE),
        valid_until: end_at + Duration::minutes(CHECK_OUT_CLOSES_AFTER),
    };

    let sessions = store
        .rotate_sessions(date, None, vec![check_in, check_out])
        .await?;
    Ok(AutoGenerated {
        date,
        schedule,
        sessions,
    })
}

/// Active, non-expired sessions for display, CHECK_IN first.
pub async fn active_sessions<S>(
    store: &S,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Vec<QrSession>, EngineError>
where
    S: QrSessionStore + ?Sized,
{
    Ok(store.active_sessions(date, now).await?)
}

/// The scan path: validate the token, resolve the session date's schedule,
/// apply exactly one attendance mutation. Idempotent per (teacher, date) —
/// the token may be scanned again within its window, a repeat check-in just
/// re-sets the same fields.
pub async fn validate_and_check<S>(
    store: &S,
    token: &str,
    teacher_id: u64,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Result<(QrSession, AttendanceRecord), EngineError>
where
    S: ScheduleStore + QrSessionStore + AttendanceStore + ?Sized,
{
    let session = store
        .session_by_token(token)
        .await?
        .filter(|s| s.is_active)
        .ok_or(EngineError::InvalidToken)?;
    if !session.window_contains(now) {
        return Err(EngineError::TokenExpired);
    }

    let schedule = resolver::resolve(store, session.date).await?;
    if !schedule.expects_work() {
        // Holiday override: no lateness arithmetic is meaningful, and the
        // record set must stay untouched.
        return Err(EngineError::NonWorkingDay(session.date));
    }

    let event = match session.session_type {
        QrSessionType::CheckIn => {
            let c = classify::classify(now, &schedule, tz)
                .ok_or(EngineError::NonWorkingDay(session.date))?;
            AttendanceEvent::CheckIn {
                time: now,
                status: c.status,
                late_minutes: c.late_minutes,
            }
        }
        QrSessionType::CheckOut => AttendanceEvent::CheckOut { time: now },
    };
    let record = store
        .apply_attendance(teacher_id, session.date, event)
        .await?;
    Ok((session, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use crate::model::schedule::{NewSpecialDay, NewWorkSchedule, SpecialDayType};
    use crate::store::memory::MemoryStore;
    use chrono::NaiveTime;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // Monday
    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()
    }

    /// 07:00 local on `day()` is 00:00 UTC.
    fn local(h: u32, m: u32) -> DateTime<Utc> {
        local_to_utc(day(), t(h, m), tz())
    }

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let schedule = store
            .insert_schedule(NewWorkSchedule {
                name: "Jadwal Reguler".into(),
                start_time: t(7, 0),
                end_time: t(15, 0),
                late_tolerance_minutes: 10,
                working_days: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })
            .await
            .unwrap();
        store.set_default_schedule(schedule.id).await.unwrap();
        store
    }

    #[test]
    fn tokens_are_long_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[actix_web::test]
    async fn generate_defaults_to_a_two_hour_window() {
        let store = seeded_store().await;
        let now = local(6, 0);
        let session = generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams::default(),
            now,
            tz(),
        )
        .await
        .unwrap();
        assert_eq!(session.date, day());
        assert_eq!(session.valid_from, now);
        assert_eq!(session.valid_until, now + Duration::hours(2));
        assert!(session.is_active);
    }

    #[actix_web::test]
    async fn generate_rejects_an_inverted_window() {
        let store = seeded_store().await;
        let now = local(6, 0);
        let err = generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams {
                valid_from: Some(now),
                valid_until: Some(now - Duration::minutes(1)),
                ..Default::default()
            },
            now,
            tz(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidWindow));
    }

    #[actix_web::test]
    async fn regenerating_leaves_at_most_one_active_session() {
        let store = seeded_store().await;
        let now = local(6, 0);
        for _ in 0..3 {
            generate(
                &store,
                QrSessionType::CheckIn,
                GenerateParams::default(),
                now,
                tz(),
            )
            .await
            .unwrap();
        }
        let active = active_sessions(&store, day(), now).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[actix_web::test]
    async fn auto_generate_derives_windows_from_the_schedule() {
        let store = seeded_store().await;
        let now = local(6, 0);
        let out = auto_generate(&store, Some(day()), now, tz()).await.unwrap();
        assert_eq!(out.sessions.len(), 2);
        let check_in = &out.sessions[0];
        assert_eq!(check_in.session_type, QrSessionType::CheckIn);
        assert_eq!(check_in.valid_from, local(6, 45));
        assert_eq!(check_in.valid_until, local(7, 30));
        let check_out = &out.sessions[1];
        assert_eq!(check_out.valid_from, local(14, 30));
        assert_eq!(check_out.valid_until, local(15, 15));
    }

    #[actix_web::test]
    async fn auto_generate_deactivates_both_types() {
        let store = seeded_store().await;
        let now = local(6, 0);
        auto_generate(&store, Some(day()), now, tz()).await.unwrap();
        auto_generate(&store, Some(day()), now, tz()).await.unwrap();
        let active = active_sessions(&store, day(), now).await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].session_type, QrSessionType::CheckIn);
        assert_eq!(active[1].session_type, QrSessionType::CheckOut);
    }

    #[actix_web::test]
    async fn auto_generate_without_configuration_propagates_the_failure() {
        let store = MemoryStore::new();
        let err = auto_generate(&store, Some(day()), local(6, 0), tz())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ConfigurationMissing));
    }

    #[actix_web::test]
    async fn unknown_token_is_invalid() {
        let store = seeded_store().await;
        let err = validate_and_check(&store, "nope", 1, local(7, 0), tz())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidToken));
    }

    #[actix_web::test]
    async fn deactivated_token_is_invalid() {
        let store = seeded_store().await;
        let now = local(6, 50);
        let old = generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams::default(),
            now,
            tz(),
        )
        .await
        .unwrap();
        generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams::default(),
            now,
            tz(),
        )
        .await
        .unwrap();
        let err = validate_and_check(&store, &old.token, 1, now, tz())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidToken));
    }

    #[actix_web::test]
    async fn token_outside_its_window_is_expired() {
        let store = seeded_store().await;
        let now = local(6, 50);
        let session = generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams::default(),
            now,
            tz(),
        )
        .await
        .unwrap();
        let err = validate_and_check(&store, &session.token, 1, now + Duration::hours(3), tz())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TokenExpired));
        // Not yet valid counts as expired too.
        let err = validate_and_check(&store, &session.token, 1, now - Duration::minutes(5), tz())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TokenExpired));
    }

    #[actix_web::test]
    async fn check_in_scan_classifies_and_upserts() {
        let store = seeded_store().await;
        let session = generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams::default(),
            local(6, 50),
            tz(),
        )
        .await
        .unwrap();
        let (_, record) = validate_and_check(&store, &session.token, 7, local(7, 11), tz())
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(record.late_minutes, 1);
        assert_eq!(record.check_in_time, Some(local(7, 11)));
    }

    #[actix_web::test]
    async fn check_out_before_check_in_leaves_an_absent_placeholder() {
        let store = seeded_store().await;
        let out_session = generate(
            &store,
            QrSessionType::CheckOut,
            GenerateParams::default(),
            local(14, 0),
            tz(),
        )
        .await
        .unwrap();
        let (_, record) = validate_and_check(&store, &out_session.token, 7, local(15, 0), tz())
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Absent);
        assert_eq!(record.check_out_time, Some(local(15, 0)));
        assert!(record.check_in_time.is_none());

        // A late check-in scan the same day fixes the status but keeps the
        // existing check-out.
        let in_session = generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams {
                valid_from: Some(local(6, 45)),
                valid_until: Some(local(16, 0)),
                ..Default::default()
            },
            local(6, 45),
            tz(),
        )
        .await
        .unwrap();
        let (_, record) = validate_and_check(&store, &in_session.token, 7, local(7, 5), tz())
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.check_out_time, Some(local(15, 0)));
    }

    #[actix_web::test]
    async fn rescanning_the_same_token_does_not_double_count() {
        let store = seeded_store().await;
        let session = generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams::default(),
            local(6, 50),
            tz(),
        )
        .await
        .unwrap();
        let (_, first) = validate_and_check(&store, &session.token, 7, local(7, 3), tz())
            .await
            .unwrap();
        let (_, second) = validate_and_check(&store, &session.token, 7, local(7, 4), tz())
            .await
            .unwrap();
        assert_eq!(first.status, second.status);
        assert_eq!(second.check_in_time, Some(local(7, 4)));
        let stored = store.attendance_on(7, day()).await.unwrap().unwrap();
        assert_eq!(stored.late_minutes, 0);
    }

    #[actix_web::test]
    async fn scanning_on_a_holiday_mutates_nothing() {
        let store = seeded_store().await;
        let session = generate(
            &store,
            QrSessionType::CheckIn,
            GenerateParams::default(),
            local(6, 50),
            tz(),
        )
        .await
        .unwrap();
        store
            .insert_special_day(NewSpecialDay {
                date: day(),
                name: "Hari Libur".into(),
                day_type: SpecialDayType::Holiday,
                start_time: None,
                end_time: None,
                is_overtime: false,
                notes: None,
            })
            .await
            .unwrap();
        let err = validate_and_check(&store, &session.token, 7, local(7, 0), tz())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NonWorkingDay(_)));
        assert!(store.attendance_on(7, day()).await.unwrap().is_none());
    }
}
