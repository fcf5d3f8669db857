//! MySQL store over sqlx. Runtime-bound queries only, so the crate builds
//! without a live database. QR rotation and the default-flag flip run in
//! transactions; the attendance upsert leans on the (teacher_id, date)
//! unique key with `INSERT .. ON DUPLICATE KEY UPDATE`.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceEvent, AttendanceRecord, AttendanceStatus};
use crate::model::fingerprint::{FingerprintLog, NewFingerprintLog, ScanDirection};
use crate::model::qr::{NewQrSession, QrSession, QrSessionType};
use crate::model::schedule::{
    NewAssignment, NewSpecialDay, NewWorkSchedule, SpecialDay, SpecialDayType, WorkSchedule,
    WorkScheduleAssignment,
};
use crate::model::teacher::Teacher;
use crate::model::user::UserRecord;

use super::{
    AttendanceStore, FingerprintStore, QrSessionStore, ScheduleStore, StoreResult, TeacherStore,
    UserStore,
};

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: u64,
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    late_tolerance_minutes: u32,
    working_days: String,
    is_default: bool,
}

impl ScheduleRow {
    fn into_model(self) -> StoreResult<WorkSchedule> {
        let working_days: Vec<String> = serde_json::from_str(&self.working_days)
            .with_context(|| format!("bad working_days json for schedule {}", self.id))?;
        Ok(WorkSchedule {
            id: self.id,
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            late_tolerance_minutes: self.late_tolerance_minutes,
            working_days,
            is_default: self.is_default,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssignmentJoinRow {
    id: u64,
    work_schedule_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    created_at: DateTime<Utc>,
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    late_tolerance_minutes: u32,
    working_days: String,
    is_default: bool,
}

impl AssignmentJoinRow {
    fn into_pair(self) -> StoreResult<(WorkScheduleAssignment, WorkSchedule)> {
        let assignment = WorkScheduleAssignment {
            id: self.id,
            work_schedule_id: self.work_schedule_id,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
        };
        let schedule = ScheduleRow {
            id: self.work_schedule_id,
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            late_tolerance_minutes: self.late_tolerance_minutes,
            working_days: self.working_days,
            is_default: self.is_default,
        }
        .into_model()?;
        Ok((assignment, schedule))
    }
}

#[derive(sqlx::FromRow)]
struct SpecialDayRow {
    id: u64,
    date: NaiveDate,
    name: String,
    day_type: String,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    is_overtime: bool,
    notes: Option<String>,
}

impl SpecialDayRow {
    fn into_model(self) -> StoreResult<SpecialDay> {
        let day_type = SpecialDayType::from_str(&self.day_type)
            .with_context(|| format!("bad special day type {:?}", self.day_type))?;
        Ok(SpecialDay {
            id: self.id,
            date: self.date,
            name: self.name,
            day_type,
            start_time: self.start_time,
            end_time: self.end_time,
            is_overtime: self.is_overtime,
            notes: self.notes,
        })
    }
}

#[derive(sqlx::FromRow)]
struct QrSessionRow {
    id: u64,
    session_type: String,
    token: String,
    date: NaiveDate,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    is_active: bool,
}

impl QrSessionRow {
    fn into_model(self) -> StoreResult<QrSession> {
        let session_type = QrSessionType::from_str(&self.session_type)
            .with_context(|| format!("bad qr session type {:?}", self.session_type))?;
        Ok(QrSession {
            id: self.id,
            session_type,
            token: self.token,
            date: self.date,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            is_active: self.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    teacher_id: u64,
    date: NaiveDate,
    check_in_time: Option<DateTime<Utc>>,
    check_out_time: Option<DateTime<Utc>>,
    status: String,
    late_minutes: u32,
}

impl AttendanceRow {
    fn into_model(self) -> StoreResult<AttendanceRecord> {
        let status = AttendanceStatus::from_str(&self.status)
            .with_context(|| format!("bad attendance status {:?}", self.status))?;
        Ok(AttendanceRecord {
            teacher_id: self.teacher_id,
            date: self.date,
            check_in_time: self.check_in_time,
            check_out_time: self.check_out_time,
            status,
            late_minutes: self.late_minutes,
        })
    }
}

const SCHEDULE_COLS: &str =
    "id, name, start_time, end_time, late_tolerance_minutes, working_days, is_default";

const ASSIGNMENT_JOIN: &str = r#"
    SELECT a.id, a.work_schedule_id, a.start_date, a.end_date, a.created_at,
           s.name, s.start_time, s.end_time, s.late_tolerance_minutes,
           s.working_days, s.is_default
    FROM work_schedule_assignments a
    JOIN work_schedules s ON s.id = a.work_schedule_id
"#;

#[async_trait]
impl ScheduleStore for MySqlStore {
    async fn special_day_on(&self, date: NaiveDate) -> StoreResult<Option<SpecialDay>> {
        let row = sqlx::query_as::<_, SpecialDayRow>(
            "SELECT id, date, name, day_type, start_time, end_time, is_overtime, notes \
             FROM special_days WHERE date = ?",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        row.map(SpecialDayRow::into_model).transpose()
    }

    async fn assignment_covering(
        &self,
        date: NaiveDate,
    ) -> StoreResult<Option<(WorkScheduleAssignment, WorkSchedule)>> {
        let sql = format!(
            "{ASSIGNMENT_JOIN} WHERE a.start_date <= ? AND a.end_date >= ? \
             ORDER BY a.id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, AssignmentJoinRow>(&sql)
            .bind(date)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AssignmentJoinRow::into_pair).transpose()
    }

    async fn default_schedule(&self) -> StoreResult<Option<WorkSchedule>> {
        let sql = format!("SELECT {SCHEDULE_COLS} FROM work_schedules WHERE is_default = 1");
        let row = sqlx::query_as::<_, ScheduleRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ScheduleRow::into_model).transpose()
    }

    async fn assignments_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<(WorkScheduleAssignment, WorkSchedule)>> {
        let sql = format!(
            "{ASSIGNMENT_JOIN} WHERE a.start_date <= ? AND a.end_date >= ? \
             ORDER BY a.id DESC"
        );
        let rows = sqlx::query_as::<_, AssignmentJoinRow>(&sql)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(AssignmentJoinRow::into_pair).collect()
    }

    async fn all_schedules(&self) -> StoreResult<Vec<WorkSchedule>> {
        let sql = format!(
            "SELECT {SCHEDULE_COLS} FROM work_schedules ORDER BY is_default DESC, name ASC"
        );
        let rows = sqlx::query_as::<_, ScheduleRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ScheduleRow::into_model).collect()
    }

    async fn schedule_by_id(&self, id: u64) -> StoreResult<Option<WorkSchedule>> {
        let sql = format!("SELECT {SCHEDULE_COLS} FROM work_schedules WHERE id = ?");
        let row = sqlx::query_as::<_, ScheduleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ScheduleRow::into_model).transpose()
    }

    async fn insert_schedule(&self, new: NewWorkSchedule) -> StoreResult<WorkSchedule> {
        let working_days = serde_json::to_string(&new.working_days)?;
        let result = sqlx::query(
            "INSERT INTO work_schedules \
             (name, start_time, end_time, late_tolerance_minutes, working_days, is_default) \
             VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(&new.name)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.late_tolerance_minutes)
        .bind(&working_days)
        .execute(&self.pool)
        .await?;
        Ok(WorkSchedule {
            id: result.last_insert_id(),
            name: new.name,
            start_time: new.start_time,
            end_time: new.end_time,
            late_tolerance_minutes: new.late_tolerance_minutes,
            working_days: new.working_days,
            is_default: false,
        })
    }

    async fn update_schedule(
        &self,
        id: u64,
        new: NewWorkSchedule,
    ) -> StoreResult<Option<WorkSchedule>> {
        let working_days = serde_json::to_string(&new.working_days)?;
        let result = sqlx::query(
            "UPDATE work_schedules \
             SET name = ?, start_time = ?, end_time = ?, late_tolerance_minutes = ?, \
                 working_days = ? \
             WHERE id = ?",
        )
        .bind(&new.name)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.late_tolerance_minutes)
        .bind(&working_days)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.schedule_by_id(id).await
    }

    async fn set_default_schedule(&self, id: u64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE work_schedules SET is_default = 0 WHERE is_default = 1")
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("UPDATE work_schedules SET is_default = 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn delete_schedule(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM work_schedules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn assignment_count(&self, schedule_id: u64) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM work_schedule_assignments WHERE work_schedule_id = ?",
        )
        .bind(schedule_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn list_assignments(
        &self,
    ) -> StoreResult<Vec<(WorkScheduleAssignment, WorkSchedule)>> {
        let sql = format!("{ASSIGNMENT_JOIN} ORDER BY a.start_date DESC");
        let rows = sqlx::query_as::<_, AssignmentJoinRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(AssignmentJoinRow::into_pair).collect()
    }

    async fn insert_assignment(
        &self,
        new: NewAssignment,
    ) -> StoreResult<WorkScheduleAssignment> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO work_schedule_assignments \
             (work_schedule_id, start_date, end_date, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(new.work_schedule_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(WorkScheduleAssignment {
            id: result.last_insert_id(),
            work_schedule_id: new.work_schedule_id,
            start_date: new.start_date,
            end_date: new.end_date,
            created_at,
        })
    }

    async fn delete_assignment(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM work_schedule_assignments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_special_days(
        &self,
        month: Option<(i32, u32)>,
    ) -> StoreResult<Vec<SpecialDay>> {
        let base = "SELECT id, date, name, day_type, start_time, end_time, is_overtime, notes \
                    FROM special_days";
        let rows = match month {
            Some((year, m)) => {
                let sql = format!("{base} WHERE YEAR(date) = ? AND MONTH(date) = ? ORDER BY date ASC");
                sqlx::query_as::<_, SpecialDayRow>(&sql)
                    .bind(year)
                    .bind(m)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{base} ORDER BY date ASC");
                sqlx::query_as::<_, SpecialDayRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(SpecialDayRow::into_model).collect()
    }

    async fn insert_special_day(&self, new: NewSpecialDay) -> StoreResult<Option<SpecialDay>> {
        let result = sqlx::query(
            "INSERT INTO special_days \
             (date, name, day_type, start_time, end_time, is_overtime, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.date)
        .bind(&new.name)
        .bind(new.day_type.to_string())
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.is_overtime)
        .bind(&new.notes)
        .execute(&self.pool)
        .await;
        match result {
            Ok(done) => Ok(Some(SpecialDay {
                id: done.last_insert_id(),
                date: new.date,
                name: new.name,
                day_type: new.day_type,
                start_time: new.start_time,
                end_time: new.end_time,
                is_overtime: new.is_overtime,
                notes: new.notes,
            })),
            // Unique key on date: duplicate means the date is taken.
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_special_day(
        &self,
        id: u64,
        new: NewSpecialDay,
    ) -> StoreResult<Option<SpecialDay>> {
        let result = sqlx::query(
            "UPDATE special_days \
             SET date = ?, name = ?, day_type = ?, start_time = ?, end_time = ?, \
                 is_overtime = ?, notes = ? \
             WHERE id = ?",
        )
        .bind(new.date)
        .bind(&new.name)
        .bind(new.day_type.to_string())
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.is_overtime)
        .bind(&new.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(SpecialDay {
            id,
            date: new.date,
            name: new.name,
            day_type: new.day_type,
            start_time: new.start_time,
            end_time: new.end_time,
            is_overtime: new.is_overtime,
            notes: new.notes,
        }))
    }

    async fn delete_special_day(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM special_days WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl QrSessionStore for MySqlStore {
    async fn rotate_sessions(
        &self,
        date: NaiveDate,
        session_type: Option<QrSessionType>,
        new: Vec<NewQrSession>,
    ) -> StoreResult<Vec<QrSession>> {
        let mut tx = self.pool.begin().await?;
        match session_type {
            Some(t) => {
                sqlx::query(
                    "UPDATE qr_sessions SET is_active = 0 \
                     WHERE date = ? AND session_type = ? AND is_active = 1",
                )
                .bind(date)
                .bind(t.to_string())
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("UPDATE qr_sessions SET is_active = 0 WHERE date = ? AND is_active = 1")
                    .bind(date)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        let mut created = Vec::with_capacity(new.len());
        for n in new {
            let result = sqlx::query(
                "INSERT INTO qr_sessions \
                 (session_type, token, date, valid_from, valid_until, is_active) \
                 VALUES (?, ?, ?, ?, ?, 1)",
            )
            .bind(n.session_type.to_string())
            .bind(&n.token)
            .bind(n.date)
            .bind(n.valid_from)
            .bind(n.valid_until)
            .execute(&mut *tx)
            .await?;
            created.push(QrSession {
                id: result.last_insert_id(),
                session_type: n.session_type,
                token: n.token,
                date: n.date,
                valid_from: n.valid_from,
                valid_until: n.valid_until,
                is_active: true,
            });
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn session_by_token(&self, token: &str) -> StoreResult<Option<QrSession>> {
        let row = sqlx::query_as::<_, QrSessionRow>(
            "SELECT id, session_type, token, date, valid_from, valid_until, is_active \
             FROM qr_sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(QrSessionRow::into_model).transpose()
    }

    async fn active_sessions(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<QrSession>> {
        let rows = sqlx::query_as::<_, QrSessionRow>(
            "SELECT id, session_type, token, date, valid_from, valid_until, is_active \
             FROM qr_sessions \
             WHERE date = ? AND is_active = 1 AND valid_until >= ? \
             ORDER BY session_type ASC",
        )
        .bind(date)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(QrSessionRow::into_model).collect()
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn apply_attendance(
        &self,
        teacher_id: u64,
        date: NaiveDate,
        event: AttendanceEvent,
    ) -> StoreResult<AttendanceRecord> {
        match &event {
            AttendanceEvent::CheckIn {
                time,
                status,
                late_minutes,
            } => {
                sqlx::query(
                    "INSERT INTO attendance \
                     (teacher_id, date, check_in_time, status, late_minutes) \
                     VALUES (?, ?, ?, ?, ?) \
                     ON DUPLICATE KEY UPDATE \
                       check_in_time = VALUES(check_in_time), \
                       status = VALUES(status), \
                       late_minutes = VALUES(late_minutes)",
                )
                .bind(teacher_id)
                .bind(date)
                .bind(time)
                .bind(status.to_string())
                .bind(late_minutes)
                .execute(&self.pool)
                .await?;
            }
            AttendanceEvent::CheckOut { time } => {
                // Check-out never touches status/late_minutes; a fresh row
                // gets the ABSENT placeholder until a check-in arrives.
                sqlx::query(
                    "INSERT INTO attendance \
                     (teacher_id, date, check_out_time, status, late_minutes) \
                     VALUES (?, ?, ?, 'ABSENT', 0) \
                     ON DUPLICATE KEY UPDATE \
                       check_out_time = VALUES(check_out_time)",
                )
                .bind(teacher_id)
                .bind(date)
                .bind(time)
                .execute(&self.pool)
                .await?;
            }
            AttendanceEvent::Reconciled {
                check_in,
                check_out,
                status,
                late_minutes,
            } => {
                sqlx::query(
                    "INSERT INTO attendance \
                     (teacher_id, date, check_in_time, check_out_time, status, late_minutes) \
                     VALUES (?, ?, ?, ?, ?, ?) \
                     ON DUPLICATE KEY UPDATE \
                       check_in_time = VALUES(check_in_time), \
                       check_out_time = VALUES(check_out_time), \
                       status = VALUES(status), \
                       late_minutes = VALUES(late_minutes)",
                )
                .bind(teacher_id)
                .bind(date)
                .bind(check_in)
                .bind(check_out)
                .bind(status.to_string())
                .bind(late_minutes)
                .execute(&self.pool)
                .await?;
            }
        }
        self.attendance_on(teacher_id, date)
            .await?
            .context("attendance row missing right after upsert")
    }

    async fn attendance_on(
        &self,
        teacher_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            "SELECT teacher_id, date, check_in_time, check_out_time, status, late_minutes \
             FROM attendance WHERE teacher_id = ? AND date = ?",
        )
        .bind(teacher_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AttendanceRow::into_model).transpose()
    }
}

#[async_trait]
impl FingerprintStore for MySqlStore {
    async fn insert_fingerprint_log(
        &self,
        new: NewFingerprintLog,
    ) -> StoreResult<FingerprintLog> {
        let result = sqlx::query(
            "INSERT INTO fingerprint_logs (fingerprint_id, scanned_at, raw_type) \
             VALUES (?, ?, ?)",
        )
        .bind(&new.fingerprint_id)
        .bind(new.scanned_at)
        .bind(new.raw_type.to_string())
        .execute(&self.pool)
        .await?;
        Ok(FingerprintLog {
            id: result.last_insert_id(),
            fingerprint_id: new.fingerprint_id,
            scanned_at: new.scanned_at,
            raw_type: new.raw_type,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TeacherRow {
    id: u64,
    name: String,
    nip: String,
    fingerprint_id: Option<String>,
}

#[async_trait]
impl TeacherStore for MySqlStore {
    async fn teacher_by_id(&self, id: u64) -> StoreResult<Option<Teacher>> {
        let row = sqlx::query_as::<_, TeacherRow>(
            "SELECT id, name, nip, fingerprint_id FROM teachers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|t| Teacher {
            id: t.id,
            name: t.name,
            nip: t.nip,
            fingerprint_id: t.fingerprint_id,
        }))
    }

    async fn fingerprint_teacher_map(&self) -> StoreResult<HashMap<String, u64>> {
        let rows = sqlx::query_as::<_, (String, u64)>(
            "SELECT fingerprint_id, id FROM teachers WHERE fingerprint_id IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn teachers_by_ids(&self, ids: &[u64]) -> StoreResult<HashMap<u64, Teacher>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, nip, fingerprint_id FROM teachers WHERE id IN ({placeholders})"
        );
        let mut query = sqlx::query_as::<_, TeacherRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|t| {
                (
                    t.id,
                    Teacher {
                        id: t.id,
                        name: t.name,
                        nip: t.nip,
                        fingerprint_id: t.fingerprint_id,
                    },
                )
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: u64,
    username: String,
    password_hash: String,
    role_id: u8,
    teacher_id: Option<u64>,
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role_id, teacher_id \
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|u| UserRecord {
            id: u.id,
            username: u.username,
            password_hash: u.password_hash,
            role_id: u.role_id,
            teacher_id: u.teacher_id,
        }))
    }

    async fn user_by_id(&self, id: u64) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role_id, teacher_id \
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|u| UserRecord {
            id: u.id,
            username: u.username,
            password_hash: u.password_hash,
            role_id: u.role_id,
            teacher_id: u.teacher_id,
        }))
    }
}
