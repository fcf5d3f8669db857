//! Abstract record stores. The engine is written against these traits; the
//! binary wires the MySQL implementation and tests substitute the in-memory
//! one behind the same `Data<dyn Store>`.

pub mod memory;
pub mod mysql;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::model::attendance::{AttendanceEvent, AttendanceRecord};
use crate::model::fingerprint::{FingerprintLog, NewFingerprintLog};
use crate::model::qr::{NewQrSession, QrSession, QrSessionType};
use crate::model::schedule::{
    NewAssignment, NewSpecialDay, NewWorkSchedule, SpecialDay, WorkSchedule,
    WorkScheduleAssignment,
};
use crate::model::teacher::Teacher;
use crate::model::user::UserRecord;

pub type StoreResult<T> = anyhow::Result<T>;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Point lookup: the one special day on `date`, if any.
    async fn special_day_on(&self, date: NaiveDate) -> StoreResult<Option<SpecialDay>>;

    /// The assignment whose range contains `date`, joined with its template.
    /// When several overlap, the most recently created wins.
    async fn assignment_covering(
        &self,
        date: NaiveDate,
    ) -> StoreResult<Option<(WorkScheduleAssignment, WorkSchedule)>>;

    async fn default_schedule(&self) -> StoreResult<Option<WorkSchedule>>;

    /// Range-overlap query for bulk reconciliation, newest assignment first.
    async fn assignments_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<(WorkScheduleAssignment, WorkSchedule)>>;

    async fn all_schedules(&self) -> StoreResult<Vec<WorkSchedule>>;

    async fn schedule_by_id(&self, id: u64) -> StoreResult<Option<WorkSchedule>>;

    // -- schedule-write boundary ------------------------------------------

    async fn insert_schedule(&self, new: NewWorkSchedule) -> StoreResult<WorkSchedule>;

    async fn update_schedule(
        &self,
        id: u64,
        new: NewWorkSchedule,
    ) -> StoreResult<Option<WorkSchedule>>;

    /// Transactional unset-then-set: afterwards exactly `id` carries the
    /// default flag. Returns false when `id` does not exist.
    async fn set_default_schedule(&self, id: u64) -> StoreResult<bool>;

    async fn delete_schedule(&self, id: u64) -> StoreResult<bool>;

    async fn assignment_count(&self, schedule_id: u64) -> StoreResult<u64>;

    async fn list_assignments(
        &self,
    ) -> StoreResult<Vec<(WorkScheduleAssignment, WorkSchedule)>>;

    async fn insert_assignment(
        &self,
        new: NewAssignment,
    ) -> StoreResult<WorkScheduleAssignment>;

    async fn delete_assignment(&self, id: u64) -> StoreResult<bool>;

    async fn list_special_days(
        &self,
        month: Option<(i32, u32)>,
    ) -> StoreResult<Vec<SpecialDay>>;

    /// Returns None when the date is already taken (one special day per date).
    async fn insert_special_day(&self, new: NewSpecialDay) -> StoreResult<Option<SpecialDay>>;

    async fn update_special_day(
        &self,
        id: u64,
        new: NewSpecialDay,
    ) -> StoreResult<Option<SpecialDay>>;

    async fn delete_special_day(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait QrSessionStore: Send + Sync {
    /// Atomically deactivate the active sessions matching (date, type) —
    /// all types for the date when `session_type` is None — then insert and
    /// activate `new`. Linearizable per date so two concurrent generates
    /// cannot leave two active sessions behind.
    async fn rotate_sessions(
        &self,
        date: NaiveDate,
        session_type: Option<QrSessionType>,
        new: Vec<NewQrSession>,
    ) -> StoreResult<Vec<QrSession>>;

    async fn session_by_token(&self, token: &str) -> StoreResult<Option<QrSession>>;

    /// Active, non-expired sessions for a date, CHECK_IN first.
    async fn active_sessions(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<QrSession>>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Upsert keyed on (teacher_id, date), atomic per key: creates the
    /// ABSENT placeholder when no record exists, then applies the event's
    /// state transition.
    async fn apply_attendance(
        &self,
        teacher_id: u64,
        date: NaiveDate,
        event: AttendanceEvent,
    ) -> StoreResult<AttendanceRecord>;

    async fn attendance_on(
        &self,
        teacher_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>>;
}

#[async_trait]
pub trait FingerprintStore: Send + Sync {
    async fn insert_fingerprint_log(
        &self,
        new: NewFingerprintLog,
    ) -> StoreResult<FingerprintLog>;
}

#[async_trait]
pub trait TeacherStore: Send + Sync {
    async fn teacher_by_id(&self, id: u64) -> StoreResult<Option<Teacher>>;

    /// Bulk badge lookup: fingerprint id -> teacher id, one query.
    async fn fingerprint_teacher_map(&self) -> StoreResult<HashMap<String, u64>>;

    async fn teachers_by_ids(&self, ids: &[u64]) -> StoreResult<HashMap<u64, Teacher>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;

    async fn user_by_id(&self, id: u64) -> StoreResult<Option<UserRecord>>;
}

/// Everything the HTTP layer needs, as one trait object.
pub trait Store:
    ScheduleStore + QrSessionStore + AttendanceStore + FingerprintStore + TeacherStore + UserStore
{
}

impl<T> Store for T where
    T: ScheduleStore
        + QrSessionStore
        + AttendanceStore
        + FingerprintStore
        + TeacherStore
        + UserStore
        + ?Sized
{
}
