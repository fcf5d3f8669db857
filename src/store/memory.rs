//! In-memory store. Backs the test suite and mirrors the concurrency
//! contract of the MySQL store: one mutex makes QR rotation and attendance
//! upserts linearizable.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::model::attendance::{AttendanceEvent, AttendanceRecord};
use crate::model::fingerprint::{FingerprintLog, NewFingerprintLog};
use crate::model::qr::{NewQrSession, QrSession, QrSessionType};
use crate::model::schedule::{
    NewAssignment, NewSpecialDay, NewWorkSchedule, SpecialDay, WorkSchedule,
    WorkScheduleAssignment,
};
use crate::model::teacher::Teacher;
use crate::model::user::UserRecord;

use super::{
    AttendanceStore, FingerprintStore, QrSessionStore, ScheduleStore, StoreResult, TeacherStore,
    UserStore,
};

#[derive(Default)]
struct Inner {
    schedules: Vec<WorkSchedule>,
    assignments: Vec<WorkScheduleAssignment>,
    special_days: Vec<SpecialDay>,
    sessions: Vec<QrSession>,
    attendance: BTreeMap<(u64, NaiveDate), AttendanceRecord>,
    fingerprint_logs: Vec<FingerprintLog>,
    teachers: Vec<Teacher>,
    users: Vec<UserRecord>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens after a panic in another test thread;
        // propagating the data is still sound for a plain record store.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Seeding helpers for collaborators whose CRUD lives outside this
    // service (teachers, users).

    pub fn add_teacher(&self, name: &str, nip: &str, fingerprint_id: Option<&str>) -> Teacher {
        let mut inner = self.lock();
        let teacher = Teacher {
            id: inner.next_id(),
            name: name.to_string(),
            nip: nip.to_string(),
            fingerprint_id: fingerprint_id.map(|s| s.to_string()),
        };
        inner.teachers.push(teacher.clone());
        teacher
    }

    pub fn add_user(
        &self,
        username: &str,
        password_hash: &str,
        role_id: u8,
        teacher_id: Option<u64>,
    ) -> UserRecord {
        let mut inner = self.lock();
        let user = UserRecord {
            id: inner.next_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role_id,
            teacher_id,
        };
        inner.users.push(user.clone());
        user
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn special_day_on(&self, date: NaiveDate) -> StoreResult<Option<SpecialDay>> {
        Ok(self
            .lock()
            .special_days
            .iter()
            .find(|sd| sd.date == date)
            .cloned())
    }

    async fn assignment_covering(
        &self,
        date: NaiveDate,
    ) -> StoreResult<Option<(WorkScheduleAssignment, WorkSchedule)>> {
        let inner = self.lock();
        // ids are monotonic, so max id == most recently created
        let hit = inner
            .assignments
            .iter()
            .filter(|a| a.covers(date))
            .max_by_key(|a| a.id);
        Ok(hit.and_then(|a| {
            inner
                .schedules
                .iter()
                .find(|s| s.id == a.work_schedule_id)
                .map(|s| (a.clone(), s.clone()))
        }))
    }

    async fn default_schedule(&self) -> StoreResult<Option<WorkSchedule>> {
        Ok(self
            .lock()
            .schedules
            .iter()
            .find(|s| s.is_default)
            .cloned())
    }

    async fn assignments_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<(WorkScheduleAssignment, WorkSchedule)>> {
        let inner = self.lock();
        let mut hits: Vec<_> = inner
            .assignments
            .iter()
            .filter(|a| a.overlaps(start, end))
            .filter_map(|a| {
                inner
                    .schedules
                    .iter()
                    .find(|s| s.id == a.work_schedule_id)
                    .map(|s| (a.clone(), s.clone()))
            })
            .collect();
        hits.sort_by(|x, y| y.0.id.cmp(&x.0.id));
        Ok(hits)
    }

    async fn all_schedules(&self) -> StoreResult<Vec<WorkSchedule>> {
        Ok(self.lock().schedules.clone())
    }

    async fn schedule_by_id(&self, id: u64) -> StoreResult<Option<WorkSchedule>> {
        Ok(self.lock().schedules.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_schedule(&self, new: NewWorkSchedule) -> StoreResult<WorkSchedule> {
        let mut inner = self.lock();
        let schedule = WorkSchedule {
            id: inner.next_id(),
            name: new.name,
            start_time: new.start_time,
            end_time: new.end_time,
            late_tolerance_minutes: new.late_tolerance_minutes,
            working_days: new.working_days,
            is_default: false,
        };
        inner.schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn update_schedule(
        &self,
        id: u64,
        new: NewWorkSchedule,
    ) -> StoreResult<Option<WorkSchedule>> {
        let mut inner = self.lock();
        let Some(schedule) = inner.schedules.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        schedule.name = new.name;
        schedule.start_time = new.start_time;
        schedule.end_time = new.end_time;
        schedule.late_tolerance_minutes = new.late_tolerance_minutes;
        schedule.working_days = new.working_days;
        Ok(Some(schedule.clone()))
    }

    async fn set_default_schedule(&self, id: u64) -> StoreResult<bool> {
        let mut inner = self.lock();
        if !inner.schedules.iter().any(|s| s.id == id) {
            return Ok(false);
        }
        for s in inner.schedules.iter_mut() {
            s.is_default = s.id == id;
        }
        Ok(true)
    }

    async fn delete_schedule(&self, id: u64) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.schedules.len();
        inner.schedules.retain(|s| s.id != id);
        Ok(inner.schedules.len() < before)
    }

    async fn assignment_count(&self, schedule_id: u64) -> StoreResult<u64> {
        Ok(self
            .lock()
            .assignments
            .iter()
            .filter(|a| a.work_schedule_id == schedule_id)
            .count() as u64)
    }

    async fn list_assignments(
        &self,
    ) -> StoreResult<Vec<(WorkScheduleAssignment, WorkSchedule)>> {
        let inner = self.lock();
        let mut out: Vec<_> = inner
            .assignments
            .iter()
            .filter_map(|a| {
                inner
                    .schedules
                    .iter()
                    .find(|s| s.id == a.work_schedule_id)
                    .map(|s| (a.clone(), s.clone()))
            })
            .collect();
        out.sort_by(|x, y| y.0.start_date.cmp(&x.0.start_date));
        Ok(out)
    }

    async fn insert_assignment(
        &self,
        new: NewAssignment,
    ) -> StoreResult<WorkScheduleAssignment> {
        let mut inner = self.lock();
        let assignment = WorkScheduleAssignment {
            id: inner.next_id(),
            work_schedule_id: new.work_schedule_id,
            start_date: new.start_date,
            end_date: new.end_date,
            created_at: Utc::now(),
        };
        inner.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn delete_assignment(&self, id: u64) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.assignments.len();
        inner.assignments.retain(|a| a.id != id);
        Ok(inner.assignments.len() < before)
    }

    async fn list_special_days(
        &self,
        month: Option<(i32, u32)>,
    ) -> StoreResult<Vec<SpecialDay>> {
        let mut days: Vec<_> = self
            .lock()
            .special_days
            .iter()
            .filter(|sd| match month {
                Some((y, m)) => sd.date.year() == y && sd.date.month() == m,
                None => true,
            })
            .cloned()
            .collect();
        days.sort_by_key(|sd| sd.date);
        Ok(days)
    }

    async fn insert_special_day(&self, new: NewSpecialDay) -> StoreResult<Option<SpecialDay>> {
        let mut inner = self.lock();
        if inner.special_days.iter().any(|sd| sd.date == new.date) {
            return Ok(None);
        }
        let day = SpecialDay {
            id: inner.next_id(),
            date: new.date,
            name: new.name,
            day_type: new.day_type,
            start_time: new.start_time,
            end_time: new.end_time,
            is_overtime: new.is_overtime,
            notes: new.notes,
        };
        inner.special_days.push(day.clone());
        Ok(Some(day))
    }

    async fn update_special_day(
        &self,
        id: u64,
        new: NewSpecialDay,
    ) -> StoreResult<Option<SpecialDay>> {
        let mut inner = self.lock();
        let Some(day) = inner.special_days.iter_mut().find(|sd| sd.id == id) else {
            return Ok(None);
        };
        day.date = new.date;
        day.name = new.name;
        day.day_type = new.day_type;
        day.start_time = new.start_time;
        day.end_time = new.end_time;
        day.is_overtime = new.is_overtime;
        day.notes = new.notes;
        Ok(Some(day.clone()))
    }

    async fn delete_special_day(&self, id: u64) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.special_days.len();
        inner.special_days.retain(|sd| sd.id != id);
        Ok(inner.special_days.len() < before)
    }
}

#[async_trait]
impl QrSessionStore for MemoryStore {
    async fn rotate_sessions(
        &self,
        date: NaiveDate,
        session_type: Option<QrSessionType>,
        new: Vec<NewQrSession>,
    ) -> StoreResult<Vec<QrSession>> {
        let mut inner = self.lock();
        for session in inner.sessions.iter_mut() {
            if session.date == date
                && session.is_active
                && session_type.is_none_or(|t| session.session_type == t)
            {
                session.is_active = false;
            }
        }
        let mut created = Vec::with_capacity(new.len());
        for n in new {
            let session = QrSession {
                id: inner.next_id(),
                session_type: n.session_type,
                token: n.token,
                date: n.date,
                valid_from: n.valid_from,
                valid_until: n.valid_until,
                is_active: true,
            };
            inner.sessions.push(session.clone());
            created.push(session);
        }
        Ok(created)
    }

    async fn session_by_token(&self, token: &str) -> StoreResult<Option<QrSession>> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn active_sessions(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<QrSession>> {
        let mut sessions: Vec<_> = self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.date == date && s.is_active && s.valid_until >= now)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.session_type);
        Ok(sessions)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn apply_attendance(
        &self,
        teacher_id: u64,
        date: NaiveDate,
        event: AttendanceEvent,
    ) -> StoreResult<AttendanceRecord> {
        let mut inner = self.lock();
        let record = inner
            .attendance
            .entry((teacher_id, date))
            .or_insert_with(|| AttendanceRecord::placeholder(teacher_id, date));
        record.apply(&event);
        Ok(record.clone())
    }

    async fn attendance_on(
        &self,
        teacher_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self.lock().attendance.get(&(teacher_id, date)).cloned())
    }
}

#[async_trait]
impl FingerprintStore for MemoryStore {
    async fn insert_fingerprint_log(
        &self,
        new: NewFingerprintLog,
    ) -> StoreResult<FingerprintLog> {
        let mut inner = self.lock();
        let log = FingerprintLog {
            id: inner.next_id(),
            fingerprint_id: new.fingerprint_id,
            scanned_at: new.scanned_at,
            raw_type: new.raw_type,
        };
        inner.fingerprint_logs.push(log.clone());
        Ok(log)
    }
}

#[async_trait]
impl TeacherStore for MemoryStore {
    async fn teacher_by_id(&self, id: u64) -> StoreResult<Option<Teacher>> {
        Ok(self.lock().teachers.iter().find(|t| t.id == id).cloned())
    }

    async fn fingerprint_teacher_map(&self) -> StoreResult<HashMap<String, u64>> {
        Ok(self
            .lock()
            .teachers
            .iter()
            .filter_map(|t| t.fingerprint_id.clone().map(|fp| (fp, t.id)))
            .collect())
    }

    async fn teachers_by_ids(&self, ids: &[u64]) -> StoreResult<HashMap<u64, Teacher>> {
        Ok(self
            .lock()
            .teachers
            .iter()
            .filter(|t| ids.contains(&t.id))
            .map(|t| (t.id, t.clone()))
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_by_id(&self, id: u64) -> StoreResult<Option<UserRecord>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }
}
