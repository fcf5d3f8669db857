//! Bulk reconciliation of fingerprint-device logs into daily attendance
//! records. One pass validates and persists the raw scans, a second pass
//! groups them per (teacher, day) and upserts first-IN/last-OUT records.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::{classify, local_date};
use crate::error::EngineError;
use crate::model::attendance::{AttendanceEvent, AttendanceStatus};
use crate::model::fingerprint::{FingerprintLog, NewFingerprintLog, RawScanInput, ScanDirection};
use crate::model::schedule::WorkSchedule;
use crate::store::{AttendanceStore, FingerprintStore, ScheduleStore, TeacherStore};

const MAX_SAMPLES: usize = 5;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSample {
    pub teacher_name: String,
    pub teacher_nip: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub late_minutes: u32,
    pub schedule_used: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[schema(value_type = String, format = "date")]
    pub start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub processed_date_range: Option<DateRange>,
    pub samples: Vec<ImportSample>,
}

/// Per-day template map built from one assignment range query. Special-day
/// overrides are not consulted here; the per-scan path is the authority on
/// those.
struct ScheduleCache {
    by_date: HashMap<NaiveDate, WorkSchedule>,
    fallback: WorkSchedule,
}

impl ScheduleCache {
    async fn build<S>(store: &S, start: NaiveDate, end: NaiveDate) -> Result<Self, EngineError>
    where
        S: ScheduleStore + ?Sized,
    {
        let templates = store.all_schedules().await?;
        let fallback = templates
            .iter()
            .find(|s| s.is_default)
            .or_else(|| templates.first())
            .cloned()
            .ok_or(EngineError::ConfigurationMissing)?;

        // Newest-first, so the first covering assignment wins per day.
        let assignments = store.assignments_overlapping(start, end).await?;
        let mut by_date = HashMap::new();
        let mut day = start;
        while day <= end {
            if let Some((_, schedule)) = assignments.iter().find(|(a, _)| a.covers(day)) {
                by_date.insert(day, schedule.clone());
            }
            let Some(next) = day.succ_opt() else { break };
            day = next;
        }
        Ok(Self { by_date, fallback })
    }

    fn template_for(&self, date: NaiveDate) -> &WorkSchedule {
        self.by_date.get(&date).unwrap_or(&self.fallback)
    }
}

/// Parse one uploaded line. RFC 3339 timestamps keep their own offset;
/// offset-less ones are read as local time in the configured zone.
fn validate_raw(raw: &RawScanInput, tz: FixedOffset) -> Option<NewFingerprintLog> {
    let fingerprint_id = raw.fingerprint_id.as_ref()?.trim();
    if fingerprint_id.is_empty() {
        return None;
    }
    let stamp = raw.scanned_at.as_ref()?;
    let scanned_at = parse_timestamp(stamp, tz)?;
    let raw_type = ScanDirection::from_str(raw.raw_type.as_ref()?).ok()?;
    Some(NewFingerprintLog {
        fingerprint_id: fingerprint_id.to_string(),
        scanned_at,
        raw_type,
    })
}

fn parse_timestamp(value: &str, tz: FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok()?;
    naive
        .and_local_timezone(tz)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Validate, persist, and reconcile a batch of raw scans. Idempotent: the
/// attendance side is an upsert per (teacher, day), so re-importing the
/// same batch converges on the same records.
pub async fn import<S>(
    store: &S,
    logs: &[RawScanInput],
    tz: FixedOffset,
) -> Result<ImportReport, EngineError>
where
    S: ScheduleStore + AttendanceStore + FingerprintStore + TeacherStore + ?Sized,
{
    let mut skipped = 0usize;
    let mut persisted: Vec<FingerprintLog> = Vec::with_capacity(logs.len());
    for raw in logs {
        match validate_raw(raw, tz) {
            Some(new) => persisted.push(store.insert_fingerprint_log(new).await?),
            None => skipped += 1,
        }
    }

    if persisted.is_empty() {
        return Ok(ImportReport {
            imported: 0,
            skipped,
            processed_date_range: None,
            samples: Vec::new(),
        });
    }
    let imported = persisted.len();

    let mut start = local_date(persisted[0].scanned_at, tz);
    let mut end = start;
    for log in &persisted[1..] {
        let date = local_date(log.scanned_at, tz);
        start = start.min(date);
        end = end.max(date);
    }
    let cache = ScheduleCache::build(store, start, end).await?;

    // Logs with a badge no teacher carries stay in the raw table only.
    let badge_map = store.fingerprint_teacher_map().await?;
    let mut groups: BTreeMap<(u64, NaiveDate), Vec<&FingerprintLog>> = BTreeMap::new();
    for log in &persisted {
        if let Some(&teacher_id) = badge_map.get(&log.fingerprint_id) {
            groups
                .entry((teacher_id, local_date(log.scanned_at, tz)))
                .or_default()
                .push(log);
        }
    }

    let mut samples = Vec::new();
    let mut sample_keys: Vec<(u64, NaiveDate)> = Vec::new();
    for (&(teacher_id, date), scans) in &groups {
        let check_in = scans
            .iter()
            .filter(|l| l.raw_type == ScanDirection::In)
            .min_by_key(|l| l.scanned_at)
            .map(|l| l.scanned_at);
        let check_out = scans
            .iter()
            .filter(|l| l.raw_type == ScanDirection::Out)
            .max_by_key(|l| l.scanned_at)
            .map(|l| l.scanned_at);

        let template = cache.template_for(date);
        let (status, late_minutes) = match check_in {
            Some(at) => {
                let minutes = classify::minutes_since_midnight(at, tz);
                let c = classify::classify_minutes(
                    minutes,
                    template.start_time,
                    template.late_tolerance_minutes,
                );
                (c.status, c.late_minutes)
            }
            None => (AttendanceStatus::Absent, 0),
        };

        let record = store
            .apply_attendance(
                teacher_id,
                date,
                AttendanceEvent::Reconciled {
                    check_in,
                    check_out,
                    status,
                    late_minutes,
                },
            )
            .await?;

        if samples.len() < MAX_SAMPLES {
            sample_keys.push((teacher_id, date));
            samples.push(ImportSample {
                teacher_name: String::new(),
                teacher_nip: String::new(),
                date,
                check_in: record.check_in_time,
                check_out: record.check_out_time,
                status: record.status,
                late_minutes: record.late_minutes,
                schedule_used: template.name.clone(),
            });
        }
    }

    let ids: Vec<u64> = sample_keys.iter().map(|(id, _)| *id).collect();
    let teachers = store.teachers_by_ids(&ids).await?;
    for (sample, (teacher_id, _)) in samples.iter_mut().zip(&sample_keys) {
        if let Some(teacher) = teachers.get(teacher_id) {
            sample.teacher_name = teacher.name.clone();
            sample.teacher_nip = teacher.nip.clone();
        }
    }

    Ok(ImportReport {
        imported,
        skipped,
        processed_date_range: Some(DateRange { start, end }),
        samples,
    })
}
