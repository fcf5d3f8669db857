use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Weekday codes accepted in `working_days`, Monday first.
pub const DAY_CODES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Grace period used for custom-schedule days when no regular template is
/// resolvable to inherit a tolerance from.
pub const DEFAULT_LATE_TOLERANCE_MINUTES: u32 = 15;

/// Serialize/deserialize `NaiveTime` as wall-clock "HH:MM".
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(de)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}

/// Same as [`hhmm`] but for optional times.
pub mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, ser: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => ser.serialize_str(&t.format("%H:%M").to_string()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(de)?;
        match raw {
            Some(s) => NaiveTime::parse_from_str(&s, "%H:%M")
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Short code for a date's weekday, matching [`DAY_CODES`].
pub fn day_code(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// A reusable daily schedule template.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "name": "Jadwal Reguler",
    "startTime": "07:00",
    "endTime": "15:00",
    "lateToleranceMinutes": 10,
    "workingDays": ["Mon", "Tue", "Wed", "Thu", "Fri"],
    "isDefault": true
}))]
pub struct WorkSchedule {
    pub id: u64,
    pub name: String,
    #[serde(with = "hhmm")]
    #[schema(example = "07:00", value_type = String)]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(example = "15:00", value_type = String)]
    pub end_time: NaiveTime,
    pub late_tolerance_minutes: u32,
    pub working_days: Vec<String>,
    pub is_default: bool,
}

impl WorkSchedule {
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        let code = day_code(date);
        self.working_days.iter().any(|d| d == code)
    }
}

/// Template fields as received at the schedule-write boundary.
#[derive(Debug, Clone)]
pub struct NewWorkSchedule {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub late_tolerance_minutes: u32,
    pub working_days: Vec<String>,
}

/// Binds a template as effective for an inclusive date range.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkScheduleAssignment {
    pub id: u64,
    pub work_schedule_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl WorkScheduleAssignment {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub work_schedule_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema,
    strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecialDayType {
    Holiday,
    CustomSchedule,
    Overtime,
}

/// Single-date override, independent of assignments. One per calendar date.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialDay {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub name: String,
    #[serde(rename = "type")]
    pub day_type: SpecialDayType,
    #[serde(with = "hhmm_opt")]
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "hhmm_opt")]
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub is_overtime: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSpecialDay {
    pub date: NaiveDate,
    pub name: String,
    pub day_type: SpecialDayType,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_overtime: bool,
    pub notes: Option<String>,
}

/// Which resolution strategy produced an effective schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    SpecialDay,
    Assignment,
    Default,
}

/// Special-day details carried on a resolved schedule for caller display.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialDayInfo {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub day_type: SpecialDayType,
    pub notes: Option<String>,
}

impl From<&SpecialDay> for SpecialDayInfo {
    fn from(sd: &SpecialDay) -> Self {
        Self {
            id: sd.id,
            name: sd.name.clone(),
            day_type: sd.day_type,
            notes: sd.notes.clone(),
        }
    }
}

/// The single schedule that applies to one concrete date after resolution.
/// `start_time`/`end_time` of `None` means no work is expected (holiday);
/// callers must not compute lateness against it.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSchedule {
    pub source: ScheduleSource,
    pub name: String,
    #[serde(with = "hhmm_opt")]
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "hhmm_opt")]
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub late_tolerance_minutes: u32,
    pub is_overtime: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_day: Option<SpecialDayInfo>,
}

impl EffectiveSchedule {
    pub fn from_template(template: &WorkSchedule, source: ScheduleSource) -> Self {
        Self {
            source,
            name: template.name.clone(),
            start_time: Some(template.start_time),
            end_time: Some(template.end_time),
            late_tolerance_minutes: template.late_tolerance_minutes,
            is_overtime: false,
            special_day: None,
        }
    }

    /// True when the day carries working hours at all.
    pub fn expects_work(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(days: &[&str]) -> WorkSchedule {
        WorkSchedule {
            id: 1,
            name: "Reguler".into(),
            start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            late_tolerance_minutes: 10,
            working_days: days.iter().map(|d| d.to_string()).collect(),
            is_default: true,
        }
    }

    #[test]
    fn working_day_uses_weekday_codes() {
        let s = schedule(&["Mon", "Tue", "Wed", "Thu", "Fri"]);
        // 2026-02-02 is a Monday, 2026-02-07 a Saturday.
        assert!(s.is_working_day(NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()));
        assert!(!s.is_working_day(NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()));
    }

    #[test]
    fn assignment_range_is_inclusive() {
        let a = WorkScheduleAssignment {
            id: 1,
            work_schedule_id: 1,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            created_at: Utc::now(),
        };
        assert!(a.covers(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()));
        assert!(a.covers(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()));
        assert!(!a.covers(NaiveDate::from_ymd_opt(2026, 1, 21).unwrap()));
        assert!(a.overlaps(
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        ));
        assert!(!a.overlaps(
            NaiveDate::from_ymd_opt(2026, 1, 21).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        ));
    }

    #[test]
    fn hhmm_round_trips_through_json() {
        let s = schedule(&["Mon"]);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["startTime"], "07:00");
        let back: WorkSchedule = serde_json::from_value(json).unwrap();
        assert_eq!(back.start_time, s.start_time);
    }

    #[test]
    fn special_day_type_codes() {
        assert_eq!(SpecialDayType::CustomSchedule.to_string(), "CUSTOM_SCHEDULE");
        assert_eq!(
            "HOLIDAY".parse::<SpecialDayType>().unwrap(),
            SpecialDayType::Holiday
        );
    }
}
