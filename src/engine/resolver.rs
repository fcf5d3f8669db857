//! Effective-schedule resolution: an ordered chain of strategies, first
//! match wins. Special-day override, then date-range assignment, then the
//! default template. An OVERTIME special day does not resolve by itself; it
//! decorates whatever the regular chain produces and bypasses the
//! working-day check.

use chrono::NaiveDate;

use crate::error::EngineError;
use crate::model::schedule::{
    DEFAULT_LATE_TOLERANCE_MINUTES, EffectiveSchedule, ScheduleSource, SpecialDay,
    SpecialDayInfo, SpecialDayType, WorkSchedule,
};
use crate::store::ScheduleStore;

/// Resolution strategies in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SpecialDayOverride,
    DateRangeAssignment,
    DefaultTemplate,
}

pub const PRIORITY: [Strategy; 3] = [
    Strategy::SpecialDayOverride,
    Strategy::DateRangeAssignment,
    Strategy::DefaultTemplate,
];

/// The regular template effective on a date: covering assignment first
/// (most recently created wins on overlap), default template otherwise.
async fn regular_template<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> Result<Option<(WorkSchedule, ScheduleSource)>, EngineError> {
    if let Some((_, schedule)) = store.assignment_covering(date).await? {
        return Ok(Some((schedule, ScheduleSource::Assignment)));
    }
    Ok(store
        .default_schedule()
        .await?
        .map(|schedule| (schedule, ScheduleSource::Default)))
}

/// A special day that short-circuits resolution on its own: HOLIDAY always,
/// CUSTOM_SCHEDULE when it carries both times. OVERTIME falls through.
async fn try_special_day_override<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    special: &SpecialDay,
) -> Result<Option<EffectiveSchedule>, EngineError> {
    match special.day_type {
        SpecialDayType::Holiday => Ok(Some(EffectiveSchedule {
            source: ScheduleSource::SpecialDay,
            name: special.name.clone(),
            start_time: None,
            end_time: None,
            late_tolerance_minutes: 0,
            is_overtime: false,
            special_day: Some(SpecialDayInfo::from(special)),
        })),
        SpecialDayType::CustomSchedule => {
            let (Some(start), Some(end)) = (special.start_time, special.end_time) else {
                return Ok(None);
            };
            // Tolerance is inherited from whichever regular template would
            // otherwise apply on this date.
            let tolerance = regular_template(store, date)
                .await?
                .map(|(t, _)| t.late_tolerance_minutes)
                .unwrap_or(DEFAULT_LATE_TOLERANCE_MINUTES);
            Ok(Some(EffectiveSchedule {
                source: ScheduleSource::SpecialDay,
                name: special.name.clone(),
                start_time: Some(start),
                end_time: Some(end),
                late_tolerance_minutes: tolerance,
                is_overtime: special.is_overtime,
                special_day: Some(SpecialDayInfo::from(special)),
            }))
        }
        SpecialDayType::Overtime => Ok(None),
    }
}

/// Resolve the single effective schedule for `date`.
///
/// Pure read over the store snapshot: deterministic for a fixed snapshot,
/// no clock dependence beyond the date itself. The two failure modes are
/// distinct on purpose — `NonWorkingDay` is benign, `ConfigurationMissing`
/// needs admin intervention and must never be silently defaulted.
pub async fn resolve<S: ScheduleStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> Result<EffectiveSchedule, EngineError> {
    let special = store.special_day_on(date).await?;
    let mut regular: Option<(WorkSchedule, ScheduleSource)> = None;

    for strategy in PRIORITY {
        match strategy {
            Strategy::SpecialDayOverride => {
                if let Some(sd) = &special {
                    if let Some(resolved) = try_special_day_override(store, date, sd).await? {
                        return Ok(resolved);
                    }
                }
            }
            Strategy::DateRangeAssignment => {
                if regular.is_none() {
                    regular = store
                        .assignment_covering(date)
                        .await?
                        .map(|(_, schedule)| (schedule, ScheduleSource::Assignment));
                }
            }
            Strategy::DefaultTemplate => {
                if regular.is_none() {
                    regular = store
                        .default_schedule()
                        .await?
                        .map(|schedule| (schedule, ScheduleSource::Default));
                }
            }
        }
    }

    let overtime = special
        .as_ref()
        .filter(|sd| sd.day_type == SpecialDayType::Overtime);

    let Some((template, source)) = regular else {
        return Err(EngineError::ConfigurationMissing);
    };

    if !template.is_working_day(date) {
        // Overtime days are allowed outside the template's working days,
        // using the special day's times when it carries them.
        let Some(sd) = overtime else {
            return Err(EngineError::NonWorkingDay(date));
        };
        return Ok(EffectiveSchedule {
            source: ScheduleSource::SpecialDay,
            name: sd.name.clone(),
            start_time: Some(sd.start_time.unwrap_or(template.start_time)),
            end_time: Some(sd.end_time.unwrap_or(template.end_time)),
            late_tolerance_minutes: template.late_tolerance_minutes,
            is_overtime: true,
            special_day: Some(SpecialDayInfo::from(sd)),
        });
    }

    let mut resolved = EffectiveSchedule::from_template(&template, source);
    if let Some(sd) = overtime {
        resolved.source = ScheduleSource::SpecialDay;
        resolved.is_overtime = true;
        resolved.special_day = Some(SpecialDayInfo::from(sd));
    }
    Ok(resolved)
}
