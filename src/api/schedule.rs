//! Schedule settings: work-schedule templates, date-range assignments, and
//! special days. All writes are ADMIN/PRINCIPAL and enforce the invariants
//! the resolver depends on (valid times, one default, one special day per
//! date).

use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::EngineError;
use crate::model::schedule::{
    DAY_CODES, NewAssignment, NewSpecialDay, NewWorkSchedule, SpecialDayType,
};
use crate::store::{ScheduleStore, Store};

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({"message": message}))
}

fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").ok()
}

// ---------------------------------------------------------------- templates

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkScheduleRequest {
    pub name: String,
    /// HH:MM
    #[schema(example = "07:00")]
    pub start_time: String,
    #[schema(example = "15:00")]
    pub end_time: String,
    pub late_tolerance_minutes: Option<u32>,
    /// Subset of Mon..Sun
    pub working_days: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl WorkScheduleRequest {
    fn validate(&self) -> Result<NewWorkSchedule, EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::MalformedInput("Name is required".into()));
        }
        let start_time = parse_hhmm(&self.start_time)
            .ok_or_else(|| EngineError::MalformedInput("Invalid startTime. Use HH:MM".into()))?;
        let end_time =
            parse_hhmm(&self.end_time).ok_or_else(|| EngineError::MalformedInput("Invalid endTime. Use HH:MM".into()))?;
        if end_time <= start_time {
            return Err(EngineError::MalformedInput("endTime must be after startTime".into()));
        }
        if self.working_days.is_empty() {
            return Err(EngineError::MalformedInput("workingDays must not be empty".into()));
        }
        for day in &self.working_days {
            if !DAY_CODES.contains(&day.as_str()) {
                return Err(EngineError::MalformedInput(format!("Invalid working day: {day}")));
            }
        }
        Ok(NewWorkSchedule {
            name: self.name.trim().to_string(),
            start_time,
            end_time,
            late_tolerance_minutes: self
                .late_tolerance_minutes
                .unwrap_or(crate::model::schedule::DEFAULT_LATE_TOLERANCE_MINUTES),
            working_days: self.working_days.clone(),
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/settings/work-schedules",
    responses(
        (status = 200, description = "All schedule templates", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_schedules(
    _auth: AuthUser,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    let schedules = store.all_schedules().await.map_err(EngineError::Store)?;
    Ok(HttpResponse::Ok().json(json!({"data": schedules})))
}

#[utoipa::path(
    post,
    path = "/api/settings/work-schedules",
    request_body = WorkScheduleRequest,
    responses(
        (status = 201, description = "Template created", body = crate::model::schedule::WorkSchedule),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn create_schedule(
    auth: AuthUser,
    body: web::Json<WorkScheduleRequest>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;
    let new = body.validate()?;

    let mut schedule = store.insert_schedule(new).await.map_err(EngineError::Store)?;
    if body.is_default {
        store
            .set_default_schedule(schedule.id)
            .await
            .map_err(EngineError::Store)?;
        schedule.is_default = true;
    }
    Ok(HttpResponse::Created().json(schedule))
}

#[utoipa::path(
    put,
    path = "/api/settings/work-schedules/{id}",
    request_body = WorkScheduleRequest,
    responses(
        (status = 200, description = "Template updated", body = crate::model::schedule::WorkSchedule),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Unknown template"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_schedule(
    auth: AuthUser,
    path: web::Path<u64>,
    body: web::Json<WorkScheduleRequest>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;
    let id = path.into_inner();
    let new = body.validate()?;

    let Some(mut schedule) = store
        .update_schedule(id, new)
        .await
        .map_err(EngineError::Store)?
    else {
        return Ok(HttpResponse::NotFound().json(json!({"message": "Work schedule not found"})));
    };
    if body.is_default && !schedule.is_default {
        store
            .set_default_schedule(id)
            .await
            .map_err(EngineError::Store)?;
        schedule.is_default = true;
    }
    Ok(HttpResponse::Ok().json(schedule))
}

#[utoipa::path(
    delete,
    path = "/api/settings/work-schedules/{id}",
    responses(
        (status = 200, description = "Template deleted"),
        (status = 400, description = "Template still referenced"),
        (status = 404, description = "Unknown template"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn delete_schedule(
    auth: AuthUser,
    path: web::Path<u64>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;
    let id = path.into_inner();

    let Some(schedule) = store.schedule_by_id(id).await.map_err(EngineError::Store)? else {
        return Ok(HttpResponse::NotFound().json(json!({"message": "Work schedule not found"})));
    };
    if schedule.is_default {
        return Ok(bad_request(
            "Cannot delete the default schedule. Set another default first.",
        ));
    }
    let referenced = store.assignment_count(id).await.map_err(EngineError::Store)?;
    if referenced > 0 {
        return Ok(bad_request(
            "Cannot delete a schedule that still has assignments",
        ));
    }

    store.delete_schedule(id).await.map_err(EngineError::Store)?;
    Ok(HttpResponse::Ok().json(json!({"message": "Work schedule deleted"})))
}

// -------------------------------------------------------------- assignments

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub schedule_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/settings/work-schedule-assignments",
    responses(
        (status = 200, description = "All assignments with their templates", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_assignments(
    _auth: AuthUser,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    let rows = store.list_assignments().await.map_err(EngineError::Store)?;
    let data: Vec<_> = rows
        .into_iter()
        .map(|(assignment, schedule)| {
            json!({
                "id": assignment.id,
                "scheduleId": assignment.work_schedule_id,
                "scheduleName": schedule.name,
                "startDate": assignment.start_date,
                "endDate": assignment.end_date,
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(json!({"data": data})))
}

#[utoipa::path(
    post,
    path = "/api/settings/work-schedule-assignments",
    request_body = AssignmentRequest,
    responses(
        (status = 201, description = "Assignment created; overlapping ids reported", body = Object),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Unknown template"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn create_assignment(
    auth: AuthUser,
    body: web::Json<AssignmentRequest>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;
    if body.end_date < body.start_date {
        return Ok(bad_request("endDate must not be before startDate"));
    }
    if store
        .schedule_by_id(body.schedule_id)
        .await
        .map_err(EngineError::Store)?
        .is_none()
    {
        return Ok(HttpResponse::NotFound().json(json!({"message": "Work schedule not found"})));
    }

    // Overlaps are allowed (newest wins at resolution time) but reported so
    // an accidental double-booking is visible immediately.
    let overlaps: Vec<u64> = store
        .assignments_overlapping(body.start_date, body.end_date)
        .await
        .map_err(EngineError::Store)?
        .into_iter()
        .map(|(a, _)| a.id)
        .collect();
    if !overlaps.is_empty() {
        tracing::warn!(?overlaps, "New assignment overlaps existing ranges");
    }

    let assignment = store
        .insert_assignment(NewAssignment {
            work_schedule_id: body.schedule_id,
            start_date: body.start_date,
            end_date: body.end_date,
        })
        .await
        .map_err(EngineError::Store)?;

    Ok(HttpResponse::Created().json(json!({
        "data": assignment,
        "overlaps": overlaps,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/settings/work-schedule-assignments/{id}",
    responses(
        (status = 200, description = "Assignment deleted"),
        (status = 404, description = "Unknown assignment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn delete_assignment(
    auth: AuthUser,
    path: web::Path<u64>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;
    if store
        .delete_assignment(path.into_inner())
        .await
        .map_err(EngineError::Store)?
    {
        Ok(HttpResponse::Ok().json(json!({"message": "Assignment deleted"})))
    } else {
        Ok(HttpResponse::NotFound().json(json!({"message": "Assignment not found"})))
    }
}

// ------------------------------------------------------------- special days

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialDayRequest {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub name: String,
    /// HOLIDAY, CUSTOM_SCHEDULE or OVERTIME
    #[serde(rename = "type")]
    pub day_type: String,
    #[schema(example = "08:00")]
    pub start_time: Option<String>,
    #[schema(example = "12:00")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_overtime: bool,
    pub notes: Option<String>,
}

impl SpecialDayRequest {
    fn validate(&self) -> Result<NewSpecialDay, EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::MalformedInput("Name is required".into()));
        }
        let day_type = SpecialDayType::from_str(&self.day_type)
            .map_err(|_| {
                EngineError::MalformedInput(
                    "Invalid type. Must be HOLIDAY, CUSTOM_SCHEDULE or OVERTIME".into(),
                )
            })?;

        let start_time = match &self.start_time {
            Some(raw) => {
                Some(parse_hhmm(raw).ok_or_else(|| EngineError::MalformedInput("Invalid startTime. Use HH:MM".into()))?)
            }
            None => None,
        };
        let end_time = match &self.end_time {
            Some(raw) => {
                Some(parse_hhmm(raw).ok_or_else(|| EngineError::MalformedInput("Invalid endTime. Use HH:MM".into()))?)
            }
            None => None,
        };
        if day_type == SpecialDayType::CustomSchedule
            && (start_time.is_none() || end_time.is_none())
        {
            return Err(EngineError::MalformedInput(
                "CUSTOM_SCHEDULE requires startTime and endTime".into(),
            ));
        }
        if let (Some(start), Some(end)) = (start_time, end_time) {
            if end <= start {
                return Err(EngineError::MalformedInput("endTime must be after startTime".into()));
            }
        }

        Ok(NewSpecialDay {
            date: self.date,
            name: self.name.trim().to_string(),
            day_type,
            start_time,
            end_time,
            is_overtime: self.is_overtime,
            notes: self.notes.clone(),
        })
    }
}

#[derive(Deserialize)]
pub struct SpecialDayQuery {
    /// YYYY-MM
    pub month: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/settings/special-days",
    params(("month" = Option<String>, Query, description = "YYYY-MM filter")),
    responses(
        (status = 200, description = "Special days", body = Object),
        (status = 400, description = "Malformed month filter"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_special_days(
    _auth: AuthUser,
    query: web::Query<SpecialDayQuery>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    let month = match query.month.as_deref() {
        None => None,
        Some(raw) => match raw.split_once('-').and_then(|(y, m)| {
            let year = y.parse::<i32>().ok()?;
            let month = m.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
            Some((year, month))
        }) {
            Some(pair) => Some(pair),
            None => return Ok(bad_request("Invalid month. Use YYYY-MM")),
        },
    };

    let days = store
        .list_special_days(month)
        .await
        .map_err(EngineError::Store)?;
    Ok(HttpResponse::Ok().json(json!({"data": days})))
}

#[utoipa::path(
    post,
    path = "/api/settings/special-days",
    request_body = SpecialDayRequest,
    responses(
        (status = 201, description = "Special day created", body = crate::model::schedule::SpecialDay),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Date already has a special day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn create_special_day(
    auth: AuthUser,
    body: web::Json<SpecialDayRequest>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;
    let new = body.validate()?;

    match store.insert_special_day(new).await.map_err(EngineError::Store)? {
        Some(day) => Ok(HttpResponse::Created().json(day)),
        None => Ok(HttpResponse::Conflict().json(json!({
            "message": "A special day already exists on that date"
        }))),
    }
}

#[utoipa::path(
    put,
    path = "/api/settings/special-days/{id}",
    request_body = SpecialDayRequest,
    responses(
        (status = 200, description = "Special day updated", body = crate::model::schedule::SpecialDay),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Unknown special day"),
        (status = 409, description = "Date already has a special day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_special_day(
    auth: AuthUser,
    path: web::Path<u64>,
    body: web::Json<SpecialDayRequest>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;
    let id = path.into_inner();
    let new = body.validate()?;

    // Moving onto a date another special day holds is a conflict.
    if let Some(existing) = store
        .special_day_on(new.date)
        .await
        .map_err(EngineError::Store)?
    {
        if existing.id != id {
            return Ok(HttpResponse::Conflict().json(json!({
                "message": "A special day already exists on that date"
            })));
        }
    }

    match store
        .update_special_day(id, new)
        .await
        .map_err(EngineError::Store)?
    {
        Some(day) => Ok(HttpResponse::Ok().json(day)),
        None => Ok(HttpResponse::NotFound().json(json!({"message": "Special day not found"}))),
    }
}

#[utoipa::path(
    delete,
    path = "/api/settings/special-days/{id}",
    responses(
        (status = 200, description = "Special day deleted"),
        (status = 404, description = "Unknown special day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn delete_special_day(
    auth: AuthUser,
    path: web::Path<u64>,
    store: web::Data<dyn Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;
    if store
        .delete_special_day(path.into_inner())
        .await
        .map_err(EngineError::Store)?
    {
        Ok(HttpResponse::Ok().json(json!({"message": "Special day deleted"})))
    } else {
        Ok(HttpResponse::NotFound().json(json!({"message": "Special day not found"})))
    }
}
