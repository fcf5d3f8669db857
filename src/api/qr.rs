//! QR attendance endpoints: session administration for ADMIN/PRINCIPAL and
//! the scan endpoint teachers hit from their phones.

use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::{local_date, qr};
use crate::error::EngineError;
use crate::model::qr::QrSessionType;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// CHECK_IN or CHECK_OUT
    #[serde(rename = "type")]
    pub session_type: String,
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub valid_from: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub valid_until: Option<DateTime<Utc>>,
}

/// Mint a session for one type, replacing the active one.
#[utoipa::path(
    post,
    path = "/api/attendance/qr/generate",
    request_body = GenerateRequest,
    responses(
        (status = 201, description = "Session created", body = crate::model::qr::QrSession),
        (status = 400, description = "Invalid type or window", body = Object, example = json!({
            "message": "Invalid type. Must be CHECK_IN or CHECK_OUT"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "QR"
)]
pub async fn generate(
    auth: AuthUser,
    body: web::Json<GenerateRequest>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;

    let Ok(session_type) = QrSessionType::from_str(&body.session_type) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Invalid type. Must be CHECK_IN or CHECK_OUT"
        })));
    };

    let session = qr::generate(
        store.get_ref(),
        session_type,
        qr::GenerateParams {
            date: body.date,
            valid_from: body.valid_from,
            valid_until: body.valid_until,
        },
        Utc::now(),
        config.tz_offset(),
    )
    .await?;

    Ok(HttpResponse::Created().json(session))
}

#[derive(Deserialize, ToSchema)]
pub struct AutoGenerateRequest {
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

/// Mint both windows for a date from its resolved schedule.
#[utoipa::path(
    post,
    path = "/api/attendance/qr/auto-generate",
    request_body = AutoGenerateRequest,
    responses(
        (status = 201, description = "Both sessions created", body = Object),
        (status = 404, description = "No schedule for the date", body = Object, example = json!({
            "message": "No work schedule configured. Please set a default schedule or create an assignment."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "QR"
)]
pub async fn auto_generate(
    auth: AuthUser,
    body: web::Json<AutoGenerateRequest>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;

    let out = match qr::auto_generate(store.get_ref(), body.date, Utc::now(), config.tz_offset())
        .await
    {
        Ok(out) => out,
        // Missing configuration reads as "nothing to generate from" here.
        Err(e @ (EngineError::ConfigurationMissing | EngineError::NonWorkingDay(_))) => {
            return Ok(HttpResponse::NotFound().json(json!({"message": e.to_string()})));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Created().json(json!({
        "date": out.date,
        "schedule": {
            "name": out.schedule.name,
            "startTime": out.schedule.start_time.map(|t| t.format("%H:%M").to_string()),
            "endTime": out.schedule.end_time.map(|t| t.format("%H:%M").to_string()),
            "source": out.schedule.source,
        },
        "sessions": out.sessions,
    })))
}

#[derive(Deserialize)]
pub struct ActiveQuery {
    pub date: Option<String>,
}

/// Active sessions for a date (today by default).
#[utoipa::path(
    get,
    path = "/api/attendance/qr/active",
    params(("date" = Option<String>, Query, description = "YYYY-MM-DD, defaults to today")),
    responses(
        (status = 200, description = "Active sessions", body = Object),
        (status = 400, description = "Malformed date", body = Object, example = json!({
            "message": "Invalid date. Use YYYY-MM-DD"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "QR"
)]
pub async fn active(
    _auth: AuthUser,
    query: web::Query<ActiveQuery>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let now = Utc::now();
    let date = match query.date.as_deref() {
        None | Some("today") => local_date(now, config.tz_offset()),
        Some(raw) => match NaiveDate::from_str(raw) {
            Ok(d) => d,
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Invalid date. Use YYYY-MM-DD"
                })));
            }
        },
    };

    let sessions = qr::active_sessions(store.get_ref(), date, now).await?;
    Ok(HttpResponse::Ok().json(json!({"date": date, "data": sessions})))
}

#[derive(Deserialize, ToSchema)]
pub struct CheckRequest {
    pub token: String,
}

/// Scan endpoint: the teacher presents a session token and gets an
/// attendance record back.
#[utoipa::path(
    post,
    path = "/api/attendance/qr/check",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = Object),
        (status = 400, description = "Invalid or expired token, or no schedule", body = Object, example = json!({
            "message": "QR token is invalid or no longer active"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Teacher account required"),
        (status = 404, description = "No teacher record linked"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "QR"
)]
pub async fn check(
    auth: AuthUser,
    body: web::Json<CheckRequest>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher()?;
    let teacher_id = auth
        .teacher_id
        .ok_or_else(|| actix_web::error::ErrorNotFound("No teacher record linked"))?;

    if body.token.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"message": "Token is required"})));
    }

    let (session, record) = qr::validate_and_check(
        store.get_ref(),
        body.token.trim(),
        teacher_id,
        Utc::now(),
        config.tz_offset(),
    )
    .await?;

    let message = match session.session_type {
        QrSessionType::CheckIn => "Checked in successfully",
        QrSessionType::CheckOut => "Checked out successfully",
    };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "date": session.date,
        "type": session.session_type,
        "attendance": record,
    })))
}
