//! Bulk import of fingerprint-device logs.

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::reconcile;
use crate::error::EngineError;
use crate::model::fingerprint::RawScanInput;
use crate::store::Store;

#[derive(Deserialize, ToSchema)]
pub struct ImportRequest {
    pub logs: Vec<RawScanInput>,
}

/// Import a device export and reconcile it into daily attendance records.
#[utoipa::path(
    post,
    path = "/api/fingerprint/import",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Import report", body = reconcile::ImportReport),
        (status = 400, description = "No work schedule configured", body = Object, example = json!({
            "message": "No work schedule configured. Please set a default schedule or create an assignment."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Fingerprint"
)]
pub async fn import(
    auth: AuthUser,
    body: web::Json<ImportRequest>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_principal()?;

    tracing::info!(logs = body.logs.len(), "Fingerprint import received");
    let report = match reconcile::import(store.get_ref(), &body.logs, config.tz_offset()).await {
        Ok(report) => report,
        Err(e @ EngineError::ConfigurationMissing) => {
            return Ok(HttpResponse::BadRequest().json(json!({"message": e.to_string()})));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        imported = report.imported,
        skipped = report.skipped,
        "Fingerprint import reconciled"
    );
    Ok(HttpResponse::Ok().json(report))
}
