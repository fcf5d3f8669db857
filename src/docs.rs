use crate::api::fingerprint::ImportRequest;
use crate::api::qr::{AutoGenerateRequest, CheckRequest, GenerateRequest};
use crate::api::schedule::{AssignmentRequest, SpecialDayRequest, WorkScheduleRequest};
use crate::engine::reconcile::{DateRange, ImportReport, ImportSample};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::fingerprint::RawScanInput;
use crate::model::qr::{QrSession, QrSessionType};
use crate::model::schedule::{
    EffectiveSchedule, SpecialDay, SpecialDayType, WorkSchedule, WorkScheduleAssignment,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presensi API",
        version = "1.0.0",
        description = r#"
## Teacher Attendance (Presensi) System

This API powers a **teacher attendance** system for schools.

### 🔹 Key Features
- **Schedule Settings**
  - Work-schedule templates, date-range assignments, special days
- **QR Attendance**
  - Time-boxed QR sessions for check-in and check-out scans
- **Fingerprint Import**
  - Bulk reconciliation of device logs into daily records

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Write operations require an **Admin** or **Principal** account; the scan
endpoint requires a **Teacher** account.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::qr::generate,
        crate::api::qr::auto_generate,
        crate::api::qr::active,
        crate::api::qr::check,

        crate::api::fingerprint::import,

        crate::api::schedule::list_schedules,
        crate::api::schedule::create_schedule,
        crate::api::schedule::update_schedule,
        crate::api::schedule::delete_schedule,
        crate::api::schedule::list_assignments,
        crate::api::schedule::create_assignment,
        crate::api::schedule::delete_assignment,
        crate::api::schedule::list_special_days,
        crate::api::schedule::create_special_day,
        crate::api::schedule::update_special_day,
        crate::api::schedule::delete_special_day
    ),
    components(
        schemas(
            GenerateRequest,
            AutoGenerateRequest,
            CheckRequest,
            QrSession,
            QrSessionType,
            ImportRequest,
            RawScanInput,
            ImportReport,
            ImportSample,
            DateRange,
            AttendanceRecord,
            AttendanceStatus,
            WorkScheduleRequest,
            WorkSchedule,
            WorkScheduleAssignment,
            AssignmentRequest,
            SpecialDayRequest,
            SpecialDay,
            SpecialDayType,
            EffectiveSchedule
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "QR", description = "QR attendance session APIs"),
        (name = "Fingerprint", description = "Fingerprint log import APIs"),
        (name = "Settings", description = "Schedule settings APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
