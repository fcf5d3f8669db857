use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token, password::verify_password},
    config::Config,
    store::{Store, TeacherStore, UserStore},
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub role: String,
}

#[instrument(
    name = "auth_login",
    skip(store, config, body),
    fields(username = %body.username)
)]
pub async fn login(
    body: web::Json<LoginRequest>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if body.username.trim().is_empty() || body.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "message": "Username and password are required"
        }));
    }

    debug!("Fetching user");
    let db_user = match store.user_by_username(body.username.trim()).await {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({"message": "Invalid credentials"}));
        }
        Err(e) => {
            error!(error = %e, "Store error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    debug!("Verifying password");
    if verify_password(&body.password, &db_user.password_hash).is_err() {
        info!("Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({"message": "Invalid credentials"}));
    }

    let role = match crate::model::user::Role::from_id(db_user.role_id) {
        Some(r) => r,
        None => {
            error!(role_id = db_user.role_id, "Account carries an unknown role");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let access_token = generate_access_token(
        db_user.id,
        db_user.username.clone(),
        db_user.role_id,
        db_user.teacher_id,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    info!("Login successful");
    HttpResponse::Ok().json(LoginResponse {
        access_token,
        role: role.as_str().to_string(),
    })
}

/// The caller's own identity, straight from the verified token plus the
/// linked teacher record when one exists.
pub async fn me(user: AuthUser, store: web::Data<dyn Store>) -> impl Responder {
    let teacher = match user.teacher_id {
        Some(id) => match store.teacher_by_id(id).await {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, "Store error while fetching teacher");
                return HttpResponse::InternalServerError().finish();
            }
        },
        None => None,
    };

    HttpResponse::Ok().json(json!({
        "id": user.user_id,
        "username": user.username,
        "role": user.role.as_str(),
        "teacher": teacher,
    }))
}

/// Access tokens are stateless; logout just tells the client the token
/// should be discarded. Always succeeds.
pub async fn logout() -> impl Responder {
    HttpResponse::NoContent().finish()
}
