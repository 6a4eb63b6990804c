//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse incoming requests, drive `auth::service`, and set
//! or clear the session cookies. Tokens are minted here at login and
//! invalidated client-side at logout by overwriting both cookies.

use crate::api::common::{ApiError, ApiResponse, service_error_to_http, validation_error};
use crate::auth::middleware::Identity;
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::database::models::User;
use crate::services::email_service::Mailer;
use crate::services::storage_service::ObjectStorage;
use crate::utils::cookies::{
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, expired_cookie, session_cookie,
};
use crate::utils::jwt::{JwtUtils, TokenKind};
use crate::utils::multipart::FormData;
use axum::{
    extract::{Extension, Json, Multipart},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

/// Handle account registration (multipart: profile fields + optional image)
#[axum::debug_handler]
pub async fn register(
    Extension(pool): Extension<SqlitePool>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    multipart: Multipart,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    let form = FormData::read(multipart)
        .await
        .map_err(service_error_to_http)?;

    let request = RegisterRequest {
        first_name: form.required("firstName").map_err(service_error_to_http)?,
        last_name: form.required("lastName").map_err(service_error_to_http)?,
        email: form.required("email").map_err(service_error_to_http)?,
        phone: form.required("phone").map_err(service_error_to_http)?,
        gender: form.required("gender").map_err(service_error_to_http)?,
        password: form.required("password").map_err(service_error_to_http)?,
    };

    let auth_service = AuthService::new(&pool, mailer, storage);
    let image = form.image;

    match auth_service.register(request, image).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(user, "User registered successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user login request; sets both session cookies on success.
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(jwt): Extension<Arc<JwtUtils>>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, ResponseJson<ApiResponse<String>>), ApiError> {
    let auth_service = AuthService::new(&pool, mailer, storage);
    let user = auth_service
        .login(payload)
        .await
        .map_err(service_error_to_http)?;

    let access_token = jwt
        .issue(&user.email, TokenKind::Access)
        .map_err(service_error_to_http)?;
    let refresh_token = jwt
        .issue(&user.email, TokenKind::Refresh)
        .map_err(service_error_to_http)?;

    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        session_cookie(ACCESS_TOKEN_COOKIE, &access_token, jwt.access_ttl_seconds()),
    );
    headers.append(
        SET_COOKIE,
        session_cookie(
            REFRESH_TOKEN_COOKIE,
            &refresh_token,
            jwt.refresh_ttl_seconds(),
        ),
    );

    Ok((
        headers,
        ResponseJson(ApiResponse::success(
            format!("Welcome {}", user.first_name),
            "Login successful",
        )),
    ))
}

/// Handle logout by overwriting both cookies with empty, expired values.
#[axum::debug_handler]
pub async fn logout() -> (HeaderMap, ResponseJson<ApiResponse<()>>) {
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, expired_cookie(ACCESS_TOKEN_COOKIE));
    headers.append(SET_COOKIE, expired_cookie(REFRESH_TOKEN_COOKIE));

    (headers, ResponseJson(ApiResponse::<()>::message("Logged out")))
}

/// Start the unauthenticated "forgot password" flow.
#[axum::debug_handler]
pub async fn forgot_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if let Err(errors) = payload.validate() {
        return Err(service_error_to_http(validation_error(errors)));
    }

    let auth_service = AuthService::new(&pool, mailer, storage);
    match auth_service.issue_code(&payload.email).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::<()>::message(
            "Verification code sent to email",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Issue a verification code for the authenticated account.
#[axum::debug_handler]
pub async fn send_verification_code(
    Extension(pool): Extension<SqlitePool>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let auth_service = AuthService::new(&pool, mailer, storage);
    match auth_service.issue_code(&identity.email).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::<()>::message(
            "Verification code sent to email",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Complete the "forgot password" flow.
#[axum::debug_handler]
pub async fn reset_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if let Err(errors) = payload.validate() {
        return Err(service_error_to_http(validation_error(errors)));
    }

    let auth_service = AuthService::new(&pool, mailer, storage);
    match auth_service
        .reset_password(&payload.email, &payload.code, &payload.new_password)
        .await
    {
        Ok(()) => Ok(ResponseJson(ApiResponse::<()>::message(
            "Password reset successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Change the password for the authenticated account.
#[axum::debug_handler]
pub async fn change_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if let Err(errors) = payload.validate() {
        return Err(service_error_to_http(validation_error(errors)));
    }

    let auth_service = AuthService::new(&pool, mailer, storage);
    match auth_service
        .change_password(
            &identity.email,
            &payload.old_password,
            &payload.new_password,
            &payload.verification_code,
        )
        .await
    {
        Ok(()) => Ok(ResponseJson(ApiResponse::<()>::message(
            "Password changed successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get the authenticated account's profile.
#[axum::debug_handler]
pub async fn me(
    Extension(pool): Extension<SqlitePool>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let auth_service = AuthService::new(&pool, mailer, storage);
    match auth_service.get_user_by_email(&identity.email).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user,
            "User retrieved successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
