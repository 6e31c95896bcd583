use crate::config::jwt::JwtConfig;
use crate::config::media::MediaConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{MediaRef, UserModel};
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::services::email::EmailService;
use crate::services::media::MediaStore;
use crate::services::user::UserService;
use crate::utils::cookie::{build_clear_cookie, build_session_cookie};
use crate::utils::encode_session_token;
use crate::utils::multipart::MultipartForm;
use anyhow::anyhow;
use axum::{
    extract::{Multipart, Path},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Stock avatar for accounts registered without a picture. The stored
/// `public_id` is the user's email, mirroring how replaced avatars are
/// told apart from the default.
const DEFAULT_AVATAR_URL: &str = "/uploads/defaults/avatar.png";

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    /// Full name (5-50 characters)
    #[validate(length(min = 5, max = 50))]
    pub full_name: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    /// New password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    /// New password (min 8 characters)
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaRefResponse {
    pub public_id: String,
    pub url: String,
}

impl From<MediaRef> for MediaRefResponse {
    fn from(m: MediaRef) -> Self {
        Self {
            public_id: m.public_id,
            url: m.url,
        }
    }
}

/// The user as every endpoint returns it. The password hash and reset
/// fields have no representation here at all.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub avatar: MediaRefResponse,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            avatar: MediaRefResponse {
                public_id: user.avatar_public_id,
                url: user.avatar_url,
            },
            created_at: user.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body(content = RegisterInput, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error or email already taken", body = AppError),
    ),
    tag = "users"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Extension(jwt_config): Extension<JwtConfig>,
    Extension(media_config): Extension<MediaConfig>,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = MultipartForm::read(multipart).await?;

    let (full_name, email, password) = match (
        form.field("fullName"),
        form.field("email"),
        form.field("password"),
    ) {
        (Some(f), Some(e), Some(p)) => (f, e, p),
        _ => return Err(AppError::Validation("All fields are required".to_string())),
    };

    let input = RegisterInput {
        full_name: full_name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Avatar goes to the media store before the insert, so a failed insert
    // has one thing to undo instead of a half-born account.
    let stored_avatar = match form.file("avatar") {
        Some(file) => Some(
            MediaStore::store(&media_config, &file.data, &file.filename, "avatars").await?,
        ),
        None => None,
    };

    let avatar = stored_avatar.clone().unwrap_or_else(|| MediaRef {
        public_id: input.email.trim().to_lowercase(),
        url: DEFAULT_AVATAR_URL.to_string(),
    });

    let service = AuthService::new(db);
    let user = match service
        .register(&input.full_name, &input.email, &input.password, avatar)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            if let Some(asset) = stored_avatar {
                if let Err(del) = MediaStore::delete(&media_config, &asset.public_id).await {
                    tracing::warn!("Failed to remove orphaned avatar: {del}");
                }
            }
            return Err(e);
        }
    };

    let token = encode_session_token(&jwt_config, user.id, &user.email, &user.role)?;

    let mut response = ApiResponse::with_message(
        UserResponse::from(user),
        "User registered successfully",
    )
    .into_response();
    set_session_cookie(&mut response, &jwt_config, &token)?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Login successful", body = UserResponse),
        (status = 400, description = "Invalid credentials", body = AppError),
    ),
    tag = "users"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(jwt_config): Extension<JwtConfig>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Response> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Email and Password are required".to_string(),
        ));
    }

    let service = AuthService::new(db);
    let user = service.login(&payload.email, &payload.password).await?;

    let token = encode_session_token(&jwt_config, user.id, &user.email, &user.role)?;

    let mut response = (
        StatusCode::CREATED,
        ApiResponse::with_message(UserResponse::from(user), "User logged in successfully"),
    )
        .into_response();
    set_session_cookie(&mut response, &jwt_config, &token)?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    responses(
        (status = 200, description = "Logout successful, session cookie cleared", body = String),
    ),
    tag = "users"
)]
pub async fn logout(Extension(jwt_config): Extension<JwtConfig>) -> AppResult<Response> {
    let mut response =
        ApiResponse::message("User logged out successfully").into_response();
    append_set_cookie(
        &mut response,
        &build_clear_cookie(jwt_config.cookie_secure),
    )?;
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Current user details", body = UserResponse),
        (status = 401, description = "Unauthenticated", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let user = service.get_user_by_id(auth_user.user_id).await?;

    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "User details",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/reset",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = String),
        (status = 400, description = "Email missing", body = AppError),
        (status = 500, description = "Email delivery failed", body = AppError),
    ),
    tag = "users"
)]
pub async fn forgot_password(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    let service = AuthService::new(db);
    service
        .forgot_password(&payload.email, &email_service)
        .await?;

    // Same answer whether or not the email has an account.
    Ok(ApiResponse::message(format!(
        "Reset password token has been sent to {} successfully!",
        payload.email.trim()
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/reset/{resetToken}",
    params(("resetToken" = String, Path, description = "Plaintext reset token from the email link")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = String),
        (status = 400, description = "Token invalid or expired", body = AppError),
    ),
    tag = "users"
)]
pub async fn reset_password(
    Extension(db): Extension<DatabaseConnection>,
    Path(reset_token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .reset_password(&reset_token, &payload.password)
        .await?;

    Ok(ApiResponse::message("Password changed successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    security(("session_token" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = String),
        (status = 400, description = "Old password wrong or new password invalid", body = AppError),
        (status = 401, description = "Unauthenticated", body = AppError),
    ),
    tag = "users"
)]
pub async fn change_password(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.old_password.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::Validation("All fields are mandatory".to_string()));
    }
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .change_password(
            auth_user.user_id,
            &payload.old_password,
            &payload.new_password,
        )
        .await?;

    Ok(ApiResponse::message("Password changed successfully!"))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/update",
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Bad avatar upload", body = AppError),
        (status = 401, description = "Unauthenticated", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_user(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media_config): Extension<MediaConfig>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = MultipartForm::read(multipart).await?;

    let full_name = form.field("fullName");
    if let Some(name) = full_name {
        if name.len() < 5 || name.len() > 50 {
            return Err(AppError::Validation(
                "Name must be between 5 and 50 characters".to_string(),
            ));
        }
    }

    let avatar = match form.file("avatar") {
        Some(file) => Some(
            MediaStore::store(&media_config, &file.data, &file.filename, "avatars").await?,
        ),
        None => None,
    };

    let service = UserService::new(db);
    let (user, replaced_avatar) = service
        .update_profile(auth_user.user_id, full_name, avatar)
        .await?;

    // The previous avatar is dead weight once replaced. The default
    // avatar's public id is the email and has no file behind it; delete
    // treats that as already gone.
    if let Some(old_id) = replaced_avatar {
        if let Err(e) = MediaStore::delete(&media_config, &old_id).await {
            tracing::warn!("Failed to delete replaced avatar '{}': {}", old_id, e);
        }
    }

    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "User details updated successfully!",
    ))
}

fn set_session_cookie(
    response: &mut Response,
    jwt_config: &JwtConfig,
    token: &str,
) -> AppResult<()> {
    let cookie = build_session_cookie(token, jwt_config.token_expiry, jwt_config.cookie_secure);
    append_set_cookie(response, &cookie)
}

fn append_set_cookie(response: &mut Response, cookie_value: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie_value).map_err(|e| {
        AppError::Internal(anyhow!("Failed to build Set-Cookie header value: {}", e))
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
