use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    AuthResponse, LoginRequest, RefreshTokenRequest, TokenResponse, UserPublic,
};
use crate::response::ApiResponse;
use crate::services::AuthService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(get_me))
}

/// Вход по email и паролю
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Токены выданы", body = AuthResponse),
        (status = 401, description = "Неверные учётные данные")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let user = AuthService::get_user_by_email(&state.pool, &payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active || !AuthService::verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let auth_service = AuthService::new(state.config.clone());
    let access_token = auth_service.generate_access_token(&user)?;
    let refresh_token = auth_service.generate_refresh_token(&user)?;

    let expires_at = Utc::now() + Duration::seconds(state.config.jwt_refresh_expiry);
    AuthService::save_refresh_token(
        &state.pool,
        user.id,
        &AuthService::hash_token(&refresh_token),
        payload.device_info.as_deref(),
        expires_at,
    )
    .await?;
    AuthService::update_last_login(&state.pool, user.id).await?;

    Ok(ApiResponse::ok(AuthResponse {
        access_token,
        refresh_token,
        user: UserPublic::from(user),
    }))
}

/// Обновление пары токенов
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Новая пара токенов", body = TokenResponse),
        (status = 401, description = "Токен недействителен")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let auth_service = AuthService::new(state.config.clone());
    let claims = auth_service.verify_token(&payload.refresh_token)?;

    if claims.token_type != "refresh" {
        return Err(AppError::Unauthorized);
    }

    let token_hash = AuthService::hash_token(&payload.refresh_token);
    let stored: Option<(uuid::Uuid,)> = sqlx::query_as(
        "SELECT user_id FROM refresh_tokens WHERE token_hash = $1 AND expires_at > NOW()",
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await?;

    let (user_id,) = stored.ok_or(AppError::Unauthorized)?;
    let user = AuthService::get_user_by_id(&state.pool, user_id).await?;

    // Ротация: старый refresh-токен удаляется
    AuthService::delete_refresh_token(&state.pool, &token_hash).await?;

    let access_token = auth_service.generate_access_token(&user)?;
    let refresh_token = auth_service.generate_refresh_token(&user)?;
    let expires_at = Utc::now() + Duration::seconds(state.config.jwt_refresh_expiry);
    AuthService::save_refresh_token(
        &state.pool,
        user.id,
        &AuthService::hash_token(&refresh_token),
        None,
        expires_at,
    )
    .await?;

    Ok(ApiResponse::ok(TokenResponse {
        access_token,
        refresh_token,
    }))
}

/// Выход (отзыв refresh-токена)
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Выход выполнен")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    AuthService::delete_refresh_token(&state.pool, &AuthService::hash_token(&payload.refresh_token))
        .await?;
    Ok(ApiResponse::message("Выход выполнен"))
}

/// Текущий пользователь
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Профиль", body = UserPublic),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<UserPublic>>> {
    let user = AuthService::get_user_by_id(&state.pool, auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserPublic::from(user)))
}
