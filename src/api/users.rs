use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, is_master, AppState, AuthUser};
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserPublic, UserRole};
use crate::response::ApiResponse;
use crate::services::AuthService;
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", delete(delete_user).put(update_user))
}

/// Список пользователей
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Пользователи", body = Vec<UserPublic>),
        (status = 403, description = "Нет прав")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<UserPublic>>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    Ok(ApiResponse::ok(
        users.into_iter().map(UserPublic::from).collect(),
    ))
}

/// Создание пользователя
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Пользователь создан", body = UserPublic),
        (status = 403, description = "Нет прав"),
        (status = 409, description = "Email уже занят")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<ApiResponse<UserPublic>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }
    // Мастера создаёт только мастер
    if payload.role == UserRole::Master && !is_master(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if !validators::validate_email(&payload.email) {
        return Err(AppError::Validation("Неверный формат email".to_string()));
    }
    if let Some(phone) = &payload.phone {
        if !validators::validate_phone(phone) {
            return Err(AppError::Validation("Неверный формат телефона".to_string()));
        }
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email уже занят".to_string()));
    }

    let password_hash = AuthService::hash_password(&payload.password)?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, name, phone, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(validators::sanitize_string(&payload.name))
    .bind(&payload.phone)
    .bind(&payload.role)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message(
        "Пользователь создан",
        UserPublic::from(user),
    ))
}

/// Обновление пользователя
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID пользователя")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Пользователь обновлён", body = UserPublic),
        (status = 404, description = "Пользователь не найден")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<UserPublic>>> {
    if !is_admin_or_higher(&auth_user.role) && auth_user.user_id != id {
        return Err(AppError::Forbidden);
    }

    let password_hash = match &payload.password {
        Some(password) => Some(AuthService::hash_password(password)?),
        None => None,
    };

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = COALESCE($1, name),
            phone = COALESCE($2, phone),
            password_hash = COALESCE($3, password_hash),
            is_active = COALESCE($4, is_active),
            updated_at = NOW()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.phone)
    .bind(&password_hash)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    Ok(ApiResponse::ok(UserPublic::from(user)))
}

/// Удаление пользователя
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID пользователя")),
    responses(
        (status = 200, description = "Пользователь удалён"),
        (status = 404, description = "Пользователь не найден")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_master(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Пользователь не найден".to_string()));
    }

    Ok(ApiResponse::message("Пользователь удалён"))
}
