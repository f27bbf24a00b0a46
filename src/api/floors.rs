use axum::{
    extract::{Path, State},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{CreateFloorRequest, Floor, UpdateFloorRequest};
use crate::response::ApiResponse;
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_floor))
        .route("/:id", axum::routing::put(update_floor).delete(delete_floor))
}

/// Создание этажа
#[utoipa::path(
    post,
    path = "/api/v1/floors",
    tag = "floors",
    security(("bearer_auth" = [])),
    request_body = CreateFloorRequest,
    responses(
        (status = 200, description = "Этаж создан", body = Floor),
        (status = 404, description = "Крыло не найдено")
    )
)]
pub async fn create_floor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateFloorRequest>,
) -> AppResult<Json<ApiResponse<Floor>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let wing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM wings WHERE id = $1")
        .bind(payload.wing_id)
        .fetch_optional(&state.pool)
        .await?;
    if wing.is_none() {
        return Err(AppError::NotFound("Крыло не найдено".to_string()));
    }

    let floor = sqlx::query_as::<_, Floor>(
        "INSERT INTO floors (wing_id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(payload.wing_id)
    .bind(validators::sanitize_string(&payload.name))
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Этаж создан", floor))
}

/// Обновление этажа
#[utoipa::path(
    put,
    path = "/api/v1/floors/{id}",
    tag = "floors",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID этажа")),
    request_body = UpdateFloorRequest,
    responses(
        (status = 200, description = "Этаж обновлён", body = Floor),
        (status = 404, description = "Этаж не найден")
    )
)]
pub async fn update_floor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFloorRequest>,
) -> AppResult<Json<ApiResponse<Floor>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let floor = sqlx::query_as::<_, Floor>(
        "UPDATE floors SET name = COALESCE($1, name), updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(&payload.name)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Этаж не найден".to_string()))?;

    Ok(ApiResponse::ok(floor))
}

/// Удаление этажа
#[utoipa::path(
    delete,
    path = "/api/v1/floors/{id}",
    tag = "floors",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID этажа")),
    responses(
        (status = 200, description = "Этаж удалён"),
        (status = 404, description = "Этаж не найден")
    )
)]
pub async fn delete_floor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM floors WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Этаж не найден".to_string()));
    }

    Ok(ApiResponse::message("Этаж удалён"))
}
