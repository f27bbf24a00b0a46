use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{CreateWingRequest, Floor, UpdateWingRequest, Wing};
use crate::response::ApiResponse;
use crate::services::hierarchy;
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_wing))
        .route("/:id", axum::routing::put(update_wing).delete(delete_wing))
        .route("/:id/floors", get(list_wing_floors))
}

/// Создание крыла
#[utoipa::path(
    post,
    path = "/api/v1/wings",
    tag = "wings",
    security(("bearer_auth" = [])),
    request_body = CreateWingRequest,
    responses(
        (status = 200, description = "Крыло создано", body = Wing),
        (status = 404, description = "Башня не найдена")
    )
)]
pub async fn create_wing(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateWingRequest>,
) -> AppResult<Json<ApiResponse<Wing>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let tower: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM towers WHERE id = $1")
        .bind(payload.tower_id)
        .fetch_optional(&state.pool)
        .await?;
    if tower.is_none() {
        return Err(AppError::NotFound("Башня не найдена".to_string()));
    }

    let wing = sqlx::query_as::<_, Wing>(
        "INSERT INTO wings (tower_id, name, is_default) VALUES ($1, $2, false) RETURNING *",
    )
    .bind(payload.tower_id)
    .bind(validators::sanitize_string(&payload.name))
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Крыло создано", wing))
}

/// Обновление крыла. Синтетическое крыло переименовать нельзя.
#[utoipa::path(
    put,
    path = "/api/v1/wings/{id}",
    tag = "wings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID крыла")),
    request_body = UpdateWingRequest,
    responses(
        (status = 200, description = "Крыло обновлено", body = Wing),
        (status = 404, description = "Крыло не найдено")
    )
)]
pub async fn update_wing(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWingRequest>,
) -> AppResult<Json<ApiResponse<Wing>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let wing = sqlx::query_as::<_, Wing>("SELECT * FROM wings WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Крыло не найдено".to_string()))?;

    if wing.is_default {
        return Err(AppError::BadRequest(
            "Служебное крыло изменить нельзя".to_string(),
        ));
    }

    let wing = sqlx::query_as::<_, Wing>(
        "UPDATE wings SET name = COALESCE($1, name), updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(&payload.name)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::ok(wing))
}

/// Удаление крыла. Синтетическое крыло удалить нельзя.
#[utoipa::path(
    delete,
    path = "/api/v1/wings/{id}",
    tag = "wings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID крыла")),
    responses(
        (status = 200, description = "Крыло удалено"),
        (status = 404, description = "Крыло не найдено")
    )
)]
pub async fn delete_wing(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let wing = sqlx::query_as::<_, Wing>("SELECT * FROM wings WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Крыло не найдено".to_string()))?;

    if wing.is_default {
        return Err(AppError::BadRequest(
            "Служебное крыло удалить нельзя".to_string(),
        ));
    }

    sqlx::query("DELETE FROM wings WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::message("Крыло удалено"))
}

/// Этажи крыла
#[utoipa::path(
    get,
    path = "/api/v1/wings/{id}/floors",
    tag = "wings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID крыла")),
    responses(
        (status = 200, description = "Этажи", body = Vec<Floor>)
    )
)]
pub async fn list_wing_floors(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Floor>>>> {
    let floors =
        sqlx::query_as::<_, Floor>("SELECT * FROM floors WHERE wing_id = $1 ORDER BY name")
            .bind(id)
            .fetch_all(&state.pool)
            .await?;

    Ok(ApiResponse::ok(hierarchy::floors_of_wing(id, &floors)))
}
