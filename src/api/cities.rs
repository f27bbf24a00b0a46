use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{City, CreateCityRequest, UpdateCityRequest};
use crate::response::ApiResponse;
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cities).post(create_city))
        .route("/:id", axum::routing::put(update_city).delete(delete_city))
}

/// Список городов
#[utoipa::path(
    get,
    path = "/api/v1/cities",
    tag = "cities",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Города", body = Vec<City>)
    )
)]
pub async fn list_cities(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<City>>>> {
    let cities =
        sqlx::query_as::<_, City>("SELECT * FROM cities WHERE is_active = true ORDER BY name")
            .fetch_all(&state.pool)
            .await?;

    Ok(ApiResponse::ok(cities))
}

/// Создание города
#[utoipa::path(
    post,
    path = "/api/v1/cities",
    tag = "cities",
    security(("bearer_auth" = [])),
    request_body = CreateCityRequest,
    responses(
        (status = 200, description = "Город создан", body = City),
        (status = 403, description = "Нет прав")
    )
)]
pub async fn create_city(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCityRequest>,
) -> AppResult<Json<ApiResponse<City>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let name = validators::sanitize_string(&payload.name);
    if name.is_empty() {
        return Err(AppError::Validation("Название обязательно".to_string()));
    }

    let city = sqlx::query_as::<_, City>(
        "INSERT INTO cities (name, state) VALUES ($1, $2) RETURNING *",
    )
    .bind(&name)
    .bind(&payload.state)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Город создан", city))
}

/// Обновление города
#[utoipa::path(
    put,
    path = "/api/v1/cities/{id}",
    tag = "cities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID города")),
    request_body = UpdateCityRequest,
    responses(
        (status = 200, description = "Город обновлён", body = City),
        (status = 404, description = "Город не найден")
    )
)]
pub async fn update_city(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCityRequest>,
) -> AppResult<Json<ApiResponse<City>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let city = sqlx::query_as::<_, City>(
        r#"
        UPDATE cities
        SET name = COALESCE($1, name),
            state = COALESCE($2, state),
            is_active = COALESCE($3, is_active),
            updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.state)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Город не найден".to_string()))?;

    Ok(ApiResponse::ok(city))
}

/// Удаление города
#[utoipa::path(
    delete,
    path = "/api/v1/cities/{id}",
    tag = "cities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID города")),
    responses(
        (status = 200, description = "Город удалён"),
        (status = 404, description = "Город не найден")
    )
)]
pub async fn delete_city(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM cities WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Город не найден".to_string()));
    }

    Ok(ApiResponse::message("Город удалён"))
}
