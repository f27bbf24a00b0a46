use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{CreateLocalityRequest, Locality, LocalityQuery, UpdateLocalityRequest};
use crate::response::ApiResponse;
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_localities).post(create_locality))
        .route(
            "/:id",
            axum::routing::put(update_locality).delete(delete_locality),
        )
}

/// Список районов (опционально по городу)
#[utoipa::path(
    get,
    path = "/api/v1/localities",
    tag = "localities",
    security(("bearer_auth" = [])),
    params(LocalityQuery),
    responses(
        (status = 200, description = "Районы", body = Vec<Locality>)
    )
)]
pub async fn list_localities(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<LocalityQuery>,
) -> AppResult<Json<ApiResponse<Vec<Locality>>>> {
    let localities = sqlx::query_as::<_, Locality>(
        r#"
        SELECT * FROM localities
        WHERE ($1::uuid IS NULL OR city_id = $1)
        ORDER BY name
        "#,
    )
    .bind(query.city_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(localities))
}

/// Создание района
#[utoipa::path(
    post,
    path = "/api/v1/localities",
    tag = "localities",
    security(("bearer_auth" = [])),
    request_body = CreateLocalityRequest,
    responses(
        (status = 200, description = "Район создан", body = Locality),
        (status = 404, description = "Город не найден")
    )
)]
pub async fn create_locality(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateLocalityRequest>,
) -> AppResult<Json<ApiResponse<Locality>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let city: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM cities WHERE id = $1")
        .bind(payload.city_id)
        .fetch_optional(&state.pool)
        .await?;
    if city.is_none() {
        return Err(AppError::NotFound("Город не найден".to_string()));
    }

    let locality = sqlx::query_as::<_, Locality>(
        "INSERT INTO localities (city_id, name, pincode) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(payload.city_id)
    .bind(validators::sanitize_string(&payload.name))
    .bind(&payload.pincode)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Район создан", locality))
}

/// Обновление района
#[utoipa::path(
    put,
    path = "/api/v1/localities/{id}",
    tag = "localities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID района")),
    request_body = UpdateLocalityRequest,
    responses(
        (status = 200, description = "Район обновлён", body = Locality),
        (status = 404, description = "Район не найден")
    )
)]
pub async fn update_locality(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocalityRequest>,
) -> AppResult<Json<ApiResponse<Locality>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let locality = sqlx::query_as::<_, Locality>(
        r#"
        UPDATE localities
        SET name = COALESCE($1, name),
            pincode = COALESCE($2, pincode),
            updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.pincode)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Район не найден".to_string()))?;

    Ok(ApiResponse::ok(locality))
}

/// Удаление района
#[utoipa::path(
    delete,
    path = "/api/v1/localities/{id}",
    tag = "localities",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID района")),
    responses(
        (status = 200, description = "Район удалён"),
        (status = 404, description = "Район не найден")
    )
)]
pub async fn delete_locality(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM localities WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Район не найден".to_string()));
    }

    Ok(ApiResponse::message("Район удалён"))
}
