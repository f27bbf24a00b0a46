use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    CreateTowerRequest, Project, Tower, TowerQuery, TowerResponse, UpdateTowerRequest, Wing,
};
use crate::response::ApiResponse;
use crate::services::hierarchy::{self, WingSelection, DEFAULT_WING_NAME};
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_towers).post(create_tower))
        .route("/:id", axum::routing::put(update_tower).delete(delete_tower))
        .route("/:id/wings", get(resolve_wings))
}

/// Список башен со счётчиком крыльев
#[utoipa::path(
    get,
    path = "/api/v1/towers",
    tag = "towers",
    security(("bearer_auth" = [])),
    params(TowerQuery),
    responses(
        (status = 200, description = "Башни", body = Vec<TowerResponse>)
    )
)]
pub async fn list_towers(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<TowerQuery>,
) -> AppResult<Json<ApiResponse<Vec<TowerResponse>>>> {
    let towers = sqlx::query_as::<_, TowerResponse>(
        r#"
        SELECT t.id, t.project_id, t.name, COUNT(w.id) AS wing_count
        FROM towers t
        LEFT JOIN wings w ON w.tower_id = t.id
        WHERE ($1::uuid IS NULL OR t.project_id = $1)
        GROUP BY t.id, t.project_id, t.name
        ORDER BY t.name
        "#,
    )
    .bind(query.project_id)
    .fetch_all(&state.pool)
    .await?;

    let towers = if query.with_wings.unwrap_or(false) {
        hierarchy::pickable_towers(towers)
    } else {
        towers
    };

    Ok(ApiResponse::ok(towers))
}

/// Создание башни. В проекте без крыльев сразу создаётся синтетическое крыло.
#[utoipa::path(
    post,
    path = "/api/v1/towers",
    tag = "towers",
    security(("bearer_auth" = [])),
    request_body = CreateTowerRequest,
    responses(
        (status = 200, description = "Башня создана", body = Tower),
        (status = 404, description = "Проект не найден")
    )
)]
pub async fn create_tower(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateTowerRequest>,
) -> AppResult<Json<ApiResponse<Tower>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(payload.project_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Проект не найден".to_string()))?;

    let mut tx = state.pool.begin().await?;

    let tower = sqlx::query_as::<_, Tower>(
        "INSERT INTO towers (project_id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(project.id)
    .bind(validators::sanitize_string(&payload.name))
    .fetch_one(&mut *tx)
    .await?;

    if !project.is_wing {
        sqlx::query("INSERT INTO wings (tower_id, name, is_default) VALUES ($1, $2, true)")
            .bind(tower.id)
            .bind(DEFAULT_WING_NAME)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(ApiResponse::with_message("Башня создана", tower))
}

/// Обновление башни
#[utoipa::path(
    put,
    path = "/api/v1/towers/{id}",
    tag = "towers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID башни")),
    request_body = UpdateTowerRequest,
    responses(
        (status = 200, description = "Башня обновлена", body = Tower),
        (status = 404, description = "Башня не найдена")
    )
)]
pub async fn update_tower(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTowerRequest>,
) -> AppResult<Json<ApiResponse<Tower>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let tower = sqlx::query_as::<_, Tower>(
        "UPDATE towers SET name = COALESCE($1, name), updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(&payload.name)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Башня не найдена".to_string()))?;

    Ok(ApiResponse::ok(tower))
}

/// Удаление башни
#[utoipa::path(
    delete,
    path = "/api/v1/towers/{id}",
    tag = "towers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID башни")),
    responses(
        (status = 200, description = "Башня удалена"),
        (status = 404, description = "Башня не найдена")
    )
)]
pub async fn delete_tower(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM towers WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Башня не найдена".to_string()));
    }

    Ok(ApiResponse::message("Башня удалена"))
}

/// Разрешение выбора крыла для башни: либо список, либо скрытый селектор с
/// автоматически выбранным крылом
#[utoipa::path(
    get,
    path = "/api/v1/towers/{id}/wings",
    tag = "towers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID башни")),
    responses(
        (status = 200, description = "Результат разрешения", body = WingSelection),
        (status = 404, description = "Башня не найдена")
    )
)]
pub async fn resolve_wings(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WingSelection>>> {
    let tower = sqlx::query_as::<_, Tower>("SELECT * FROM towers WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Башня не найдена".to_string()))?;

    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(tower.project_id)
        .fetch_one(&state.pool)
        .await?;

    let wings = sqlx::query_as::<_, Wing>("SELECT * FROM wings WHERE tower_id = $1 ORDER BY name")
        .bind(tower.id)
        .fetch_all(&state.pool)
        .await?;

    let selection = hierarchy::resolve_wing_selection(project.is_wing, tower.id, &wings)?;
    Ok(ApiResponse::ok(selection))
}
