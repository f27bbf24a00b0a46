use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    AssignAgentRequest, CreateProjectRequest, Project, ProjectQuery, ProjectResponse,
    UpdateProjectRequest, User, UserPublic, UserRole,
};
use crate::response::ApiResponse;
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/:id", axum::routing::put(update_project).delete(delete_project))
        .route("/:id/agents", get(list_project_agents).post(assign_agent))
        .route("/:id/agents/:agent_id", delete(unassign_agent))
}

/// Список проектов
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(ProjectQuery),
    responses(
        (status = 200, description = "Проекты", body = Vec<ProjectResponse>)
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<ProjectQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProjectResponse>>>> {
    let projects = sqlx::query_as::<_, ProjectResponse>(
        r#"
        SELECT p.id, p.locality_id, p.name, p.is_wing,
               (cc.id IS NOT NULL) AS has_cost_configuration,
               COUNT(pa.agent_id) AS agent_count
        FROM projects p
        LEFT JOIN cost_configurations cc ON cc.project_id = p.id
        LEFT JOIN project_agents pa ON pa.project_id = p.id
        WHERE ($1::uuid IS NULL OR p.locality_id = $1)
        GROUP BY p.id, p.locality_id, p.name, p.is_wing, cc.id
        ORDER BY p.name
        "#,
    )
    .bind(query.locality_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(projects))
}

/// Создание проекта
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "projects",
    security(("bearer_auth" = [])),
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Проект создан", body = Project),
        (status = 404, description = "Район не найден")
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateProjectRequest>,
) -> AppResult<Json<ApiResponse<Project>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let locality: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM localities WHERE id = $1")
        .bind(payload.locality_id)
        .fetch_optional(&state.pool)
        .await?;
    if locality.is_none() {
        return Err(AppError::NotFound("Район не найден".to_string()));
    }

    let project = sqlx::query_as::<_, Project>(
        "INSERT INTO projects (locality_id, name, is_wing) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(payload.locality_id)
    .bind(validators::sanitize_string(&payload.name))
    .bind(payload.is_wing)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Проект создан", project))
}

/// Обновление проекта. Флаг is_wing после создания не меняется.
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID проекта")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Проект обновлён", body = Project),
        (status = 404, description = "Проект не найден")
    )
)]
pub async fn update_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> AppResult<Json<ApiResponse<Project>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let project = sqlx::query_as::<_, Project>(
        r#"
        UPDATE projects
        SET name = COALESCE($1, name), updated_at = NOW()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Проект не найден".to_string()))?;

    Ok(ApiResponse::ok(project))
}

/// Удаление проекта
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID проекта")),
    responses(
        (status = 200, description = "Проект удалён"),
        (status = 404, description = "Проект не найден")
    )
)]
pub async fn delete_project(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Проект не найден".to_string()));
    }

    Ok(ApiResponse::message("Проект удалён"))
}

/// Назначенные на проект агенты
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/agents",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID проекта")),
    responses(
        (status = 200, description = "Агенты проекта", body = Vec<UserPublic>)
    )
)]
pub async fn list_project_agents(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<UserPublic>>>> {
    let agents = sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM users u
        JOIN project_agents pa ON pa.agent_id = u.id
        WHERE pa.project_id = $1
        ORDER BY u.name
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(
        agents.into_iter().map(UserPublic::from).collect(),
    ))
}

/// Назначение агента на проект
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/agents",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID проекта")),
    request_body = AssignAgentRequest,
    responses(
        (status = 200, description = "Агент назначен"),
        (status = 404, description = "Проект или агент не найден")
    )
)]
pub async fn assign_agent(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignAgentRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let agent: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE id = $1 AND role = $2")
            .bind(payload.agent_id)
            .bind(UserRole::Agent)
            .fetch_optional(&state.pool)
            .await?;
    if agent.is_none() {
        return Err(AppError::NotFound("Агент не найден".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO project_agents (project_id, agent_id)
        VALUES ($1, $2)
        ON CONFLICT (project_id, agent_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(payload.agent_id)
    .execute(&state.pool)
    .await?;

    Ok(ApiResponse::message("Агент назначен"))
}

/// Снятие агента с проекта
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}/agents/{agent_id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID проекта"),
        ("agent_id" = Uuid, Path, description = "ID агента")
    ),
    responses(
        (status = 200, description = "Агент снят с проекта")
    )
)]
pub async fn unassign_agent(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, agent_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM project_agents WHERE project_id = $1 AND agent_id = $2")
        .bind(id)
        .bind(agent_id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::message("Агент снят с проекта"))
}
