use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    AgentWalletTransaction, CollectMoneyRequest, User, UserPublic, UserRole, WalletResponse,
};
use crate::response::ApiResponse;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agents))
        .route("/:id/collect", post(collect_money))
        .route("/:id/wallet", get(get_wallet))
}

/// Список агентов
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "agents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Агенты", body = Vec<UserPublic>),
        (status = 403, description = "Нет прав")
    )
)]
pub async fn list_agents(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<UserPublic>>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let agents = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE role = $1 AND is_active = true ORDER BY name",
    )
    .bind(UserRole::Agent)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(
        agents.into_iter().map(UserPublic::from).collect(),
    ))
}

/// Пополнение кошелька агента ("collect money")
#[utoipa::path(
    post,
    path = "/api/v1/agents/{id}/collect",
    tag = "agents",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID агента")),
    request_body = CollectMoneyRequest,
    responses(
        (status = 200, description = "Кошелёк пополнен", body = WalletResponse),
        (status = 400, description = "Неположительная сумма"),
        (status = 404, description = "Агент не найден")
    )
)]
pub async fn collect_money(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CollectMoneyRequest>,
) -> AppResult<Json<ApiResponse<WalletResponse>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Сумма должна быть положительной".to_string(),
        ));
    }

    let mut tx = state.pool.begin().await?;

    let agent = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = $1 AND role = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(UserRole::Agent)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Агент не найден".to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO agent_wallet_transactions (agent_id, amount, note, collected_by)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(agent.id)
    .bind(payload.amount)
    .bind(&payload.note)
    .bind(auth_user.user_id)
    .execute(&mut *tx)
    .await?;

    let (wallet_balance,): (Decimal,) = sqlx::query_as(
        "UPDATE users SET wallet_balance = wallet_balance + $1, updated_at = NOW() WHERE id = $2 RETURNING wallet_balance",
    )
    .bind(payload.amount)
    .bind(agent.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let transactions = sqlx::query_as::<_, AgentWalletTransaction>(
        "SELECT * FROM agent_wallet_transactions WHERE agent_id = $1 ORDER BY created_at DESC LIMIT 20",
    )
    .bind(agent.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::with_message(
        "Кошелёк пополнен",
        WalletResponse {
            agent_id: agent.id,
            wallet_balance,
            transactions,
        },
    ))
}

/// Кошелёк агента с историей операций
#[utoipa::path(
    get,
    path = "/api/v1/agents/{id}/wallet",
    tag = "agents",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID агента")),
    responses(
        (status = 200, description = "Кошелёк", body = WalletResponse),
        (status = 404, description = "Агент не найден")
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WalletResponse>>> {
    // Агент видит только свой кошелёк
    if !is_admin_or_higher(&auth_user.role) && auth_user.user_id != id {
        return Err(AppError::Forbidden);
    }

    let agent = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND role = $2")
        .bind(id)
        .bind(UserRole::Agent)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Агент не найден".to_string()))?;

    let transactions = sqlx::query_as::<_, AgentWalletTransaction>(
        "SELECT * FROM agent_wallet_transactions WHERE agent_id = $1 ORDER BY created_at DESC",
    )
    .bind(agent.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(WalletResponse {
        agent_id: agent.id,
        wallet_balance: agent.wallet_balance,
        transactions,
    }))
}
