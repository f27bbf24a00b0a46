use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    CostConfiguration, CreateCostConfigurationRequest, UpdateCostConfigurationRequest,
};
use crate::response::ApiResponse;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cost_configs).post(create_cost_config))
        .route(
            "/:id",
            axum::routing::put(update_cost_config).delete(delete_cost_config),
        )
}

/// Список тарифных карт
#[utoipa::path(
    get,
    path = "/api/v1/cost-configs",
    tag = "cost-configs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Тарифные карты", body = Vec<CostConfiguration>)
    )
)]
pub async fn list_cost_configs(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<CostConfiguration>>>> {
    let configs = sqlx::query_as::<_, CostConfiguration>(
        "SELECT * FROM cost_configurations ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(configs))
}

/// Создание тарифной карты (одна на проект)
#[utoipa::path(
    post,
    path = "/api/v1/cost-configs",
    tag = "cost-configs",
    security(("bearer_auth" = [])),
    request_body = CreateCostConfigurationRequest,
    responses(
        (status = 200, description = "Тарифная карта создана", body = CostConfiguration),
        (status = 409, description = "У проекта уже есть тарифная карта")
    )
)]
pub async fn create_cost_config(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCostConfigurationRequest>,
) -> AppResult<Json<ApiResponse<CostConfiguration>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if payload.gas_unit_rate <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Тариф за единицу должен быть положительным".to_string(),
        ));
    }
    if let Some(day) = payload.bill_due_date {
        if !(1..=28).contains(&day) {
            return Err(AppError::Validation(
                "День оплаты должен быть от 1 до 28".to_string(),
            ));
        }
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM cost_configurations WHERE project_id = $1")
            .bind(payload.project_id)
            .fetch_optional(&state.pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "У проекта уже есть тарифная карта".to_string(),
        ));
    }

    let config = sqlx::query_as::<_, CostConfiguration>(
        r#"
        INSERT INTO cost_configurations
            (project_id, name, gas_unit_rate, amc_cost, utility_tax, app_charges,
             penalty_amount, bill_due_date, register_fees, transaction_percentage)
        VALUES ($1, $2, $3, COALESCE($4, 0), COALESCE($5, 0), COALESCE($6, 0),
                COALESCE($7, 0), COALESCE($8, 10), COALESCE($9, 0), COALESCE($10, 0))
        RETURNING *
        "#,
    )
    .bind(payload.project_id)
    .bind(&payload.name)
    .bind(payload.gas_unit_rate)
    .bind(payload.amc_cost)
    .bind(payload.utility_tax)
    .bind(payload.app_charges)
    .bind(payload.penalty_amount)
    .bind(payload.bill_due_date)
    .bind(payload.register_fees)
    .bind(payload.transaction_percentage)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Тарифная карта создана", config))
}

/// Обновление тарифной карты
#[utoipa::path(
    put,
    path = "/api/v1/cost-configs/{id}",
    tag = "cost-configs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID тарифной карты")),
    request_body = UpdateCostConfigurationRequest,
    responses(
        (status = 200, description = "Тарифная карта обновлена", body = CostConfiguration),
        (status = 404, description = "Тарифная карта не найдена")
    )
)]
pub async fn update_cost_config(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCostConfigurationRequest>,
) -> AppResult<Json<ApiResponse<CostConfiguration>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let config = sqlx::query_as::<_, CostConfiguration>(
        r#"
        UPDATE cost_configurations
        SET name = COALESCE($1, name),
            gas_unit_rate = COALESCE($2, gas_unit_rate),
            amc_cost = COALESCE($3, amc_cost),
            utility_tax = COALESCE($4, utility_tax),
            app_charges = COALESCE($5, app_charges),
            penalty_amount = COALESCE($6, penalty_amount),
            bill_due_date = COALESCE($7, bill_due_date),
            register_fees = COALESCE($8, register_fees),
            transaction_percentage = COALESCE($9, transaction_percentage),
            updated_at = NOW()
        WHERE id = $10
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(payload.gas_unit_rate)
    .bind(payload.amc_cost)
    .bind(payload.utility_tax)
    .bind(payload.app_charges)
    .bind(payload.penalty_amount)
    .bind(payload.bill_due_date)
    .bind(payload.register_fees)
    .bind(payload.transaction_percentage)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Тарифная карта не найдена".to_string()))?;

    Ok(ApiResponse::ok(config))
}

/// Удаление тарифной карты
#[utoipa::path(
    delete,
    path = "/api/v1/cost-configs/{id}",
    tag = "cost-configs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID тарифной карты")),
    responses(
        (status = 200, description = "Тарифная карта удалена"),
        (status = 404, description = "Тарифная карта не найдена")
    )
)]
pub async fn delete_cost_config(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM cost_configurations WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Тарифная карта не найдена".to_string(),
        ));
    }

    Ok(ApiResponse::message("Тарифная карта удалена"))
}
