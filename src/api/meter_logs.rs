use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    CreateMeterLogRequest, Meter, MeterLog, MeterLogQuery, MeterLogResponse,
    UpdateMeterLogStatusRequest,
};
use crate::response::ApiResponse;
use crate::services::billing;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meter_logs).post(create_meter_log))
        .route("/:id/status", axum::routing::put(update_meter_log_status))
}

fn to_response(log: MeterLog) -> MeterLogResponse {
    let units_display = billing::format_units(Some(log.units_consumed));
    MeterLogResponse { log, units_display }
}

/// История показаний
#[utoipa::path(
    get,
    path = "/api/v1/meter-logs",
    tag = "meter-logs",
    security(("bearer_auth" = [])),
    params(MeterLogQuery),
    responses(
        (status = 200, description = "Показания", body = Vec<MeterLogResponse>)
    )
)]
pub async fn list_meter_logs(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<MeterLogQuery>,
) -> AppResult<Json<ApiResponse<Vec<MeterLogResponse>>>> {
    let logs = sqlx::query_as::<_, MeterLog>(
        r#"
        SELECT * FROM meter_logs
        WHERE ($1::uuid IS NULL OR meter_id = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.meter_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(logs.into_iter().map(to_response).collect()))
}

/// Снятие показаний. Потребление считается на сервере от текущего показания
/// счётчика; форма присылает значение числом или строкой.
#[utoipa::path(
    post,
    path = "/api/v1/meter-logs",
    tag = "meter-logs",
    security(("bearer_auth" = [])),
    request_body = CreateMeterLogRequest,
    responses(
        (status = 200, description = "Показание записано", body = MeterLogResponse),
        (status = 404, description = "Счётчик не найден"),
        (status = 422, description = "Показание не является числом")
    )
)]
pub async fn create_meter_log(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateMeterLogRequest>,
) -> AppResult<Json<ApiResponse<MeterLogResponse>>> {
    let current = billing::coerce_reading(&payload.current_reading).ok_or_else(|| {
        AppError::Validation("Показание должно быть числом".to_string())
    })?;

    let meter = sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE id = $1")
        .bind(payload.meter_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Счётчик не найден".to_string()))?;

    let previous = meter.previous_reading.unwrap_or(Decimal::ZERO);
    let units = billing::units_consumed(previous, current);

    let mut tx = state.pool.begin().await?;

    let log = sqlx::query_as::<_, MeterLog>(
        r#"
        INSERT INTO meter_logs
            (meter_id, previous_reading, current_reading, units_consumed,
             status, proof_image_url, recorded_by)
        VALUES ($1, $2, $3, $4, 'valid'::reading_status, $5, $6)
        RETURNING *
        "#,
    )
    .bind(meter.id)
    .bind(previous)
    .bind(current)
    .bind(units)
    .bind(&payload.proof_image_url)
    .bind(auth_user.user_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE meters
        SET previous_reading = $1,
            total_units = total_units + $2,
            updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(current)
    .bind(units)
    .bind(meter.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ApiResponse::with_message(
        "Показание записано",
        to_response(log),
    ))
}

/// Смена статуса показания (valid/invalid)
#[utoipa::path(
    put,
    path = "/api/v1/meter-logs/{id}/status",
    tag = "meter-logs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID показания")),
    request_body = UpdateMeterLogStatusRequest,
    responses(
        (status = 200, description = "Статус обновлён", body = MeterLogResponse),
        (status = 404, description = "Показание не найдено")
    )
)]
pub async fn update_meter_log_status(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMeterLogStatusRequest>,
) -> AppResult<Json<ApiResponse<MeterLogResponse>>> {
    let log = sqlx::query_as::<_, MeterLog>(
        "UPDATE meter_logs SET status = $1 WHERE id = $2 RETURNING *",
    )
    .bind(payload.status)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Показание не найдено".to_string()))?;

    Ok(ApiResponse::ok(to_response(log)))
}
