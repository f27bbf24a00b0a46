use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    AvailableFlatQuery, CreateFlatRequest, Customer, Flat, FlatQuery, FlatResponse, Meter,
    UpdateFlatRequest,
};
use crate::response::ApiResponse;
use crate::services::assignment;
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_flats).post(create_flat))
        .route("/available", get(list_available_flats))
        .route("/:id", axum::routing::put(update_flat).delete(delete_flat))
}

const FLAT_RESPONSE_SQL: &str = r#"
    SELECT f.id, f.floor_id, f.flat_no, m.id AS meter_id, c.id AS customer_id
    FROM flats f
    LEFT JOIN meters m ON m.flat_id = f.id
    LEFT JOIN customers c ON c.flat_id = f.id
"#;

async fn load_flat_response(state: &AppState, id: Uuid) -> AppResult<FlatResponse> {
    let sql = format!("{} WHERE f.id = $1", FLAT_RESPONSE_SQL);
    sqlx::query_as::<_, FlatResponse>(&sql)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Квартира не найдена".to_string()))
}

/// Проверяет, что счётчик можно привязать к квартире. Текущий счётчик самой
/// квартиры не считается конфликтом.
async fn check_meter_assignable(
    state: &AppState,
    meter_id: Uuid,
    keep: Option<Uuid>,
) -> AppResult<Meter> {
    let meter = sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE id = $1")
        .bind(meter_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Счётчик не найден".to_string()))?;

    if assignment::assignable_meters(std::slice::from_ref(&meter), keep).is_empty() {
        return Err(AppError::Conflict(
            "Счётчик уже привязан к другой квартире или неактивен".to_string(),
        ));
    }

    Ok(meter)
}

/// Список квартир с привязками
#[utoipa::path(
    get,
    path = "/api/v1/flats",
    tag = "flats",
    security(("bearer_auth" = [])),
    params(FlatQuery),
    responses(
        (status = 200, description = "Квартиры", body = Vec<FlatResponse>)
    )
)]
pub async fn list_flats(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<FlatQuery>,
) -> AppResult<Json<ApiResponse<Vec<FlatResponse>>>> {
    let sql = format!(
        "{} WHERE ($1::uuid IS NULL OR f.floor_id = $1) ORDER BY f.flat_no",
        FLAT_RESPONSE_SQL
    );
    let flats = sqlx::query_as::<_, FlatResponse>(&sql)
        .bind(query.floor_id)
        .fetch_all(&state.pool)
        .await?;

    Ok(ApiResponse::ok(flats))
}

/// Свободные квартиры для привязки абонента
#[utoipa::path(
    get,
    path = "/api/v1/flats/available",
    tag = "flats",
    security(("bearer_auth" = [])),
    params(AvailableFlatQuery),
    responses(
        (status = 200, description = "Свободные квартиры", body = Vec<FlatResponse>)
    )
)]
pub async fn list_available_flats(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<AvailableFlatQuery>,
) -> AppResult<Json<ApiResponse<Vec<FlatResponse>>>> {
    let sql = format!("{} ORDER BY f.flat_no", FLAT_RESPONSE_SQL);
    let flats = sqlx::query_as::<_, FlatResponse>(&sql)
        .fetch_all(&state.pool)
        .await?;

    let keep_flat = match query.customer_id {
        Some(customer_id) => {
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
                .bind(customer_id)
                .fetch_optional(&state.pool)
                .await?
                .and_then(|c| c.flat_id)
        }
        None => None,
    };

    Ok(ApiResponse::ok(assignment::vacant_flats(&flats, keep_flat)))
}

/// Создание квартиры, опционально со счётчиком
#[utoipa::path(
    post,
    path = "/api/v1/flats",
    tag = "flats",
    security(("bearer_auth" = [])),
    request_body = CreateFlatRequest,
    responses(
        (status = 200, description = "Квартира создана", body = FlatResponse),
        (status = 404, description = "Этаж не найден"),
        (status = 409, description = "Квартира с таким номером уже есть на этаже")
    )
)]
pub async fn create_flat(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateFlatRequest>,
) -> AppResult<Json<ApiResponse<FlatResponse>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let floor: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM floors WHERE id = $1")
        .bind(payload.floor_id)
        .fetch_optional(&state.pool)
        .await?;
    if floor.is_none() {
        return Err(AppError::NotFound("Этаж не найден".to_string()));
    }

    let flat_no = validators::sanitize_string(&payload.flat_no);
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM flats WHERE floor_id = $1 AND flat_no = $2")
            .bind(payload.floor_id)
            .bind(&flat_no)
            .fetch_optional(&state.pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Квартира с таким номером уже есть на этаже".to_string(),
        ));
    }

    if let Some(meter_id) = payload.meter_id {
        check_meter_assignable(&state, meter_id, None).await?;
    }

    let mut tx = state.pool.begin().await?;

    let flat = sqlx::query_as::<_, Flat>(
        "INSERT INTO flats (floor_id, flat_no) VALUES ($1, $2) RETURNING *",
    )
    .bind(payload.floor_id)
    .bind(&flat_no)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(meter_id) = payload.meter_id {
        // Уникальный индекс на meters.flat_id закрывает гонку двух
        // одновременных привязок.
        sqlx::query("UPDATE meters SET flat_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(flat.id)
            .bind(meter_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    let response = load_flat_response(&state, flat.id).await?;
    Ok(ApiResponse::with_message("Квартира создана", response))
}

/// Обновление квартиры и перепривязка счётчика
#[utoipa::path(
    put,
    path = "/api/v1/flats/{id}",
    tag = "flats",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID квартиры")),
    request_body = UpdateFlatRequest,
    responses(
        (status = 200, description = "Квартира обновлена", body = FlatResponse),
        (status = 404, description = "Квартира не найдена"),
        (status = 409, description = "Счётчик уже привязан к другой квартире")
    )
)]
pub async fn update_flat(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFlatRequest>,
) -> AppResult<Json<ApiResponse<FlatResponse>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let current = load_flat_response(&state, id).await?;

    if let Some(Some(meter_id)) = payload.meter_id {
        check_meter_assignable(&state, meter_id, current.meter_id).await?;
    }

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "UPDATE flats SET flat_no = COALESCE($1, flat_no), updated_at = NOW() WHERE id = $2",
    )
    .bind(payload.flat_no.as_deref().map(validators::sanitize_string))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    match payload.meter_id {
        // null в поле meter_id — явная отвязка
        Some(None) => {
            sqlx::query("UPDATE meters SET flat_id = NULL, updated_at = NOW() WHERE flat_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        Some(Some(meter_id)) if current.meter_id != Some(meter_id) => {
            sqlx::query("UPDATE meters SET flat_id = NULL, updated_at = NOW() WHERE flat_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE meters SET flat_id = $1, updated_at = NOW() WHERE id = $2")
                .bind(id)
                .bind(meter_id)
                .execute(&mut *tx)
                .await?;
        }
        _ => {}
    }

    tx.commit().await?;

    let response = load_flat_response(&state, id).await?;
    Ok(ApiResponse::ok(response))
}

/// Удаление квартиры. Счётчик отвязывается, а не удаляется.
#[utoipa::path(
    delete,
    path = "/api/v1/flats/{id}",
    tag = "flats",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID квартиры")),
    responses(
        (status = 200, description = "Квартира удалена"),
        (status = 404, description = "Квартира не найдена")
    )
)]
pub async fn delete_flat(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM flats WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Квартира не найдена".to_string()));
    }

    Ok(ApiResponse::message("Квартира удалена"))
}
