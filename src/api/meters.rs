use axum::{
    extract::{Multipart, Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    AvailableMeterQuery, CreateMeterRequest, Meter, MeterQuery, UpdateMeterRequest,
    UpdateReadingRequest,
};
use crate::response::ApiResponse;
use crate::services::file_service::{validate_image_content_type, MAX_METER_IMAGE_SIZE};
use crate::services::{assignment, billing, FileService};
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meters).post(create_meter))
        .route("/available", get(list_available_meters))
        .route("/:id", axum::routing::put(update_meter).delete(delete_meter))
        .route("/:id/reading", axum::routing::put(update_reading))
        .route("/:id/image", axum::routing::post(upload_meter_image))
}

/// Список счётчиков
#[utoipa::path(
    get,
    path = "/api/v1/meters",
    tag = "meters",
    security(("bearer_auth" = [])),
    params(MeterQuery),
    responses(
        (status = 200, description = "Счётчики", body = Vec<Meter>)
    )
)]
pub async fn list_meters(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<MeterQuery>,
) -> AppResult<Json<ApiResponse<Vec<Meter>>>> {
    let meters = sqlx::query_as::<_, Meter>(
        r#"
        SELECT * FROM meters
        WHERE ($1::meter_status IS NULL OR status = $1)
        ORDER BY serial_no
        "#,
    )
    .bind(query.status)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(meters))
}

/// Счётчики, доступные для привязки к квартире
#[utoipa::path(
    get,
    path = "/api/v1/meters/available",
    tag = "meters",
    security(("bearer_auth" = [])),
    params(AvailableMeterQuery),
    responses(
        (status = 200, description = "Доступные счётчики", body = Vec<Meter>)
    )
)]
pub async fn list_available_meters(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<AvailableMeterQuery>,
) -> AppResult<Json<ApiResponse<Vec<Meter>>>> {
    let meters = sqlx::query_as::<_, Meter>("SELECT * FROM meters ORDER BY serial_no")
        .fetch_all(&state.pool)
        .await?;

    let keep = match query.flat_id {
        Some(flat_id) => sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE flat_id = $1")
            .bind(flat_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|m| m.id),
        None => None,
    };

    Ok(ApiResponse::ok(assignment::assignable_meters(&meters, keep)))
}

/// Создание счётчика
#[utoipa::path(
    post,
    path = "/api/v1/meters",
    tag = "meters",
    security(("bearer_auth" = [])),
    request_body = CreateMeterRequest,
    responses(
        (status = 200, description = "Счётчик создан", body = Meter),
        (status = 409, description = "Серийный номер уже зарегистрирован")
    )
)]
pub async fn create_meter(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateMeterRequest>,
) -> AppResult<Json<ApiResponse<Meter>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let serial_no = validators::sanitize_string(&payload.serial_no).to_uppercase();
    if !validators::validate_meter_serial(&serial_no) {
        return Err(AppError::Validation(
            "Некорректный серийный номер счётчика".to_string(),
        ));
    }

    let existing = sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE serial_no = $1")
        .bind(&serial_no)
        .fetch_optional(&state.pool)
        .await?;
    if assignment::serial_taken(existing.as_ref(), None) {
        return Err(AppError::Conflict(
            "Серийный номер уже зарегистрирован".to_string(),
        ));
    }

    let meter = sqlx::query_as::<_, Meter>(
        "INSERT INTO meters (serial_no, status) VALUES ($1, COALESCE($2, 'active'::meter_status)) RETURNING *",
    )
    .bind(&serial_no)
    .bind(payload.status)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Счётчик создан", meter))
}

/// Обновление счётчика
#[utoipa::path(
    put,
    path = "/api/v1/meters/{id}",
    tag = "meters",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID счётчика")),
    request_body = UpdateMeterRequest,
    responses(
        (status = 200, description = "Счётчик обновлён", body = Meter),
        (status = 404, description = "Счётчик не найден"),
        (status = 409, description = "Серийный номер уже зарегистрирован")
    )
)]
pub async fn update_meter(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMeterRequest>,
) -> AppResult<Json<ApiResponse<Meter>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if let Some(serial) = &payload.serial_no {
        let serial = serial.to_uppercase();
        if !validators::validate_meter_serial(&serial) {
            return Err(AppError::Validation(
                "Некорректный серийный номер счётчика".to_string(),
            ));
        }

        let existing = sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE serial_no = $1")
            .bind(&serial)
            .fetch_optional(&state.pool)
            .await?;
        if assignment::serial_taken(existing.as_ref(), Some(id)) {
            return Err(AppError::Conflict(
                "Серийный номер уже зарегистрирован".to_string(),
            ));
        }
    }

    let meter = sqlx::query_as::<_, Meter>(
        r#"
        UPDATE meters
        SET serial_no = COALESCE($1, serial_no),
            status = COALESCE($2, status),
            updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(payload.serial_no.map(|s| s.to_uppercase()))
    .bind(payload.status)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Счётчик не найден".to_string()))?;

    Ok(ApiResponse::ok(meter))
}

/// Удаление счётчика
#[utoipa::path(
    delete,
    path = "/api/v1/meters/{id}",
    tag = "meters",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID счётчика")),
    responses(
        (status = 200, description = "Счётчик удалён"),
        (status = 404, description = "Счётчик не найден")
    )
)]
pub async fn delete_meter(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let meter = sqlx::query_as::<_, Meter>("SELECT * FROM meters WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Счётчик не найден".to_string()))?;

    sqlx::query("DELETE FROM meters WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if let Some(image_url) = &meter.image_url {
        let file_service = FileService::new(&state.config).await?;
        if let Some(key) = file_service.get_key_from_url(image_url) {
            if let Err(e) = file_service.delete_file(&key).await {
                tracing::warn!(meter_id = %id, error = %e, "failed to remove meter image");
            }
        }
    }

    Ok(ApiResponse::message("Счётчик удалён"))
}

/// Ручная корректировка предыдущего показания. Значение принимается числом или
/// строкой; нечисловой ввод отклоняется.
#[utoipa::path(
    put,
    path = "/api/v1/meters/{id}/reading",
    tag = "meters",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID счётчика")),
    request_body = UpdateReadingRequest,
    responses(
        (status = 200, description = "Показание обновлено", body = Meter),
        (status = 404, description = "Счётчик не найден"),
        (status = 422, description = "Показание не является числом")
    )
)]
pub async fn update_reading(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReadingRequest>,
) -> AppResult<Json<ApiResponse<Meter>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let reading = billing::coerce_reading(&payload.previous_reading).ok_or_else(|| {
        AppError::Validation("Показание должно быть числом".to_string())
    })?;

    let meter = sqlx::query_as::<_, Meter>(
        "UPDATE meters SET previous_reading = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(reading)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Счётчик не найден".to_string()))?;

    Ok(ApiResponse::ok(meter))
}

/// Загрузка фото счётчика (multipart, до 2MB)
#[utoipa::path(
    post,
    path = "/api/v1/meters/{id}/image",
    tag = "meters",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID счётчика")),
    responses(
        (status = 200, description = "Фото загружено", body = Meter),
        (status = 400, description = "Файл отсутствует или не является изображением"),
        (status = 404, description = "Счётчик не найден")
    )
)]
pub async fn upload_meter_image(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Meter>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM meters WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_none() {
        return Err(AppError::NotFound("Счётчик не найден".to_string()));
    }

    let mut uploaded: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !validate_image_content_type(&content_type) {
            return Err(AppError::BadRequest(
                "Поддерживаются только изображения".to_string(),
            ));
        }

        let file_name = field.file_name().unwrap_or("meter.jpg").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if data.len() > MAX_METER_IMAGE_SIZE {
            return Err(AppError::BadRequest(
                "Файл превышает лимит 2MB".to_string(),
            ));
        }

        let file_service = FileService::new(&state.config).await?;
        let url = file_service
            .upload_file("meters", &file_name, &content_type, data.to_vec())
            .await?;
        uploaded = Some(url);
        break;
    }

    let url = uploaded
        .ok_or_else(|| AppError::BadRequest("Поле file обязательно".to_string()))?;

    let meter = sqlx::query_as::<_, Meter>(
        "UPDATE meters SET image_url = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(&url)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Фото загружено", meter))
}
