use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rand::Rng;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    CreateCustomerRequest, Customer, CustomerImportRow, ImportSummary, UpdateCustomerRequest,
};
use crate::response::ApiResponse;
use crate::services::file_service::{validate_csv_content_type, MAX_IMPORT_SIZE};
use crate::utils::validators;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/import", axum::routing::post(import_customers))
        .route("/import/template", get(import_template))
        .route(
            "/:id",
            axum::routing::put(update_customer).delete(delete_customer),
        )
}

fn generate_customer_no() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    format!("CUST-{}", suffix)
}

/// Квартира занята, если к ней привязан другой абонент.
async fn check_flat_vacant(
    state: &AppState,
    flat_id: Uuid,
    keep_customer: Option<Uuid>,
) -> AppResult<()> {
    let flat: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM flats WHERE id = $1")
        .bind(flat_id)
        .fetch_optional(&state.pool)
        .await?;
    if flat.is_none() {
        return Err(AppError::NotFound("Квартира не найдена".to_string()));
    }

    let occupant: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM customers WHERE flat_id = $1")
            .bind(flat_id)
            .fetch_optional(&state.pool)
            .await?;
    match occupant {
        Some((occupant_id,)) if Some(occupant_id) != keep_customer => Err(AppError::Conflict(
            "Квартира уже занята другим абонентом".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Список абонентов
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Абоненты", body = Vec<Customer>)
    )
)]
pub async fn list_customers(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Customer>>>> {
    let customers =
        sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC")
            .fetch_all(&state.pool)
            .await?;

    Ok(ApiResponse::ok(customers))
}

/// Создание абонента, опционально с привязкой к квартире
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "customers",
    security(("bearer_auth" = [])),
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Абонент создан", body = Customer),
        (status = 409, description = "Квартира уже занята")
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCustomerRequest>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if !validators::validate_phone(&payload.phone) {
        return Err(AppError::Validation(
            "Некорректный номер телефона".to_string(),
        ));
    }
    if let Some(email) = &payload.email {
        if !validators::validate_email(email) {
            return Err(AppError::Validation("Некорректный email".to_string()));
        }
    }

    if let Some(flat_id) = payload.flat_id {
        check_flat_vacant(&state, flat_id, None).await?;
    }

    let customer = sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (customer_no, name, email, phone, flat_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(generate_customer_no())
    .bind(validators::sanitize_string(&payload.name))
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.flat_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Абонент создан", customer))
}

/// Обновление абонента. Его собственная квартира не считается занятой.
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID абонента")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Абонент обновлён", body = Customer),
        (status = 404, description = "Абонент не найден"),
        (status = 409, description = "Квартира уже занята")
    )
)]
pub async fn update_customer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if let Some(phone) = &payload.phone {
        if !validators::validate_phone(phone) {
            return Err(AppError::Validation(
                "Некорректный номер телефона".to_string(),
            ));
        }
    }
    if let Some(email) = &payload.email {
        if !validators::validate_email(email) {
            return Err(AppError::Validation("Некорректный email".to_string()));
        }
    }

    if let Some(flat_id) = payload.flat_id {
        check_flat_vacant(&state, flat_id, Some(id)).await?;
    }

    let customer = sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET name = COALESCE($1, name),
            email = COALESCE($2, email),
            phone = COALESCE($3, phone),
            flat_id = COALESCE($4, flat_id),
            updated_at = NOW()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(payload.name.as_deref().map(validators::sanitize_string))
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.flat_id)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Абонент не найден".to_string()))?;

    Ok(ApiResponse::ok(customer))
}

/// Удаление абонента
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    tag = "customers",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID абонента")),
    responses(
        (status = 200, description = "Абонент удалён"),
        (status = 404, description = "Абонент не найден")
    )
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Абонент не найден".to_string()));
    }

    Ok(ApiResponse::message("Абонент удалён"))
}

/// Массовый импорт абонентов из CSV. Строки с ошибками пропускаются, сводка
/// возвращается в ответе.
#[utoipa::path(
    post,
    path = "/api/v1/customers/import",
    tag = "customers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Сводка импорта", body = ImportSummary),
        (status = 400, description = "Файл отсутствует или не CSV")
    )
)]
pub async fn import_customers(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportSummary>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let mut csv_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !validate_csv_content_type(&content_type) {
            return Err(AppError::BadRequest(
                "Ожидается CSV-файл".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if data.len() > MAX_IMPORT_SIZE {
            return Err(AppError::BadRequest(
                "Файл превышает лимит 5MB".to_string(),
            ));
        }
        csv_data = Some(data.to_vec());
        break;
    }

    let csv_data =
        csv_data.ok_or_else(|| AppError::BadRequest("Поле file обязательно".to_string()))?;

    let mut reader = csv::Reader::from_reader(csv_data.as_slice());
    let mut summary = ImportSummary {
        imported: 0,
        skipped: 0,
        errors: Vec::new(),
    };

    for (idx, row) in reader.deserialize::<CustomerImportRow>().enumerate() {
        let line = idx + 2; // заголовок занимает первую строку
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                summary.skipped += 1;
                summary.errors.push(format!("строка {}: {}", line, e));
                continue;
            }
        };

        if !validators::validate_phone(&row.phone) {
            summary.skipped += 1;
            summary
                .errors
                .push(format!("строка {}: некорректный телефон", line));
            continue;
        }
        if let Some(email) = &row.email {
            if !email.is_empty() && !validators::validate_email(email) {
                summary.skipped += 1;
                summary
                    .errors
                    .push(format!("строка {}: некорректный email", line));
                continue;
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO customers (customer_no, name, email, phone)
            VALUES ($1, $2, NULLIF($3, ''), $4)
            "#,
        )
        .bind(generate_customer_no())
        .bind(validators::sanitize_string(&row.name))
        .bind(row.email.unwrap_or_default())
        .bind(&row.phone)
        .execute(&state.pool)
        .await;

        match result {
            Ok(_) => summary.imported += 1,
            Err(e) => {
                summary.skipped += 1;
                summary.errors.push(format!("строка {}: {}", line, e));
            }
        }
    }

    tracing::info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "customer import finished"
    );

    Ok(ApiResponse::with_message("Импорт завершён", summary))
}

/// Шаблон CSV для массового импорта
#[utoipa::path(
    get,
    path = "/api/v1/customers/import/template",
    tag = "customers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "CSV-шаблон", content_type = "text/csv")
    )
)]
pub async fn import_template(_auth_user: AuthUser) -> impl IntoResponse {
    let template = include_str!("../../assets/customer_import_template.csv");
    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"Without Customer Format.csv\"",
            ),
        ],
        template,
    )
}
