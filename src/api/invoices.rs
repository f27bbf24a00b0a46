use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    CostConfiguration, CreateInvoiceRequest, Customer, Invoice, InvoiceQuery, InvoiceResponse,
    InvoiceStatus, UpdateInvoiceRequest,
};
use crate::response::ApiResponse;
use crate::services::billing::{self, BillComponents};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route(
            "/:id",
            get(get_invoice)
                .put(update_invoice)
                .delete(delete_invoice),
        )
}

fn to_response(invoice: Invoice) -> InvoiceResponse {
    let bill_amount_display = billing::format_currency(invoice.bill_amount);
    InvoiceResponse {
        invoice,
        bill_amount_display,
    }
}

fn generate_invoice_no() -> String {
    let now = Utc::now();
    let suffix: u32 = rand::thread_rng().gen_range(1_000..10_000);
    format!("INV-{}{:02}-{}", now.year(), now.month(), suffix)
}

/// Тарифная карта проекта, к которому относится квартира абонента. Цепочка:
/// квартира → этаж → крыло → башня → проект.
async fn rate_card_for_customer(
    state: &AppState,
    customer: &Customer,
) -> AppResult<CostConfiguration> {
    let flat_id = customer.flat_id.ok_or_else(|| {
        AppError::BadRequest("Абонент не привязан к квартире".to_string())
    })?;

    let config = sqlx::query_as::<_, CostConfiguration>(
        r#"
        SELECT cc.* FROM cost_configurations cc
        JOIN towers t ON t.project_id = cc.project_id
        JOIN wings w ON w.tower_id = t.id
        JOIN floors fl ON fl.wing_id = w.id
        JOIN flats f ON f.floor_id = fl.id
        WHERE f.id = $1
        "#,
    )
    .bind(flat_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| {
        AppError::BadRequest("У проекта нет тарифной карты".to_string())
    })?;

    Ok(config)
}

/// Список счетов
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    tag = "invoices",
    security(("bearer_auth" = [])),
    params(InvoiceQuery),
    responses(
        (status = 200, description = "Счета", body = Vec<InvoiceResponse>)
    )
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<InvoiceQuery>,
) -> AppResult<Json<ApiResponse<Vec<InvoiceResponse>>>> {
    let invoices = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT * FROM invoices
        WHERE ($1::uuid IS NULL OR customer_id = $1)
          AND ($2::invoice_status IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.customer_id)
    .bind(query.status)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(
        invoices.into_iter().map(to_response).collect(),
    ))
}

/// Счёт по ID
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    tag = "invoices",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID счёта")),
    responses(
        (status = 200, description = "Счёт", body = InvoiceResponse),
        (status = 404, description = "Счёт не найден")
    )
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InvoiceResponse>>> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Счёт не найден".to_string()))?;

    Ok(ApiResponse::ok(to_response(invoice)))
}

/// Выставление счёта. Составляющие снимаются с тарифной карты проекта на
/// момент выставления, сумма считается на сервере.
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    tag = "invoices",
    security(("bearer_auth" = [])),
    request_body = CreateInvoiceRequest,
    responses(
        (status = 200, description = "Счёт выставлен", body = InvoiceResponse),
        (status = 400, description = "У проекта нет тарифной карты"),
        (status = 404, description = "Абонент не найден")
    )
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> AppResult<Json<ApiResponse<InvoiceResponse>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if payload.unit_consumed < Decimal::ZERO {
        return Err(AppError::Validation(
            "Потребление не может быть отрицательным".to_string(),
        ));
    }

    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(payload.customer_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Абонент не найден".to_string()))?;

    let rate_card = rate_card_for_customer(&state, &customer).await?;

    let components = BillComponents::from_rate_card(
        &rate_card,
        payload.unit_consumed,
        payload.overdue_penalty.unwrap_or(Decimal::ZERO),
    );
    let amount = billing::bill_amount(&components);

    let due_date = match payload.due_date {
        Some(date) => date,
        // bill_due_date в тарифной карте — день месяца
        None => billing::next_due_date(
            Utc::now().date_naive(),
            rate_card.bill_due_date.max(1) as u32,
        ),
    };

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices
            (invoice_no, customer_id, unit_consumed, gas_unit_rate, amc_cost,
             utility_tax, app_charges, penalty_amount, overdue_penalty,
             bill_amount, due_date, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'unpaid'::invoice_status)
        RETURNING *
        "#,
    )
    .bind(generate_invoice_no())
    .bind(customer.id)
    .bind(components.unit_consumed)
    .bind(components.gas_unit_rate)
    .bind(components.amc_cost)
    .bind(components.utility_tax)
    .bind(components.app_charges)
    .bind(components.penalty_amount)
    .bind(components.overdue_penalty)
    .bind(amount)
    .bind(due_date)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Счёт выставлен", to_response(invoice)))
}

/// Редактирование счёта. Сумма пересчитывается из итоговых составляющих,
/// статус администратор меняет на любой.
#[utoipa::path(
    put,
    path = "/api/v1/invoices/{id}",
    tag = "invoices",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID счёта")),
    request_body = UpdateInvoiceRequest,
    responses(
        (status = 200, description = "Счёт обновлён", body = InvoiceResponse),
        (status = 404, description = "Счёт не найден")
    )
)]
pub async fn update_invoice(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> AppResult<Json<ApiResponse<InvoiceResponse>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let current = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Счёт не найден".to_string()))?;

    let components = BillComponents {
        gas_unit_rate: payload.gas_unit_rate.unwrap_or(current.gas_unit_rate),
        unit_consumed: payload.unit_consumed.unwrap_or(current.unit_consumed),
        amc_cost: payload.amc_cost.unwrap_or(current.amc_cost),
        utility_tax: payload.utility_tax.unwrap_or(current.utility_tax),
        app_charges: payload.app_charges.unwrap_or(current.app_charges),
        penalty_amount: payload.penalty_amount.unwrap_or(current.penalty_amount),
        overdue_penalty: payload.overdue_penalty.unwrap_or(current.overdue_penalty),
    };
    let amount = billing::bill_amount(&components);

    let status = payload.status.unwrap_or(current.status);
    if current.status == InvoiceStatus::Paid && status != InvoiceStatus::Paid {
        tracing::warn!(invoice_id = %id, ?status, "paid invoice status changed by hand");
    }

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET unit_consumed = $1,
            gas_unit_rate = $2,
            amc_cost = $3,
            utility_tax = $4,
            app_charges = $5,
            penalty_amount = $6,
            overdue_penalty = $7,
            bill_amount = $8,
            due_date = COALESCE($9, due_date),
            status = $10,
            updated_at = NOW()
        WHERE id = $11
        RETURNING *
        "#,
    )
    .bind(components.unit_consumed)
    .bind(components.gas_unit_rate)
    .bind(components.amc_cost)
    .bind(components.utility_tax)
    .bind(components.app_charges)
    .bind(components.penalty_amount)
    .bind(components.overdue_penalty)
    .bind(amount)
    .bind(payload.due_date)
    .bind(status)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::ok(to_response(invoice)))
}

/// Удаление счёта
#[utoipa::path(
    delete,
    path = "/api/v1/invoices/{id}",
    tag = "invoices",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID счёта")),
    responses(
        (status = 200, description = "Счёт удалён"),
        (status = 404, description = "Счёт не найден")
    )
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Счёт не найден".to_string()));
    }

    Ok(ApiResponse::message("Счёт удалён"))
}
