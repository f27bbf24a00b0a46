use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    CreatePaymentRequest, Invoice, Payment, PaymentMethod, PaymentQuery, PaymentStatus, UserRole,
};
use crate::response::ApiResponse;
use crate::services::billing;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_payments).post(create_payment))
}

/// Платежи, опционально по счёту
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(PaymentQuery),
    responses(
        (status = 200, description = "Платежи", body = Vec<Payment>)
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<PaymentQuery>,
) -> AppResult<Json<ApiResponse<Vec<Payment>>>> {
    let payments = sqlx::query_as::<_, Payment>(
        r#"
        SELECT * FROM payments
        WHERE ($1::uuid IS NULL OR invoice_id = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.invoice_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(payments))
}

/// Регистрация платежа. Статус счёта выводится из суммы успешных платежей
/// только здесь. Наличные, принятые агентом, зачисляются на его кошелёк.
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Платёж зарегистрирован", body = Payment),
        (status = 404, description = "Счёт не найден")
    )
)]
pub async fn create_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Сумма платежа должна быть положительной".to_string(),
        ));
    }

    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
        .bind(payload.invoice_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Счёт не найден".to_string()))?;

    let status = payload.status.unwrap_or(PaymentStatus::Successfull);

    let mut tx = state.pool.begin().await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (invoice_id, amount, method, status, collected_by, transaction_ref)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(invoice.id)
    .bind(payload.amount)
    .bind(payload.method)
    .bind(status)
    .bind(auth_user.user_id)
    .bind(&payload.transaction_ref)
    .fetch_one(&mut *tx)
    .await?;

    if status == PaymentStatus::Successfull {
        let (paid_total,): (Option<Decimal>,) = sqlx::query_as(
            "SELECT SUM(amount) FROM payments WHERE invoice_id = $1 AND status = 'successfull'::payment_status",
        )
        .bind(invoice.id)
        .fetch_one(&mut *tx)
        .await?;

        let new_status = billing::derive_invoice_status(
            invoice.bill_amount,
            paid_total.unwrap_or(Decimal::ZERO),
            invoice.status,
        );

        sqlx::query("UPDATE invoices SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_status)
            .bind(invoice.id)
            .execute(&mut *tx)
            .await?;

        // Наличные от агента попадают в его кошелёк до инкассации
        if payload.method == PaymentMethod::Cash && auth_user.role == UserRole::Agent {
            sqlx::query(
                r#"
                INSERT INTO agent_wallet_transactions (agent_id, amount, note)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(auth_user.user_id)
            .bind(payload.amount)
            .bind(format!("платёж по счёту {}", invoice.invoice_no))
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE users SET wallet_balance = wallet_balance + $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(payload.amount)
            .bind(auth_user.user_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    tracing::info!(
        payment_id = %payment.id,
        invoice_id = %invoice.id,
        amount = %payload.amount,
        "payment recorded"
    );

    Ok(ApiResponse::with_message("Платёж зарегистрирован", payment))
}
