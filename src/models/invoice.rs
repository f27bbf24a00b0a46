use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
    Overdue,
    PartiallyPaid,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        Self::Unpaid
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Failed,
    Successfull,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_no: String,
    pub customer_id: Uuid,
    pub unit_consumed: Decimal,
    pub gas_unit_rate: Decimal,
    pub amc_cost: Decimal,
    pub utility_tax: Decimal,
    pub app_charges: Decimal,
    pub penalty_amount: Decimal,
    pub overdue_penalty: Decimal,
    pub bill_amount: Decimal,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    /// Сумма к оплате, отформатированная до двух знаков
    pub bill_amount_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub collected_by: Option<Uuid>,
    pub transaction_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvoiceRequest {
    pub customer_id: Uuid,
    pub unit_consumed: Decimal,
    pub overdue_penalty: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInvoiceRequest {
    pub unit_consumed: Option<Decimal>,
    pub gas_unit_rate: Option<Decimal>,
    pub amc_cost: Option<Decimal>,
    pub utility_tax: Option<Decimal>,
    pub app_charges: Option<Decimal>,
    pub penalty_amount: Option<Decimal>,
    pub overdue_penalty: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct InvoiceQuery {
    pub customer_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: Option<PaymentStatus>,
    pub transaction_ref: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct PaymentQuery {
    pub invoice_id: Option<Uuid>,
}
