use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "email_template_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailTemplateType {
    InvoiceGenerated,
    PaymentReceipt,
    PaymentReminder,
    Welcome,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "sms_template_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SmsTemplateType {
    InvoiceGenerated,
    PaymentReminder,
    ReadingRecorded,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmailTemplate {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub template_type: EmailTemplateType,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub html_body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SmsTemplate {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub template_type: SmsTemplateType,
    pub name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmailTemplateRequest {
    #[serde(rename = "type")]
    pub template_type: EmailTemplateType,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub html_body: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEmailTemplateRequest {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub html_body: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSmsTemplateRequest {
    #[serde(rename = "type")]
    pub template_type: SmsTemplateType,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSmsTemplateRequest {
    pub name: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PreviewTemplateRequest {
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewTemplateResponse {
    pub subject: Option<String>,
    pub body: String,
}
