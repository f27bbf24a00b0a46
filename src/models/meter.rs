use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "meter_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeterStatus {
    Active,
    Inactive,
    Maintenance,
}

impl Default for MeterStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "reading_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStatus {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
pub struct Meter {
    pub id: Uuid,
    pub serial_no: String,
    pub status: MeterStatus,
    pub total_units: Decimal,
    pub previous_reading: Option<Decimal>,
    pub flat_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Неизменяемое событие снятия показаний.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MeterLog {
    pub id: Uuid,
    pub meter_id: Uuid,
    pub previous_reading: Decimal,
    pub current_reading: Decimal,
    pub units_consumed: Decimal,
    pub status: ReadingStatus,
    pub proof_image_url: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeterLogResponse {
    pub log: MeterLog,
    /// Отформатированное потребление, например "25.000 units"
    pub units_display: String,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMeterRequest {
    pub serial_no: String,
    pub status: Option<MeterStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMeterRequest {
    pub serial_no: Option<String>,
    pub status: Option<MeterStatus>,
}

/// Показание приходит как есть из формы: число или строка.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReadingRequest {
    #[schema(value_type = String)]
    pub previous_reading: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMeterLogRequest {
    pub meter_id: Uuid,
    #[schema(value_type = String)]
    pub current_reading: serde_json::Value,
    pub proof_image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMeterLogStatusRequest {
    pub status: ReadingStatus,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct MeterQuery {
    pub status: Option<MeterStatus>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct AvailableMeterQuery {
    /// При редактировании квартиры её текущий счётчик остаётся в списке
    pub flat_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct MeterLogQuery {
    pub meter_id: Option<Uuid>,
}
