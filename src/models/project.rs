use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub locality_id: Uuid,
    pub name: String,
    pub is_wing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Тарифная карта проекта. Без неё счета по проекту не выставляются.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CostConfiguration {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub gas_unit_rate: Decimal,
    pub amc_cost: Decimal,
    pub utility_tax: Decimal,
    pub app_charges: Decimal,
    pub penalty_amount: Decimal,
    pub bill_due_date: i32,
    pub register_fees: Decimal,
    pub transaction_percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub locality_id: Uuid,
    pub name: String,
    pub is_wing: bool,
    pub has_cost_configuration: bool,
    pub agent_count: i64,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub locality_id: Uuid,
    pub name: String,
    pub is_wing: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignAgentRequest {
    pub agent_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ProjectQuery {
    pub locality_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCostConfigurationRequest {
    pub project_id: Uuid,
    pub name: String,
    pub gas_unit_rate: Decimal,
    pub amc_cost: Option<Decimal>,
    pub utility_tax: Option<Decimal>,
    pub app_charges: Option<Decimal>,
    pub penalty_amount: Option<Decimal>,
    pub bill_due_date: Option<i32>,
    pub register_fees: Option<Decimal>,
    pub transaction_percentage: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCostConfigurationRequest {
    pub name: Option<String>,
    pub gas_unit_rate: Option<Decimal>,
    pub amc_cost: Option<Decimal>,
    pub utility_tax: Option<Decimal>,
    pub app_charges: Option<Decimal>,
    pub penalty_amount: Option<Decimal>,
    pub bill_due_date: Option<i32>,
    pub register_fees: Option<Decimal>,
    pub transaction_percentage: Option<Decimal>,
}
