use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tower {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Башня со счётчиком крыльев; башни без крыльев скрываются из выбора.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TowerResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub wing_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq)]
pub struct Wing {
    pub id: Uuid,
    pub tower_id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Floor {
    pub id: Uuid,
    pub wing_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTowerRequest {
    pub project_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTowerRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct TowerQuery {
    pub project_id: Option<Uuid>,
    /// Вернуть только башни, у которых есть хотя бы одно крыло
    pub with_wings: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWingRequest {
    pub tower_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWingRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFloorRequest {
    pub wing_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFloorRequest {
    pub name: Option<String>,
}
