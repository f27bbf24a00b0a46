use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub state: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Locality {
    pub id: Uuid,
    pub city_id: Uuid,
    pub name: String,
    pub pincode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCityRequest {
    pub name: String,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCityRequest {
    pub name: Option<String>,
    pub state: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLocalityRequest {
    pub city_id: Uuid,
    pub name: String,
    pub pincode: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocalityRequest {
    pub name: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct LocalityQuery {
    pub city_id: Option<Uuid>,
}
