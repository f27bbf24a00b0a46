use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Flat {
    pub id: Uuid,
    pub floor_id: Uuid,
    pub flat_no: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Квартира с текущими привязками счётчика и абонента (LEFT JOIN).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema, PartialEq)]
pub struct FlatResponse {
    pub id: Uuid,
    pub floor_id: Uuid,
    pub flat_no: String,
    pub meter_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFlatRequest {
    pub floor_id: Uuid,
    pub flat_no: String,
    pub meter_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFlatRequest {
    pub flat_no: Option<String>,
    /// null отвязывает счётчик, отсутствие поля оставляет привязку как есть
    #[serde(
        default,
        deserialize_with = "crate::utils::serde_helpers::double_option"
    )]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub meter_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct FlatQuery {
    pub floor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct AvailableFlatQuery {
    /// При редактировании абонента его текущая квартира остаётся в списке
    pub customer_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_flat_payload_without_meter() {
        let floor_id = Uuid::new_v4();
        let payload: CreateFlatRequest = serde_json::from_value(json!({
            "flat_no": "101",
            "floor_id": floor_id,
        }))
        .unwrap();

        assert_eq!(payload.flat_no, "101");
        assert_eq!(payload.floor_id, floor_id);
        assert!(payload.meter_id.is_none());
    }

    #[test]
    fn update_flat_payload_distinguishes_null_from_absent() {
        let absent: UpdateFlatRequest = serde_json::from_value(json!({
            "flat_no": "102",
        }))
        .unwrap();
        assert_eq!(absent.meter_id, None);

        let null: UpdateFlatRequest = serde_json::from_value(json!({
            "meter_id": null,
        }))
        .unwrap();
        assert_eq!(null.meter_id, Some(None));

        let meter_id = Uuid::new_v4();
        let set: UpdateFlatRequest = serde_json::from_value(json!({
            "meter_id": meter_id,
        }))
        .unwrap();
        assert_eq!(set.meter_id, Some(Some(meter_id)));
    }

    #[test]
    fn create_flat_payload_with_meter() {
        let payload: CreateFlatRequest = serde_json::from_value(json!({
            "flat_no": "101",
            "floor_id": Uuid::new_v4(),
            "meter_id": Uuid::new_v4(),
        }))
        .unwrap();

        assert!(payload.meter_id.is_some());
    }
}
