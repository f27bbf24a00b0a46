use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Тип отчёта. В пути запроса используется нижний регистр: /reports/consumer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Consumer,
    Invoice,
    Order,
    Settlement,
    Reconciliation,
    Payment,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Consumer => "consumer",
            ReportType::Invoice => "invoice",
            ReportType::Order => "order",
            ReportType::Settlement => "settlement",
            ReportType::Reconciliation => "reconciliation",
            ReportType::Payment => "payment",
        }
    }
}

/// Параметры фильтра отчёта в нотации дашборда (camelCase).
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub single_date: Option<NaiveDate>,
    pub meter_id: Option<Uuid>,
    pub flat_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Report {
    pub id: Uuid,
    pub report_type: String,
    pub file_key: String,
    pub file_name: String,
    pub content_type: String,
    pub requested_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateReportResponse {
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}
