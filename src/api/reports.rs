use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser, API_KEY_HEADER};
use crate::models::{GenerateReportResponse, Report, ReportFilter, ReportType};
use crate::response::ApiResponse;
use crate::services::report::{
    self, ConsumerReportRow, InvoiceReportRow, OrderReportRow, PaymentReportRow,
    ReconciliationReportRow, SettlementReportRow,
};
use crate::services::FileService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:report_type", post(generate_report))
        .route("/download/:id", get(download_report))
}

const CSV_CONTENT_TYPE: &str = "text/csv";

async fn build_report_csv(
    state: &AppState,
    report_type: ReportType,
    filter: &ReportFilter,
) -> AppResult<Vec<u8>> {
    let (from, to) = report::date_bounds(filter);

    match report_type {
        ReportType::Consumer => {
            let rows = sqlx::query_as::<_, ConsumerReportRow>(
                r#"
                SELECT c.customer_no, c.name, c.phone,
                       f.flat_no, m.serial_no AS meter_serial, m.total_units
                FROM customers c
                LEFT JOIN flats f ON f.id = c.flat_id
                LEFT JOIN meters m ON m.flat_id = f.id
                LEFT JOIN floors fl ON fl.id = f.floor_id
                LEFT JOIN wings w ON w.id = fl.wing_id
                LEFT JOIN towers t ON t.id = w.tower_id
                WHERE ($1::uuid IS NULL OR t.project_id = $1)
                  AND ($2::date IS NULL OR c.created_at::date >= $2)
                  AND ($3::date IS NULL OR c.created_at::date <= $3)
                ORDER BY c.customer_no
                "#,
            )
            .bind(filter.project_id)
            .bind(from)
            .bind(to)
            .fetch_all(&state.pool)
            .await?;
            report::write_csv(&rows)
        }
        ReportType::Invoice => {
            let rows = sqlx::query_as::<_, InvoiceReportRow>(
                r#"
                SELECT i.invoice_no, c.name AS customer_name, i.unit_consumed,
                       i.bill_amount, i.status::text AS status, i.due_date
                FROM invoices i
                JOIN customers c ON c.id = i.customer_id
                LEFT JOIN meters m ON m.flat_id = c.flat_id
                WHERE ($1::uuid IS NULL OR c.flat_id = $1)
                  AND ($2::uuid IS NULL OR m.id = $2)
                  AND ($3::uuid IS NULL OR i.id = $3)
                  AND ($4::date IS NULL OR i.created_at::date >= $4)
                  AND ($5::date IS NULL OR i.created_at::date <= $5)
                ORDER BY i.created_at DESC
                "#,
            )
            .bind(filter.flat_id)
            .bind(filter.meter_id)
            .bind(filter.invoice_id)
            .bind(from)
            .bind(to)
            .fetch_all(&state.pool)
            .await?;
            report::write_csv(&rows)
        }
        ReportType::Payment => {
            let rows = sqlx::query_as::<_, PaymentReportRow>(
                r#"
                SELECT i.invoice_no, p.amount, p.method::text AS method,
                       p.status::text AS status, u.name AS collected_by
                FROM payments p
                JOIN invoices i ON i.id = p.invoice_id
                LEFT JOIN users u ON u.id = p.collected_by
                WHERE ($1::uuid IS NULL OR p.invoice_id = $1)
                  AND ($2::date IS NULL OR p.created_at::date >= $2)
                  AND ($3::date IS NULL OR p.created_at::date <= $3)
                ORDER BY p.created_at DESC
                "#,
            )
            .bind(filter.invoice_id)
            .bind(from)
            .bind(to)
            .fetch_all(&state.pool)
            .await?;
            report::write_csv(&rows)
        }
        ReportType::Order => {
            let rows = sqlx::query_as::<_, OrderReportRow>(
                r#"
                SELECT u.name AS agent_name, awt.amount, awt.note
                FROM agent_wallet_transactions awt
                JOIN users u ON u.id = awt.agent_id
                WHERE ($1::date IS NULL OR awt.created_at::date >= $1)
                  AND ($2::date IS NULL OR awt.created_at::date <= $2)
                ORDER BY awt.created_at DESC
                "#,
            )
            .bind(from)
            .bind(to)
            .fetch_all(&state.pool)
            .await?;
            report::write_csv(&rows)
        }
        ReportType::Settlement => {
            let rows = sqlx::query_as::<_, SettlementReportRow>(
                r#"
                SELECT u.name AS agent_name,
                       COALESCE(SUM(awt.amount), 0) AS collected_total,
                       COUNT(awt.id) AS transaction_count
                FROM project_agents pa
                JOIN users u ON u.id = pa.agent_id
                LEFT JOIN agent_wallet_transactions awt ON awt.agent_id = u.id
                    AND ($2::date IS NULL OR awt.created_at::date >= $2)
                    AND ($3::date IS NULL OR awt.created_at::date <= $3)
                WHERE pa.project_id = $1
                GROUP BY u.id, u.name
                ORDER BY u.name
                "#,
            )
            .bind(filter.project_id)
            .bind(from)
            .bind(to)
            .fetch_all(&state.pool)
            .await?;
            report::write_csv(&rows)
        }
        ReportType::Reconciliation => {
            let rows = sqlx::query_as::<_, ReconciliationReportRow>(
                r#"
                SELECT i.invoice_no, i.bill_amount,
                       COALESCE(SUM(p.amount) FILTER (WHERE p.status = 'successfull'), 0) AS paid_total,
                       i.bill_amount - COALESCE(SUM(p.amount) FILTER (WHERE p.status = 'successfull'), 0) AS balance
                FROM invoices i
                JOIN customers c ON c.id = i.customer_id
                JOIN flats f ON f.id = c.flat_id
                JOIN floors fl ON fl.id = f.floor_id
                JOIN wings w ON w.id = fl.wing_id
                JOIN towers t ON t.id = w.tower_id
                LEFT JOIN payments p ON p.invoice_id = i.id
                WHERE t.project_id = $1
                  AND ($2::date IS NULL OR i.created_at::date >= $2)
                  AND ($3::date IS NULL OR i.created_at::date <= $3)
                GROUP BY i.id, i.invoice_no, i.bill_amount
                ORDER BY i.invoice_no
                "#,
            )
            .bind(filter.project_id)
            .bind(from)
            .bind(to)
            .fetch_all(&state.pool)
            .await?;
            report::write_csv(&rows)
        }
    }
}

/// Формирование отчёта. Файл складывается в хранилище, в ответе ссылка на
/// скачивание.
#[utoipa::path(
    post,
    path = "/api/v1/reports/{report_type}",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(("report_type" = ReportType, Path, description = "Тип отчёта")),
    request_body = ReportFilter,
    responses(
        (status = 200, description = "Отчёт сформирован", body = GenerateReportResponse),
        (status = 400, description = "Фильтр не прошёл проверку")
    )
)]
pub async fn generate_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(report_type): Path<ReportType>,
    Json(filter): Json<ReportFilter>,
) -> AppResult<Json<ApiResponse<GenerateReportResponse>>> {
    report::validate_filter(report_type, &filter)?;

    let data = build_report_csv(&state, report_type, &filter).await?;

    let file_name = format!(
        "{}-{}.csv",
        report_type.as_str(),
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    );

    let file_service = FileService::new(&state.config).await?;
    let url = file_service
        .upload_file("reports", &file_name, CSV_CONTENT_TYPE, data)
        .await?;
    let file_key = file_service
        .get_key_from_url(&url)
        .ok_or_else(|| AppError::Internal("report key missing from upload url".to_string()))?;

    let saved = sqlx::query_as::<_, Report>(
        r#"
        INSERT INTO reports (report_type, file_key, file_name, content_type, requested_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(report_type.as_str())
    .bind(&file_key)
    .bind(&file_name)
    .bind(CSV_CONTENT_TYPE)
    .bind(auth_user.user_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(report_id = %saved.id, report_type = report_type.as_str(), "report generated");

    let download_url = format!(
        "{}/api/v1/reports/download/{}",
        state.config.public_base_url, saved.id
    );

    Ok(ApiResponse::with_message(
        "Отчёт сформирован",
        GenerateReportResponse { download_url },
    ))
}

/// Скачивание отчёта. Помимо bearer-токена требуется заголовок api-key.
/// Отчёты внешнего рендера (file_key — полный URL) проксируются с теми же
/// учётными данными.
#[utoipa::path(
    get,
    path = "/api/v1/reports/download/{id}",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID отчёта")),
    responses(
        (status = 200, description = "Файл отчёта"),
        (status = 401, description = "Неверный api-key"),
        (status = 404, description = "Отчёт не найден")
    )
)]
pub async fn download_report(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if api_key != state.config.api_key {
        return Err(AppError::InvalidApiKey);
    }

    let saved = sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Отчёт не найден".to_string()))?;

    let (file_name, content_type, data) = if saved.file_key.starts_with("http") {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or("");
        let client = reqwest::Client::new();
        let (file, data) =
            report::fetch_report(&client, &saved.file_key, &state.config.api_key, token).await?;
        (file.file_name, saved.content_type.clone(), data)
    } else {
        let file_service = FileService::new(&state.config).await?;
        let data = file_service.get_file(&saved.file_key).await?;
        (saved.file_name.clone(), saved.content_type.clone(), data)
    };

    let disposition = format!("attachment; filename=\"{}\"", file_name);
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}
