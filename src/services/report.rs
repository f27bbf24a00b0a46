//! Сборка запросов отчётов и разрешение скачивания.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{ReportFilter, ReportType};

/// Проверка формы фильтра для типа отчёта.
///
/// Диапазон дат и одиночная дата взаимоисключающие; отчёт по счетам
/// ограничивается либо счётчиком, либо квартирой, но не обоими сразу.
pub fn validate_filter(report_type: ReportType, filter: &ReportFilter) -> AppResult<()> {
    match (filter.start_date, filter.end_date) {
        (Some(start), Some(end)) if start > end => {
            return Err(AppError::BadRequest(format!(
                "Неверный диапазон дат: {} позже {}",
                start, end
            )));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(AppError::BadRequest(
                "startDate и endDate задаются только вместе".to_string(),
            ));
        }
        _ => {}
    }

    if filter.single_date.is_some() && filter.start_date.is_some() {
        return Err(AppError::BadRequest(
            "singleDate несовместима с диапазоном дат".to_string(),
        ));
    }

    match report_type {
        ReportType::Invoice => match (filter.meter_id, filter.flat_id) {
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "meterId и flatId взаимоисключающие".to_string(),
            )),
            (None, None) => Err(AppError::BadRequest(
                "Отчёт по счетам требует meterId или flatId".to_string(),
            )),
            _ => Ok(()),
        },
        ReportType::Settlement | ReportType::Reconciliation => {
            if filter.project_id.is_none() {
                Err(AppError::BadRequest(
                    "Отчёт требует projectId".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        // consumer/order — projectId опционален, payment — invoiceId опционален
        ReportType::Consumer | ReportType::Order | ReportType::Payment => Ok(()),
    }
}

/// Интервал выборки: одиночная дата превращается в диапазон из одного дня.
pub fn date_bounds(filter: &ReportFilter) -> (Option<NaiveDate>, Option<NaiveDate>) {
    if let Some(single) = filter.single_date {
        return (Some(single), Some(single));
    }
    (filter.start_date, filter.end_date)
}

/// Расширение файла по content-type ответа.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    if content_type.contains("sheet") {
        "xlsx"
    } else if content_type.contains("pdf") {
        "pdf"
    } else if content_type.contains("csv") {
        "csv"
    } else {
        "xlsx"
    }
}

/// Имя файла из заголовка content-disposition, без кавычек.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    let name = rest
        .split(';')
        .next()
        .unwrap_or(rest)
        .trim()
        .trim_matches('"')
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFile {
    pub file_name: String,
}

/// Имя сохраняемого файла из заголовков ответа. Если заголовок не разобрался,
/// используется "report". Расширение добавляется только когда имя им ещё не
/// заканчивается — иначе сервер, приславший "r1.pdf", дал бы "r1.pdf.pdf".
pub fn resolve_download(
    content_type: Option<&str>,
    content_disposition: Option<&str>,
) -> DownloadFile {
    let base = content_disposition
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| "report".to_string());

    let extension = extension_for_content_type(content_type.unwrap_or(""));

    let file_name = if base.to_lowercase().ends_with(&format!(".{}", extension)) {
        base
    } else {
        format!("{}.{}", base, extension)
    };

    DownloadFile { file_name }
}

/// Повторный аутентифицированный запрос за бинарём отчёта. Не-OK статус —
/// ошибка без повтора.
pub async fn fetch_report(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    token: &str,
) -> AppResult<(DownloadFile, Vec<u8>)> {
    let response = client
        .get(url)
        .header("api-key", api_key)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| AppError::Download(e.to_string()))?;

    if !response.status().is_success() {
        return Err(AppError::Download("Download failed".to_string()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let file = resolve_download(content_type.as_deref(), content_disposition.as_deref());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Download(e.to_string()))?;

    Ok((file, bytes.to_vec()))
}

/// Сериализация строк отчёта в CSV.
pub fn write_csv<T: Serialize>(rows: &[T]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))
}

// Строки отчётов

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ConsumerReportRow {
    pub customer_no: String,
    pub name: String,
    pub phone: String,
    pub flat_no: Option<String>,
    pub meter_serial: Option<String>,
    pub total_units: Option<Decimal>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct InvoiceReportRow {
    pub invoice_no: String,
    pub customer_name: String,
    pub unit_consumed: Decimal,
    pub bill_amount: Decimal,
    pub status: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PaymentReportRow {
    pub invoice_no: String,
    pub amount: Decimal,
    pub method: String,
    pub status: String,
    pub collected_by: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderReportRow {
    pub agent_name: String,
    pub amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SettlementReportRow {
    pub agent_name: String,
    pub collected_total: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ReconciliationReportRow {
    pub invoice_no: String,
    pub bill_amount: Decimal,
    pub paid_total: Decimal,
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn filter() -> ReportFilter {
        ReportFilter::default()
    }

    #[test]
    fn invoice_report_is_meter_xor_flat_scoped() {
        let mut both = filter();
        both.meter_id = Some(Uuid::new_v4());
        both.flat_id = Some(Uuid::new_v4());
        assert!(validate_filter(ReportType::Invoice, &both).is_err());

        let mut neither = filter();
        neither.invoice_id = Some(Uuid::new_v4());
        assert!(validate_filter(ReportType::Invoice, &neither).is_err());

        let mut meter_only = filter();
        meter_only.meter_id = Some(Uuid::new_v4());
        assert!(validate_filter(ReportType::Invoice, &meter_only).is_ok());
    }

    #[test]
    fn date_range_must_be_ordered_and_complete() {
        let mut inverted = filter();
        inverted.start_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        inverted.end_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(validate_filter(ReportType::Consumer, &inverted).is_err());

        let mut half = filter();
        half.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(validate_filter(ReportType::Consumer, &half).is_err());
    }

    #[test]
    fn single_date_excludes_range() {
        let mut mixed = filter();
        mixed.single_date = NaiveDate::from_ymd_opt(2024, 1, 5);
        mixed.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        mixed.end_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert!(validate_filter(ReportType::Consumer, &mixed).is_err());

        let mut single = filter();
        single.single_date = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert!(validate_filter(ReportType::Consumer, &single).is_ok());
        let (from, to) = date_bounds(&single);
        assert_eq!(from, to);
        assert!(from.is_some());
    }

    #[test]
    fn settlement_requires_project() {
        assert!(validate_filter(ReportType::Settlement, &filter()).is_err());
        let mut with_project = filter();
        with_project.project_id = Some(Uuid::new_v4());
        assert!(validate_filter(ReportType::Settlement, &with_project).is_ok());
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(
            extension_for_content_type(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            "xlsx"
        );
        assert_eq!(extension_for_content_type("application/pdf"), "pdf");
        assert_eq!(extension_for_content_type("text/csv"), "csv");
        assert_eq!(extension_for_content_type("application/octet-stream"), "xlsx");
    }

    #[test]
    fn filename_is_stripped_of_quotes() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="r1.pdf""#),
            Some("r1.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=report.csv"),
            Some("report.csv".to_string())
        );
        assert_eq!(filename_from_disposition("attachment"), None);
    }

    #[test]
    fn unparsable_disposition_falls_back_to_report() {
        let file = resolve_download(Some("text/csv"), None);
        assert_eq!(file.file_name, "report.csv");

        let file = resolve_download(None, Some("attachment"));
        assert_eq!(file.file_name, "report.xlsx");
    }

    #[test]
    fn extension_is_not_double_appended() {
        let file = resolve_download(
            Some("application/pdf"),
            Some(r#"attachment; filename="r1.pdf""#),
        );
        assert_eq!(file.file_name, "r1.pdf");

        let file = resolve_download(
            Some("application/pdf"),
            Some(r#"attachment; filename="r1""#),
        );
        assert_eq!(file.file_name, "r1.pdf");
    }

    #[test]
    fn csv_serialization_includes_header() {
        let rows = vec![ConsumerReportRow {
            customer_no: "C-1".to_string(),
            name: "Иванов".to_string(),
            phone: "+79261234567".to_string(),
            flat_no: Some("101".to_string()),
            meter_serial: Some("GMS-1".to_string()),
            total_units: Some(Decimal::new(125, 1)),
        }];
        let bytes = write_csv(&rows).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("customer_no,name,phone,flat_no,meter_serial,total_units"));
        assert!(text.contains("C-1"));
    }
}
