use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin_or_higher, AppState, AuthUser};
use crate::models::{
    CreateEmailTemplateRequest, CreateSmsTemplateRequest, EmailTemplate, PreviewTemplateRequest,
    PreviewTemplateResponse, SmsTemplate, UpdateEmailTemplateRequest, UpdateSmsTemplateRequest,
};
use crate::response::ApiResponse;
use crate::services::template;

pub fn email_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_email_templates).post(create_email_template))
        .route(
            "/:id",
            axum::routing::put(update_email_template).delete(delete_email_template),
        )
        .route("/:id/preview", axum::routing::post(preview_email_template))
}

pub fn sms_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sms_templates).post(create_sms_template))
        .route(
            "/:id",
            axum::routing::put(update_sms_template).delete(delete_sms_template),
        )
        .route("/:id/preview", axum::routing::post(preview_sms_template))
}

fn invalid_vars_error(invalid: Vec<String>) -> AppError {
    AppError::Validation(format!(
        "Недопустимые переменные шаблона: {}",
        invalid.join(", ")
    ))
}

/// Список email-шаблонов
#[utoipa::path(
    get,
    path = "/api/v1/email-templates",
    tag = "templates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Email-шаблоны", body = Vec<EmailTemplate>)
    )
)]
pub async fn list_email_templates(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<EmailTemplate>>>> {
    let templates = sqlx::query_as::<_, EmailTemplate>(
        "SELECT * FROM email_templates ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok(templates))
}

/// Создание email-шаблона. Переменные проверяются по белому списку типа.
#[utoipa::path(
    post,
    path = "/api/v1/email-templates",
    tag = "templates",
    security(("bearer_auth" = [])),
    request_body = CreateEmailTemplateRequest,
    responses(
        (status = 200, description = "Шаблон создан", body = EmailTemplate),
        (status = 422, description = "Недопустимые переменные")
    )
)]
pub async fn create_email_template(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateEmailTemplateRequest>,
) -> AppResult<Json<ApiResponse<EmailTemplate>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    template::validate_email_template(
        payload.template_type,
        &payload.subject,
        &payload.body,
        payload.html_body.as_deref(),
    )
    .map_err(invalid_vars_error)?;

    let created = sqlx::query_as::<_, EmailTemplate>(
        r#"
        INSERT INTO email_templates (template_type, name, subject, body, html_body)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(payload.template_type)
    .bind(&payload.name)
    .bind(&payload.subject)
    .bind(&payload.body)
    .bind(&payload.html_body)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Шаблон создан", created))
}

/// Обновление email-шаблона с повторной проверкой переменных
#[utoipa::path(
    put,
    path = "/api/v1/email-templates/{id}",
    tag = "templates",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID шаблона")),
    request_body = UpdateEmailTemplateRequest,
    responses(
        (status = 200, description = "Шаблон обновлён", body = EmailTemplate),
        (status = 404, description = "Шаблон не найден"),
        (status = 422, description = "Недопустимые переменные")
    )
)]
pub async fn update_email_template(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmailTemplateRequest>,
) -> AppResult<Json<ApiResponse<EmailTemplate>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let current = sqlx::query_as::<_, EmailTemplate>(
        "SELECT * FROM email_templates WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Шаблон не найден".to_string()))?;

    let subject = payload.subject.as_deref().unwrap_or(&current.subject);
    let body = payload.body.as_deref().unwrap_or(&current.body);
    let html_body = payload
        .html_body
        .as_deref()
        .or(current.html_body.as_deref());

    template::validate_email_template(current.template_type, subject, body, html_body)
        .map_err(invalid_vars_error)?;

    let updated = sqlx::query_as::<_, EmailTemplate>(
        r#"
        UPDATE email_templates
        SET name = COALESCE($1, name),
            subject = COALESCE($2, subject),
            body = COALESCE($3, body),
            html_body = COALESCE($4, html_body),
            updated_at = NOW()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.subject)
    .bind(&payload.body)
    .bind(&payload.html_body)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::ok(updated))
}

/// Удаление email-шаблона
#[utoipa::path(
    delete,
    path = "/api/v1/email-templates/{id}",
    tag = "templates",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID шаблона")),
    responses(
        (status = 200, description = "Шаблон удалён"),
        (status = 404, description = "Шаблон не найден")
    )
)]
pub async fn delete_email_template(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM email_templates WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Шаблон не найден".to_string()));
    }

    Ok(ApiResponse::message("Шаблон удалён"))
}

/// Предпросмотр email-шаблона с подстановкой значений
#[utoipa::path(
    post,
    path = "/api/v1/email-templates/{id}/preview",
    tag = "templates",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID шаблона")),
    request_body = PreviewTemplateRequest,
    responses(
        (status = 200, description = "Предпросмотр", body = PreviewTemplateResponse),
        (status = 404, description = "Шаблон не найден")
    )
)]
pub async fn preview_email_template(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PreviewTemplateRequest>,
) -> AppResult<Json<ApiResponse<PreviewTemplateResponse>>> {
    let tpl = sqlx::query_as::<_, EmailTemplate>("SELECT * FROM email_templates WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Шаблон не найден".to_string()))?;

    Ok(ApiResponse::ok(PreviewTemplateResponse {
        subject: Some(template::render(&tpl.subject, &payload.variables)),
        body: template::render(&tpl.body, &payload.variables),
    }))
}

/// Список SMS-шаблонов
#[utoipa::path(
    get,
    path = "/api/v1/sms-templates",
    tag = "templates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "SMS-шаблоны", body = Vec<SmsTemplate>)
    )
)]
pub async fn list_sms_templates(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<SmsTemplate>>>> {
    let templates =
        sqlx::query_as::<_, SmsTemplate>("SELECT * FROM sms_templates ORDER BY created_at DESC")
            .fetch_all(&state.pool)
            .await?;

    Ok(ApiResponse::ok(templates))
}

/// Создание SMS-шаблона
#[utoipa::path(
    post,
    path = "/api/v1/sms-templates",
    tag = "templates",
    security(("bearer_auth" = [])),
    request_body = CreateSmsTemplateRequest,
    responses(
        (status = 200, description = "Шаблон создан", body = SmsTemplate),
        (status = 422, description = "Недопустимые переменные")
    )
)]
pub async fn create_sms_template(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateSmsTemplateRequest>,
) -> AppResult<Json<ApiResponse<SmsTemplate>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    template::validate_sms_template(payload.template_type, &payload.message)
        .map_err(invalid_vars_error)?;

    let created = sqlx::query_as::<_, SmsTemplate>(
        r#"
        INSERT INTO sms_templates (template_type, name, message)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(payload.template_type)
    .bind(&payload.name)
    .bind(&payload.message)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::with_message("Шаблон создан", created))
}

/// Обновление SMS-шаблона
#[utoipa::path(
    put,
    path = "/api/v1/sms-templates/{id}",
    tag = "templates",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID шаблона")),
    request_body = UpdateSmsTemplateRequest,
    responses(
        (status = 200, description = "Шаблон обновлён", body = SmsTemplate),
        (status = 404, description = "Шаблон не найден"),
        (status = 422, description = "Недопустимые переменные")
    )
)]
pub async fn update_sms_template(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSmsTemplateRequest>,
) -> AppResult<Json<ApiResponse<SmsTemplate>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let current = sqlx::query_as::<_, SmsTemplate>("SELECT * FROM sms_templates WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Шаблон не найден".to_string()))?;

    let message = payload.message.as_deref().unwrap_or(&current.message);
    template::validate_sms_template(current.template_type, message)
        .map_err(invalid_vars_error)?;

    let updated = sqlx::query_as::<_, SmsTemplate>(
        r#"
        UPDATE sms_templates
        SET name = COALESCE($1, name),
            message = COALESCE($2, message),
            updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.message)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::ok(updated))
}

/// Удаление SMS-шаблона
#[utoipa::path(
    delete,
    path = "/api/v1/sms-templates/{id}",
    tag = "templates",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID шаблона")),
    responses(
        (status = 200, description = "Шаблон удалён"),
        (status = 404, description = "Шаблон не найден")
    )
)]
pub async fn delete_sms_template(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if !is_admin_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM sms_templates WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Шаблон не найден".to_string()));
    }

    Ok(ApiResponse::message("Шаблон удалён"))
}

/// Предпросмотр SMS-шаблона
#[utoipa::path(
    post,
    path = "/api/v1/sms-templates/{id}/preview",
    tag = "templates",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID шаблона")),
    request_body = PreviewTemplateRequest,
    responses(
        (status = 200, description = "Предпросмотр", body = PreviewTemplateResponse),
        (status = 404, description = "Шаблон не найден")
    )
)]
pub async fn preview_sms_template(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PreviewTemplateRequest>,
) -> AppResult<Json<ApiResponse<PreviewTemplateResponse>>> {
    let tpl = sqlx::query_as::<_, SmsTemplate>("SELECT * FROM sms_templates WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Шаблон не найден".to_string()))?;

    Ok(ApiResponse::ok(PreviewTemplateResponse {
        subject: None,
        body: template::render(&tpl.message, &payload.variables),
    }))
}
