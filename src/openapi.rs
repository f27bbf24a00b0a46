use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GMS API",
        version = "1.0.0",
        description = "Backend API для GMS - учёт газовых счётчиков, абонентов и платежей",
        contact(
            name = "GMS Team",
            email = "support@gms.example.com"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "auth", description = "Аутентификация и авторизация"),
        (name = "users", description = "Пользователи системы"),
        (name = "agents", description = "Агенты и их кошельки"),
        (name = "cities", description = "Города"),
        (name = "localities", description = "Районы"),
        (name = "projects", description = "Проекты (жилые комплексы)"),
        (name = "cost-configs", description = "Тарифные карты проектов"),
        (name = "towers", description = "Башни"),
        (name = "wings", description = "Крылья башен"),
        (name = "floors", description = "Этажи"),
        (name = "flats", description = "Квартиры и привязка счётчиков"),
        (name = "meters", description = "Газовые счётчики"),
        (name = "meter-logs", description = "Показания счётчиков"),
        (name = "customers", description = "Абоненты"),
        (name = "invoices", description = "Счета на оплату"),
        (name = "payments", description = "Платежи"),
        (name = "templates", description = "Шаблоны писем и SMS"),
        (name = "reports", description = "Отчёты")
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::refresh_token,
        crate::api::auth::logout,
        crate::api::auth::get_me,
        // Users
        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,
        // Agents
        crate::api::agents::list_agents,
        crate::api::agents::collect_money,
        crate::api::agents::get_wallet,
        // Cities
        crate::api::cities::list_cities,
        crate::api::cities::create_city,
        crate::api::cities::update_city,
        crate::api::cities::delete_city,
        // Localities
        crate::api::localities::list_localities,
        crate::api::localities::create_locality,
        crate::api::localities::update_locality,
        crate::api::localities::delete_locality,
        // Projects
        crate::api::projects::list_projects,
        crate::api::projects::create_project,
        crate::api::projects::update_project,
        crate::api::projects::delete_project,
        crate::api::projects::list_project_agents,
        crate::api::projects::assign_agent,
        crate::api::projects::unassign_agent,
        // Cost configs
        crate::api::cost_configs::list_cost_configs,
        crate::api::cost_configs::create_cost_config,
        crate::api::cost_configs::update_cost_config,
        crate::api::cost_configs::delete_cost_config,
        // Towers
        crate::api::towers::list_towers,
        crate::api::towers::create_tower,
        crate::api::towers::update_tower,
        crate::api::towers::delete_tower,
        crate::api::towers::resolve_wings,
        // Wings
        crate::api::wings::create_wing,
        crate::api::wings::update_wing,
        crate::api::wings::delete_wing,
        crate::api::wings::list_wing_floors,
        // Floors
        crate::api::floors::create_floor,
        crate::api::floors::update_floor,
        crate::api::floors::delete_floor,
        // Flats
        crate::api::flats::list_flats,
        crate::api::flats::list_available_flats,
        crate::api::flats::create_flat,
        crate::api::flats::update_flat,
        crate::api::flats::delete_flat,
        // Meters
        crate::api::meters::list_meters,
        crate::api::meters::list_available_meters,
        crate::api::meters::create_meter,
        crate::api::meters::update_meter,
        crate::api::meters::delete_meter,
        crate::api::meters::update_reading,
        crate::api::meters::upload_meter_image,
        // Meter logs
        crate::api::meter_logs::list_meter_logs,
        crate::api::meter_logs::create_meter_log,
        crate::api::meter_logs::update_meter_log_status,
        // Customers
        crate::api::customers::list_customers,
        crate::api::customers::create_customer,
        crate::api::customers::update_customer,
        crate::api::customers::delete_customer,
        crate::api::customers::import_customers,
        crate::api::customers::import_template,
        // Invoices
        crate::api::invoices::list_invoices,
        crate::api::invoices::get_invoice,
        crate::api::invoices::create_invoice,
        crate::api::invoices::update_invoice,
        crate::api::invoices::delete_invoice,
        // Payments
        crate::api::payments::list_payments,
        crate::api::payments::create_payment,
        // Templates
        crate::api::templates::list_email_templates,
        crate::api::templates::create_email_template,
        crate::api::templates::update_email_template,
        crate::api::templates::delete_email_template,
        crate::api::templates::preview_email_template,
        crate::api::templates::list_sms_templates,
        crate::api::templates::create_sms_template,
        crate::api::templates::update_sms_template,
        crate::api::templates::delete_sms_template,
        crate::api::templates::preview_sms_template,
        // Reports
        crate::api::reports::generate_report,
        crate::api::reports::download_report,
    ),
    components(
        schemas(
            // Auth / users
            crate::models::UserRole,
            crate::models::UserPublic,
            crate::models::LoginRequest,
            crate::models::AuthResponse,
            crate::models::RefreshTokenRequest,
            crate::models::TokenResponse,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            crate::models::CollectMoneyRequest,
            crate::models::WalletResponse,
            crate::models::AgentWalletTransaction,
            // Geography
            crate::models::City,
            crate::models::CreateCityRequest,
            crate::models::UpdateCityRequest,
            crate::models::Locality,
            crate::models::CreateLocalityRequest,
            crate::models::UpdateLocalityRequest,
            // Projects
            crate::models::Project,
            crate::models::ProjectResponse,
            crate::models::CreateProjectRequest,
            crate::models::UpdateProjectRequest,
            crate::models::AssignAgentRequest,
            crate::models::CostConfiguration,
            crate::models::CreateCostConfigurationRequest,
            crate::models::UpdateCostConfigurationRequest,
            // Hierarchy
            crate::models::Tower,
            crate::models::TowerResponse,
            crate::models::CreateTowerRequest,
            crate::models::UpdateTowerRequest,
            crate::models::Wing,
            crate::models::CreateWingRequest,
            crate::models::UpdateWingRequest,
            crate::models::Floor,
            crate::models::CreateFloorRequest,
            crate::models::UpdateFloorRequest,
            crate::services::hierarchy::WingSelection,
            // Flats
            crate::models::Flat,
            crate::models::FlatResponse,
            crate::models::CreateFlatRequest,
            crate::models::UpdateFlatRequest,
            // Meters
            crate::models::MeterStatus,
            crate::models::ReadingStatus,
            crate::models::Meter,
            crate::models::MeterLog,
            crate::models::MeterLogResponse,
            crate::models::CreateMeterRequest,
            crate::models::UpdateMeterRequest,
            crate::models::UpdateReadingRequest,
            crate::models::CreateMeterLogRequest,
            crate::models::UpdateMeterLogStatusRequest,
            // Customers
            crate::models::Customer,
            crate::models::CreateCustomerRequest,
            crate::models::UpdateCustomerRequest,
            crate::models::ImportSummary,
            // Billing
            crate::models::InvoiceStatus,
            crate::models::PaymentStatus,
            crate::models::PaymentMethod,
            crate::models::Invoice,
            crate::models::InvoiceResponse,
            crate::models::CreateInvoiceRequest,
            crate::models::UpdateInvoiceRequest,
            crate::models::Payment,
            crate::models::CreatePaymentRequest,
            // Templates
            crate::models::EmailTemplateType,
            crate::models::SmsTemplateType,
            crate::models::EmailTemplate,
            crate::models::SmsTemplate,
            crate::models::CreateEmailTemplateRequest,
            crate::models::UpdateEmailTemplateRequest,
            crate::models::CreateSmsTemplateRequest,
            crate::models::UpdateSmsTemplateRequest,
            crate::models::PreviewTemplateRequest,
            crate::models::PreviewTemplateResponse,
            // Reports
            crate::models::ReportType,
            crate::models::ReportFilter,
            crate::models::Report,
            crate::models::GenerateReportResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
