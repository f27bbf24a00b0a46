pub mod agents;
pub mod auth;
pub mod cities;
pub mod cost_configs;
pub mod customers;
pub mod flats;
pub mod floors;
pub mod invoices;
pub mod localities;
pub mod meter_logs;
pub mod meters;
pub mod payments;
pub mod projects;
pub mod reports;
pub mod templates;
pub mod towers;
pub mod users;
pub mod wings;

use crate::middleware::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/agents", agents::routes())
        .nest("/cities", cities::routes())
        .nest("/localities", localities::routes())
        .nest("/projects", projects::routes())
        .nest("/cost-configs", cost_configs::routes())
        .nest("/towers", towers::routes())
        .nest("/wings", wings::routes())
        .nest("/floors", floors::routes())
        .nest("/flats", flats::routes())
        .nest("/meters", meters::routes())
        .nest("/meter-logs", meter_logs::routes())
        .nest("/customers", customers::routes())
        .nest("/invoices", invoices::routes())
        .nest("/payments", payments::routes())
        .nest("/email-templates", templates::email_routes())
        .nest("/sms-templates", templates::sms_routes())
        .nest("/reports", reports::routes())
}
