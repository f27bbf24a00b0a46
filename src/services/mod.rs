pub mod assignment;
pub mod auth_service;
pub mod billing;
pub mod file_service;
pub mod hierarchy;
pub mod report;
pub mod template;

pub use auth_service::AuthService;
pub use file_service::FileService;
