pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod service;

pub use api::{router, AppState, RouteGuard};
pub use client::BackendClient;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use service::AuditReportService;
