pub mod guard;
pub mod handlers;

pub use guard::{require_role, RouteGuard};
pub use handlers::*;

use crate::error::AppResult;
use crate::render::HtmlRenderer;
use crate::service::AuditReportService;
use axum::{
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub reports: AuditReportService,
    pub html: Arc<HtmlRenderer>,
    pub guard: RouteGuard,
}

impl AppState {
    pub fn new(reports: AuditReportService, guard: RouteGuard) -> AppResult<Self> {
        Ok(Self {
            reports,
            html: Arc::new(HtmlRenderer::new()?),
            guard,
        })
    }
}

/// 构建路由; `/health` 以外的接口都经过角色守卫
pub fn router(state: AppState) -> Router {
    let reports = Router::new()
        .route("/api/contracts/:id/audit", get(contract_audit))
        .route("/api/contracts/:id/audit.html", get(contract_audit_html))
        .route("/api/contracts/:id/audit.pdf", get(contract_audit_pdf))
        .route("/api/contracts/:id/audit.csv", get(contract_audit_csv))
        .route("/api/receipts/:id/audit", get(receipt_audit))
        .route("/api/receipts/:id/audit.html", get(receipt_audit_html))
        .route("/api/receipts/:id/audit.pdf", get(receipt_audit_pdf))
        .route("/api/documents/:kind/:id/file", get(original_file))
        .route(
            "/api/documents/:kind/:id/fields",
            get(field_rows).patch(save_fields),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_role));

    Router::new()
        .route("/health", get(health_check))
        .merge(reports)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
