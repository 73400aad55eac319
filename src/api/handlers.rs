use super::AppState;
use crate::error::AppResult;
use crate::models::{DocumentKind, Session};
use crate::render::{export_csv, write_pdf, ReportRenderer};
use crate::service::{AuditSummary, FieldRow, ReceiptSummary};
use axum::{
    extract::{Extension, Json, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// 请求体: 待修改的字段
#[derive(Debug, Deserialize)]
pub struct SaveFieldsRequest {
    pub data: IndexMap<String, Value>,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct SaveFieldsResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

/// 字段编辑器数据
#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub kind: DocumentKind,
    pub id: String,
    pub rows: Vec<FieldRow>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    let mut response = (StatusCode::OK, bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// 合同审计报告 (JSON)
pub async fn contract_audit(
    State(state): State<AppState>,
    Path(contract_id): Path<String>,
) -> AppResult<Json<AuditSummary>> {
    Ok(Json(state.reports.contract_summary(&contract_id).await?))
}

pub async fn contract_audit_html(
    State(state): State<AppState>,
    Path(contract_id): Path<String>,
) -> AppResult<Html<String>> {
    let summary = state.reports.contract_summary(&contract_id).await?;
    Ok(Html(state.html.contract_page(&summary)?))
}

/// 合同审计报告 PDF 下载
pub async fn contract_audit_pdf(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(contract_id): Path<String>,
) -> AppResult<Response> {
    let summary = state.reports.contract_summary(&contract_id).await?;
    let renderer = ReportRenderer::now();
    let document = renderer.contract_document(&summary);
    let bytes = write_pdf(&document)?;

    info!(
        "contract {} report generated for {}: {} pages, {} bytes",
        contract_id,
        session.user.as_deref().unwrap_or("-"),
        document.page_count(),
        bytes.len()
    );
    Ok(attachment(
        bytes,
        "application/pdf",
        &renderer.contract_filename(&contract_id),
    ))
}

pub async fn contract_audit_csv(
    State(state): State<AppState>,
    Path(contract_id): Path<String>,
) -> AppResult<Response> {
    let summary = state.reports.contract_summary(&contract_id).await?;
    let bytes = export_csv(&summary)?;
    Ok(attachment(
        bytes,
        "text/csv; charset=utf-8",
        &format!("Audit_Report_Contract_{}.csv", contract_id),
    ))
}

/// 单张发票审计 (JSON)
pub async fn receipt_audit(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> AppResult<Json<ReceiptSummary>> {
    Ok(Json(state.reports.receipt_summary(&receipt_id).await?))
}

pub async fn receipt_audit_html(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> AppResult<Html<String>> {
    let summary = state.reports.receipt_summary(&receipt_id).await?;
    Ok(Html(state.html.receipt_page(&summary)?))
}

pub async fn receipt_audit_pdf(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> AppResult<Response> {
    let summary = state.reports.receipt_summary(&receipt_id).await?;
    let renderer = ReportRenderer::now();
    let bytes = write_pdf(&renderer.receipt_document(&summary))?;
    info!("receipt {} report generated: {} bytes", receipt_id, bytes.len());
    Ok(attachment(bytes, "application/pdf", &renderer.receipt_filename()))
}

/// 原始文件透传
pub async fn original_file(
    State(state): State<AppState>,
    Path((kind, id)): Path<(DocumentKind, String)>,
) -> AppResult<Response> {
    let bytes = state.reports.original_file(kind, &id).await?;
    Ok(attachment(
        bytes,
        "application/pdf",
        &format!("{}_{}.pdf", kind.file_stem(), id),
    ))
}

pub async fn field_rows(
    State(state): State<AppState>,
    Path((kind, id)): Path<(DocumentKind, String)>,
) -> AppResult<Json<FieldsResponse>> {
    let rows = state.reports.field_rows(kind, &id).await?;
    Ok(Json(FieldsResponse { kind, id, rows }))
}

/// 保存字段修改 (空白值提交为 null)
pub async fn save_fields(
    State(state): State<AppState>,
    Path((kind, id)): Path<(DocumentKind, String)>,
    Json(req): Json<SaveFieldsRequest>,
) -> AppResult<Json<SaveFieldsResponse>> {
    let count = req.data.len();
    let data = state.reports.save_fields(kind, &id, req.data).await?;
    Ok(Json(SaveFieldsResponse {
        success: true,
        message: format!("Successfully saved {} fields", count),
        data,
    }))
}
