use super::text::{format_column_name, safe_string};
use crate::error::{AppError, AppResult};
use crate::models::MismatchEntry;
use crate::service::aggregator::{format_fixed, AuditSummary};
use serde::Serialize;

/// 导出行: 每条比对项一行
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    receipt_id: &'a str,
    kind: &'static str,
    field: String,
    invoice_value: String,
    contract_value: String,
    overpay: String,
    quantity: String,
    total_overpay: String,
}

fn row<'a>(receipt_id: &'a str, entry: &MismatchEntry) -> CsvRow<'a> {
    let (kind, overpay, quantity, total_overpay) = match entry {
        MismatchEntry::Overcharge { overpay, quantity, total_overpay, .. } => (
            "overcharge",
            safe_string(overpay),
            safe_string(quantity),
            format_fixed(*total_overpay),
        ),
        MismatchEntry::Inconsistency { .. } => {
            ("inconsistency", String::new(), String::new(), String::new())
        }
    };

    CsvRow {
        receipt_id,
        kind,
        field: format_column_name(entry.key()),
        invoice_value: safe_string(entry.receipt_value()),
        contract_value: safe_string(entry.contract_value()),
        overpay,
        quantity,
        total_overpay,
    }
}

/// 合同审计明细导出 (先不一致项, 后超收项, 与报告分组一致)
pub fn export_csv(summary: &AuditSummary) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for receipt in &summary.receipts {
        let entries = receipt.inconsistencies.iter().chain(&receipt.overcharges);
        for entry in entries {
            writer.serialize(row(&receipt.receipt_id, entry))?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Render(format!("csv flush failed: {}", e)))
}
