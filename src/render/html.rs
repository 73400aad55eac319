use super::text::{format_column_name, notes_column, or_na};
use crate::error::AppResult;
use crate::models::value::{as_number, format_number, is_truthy};
use crate::models::MismatchEntry;
use crate::service::aggregator::{format_fixed, format_money, AuditSummary, ReceiptSummary};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;

const TEMPLATE_NAME: &str = "audit_report";
const TEMPLATE: &str = include_str!("templates/audit_report.hbs");

#[derive(Debug, Serialize)]
struct HtmlReport {
    title: String,
    subtitle: Option<String>,
    receipts: Vec<HtmlReceipt>,
    summary_title: &'static str,
    summary: Vec<HtmlSummaryRow>,
}

#[derive(Debug, Serialize)]
struct HtmlReceipt {
    heading: Option<String>,
    inconsistencies: Vec<HtmlInconsistency>,
    overcharges: Vec<HtmlOvercharge>,
}

#[derive(Debug, Serialize)]
struct HtmlInconsistency {
    label: String,
    invoice_value: String,
    contract_value: String,
    note: &'static str,
}

#[derive(Debug, Serialize)]
struct HtmlOvercharge {
    label: String,
    invoice_value: String,
    contract_value: String,
    overpay: String,
    overpay_class: &'static str,
    quantity: String,
    total_overpay: String,
    total_class: &'static str,
}

#[derive(Debug, Serialize)]
struct HtmlSummaryRow {
    label: &'static str,
    value: String,
}

/// 正数 (超收) 标红, 其它标绿
fn sign_class(amount: Option<f64>) -> &'static str {
    match amount {
        Some(a) if a > 0.0 => "positive",
        _ => "negative",
    }
}

fn dash_if_falsy(value: &Value) -> String {
    if is_truthy(value) {
        crate::models::value::display_value(value)
    } else {
        "-".to_string()
    }
}

impl HtmlReceipt {
    fn build(receipt: &ReceiptSummary, heading: Option<String>) -> Self {
        let inconsistencies = receipt
            .inconsistencies
            .iter()
            .map(|m| HtmlInconsistency {
                label: format_column_name(m.key()),
                invoice_value: or_na(m.receipt_value()),
                contract_value: or_na(m.contract_value()),
                note: notes_column(m.key().unwrap_or("")),
            })
            .collect();

        let overcharges = receipt
            .overcharges
            .iter()
            .filter_map(|m| match m {
                MismatchEntry::Overcharge { overpay, quantity, total_overpay, .. } => {
                    Some(HtmlOvercharge {
                        label: format_column_name(m.key()),
                        invoice_value: or_na(m.receipt_value()),
                        contract_value: or_na(m.contract_value()),
                        overpay: dash_if_falsy(overpay),
                        overpay_class: sign_class(as_number(overpay)),
                        quantity: dash_if_falsy(quantity),
                        total_overpay: format_fixed(*total_overpay),
                        total_class: sign_class(Some(*total_overpay)),
                    })
                }
                MismatchEntry::Inconsistency { .. } => None,
            })
            .collect();

        Self {
            heading,
            inconsistencies,
            overcharges,
        }
    }
}

/// 页面渲染器, 模板在构造时注册一次
pub struct HtmlRenderer {
    registry: Handlebars<'static>,
}

impl HtmlRenderer {
    pub fn new() -> AppResult<Self> {
        let mut registry = Handlebars::new();
        registry.register_template_string(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { registry })
    }

    pub fn contract_page(&self, summary: &AuditSummary) -> AppResult<String> {
        let report = HtmlReport {
            title: format!("Audit Report for Contract {}", summary.contract_id),
            subtitle: summary.metadata.contract_name.clone(),
            receipts: summary
                .receipts
                .iter()
                .map(|r| HtmlReceipt::build(r, Some(format!("Invoice ID: {}", r.receipt_id))))
                .collect(),
            summary_title: "Total Summary",
            summary: vec![
                HtmlSummaryRow {
                    label: "Total Containers:",
                    value: format_number(summary.total_containers),
                },
                HtmlSummaryRow {
                    label: "Total Overpay for Contract:",
                    value: format_money(summary.total_overpay),
                },
            ],
        };
        Ok(self.registry.render(TEMPLATE_NAME, &report)?)
    }

    pub fn receipt_page(&self, receipt: &ReceiptSummary) -> AppResult<String> {
        let report = HtmlReport {
            title: format!("Audit Report for receipt {}", receipt.receipt_id),
            subtitle: receipt
                .receipt_number
                .as_ref()
                .map(|n| format!("Invoice Number: {}", n)),
            receipts: vec![HtmlReceipt::build(receipt, None)],
            summary_title: "Total Overpaid:",
            summary: vec![HtmlSummaryRow {
                label: "",
                value: format_money(receipt.total_overpay),
            }],
        };
        Ok(self.registry.render(TEMPLATE_NAME, &report)?)
    }
}
