use super::cursor::DocumentCursor;
use super::document::{
    text_width, wrap_text, Align, Document, Page, Rgb, TextStyle, Weight, PAGE_HEIGHT, PAGE_WIDTH,
    PT_TO_MM,
};
use super::text::{format_column_name, notes_column, safe_string};
use crate::models::value::format_number;
use crate::models::MismatchEntry;
use crate::service::aggregator::{format_fixed, format_money, AuditSummary, ReceiptSummary};
use chrono::{DateTime, Local, Utc};
use serde_json::Value;

const MARGIN_X: f32 = 10.0;
const CENTER_X: f32 = PAGE_WIDTH / 2.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

/// 续页正文起点
const CONTINUATION_TOP: f32 = 30.0;
/// 页脚上方保留区
const BOTTOM_MARGIN: f32 = 20.0;

const BODY_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = BODY_SIZE * PT_TO_MM * 1.15;
const CELL_PADDING: f32 = 2.0;
const BULLET_INDENT: f32 = 5.0;

const OVERCHARGE_HEADERS: [&str; 6] = [
    "Charge Type",
    "Invoice Rate",
    "Contract Rate",
    "Overcharge",
    "Quantity",
    "Total Overcharge",
];
const OVERCHARGE_WIDTHS: [f32; 6] = [38.0, 28.0, 28.0, 28.0, 28.0, 40.0];

/// 审计报告排版
#[derive(Debug, Clone, Copy)]
pub struct ReportRenderer {
    generated_at: DateTime<Utc>,
}

impl ReportRenderer {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self { generated_at }
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// `Audit_Report_Contract_<id>_<YYYY-MM-DD>.pdf`
    pub fn contract_filename(&self, contract_id: &str) -> String {
        format!(
            "Audit_Report_Contract_{}_{}.pdf",
            contract_id,
            self.generated_at.format("%Y-%m-%d")
        )
    }

    /// `Audit_Report_<YYYY-MM-DD>.pdf`
    pub fn receipt_filename(&self) -> String {
        format!("Audit_Report_{}.pdf", self.generated_at.format("%Y-%m-%d"))
    }

    fn local(&self) -> DateTime<Local> {
        self.generated_at.with_timezone(&Local)
    }

    /// 合同审计报告: 封面摘要 + 每张发票一页起
    pub fn contract_document(&self, summary: &AuditSummary) -> Document {
        let mut doc = Document::new(format!("Audit Report Contract {}", summary.contract_id));

        self.draw_header(&mut doc, &summary.contract_id);
        let mut y = self.draw_contract_details(&mut doc, summary);
        self.draw_report_summary(&mut doc, summary, &mut y);

        for receipt in &summary.receipts {
            doc.add_page();
            draw_receipt_title(&mut doc, &format!("Invoice ID: {}", receipt.receipt_id), 27.0, 14.0);

            let last = draw_receipt_sections(&mut doc, receipt, false);
            draw_total_line(
                &mut doc,
                &format!(
                    "Total Overpay for Invoice {}: {}",
                    receipt.receipt_id,
                    format_money(receipt.total_overpay)
                ),
                last,
                10.0,
                12.0,
            );
        }

        draw_footers(&mut doc);
        tracing::debug!(
            "Contract {} report laid out: {} receipts, {} pages",
            summary.contract_id,
            summary.receipts.len(),
            doc.page_count()
        );
        doc
    }

    /// 单张发票审计报告
    pub fn receipt_document(&self, receipt: &ReceiptSummary) -> Document {
        let mut doc = Document::new(format!("Audit Report Invoice {}", receipt.receipt_id));

        draw_receipt_title(
            &mut doc,
            &format!("Audit Report for invoice {}", receipt.receipt_id),
            20.0,
            18.0,
        );
        draw_receipt_title(
            &mut doc,
            &format!(
                "Invoice Number: {}",
                receipt.receipt_number.as_deref().unwrap_or("N/A")
            ),
            25.0,
            16.0,
        );

        let last = draw_receipt_sections(&mut doc, receipt, true);
        draw_total_line(
            &mut doc,
            &format!("Total Overpaid: {}", format_money(receipt.total_overpay)),
            last,
            15.0,
            14.0,
        );

        draw_footers(&mut doc);
        doc
    }

    fn draw_header(&self, doc: &mut Document, contract_id: &str) {
        let title = TextStyle::bold(32.0).centered();
        doc.text("provar", CENTER_X, 28.0, title);
        doc.text("Audit Results", CENTER_X, 40.0, title);

        let small = TextStyle::normal(12.0);
        doc.text("provar.io", MARGIN_X, 10.0, small);
        doc.text("fouroneone.io", PAGE_WIDTH - MARGIN_X, 10.0, small.right());
        doc.text(format!("Contract Number: {}", contract_id), MARGIN_X, 57.0, small);
        doc.text(
            format!("Date Generated: {}", self.local().format("%-m/%-d/%Y")),
            MARGIN_X,
            62.0,
            small,
        );

        doc.line(MARGIN_X, 70.0, PAGE_WIDTH - MARGIN_X, 70.0, 0.4, Rgb::NAVY);
    }

    /// 返回下一行位置
    fn draw_contract_details(&self, doc: &mut Document, summary: &AuditSummary) -> f32 {
        doc.text("Contract Details", 20.0, 85.0, TextStyle::bold(16.0));

        let meta = &summary.metadata;
        let na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        let rows = [
            ("Contract Number:", non_empty_or_na(&summary.contract_id)),
            ("Contract Name:", na(&meta.contract_name)),
            ("Contract Type:", na(&meta.contract_type)),
            ("Company:", na(&meta.company_name)),
            ("Created By:", non_empty_or_na(&meta.created_by)),
        ];

        let mut y = 95.0;
        for (label, value) in rows {
            draw_label_row(doc, label, &value, y);
            y += 8.0;
        }
        y
    }

    fn draw_report_summary(&self, doc: &mut Document, summary: &AuditSummary, y: &mut f32) {
        doc.text("Report Summary", 20.0, *y + 10.0, TextStyle::bold(16.0));

        let rows = [
            (
                "Generated On:",
                self.local().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            ),
            ("Total Containers:", format_number(summary.total_containers)),
            ("Total Contract Overpay:", format_money(summary.total_overpay)),
        ];

        *y += 20.0;
        for (label, value) in rows {
            draw_label_row(doc, label, &value, *y);
            *y += 8.0;
        }
    }
}

fn non_empty_or_na(value: &str) -> String {
    if value.is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

fn draw_label_row(doc: &mut Document, label: &str, value: &str, y: f32) {
    doc.text(label, 25.0, y, TextStyle::bold(12.0));
    doc.text(value, 80.0, y, TextStyle::normal(12.0));
}

fn draw_receipt_title(doc: &mut Document, text: &str, y: f32, size: f32) {
    doc.text(text, CENTER_X, y, TextStyle::bold(size).centered());
}

/// 页脚两行, 每页都有
fn draw_footers(doc: &mut Document) {
    let style = TextStyle::normal(10.0).centered();
    let height = doc.height;
    doc.for_each_page(|page: &mut Page| {
        page.text("Provar by FourOneOne, LLC", CENTER_X, height - 10.0 - 5.0, style);
        page.text("provar.io | fouroneone.io", CENTER_X, height - 10.0, style);
    });
}

/// 不一致项与超收表; 返回最后一个表格的结束位置
fn draw_receipt_sections(
    doc: &mut Document,
    receipt: &ReceiptSummary,
    always_headings: bool,
) -> Option<f32> {
    let mut cursor = DocumentCursor::new(PAGE_HEIGHT, CONTINUATION_TOP, BOTTOM_MARGIN);
    let mut last_table_end = None;

    if always_headings || !receipt.inconsistencies.is_empty() {
        draw_receipt_title(doc, "Invoice Inconsistencies", 35.0, 14.0);
        cursor.move_to(40.0);
        for entry in &receipt.inconsistencies {
            draw_inconsistency(doc, &mut cursor, entry);
        }
        last_table_end = Some(cursor.y());
    }

    if always_headings || !receipt.overcharges.is_empty() {
        // 标题, 表头和第一行放在同一页
        let first_row = receipt
            .overcharges
            .first()
            .map_or(0.0, |entry| row_height(&overcharge_cells(entry), Weight::Normal));
        let mut heading_y = last_table_end.map_or(35.0, |end| end + 10.0);
        let block = 5.0 + row_height(&OVERCHARGE_HEADERS, Weight::Bold) + first_row;
        if heading_y + block > cursor.limit() {
            doc.add_page();
            cursor.break_page();
            heading_y = cursor.y();
        }
        draw_receipt_title(doc, "Invoice Overcharges", heading_y, 14.0);
        cursor.move_to(heading_y + 5.0);

        draw_overcharge_header(doc, &mut cursor);
        for entry in &receipt.overcharges {
            let cells = overcharge_cells(entry);
            let height = row_height(&cells, Weight::Normal);
            if cursor.ensure(height) {
                doc.add_page();
                draw_overcharge_header(doc, &mut cursor);
            }
            draw_row(doc, &mut cursor, &cells, Weight::Normal, None);
        }
        last_table_end = Some(cursor.y());
    }

    last_table_end
}

/// 每条不一致项 2~3 行: 字段名 (粗体), 合同值/发票值, 说明 (可选)
fn draw_inconsistency(doc: &mut Document, cursor: &mut DocumentCursor, entry: &MismatchEntry) {
    let label = format_column_name(entry.key());
    let note = notes_column(entry.key().unwrap_or(""));

    let mut lines: Vec<(String, Weight)> = Vec::with_capacity(3);
    if !label.is_empty() {
        lines.push((format!("- {}", label), Weight::Bold));
    }
    lines.push((
        format!(
            "- Contract Value: {}, Invoice Value: {}",
            safe_string(entry.contract_value()),
            safe_string(entry.receipt_value())
        ),
        Weight::Normal,
    ));
    if !note.is_empty() {
        lines.push((format!("- Notes: {}", note), Weight::Normal));
    }

    let width = CONTENT_WIDTH - 2.0 * BULLET_INDENT;
    for (text, weight) in lines {
        let wrapped = wrap_text(&text, width, BODY_SIZE, weight);
        let height = wrapped.len() as f32 * LINE_HEIGHT + CELL_PADDING;
        if cursor.ensure(height) {
            doc.add_page();
        }

        let top = cursor.y();
        let style = TextStyle {
            weight,
            ..TextStyle::normal(BODY_SIZE)
        };
        for (i, line) in wrapped.into_iter().enumerate() {
            let baseline = top + (i as f32 + 1.0) * LINE_HEIGHT - 1.0;
            doc.text(line, MARGIN_X + BULLET_INDENT, baseline, style);
        }
        cursor.advance(height);
    }
}

fn overcharge_cells(entry: &MismatchEntry) -> Vec<String> {
    let (overpay, quantity) = match entry {
        MismatchEntry::Overcharge { overpay, quantity, .. } => (money_cell(overpay), safe_string(quantity)),
        MismatchEntry::Inconsistency { .. } => ("N/A".to_string(), "N/A".to_string()),
    };

    vec![
        non_empty_or_na(&format_column_name(entry.key())),
        money_cell(entry.receipt_value()),
        money_cell(entry.contract_value()),
        overpay,
        quantity,
        format_fixed(entry.total_overpay()),
    ]
}

/// 数值两位小数, 其它按原样
fn money_cell(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map(format_fixed).unwrap_or_else(|| safe_string(value)),
        other => safe_string(other),
    }
}

fn draw_overcharge_header(doc: &mut Document, cursor: &mut DocumentCursor) {
    let headers: Vec<String> = OVERCHARGE_HEADERS.iter().map(|h| h.to_string()).collect();
    draw_row(doc, cursor, &headers, Weight::Bold, Some(Rgb::LAVENDER));
}

fn cell_lines<S: AsRef<str>>(cell: S, width: f32, weight: Weight) -> Vec<String> {
    wrap_text(cell.as_ref(), width - 2.0 * CELL_PADDING, BODY_SIZE, weight)
}

fn row_height<S: AsRef<str>>(cells: &[S], weight: Weight) -> f32 {
    let lines = cells
        .iter()
        .zip(OVERCHARGE_WIDTHS)
        .map(|(cell, width)| cell_lines(cell, width, weight).len())
        .max()
        .unwrap_or(1);
    lines as f32 * LINE_HEIGHT + 2.0 * CELL_PADDING
}

/// 表格行: 单元格居中, 行底细线
fn draw_row(
    doc: &mut Document,
    cursor: &mut DocumentCursor,
    cells: &[String],
    weight: Weight,
    fill: Option<Rgb>,
) {
    let height = row_height(cells, weight);
    let top = cursor.y();

    if let Some(color) = fill {
        doc.fill_rect(MARGIN_X, top, CONTENT_WIDTH, height, color);
    }

    let style = TextStyle {
        weight,
        align: Align::Center,
        ..TextStyle::normal(BODY_SIZE)
    };
    let mut x = MARGIN_X;
    for (cell, width) in cells.iter().zip(OVERCHARGE_WIDTHS) {
        let lines = cell_lines(cell, width, weight);
        let block = lines.len() as f32 * LINE_HEIGHT;
        let first_top = top + (height - block) / 2.0;
        for (i, line) in lines.into_iter().enumerate() {
            let baseline = first_top + (i as f32 + 1.0) * LINE_HEIGHT - 1.0;
            doc.text(line, x + width / 2.0, baseline, style);
        }
        x += width;
    }

    doc.line(MARGIN_X, top + height, MARGIN_X + CONTENT_WIDTH, top + height, 0.1, Rgb::NAVY);
    cursor.advance(height);
}

/// 合计行; 放不下则换页并置于新页顶部
fn draw_total_line(doc: &mut Document, text: &str, last_table_end: Option<f32>, gap: f32, size: f32) {
    let limit = PAGE_HEIGHT - BOTTOM_MARGIN;
    let y = match last_table_end {
        Some(end) if end + gap + 10.0 > limit => {
            doc.add_page();
            20.0
        }
        Some(end) => end + gap,
        None => limit,
    };
    doc.text(text, CENTER_X, y, TextStyle::bold(size).centered());
}

/// 文字左边界 (按对齐方式换算)
pub fn aligned_left(x: f32, text: &str, size: f32, weight: Weight, align: Align) -> f32 {
    match align {
        Align::Left => x,
        Align::Center => x - text_width(text, size, weight) / 2.0,
        Align::Right => x - text_width(text, size, weight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::document::DrawOp;
    use crate::models::{
        ContractAuditRecord, ContractMetadata, RawMismatch, ReceiptAuditRecord, ZeroOverpayPolicy,
    };
    use crate::service::aggregator::QuantityParsePolicy;
    use crate::service::classifier::classify;
    use chrono::TimeZone;
    use serde_json::json;

    fn renderer() -> ReportRenderer {
        ReportRenderer::new(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap())
    }

    fn receipt(id: &str, mismatches: Value) -> ReceiptAuditRecord {
        let raw: Vec<Option<RawMismatch>> = mismatches
            .as_array()
            .unwrap()
            .iter()
            .map(|v| serde_json::from_value(v.clone()).ok())
            .collect();
        ReceiptAuditRecord {
            receipt_id: json!(id),
            receipt_number: None,
            mismatches: classify(&raw, ZeroOverpayPolicy::default()).into_entries(),
        }
    }

    fn summary(receipts: Vec<ReceiptAuditRecord>) -> AuditSummary {
        let contract = ContractAuditRecord {
            contract_id: "C-17".to_string(),
            metadata: ContractMetadata {
                contract_name: Some("Ocean Freight 2024".to_string()),
                contract_type: None,
                company_name: Some("Acme Shipping".to_string()),
                created_by: "Dana".to_string(),
            },
            receipts,
        };
        AuditSummary::build(&contract, QuantityParsePolicy::Propagate)
    }

    #[test]
    fn filenames_use_report_date() {
        let r = renderer();
        assert_eq!(r.contract_filename("C-17"), "Audit_Report_Contract_C-17_2024-03-09.pdf");
        assert_eq!(r.receipt_filename(), "Audit_Report_2024-03-09.pdf");
    }

    #[test]
    fn empty_contract_renders_cover_only() {
        let doc = renderer().contract_document(&summary(vec![]));
        assert_eq!(doc.page_count(), 1);
        let cover = &doc.pages[0];
        assert!(cover.contains_text("Audit Results"));
        assert!(cover.contains_text("Contract Number: C-17"));
        assert!(cover.contains_text("Total Contract Overpay:"));
        assert!(cover.texts().any(|t| t == "$0.00"));
        assert!(cover.texts().any(|t| t == "0"));
        assert!(cover.contains_text("Provar by FourOneOne, LLC"));
        assert!(!doc.contains_text("Invoice ID:"));
    }

    #[test]
    fn missing_metadata_renders_placeholder() {
        let doc = renderer().contract_document(&summary(vec![]));
        let texts: Vec<&str> = doc.pages[0].texts().collect();
        let type_idx = texts.iter().position(|t| *t == "Contract Type:").unwrap();
        assert_eq!(texts[type_idx + 1], "N/A");
    }

    #[test]
    fn each_receipt_starts_a_new_page_with_footer() {
        let doc = renderer().contract_document(&summary(vec![
            receipt("R-1", json!([{"key": "payment_due_date", "receipt_value": "2024-01-10", "contract_value": "2024-02-10"}])),
            receipt("R-2", json!([{"key": "freight_rate", "receipt_value": 100, "contract_value": 90,
                                   "overpay": 10, "quantity": 10, "total_overpay": 100}])),
        ]));
        assert_eq!(doc.page_count(), 3);
        assert!(doc.pages[1].contains_text("Invoice ID: R-1"));
        assert!(doc.pages[1].contains_text("- Payment Due Date"));
        assert!(doc.pages[1].contains_text("- Contract Value: 2024-02-10, Invoice Value: 2024-01-10"));
        assert!(doc.pages[1].contains_text("- Notes: Payment terms are too short"));
        assert!(doc.pages[1].contains_text("Total Overpay for Invoice R-1: $0.00"));
        assert!(!doc.pages[1].contains_text("Invoice Overcharges"));

        assert!(doc.pages[2].contains_text("Invoice Overcharges"));
        assert!(!doc.pages[2].contains_text("Invoice Inconsistencies"));
        assert!(doc.pages[2].texts().any(|t| t == "Freight Rate"));
        assert!(doc.pages[2].texts().any(|t| t == "100.00"));
        assert!(doc.pages[2].contains_text("Total Overpay for Invoice R-2: $100.00"));

        for page in &doc.pages {
            assert!(page.contains_text("provar.io | fouroneone.io"));
        }
    }

    #[test]
    fn long_overcharge_table_continues_with_repeated_header() {
        let rows: Vec<Value> = (0..40)
            .map(|i| json!({"key": format!("charge_{}", i), "receipt_value": 10, "contract_value": 5,
                            "overpay": 5, "quantity": 2, "total_overpay": 10}))
            .collect();
        let doc = renderer().contract_document(&summary(vec![receipt("R-9", Value::Array(rows))]));

        assert!(doc.page_count() > 2);
        let header_pages = doc
            .pages
            .iter()
            .filter(|p| p.texts().any(|t| t == "Total Overcharge"))
            .count();
        assert_eq!(header_pages, doc.page_count() - 1);
        assert!(doc.contains_text("Total Overpay for Invoice R-9: $400.00"));
    }

    #[test]
    fn total_line_moves_to_new_page_when_space_runs_out() {
        assert_eq!(
            {
                let mut doc = Document::new("t");
                draw_total_line(&mut doc, "Total", Some(270.0), 10.0, 12.0);
                doc.page_count()
            },
            2
        );

        let mut doc = Document::new("t");
        draw_total_line(&mut doc, "Total", Some(100.0), 10.0, 12.0);
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn single_invoice_report_always_has_both_sections() {
        let audit = crate::models::ReceiptAudit {
            receipt_id: "55".to_string(),
            invoice_number: Some("INV-0042".to_string()),
            mismatches: vec![],
        };
        let doc = renderer().receipt_document(&ReceiptSummary::from_audit(&audit));
        assert!(doc.contains_text("Audit Report for invoice 55"));
        assert!(doc.contains_text("Invoice Number: INV-0042"));
        assert!(doc.contains_text("Invoice Inconsistencies"));
        assert!(doc.contains_text("Invoice Overcharges"));
        assert!(doc.contains_text("Total Overpaid: $0.00"));

        let number_y = doc.pages[0].ops.iter().find_map(|op| match op {
            DrawOp::Text { text, y, .. } if text.starts_with("Invoice Number:") => Some(*y),
            _ => None,
        });
        assert_eq!(number_y, Some(25.0));
    }

    #[test]
    fn overcharge_header_never_left_without_a_row() {
        let overcharge = json!({"key": "freight_rate", "receipt_value": 100, "contract_value": 90,
                                "overpay": 10, "quantity": 3, "total_overpay": 30});
        for plain in 0..40 {
            for noted in 0..2 {
                let mut rows: Vec<Value> = (0..plain)
                    .map(|_| json!({"key": "vessel_name", "receipt_value": "A", "contract_value": "B"}))
                    .collect();
                rows.extend((0..noted).map(|_| {
                    json!({"key": "payment_due_date", "receipt_value": "2024-01-10", "contract_value": "2024-02-10"})
                }));
                rows.push(overcharge.clone());

                let receipt = summary(vec![receipt("R-3", Value::Array(rows))]).receipts.remove(0);
                let doc = renderer().receipt_document(&receipt);
                for page in &doc.pages {
                    if page.texts().any(|t| t == "Total Overcharge") {
                        assert!(
                            page.texts().any(|t| t == "Freight Rate"),
                            "header without row ({} plain, {} noted)",
                            plain,
                            noted
                        );
                    }
                    if page.contains_text("Invoice Overcharges") {
                        assert!(page.texts().any(|t| t == "Total Overcharge"));
                    }
                }
            }
        }
    }

    #[test]
    fn alignment_offsets() {
        let w = text_width("abc", 10.0, Weight::Normal);
        assert_eq!(aligned_left(100.0, "abc", 10.0, Weight::Normal, Align::Left), 100.0);
        assert_eq!(aligned_left(100.0, "abc", 10.0, Weight::Normal, Align::Right), 100.0 - w);
        assert_eq!(aligned_left(100.0, "abc", 10.0, Weight::Normal, Align::Center), 100.0 - w / 2.0);
    }
}
