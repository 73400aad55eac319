use super::aggregator::{AuditSummary, ReceiptSummary};
use super::classifier::classify;
use super::field_editor::{FieldEditor, FieldRow};
use crate::client::BackendClient;
use crate::config::ReportConfig;
use crate::error::AppResult;
use crate::models::value::{display_value, is_truthy, lenient_list};
use crate::models::{
    ContractAuditRecord, ContractMetadata, DocumentKind, ExtractedRecord, RawContractMetadata,
    RawMismatch, RawReceiptRecord, ReceiptAudit, ReceiptAuditRecord, SchemaField,
    ZeroOverpayPolicy,
};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;

/// 审计报告服务: 拉取后端比对数据并归类、汇总
#[derive(Clone)]
pub struct AuditReportService {
    client: BackendClient,
    report: ReportConfig,
}

impl AuditReportService {
    pub fn new(client: BackendClient, report: ReportConfig) -> Self {
        Self { client, report }
    }

    /// 合同下所有发票的比对结果
    pub async fn contract_audit(&self, contract_id: &str) -> AppResult<ContractAuditRecord> {
        let body: Value = self
            .client
            .post_json("contract/getmismatchedcols", &json!({ "contract_id": contract_id }))
            .await?;
        let record = parse_contract_audit(contract_id, body, self.report.zero_overpay);
        info!(
            "contract {} audit fetched: {} receipts",
            contract_id,
            record.receipts.len()
        );
        Ok(record)
    }

    pub async fn contract_summary(&self, contract_id: &str) -> AppResult<AuditSummary> {
        let record = self.contract_audit(contract_id).await?;
        Ok(AuditSummary::build(&record, self.report.unparsable_quantity))
    }

    /// 单张发票的比对结果
    pub async fn receipt_audit(&self, receipt_id: &str) -> AppResult<ReceiptAudit> {
        let body: Value = self
            .client
            .post_json("receipt/getmismatchedcols", &json!({ "receipt_id": receipt_id }))
            .await?;
        Ok(parse_receipt_audit(receipt_id, body, self.report.zero_overpay))
    }

    pub async fn receipt_summary(&self, receipt_id: &str) -> AppResult<ReceiptSummary> {
        let audit = self.receipt_audit(receipt_id).await?;
        Ok(ReceiptSummary::from_audit(&audit))
    }

    /// 记录与 schema 并发拉取
    pub async fn field_editor(&self, kind: DocumentKind, id: &str) -> AppResult<FieldEditor> {
        let record_path = format!("{}/id/{}", kind.path(), id);
        let schema_path = format!("{}/schema/{}", kind.path(), id);
        let (record, schema): (ExtractedRecord, Vec<SchemaField>) = futures::try_join!(
            self.client.get_json(&record_path),
            self.client.get_json(&schema_path),
        )?;
        Ok(FieldEditor::new(&record, &schema))
    }

    pub async fn field_rows(&self, kind: DocumentKind, id: &str) -> AppResult<Vec<FieldRow>> {
        Ok(self.field_editor(kind, id).await?.rows())
    }

    /// 合并修改后提交 `PATCH /contract` 或 `PATCH /receipt`
    pub async fn save_fields(
        &self,
        kind: DocumentKind,
        id: &str,
        updates: IndexMap<String, Value>,
    ) -> AppResult<Value> {
        let mut editor = self.field_editor(kind, id).await?;
        let changed = updates.len();
        for (key, value) in updates {
            editor.set(key, value);
        }

        let payload = editor.into_payload();
        let saved = self.client.patch_json(kind.path(), &payload).await?;
        info!("{} {} saved: {} fields changed", kind.path(), id, changed);
        Ok(saved)
    }

    /// 原始 PDF
    pub async fn original_file(&self, kind: DocumentKind, id: &str) -> AppResult<Vec<u8>> {
        self.client
            .get_bytes(&format!("{}/file/{}", kind.path(), id))
            .await
    }
}

fn split_pair(body: Value) -> (Value, Value) {
    match body {
        Value::Array(items) => {
            let mut items = items.into_iter();
            (
                items.next().unwrap_or(Value::Null),
                items.next().unwrap_or(Value::Null),
            )
        }
        _ => (Value::Null, Value::Null),
    }
}

fn lenient_items<T: DeserializeOwned>(value: Value) -> Vec<Option<T>> {
    lenient_list::<Value, T>(value).unwrap_or_default()
}

fn receipt_record(raw: RawReceiptRecord, policy: ZeroOverpayPolicy) -> ReceiptAuditRecord {
    ReceiptAuditRecord {
        receipt_number: is_truthy(&raw.receipt_number).then(|| display_value(&raw.receipt_number)),
        mismatches: classify(&raw.mismatches, policy).into_entries(),
        receipt_id: raw.receipt_id,
    }
}

/// 解析 `[receipts[], metadata]`; 形状不符时得到空报告
pub fn parse_contract_audit(
    contract_id: &str,
    body: Value,
    policy: ZeroOverpayPolicy,
) -> ContractAuditRecord {
    let (receipts, metadata) = split_pair(body);

    let receipts = lenient_items::<RawReceiptRecord>(receipts)
        .into_iter()
        .flatten()
        .map(|raw| receipt_record(raw, policy))
        .collect();
    let metadata: RawContractMetadata = serde_json::from_value(metadata).unwrap_or_default();

    ContractAuditRecord {
        contract_id: contract_id.to_string(),
        metadata: ContractMetadata::from(metadata),
        receipts,
    }
}

/// 解析 `[mismatches[], { value }]`; 第一项也可能是 `{ col: [...] }`
pub fn parse_receipt_audit(
    receipt_id: &str,
    body: Value,
    policy: ZeroOverpayPolicy,
) -> ReceiptAudit {
    let (mismatches, number) = split_pair(body);

    let mismatches = match mismatches {
        Value::Object(mut obj) => obj.remove("col").unwrap_or(Value::Null),
        other => other,
    };
    let raw = lenient_items::<RawMismatch>(mismatches);

    let invoice_number = number
        .get("value")
        .filter(|v| is_truthy(v))
        .map(display_value);

    ReceiptAudit {
        receipt_id: receipt_id.to_string(),
        invoice_number,
        mismatches: classify(&raw, policy).into_entries(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MismatchEntry;

    #[test]
    fn parses_contract_response_pair() {
        let body = json!([
            [
                {
                    "receipt_id": 41,
                    "receipt_number": "INV-41",
                    "mismatches": [
                        {"key": "freight_rate", "receipt_value": 100, "contract_value": 90,
                         "overpay": 10, "quantity": 10, "total_overpay": 100},
                        null,
                        {"key": "vessel_name", "receipt_value": "A", "contract_value": "B"}
                    ]
                },
                null,
                {"receipt_id": 42, "mismatches": null}
            ],
            {"contract_name": "Ocean 2024", "contract_type": "shipping",
             "company_name": "Acme", "user": {"name": "Dana"}}
        ]);

        let record = parse_contract_audit("7", body, ZeroOverpayPolicy::default());
        assert_eq!(record.contract_id, "7");
        assert_eq!(record.receipts.len(), 2);
        assert_eq!(record.receipts[0].receipt_number.as_deref(), Some("INV-41"));
        assert_eq!(record.receipts[0].mismatches.len(), 2);
        assert!(record.receipts[0].mismatches[0].is_overcharge());
        assert!(!record.receipts[0].mismatches[1].is_overcharge());
        assert!(record.receipts[1].mismatches.is_empty());
        assert_eq!(record.metadata.contract_name.as_deref(), Some("Ocean 2024"));
        assert_eq!(record.metadata.created_by, "Dana");
    }

    #[test]
    fn malformed_contract_response_yields_empty_report() {
        let record = parse_contract_audit("9", json!({"error": "nope"}), ZeroOverpayPolicy::default());
        assert!(record.receipts.is_empty());
        assert_eq!(record.metadata.created_by, "Unknown");
        assert!(record.metadata.contract_name.is_none());
    }

    #[test]
    fn parses_receipt_response_with_invoice_number() {
        let body = json!([
            [{"key": "freight_rate", "total_overpay": 0, "receipt_value": 1, "contract_value": 1}],
            {"value": "INV-9"}
        ]);
        let audit = parse_receipt_audit("9", body, ZeroOverpayPolicy::default());
        assert_eq!(audit.invoice_number.as_deref(), Some("INV-9"));
        assert!(matches!(audit.mismatches[0], MismatchEntry::Inconsistency { .. }));

        let financial = parse_receipt_audit(
            "9",
            json!([[{"key": "freight_rate", "total_overpay": 0}], {}]),
            ZeroOverpayPolicy::Financial,
        );
        assert!(financial.mismatches[0].is_overcharge());
        assert!(financial.invoice_number.is_none());
    }

    #[test]
    fn receipt_response_accepts_col_wrapper() {
        let body = json!([{"col": [{"key": "port_of_loading", "receipt_value": "SHA"}]}, null]);
        let audit = parse_receipt_audit("3", body, ZeroOverpayPolicy::default());
        assert_eq!(audit.mismatches.len(), 1);
        assert_eq!(audit.mismatches[0].key(), Some("port_of_loading"));
    }
}
