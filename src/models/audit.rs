use super::mismatch::{MismatchEntry, RawMismatch};
use super::value::{display_value, is_truthy, lenient_list};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `/contract/getmismatchedcols` 返回的单张发票记录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReceiptRecord {
    #[serde(default)]
    pub receipt_id: Value,
    #[serde(default)]
    pub receipt_number: Value,
    #[serde(default, deserialize_with = "lenient_list")]
    pub mismatches: Vec<Option<RawMismatch>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContractUser {
    #[serde(default)]
    pub name: Value,
}

/// 合同元数据 (响应数组第二项)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContractMetadata {
    #[serde(default)]
    pub contract_name: Value,
    #[serde(default)]
    pub contract_type: Value,
    #[serde(default)]
    pub company_name: Value,
    #[serde(default)]
    pub user: Option<RawContractUser>,
}

/// 发票审计记录, mismatches 保持后端顺序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptAuditRecord {
    pub receipt_id: Value,
    pub receipt_number: Option<String>,
    pub mismatches: Vec<MismatchEntry>,
}

impl ReceiptAuditRecord {
    pub fn inconsistencies(&self) -> impl Iterator<Item = &MismatchEntry> {
        self.mismatches.iter().filter(|m| !m.is_overcharge())
    }

    pub fn overcharges(&self) -> impl Iterator<Item = &MismatchEntry> {
        self.mismatches.iter().filter(|m| m.is_overcharge())
    }
}

/// 合同展示信息, 缺失值为 `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractMetadata {
    pub contract_name: Option<String>,
    pub contract_type: Option<String>,
    pub company_name: Option<String>,
    pub created_by: String,
}

impl From<RawContractMetadata> for ContractMetadata {
    fn from(raw: RawContractMetadata) -> Self {
        let text = |v: &Value| is_truthy(v).then(|| display_value(v));
        let created_by = raw
            .user
            .as_ref()
            .and_then(|u| text(&u.name))
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            contract_name: text(&raw.contract_name),
            contract_type: text(&raw.contract_type),
            company_name: text(&raw.company_name),
            created_by,
        }
    }
}

/// 合同审计报告的聚合根
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractAuditRecord {
    pub contract_id: String,
    pub metadata: ContractMetadata,
    pub receipts: Vec<ReceiptAuditRecord>,
}

/// 单张发票的审计数据 (`/receipt/getmismatchedcols`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptAudit {
    pub receipt_id: String,
    pub invoice_number: Option<String>,
    pub mismatches: Vec<MismatchEntry>,
}
