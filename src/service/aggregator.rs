use crate::models::value::{format_number, parse_int};
use crate::models::{
    ContractAuditRecord, ContractMetadata, MismatchEntry, ReceiptAudit, ReceiptAuditRecord,
};
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 集装箱数量无法解析时的处理口径
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityParsePolicy {
    /// 现有行为: NaN 传染到合计
    #[default]
    Propagate,
    /// 按 0 计, 并记录告警
    Zero,
}

/// 比对项超收合计, 不一致项计 0; 累加过程不做舍入
pub fn sum_overpay<'a, I>(mismatches: I) -> f64
where
    I: IntoIterator<Item = &'a MismatchEntry>,
{
    mismatches.into_iter().map(MismatchEntry::total_overpay).sum()
}

pub fn receipt_total_overpay(receipt: &ReceiptAuditRecord) -> f64 {
    sum_overpay(&receipt.mismatches)
}

pub fn contract_total_overpay(contract: &ContractAuditRecord) -> f64 {
    contract.receipts.iter().map(receipt_total_overpay).sum()
}

/// 合同下所有 `number_of_containers` 项的发票值之和
///
/// 每张发票各计一次, 多张发票会重复累计同一批集装箱。
pub fn total_containers(contract: &ContractAuditRecord, policy: QuantityParsePolicy) -> f64 {
    let mut total = 0.0;
    for receipt in &contract.receipts {
        for entry in receipt.mismatches.iter().filter(|m| m.is_container_count()) {
            match parse_int(entry.receipt_value()) {
                Some(count) => total += count as f64,
                None => match policy {
                    QuantityParsePolicy::Propagate => total += f64::NAN,
                    QuantityParsePolicy::Zero => {
                        tracing::warn!(
                            "Contract {}: unparsable container count {:?} on receipt {}, counted as 0",
                            contract.contract_id,
                            entry.receipt_value(),
                            receipt.receipt_id
                        );
                    }
                },
            }
        }
    }
    total
}

/// 金额展示: 两位小数, 带 `$`
pub fn format_money(amount: f64) -> String {
    format!("${}", format_fixed(amount))
}

/// 对应 `toFixed(2)`: 按 f64 的精确十进制值四舍五入 (0.5 进位)
///
/// `1.005` 实际存储为 `1.00499...`, 结果是 `1.00`。
pub fn format_fixed(amount: f64) -> String {
    if !amount.is_finite() || amount.abs() >= 1e21 {
        return format_number(amount);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    match round_cents(amount.abs()) {
        Some(cents) => format!("{}{}.{:02}", sign, cents / 100, cents % 100),
        None => format!("{:.2}", amount),
    }
}

fn round_cents(abs: f64) -> Option<u128> {
    // f64 的十进制展开最多 1074 位小数, 按此精度格式化没有误差
    let exact = BigDecimal::from_str(&format!("{:.1074}", abs)).ok()?;
    (exact * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_u128()
}

/// 单张发票的分组结果
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptSummary {
    pub receipt_id: String,
    pub receipt_number: Option<String>,
    pub inconsistencies: Vec<MismatchEntry>,
    pub overcharges: Vec<MismatchEntry>,
    pub total_overpay: f64,
}

impl ReceiptSummary {
    fn build(
        receipt_id: String,
        receipt_number: Option<String>,
        mismatches: &[MismatchEntry],
    ) -> Self {
        Self {
            receipt_id,
            receipt_number,
            inconsistencies: mismatches.iter().filter(|m| !m.is_overcharge()).cloned().collect(),
            overcharges: mismatches.iter().filter(|m| m.is_overcharge()).cloned().collect(),
            total_overpay: sum_overpay(mismatches),
        }
    }

    pub fn from_record(record: &ReceiptAuditRecord) -> Self {
        Self::build(
            crate::render::text::safe_string(&record.receipt_id),
            record.receipt_number.clone(),
            &record.mismatches,
        )
    }

    pub fn from_audit(audit: &ReceiptAudit) -> Self {
        Self::build(
            audit.receipt_id.clone(),
            audit.invoice_number.clone(),
            &audit.mismatches,
        )
    }
}

/// 合同审计报告数据 (渲染输入, 也是 JSON 接口的输出)
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub contract_id: String,
    pub metadata: ContractMetadata,
    pub receipts: Vec<ReceiptSummary>,
    /// NaN 序列化为 null
    pub total_containers: f64,
    pub total_overpay: f64,
}

impl AuditSummary {
    pub fn build(contract: &ContractAuditRecord, policy: QuantityParsePolicy) -> Self {
        Self {
            contract_id: contract.contract_id.clone(),
            metadata: contract.metadata.clone(),
            receipts: contract.receipts.iter().map(ReceiptSummary::from_record).collect(),
            total_containers: total_containers(contract, policy),
            total_overpay: contract_total_overpay(contract),
        }
    }
}
