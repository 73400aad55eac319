use super::value::{as_number, is_truthy, lenient_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 集装箱数量字段
pub const CONTAINER_COUNT_KEY: &str = "number_of_containers";

/// 后端返回的单条字段比对结果 (原始形态, 字段按需出现)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMismatch {
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: Option<String>,
    #[serde(default)]
    pub receipt_value: Value,
    #[serde(default)]
    pub contract_value: Value,
    #[serde(default)]
    pub overpay: Value,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub total_overpay: Value,
}

/// `total_overpay == 0` 的归类策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroOverpayPolicy {
    /// 现有行为: 0 视为非财务不一致项
    #[default]
    Inconsistency,
    /// 只要 total_overpay 是数值 (含 0) 即视为超收项
    Financial,
}

impl ZeroOverpayPolicy {
    fn is_financial(self, total_overpay: &Value) -> bool {
        match self {
            ZeroOverpayPolicy::Inconsistency => is_truthy(total_overpay),
            ZeroOverpayPolicy::Financial => match total_overpay {
                Value::Number(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok(),
                other => is_truthy(other),
            },
        }
    }
}

/// 归类后的比对项: 不一致 (非财务) 或 超收 (财务, 带数量)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchEntry {
    Inconsistency {
        key: Option<String>,
        receipt_value: Value,
        contract_value: Value,
    },
    Overcharge {
        key: Option<String>,
        receipt_value: Value,
        contract_value: Value,
        overpay: Value,
        quantity: Value,
        total_overpay: f64,
    },
}

impl MismatchEntry {
    /// 入库时一次性归类
    pub fn from_raw(raw: RawMismatch, policy: ZeroOverpayPolicy) -> Self {
        if policy.is_financial(&raw.total_overpay) {
            let total_overpay = as_number(&raw.total_overpay).unwrap_or(0.0);
            MismatchEntry::Overcharge {
                key: raw.key,
                receipt_value: raw.receipt_value,
                contract_value: raw.contract_value,
                overpay: raw.overpay,
                quantity: raw.quantity,
                total_overpay,
            }
        } else {
            MismatchEntry::Inconsistency {
                key: raw.key,
                receipt_value: raw.receipt_value,
                contract_value: raw.contract_value,
            }
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            MismatchEntry::Inconsistency { key, .. } | MismatchEntry::Overcharge { key, .. } => {
                key.as_deref()
            }
        }
    }

    pub fn receipt_value(&self) -> &Value {
        match self {
            MismatchEntry::Inconsistency { receipt_value, .. }
            | MismatchEntry::Overcharge { receipt_value, .. } => receipt_value,
        }
    }

    pub fn contract_value(&self) -> &Value {
        match self {
            MismatchEntry::Inconsistency { contract_value, .. }
            | MismatchEntry::Overcharge { contract_value, .. } => contract_value,
        }
    }

    /// 超收金额, 不一致项为 0
    pub fn total_overpay(&self) -> f64 {
        match self {
            MismatchEntry::Overcharge { total_overpay, .. } => *total_overpay,
            MismatchEntry::Inconsistency { .. } => 0.0,
        }
    }

    pub fn is_overcharge(&self) -> bool {
        matches!(self, MismatchEntry::Overcharge { .. })
    }

    pub fn is_container_count(&self) -> bool {
        self.key() == Some(CONTAINER_COUNT_KEY)
    }
}
