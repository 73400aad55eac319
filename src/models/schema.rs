use super::value::lenient_list;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 合同类型 schema 中的字段定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub key: String,
    #[serde(default = "default_value_type")]
    pub value_type: String,
}

fn default_value_type() -> String {
    "string".to_string()
}

/// 合同/发票抽取出的单个字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataField {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// `/contract/id/{id}` 与 `/receipt/id/{id}` 返回的记录
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedRecord {
    pub id: Value,
    #[serde(default, deserialize_with = "lenient_list")]
    pub data: Vec<Option<DataField>>,
}

/// 合同或发票
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Contract,
    Receipt,
}

impl DocumentKind {
    /// 后端路径前缀
    pub fn path(self) -> &'static str {
        match self {
            DocumentKind::Contract => "contract",
            DocumentKind::Receipt => "receipt",
        }
    }

    /// 原始文件下载名的前缀
    pub fn file_stem(self) -> &'static str {
        match self {
            DocumentKind::Contract => "contract",
            DocumentKind::Receipt => "invoice",
        }
    }
}
