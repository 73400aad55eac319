use crate::models::value::is_truthy;
use crate::models::{ExtractedRecord, SchemaField};
use crate::render::format_column_name;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 编辑表格的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRow {
    pub key: String,
    pub label: String,
    pub value_type: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: Value,
}

/// `PATCH /contract` / `PATCH /receipt` 请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldUpdatePayload {
    pub id: Value,
    pub data: IndexMap<String, FieldValue>,
}

/// 按 schema 驱动的字段编辑器
#[derive(Debug, Clone)]
pub struct FieldEditor {
    id: Value,
    schema: Vec<SchemaField>,
    data: IndexMap<String, Value>,
}

fn blank() -> Value {
    Value::String(String::new())
}

impl FieldEditor {
    /// 记录中的字段在前 (缺值为空串), schema 中新增的字段补空串
    pub fn new(record: &ExtractedRecord, schema: &[SchemaField]) -> Self {
        let mut data: IndexMap<String, Value> = record
            .data
            .iter()
            .flatten()
            .map(|field| {
                let value = if is_truthy(&field.value) { field.value.clone() } else { blank() };
                (field.key.clone(), value)
            })
            .collect();

        for field in schema {
            data.entry(field.key.clone()).or_insert_with(blank);
        }

        Self {
            id: record.id.clone(),
            schema: schema.to_vec(),
            data,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// 按 schema 顺序输出可编辑行
    pub fn rows(&self) -> Vec<FieldRow> {
        self.schema
            .iter()
            .map(|field| FieldRow {
                key: field.key.clone(),
                label: format_column_name(Some(field.key.as_str())),
                value_type: field.value_type.clone(),
                value: self.data.get(&field.key).cloned().unwrap_or_else(blank),
            })
            .collect()
    }

    /// 提交前归一化: 空白字符串 -> null
    pub fn into_payload(self) -> FieldUpdatePayload {
        let data = self
            .data
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) if s.trim().is_empty() => Value::Null,
                    other => other,
                };
                (key, FieldValue { value })
            })
            .collect();

        FieldUpdatePayload { id: self.id, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> ExtractedRecord {
        serde_json::from_value(json!({
            "id": 12,
            "data": [
                {"key": "freight_rate", "value": 1200},
                {"key": "vessel_name", "value": null},
                null
            ]
        }))
        .unwrap()
    }

    fn schema() -> Vec<SchemaField> {
        serde_json::from_value(json!([
            {"key": "vessel_name", "value_type": "string"},
            {"key": "freight_rate", "value_type": "number"},
            {"key": "expiration_date", "value_type": "date"}
        ]))
        .unwrap()
    }

    #[test]
    fn missing_schema_keys_are_added_blank() {
        let editor = FieldEditor::new(&record(), &schema());
        assert_eq!(editor.get("expiration_date"), Some(&json!("")));
        assert_eq!(editor.get("vessel_name"), Some(&json!("")));
        assert_eq!(editor.get("freight_rate"), Some(&json!(1200)));
    }

    #[test]
    fn rows_follow_schema_order() {
        let rows = FieldEditor::new(&record(), &schema()).rows();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Vessel Name", "Freight Rate", "Expiration Date"]);
        assert_eq!(rows[1].value_type, "number");
    }

    #[test]
    fn blank_inputs_become_null_on_save() {
        let mut editor = FieldEditor::new(&record(), &schema());
        editor.set("vessel_name", json!("MSC Aurora"));
        editor.set("freight_rate", json!("   "));

        let payload = serde_json::to_value(editor.into_payload()).unwrap();
        assert_eq!(
            payload,
            json!({
                "id": 12,
                "data": {
                    "freight_rate": {"value": null},
                    "vessel_name": {"value": "MSC Aurora"},
                    "expiration_date": {"value": null}
                }
            })
        );
    }
}
