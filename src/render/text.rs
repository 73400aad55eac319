use crate::models::value::{display_value, is_truthy};
use serde_json::Value;

/// 字段名格式化: `number_of_containers` -> `Number Of Containers`
///
/// 空值或空白输入返回空串。
pub fn format_column_name(key: Option<&str>) -> String {
    let Some(trimmed) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        return String::new();
    };

    let mut out = String::with_capacity(trimmed.len());
    let mut prev_is_word = false;
    for c in trimmed.replace('_', " ").chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }
    out
}

/// 特定字段的说明文字, 其它字段为空串
pub fn notes_column(key: &str) -> &'static str {
    match key {
        "expiration_date" => {
            "Invoice date should be less than Contract Expiration Date, it is currently after"
        }
        "effective_date" => {
            "Invoice (Effective) date should be greater than Contract Effective Date it is currently before"
        }
        "payment_due_date" => "Payment terms are too short",
        _ => "",
    }
}

/// null/缺失 -> `N/A`, 其它原样转字符串
pub fn safe_string(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        other => display_value(other),
    }
}

/// 假值 (含 0 与空串) -> `N/A`
pub fn or_na(value: &Value) -> String {
    if is_truthy(value) {
        display_value(value)
    } else {
        "N/A".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_names_are_title_cased() {
        assert_eq!(format_column_name(Some("number_of_containers")), "Number Of Containers");
        assert_eq!(format_column_name(Some("  freight_rate ")), "Freight Rate");
        assert_eq!(format_column_name(Some("bl-number")), "Bl-Number");
        assert_eq!(format_column_name(Some("rate20ft")), "Rate20ft");
        assert_eq!(format_column_name(None), "");
        assert_eq!(format_column_name(Some("")), "");
        assert_eq!(format_column_name(Some("   ")), "");
    }

    #[test]
    fn notes_lookup() {
        assert_eq!(notes_column("payment_due_date"), "Payment terms are too short");
        assert_eq!(
            notes_column("expiration_date"),
            "Invoice date should be less than Contract Expiration Date, it is currently after"
        );
        assert_eq!(
            notes_column("effective_date"),
            "Invoice (Effective) date should be greater than Contract Effective Date it is currently before"
        );
        assert_eq!(notes_column("unknown_key"), "");
    }

    #[test]
    fn placeholder_strings() {
        assert_eq!(safe_string(&Value::Null), "N/A");
        assert_eq!(safe_string(&json!(0)), "0");
        assert_eq!(or_na(&json!(0)), "N/A");
        assert_eq!(or_na(&json!("USD")), "USD");
    }
}
