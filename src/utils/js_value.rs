//! 运行时松散类型值的转换工具
//! 运行时表中的值来自 JS 对象，按 JS 的真值语义解释，转换失败一律降级为 None

use serde_json::Value;

/// JS 真值判定：false / 0 / NaN / "" / null 为假，其余为真
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// 三态结果：显式 true/1 → Some(true)，显式 false/0 → Some(false)，其余（null/未知）→ None
pub fn tri_state(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// 宽松整数转换：数字或数字字符串
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// 标量值转展示字符串，空值返回 None
pub fn as_display_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness_follows_js_rules() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_tri_state_keeps_unknown() {
        assert_eq!(tri_state(&json!(false)), Some(false));
        assert_eq!(tri_state(&json!(0)), Some(false));
        assert_eq!(tri_state(&json!(1)), Some(true));
        assert_eq!(tri_state(&json!("true")), Some(true));
        assert_eq!(tri_state(&json!(null)), None);
        assert_eq!(tri_state(&json!("maybe")), None);
    }

    #[test]
    fn test_as_integer_accepts_numeric_strings() {
        assert_eq!(as_integer(&json!(12)), Some(12));
        assert_eq!(as_integer(&json!("12")), Some(12));
        assert_eq!(as_integer(&json!(4.0)), Some(4));
        assert_eq!(as_integer(&json!("abc")), None);
        assert_eq!(as_integer(&json!(true)), None);
    }
}
