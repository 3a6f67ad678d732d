//! 运行时数据模型定义
//! 每张表都建模为字段可选、带默认值的记录；形状不符时降级为占位值，不中断分析

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InspectResult;
use crate::utils::js_value::{as_display_string, as_integer, is_truthy};

/// 标签 load 控制值（原始值）
/// 0 = 禁用，1 = 总是加载，4 = 打包且总是加载，>4 = 引用的加载规则 ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoadFlag {
    Missing,
    Bool(bool),
    Int(i64),
    Raw(String),
}

impl Default for LoadFlag {
    fn default() -> Self {
        LoadFlag::Missing
    }
}

impl LoadFlag {
    /// 从运行时松散值构造：数字字符串按整数处理
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => LoadFlag::Missing,
            Value::Bool(b) => LoadFlag::Bool(*b),
            Value::Number(_) => match as_integer(value) {
                Some(n) => LoadFlag::Int(n),
                None => LoadFlag::Raw(value.to_string()),
            },
            Value::String(s) => match as_integer(value) {
                Some(n) => LoadFlag::Int(n),
                None => LoadFlag::Raw(s.clone()),
            },
            other => LoadFlag::Raw(other.to_string()),
        }
    }

    /// JS 假值（undefined/false/0/""）
    pub fn is_falsy(&self) -> bool {
        match self {
            LoadFlag::Missing => true,
            LoadFlag::Bool(b) => !b,
            LoadFlag::Int(n) => *n == 0,
            LoadFlag::Raw(s) => s.is_empty(),
        }
    }

    /// 总是加载：1 / 4 / true
    pub fn is_always_on(&self) -> bool {
        matches!(self, LoadFlag::Bool(true) | LoadFlag::Int(1) | LoadFlag::Int(4))
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, LoadFlag::Int(4))
    }

    /// 规则门控：load > 4 时即为加载规则 ID
    pub fn rule_id(&self) -> Option<String> {
        match self {
            LoadFlag::Int(n) if *n > 4 => Some(n.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for LoadFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFlag::Missing => write!(f, "undefined"),
            LoadFlag::Bool(b) => write!(f, "{}", b),
            LoadFlag::Int(n) => write!(f, "{}", n),
            LoadFlag::Raw(s) => write!(f, "{}", s),
        }
    }
}

/// loader 配置表中的单个标签条目
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderConfigEntry {
    pub load: LoadFlag,
    pub send: bool,
    pub name: Option<String>,
    pub version: Option<String>,
    pub template_id: Option<String>,
    pub consent_category: Option<String>,
    pub src: Option<String>,
}

impl LoaderConfigEntry {
    /// 非对象条目返回 None，由调用方降级为 Unknown 状态
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            load: obj.get("load").map(LoadFlag::from_value).unwrap_or_default(),
            send: obj.get("send").map(is_truthy).unwrap_or(false),
            name: obj.get("name").and_then(as_display_string),
            version: obj.get("v").and_then(as_display_string),
            template_id: obj.get("tid").and_then(as_display_string),
            consent_category: obj.get("tcat").and_then(as_display_string),
            src: obj.get("src").and_then(as_display_string),
        })
    }
}

/// 扩展列表中的单个扩展条目
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionEntry {
    pub id: String,
    pub name: Option<String>,
    pub blr: bool,
    pub alr: bool,
    pub end: bool,
    pub order: Option<i64>,
}

impl ExtensionEntry {
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: obj.get("id").and_then(as_display_string).unwrap_or_default(),
            name: obj.get("name").and_then(as_display_string),
            blr: obj.get("blr").map(is_truthy).unwrap_or(false),
            alr: obj.get("alr").map(is_truthy).unwrap_or(false),
            end: obj.get("end").map(is_truthy).unwrap_or(false),
            order: obj.get("order").and_then(as_integer),
        })
    }
}

/// utag 运行时状态的只读快照（通常由页面侧序列化后传入）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeState {
    /// utag.cfg
    #[serde(default)]
    pub cfg: Option<Map<String, Value>>,
    /// utag.loader.cfg：标签 uid → 配置
    #[serde(default, alias = "loader")]
    pub loader_cfg: Option<Map<String, Value>>,
    /// utag.rpt：执行上报表
    #[serde(default, alias = "report")]
    pub rpt: Option<Map<String, Value>>,
    /// utag.cond：条件结果表
    #[serde(default, alias = "conditions")]
    pub cond: Option<Map<String, Value>>,
    /// 扩展列表（按执行数组顺序）
    #[serde(default, alias = "extend")]
    pub extensions: Option<Vec<Value>>,
    /// utag.data：数据层
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    /// 加载规则标题（可选，来自 Profile 元数据）
    #[serde(default)]
    pub rule_titles: BTreeMap<String, String>,
}

impl RuntimeState {
    pub fn from_json_str(json: &str) -> InspectResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 读取 utag.cfg 中的标量字段
    pub fn cfg_string(&self, key: &str) -> Option<String> {
        self.cfg.as_ref()?.get(key).and_then(as_display_string)
    }

    /// 数据层变量个数
    pub fn data_layer_size(&self) -> usize {
        self.data.as_ref().map(|d| d.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_flag_classification() {
        assert!(LoadFlag::from_value(&json!(0)).is_falsy());
        assert!(LoadFlag::from_value(&json!(false)).is_falsy());
        assert!(LoadFlag::Missing.is_falsy());
        assert!(LoadFlag::from_value(&json!(1)).is_always_on());
        assert!(LoadFlag::from_value(&json!(true)).is_always_on());
        assert!(LoadFlag::from_value(&json!(4)).is_bundled());
        assert_eq!(LoadFlag::from_value(&json!("12")).rule_id(), Some("12".to_string()));
        assert_eq!(LoadFlag::from_value(&json!(3)).rule_id(), None);
    }

    #[test]
    fn test_loader_entry_defaults() {
        let entry = LoaderConfigEntry::from_value(&json!({"load": 1})).unwrap();
        assert_eq!(entry.load, LoadFlag::Int(1));
        assert!(!entry.send);
        assert_eq!(entry.name, None);

        // 测试场景：非对象条目，降级为 None
        assert!(LoaderConfigEntry::from_value(&json!("broken")).is_none());
    }

    #[test]
    fn test_runtime_state_from_json() {
        let state = RuntimeState::from_json_str(
            r#"{"cfg":{"v":"ut4.46.202301010000"},"loader_cfg":{"7":{"load":1,"send":1}},"extend":[{"id":"3","blr":1}]}"#,
        )
        .unwrap();
        assert_eq!(state.cfg_string("v").as_deref(), Some("ut4.46.202301010000"));
        assert_eq!(state.loader_cfg.as_ref().unwrap().len(), 1);
        assert_eq!(state.extensions.as_ref().unwrap().len(), 1);
        assert!(state.rpt.is_none());
    }
}
