//! 条件解析结果数据模型

use std::fmt;

use serde::{Deserialize, Serialize};

/// 条件片段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    /// 命中固定模板
    Matched,
    /// 按顶层 && / || 拆分后的组合条件
    Complex,
    /// 无法识别，原样输出
    Custom,
    /// 解析器内部故障
    Error,
}

/// 单条可读条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFragment {
    /// 原始表达式片段
    pub original: String,
    /// 可读描述
    pub text: String,
    pub kind: ConditionKind,
}

impl ConditionFragment {
    pub fn new(original: impl Into<String>, text: impl Into<String>, kind: ConditionKind) -> Self {
        Self {
            original: original.into(),
            text: text.into(),
            kind,
        }
    }

    pub fn error(original: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(original, reason, ConditionKind::Error)
    }
}

impl fmt::Display for ConditionFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
