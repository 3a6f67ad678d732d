//! 标签 / 扩展 / 加载规则记录

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::ConditionFragment;
use crate::crossref::TagLink;
use crate::runtime::LoadFlag;

/// 标签运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TagStatus {
    #[serde(rename = "OK")]
    Ok,
    NotSent,
    NotLoaded,
    ConditionFalse,
    NotReported,
    NotExecuted,
    Unknown,
}

impl TagStatus {
    /// 排序优先级：OK < NotSent < NotExecuted < NotReported = ConditionFalse < NotLoaded < Unknown
    pub fn rank(&self) -> u8 {
        match self {
            TagStatus::Ok => 0,
            TagStatus::NotSent => 1,
            TagStatus::NotExecuted => 2,
            TagStatus::NotReported | TagStatus::ConditionFalse => 3,
            TagStatus::NotLoaded => 4,
            TagStatus::Unknown => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TagStatus::Ok => "OK",
            TagStatus::NotSent => "NotSent",
            TagStatus::NotLoaded => "NotLoaded",
            TagStatus::ConditionFalse => "ConditionFalse",
            TagStatus::NotReported => "NotReported",
            TagStatus::NotExecuted => "NotExecuted",
            TagStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub uid: String,
    pub name: String,
    pub template_id: String,
    pub version: String,
    pub consent_category: String,
    pub load_flag: LoadFlag,
    pub send_flag: bool,
    pub is_bundled: bool,
    pub status: TagStatus,
    pub load_rule_ids: BTreeSet<String>,
    pub send_rule_ids: BTreeSet<String>,
    /// "bundled"、绝对地址或 "Unknown"
    pub location: String,
}

impl fmt::Display for TagRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.uid, self.status, self.name)
    }
}

/// 扩展执行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExtensionScope {
    BeforeLoadRules,
    AfterLoadRules,
    DomReady,
    AfterTags,
}

impl ExtensionScope {
    pub fn rank(&self) -> u8 {
        match self {
            ExtensionScope::BeforeLoadRules => 0,
            ExtensionScope::AfterLoadRules => 1,
            ExtensionScope::DomReady => 2,
            ExtensionScope::AfterTags => 3,
        }
    }
}

/// 扩展执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExtensionStatus {
    #[serde(rename = "OK")]
    Ok,
    Error,
    NotRun,
}

impl ExtensionStatus {
    pub fn rank(&self) -> u8 {
        match self {
            ExtensionStatus::Ok => 0,
            ExtensionStatus::Error => 1,
            ExtensionStatus::NotRun => 2,
        }
    }
}

/// 单个扩展
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub id: String,
    pub name: String,
    /// 在执行数组中的位置
    pub index: usize,
    /// 声明的执行顺序
    pub order: i64,
    pub scope: ExtensionScope,
    pub status: ExtensionStatus,
}

/// 规则结果的数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleResultSource {
    /// 实时条件表
    ConditionTable,
    /// 上报表 r_ 条目
    Report,
    /// 仅由标签配置推断出存在
    TagScan,
}

/// 可读化后的规则条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCondition {
    /// 条件表达式原文
    pub expression: String,
    pub fragments: Vec<ConditionFragment>,
    /// 条件与调用块引用的数据层变量
    pub variables: BTreeSet<String>,
    pub event_name: Option<String>,
}

/// 单条加载规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRuleRecord {
    pub id: String,
    pub title: String,
    /// 三态结果：None 表示未知
    pub result: Option<bool>,
    pub result_source: RuleResultSource,
    pub associated_tags: Vec<TagLink>,
    pub parsed_condition: Option<ParsedCondition>,
    /// 条件源码不可恢复时的占位说明（"not found" / "no function available"）
    pub condition_placeholder: Option<String>,
}

impl LoadRuleRecord {
    /// 排序优先级：true < false < 未知
    pub fn result_rank(&self) -> u8 {
        match self.result {
            Some(true) => 0,
            Some(false) => 1,
            None => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_status_rank_order() {
        let mut statuses = vec![
            TagStatus::Unknown,
            TagStatus::NotLoaded,
            TagStatus::ConditionFalse,
            TagStatus::NotExecuted,
            TagStatus::NotSent,
            TagStatus::Ok,
        ];
        statuses.sort_by_key(|s| s.rank());
        assert_eq!(statuses[0], TagStatus::Ok);
        assert_eq!(statuses[2], TagStatus::NotExecuted);
        assert_eq!(TagStatus::NotReported.rank(), TagStatus::ConditionFalse.rank());
        assert_eq!(statuses[5], TagStatus::Unknown);
    }

    #[test]
    fn test_status_serialized_labels() {
        assert_eq!(serde_json::to_string(&TagStatus::Ok).unwrap(), r#""OK""#);
        assert_eq!(serde_json::to_string(&ExtensionStatus::NotRun).unwrap(), r#""NotRun""#);
        assert_eq!(TagStatus::ConditionFalse.to_string(), "ConditionFalse");
    }
}
