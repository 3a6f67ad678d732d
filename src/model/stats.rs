//! 快照统计：只能由三张列表推导，不提供单独设置的入口

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::records::{ExtensionRecord, ExtensionStatus, LoadRuleRecord, TagRecord, TagStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_tags: usize,
    /// 状态为 OK 的标签
    pub active_tags: usize,
    pub bundled_tags: usize,
    pub total_extensions: usize,
    /// 执行正常的扩展
    pub active_extensions: usize,
    pub error_extensions: usize,
    pub total_load_rules: usize,
    /// 结果为 true 的规则
    pub active_load_rules: usize,
    pub false_load_rules: usize,
    pub tag_status_counts: BTreeMap<TagStatus, usize>,
}

impl Stats {
    pub fn from_lists(tags: &[TagRecord], extensions: &[ExtensionRecord], load_rules: &[LoadRuleRecord]) -> Self {
        let mut tag_status_counts = BTreeMap::new();
        for tag in tags {
            *tag_status_counts.entry(tag.status).or_insert(0) += 1;
        }

        Self {
            total_tags: tags.len(),
            active_tags: tags.iter().filter(|t| t.status == TagStatus::Ok).count(),
            bundled_tags: tags.iter().filter(|t| t.is_bundled).count(),
            total_extensions: extensions.len(),
            active_extensions: extensions.iter().filter(|e| e.status == ExtensionStatus::Ok).count(),
            error_extensions: extensions.iter().filter(|e| e.status == ExtensionStatus::Error).count(),
            total_load_rules: load_rules.len(),
            active_load_rules: load_rules.iter().filter(|r| r.result == Some(true)).count(),
            false_load_rules: load_rules.iter().filter(|r| r.result == Some(false)).count(),
            tag_status_counts,
        }
    }
}
