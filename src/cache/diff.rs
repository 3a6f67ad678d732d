//! 两次分析快照之间的差异（按 uid / 规则 ID 对齐）

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{AnalysisSnapshot, TagStatus};

/// 单个条目的前后取值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    pub id: String,
    pub before: T,
    pub after: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub added_tags: Vec<String>,
    pub removed_tags: Vec<String>,
    pub tag_status_changes: Vec<Change<TagStatus>>,
    pub added_rules: Vec<String>,
    pub removed_rules: Vec<String>,
    pub rule_result_changes: Vec<Change<Option<bool>>>,
}

impl SnapshotDiff {
    pub fn between(before: &AnalysisSnapshot, after: &AnalysisSnapshot) -> Self {
        let old_tags: BTreeMap<&str, TagStatus> = before.tags().iter().map(|t| (t.uid.as_str(), t.status)).collect();
        let new_tags: BTreeMap<&str, TagStatus> = after.tags().iter().map(|t| (t.uid.as_str(), t.status)).collect();
        let old_rules: BTreeMap<&str, Option<bool>> =
            before.load_rules().iter().map(|r| (r.id.as_str(), r.result)).collect();
        let new_rules: BTreeMap<&str, Option<bool>> =
            after.load_rules().iter().map(|r| (r.id.as_str(), r.result)).collect();

        let (added_tags, removed_tags, tag_status_changes) = compare(&old_tags, &new_tags);
        let (added_rules, removed_rules, rule_result_changes) = compare(&old_rules, &new_rules);
        Self {
            added_tags,
            removed_tags,
            tag_status_changes,
            added_rules,
            removed_rules,
            rule_result_changes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added_tags.is_empty()
            && self.removed_tags.is_empty()
            && self.tag_status_changes.is_empty()
            && self.added_rules.is_empty()
            && self.removed_rules.is_empty()
            && self.rule_result_changes.is_empty()
    }
}

type Compared<T> = (Vec<String>, Vec<String>, Vec<Change<T>>);

fn compare<T: Copy + PartialEq>(old: &BTreeMap<&str, T>, new: &BTreeMap<&str, T>) -> Compared<T> {
    let old_ids: BTreeSet<&str> = old.keys().copied().collect();
    let new_ids: BTreeSet<&str> = new.keys().copied().collect();

    let added = new_ids.difference(&old_ids).map(|id| id.to_string()).collect();
    let removed = old_ids.difference(&new_ids).map(|id| id.to_string()).collect();
    let changed = old_ids
        .intersection(&new_ids)
        .filter_map(|id| {
            let (before, after) = (old[id], new[id]);
            (before != after).then(|| Change {
                id: id.to_string(),
                before,
                after,
            })
        })
        .collect();
    (added, removed, changed)
}
