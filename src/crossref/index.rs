//! 规则-标签交叉索引
//! 由标签 → 规则引用表反转得到 规则 → 标签；同一输入总是得到同一集合

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extractor::{Extracted, SourcePatterns, TagRuleRefs, extract_tag_rule_refs};

/// 标签与规则的关联方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Load,
    Send,
}

/// 规则关联的单个标签
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagLink {
    pub uid: String,
    pub relation: Relation,
}

/// 标签依赖的规则集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRules {
    pub load: BTreeSet<String>,
    pub send: BTreeSet<String>,
}

/// 双向索引
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTagIndex {
    by_rule: BTreeMap<String, BTreeSet<TagLink>>,
    by_tag: BTreeMap<String, TagRules>,
}

impl RuleTagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 反转标签 → 规则引用表
    pub fn build(refs: &TagRuleRefs) -> Self {
        let mut index = Self::new();
        for (uid, tag_ref) in refs {
            for rule_id in &tag_ref.load {
                index.link(uid, rule_id, Relation::Load);
            }
            for rule_id in &tag_ref.send {
                index.link(uid, rule_id, Relation::Send);
            }
        }
        index
    }

    /// 直接从 loader 配置源码构建；占位值原样透传
    pub fn from_source(source: Option<&str>, patterns: &SourcePatterns) -> Extracted<Self> {
        extract_tag_rule_refs(source, patterns).map(|refs| {
            let index = Self::build(&refs);
            debug!("规则-标签交叉索引构建完成 | 规则数: {} | 标签数: {}", index.rule_count(), index.by_tag.len());
            index
        })
    }

    /// 登记一条关联（重复登记无副作用）
    pub fn link(&mut self, uid: &str, rule_id: &str, relation: Relation) {
        self.by_rule.entry(rule_id.to_string()).or_default().insert(TagLink {
            uid: uid.to_string(),
            relation,
        });
        let rules = self.by_tag.entry(uid.to_string()).or_default();
        match relation {
            Relation::Load => rules.load.insert(rule_id.to_string()),
            Relation::Send => rules.send.insert(rule_id.to_string()),
        };
    }

    /// 规则关联的标签
    pub fn tags_for_rule(&self, rule_id: &str) -> Vec<TagLink> {
        self.by_rule
            .get(rule_id)
            .map(|links| links.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 标签依赖的规则
    pub fn rules_for_tag(&self, uid: &str) -> TagRules {
        self.by_tag.get(uid).cloned().unwrap_or_default()
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.by_rule.keys().map(String::as_str)
    }

    pub fn rule_count(&self) -> usize {
        self.by_rule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_rule.is_empty()
    }
}
