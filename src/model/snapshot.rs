//! 分析快照：一次分析的完整结果
//! 字段只读，统计在构造时由列表推导，避免与列表不一致

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::records::{ExtensionRecord, LoadRuleRecord, TagRecord, TagStatus};
use super::stats::Stats;
use crate::crossref::Relation;
use crate::error::InspectResult;

/// Profile 概览
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub account: Option<String>,
    pub profile: Option<String>,
    pub environment: Option<String>,
    /// utag.cfg.v
    pub utag_version: Option<String>,
    /// utag.cfg.utid
    pub publish_id: Option<String>,
    /// utag.cfg.path
    pub path: Option<String>,
    pub data_layer_size: usize,
    pub loader_source_available: bool,
    pub rules_source_available: bool,
}

/// 一致性冲突：规则结果为 false，但依赖它加载的标签状态为 OK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyViolation {
    pub rule_id: String,
    pub tag_uid: String,
}

impl fmt::Display for ConsistencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} is false but tag {} is OK", self.rule_id, self.tag_uid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    overview: Overview,
    stats: Stats,
    tags: Vec<TagRecord>,
    extensions: Vec<ExtensionRecord>,
    load_rules: Vec<LoadRuleRecord>,
    /// utag.cfg 标量字段
    config: BTreeMap<String, String>,
}

impl AnalysisSnapshot {
    pub fn new(
        overview: Overview,
        tags: Vec<TagRecord>,
        extensions: Vec<ExtensionRecord>,
        load_rules: Vec<LoadRuleRecord>,
        config: BTreeMap<String, String>,
    ) -> Self {
        let stats = Stats::from_lists(&tags, &extensions, &load_rules);
        Self {
            overview,
            stats,
            tags,
            extensions,
            load_rules,
            config,
        }
    }

    pub fn overview(&self) -> &Overview {
        &self.overview
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn tags(&self) -> &[TagRecord] {
        &self.tags
    }

    pub fn extensions(&self) -> &[ExtensionRecord] {
        &self.extensions
    }

    pub fn load_rules(&self) -> &[LoadRuleRecord] {
        &self.load_rules
    }

    pub fn config(&self) -> &BTreeMap<String, String> {
        &self.config
    }

    pub fn tag(&self, uid: &str) -> Option<&TagRecord> {
        self.tags.iter().find(|t| t.uid == uid)
    }

    pub fn extension(&self, id: &str) -> Option<&ExtensionRecord> {
        self.extensions.iter().find(|e| e.id == id)
    }

    pub fn load_rule(&self, id: &str) -> Option<&LoadRuleRecord> {
        self.load_rules.iter().find(|r| r.id == id)
    }

    /// 从当前列表重新计算统计
    pub fn recompute_stats(&self) -> Stats {
        Stats::from_lists(&self.tags, &self.extensions, &self.load_rules)
    }

    /// 结果为 false 的规则下，以 load 关系关联且状态为 OK 的标签
    pub fn consistency_violations(&self) -> Vec<ConsistencyViolation> {
        self.load_rules
            .iter()
            .filter(|rule| rule.result == Some(false))
            .flat_map(|rule| {
                rule.associated_tags
                    .iter()
                    .filter(|link| link.relation == Relation::Load)
                    .filter(|link| self.tag(&link.uid).is_some_and(|t| t.status == TagStatus::Ok))
                    .map(|link| ConsistencyViolation {
                        rule_id: rule.id.clone(),
                        tag_uid: link.uid.clone(),
                    })
            })
            .collect()
    }

    pub fn to_json_pretty(&self) -> InspectResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for AnalysisSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "标签: {}/{} | 扩展: {}/{} | 加载规则: {}/{}",
            self.stats.active_tags,
            self.stats.total_tags,
            self.stats.active_extensions,
            self.stats.total_extensions,
            self.stats.active_load_rules,
            self.stats.total_load_rules
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::crossref::TagLink;
    use crate::model::RuleResultSource;
    use crate::runtime::LoadFlag;

    fn tag(uid: &str, status: TagStatus) -> TagRecord {
        TagRecord {
            uid: uid.to_string(),
            name: "N/A".to_string(),
            template_id: "N/A".to_string(),
            version: "Unknown".to_string(),
            consent_category: "N/A".to_string(),
            load_flag: LoadFlag::Int(12),
            send_flag: true,
            is_bundled: false,
            status,
            load_rule_ids: BTreeSet::from(["12".to_string()]),
            send_rule_ids: BTreeSet::new(),
            location: "Unknown".to_string(),
        }
    }

    fn rule(id: &str, result: Option<bool>, tags: &[(&str, Relation)]) -> LoadRuleRecord {
        LoadRuleRecord {
            id: id.to_string(),
            title: format!("Load Rule {}", id),
            result,
            result_source: RuleResultSource::ConditionTable,
            associated_tags: tags
                .iter()
                .map(|(uid, relation)| TagLink {
                    uid: uid.to_string(),
                    relation: *relation,
                })
                .collect(),
            parsed_condition: None,
            condition_placeholder: None,
        }
    }

    #[test]
    fn test_consistency_violations() {
        let snapshot = AnalysisSnapshot::new(
            Overview::default(),
            vec![tag("9", TagStatus::Ok), tag("10", TagStatus::Ok), tag("11", TagStatus::ConditionFalse)],
            Vec::new(),
            vec![
                rule("12", Some(false), &[("9", Relation::Load), ("10", Relation::Send), ("11", Relation::Load)]),
                rule("13", Some(true), &[("10", Relation::Load)]),
            ],
            BTreeMap::new(),
        );
        // 测试场景：只有 load 关联计入冲突
        assert_eq!(
            snapshot.consistency_violations(),
            vec![ConsistencyViolation {
                rule_id: "12".to_string(),
                tag_uid: "9".to_string()
            }]
        );
    }

    #[test]
    fn test_stats_derived_from_lists() {
        let snapshot = AnalysisSnapshot::new(
            Overview::default(),
            vec![tag("9", TagStatus::Ok), tag("11", TagStatus::ConditionFalse)],
            Vec::new(),
            vec![rule("12", Some(false), &[]), rule("13", None, &[])],
            BTreeMap::new(),
        );
        let stats = snapshot.stats();
        assert_eq!(stats.total_tags, 2);
        assert_eq!(stats.active_tags, 1);
        assert_eq!(stats.false_load_rules, 1);
        assert_eq!(stats.active_load_rules, 0);
        assert_eq!(stats.tag_status_counts[&TagStatus::ConditionFalse], 1);
        assert_eq!(stats, &snapshot.recompute_stats());
        assert_eq!(snapshot.to_string(), "标签: 1/2 | 扩展: 0/0 | 加载规则: 0/2");
    }

    #[test]
    fn test_snapshot_json_uses_status_labels() {
        let snapshot = AnalysisSnapshot::new(
            Overview::default(),
            vec![tag("9", TagStatus::Ok)],
            Vec::new(),
            Vec::new(),
            BTreeMap::new(),
        );
        let json = snapshot.to_json_pretty().unwrap();
        assert!(json.contains(r#""status": "OK""#));
        let restored: AnalysisSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
    }
}
