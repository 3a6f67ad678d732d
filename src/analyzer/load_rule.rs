//! 加载规则分析：结果解析、标签关联与可读条件

use std::collections::BTreeMap;

use tracing::debug;

use super::numeric_id_key;
use crate::condition::ConditionParser;
use crate::crossref::RuleTagIndex;
use crate::extractor::{Extracted, SourcePatterns, extract_rule_source};
use crate::model::{LoadRuleRecord, ParsedCondition, RuleResultSource};
use crate::runtime::{ConditionTable, LoaderConfigEntry, ReportTable, RuntimeState};

/// 规则 ID → (三态结果, 数据来源)
#[derive(Debug, Clone, Default)]
pub struct RuleResults {
    entries: BTreeMap<String, (Option<bool>, RuleResultSource)>,
}

impl RuleResults {
    /// 依次尝试：条件表 → 上报表 r_ 条目；首个有数据的来源生效
    /// `scan_tags` 开启时，再把标签配置中引用但尚未覆盖的规则登记为未知结果
    pub fn resolve(
        runtime: &RuntimeState,
        cond: &ConditionTable<'_>,
        report: &ReportTable<'_>,
        index: &RuleTagIndex,
        scan_tags: bool,
    ) -> Self {
        let mut entries = BTreeMap::new();

        for (id, result) in cond.iter() {
            entries.insert(id.to_string(), (result, RuleResultSource::ConditionTable));
        }
        if entries.is_empty() {
            for (id, result) in report.rule_results() {
                entries.insert(id.to_string(), (result, RuleResultSource::Report));
            }
        }
        let live = entries.len();

        if scan_tags {
            let gated = runtime
                .loader_cfg
                .iter()
                .flat_map(|cfg| cfg.values())
                .filter_map(LoaderConfigEntry::from_value)
                .filter_map(|entry| entry.load.rule_id());
            let referenced = index.rule_ids().map(str::to_string);
            for id in gated.chain(referenced) {
                entries.entry(id).or_insert((None, RuleResultSource::TagScan));
            }
        }

        debug!("规则结果解析完成 | 实时: {} | 扫描补全: {}", live, entries.len() - live);
        Self { entries }
    }

    pub fn result(&self, rule_id: &str) -> Option<bool> {
        self.entries.get(rule_id).and_then(|(result, _)| *result)
    }

    pub fn source(&self, rule_id: &str) -> Option<RuleResultSource> {
        self.entries.get(rule_id).map(|(_, source)| *source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<bool>, RuleResultSource)> {
        self.entries
            .iter()
            .map(|(id, (result, source))| (id.as_str(), *result, *source))
    }
}

/// 加载规则分析器
pub struct LoadRuleAnalyzer;

impl LoadRuleAnalyzer {
    /// 为每条已解析的规则生成记录；`parser` 为 None 时跳过条件解析，只保留占位说明
    pub fn analyze(
        runtime: &RuntimeState,
        results: &RuleResults,
        index: &RuleTagIndex,
        rules_source: Option<&str>,
        patterns: &SourcePatterns,
        parser: Option<&ConditionParser>,
    ) -> Vec<LoadRuleRecord> {
        let mut rules: Vec<LoadRuleRecord> = results
            .iter()
            .map(|(id, result, result_source)| {
                let title = runtime
                    .rule_titles
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| format!("Load Rule {}", id));
                let (parsed_condition, condition_placeholder) = match parser {
                    Some(parser) => Self::parse_rule_condition(rules_source, id, patterns, parser),
                    None => (None, None),
                };

                LoadRuleRecord {
                    id: id.to_string(),
                    title,
                    result,
                    result_source,
                    associated_tags: index.tags_for_rule(id),
                    parsed_condition,
                    condition_placeholder,
                }
            })
            .collect();

        rules.sort_by(|a, b| {
            a.result_rank()
                .cmp(&b.result_rank())
                .then_with(|| numeric_id_key(&a.id).cmp(&numeric_id_key(&b.id)))
        });
        debug!("加载规则分析完成 | 规则数: {}", rules.len());
        rules
    }

    fn parse_rule_condition(
        rules_source: Option<&str>,
        rule_id: &str,
        patterns: &SourcePatterns,
        parser: &ConditionParser,
    ) -> (Option<ParsedCondition>, Option<String>) {
        let info = extract_rule_source(rules_source, rule_id, patterns);
        let variables = info.variables();
        match info.condition {
            Extracted::Found(expression) => {
                let fragments = parser.parse(&expression);
                let parsed = ParsedCondition {
                    expression,
                    fragments,
                    variables,
                    event_name: info.event_name,
                };
                (Some(parsed), None)
            }
            other => (None, other.placeholder().map(str::to_string)),
        }
    }
}
