//! Profile 分析器：从运行时状态与函数源码生成一次完整的分析快照
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::extension::ExtensionAnalyzer;
use super::load_rule::{LoadRuleAnalyzer, RuleResults};
use super::overview::OverviewBuilder;
use super::tag::TagAnalyzer;
use crate::condition::ConditionParser;
use crate::config::AnalyzerConfig;
use crate::crossref::{Relation, RuleTagIndex};
use crate::error::{InspectResult, InspectorError};
use crate::extractor::{Extracted, SourcePatterns};
use crate::model::AnalysisSnapshot;
use crate::runtime::{ConditionTable, LoaderConfigEntry, ReportTable, RuntimeState};
use crate::source::{FunctionSources, SourceAccessor};

/// Profile 分析器
/// 构造后只读，可在多个任务间共享；每次分析都从输入重新计算
#[derive(Debug, Clone)]
pub struct ProfileAnalyzer {
    config: AnalyzerConfig,
    patterns: Arc<SourcePatterns>,
    parser: ConditionParser,
}

impl ProfileAnalyzer {
    /// 创建分析器（编译源码匹配模式）
    pub fn new(config: AnalyzerConfig) -> InspectResult<Self> {
        let patterns = SourcePatterns::compile(&config)?;
        let parser = ConditionParser::new(config.max_condition_depth).with_rule_atom(patterns.rule_atom.clone());
        Ok(Self {
            config,
            patterns: Arc::new(patterns),
            parser,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn patterns(&self) -> &SourcePatterns {
        &self.patterns
    }

    /// 核心分析接口
    /// 运行时缺失或没有 loader 配置表时整体失败；其余缺失均降级为占位值
    pub fn analyze(&self, runtime: Option<&RuntimeState>, sources: &FunctionSources) -> InspectResult<AnalysisSnapshot> {
        let runtime = runtime.ok_or_else(|| InspectorError::RuntimeUnavailable("utag".to_string()))?;
        if runtime.loader_cfg.is_none() {
            return Err(InspectorError::RuntimeUnavailable("utag.loader.cfg".to_string()));
        }
        if runtime.cfg.is_none() {
            warn!("utag.cfg 不可用，概览字段降级为空");
        }

        let report = ReportTable::new(runtime.rpt.as_ref());
        let cond = ConditionTable::new(runtime.cond.as_ref());
        if !report.is_available() {
            warn!("utag.rpt 不可用，所有标签将视为未上报");
        }

        // 1. 交叉索引：源码中的规则引用 + 运行时 load 值中的规则门控
        let mut index = match RuleTagIndex::from_source(sources.loader_cfg.as_deref(), &self.patterns) {
            Extracted::Found(index) => index,
            other => {
                debug!("标签规则引用不可用：{}", other.placeholder().unwrap_or_default());
                RuleTagIndex::new()
            }
        };
        Self::merge_live_load_flags(runtime, &mut index);

        // 2. 规则结果
        let results = RuleResults::resolve(runtime, &cond, &report, &index, self.config.scan_unreported_rules);

        // 3. 标签 / 扩展 / 加载规则
        let tags = TagAnalyzer::analyze(runtime, &report, &results, &index, &self.config.default_scheme);
        let extensions = ExtensionAnalyzer::analyze(runtime, &report);
        let parser = self.config.parse_conditions.then_some(&self.parser);
        let load_rules = LoadRuleAnalyzer::analyze(
            runtime,
            &results,
            &index,
            sources.load_rules.as_deref(),
            &self.patterns,
            parser,
        );

        // 4. 概览 + 快照
        let overview = OverviewBuilder::build(runtime, sources, &self.config.default_scheme);
        let config = OverviewBuilder::config_map(runtime);
        let snapshot = AnalysisSnapshot::new(overview, tags, extensions, load_rules, config);

        for violation in snapshot.consistency_violations() {
            warn!("规则结果与标签状态不一致：{}", violation);
        }
        if self.config.verbose {
            for tag in snapshot.tags() {
                debug!("标签：{} | 地址：{}", tag, tag.location);
            }
        }
        info!("Profile 分析完成 | {}", snapshot);
        Ok(snapshot)
    }

    /// 先通过访问器获取函数源码，再执行分析
    pub async fn analyze_with_accessor<A: SourceAccessor + ?Sized>(
        &self,
        runtime: Option<&RuntimeState>,
        accessor: &A,
    ) -> InspectResult<AnalysisSnapshot> {
        let sources = FunctionSources::acquire(accessor).await;
        self.analyze(runtime, &sources)
    }

    /// load 值 > 4 的标签直接登记为该规则的 load 关联
    fn merge_live_load_flags(runtime: &RuntimeState, index: &mut RuleTagIndex) {
        let Some(loader_cfg) = runtime.loader_cfg.as_ref() else {
            return;
        };
        for (uid, value) in loader_cfg {
            let Some(rule_id) = LoaderConfigEntry::from_value(value).and_then(|e| e.load.rule_id()) else {
                continue;
            };
            index.link(uid, &rule_id, Relation::Load);
        }
    }
}
