//! rsutag-inspector - utag 运行时 Profile 分析引擎
//! 从运行时状态与函数源码反推标签 / 扩展 / 加载规则的执行情况，输出可查询的分析快照

// 导出全局错误类型
pub use self::error::{InspectResult, InspectorError};

// 导出配置模块
pub use self::config::{AnalyzerConfig, ConfigManager, CustomConfigBuilder};

// 导出运行时模块核心接口
pub use self::runtime::{ConditionTable, ExtensionEntry, LoadFlag, LoaderConfigEntry, ReportTable, RuntimeState};

// 导出条件解析模块核心接口
pub use self::condition::{ConditionFragment, ConditionKind, ConditionParser, parse_condition};

// 导出提取模块核心接口
pub use self::extractor::{
    Extracted, HtmlExtractor, ProfileLocation, RuleSourceInfo, SourcePatterns, TagRuleRef, TagRuleRefs,
    extract_rule_source, extract_tag_rule_refs,
};

// 导出交叉引用模块核心接口
pub use self::crossref::{Relation, RuleTagIndex, TagLink, TagRules};

// 导出数据模型
pub use self::model::{
    AnalysisSnapshot, ConsistencyViolation, ExtensionRecord, ExtensionScope, ExtensionStatus, LoadRuleRecord,
    Overview, ParsedCondition, RuleResultSource, Stats, TagRecord, TagStatus,
};

// 导出源码获取接口
pub use self::source::{FileSourceAccessor, FunctionSources, SourceAccessor, StaticSourceAccessor};

// 导出分析器核心接口
pub use self::analyzer::{ProfileAnalyzer, classify_tag_status};

// 导出快照缓存
pub use self::cache::{Change, SnapshotCache, SnapshotDiff};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod utils;
pub mod runtime;
pub mod condition;
pub mod extractor;
pub mod crossref;
pub mod model;
pub mod source;
pub mod analyzer;
pub mod cache;
