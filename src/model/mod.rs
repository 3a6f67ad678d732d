//! 数据模型：分析结果（标签/扩展/加载规则记录与整体快照）
//! 仅存储数据，无分析逻辑，支持序列化/反序列化
pub mod records;
pub mod stats;
pub mod snapshot;

// 导出核心接口
pub use self::records::{
    ExtensionRecord, ExtensionScope, ExtensionStatus, LoadRuleRecord, ParsedCondition, RuleResultSource,
    TagRecord, TagStatus,
};
pub use self::stats::Stats;
pub use self::snapshot::{AnalysisSnapshot, ConsistencyViolation, Overview};
