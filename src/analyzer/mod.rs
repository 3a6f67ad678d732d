//! 分析器模块：整合运行时视图、源码提取与交叉索引，输出分析快照
pub mod tag;
pub mod extension;
pub mod load_rule;
pub mod overview;
pub mod profile;

// 导出核心接口
pub use self::tag::{TagAnalyzer, classify_tag_status};
pub use self::extension::{ExtensionAnalyzer, derive_scope, derive_status};
pub use self::load_rule::{LoadRuleAnalyzer, RuleResults};
pub use self::overview::OverviewBuilder;
pub use self::profile::ProfileAnalyzer;

/// 数字 ID 排序键：数字按数值升序，非数字排在最后并按字典序
pub(crate) fn numeric_id_key(id: &str) -> (u64, &str) {
    match id.parse::<u64>() {
        Ok(n) => (n, ""),
        Err(_) => (u64::MAX, id),
    }
}
