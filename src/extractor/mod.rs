//! 提取模块：从函数源码 / 页面HTML中提取结构化信息
pub mod extracted;
pub mod scan;
pub mod patterns;
pub mod loader_source;
pub mod rule_source;
pub mod profile_locator;
pub mod html_extractor;

// 导出核心接口
pub use self::extracted::Extracted;
pub use self::patterns::SourcePatterns;
pub use self::loader_source::{TagRuleRef, TagRuleRefs, extract_tag_rule_refs};
pub use self::rule_source::{RuleSourceInfo, extract_rule_source};
pub use self::profile_locator::ProfileLocation;
pub use self::html_extractor::HtmlExtractor;
