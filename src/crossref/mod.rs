//! 交叉引用模块：标签 ↔ 加载/发送规则的双向索引
pub mod index;

// 导出核心接口
pub use self::index::{Relation, RuleTagIndex, TagLink, TagRules};
