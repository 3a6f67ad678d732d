//! 条件表达式模块：把加载规则源码中的布尔表达式转换为可读条件
pub mod model;
pub mod templates;
pub mod splitter;
pub mod parser;

// 导出核心接口
pub use self::model::{ConditionFragment, ConditionKind};
pub use self::parser::{ConditionParser, parse_condition};
pub use self::splitter::{BoolOp, split_top_level};
