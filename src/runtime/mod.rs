//! 运行时模块：utag 运行时只读视图（配置表/上报表/条件表/扩展列表）
pub mod model;
pub mod tables;

// 导出核心接口
pub use self::model::{ExtensionEntry, LoadFlag, LoaderConfigEntry, RuntimeState};
pub use self::tables::{ConditionTable, ReportTable};
