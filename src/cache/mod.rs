//! 快照缓存模块：保存最近一次分析结果，支持下钻查询、前后对比与本地持久化
pub mod diff;
pub mod snapshot_cache;

// 导出核心接口
pub use self::diff::{Change, SnapshotDiff};
pub use self::snapshot_cache::SnapshotCache;
