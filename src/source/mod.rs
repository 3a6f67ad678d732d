//! 源码获取模块：分析引擎唯一的异步边界
//! 引擎只消费文本，从不执行代码；函数对象序列化由外部运行时集成层负责
pub mod accessor;

// 导出核心接口
pub use self::accessor::{FileSourceAccessor, FunctionSources, SourceAccessor, StaticSourceAccessor};
