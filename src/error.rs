//! 全局错误类型定义

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum InspectorError {
    // 运行时相关错误（唯一会中断整次分析的错误）
    #[error("runtime objects not available：{0}")]
    RuntimeUnavailable(String),
    #[error("函数源码不可用：{0}")]
    SourceUnavailable(String),

    // 编译相关错误
    #[error("源码匹配模式编译失败：{0}")]
    PatternCompileError(#[from] RegexError),

    // 缓存相关错误
    #[error("快照缓存失败：{0}")]
    CacheError(String),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type InspectResult<T> = Result<T, InspectorError>;
