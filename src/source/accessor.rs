//! 函数源码访问接口与内置实现

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{InspectResult, InspectorError};

/// 一次分析所需的两段函数源码；任一缺失都只会让对应字段降级
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionSources {
    /// loader 配置初始化函数（utag.loader.initcfg）
    pub loader_cfg: Option<String>,
    /// 规则评估函数（utag.loader.loadrules）
    pub load_rules: Option<String>,
}

impl FunctionSources {
    pub fn new(loader_cfg: Option<String>, load_rules: Option<String>) -> Self {
        Self { loader_cfg, load_rules }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// 通过访问器获取源码；单段获取失败记录告警并降级为 None
    pub async fn acquire<A: SourceAccessor + ?Sized>(accessor: &A) -> Self {
        let loader_cfg = match accessor.loader_config_source().await {
            Ok(src) => src,
            Err(e) => {
                warn!("loader 配置源码获取失败，降级为空：{}", e);
                None
            }
        };
        let load_rules = match accessor.load_rules_source().await {
            Ok(src) => src,
            Err(e) => {
                warn!("规则评估源码获取失败，降级为空：{}", e);
                None
            }
        };
        debug!(
            "函数源码获取完成 | loader: {} 字节 | rules: {} 字节",
            loader_cfg.as_ref().map(|s| s.len()).unwrap_or(0),
            load_rules.as_ref().map(|s| s.len()).unwrap_or(0)
        );
        Self { loader_cfg, load_rules }
    }
}

/// 函数源码访问器（由运行时集成层实现）
/// 返回 Ok(None) 表示运行时中不存在该函数
#[async_trait]
pub trait SourceAccessor: Send + Sync {
    async fn loader_config_source(&self) -> InspectResult<Option<String>>;

    async fn load_rules_source(&self) -> InspectResult<Option<String>>;
}

/// 内存中的固定源码
#[derive(Debug, Clone, Default)]
pub struct StaticSourceAccessor {
    sources: FunctionSources,
}

impl StaticSourceAccessor {
    pub fn new(loader_cfg: Option<String>, load_rules: Option<String>) -> Self {
        Self {
            sources: FunctionSources::new(loader_cfg, load_rules),
        }
    }
}

#[async_trait]
impl SourceAccessor for StaticSourceAccessor {
    async fn loader_config_source(&self) -> InspectResult<Option<String>> {
        Ok(self.sources.loader_cfg.clone())
    }

    async fn load_rules_source(&self) -> InspectResult<Option<String>> {
        Ok(self.sources.load_rules.clone())
    }
}

/// 从本地文件读取源码（页面侧导出的函数文本）
#[derive(Debug, Clone, Default)]
pub struct FileSourceAccessor {
    loader_cfg_path: Option<PathBuf>,
    load_rules_path: Option<PathBuf>,
}

impl FileSourceAccessor {
    pub fn new(loader_cfg_path: Option<PathBuf>, load_rules_path: Option<PathBuf>) -> Self {
        Self {
            loader_cfg_path,
            load_rules_path,
        }
    }

    async fn read(path: &Option<PathBuf>) -> InspectResult<Option<String>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| InspectorError::SourceUnavailable(format!("{}：{}", path.display(), e)))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }
}

#[async_trait]
impl SourceAccessor for FileSourceAccessor {
    async fn loader_config_source(&self) -> InspectResult<Option<String>> {
        Self::read(&self.loader_cfg_path).await
    }

    async fn load_rules_source(&self) -> InspectResult<Option<String>> {
        Self::read(&self.load_rules_path).await
    }
}
