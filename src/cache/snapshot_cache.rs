//! 快照缓存管理
//! 内存中保留最近两次快照；本地持久化使用 MessagePack

use std::path::Path;

use rmp_serde::{Serializer, from_slice};
use serde::Serialize;
use tracing::debug;

use super::diff::SnapshotDiff;
use crate::error::{InspectResult, InspectorError};
use crate::model::{AnalysisSnapshot, ExtensionRecord, LoadRuleRecord, TagRecord};

/// 快照缓存
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    current: Option<AnalysisSnapshot>,
    previous: Option<AnalysisSnapshot>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存新快照，返回与上一次快照的差异（首次保存时为 None）
    pub fn store(&mut self, snapshot: AnalysisSnapshot) -> Option<SnapshotDiff> {
        let diff = self.current.as_ref().map(|last| SnapshotDiff::between(last, &snapshot));
        self.previous = self.current.replace(snapshot);
        diff
    }

    pub fn last(&self) -> Option<&AnalysisSnapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&AnalysisSnapshot> {
        self.previous.as_ref()
    }

    pub fn tag(&self, uid: &str) -> Option<&TagRecord> {
        self.current.as_ref()?.tag(uid)
    }

    pub fn load_rule(&self, id: &str) -> Option<&LoadRuleRecord> {
        self.current.as_ref()?.load_rule(id)
    }

    pub fn extension(&self, id: &str) -> Option<&ExtensionRecord> {
        self.current.as_ref()?.extension(id)
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.previous = None;
    }

    /// 将最近一次快照写入本地文件
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> InspectResult<()> {
        let snapshot = self
            .current
            .as_ref()
            .ok_or_else(|| InspectorError::CacheError("没有可保存的快照".to_string()))?;

        let mut cache_data = Vec::new();
        snapshot
            .serialize(&mut Serializer::new(&mut cache_data).with_struct_map())
            .map_err(|e| InspectorError::CacheError(format!("序列化失败：{}", e)))?;
        debug!("快照序列化成功，数据大小：{} 字节", cache_data.len());

        tokio::fs::write(path.as_ref(), cache_data).await?;
        Ok(())
    }

    /// 从本地文件恢复（恢复的快照作为最近一次快照）
    pub async fn load_from_file(path: impl AsRef<Path>) -> InspectResult<Self> {
        let cache_data = tokio::fs::read(path.as_ref()).await?;
        let snapshot: AnalysisSnapshot =
            from_slice(&cache_data).map_err(|e| InspectorError::CacheError(format!("反序列化失败：{}", e)))?;
        debug!("快照反序列化成功 | {}", snapshot);

        Ok(Self {
            current: Some(snapshot),
            previous: None,
        })
    }

    /// 删除本地缓存文件
    pub async fn clear_file(path: impl AsRef<Path>) -> InspectResult<()> {
        let path = path.as_ref();
        if path.exists() {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ProfileAnalyzer;
    use crate::config::ConfigManager;
    use crate::model::TagStatus;
    use crate::runtime::RuntimeState;
    use crate::source::FunctionSources;

    fn snapshot(json: &str) -> AnalysisSnapshot {
        let analyzer = ProfileAnalyzer::new(ConfigManager::get_default()).unwrap();
        let state = RuntimeState::from_json_str(json).unwrap();
        analyzer.analyze(Some(&state), &FunctionSources::empty()).unwrap()
    }

    #[test]
    fn test_store_and_drill_down() {
        let mut cache = SnapshotCache::new();
        assert!(cache.tag("7").is_none());

        let first = cache.store(snapshot(r#"{"loader_cfg":{"7":{"load":1,"send":1}}}"#));
        assert!(first.is_none());
        assert_eq!(cache.tag("7").unwrap().status, TagStatus::NotReported);

        let diff = cache
            .store(snapshot(r#"{"loader_cfg":{"7":{"load":1,"send":1}},"rpt":{"l_7":1}}"#))
            .unwrap();
        assert_eq!(diff.tag_status_changes.len(), 1);
        assert_eq!(cache.tag("7").unwrap().status, TagStatus::Ok);
        assert_eq!(cache.previous().unwrap().tag("7").unwrap().status, TagStatus::NotReported);

        cache.clear();
        assert!(cache.last().is_none());
    }

    #[tokio::test]
    async fn test_persist_and_restore() {
        let path = std::env::temp_dir().join(format!("rsutag_snapshot_{}.msgpack", std::process::id()));
        let mut cache = SnapshotCache::new();
        cache.store(snapshot(
            r#"{"cfg":{"utid":"acme/main/202301010000"},"loader_cfg":{"7":{"load":1,"send":1},"9":{"load":12}},
                "rpt":{"l_7":1},"cond":{"12":false},"extensions":[{"id":"3","blr":1}]}"#,
        ));
        cache.save_to_file(&path).await.unwrap();

        let restored = SnapshotCache::load_from_file(&path).await.unwrap();
        assert_eq!(restored.last(), cache.last());
        assert_eq!(restored.load_rule("12").unwrap().result, Some(false));

        SnapshotCache::clear_file(&path).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_save_without_snapshot_fails() {
        let cache = SnapshotCache::new();
        let result = cache.save_to_file(std::env::temp_dir().join("rsutag_empty.msgpack")).await;
        assert!(matches!(result, Err(InspectorError::CacheError(_))));
    }
}
