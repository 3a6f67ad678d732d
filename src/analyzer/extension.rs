//! 扩展分析：执行阶段与执行状态

use tracing::{debug, warn};

use crate::model::{ExtensionRecord, ExtensionScope, ExtensionStatus};
use crate::runtime::{ExtensionEntry, ReportTable, RuntimeState};

/// 执行阶段：blr → alr → end 依次判定，均未设置时为 DomReady
pub fn derive_scope(entry: &ExtensionEntry) -> ExtensionScope {
    if entry.blr {
        ExtensionScope::BeforeLoadRules
    } else if entry.alr {
        ExtensionScope::AfterLoadRules
    } else if entry.end {
        ExtensionScope::AfterTags
    } else {
        ExtensionScope::DomReady
    }
}

/// 上报值为真表示执行出错，为假表示正常，缺失表示未执行
pub fn derive_status(reported_error: Option<bool>) -> ExtensionStatus {
    match reported_error {
        Some(true) => ExtensionStatus::Error,
        Some(false) => ExtensionStatus::Ok,
        None => ExtensionStatus::NotRun,
    }
}

/// 扩展分析器
pub struct ExtensionAnalyzer;

impl ExtensionAnalyzer {
    pub fn analyze(runtime: &RuntimeState, report: &ReportTable<'_>) -> Vec<ExtensionRecord> {
        let Some(list) = runtime.extensions.as_ref() else {
            debug!("扩展列表不可用");
            return Vec::new();
        };

        let mut extensions: Vec<ExtensionRecord> = list
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let entry = ExtensionEntry::from_value(value).unwrap_or_else(|| {
                    warn!("扩展条目不是对象，使用默认值 | index: {}", index);
                    ExtensionEntry::default()
                });
                let id = if entry.id.is_empty() { index.to_string() } else { entry.id.clone() };
                ExtensionRecord {
                    name: entry.name.clone().unwrap_or_else(|| "N/A".to_string()),
                    index,
                    order: entry.order.unwrap_or(index as i64),
                    scope: derive_scope(&entry),
                    status: derive_status(report.extension_error(index)),
                    id,
                }
            })
            .collect();

        extensions.sort_by(|a, b| {
            a.status
                .rank()
                .cmp(&b.status.rank())
                .then_with(|| a.scope.rank().cmp(&b.scope.rank()))
                .then_with(|| a.order.cmp(&b.order))
        });
        debug!("扩展分析完成 | 扩展数: {}", extensions.len());
        extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_priority() {
        let entry = |v| ExtensionEntry::from_value(&v).unwrap();
        assert_eq!(derive_scope(&entry(json!({"blr": 1, "alr": 1}))), ExtensionScope::BeforeLoadRules);
        assert_eq!(derive_scope(&entry(json!({"alr": 1, "end": 1}))), ExtensionScope::AfterLoadRules);
        assert_eq!(derive_scope(&entry(json!({"end": 1}))), ExtensionScope::AfterTags);
        assert_eq!(derive_scope(&entry(json!({}))), ExtensionScope::DomReady);
    }

    #[test]
    fn test_status_from_report() {
        assert_eq!(derive_status(Some(true)), ExtensionStatus::Error);
        assert_eq!(derive_status(Some(false)), ExtensionStatus::Ok);
        assert_eq!(derive_status(None), ExtensionStatus::NotRun);
    }

    #[test]
    fn test_analyze_sorting() {
        let runtime = RuntimeState::from_json_str(
            r#"{"extensions":[
                {"id":"3","blr":1},
                {"id":"4","name":"Set page type"},
                {"id":"5","end":1},
                {"id":"6","alr":1,"order":9},
                {"id":"7","alr":1,"order":2}
            ],"rpt":{"ex_1":0,"ex_3":1,"ex_4":0}}"#,
        )
        .unwrap();
        let report = ReportTable::new(runtime.rpt.as_ref());
        let extensions = ExtensionAnalyzer::analyze(&runtime, &report);

        let order: Vec<(&str, ExtensionStatus)> = extensions.iter().map(|e| (e.id.as_str(), e.status)).collect();
        assert_eq!(
            order,
            vec![
                ("7", ExtensionStatus::Ok),
                ("4", ExtensionStatus::Ok),
                ("6", ExtensionStatus::Error),
                ("3", ExtensionStatus::NotRun),
                ("5", ExtensionStatus::NotRun),
            ]
        );
        assert_eq!(extensions[1].name, "Set page type");
        assert_eq!(extensions[3].scope, ExtensionScope::BeforeLoadRules);
    }
}
