//! 上报表 / 条件表的只读视图

use serde_json::{Map, Value};

use crate::utils::js_value::{is_truthy, tri_state};

/// 执行上报表视图（utag.rpt）
/// 键约定：l_<uid> 标签已加载，ex_<index> 扩展已执行，r_<ruleId> 规则结果
#[derive(Debug, Clone, Copy)]
pub struct ReportTable<'a> {
    entries: Option<&'a Map<String, Value>>,
}

impl<'a> ReportTable<'a> {
    pub const TAG_PREFIX: &'static str = "l_";
    pub const EXTENSION_PREFIX: &'static str = "ex_";
    pub const RULE_PREFIX: &'static str = "r_";

    pub fn new(entries: Option<&'a Map<String, Value>>) -> Self {
        Self { entries }
    }

    pub fn is_available(&self) -> bool {
        self.entries.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.entries?.get(key)
    }

    /// 标签是否出现在上报表中（仅判断存在性）
    pub fn tag_reported(&self, uid: &str) -> bool {
        self.get(&format!("{}{}", Self::TAG_PREFIX, uid)).is_some()
    }

    /// 扩展上报状态：None = 未执行，Some(true) = 执行出错，Some(false) = 正常
    pub fn extension_error(&self, index: usize) -> Option<bool> {
        self.get(&format!("{}{}", Self::EXTENSION_PREFIX, index))
            .map(is_truthy)
    }

    /// 所有 r_ 前缀的规则结果（规则 ID → 三态结果）
    pub fn rule_results(&self) -> impl Iterator<Item = (&'a str, Option<bool>)> + 'a {
        self.entries
            .into_iter()
            .flat_map(|m| m.iter())
            .filter_map(|(k, v)| {
                k.strip_prefix(Self::RULE_PREFIX)
                    .filter(|id| !id.is_empty())
                    .map(|id| (id, tri_state(v)))
            })
    }
}

/// 条件结果表视图（utag.cond）
#[derive(Debug, Clone, Copy)]
pub struct ConditionTable<'a> {
    entries: Option<&'a Map<String, Value>>,
}

impl<'a> ConditionTable<'a> {
    pub fn new(entries: Option<&'a Map<String, Value>>) -> Self {
        Self { entries }
    }

    pub fn is_available(&self) -> bool {
        self.entries.is_some()
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.entries.map(|m| m.contains_key(rule_id)).unwrap_or(false)
    }

    /// 规则实时结果（三态）
    pub fn result(&self, rule_id: &str) -> Option<bool> {
        self.entries?.get(rule_id).and_then(tri_state)
    }

    /// 所有规则 ID 与结果
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<bool>)> + 'a {
        self.entries
            .into_iter()
            .flat_map(|m| m.iter())
            .map(|(k, v)| (k.as_str(), tri_state(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_report_table_lookups() {
        let rpt = map(json!({"l_7": 1, "ex_0": 0, "ex_1": 1, "r_12": false, "ts": {"i": 1}}));
        let table = ReportTable::new(Some(&rpt));

        assert!(table.tag_reported("7"));
        assert!(!table.tag_reported("9"));
        assert_eq!(table.extension_error(0), Some(false));
        assert_eq!(table.extension_error(1), Some(true));
        assert_eq!(table.extension_error(2), None);

        let rules: Vec<_> = table.rule_results().collect();
        assert_eq!(rules, vec![("12", Some(false))]);
    }

    #[test]
    fn test_missing_tables_are_empty() {
        let report = ReportTable::new(None);
        assert!(!report.is_available());
        assert!(!report.tag_reported("7"));
        assert_eq!(report.rule_results().count(), 0);

        let cond = ConditionTable::new(None);
        assert_eq!(cond.result("12"), None);
        assert!(!cond.contains("12"));
    }

    #[test]
    fn test_condition_table_tri_state() {
        let cond = map(json!({"12": false, "13": 1, "14": null}));
        let table = ConditionTable::new(Some(&cond));
        assert_eq!(table.result("12"), Some(false));
        assert_eq!(table.result("13"), Some(true));
        assert_eq!(table.result("14"), None);
        assert!(table.contains("14"));
    }
}
