//! 源码匹配模式
//! 表名来自配置，构造分析器时一次性编译；每个模式只负责一类片段

use regex::Regex;
use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::error::{InspectResult, InspectorError};

/// 编译后的源码匹配模式集合
#[derive(Debug, Clone)]
pub struct SourcePatterns {
    /// loader 配置赋值锚点：utag.loader.cfg = {
    pub loader_anchor: Regex,
    /// 锚点缺失时的兜底：任意 .cfg = { "数字":
    pub loader_fallback: Regex,
    /// 标签条目键："7": {
    pub tag_key: Regex,
    /// 条目内的 load: / send: 属性
    pub property: Regex,
    /// 条件表引用：utag.cond[12] / c[12]
    pub rule_ref: Regex,
    /// 整段只有一个规则引用：c[12] / !utag.cond[12]（条件可读化使用）
    pub rule_atom: Regex,
    /// switch 分支：case 12: / case '12':
    pub case_label: Regex,
    /// 条件表赋值：c[12] |= / c[12] =
    pub cond_assign: Regex,
    /// 条件守卫的标签调用块：if (c[12]) {
    pub cond_guard: Regex,
    /// 数据层变量：d["key"] / b['key']
    pub data_var: Regex,
    /// 字面量事件名：tealium_event: "purchase"
    pub event_literal: Regex,
    /// 事件调用：utag.link( / utag.view(
    pub event_call: Regex,
}

impl SourcePatterns {
    pub fn compile(config: &AnalyzerConfig) -> InspectResult<Self> {
        let cond = table_alternation(&config.condition_tables, "condition_tables")?;
        let data = table_alternation(&config.data_tables, "data_tables")?;
        let anchor = config.loader_cfg_anchor.trim();
        if anchor.is_empty() {
            return Err(InspectorError::InvalidInput("loader_cfg_anchor 不能为空".to_string()));
        }

        let patterns = Self {
            loader_anchor: Regex::new(&format!(r"{}\s*=\s*\{{", regex::escape(anchor)))?,
            loader_fallback: Regex::new(r#"\.cfg\s*=\s*\{\s*["']\d+["']\s*:"#)?,
            tag_key: Regex::new(r#"["'](?P<uid>\d+)["']\s*:\s*\{"#)?,
            property: Regex::new(r#"(?:^|[\s,{])["']?(?P<prop>load|send)["']?\s*:"#)?,
            rule_ref: Regex::new(&format!(r#"{cond}\[\s*["']?(?P<id>\d+)["']?\s*\]"#))?,
            rule_atom: Regex::new(&format!(r#"^(?P<neg>!\s*)?{cond}\[\s*["']?(?P<id>\d+)["']?\s*\]$"#))?,
            case_label: Regex::new(r#"\bcase\s*["']?(?P<id>\d+)["']?\s*:"#)?,
            cond_assign: Regex::new(&format!(r#"{cond}\[\s*["']?(?P<id>\d+)["']?\s*\]\s*(?P<op>\|=|=)"#))?,
            cond_guard: Regex::new(&format!(r#"\bif\s*\(\s*{cond}\[\s*["']?(?P<id>\d+)["']?\s*\]\s*\)\s*\{{"#))?,
            data_var: Regex::new(&format!(r#"{data}\[\s*["'](?P<key>[^"'\]]+)["']\s*\]"#))?,
            event_literal: Regex::new(
                r#"["']?(?:tealium_event|event_name)["']?\s*[:=]\s*["'](?P<event>[^"']+)["']"#,
            )?,
            event_call: Regex::new(r"\butag\.(?P<event>link|view|track)\s*\(")?,
        };
        debug!(
            "源码匹配模式编译完成 | 条件表: {:?} | 数据表: {:?}",
            config.condition_tables, config.data_tables
        );
        Ok(patterns)
    }
}

/// 表名列表 → 非捕获分组；以单词字符开头的名称加 \b，避免 abc[5] 误命中 c[5]
fn table_alternation(names: &[String], field: &str) -> InspectResult<String> {
    let parts: Vec<String> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(|n| {
            let escaped = regex::escape(n);
            let word_start = n.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
            if word_start { format!(r"\b{}", escaped) } else { escaped }
        })
        .collect();
    if parts.is_empty() {
        return Err(InspectorError::InvalidInput(format!("{} 至少需要一个表名", field)));
    }
    Ok(format!("(?:{})", parts.join("|")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;

    #[test]
    fn test_default_patterns_compile() {
        let patterns = SourcePatterns::compile(&AnalyzerConfig::default()).unwrap();
        assert!(patterns.rule_ref.is_match("utag.cond[12]"));
        assert!(patterns.rule_ref.is_match("c['12']"));
        assert!(!patterns.rule_ref.is_match("abc[12]"));
        assert!(patterns.rule_atom.is_match("!c[12]"));
        assert!(!patterns.rule_atom.is_match("c[12] && c[3]"));
        assert!(patterns.data_var.is_match(r#"b["page_name"]"#));
        assert!(patterns.loader_anchor.is_match("utag.loader.cfg = {"));
    }

    #[test]
    fn test_empty_table_list_is_rejected() {
        let config = ConfigManager::custom().condition_tables(Vec::<String>::new()).build();
        assert!(matches!(
            SourcePatterns::compile(&config),
            Err(InspectorError::InvalidInput(_))
        ));
    }
}
