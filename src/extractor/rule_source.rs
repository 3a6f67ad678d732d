//! 规则评估函数源码提取：单条加载规则的条件表达式、引用变量与触发事件
//!
//! 条件表达式：定位 `case <id>:` 分支（截至 `break;`），在分支内找到对条件表的赋值，
//! 再用括号平衡扫描取出完整表达式（表达式内可能有任意层嵌套括号）

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::extracted::Extracted;
use super::patterns::SourcePatterns;
use super::scan::{balanced_inner, find_matching_close, find_statement_keyword, read_expression, skip_whitespace};
use crate::utils::preview::preview_compact;

/// 单条加载规则的源码信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSourceInfo {
    pub rule_id: String,
    /// 条件表达式原文（不含最外层括号）
    pub condition: Extracted<String>,
    /// 条件表达式引用的数据层变量
    pub condition_variables: BTreeSet<String>,
    /// 条件守卫调用块引用的数据层变量
    pub trigger_variables: BTreeSet<String>,
    /// 调用块中的字面量事件名
    pub event_name: Option<String>,
}

impl RuleSourceInfo {
    fn placeholder(rule_id: &str, condition: Extracted<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            condition,
            condition_variables: BTreeSet::new(),
            trigger_variables: BTreeSet::new(),
            event_name: None,
        }
    }

    /// 条件与调用块引用的全部变量
    pub fn variables(&self) -> BTreeSet<String> {
        self.condition_variables.union(&self.trigger_variables).cloned().collect()
    }
}

/// 提取单条加载规则的条件表达式与引用变量
pub fn extract_rule_source(source: Option<&str>, rule_id: &str, patterns: &SourcePatterns) -> RuleSourceInfo {
    let Some(source) = source else {
        return RuleSourceInfo::placeholder(rule_id, Extracted::NoSource);
    };
    if rule_id.is_empty() || !rule_id.bytes().all(|b| b.is_ascii_digit()) {
        debug!("规则 ID 非数字，跳过源码提取 | rule_id: {}", rule_id);
        return RuleSourceInfo::placeholder(rule_id, Extracted::NotFound);
    }

    let condition = match case_branch(source, rule_id, patterns) {
        Some(branch) => extract_condition(branch, rule_id, patterns),
        None => {
            // 部分压缩形式没有 switch，直接在全文中查找赋值
            debug!("未找到 case 分支，全文查找条件赋值 | rule_id: {}", rule_id);
            extract_condition(source, rule_id, patterns)
        }
    };

    let condition_variables = condition
        .as_found()
        .map(|expr| data_variables(expr, patterns))
        .unwrap_or_default();

    let (trigger_variables, event_name) = match trigger_block(source, rule_id, patterns) {
        Some(block) => (data_variables(block, patterns), event_name(block, patterns)),
        None => (BTreeSet::new(), None),
    };

    if !condition.is_found() {
        debug!("规则条件未提取到 | rule_id: {} | 结果: {}", rule_id, condition);
    }

    RuleSourceInfo {
        rule_id: rule_id.to_string(),
        condition,
        condition_variables,
        trigger_variables,
        event_name,
    }
}

/// `case <id>:` 到 `break;` 之间的分支文本；没有 break 时截至下一个 case 或结尾
fn case_branch<'a>(source: &'a str, rule_id: &str, patterns: &SourcePatterns) -> Option<&'a str> {
    let label = patterns
        .case_label
        .captures_iter(source)
        .find(|c| c.name("id").is_some_and(|m| m.as_str() == rule_id))?
        .get(0)?;

    let rest = &source[label.end()..];
    let end = find_statement_keyword(rest, "break")
        .or_else(|| patterns.case_label.find(rest).map(|m| m.start()))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// 在给定文本中查找对 `<condTable>[<id>]` 的赋值，返回右侧表达式
fn extract_condition(text: &str, rule_id: &str, patterns: &SourcePatterns) -> Extracted<String> {
    for caps in patterns.cond_assign.captures_iter(text) {
        let (Some(id), Some(op)) = (caps.name("id"), caps.name("op")) else {
            continue;
        };
        if id.as_str() != rule_id {
            continue;
        }
        // `=` 后紧跟 `=` 是比较而非赋值
        if op.as_str() == "=" && text[op.end()..].starts_with('=') {
            continue;
        }

        let start = skip_whitespace(text, op.end());
        if text[start..].starts_with('(') {
            match balanced_inner(text, start) {
                Some(inner) => return Extracted::Found(inner.to_string()),
                None => {
                    // 括号不平衡的片段不可信，跳过这次赋值
                    warn!(
                        "条件表达式括号不平衡，跳过 | rule_id: {} | 片段: {}",
                        rule_id,
                        preview_compact(&text[start..], 80)
                    );
                    continue;
                }
            }
        }
        let expression = read_expression(text, start);
        if !expression.is_empty() {
            return Extracted::Found(expression.to_string());
        }
    }
    Extracted::NotFound
}

/// 由 `if (<condTable>[<id>]) {` 守卫的调用块正文
fn trigger_block<'a>(source: &'a str, rule_id: &str, patterns: &SourcePatterns) -> Option<&'a str> {
    let guard = patterns
        .cond_guard
        .captures_iter(source)
        .find(|c| c.name("id").is_some_and(|m| m.as_str() == rule_id))?
        .get(0)?;
    let open = guard.end() - 1;
    let close = find_matching_close(source, open)?;
    Some(&source[open + 1..close])
}

fn data_variables(text: &str, patterns: &SourcePatterns) -> BTreeSet<String> {
    patterns
        .data_var
        .captures_iter(text)
        .filter_map(|c| c.name("key").map(|m| m.as_str().to_string()))
        .collect()
}

fn event_name(block: &str, patterns: &SourcePatterns) -> Option<String> {
    patterns
        .event_literal
        .captures(block)
        .or_else(|| patterns.event_call.captures(block))
        .and_then(|c| c.name("event").map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;

    fn patterns() -> SourcePatterns {
        SourcePatterns::compile(&AnalyzerConfig::default()).unwrap()
    }

    const RULES_SOURCE: &str = r#"function(_pd,_pc){var d=_pd||utag.data;var c=_pc||utag.cond;
        for(var l in utag.loader.GV(c)){switch(l){
        case '5':try{c[5]|=(d['page_type'].toString().toLowerCase()=='home'.toLowerCase() && (d['x']=='1' || d['y']=='2'))}catch(e){utag.DB(e)};break;
        case '12':try{c[12]|=(typeof d['order_id']!='undefined')}catch(e){utag.DB(e)};break;
        case '13':try{c[13]=(d["customer_type"]=='returning')}catch(e){utag.DB(e)}}}
        if(c[12]){try{utag.link({"tealium_event":"purchase","order_total":b["order_total"],"currency":b["order_currency"]})}catch(e){}}
        }"#;

    #[test]
    fn test_balanced_extraction_round_trip() {
        let info = extract_rule_source(Some("c[5] |= (a && (b || c));"), "5", &patterns());
        assert_eq!(info.condition, Extracted::Found("a && (b || c)".to_string()));
    }

    #[test]
    fn test_case_branch_condition_and_variables() {
        let info = extract_rule_source(Some(RULES_SOURCE), "5", &patterns());
        assert_eq!(
            info.condition.as_found().map(String::as_str),
            Some("d['page_type'].toString().toLowerCase()=='home'.toLowerCase() && (d['x']=='1' || d['y']=='2')")
        );
        let vars: Vec<_> = info.condition_variables.iter().map(String::as_str).collect();
        assert_eq!(vars, vec!["page_type", "x", "y"]);
    }

    #[test]
    fn test_last_case_without_break() {
        let info = extract_rule_source(Some(RULES_SOURCE), "13", &patterns());
        assert_eq!(info.condition.as_found().map(String::as_str), Some(r#"d["customer_type"]=='returning'"#));
    }

    #[test]
    fn test_trigger_block_variables_and_event() {
        let info = extract_rule_source(Some(RULES_SOURCE), "12", &patterns());
        assert_eq!(info.event_name.as_deref(), Some("purchase"));
        assert!(info.trigger_variables.contains("order_total"));
        assert!(info.trigger_variables.contains("order_currency"));
        assert!(info.variables().contains("order_id"));
    }

    #[test]
    fn test_missing_rule_yields_placeholder() {
        let info = extract_rule_source(Some(RULES_SOURCE), "99", &patterns());
        assert_eq!(info.condition, Extracted::NotFound);
        assert_eq!(info.condition.to_string(), "not found");

        let info = extract_rule_source(None, "5", &patterns());
        assert_eq!(info.condition.to_string(), "no function available");
    }

    #[test]
    fn test_break_inside_identifier_does_not_end_branch() {
        let src = r#"switch(l){case '7':try{c[7]|=(d['price_breakdown']=='full')}catch(e){utag.DB(e)};break;
            case '8':try{c[8]|=(d['x']=='1')}catch(e){utag.DB(e)};break;}"#;
        let info = extract_rule_source(Some(src), "7", &patterns());
        assert_eq!(info.condition, Extracted::Found("d['price_breakdown']=='full'".to_string()));
        assert!(info.condition_variables.contains("price_breakdown"));

        let info = extract_rule_source(Some(src), "8", &patterns());
        assert_eq!(info.condition, Extracted::Found("d['x']=='1'".to_string()));
    }

    #[test]
    fn test_unbalanced_assignment_is_not_found() {
        let info = extract_rule_source(Some("c[5]|=(a && (b;"), "5", &patterns());
        assert_eq!(info.condition, Extracted::NotFound);
        assert!(info.condition_variables.is_empty());
    }
}
