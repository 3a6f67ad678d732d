//! 条件表达式解析器
//! 流程：模板匹配（记录已使用文本区间）→ 顶层拆分补全剩余操作数 → 原样兜底
//! 对任何输入都返回至少一条结果，不会 panic

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::model::{ConditionFragment, ConditionKind};
use super::splitter::{split_top_level, strip_outer_parens, Operand};
use super::templates::TEMPLATES;
use crate::utils::preview::preview_compact;

/// 引用其他加载规则：c[3] / utag.cond[3] / !c[3]（默认条件表名；分析器会换成按配置编译的模式）
static RULE_REF: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"^(?P<neg>!\s*)?(?:\butag\.cond|\bc)\[\s*['"]?(?P<id>\d+)['"]?\s*\]$"#).ok()
});

/// 条件解析器
#[derive(Debug, Clone)]
pub struct ConditionParser {
    max_depth: usize,
    rule_atom: Option<Regex>,
}

impl Default for ConditionParser {
    fn default() -> Self {
        Self {
            max_depth: 16,
            rule_atom: None,
        }
    }
}

/// 使用默认配置解析单个条件表达式
pub fn parse_condition(expr: &str) -> Vec<ConditionFragment> {
    ConditionParser::default().parse(expr)
}

impl ConditionParser {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
            rule_atom: None,
        }
    }

    /// 使用按条件表名编译的规则引用模式（见 `SourcePatterns::rule_atom`）
    pub fn with_rule_atom(mut self, rule_atom: Regex) -> Self {
        self.rule_atom = Some(rule_atom);
        self
    }

    /// 解析条件表达式，返回按原文位置排序的可读条件列表
    pub fn parse(&self, expr: &str) -> Vec<ConditionFragment> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return vec![ConditionFragment::new(expr, "No condition", ConditionKind::Custom)];
        }

        let templates = match TEMPLATES.as_ref() {
            Ok(templates) => templates,
            Err(e) => {
                warn!("条件模板不可用，返回错误条目：{}", e);
                return vec![ConditionFragment::error(expr, format!("Condition templates unavailable: {}", e))];
            }
        };

        // 1. 模板匹配：已使用的文本区间不再被后续模板重复描述
        let mut used: Vec<(usize, usize)> = Vec::new();
        let mut positioned: Vec<(usize, ConditionFragment)> = Vec::new();
        for template in templates {
            for caps in template.regex.captures_iter(trimmed) {
                let Some(m) = caps.get(0) else {
                    continue;
                };
                if overlaps(&used, m.start(), m.end()) {
                    continue;
                }
                used.push((m.start(), m.end()));
                positioned.push((
                    m.start(),
                    ConditionFragment::new(m.as_str(), template.describe(&caps), ConditionKind::Matched),
                ));
            }
        }

        // 2. 模板全部未命中：存在顶层运算符则拆分描述，否则原样输出
        if positioned.is_empty() {
            let operands = split_top_level(trimmed);
            if operands.len() < 2 {
                if let Some(text) = self.humanize_atom(strip_outer_parens(trimmed)) {
                    return vec![ConditionFragment::new(trimmed, text, ConditionKind::Custom)];
                }
                debug!("条件无法识别，原样输出：{}", preview_compact(trimmed, 80));
                return vec![ConditionFragment::new(trimmed, trimmed, ConditionKind::Custom)];
            }
            return match self.describe_compound(&operands, 1) {
                Ok(text) => vec![ConditionFragment::new(trimmed, text, ConditionKind::Complex)],
                Err(reason) => vec![ConditionFragment::error(trimmed, reason)],
            };
        }

        // 3. 部分命中：顶层操作数中完全未被模板覆盖的部分补为 custom 条目
        let operands = split_top_level(trimmed);
        if operands.len() > 1 {
            for operand in operands {
                let end = operand.start + operand.text.len();
                if operand.text.is_empty() || overlaps(&used, operand.start, end) {
                    continue;
                }
                let text = self.humanize_atom(strip_outer_parens(operand.text)).unwrap_or_else(|| operand.text.to_string());
                positioned.push((operand.start, ConditionFragment::new(operand.text, text, ConditionKind::Custom)));
            }
        }

        positioned.sort_by_key(|(start, _)| *start);
        positioned.into_iter().map(|(_, fragment)| fragment).collect()
    }

    /// 递归描述组合表达式：操作数间以 AND / OR 连接，嵌套组合加括号
    fn describe_compound(&self, operands: &[Operand<'_>], depth: usize) -> Result<String, String> {
        if depth > self.max_depth {
            return Err(format!("Expression nested deeper than {} levels", self.max_depth));
        }

        let mut text = String::new();
        for operand in operands {
            let inner = strip_outer_parens(operand.text);
            let nested = split_top_level(inner);
            let described = if nested.len() > 1 {
                format!("({})", self.describe_compound(&nested, depth + 1)?)
            } else {
                self.humanize_atom(inner).unwrap_or_else(|| inner.to_string())
            };
            text.push_str(&described);
            if let Some(op) = operand.op {
                text.push(' ');
                text.push_str(op.as_word());
                text.push(' ');
            }
        }
        Ok(text)
    }

    /// 模板之外的原子条件：规则引用与布尔常量
    fn humanize_atom(&self, atom: &str) -> Option<String> {
        match atom {
            "true" | "1" | "!0" => return Some("Always".to_string()),
            "false" | "0" | "!1" => return Some("Never".to_string()),
            _ => {}
        }
        let rule_atom = self.rule_atom.as_ref().or(RULE_REF.as_ref())?;
        let caps = rule_atom.captures(atom)?;
        let id = caps.name("id")?.as_str();
        let state = if caps.name("neg").is_some() { "false" } else { "true" };
        Some(format!("Load Rule {} is {}", id, state))
    }
}

fn overlaps(used: &[(usize, usize)], start: usize, end: usize) -> bool {
    used.iter().any(|&(s, e)| start < e && s < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_equality_yields_single_entry() {
        let result = parse_condition("d['customer_type']=='returning'");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, r#"Data Layer Variable "customer_type" equals "returning""#);
        assert_eq!(result[0].kind, ConditionKind::Matched);
        assert_eq!(result[0].original, "d['customer_type']=='returning'");
    }

    #[test]
    fn test_compound_expression_lists_each_match_in_order() {
        let result = parse_condition(
            "d['page_type'].toString().toLowerCase()=='checkout'.toLowerCase() && typeof d['order_id']!='undefined'",
        );
        let texts: Vec<_> = result.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                r#"Data Layer Variable "page_type" equals "checkout" (ignore case)"#,
                r#"Data Layer Variable "order_id" is defined"#,
            ]
        );
    }

    #[test]
    fn test_unmatched_operands_are_kept() {
        let result = parse_condition("d['a']=='x' && c[3]");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].kind, ConditionKind::Matched);
        assert_eq!(result[1].kind, ConditionKind::Custom);
        assert_eq!(result[1].text, "Load Rule 3 is true");
    }

    #[test]
    fn test_complex_split_when_no_template_matches() {
        let result = parse_condition("c[3] && (!c[4] || window.foo)");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, ConditionKind::Complex);
        assert_eq!(result[0].text, "Load Rule 3 is true AND (Load Rule 4 is false OR window.foo)");
    }

    #[test]
    fn test_parser_is_total() {
        // 测试场景：空串 / 引号不闭合 / 纯符号，都必须返回至少一条
        for input in ["", "   ", "d['x", "'\"", "&&", "((((", "window.foo == 1"] {
            let result = parse_condition(input);
            assert!(!result.is_empty(), "input {:?} produced no entries", input);
        }
        assert_eq!(parse_condition("")[0].kind, ConditionKind::Custom);
        assert_eq!(parse_condition("window.foo == 1")[0].text, "window.foo == 1");
    }

    #[test]
    fn test_depth_limit_reports_error() {
        let parser = ConditionParser::new(1);
        let result = parser.parse("a && (b || (c && d))");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, ConditionKind::Error);
    }

    #[test]
    fn test_rule_refs_follow_configured_tables() {
        use crate::config::ConfigManager;
        use crate::extractor::SourcePatterns;

        let config = ConfigManager::custom().condition_tables(["_pc"]).build();
        let patterns = SourcePatterns::compile(&config).unwrap();
        let parser = ConditionParser::new(config.max_condition_depth).with_rule_atom(patterns.rule_atom.clone());

        assert_eq!(parser.parse("!_pc[7]")[0].text, "Load Rule 7 is false");
        // 未配置的表名不再识别为规则引用
        assert_eq!(parser.parse("c[7]")[0].text, "c[7]");
    }
}
