//! 条件模板库
//! 模板顺序即优先级：越具体的模板越靠前（忽略大小写的 contains 必须先于通用的"变量存在"），
//! 否则通用模板会抢先吞掉同一段文本

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// 数据层变量访问：d['x'] / d["x"] / b['x'] / utag.data['x'] / d.x
const VAR: &str = r#"(?:\b[db]|utag\.data)(?:\[\s*['"](?P<var>[^'"\]]+)['"]\s*\]|\.(?P<dvar>[A-Za-z_$][\w$]*))"#;
/// 字符串字面量
const VAL: &str = r#"['"](?P<val>[^'"]*)['"]"#;
/// indexOf 命中 / 未命中的比较写法
const FOUND: &str = r"(?:>\s*-1|>=\s*0|!==?\s*-1)";
const NOT_FOUND: &str = r"(?:<\s*0|===?\s*-1)";
const TO_LOWER: &str = r"\.toString\(\)\.toLowerCase\(\)";

type Describe = fn(&Captures) -> String;

/// 单个条件模板
pub struct ConditionTemplate {
    pub name: &'static str,
    pub regex: Regex,
    describe: Describe,
}

impl ConditionTemplate {
    fn new(name: &'static str, pattern: String, describe: Describe) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(&pattern)?,
            describe,
        })
    }

    pub fn describe(&self, caps: &Captures) -> String {
        (self.describe)(caps)
    }
}

/// 全局模板表（仅编译一次）；编译失败时保留错误信息，由解析器转为 error 条目
pub static TEMPLATES: Lazy<Result<Vec<ConditionTemplate>, String>> =
    Lazy::new(|| build_templates().map_err(|e| e.to_string()));

fn build_templates() -> Result<Vec<ConditionTemplate>, regex::Error> {
    Ok(vec![
        // ---------- 页面级检查（不经过数据层） ----------
        ConditionTemplate::new(
            "location_contains",
            format!(r"(?:(?:document|window)\.)?location\.(?P<part>href|pathname|hostname|search|hash)(?:\.toString\(\))?(?:\.toLowerCase\(\))?\.indexOf\(\s*{VAL}(?:\.toLowerCase\(\))?\s*\)\s*{FOUND}"),
            |c| format!("{} contains \"{}\"", location_part(group(c, "part")), group(c, "val")),
        )?,
        ConditionTemplate::new(
            "title_contains",
            format!(r"document\.title(?:\.toLowerCase\(\))?\.indexOf\(\s*{VAL}(?:\.toLowerCase\(\))?\s*\)\s*{FOUND}"),
            |c| format!("Page Title contains \"{}\"", group(c, "val")),
        )?,
        ConditionTemplate::new(
            "cookie_contains",
            format!(r"document\.cookie\.indexOf\(\s*{VAL}\s*\)\s*{FOUND}"),
            |c| format!("Cookie string contains \"{}\"", group(c, "val")),
        )?,
        // ---------- 忽略大小写 ----------
        ConditionTemplate::new(
            "contains_ignore_case",
            format!(r"{VAR}{TO_LOWER}\.indexOf\(\s*{VAL}(?:\.toLowerCase\(\))?\s*\)\s*{FOUND}"),
            |c| format!("{} contains \"{}\" (ignore case)", variable(c), group(c, "val")),
        )?,
        ConditionTemplate::new(
            "not_contains_ignore_case",
            format!(r"{VAR}{TO_LOWER}\.indexOf\(\s*{VAL}(?:\.toLowerCase\(\))?\s*\)\s*{NOT_FOUND}"),
            |c| format!("{} does not contain \"{}\" (ignore case)", variable(c), group(c, "val")),
        )?,
        ConditionTemplate::new(
            "equals_ignore_case",
            format!(r"{VAR}{TO_LOWER}\s*===?\s*{VAL}(?:\.toLowerCase\(\))?"),
            |c| format!("{} equals \"{}\" (ignore case)", variable(c), group(c, "val")),
        )?,
        ConditionTemplate::new(
            "not_equals_ignore_case",
            format!(r"{VAR}{TO_LOWER}\s*!==?\s*{VAL}(?:\.toLowerCase\(\))?"),
            |c| format!("{} does not equal \"{}\" (ignore case)", variable(c), group(c, "val")),
        )?,
        // ---------- 区分大小写 contains ----------
        ConditionTemplate::new(
            "contains",
            format!(r"{VAR}(?:\.toString\(\))?\.indexOf\(\s*{VAL}\s*\)\s*{FOUND}"),
            |c| format!("{} contains \"{}\"", variable(c), group(c, "val")),
        )?,
        ConditionTemplate::new(
            "not_contains",
            format!(r"{VAR}(?:\.toString\(\))?\.indexOf\(\s*{VAL}\s*\)\s*{NOT_FOUND}"),
            |c| format!("{} does not contain \"{}\"", variable(c), group(c, "val")),
        )?,
        // ---------- 正则 ----------
        ConditionTemplate::new(
            "not_matches_regex",
            format!(r"!\s*/(?P<re>(?:[^/\\\n]|\\.)+)/(?P<flags>[gimsuy]*)\.test\(\s*{VAR}(?:\.toString\(\))?\s*\)"),
            |c| format!("{} does not match regex /{}/{}", variable(c), group(c, "re"), group(c, "flags")),
        )?,
        ConditionTemplate::new(
            "matches_regex",
            format!(r"/(?P<re>(?:[^/\\\n]|\\.)+)/(?P<flags>[gimsuy]*)\.test\(\s*{VAR}(?:\.toString\(\))?\s*\)"),
            |c| format!("{} matches regex /{}/{}", variable(c), group(c, "re"), group(c, "flags")),
        )?,
        // ---------- 定义检查 ----------
        ConditionTemplate::new(
            "is_defined",
            format!(r#"typeof\s*\(?\s*{VAR}\s*\)?\s*!==?\s*['"]undefined['"]"#),
            |c| format!("{} is defined", variable(c)),
        )?,
        ConditionTemplate::new(
            "is_not_defined",
            format!(r#"typeof\s*\(?\s*{VAR}\s*\)?\s*===?\s*['"]undefined['"]"#),
            |c| format!("{} is not defined", variable(c)),
        )?,
        ConditionTemplate::new(
            "is_not_empty",
            format!(r#"{VAR}\s*!==?\s*['"]['"]"#),
            |c| format!("{} is populated", variable(c)),
        )?,
        // ---------- 等值比较 ----------
        ConditionTemplate::new(
            "equals",
            format!(r"{VAR}(?:\.toString\(\))?\s*===?\s*{VAL}"),
            |c| format!("{} equals \"{}\"", variable(c), group(c, "val")),
        )?,
        ConditionTemplate::new(
            "not_equals",
            format!(r"{VAR}(?:\.toString\(\))?\s*!==?\s*{VAL}"),
            |c| format!("{} does not equal \"{}\"", variable(c), group(c, "val")),
        )?,
        ConditionTemplate::new(
            "numeric_compare",
            format!(r"(?:parseFloat|parseInt|Number)?\(?\s*{VAR}\s*\)?\s*(?P<op>>=|<=|>|<)\s*(?P<num>-?\d+(?:\.\d+)?)"),
            |c| format!("{} {} {}", variable(c), comparison(group(c, "op")), group(c, "num")),
        )?,
        // ---------- 通用存在性（必须最后） ----------
        ConditionTemplate::new(
            "not_set",
            format!(r"!\s*{VAR}"),
            |c| format!("{} is not set", variable(c)),
        )?,
        ConditionTemplate::new(
            "exists",
            VAR.to_string(),
            |c| format!("{} exists", variable(c)),
        )?,
    ])
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map(|m| m.as_str()).unwrap_or_default()
}

/// 取出变量名（方括号写法或点写法）并转换为可读名称
fn variable(caps: &Captures) -> String {
    let name = caps
        .name("var")
        .or_else(|| caps.name("dvar"))
        .map(|m| m.as_str())
        .unwrap_or_default();
    describe_variable(name)
}

/// 数据层变量名 → 可读名称
/// dom.* 为页面内置变量，cp./qp./meta./js_page. 为来源前缀
pub fn describe_variable(name: &str) -> String {
    match name {
        "dom.url" => return "Page URL".to_string(),
        "dom.pathname" => return "Page Path".to_string(),
        "dom.domain" => return "Page Domain".to_string(),
        "dom.title" => return "Page Title".to_string(),
        "dom.referrer" => return "Page Referrer".to_string(),
        "dom.query_string" => return "Query String".to_string(),
        "dom.hash" => return "URL Hash".to_string(),
        _ => {}
    }

    const PREFIXES: [(&str, &str); 5] = [
        ("cp.", "Cookie"),
        ("qp.", "Query Parameter"),
        ("meta.", "Meta Tag"),
        ("js_page.", "JavaScript Variable"),
        ("ut.", "Tealium Variable"),
    ];
    for (prefix, label) in PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            return format!("{} \"{}\"", label, rest);
        }
    }
    format!("Data Layer Variable \"{}\"", name)
}

fn location_part(part: &str) -> &'static str {
    match part {
        "pathname" => "Page Path",
        "hostname" => "Page Domain",
        "search" => "Query String",
        "hash" => "URL Hash",
        _ => "Page URL",
    }
}

fn comparison(op: &str) -> &'static str {
    match op {
        ">" => "is greater than",
        ">=" => "is greater than or equal to",
        "<" => "is less than",
        _ => "is less than or equal to",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match(input: &str) -> Option<(&'static str, String)> {
        let templates = TEMPLATES.as_ref().unwrap();
        templates.iter().find_map(|t| t.regex.captures(input).map(|c| (t.name, t.describe(&c))))
    }

    #[test]
    fn test_all_templates_compile() {
        assert!(TEMPLATES.is_ok());
    }

    #[test]
    fn test_specific_template_wins_over_generic() {
        let (name, text) =
            first_match("d['page_name'].toString().toLowerCase().indexOf('cart'.toLowerCase())>-1").unwrap();
        assert_eq!(name, "contains_ignore_case");
        assert_eq!(text, r#"Data Layer Variable "page_name" contains "cart" (ignore case)"#);
    }

    #[test]
    fn test_prefixed_variables() {
        assert_eq!(describe_variable("cp.utag_main_v_id"), r#"Cookie "utag_main_v_id""#);
        assert_eq!(describe_variable("qp.utm_source"), r#"Query Parameter "utm_source""#);
        assert_eq!(describe_variable("dom.url"), "Page URL");
        assert_eq!(describe_variable("order_id"), r#"Data Layer Variable "order_id""#);
    }

    #[test]
    fn test_dot_notation_and_typeof() {
        let (_, text) = first_match("typeof d.order_id!='undefined'").unwrap();
        assert_eq!(text, r#"Data Layer Variable "order_id" is defined"#);

        let (_, text) = first_match("b.page_type=='home'").unwrap();
        assert_eq!(text, r#"Data Layer Variable "page_type" equals "home""#);
    }

    #[test]
    fn test_location_and_regex_templates() {
        let (_, text) = first_match("document.location.pathname.indexOf('/checkout')>-1").unwrap();
        assert_eq!(text, r#"Page Path contains "/checkout""#);

        let (_, text) = first_match(r"/^\/shop/i.test(d['dom.pathname'])").unwrap();
        assert_eq!(text, r"Page Path matches regex /^\/shop/i");
    }
}
