//! loader 配置源码提取：每个标签的 load / send 表达式引用了哪些加载规则
//!
//! 处理流程：
//! 1. 定位 loader 配置对象字面量（锚点优先，缺失时走兜底模式）
//! 2. 中间条目：以下一个同级键为边界截取子对象
//! 3. 末尾条目：后面没有同级键，单独用括号平衡扫描补一遍
//! 4. 子对象内读取 load: / send: 表达式，扫描条件表引用

use std::collections::{BTreeMap, BTreeSet};

use regex::Match;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::extracted::Extracted;
use super::patterns::SourcePatterns;
use super::scan::{find_matching_close, read_expression};
use crate::utils::preview::preview_compact;

/// 单个标签的规则引用
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRuleRef {
    /// load 表达式引用的规则 ID
    pub load: BTreeSet<String>,
    /// send 表达式引用的规则 ID
    pub send: BTreeSet<String>,
    /// load 表达式原文
    pub load_expression: Option<String>,
    /// send 表达式原文
    pub send_expression: Option<String>,
}

impl TagRuleRef {
    pub fn is_empty(&self) -> bool {
        self.load.is_empty() && self.send.is_empty()
    }
}

/// 标签 uid → 规则引用
pub type TagRuleRefs = BTreeMap<String, TagRuleRef>;

/// 从 loader 配置初始化函数源码中提取每个标签的规则引用
pub fn extract_tag_rule_refs(source: Option<&str>, patterns: &SourcePatterns) -> Extracted<TagRuleRefs> {
    let Some(source) = source else {
        debug!("loader 配置源码不可用，跳过标签规则引用提取");
        return Extracted::NoSource;
    };

    let Some(body) = locate_config_body(source, patterns) else {
        warn!("loader 配置对象未找到 | 源码预览: {}", preview_compact(source, 120));
        return Extracted::NotFound;
    };

    let keys: Vec<Match<'_>> = patterns.tag_key.find_iter(body).collect();
    let mut refs = TagRuleRefs::new();

    // 中间条目：边界为下一个同级键
    for pair in keys.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        let Some(uid) = key_uid(patterns, current) else {
            continue;
        };
        let entry = interior_entry(&body[current.end()..next.start()]);
        merge_entry(&mut refs, uid, entry, patterns);
    }

    // 末尾条目：后面没有逗号和同级键，单独扫描
    if let Some(last) = keys.last() {
        if let Some(uid) = key_uid(patterns, *last) {
            let open = last.end() - 1;
            let entry = match find_matching_close(body, open) {
                Some(close) => &body[open + 1..close],
                None => {
                    debug!("末尾条目括号不平衡，截取至对象结尾 | uid: {}", uid);
                    &body[last.end()..]
                }
            };
            merge_entry(&mut refs, uid, entry, patterns);
        }
    }

    debug!("标签规则引用提取完成 | 条目数: {} | 含规则引用: {}", refs.len(), refs.values().filter(|r| !r.is_empty()).count());
    Extracted::Found(refs)
}

/// 定位配置对象字面量，返回 `{...}` 内部文本
fn locate_config_body<'a>(source: &'a str, patterns: &SourcePatterns) -> Option<&'a str> {
    let open = match patterns.loader_anchor.find(source) {
        Some(m) => m.end() - 1,
        None => {
            let m = patterns.loader_fallback.find(source)?;
            debug!("loader 配置锚点缺失，使用兜底模式定位");
            m.start() + source[m.start()..].find('{')?
        }
    };
    match find_matching_close(source, open) {
        Some(close) => Some(&source[open + 1..close]),
        // 源码被截断时取到结尾
        None => Some(&source[open + 1..]),
    }
}

fn key_uid<'a>(patterns: &SourcePatterns, key: Match<'a>) -> Option<&'a str> {
    patterns
        .tag_key
        .captures(key.as_str())
        .and_then(|c| c.name("uid"))
        .map(|m| m.as_str())
}

/// 中间条目原文形如 `load:1,send:1},`，去掉尾部的逗号与闭括号
fn interior_entry(raw: &str) -> &str {
    let trimmed = raw.trim_end();
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed).trim_end();
    trimmed.strip_suffix('}').unwrap_or(trimmed)
}

fn merge_entry(refs: &mut TagRuleRefs, uid: &str, entry: &str, patterns: &SourcePatterns) {
    let record = refs.entry(uid.to_string()).or_default();
    let mut seen_load = false;
    let mut seen_send = false;

    for caps in patterns.property.captures_iter(entry) {
        let (Some(prop), Some(whole)) = (caps.name("prop"), caps.get(0)) else {
            continue;
        };
        let expression = read_expression(entry, whole.end());
        let ids = rule_ids(expression, patterns);
        match prop.as_str() {
            "load" if !seen_load => {
                seen_load = true;
                record.load.extend(ids);
                record.load_expression = Some(expression.to_string());
            }
            "send" if !seen_send => {
                seen_send = true;
                record.send.extend(ids);
                record.send_expression = Some(expression.to_string());
            }
            _ => {}
        }
    }
}

/// 表达式中引用的规则 ID（去重）
pub fn rule_ids(expression: &str, patterns: &SourcePatterns) -> BTreeSet<String> {
    patterns
        .rule_ref
        .captures_iter(expression)
        .filter_map(|c| c.name("id").map(|m| m.as_str().to_string()))
        .collect()
}
