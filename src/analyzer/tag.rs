//! 标签分析：状态分类、规则关联与加载地址解析

use tracing::{debug, warn};

use super::load_rule::RuleResults;
use super::numeric_id_key;
use crate::crossref::RuleTagIndex;
use crate::extractor::profile_locator::absolutize;
use crate::model::{TagRecord, TagStatus};
use crate::runtime::{LoadFlag, LoaderConfigEntry, ReportTable, RuntimeState};

const NOT_AVAILABLE: &str = "N/A";
const UNKNOWN: &str = "Unknown";
const BUNDLED: &str = "bundled";

/// 标签状态分类，只依赖四个输入；按优先级顺序首个命中的分支生效
pub fn classify_tag_status(load: &LoadFlag, send: bool, reported: bool, rule_result: Option<bool>) -> TagStatus {
    if load.is_falsy() {
        return TagStatus::NotLoaded;
    }
    if reported {
        return if send { TagStatus::Ok } else { TagStatus::NotSent };
    }
    if load.rule_id().is_some() {
        return if rule_result == Some(false) {
            TagStatus::ConditionFalse
        } else {
            TagStatus::NotReported
        };
    }
    if load.is_always_on() {
        return TagStatus::NotReported;
    }
    // 2 / 3 等未定义取值同样落到这里
    TagStatus::NotExecuted
}

/// 标签分析器
pub struct TagAnalyzer;

impl TagAnalyzer {
    /// 分析 loader 配置表中的全部标签，返回排序后的记录
    pub fn analyze(
        runtime: &RuntimeState,
        report: &ReportTable<'_>,
        results: &RuleResults,
        index: &RuleTagIndex,
        default_scheme: &str,
    ) -> Vec<TagRecord> {
        let Some(loader_cfg) = runtime.loader_cfg.as_ref() else {
            return Vec::new();
        };
        let cfg_path = runtime.cfg_string("path");
        let utag_version = runtime.cfg_string("v");

        let mut tags: Vec<TagRecord> = loader_cfg
            .iter()
            .map(|(uid, value)| match LoaderConfigEntry::from_value(value) {
                Some(entry) => {
                    let reported = report.tag_reported(uid);
                    let rule_result = entry.load.rule_id().and_then(|id| results.result(&id));
                    let status = classify_tag_status(&entry.load, entry.send, reported, rule_result);
                    let location =
                        resolve_location(uid, &entry, cfg_path.as_deref(), utag_version.as_deref(), default_scheme);
                    Self::build_record(uid, entry, status, location, index)
                }
                None => {
                    warn!("标签配置不是对象，降级为 Unknown | uid: {}", uid);
                    Self::build_record(uid, LoaderConfigEntry::default(), TagStatus::Unknown, UNKNOWN.to_string(), index)
                }
            })
            .collect();

        tags.sort_by(|a, b| {
            a.status
                .rank()
                .cmp(&b.status.rank())
                .then_with(|| numeric_id_key(&a.uid).cmp(&numeric_id_key(&b.uid)))
        });
        debug!("标签分析完成 | 标签数: {}", tags.len());
        tags
    }

    fn build_record(
        uid: &str,
        entry: LoaderConfigEntry,
        status: TagStatus,
        location: String,
        index: &RuleTagIndex,
    ) -> TagRecord {
        let rules = index.rules_for_tag(uid);
        let mut load_rule_ids = rules.load;
        if let Some(id) = entry.load.rule_id() {
            load_rule_ids.insert(id);
        }

        TagRecord {
            uid: uid.to_string(),
            name: entry.name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            template_id: entry.template_id.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            version: entry.version.unwrap_or_else(|| UNKNOWN.to_string()),
            consent_category: entry.consent_category.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            is_bundled: entry.load.is_bundled(),
            load_flag: entry.load,
            send_flag: entry.send,
            status,
            load_rule_ids,
            send_rule_ids: rules.send,
            location,
        }
    }
}

/// 标签加载地址：打包标签为 "bundled"；显式 src 优先，其次 `<cfg.path>utag.<uid>.js?utv=<v>`
pub fn resolve_location(
    uid: &str,
    entry: &LoaderConfigEntry,
    cfg_path: Option<&str>,
    utag_version: Option<&str>,
    default_scheme: &str,
) -> String {
    if entry.load.is_bundled() {
        return BUNDLED.to_string();
    }
    if let Some(src) = entry.src.as_deref() {
        if let Ok(url) = absolutize(src, default_scheme) {
            return url.to_string();
        }
    }
    let Some(path) = cfg_path else {
        return UNKNOWN.to_string();
    };

    let base = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    };
    let resolved = absolutize(&base, default_scheme)
        .and_then(|base| base.join(&format!("utag.{}.js", uid)).map_err(Into::into));
    match resolved {
        Ok(mut url) => {
            if let Some(v) = utag_version {
                url.query_pairs_mut().append_pair("utv", v);
            }
            url.to_string()
        }
        Err(e) => {
            debug!("标签地址解析失败 | uid: {} | 错误: {}", uid, e);
            UNKNOWN.to_string()
        }
    }
}
