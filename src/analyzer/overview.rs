//! Profile 概览与 utag.cfg 标量配置

use std::collections::BTreeMap;

use tracing::debug;

use crate::extractor::ProfileLocation;
use crate::model::Overview;
use crate::runtime::RuntimeState;
use crate::source::FunctionSources;
use crate::utils::js_value::as_display_string;

/// 概览构建器
pub struct OverviewBuilder;

impl OverviewBuilder {
    /// account / profile / environment 优先取自 cfg.path，缺失时回退到 utid
    pub fn build(runtime: &RuntimeState, sources: &FunctionSources, default_scheme: &str) -> Overview {
        let path = runtime.cfg_string("path");
        let publish_id = runtime.cfg_string("utid");

        let mut overview = Overview {
            utag_version: runtime.cfg_string("v"),
            data_layer_size: runtime.data_layer_size(),
            loader_source_available: sources.loader_cfg.is_some(),
            rules_source_available: sources.load_rules.is_some(),
            ..Default::default()
        };

        match path.as_deref().map(|p| ProfileLocation::parse(p, default_scheme)) {
            Some(Ok(location)) => {
                overview.account = Some(location.account);
                overview.profile = Some(location.profile);
                overview.environment = Some(location.environment);
            }
            Some(Err(e)) => debug!("cfg.path 解析失败，尝试 utid | 错误: {}", e),
            None => {}
        }
        if overview.account.is_none() {
            if let Some((account, profile)) = publish_id.as_deref().and_then(ProfileLocation::from_utid) {
                overview.account = Some(account);
                overview.profile = Some(profile);
            }
        }

        overview.path = path;
        overview.publish_id = publish_id;
        overview
    }

    /// utag.cfg 中的标量字段（对象/数组/空值跳过）
    pub fn config_map(runtime: &RuntimeState) -> BTreeMap<String, String> {
        runtime
            .cfg
            .iter()
            .flat_map(|cfg| cfg.iter())
            .filter_map(|(key, value)| as_display_string(value).map(|v| (key.clone(), v)))
            .collect()
    }
}
