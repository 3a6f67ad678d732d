//! Profile 定位：从 utag.js 地址或 utag.cfg.path 中解析 account / profile / environment

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{InspectResult, InspectorError};

/// /utag/<account>/<profile>/<env>/[utag.js]
static PROFILE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/utag/(?P<account>[^/?#]+)/(?P<profile>[^/?#]+)/(?P<env>[^/?#]+)(?:/(?P<file>[^/?#]*))?")
        .unwrap()
});

/// 已定位的 Profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLocation {
    pub account: String,
    pub profile: String,
    pub environment: String,
    /// 规范化后的绝对地址
    pub url: String,
}

impl ProfileLocation {
    /// 解析 utag.js 地址或 cfg.path；协议相对地址使用 `default_scheme` 补全
    pub fn parse(raw: &str, default_scheme: &str) -> InspectResult<Self> {
        let url = absolutize(raw, default_scheme)?;
        let caps = PROFILE_PATH
            .captures(url.path())
            .ok_or_else(|| InspectorError::InvalidInput(format!("不是 utag Profile 地址：{}", raw)))?;

        // utag.js 之外的文件（如 utag.7.js）同样位于 Profile 目录下，env 段不会是文件名
        Ok(Self {
            account: caps["account"].to_string(),
            profile: caps["profile"].to_string(),
            environment: caps["env"].to_string(),
            url: url.to_string(),
        })
    }

    /// utid 形如 `account/profile/202301010000`
    pub fn from_utid(utid: &str) -> Option<(String, String)> {
        let mut parts = utid.split('/');
        let account = parts.next().filter(|s| !s.is_empty())?;
        let profile = parts.next().filter(|s| !s.is_empty())?;
        Some((account.to_string(), profile.to_string()))
    }

    /// 是否为 utag 主加载脚本（utag.js / utag.sync.js）
    pub fn is_loader_script(raw: &str) -> bool {
        let path = raw.split(['?', '#']).next().unwrap_or_default();
        path.ends_with("/utag.js") || path.ends_with("/utag.sync.js")
    }
}

/// 把协议相对 / 无协议地址补全为绝对地址
pub fn absolutize(raw: &str, default_scheme: &str) -> InspectResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InspectorError::InvalidInput("地址为空".to_string()));
    }
    let candidate = if raw.starts_with("//") {
        format!("{}:{}", default_scheme, raw)
    } else if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{}://{}", default_scheme, raw.trim_start_matches('/'))
    };
    Ok(Url::parse(&candidate)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_protocol_relative_path() {
        let loc = ProfileLocation::parse("//tags.tiqcdn.com/utag/acme/main/prod/", "https").unwrap();
        assert_eq!(loc.account, "acme");
        assert_eq!(loc.profile, "main");
        assert_eq!(loc.environment, "prod");
        assert_eq!(loc.url, "https://tags.tiqcdn.com/utag/acme/main/prod/");
    }

    #[test]
    fn test_parse_loader_script_url() {
        let loc = ProfileLocation::parse("https://tags.tiqcdn.com/utag/acme/web/qa/utag.js?v=1", "https").unwrap();
        assert_eq!(loc.environment, "qa");
        assert!(ProfileLocation::is_loader_script("https://tags.tiqcdn.com/utag/acme/web/qa/utag.js?v=1"));
        assert!(!ProfileLocation::is_loader_script("https://tags.tiqcdn.com/utag/acme/web/qa/utag.7.js"));
    }

    #[test]
    fn test_non_profile_url_is_rejected() {
        assert!(ProfileLocation::parse("https://cdn.example.com/app.js", "https").is_err());
        assert!(ProfileLocation::parse("", "https").is_err());
    }

    #[test]
    fn test_from_utid() {
        assert_eq!(
            ProfileLocation::from_utid("acme/main/202301010000"),
            Some(("acme".to_string(), "main".to_string()))
        );
        assert_eq!(ProfileLocation::from_utid("acme"), None);
    }
}
