//! 提取结果占位值
//! 源码提取失败不抛错，而是返回显式的占位值，调用方必须区分处理

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Extracted<T> {
    /// 提取成功
    Found(T),
    /// 源码存在，但未匹配到目标片段
    NotFound,
    /// 源码本身不可用
    NoSource,
}

impl<T> Extracted<T> {
    pub const NOT_FOUND: &'static str = "not found";
    pub const NO_SOURCE: &'static str = "no function available";

    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Extracted::Found(v),
            None => Extracted::NotFound,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extracted::Found(_))
    }

    pub fn as_found(&self) -> Option<&T> {
        match self {
            Extracted::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_found(self) -> Option<T> {
        match self {
            Extracted::Found(v) => Some(v),
            _ => None,
        }
    }

    /// 占位文本（成功时为 None）
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Extracted::Found(_) => None,
            Extracted::NotFound => Some(Self::NOT_FOUND),
            Extracted::NoSource => Some(Self::NO_SOURCE),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extracted<U> {
        match self {
            Extracted::Found(v) => Extracted::Found(f(v)),
            Extracted::NotFound => Extracted::NotFound,
            Extracted::NoSource => Extracted::NoSource,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Extracted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extracted::Found(v) => write!(f, "{}", v),
            Extracted::NotFound => f.write_str(Self::NOT_FOUND),
            Extracted::NoSource => f.write_str(Self::NO_SOURCE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_and_display() {
        let found = Extracted::from_option(Some("a && b".to_string()));
        assert!(found.is_found());
        assert_eq!(found.placeholder(), None);
        assert_eq!(found.to_string(), "a && b");

        let missing: Extracted<String> = Extracted::from_option(None);
        assert_eq!(missing.placeholder(), Some("not found"));
        assert_eq!(Extracted::<String>::NoSource.to_string(), "no function available");
        assert_eq!(Extracted::<String>::NoSource.map(|s| s.len()), Extracted::NoSource);
    }

    #[test]
    fn test_serialized_state_tag() {
        let json = serde_json::to_string(&Extracted::Found(3)).unwrap();
        assert_eq!(json, r#"{"state":"found","value":3}"#);
        let json = serde_json::to_string(&Extracted::<u8>::NotFound).unwrap();
        assert_eq!(json, r#"{"state":"not_found"}"#);
    }
}
