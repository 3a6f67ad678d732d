//! HTML标签提取器
//! 负责从页面HTML中提取 utag 加载脚本地址，并定位对应的 Profile

use std::cell::RefCell;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;
use tracing::debug;

use super::profile_locator::ProfileLocation;

#[derive(Debug, Default, Clone)]
pub struct HtmlExtractor {
    script_srcs: RefCell<Vec<String>>,
    // 是否存在内联的 utag_data 数据层声明
    inline_data_layer: RefCell<bool>,
    in_script: RefCell<bool>,
}

impl TokenSink for HtmlExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(Tag { kind: TagKind::StartTag, name, attrs, .. }) if name.as_ref() == "script" => {
                self.extract_script_src(&attrs);
                *self.in_script.borrow_mut() = true;
                // 脚本内容按原始文本切分，内联代码中的 < 不会被当作标签
                return TokenSinkResult::RawData(RawKind::ScriptData);
            }
            Token::TagToken(Tag { kind: TagKind::EndTag, name, .. }) if name.as_ref() == "script" => {
                *self.in_script.borrow_mut() = false;
            }
            Token::CharacterTokens(text) if *self.in_script.borrow() => {
                if text.contains("utag_data") {
                    *self.inline_data_layer.borrow_mut() = true;
                }
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

impl HtmlExtractor {
    /// 创建新的提取器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从HTML字符串提取标签
    pub fn extract(&self, html: &str) -> Self {
        let tokenizer = Tokenizer::new(self.clone(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink
    }

    /// 提取script-src
    fn extract_script_src(&self, attrs: &[Attribute]) {
        for attr in attrs {
            if attr.name.local.as_ref() == "src" {
                self.script_srcs.borrow_mut().push(attr.value.to_string());
                break;
            }
        }
    }

    /// 获取提取到的script-src列表
    pub fn get_script_srcs(&self) -> Vec<String> {
        self.script_srcs.borrow().clone()
    }

    /// 页面中是否内联声明了 utag_data
    pub fn has_inline_data_layer(&self) -> bool {
        *self.inline_data_layer.borrow()
    }

    /// 页面引用的所有 utag Profile（按出现顺序，去重）
    pub fn locate_profiles(&self, default_scheme: &str) -> Vec<ProfileLocation> {
        let mut located: Vec<ProfileLocation> = Vec::new();
        for src in self.script_srcs.borrow().iter() {
            if !ProfileLocation::is_loader_script(src) {
                continue;
            }
            match ProfileLocation::parse(src, default_scheme) {
                Ok(loc) if !located.contains(&loc) => located.push(loc),
                Ok(_) => {}
                Err(e) => debug!("utag 脚本地址无法解析为 Profile：{} | {}", src, e),
            }
        }
        located
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_extractor() {
        let html = r#"
            <script>var utag_data = {page_type: "home"};</script>
            <script src="/jquery.min.js"></script>
            <script src="//tags.tiqcdn.com/utag/acme/main/prod/utag.sync.js"></script>
            <script src="//tags.tiqcdn.com/utag/acme/main/prod/utag.js" async></script>
        "#;

        let extractor = HtmlExtractor::new();
        let result = extractor.extract(html);

        assert_eq!(result.get_script_srcs().len(), 3);
        assert!(result.has_inline_data_layer());

        let profiles = result.locate_profiles("https");
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].account, "acme");
        assert_eq!(profiles[1].url, "https://tags.tiqcdn.com/utag/acme/main/prod/utag.js");
    }

    #[test]
    fn test_page_without_utag() {
        let result = HtmlExtractor::new().extract("<html><script src=\"/app.js\"></script></html>");
        assert!(result.locate_profiles("https").is_empty());
        assert!(!result.has_inline_data_layer());
    }
}
