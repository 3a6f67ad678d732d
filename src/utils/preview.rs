use std::fmt::{self, Write};

// ======================== 日志截断工具函数 ========================
/// 空白字符折叠 + 截断 - 压缩后的源码片段直接写入日志，不分配新字符串
/// 逻辑：
/// 1. 连续空白折叠为单个空格
/// 2. 达到最大长度时追加省略号并终止
#[inline(always)]
pub fn preview_compact<'a>(s: &'a str, max_len: usize) -> impl fmt::Display + 'a {
    struct CompactView<'a> {
        source: &'a str,
        max_length: usize,
    }

    impl<'a> fmt::Display for CompactView<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut char_count = 0;
            let mut last_was_whitespace = false;

            for ch in self.source.chars() {
                if char_count >= self.max_length {
                    f.write_str("…")?;
                    break;
                }

                if ch.is_whitespace() {
                    if !last_was_whitespace {
                        f.write_str(" ")?;
                        char_count += 1;
                        last_was_whitespace = true;
                    }
                } else {
                    f.write_char(ch)?;
                    char_count += 1;
                    last_was_whitespace = false;
                }
            }
            Ok(())
        }
    }

    CompactView {
        source: s,
        max_length: max_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_collapses_whitespace() {
        let text = format!("{}", preview_compact("case 5:\n\n   try {  c[5]", 64));
        assert_eq!(text, "case 5: try { c[5]");
    }

    #[test]
    fn test_preview_truncates_with_ellipsis() {
        let text = format!("{}", preview_compact("abcdefgh", 3));
        assert_eq!(text, "abc…");
    }
}
