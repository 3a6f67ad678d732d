//! 源码括号平衡扫描
//! 正则无法处理嵌套括号，表达式边界一律靠这里的扫描确定；字符串字面量与转义字符内的括号不计数

/// 从 `open` 处的开括号（( [ {）开始，返回与之匹配的闭括号下标
pub fn find_matching_close(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let first = *bytes.get(open)?;
    closer_of(first)?;

    let mut stack: Vec<u8> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\\' => {
                i += 2;
                continue;
            }
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => stack.push(closer_of(b)?),
            b')' | b']' | b'}' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// 成对括号内部文本（不含两端括号，已去除首尾空白）
pub fn balanced_inner(src: &str, open: usize) -> Option<&str> {
    let close = find_matching_close(src, open)?;
    Some(src[open + 1..close].trim())
}

/// 从 `start` 读取一个表达式，直到顶层的 `,` `;` 或不成对的闭括号
pub fn read_expression(src: &str, start: usize) -> &str {
    let bytes = src.as_bytes();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;
    let mut i = start.min(bytes.len());
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\\' => {
                i += 2;
                continue;
            }
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            b',' | b';' if depth == 0 => break,
            _ => {}
        }
        i += 1;
    }
    let end = i.min(bytes.len());
    src[start.min(end)..end].trim()
}

/// 查找语句关键字（如 `break`）的起始下标：字符串字面量内的不计，
/// 必须是完整单词，且其后（跳过空白）紧跟 `;` 或 `}`
pub fn find_statement_keyword(src: &str, keyword: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let word = keyword.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\\' => {
                i += 2;
                continue;
            }
            b'\'' | b'"' | b'`' => quote = Some(b),
            _ if bytes[i..].starts_with(word) => {
                let end = i + word.len();
                let standalone = (i == 0 || !is_ident_byte(bytes[i - 1]))
                    && bytes.get(end).is_none_or(|&next| !is_ident_byte(next));
                let terminated = matches!(bytes.get(skip_whitespace(src, end)), Some(b';') | Some(b'}'));
                if standalone && terminated {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// 跳过空白，返回下一个非空白字符的下标
pub fn skip_whitespace(src: &str, pos: usize) -> usize {
    src[pos.min(src.len())..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(offset, _)| pos + offset)
        .unwrap_or(src.len())
}

fn closer_of(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_inner_keeps_nested_parens() {
        let src = "c[5] |= (a && (b || c));";
        let open = src.find('(').unwrap();
        assert_eq!(balanced_inner(src, open), Some("a && (b || c)"));
    }

    #[test]
    fn test_parens_inside_strings_are_ignored() {
        let src = "(d['x']==')' && f(1))";
        assert_eq!(find_matching_close(src, 0), Some(src.len() - 1));
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(find_matching_close("(a && (b", 0), None);
        assert_eq!(find_matching_close("(a]", 0), None);
        assert_eq!(find_matching_close("abc", 0), None);
    }

    #[test]
    fn test_read_expression_stops_at_top_level_comma() {
        let src = "load:(utag.cond[3]||f(1,2)),send:1}";
        let start = src.find(':').unwrap() + 1;
        assert_eq!(read_expression(src, start), "(utag.cond[3]||f(1,2))");

        let tail = "send:utag.cond[9]}";
        assert_eq!(read_expression(tail, 5), "utag.cond[9]");
    }

    #[test]
    fn test_skip_whitespace() {
        assert_eq!(skip_whitespace("a   b", 1), 4);
        assert_eq!(skip_whitespace("a   ", 1), 4);
    }

    #[test]
    fn test_find_statement_keyword() {
        // 测试场景：变量名与字符串中的 break 不算分支结束
        let src = "c[7]|=(d['price_breakdown']=='break;')};break;case '8':";
        assert_eq!(find_statement_keyword(src, "break"), src.rfind("break;"));
        assert_eq!(find_statement_keyword("x=breaking;y=1", "break"), None);
        assert_eq!(find_statement_keyword("a=1;break }", "break"), Some(4));
        assert_eq!(find_statement_keyword("a=1", "break"), None);
    }
}
