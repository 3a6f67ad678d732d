//! 顶层布尔运算符拆分
//! 只在括号深度为 0 且不在字符串字面量内时拆分，运算符本身保留

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_word(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// 拆分结果中的单个操作数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand<'a> {
    pub text: &'a str,
    /// 在原字符串中的起始偏移
    pub start: usize,
    /// 连接下一个操作数的运算符（最后一个为 None）
    pub op: Option<BoolOp>,
}

/// 按顶层 && / || 拆分表达式
/// 没有顶层运算符时返回单个操作数（整串）
pub fn split_top_level(expr: &str) -> Vec<Operand<'_>> {
    let bytes = expr.as_bytes();
    let mut operands = Vec::new();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;
    let mut segment_start = 0;
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
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'&' | b'|' if depth == 0 && bytes.get(i + 1) == Some(&b) => {
                let op = if b == b'&' { BoolOp::And } else { BoolOp::Or };
                push_operand(expr, segment_start, i, Some(op), &mut operands);
                i += 2;
                segment_start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    push_operand(expr, segment_start, expr.len(), None, &mut operands);
    operands
}

fn push_operand<'a>(expr: &'a str, start: usize, end: usize, op: Option<BoolOp>, out: &mut Vec<Operand<'a>>) {
    let raw = &expr[start..end];
    let leading = raw.len() - raw.trim_start().len();
    out.push(Operand {
        text: raw.trim(),
        start: start + leading,
        op,
    });
}

/// 去掉整体包裹的一层或多层括号：`((a && b))` → `a && b`
/// `(a) && (b)` 这类两端括号不成对的表达式保持原样
pub fn strip_outer_parens(expr: &str) -> &str {
    let mut current = expr.trim();
    while current.starts_with('(') && current.ends_with(')') && closes_at_end(current) {
        current = current[1..current.len() - 1].trim();
    }
    current
}

fn closes_at_end(expr: &str) -> bool {
    let bytes = expr.as_bytes();
    let mut depth = 0i32;
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
        } else {
            match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 && i != bytes.len() - 1 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    depth == 0
}
