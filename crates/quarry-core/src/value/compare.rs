use crate::value::Value;
use std::cmp::Ordering;

///
/// TextMode
/// Case normalization applied by `upper(..)` / `lower(..)`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextMode {
    Upper,
    Lower,
}

pub(super) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Int(_) | Value::Uint(_), Value::Int(_) | Value::Uint(_)) => {
            Some(numeric(left)?.cmp(&numeric(right)?))
        }
        _ => None,
    }
}

// Widen both integer families to i128 so Int/Uint compare without loss.
const fn numeric(value: &Value) -> Option<i128> {
    match value {
        Value::Int(n) => Some(*n as i128),
        Value::Uint(n) => Some(*n as i128),
        _ => None,
    }
}

///
/// LikeToken
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LikeToken {
    AnySequence,
    AnyOne,
    Literal(char),
}

fn compile_like(pattern: &str, escape: Option<char>) -> Vec<LikeToken> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if Some(c) == escape {
            // a trailing escape matches itself
            tokens.push(LikeToken::Literal(chars.next().unwrap_or(c)));
            continue;
        }
        tokens.push(match c {
            '%' => LikeToken::AnySequence,
            '_' => LikeToken::AnyOne,
            other => LikeToken::Literal(other),
        });
    }

    tokens
}

/// Match `text` against an SQL LIKE `pattern`.
///
/// `%` matches any sequence, `_` matches one character, and the optional
/// escape character makes the following character literal.
#[must_use]
pub fn like_match(text: &str, pattern: &str, escape: Option<char>) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = compile_like(pattern, escape);

    let (mut t, mut p) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while t < text.len() {
        let step = pattern.get(p).is_some_and(|token| match token {
            LikeToken::AnyOne => true,
            LikeToken::Literal(c) => *c == text[t],
            LikeToken::AnySequence => false,
        });

        if step {
            t += 1;
            p += 1;
        } else if pattern.get(p) == Some(&LikeToken::AnySequence) {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(s) = star {
            p = s + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }

    while pattern.get(p) == Some(&LikeToken::AnySequence) {
        p += 1;
    }

    p == pattern.len()
}

/// Escape LIKE wildcards so `text` matches literally.
#[must_use]
pub fn escape_like(text: &str, escape: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '%' || c == '_' || c == escape {
            out.push(escape);
        }
        out.push(c);
    }

    out
}
