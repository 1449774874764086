//! Keyword scanning over query-language strings.
//!
//! Words inside single-quoted literals never match, and a keyword only
//! matches on identifier boundaries (`fromage` is not `from`).

use std::collections::BTreeSet;

/// Byte offset and text of every bare word outside string literals.
pub(crate) fn words(query: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut in_literal = false;
    let mut start: Option<usize> = None;

    for (i, c) in query.char_indices() {
        if in_literal {
            if c == '\'' {
                in_literal = false;
            }
            continue;
        }

        if is_word_char(c) {
            start.get_or_insert(i);
            continue;
        }

        if let Some(s) = start.take() {
            out.push((s, &query[s..i]));
        }
        if c == '\'' {
            in_literal = true;
        }
    }

    if let Some(s) = start {
        out.push((s, &query[s..]));
    }

    out
}

/// Offset of the first occurrence of a (possibly multi-word) keyword.
pub(crate) fn find_keyword(query: &str, keyword: &str) -> Option<usize> {
    let parts: Vec<&str> = keyword.split_whitespace().collect();
    if parts.is_empty() {
        return None;
    }
    let words = words(query);

    words
        .windows(parts.len())
        .find(|window| {
            window
                .iter()
                .zip(&parts)
                .all(|((_, word), part)| word.eq_ignore_ascii_case(part))
        })
        .map(|window| window[0].0)
}

/// Alias declared after the entity in the `from` clause, if any.
pub(crate) fn from_alias(query: &str) -> Option<&str> {
    let words = words(query);
    let from = words
        .iter()
        .position(|(_, word)| word.eq_ignore_ascii_case("from"))?;

    let mut rest = words.iter().skip(from + 2).map(|(_, word)| *word);
    let candidate = match rest.next()? {
        word if word.eq_ignore_ascii_case("as") => rest.next()?,
        word => word,
    };

    (!is_clause_keyword(candidate)).then_some(candidate)
}

/// Entity named by a statement: the word after the first `from`, or the
/// word after a leading `update`.
pub(crate) fn statement_entity(query: &str) -> Option<&str> {
    let words = words(query);
    let (_, first) = words.first()?;
    let index = if first.eq_ignore_ascii_case("update") {
        1
    } else {
        words
            .iter()
            .position(|(_, word)| word.eq_ignore_ascii_case("from"))?
            + 1
    };

    words.get(index).map(|(_, word)| *word)
}

/// Alias of the statement entity, for `from` clauses and `update` statements.
pub(crate) fn statement_alias(query: &str) -> Option<&str> {
    let words = words(query);
    let (_, first) = words.first()?;
    if !first.eq_ignore_ascii_case("update") {
        return from_alias(query);
    }

    let mut rest = words.iter().skip(2).map(|(_, word)| *word);
    let candidate = match rest.next()? {
        word if word.eq_ignore_ascii_case("as") => rest.next()?,
        word => word,
    };

    (!candidate.eq_ignore_ascii_case("set")).then_some(candidate)
}

/// Attribute paths qualified by `alias`: `name` for `e.name`,
/// `address.city` for `e.address.city`.
pub(crate) fn qualified_paths<'q>(query: &'q str, alias: &str) -> Vec<&'q str> {
    let bytes = query.as_bytes();
    let mut out = Vec::new();

    for (start, word) in words(query) {
        // `x.e.name` and `:e` are not references to the alias
        let preceded = start > 0 && matches!(bytes[start - 1], b'.' | b':' | b'?');
        let dot = start + word.len();
        if word != alias || preceded || bytes.get(dot) != Some(&b'.') {
            continue;
        }

        let tail = &query[dot + 1..];
        let len = tail
            .find(|c: char| !(is_word_char(c) || c == '.'))
            .unwrap_or(tail.len());
        let path = tail[..len].trim_end_matches('.');
        if !path.is_empty() {
            out.push(path);
        }
    }

    out
}

/// True when every single-quoted literal is closed.
pub(crate) fn literals_closed(query: &str) -> bool {
    query.chars().filter(|&c| c == '\'').count().is_multiple_of(2)
}

fn is_clause_keyword(word: &str) -> bool {
    ["where", "order", "group", "having", "join", "inner", "left"]
        .iter()
        .any(|keyword| word.eq_ignore_ascii_case(keyword))
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

///
/// Placeholders
/// Parameter placeholders referenced by a query string.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Placeholders {
    pub(crate) positions: BTreeSet<usize>,
    pub(crate) unnumbered: usize,
    pub(crate) named: BTreeSet<String>,
}

impl Placeholders {
    /// Number of positional parameters the query expects.
    pub(crate) fn positional_count(&self) -> usize {
        self.positions.last().copied().unwrap_or(0) + self.unnumbered
    }
}

pub(crate) fn placeholders(query: &str) -> Placeholders {
    let mut out = Placeholders::default();
    let mut chars = query.char_indices().peekable();
    let mut in_literal = false;

    while let Some((i, c)) = chars.next() {
        if in_literal {
            in_literal = c != '\'';
            continue;
        }

        match c {
            '\'' => in_literal = true,
            '?' => {
                let mut digits = String::new();
                while let Some((_, d)) = chars.next_if(|(_, d)| d.is_ascii_digit()) {
                    digits.push(d);
                }
                match digits.parse() {
                    Ok(position) => {
                        out.positions.insert(position);
                    }
                    Err(_) => out.unnumbered += 1,
                }
            }
            ':' => {
                let start = i + 1;
                let mut end = start;
                while let Some((j, d)) = chars.next_if(|(_, d)| is_word_char(*d)) {
                    end = j + d.len_utf8();
                }
                if end > start {
                    out.named.insert(query[start..end].to_string());
                }
            }
            _ => {}
        }
    }

    out
}
