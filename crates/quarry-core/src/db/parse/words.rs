//! Method-name tokenization.

/// Split a method name into lowercase words.
///
/// Boundaries are `_`, a lower-to-upper transition, the last capital of an
/// acronym followed by a lowercase letter, and letter/digit transitions:
/// `findTop10ByHTTPStatus_code` → `find top 10 by http status code`.
pub(crate) fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            flush(&mut words, &mut current);
            continue;
        }

        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_uppercase()
                    && c.is_uppercase()
                    && next.is_some_and(char::is_lowercase))
                || prev.is_ascii_digit() != c.is_ascii_digit();
            if boundary {
                flush(&mut words, &mut current);
            }
        }

        current.extend(c.to_lowercase());
    }
    flush(&mut words, &mut current);

    words
}

fn flush(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

/// Normalize an attribute name for comparison against method-name words.
pub(crate) fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Render words back into a CamelCase segment for error messages.
pub(crate) fn camel(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_seq(haystack: &[String], needle: &[&str]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    (0..=haystack.len() - needle.len()).find(|&start| starts_with(&haystack[start..], needle))
}

pub(crate) fn starts_with(words: &[String], prefix: &[&str]) -> bool {
    words.len() >= prefix.len() && words.iter().zip(prefix).all(|(w, p)| w == p)
}

pub(crate) fn ends_with(words: &[String], suffix: &[&str]) -> bool {
    words.len() >= suffix.len()
        && words[words.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(w, s)| w == s)
}

/// Split `words` on every occurrence of the single word `separator`.
pub(crate) fn split_on<'w>(words: &'w [String], separator: &str) -> Vec<&'w [String]> {
    words.split(|word| word == separator).collect()
}
