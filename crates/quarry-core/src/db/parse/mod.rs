//! Name parser: derived repository method names → `PredicateTree`.
//!
//! Grammar (words after camel-case splitting):
//! `<selector> [distinct] [first|top [N]] <subject>* [by <clauses>] [order by <ordering>]`

mod path;
mod words;


use crate::{
    db::predicate::{Clause, Comparator, Direction, OrderItem, PredicateTree, QueryRoot, Selector},
    error::MethodExpressionError,
    model::{EntityModel, FieldKind},
};
use path::{ResolvedPath, resolve_path};
use words::{camel, ends_with, find_seq, split_on, split_words, starts_with};

/// Comparator keywords, tried longest first.
const KEYWORDS: &[(Comparator, &[&str])] = &[
    (Comparator::GreaterThanEqual, &["is", "greater", "than", "equal"]),
    (Comparator::LessThanEqual, &["is", "less", "than", "equal"]),
    (Comparator::GreaterThanEqual, &["greater", "than", "equal"]),
    (Comparator::LessThanEqual, &["less", "than", "equal"]),
    (Comparator::StartingWith, &["is", "starting", "with"]),
    (Comparator::EndingWith, &["is", "ending", "with"]),
    (Comparator::GreaterThan, &["is", "greater", "than"]),
    (Comparator::LessThan, &["is", "less", "than"]),
    (Comparator::IsNotEmpty, &["is", "not", "empty"]),
    (Comparator::IsNotNull, &["is", "not", "null"]),
    (Comparator::NotLike, &["is", "not", "like"]),
    (Comparator::NotIn, &["is", "not", "in"]),
    (Comparator::StartingWith, &["starting", "with"]),
    (Comparator::StartingWith, &["starts", "with"]),
    (Comparator::EndingWith, &["ending", "with"]),
    (Comparator::EndingWith, &["ends", "with"]),
    (Comparator::GreaterThan, &["greater", "than"]),
    (Comparator::LessThan, &["less", "than"]),
    (Comparator::IsNotEmpty, &["not", "empty"]),
    (Comparator::IsNotNull, &["not", "null"]),
    (Comparator::IsEmpty, &["is", "empty"]),
    (Comparator::IsNull, &["is", "null"]),
    (Comparator::NotLike, &["not", "like"]),
    (Comparator::NotIn, &["not", "in"]),
    (Comparator::Containing, &["is", "containing"]),
    (Comparator::Between, &["is", "between"]),
    (Comparator::LessThan, &["is", "before"]),
    (Comparator::GreaterThan, &["is", "after"]),
    (Comparator::Like, &["is", "like"]),
    (Comparator::In, &["is", "in"]),
    (Comparator::True, &["is", "true"]),
    (Comparator::False, &["is", "false"]),
    (Comparator::NotEqual, &["is", "not"]),
    (Comparator::Equal, &["is", "equal"]),
    (Comparator::Containing, &["containing"]),
    (Comparator::Containing, &["contains"]),
    (Comparator::Between, &["between"]),
    (Comparator::LessThan, &["before"]),
    (Comparator::GreaterThan, &["after"]),
    (Comparator::IsEmpty, &["empty"]),
    (Comparator::IsNull, &["null"]),
    (Comparator::Like, &["like"]),
    (Comparator::In, &["in"]),
    (Comparator::True, &["true"]),
    (Comparator::False, &["false"]),
    (Comparator::NotEqual, &["not"]),
    (Comparator::Equal, &["equals"]),
    (Comparator::Equal, &["is"]),
];

const IGNORE_CASE: &[&[&str]] = &[&["ignore", "case"], &["ignoring", "case"]];
const ALL_IGNORE_CASE: &[&[&str]] = &[&["all", "ignore", "case"], &["all", "ignoring", "case"]];

/// Map the leading word of a method name to its selector.
#[must_use]
pub fn selector_for(word: &str) -> Option<Selector> {
    match word {
        "find" | "get" | "read" | "query" | "search" | "stream" => Some(Selector::Find),
        "count" => Some(Selector::Count),
        "delete" | "remove" => Some(Selector::Delete),
        "exists" => Some(Selector::Exists),
        _ => None,
    }
}

/// True when `name` starts with a recognized query prefix.
#[must_use]
pub fn has_query_prefix(name: &str) -> bool {
    split_words(name)
        .first()
        .and_then(|word| selector_for(word))
        .is_some()
}

/// Parse a derived method name against one entity model.
pub fn parse_method_name(
    method: &str,
    model: &'static EntityModel,
) -> Result<PredicateTree, MethodExpressionError> {
    Parser { method, model }.parse()
}

///
/// Parser
///

struct Parser<'m> {
    method: &'m str,
    model: &'static EntityModel,
}

impl Parser<'_> {
    fn parse(&self) -> Result<PredicateTree, MethodExpressionError> {
        let words = split_words(self.method);
        let selector = words
            .first()
            .and_then(|word| selector_for(word))
            .ok_or_else(|| MethodExpressionError::UnknownPrefix {
                method: self.method.to_string(),
            })?;

        // subject: modifiers and free words up to `by` / `order by`
        let mut root = QueryRoot {
            selector,
            ..QueryRoot::default()
        };
        let mut i = 1;
        while i < words.len() && words[i] != "by" && !starts_with(&words[i..], &["order", "by"]) {
            match words[i].as_str() {
                "distinct" => root.distinct = true,
                "first" | "top" => {
                    let limit = match words.get(i + 1) {
                        Some(word) if word.chars().all(|c| c.is_ascii_digit()) => {
                            i += 1;
                            word.parse::<u32>().map_err(|_| self.invalid_limit())?
                        }
                        _ => 1,
                    };
                    if limit == 0 {
                        return Err(self.invalid_limit());
                    }
                    root.limit = Some(limit);
                }
                _ => {}
            }
            i += 1;
        }

        let mut tree = PredicateTree::new(self.model.entity_name, root);
        let rest = &words[i..];
        if rest.is_empty() {
            return Ok(tree);
        }

        let (criteria, ordering) = if starts_with(rest, &["order", "by"]) {
            (None, Some(&rest[2..]))
        } else {
            let body = &rest[1..];
            match find_seq(body, &["order", "by"]) {
                Some(at) => (Some(&body[..at]), Some(&body[at + 2..])),
                None => (Some(body), None),
            }
        };

        if let Some(criteria) = criteria {
            // `findByOrderByName` has an empty criteria part and no filter
            if !(criteria.is_empty() && ordering.is_some()) {
                tree.groups = self.parse_criteria(criteria)?;
            }
        }
        if let Some(ordering) = ordering {
            tree.order = self.parse_ordering(ordering)?;
        }

        Ok(tree)
    }

    fn parse_criteria(&self, words: &[String]) -> Result<Vec<Vec<Clause>>, MethodExpressionError> {
        let mut words = words;
        let mut all_ignore_case = false;
        for suffix in ALL_IGNORE_CASE {
            if ends_with(words, suffix) {
                words = &words[..words.len() - suffix.len()];
                all_ignore_case = true;
                break;
            }
        }

        let mut slot = 0;
        let mut groups = Vec::new();
        for group_words in split_on(words, "or") {
            let mut group = Vec::new();
            for clause_words in split_on(group_words, "and") {
                let clause = self.parse_clause(clause_words, slot, all_ignore_case)?;
                slot += clause.comparator.arity();
                group.push(clause);
            }
            groups.push(group);
        }

        Ok(groups)
    }

    fn parse_clause(
        &self,
        words: &[String],
        slot: usize,
        all_ignore_case: bool,
    ) -> Result<Clause, MethodExpressionError> {
        let (words, explicit_ignore_case) = strip_ignore_case(words);
        if words.is_empty() {
            return Err(MethodExpressionError::EmptyClause {
                method: self.method.to_string(),
            });
        }

        let (comparator, resolved) = self.resolve_clause(words)?;
        let comparator = self.check_comparator(comparator, &resolved)?;

        if explicit_ignore_case && !resolved.kind.is_text() {
            return Err(self.invalid("IgnoreCase", "a text", &resolved.path.to_string()));
        }
        let ignore_case = (explicit_ignore_case || (all_ignore_case && resolved.kind.is_text()))
            && comparator.arity() > 0
            && !matches!(
                comparator,
                Comparator::MemberOf | Comparator::In | Comparator::NotIn
            );

        Ok(Clause {
            path: resolved.path,
            comparator,
            ignore_case,
            slot,
        })
    }

    // Longest matching keyword whose remaining words resolve; plain equality otherwise.
    fn resolve_clause(
        &self,
        words: &[String],
    ) -> Result<(Comparator, ResolvedPath), MethodExpressionError> {
        let mut unresolved = None;
        for (comparator, keyword) in KEYWORDS {
            if words.len() <= keyword.len() || !ends_with(words, keyword) {
                continue;
            }
            let attribute = &words[..words.len() - keyword.len()];
            if let Some(resolved) = resolve_path(self.model.fields, attribute) {
                return Ok((*comparator, resolved));
            }
            if unresolved.is_none() {
                unresolved = Some(attribute);
            }
        }

        if let Some(resolved) = resolve_path(self.model.fields, words) {
            return Ok((Comparator::Equal, resolved));
        }

        Err(self.unresolved(unresolved.unwrap_or(words)))
    }

    fn check_comparator(
        &self,
        comparator: Comparator,
        resolved: &ResolvedPath,
    ) -> Result<Comparator, MethodExpressionError> {
        let kind = resolved.kind;
        let fail = |requirement| {
            Err(self.invalid(
                comparator.keyword(),
                requirement,
                &resolved.path.to_string(),
            ))
        };

        match comparator {
            Comparator::Containing if kind.is_collection() => Ok(Comparator::MemberOf),
            Comparator::Containing if kind.is_text() => Ok(comparator),
            Comparator::Containing => fail("a text or collection"),
            Comparator::Like
            | Comparator::NotLike
            | Comparator::StartingWith
            | Comparator::EndingWith
                if !kind.is_text() =>
            {
                fail("a text")
            }
            Comparator::IsEmpty | Comparator::IsNotEmpty if !kind.is_collection() => {
                fail("a collection")
            }
            Comparator::True | Comparator::False if !kind.is_bool() => fail("a bool"),
            _ if matches!(kind, FieldKind::Embedded(_)) && comparator.arity() > 0 => {
                fail("a non-embedded")
            }
            _ => Ok(comparator),
        }
    }

    fn parse_ordering(&self, words: &[String]) -> Result<Vec<OrderItem>, MethodExpressionError> {
        let mut order = Vec::new();
        let mut start = 0;

        for (i, word) in words.iter().enumerate() {
            let direction = match word.as_str() {
                "asc" => Direction::Asc,
                "desc" => Direction::Desc,
                _ => continue,
            };
            order.push(self.order_item(&words[start..i], direction)?);
            start = i + 1;
        }
        if start < words.len() {
            order.push(self.order_item(&words[start..], Direction::Asc)?);
        }

        if order.is_empty() {
            return Err(MethodExpressionError::EmptyClause {
                method: self.method.to_string(),
            });
        }

        Ok(order)
    }

    fn order_item(
        &self,
        words: &[String],
        direction: Direction,
    ) -> Result<OrderItem, MethodExpressionError> {
        if words.is_empty() {
            return Err(MethodExpressionError::EmptyClause {
                method: self.method.to_string(),
            });
        }
        let resolved =
            resolve_path(self.model.fields, words).ok_or_else(|| self.unresolved(words))?;

        Ok(OrderItem {
            path: resolved.path,
            direction,
        })
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    fn unresolved(&self, words: &[String]) -> MethodExpressionError {
        MethodExpressionError::UnresolvedAttribute {
            method: self.method.to_string(),
            entity: self.model.entity_name.to_string(),
            segment: camel(words),
        }
    }

    fn invalid(
        &self,
        keyword: &'static str,
        requirement: &'static str,
        path: &str,
    ) -> MethodExpressionError {
        MethodExpressionError::InvalidComparator {
            method: self.method.to_string(),
            keyword,
            requirement,
            path: path.to_string(),
        }
    }

    fn invalid_limit(&self) -> MethodExpressionError {
        MethodExpressionError::InvalidLimit {
            method: self.method.to_string(),
        }
    }
}

// `IgnoreCase` may lead or trail a clause.
fn strip_ignore_case(words: &[String]) -> (&[String], bool) {
    for marker in IGNORE_CASE {
        if starts_with(words, marker) {
            return (&words[marker.len()..], true);
        }
        if ends_with(words, marker) {
            return (&words[..words.len() - marker.len()], true);
        }
    }

    (words, false)
}
