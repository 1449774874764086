use crate::model::AttributePath;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Selector
/// What a derived query does with the rows its predicate matches.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Selector {
    #[default]
    Find,
    Count,
    Delete,
    Exists,
}

impl Selector {
    /// Selectors whose result is a single integral projection.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Count | Self::Exists)
    }
}

///
/// QueryRoot
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryRoot {
    pub selector: Selector,
    pub distinct: bool,
    /// `First<N>` / `Top<N>` result limit.
    pub limit: Option<u32>,
}

///
/// Comparator
///
/// Comparison operator of one clause. Each operator consumes a fixed
/// number of bind slots.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Comparator {
    Equal,
    NotEqual,
    Like,
    NotLike,
    StartingWith,
    EndingWith,
    Containing,
    Between,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
    True,
    False,
    /// Collection-valued attribute contains the bound element.
    MemberOf,
}

impl Comparator {
    /// Number of bind slots this operator consumes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::IsNull
            | Self::IsNotNull
            | Self::IsEmpty
            | Self::IsNotEmpty
            | Self::True
            | Self::False => 0,
            Self::Between => 2,
            _ => 1,
        }
    }

    /// Wildcards wrapped around the bound operand, if any.
    #[must_use]
    pub const fn like_wrap(self) -> Option<LikeWrap> {
        match self {
            Self::StartingWith => Some(LikeWrap::Prefix),
            Self::EndingWith => Some(LikeWrap::Suffix),
            Self::Containing => Some(LikeWrap::Both),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_like(self) -> bool {
        matches!(
            self,
            Self::Like | Self::NotLike | Self::StartingWith | Self::EndingWith | Self::Containing
        )
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Equal => "Equals",
            Self::NotEqual => "Not",
            Self::Like => "Like",
            Self::NotLike => "NotLike",
            Self::StartingWith => "StartingWith",
            Self::EndingWith => "EndingWith",
            Self::Containing => "Containing",
            Self::Between => "Between",
            Self::LessThan => "LessThan",
            Self::LessThanEqual => "LessThanEqual",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanEqual => "GreaterThanEqual",
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::IsNull => "IsNull",
            Self::IsNotNull => "IsNotNull",
            Self::IsEmpty => "IsEmpty",
            Self::IsNotEmpty => "IsNotEmpty",
            Self::True => "True",
            Self::False => "False",
            Self::MemberOf => "Contains",
        }
    }
}

///
/// LikeWrap
/// Fixed-position wildcards applied to an escaped LIKE operand.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LikeWrap {
    /// `value%`
    Prefix,
    /// `%value`
    Suffix,
    /// `%value%`
    Both,
}

impl LikeWrap {
    /// Escape `text` and add the wildcards.
    #[must_use]
    pub fn apply(self, text: &str, escape: char) -> String {
        let escaped = crate::value::escape_like(text, escape);
        match self {
            Self::Prefix => format!("{escaped}%"),
            Self::Suffix => format!("%{escaped}"),
            Self::Both => format!("%{escaped}%"),
        }
    }
}

///
/// Clause
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Clause {
    pub path: AttributePath,
    pub comparator: Comparator,
    /// Compare under case folding (`upper(..)` on both sides).
    pub ignore_case: bool,
    /// Zero-based index of the first bind slot this clause consumes.
    pub slot: usize,
}

impl Clause {
    /// Zero-based bind slots consumed by this clause.
    pub fn slots(&self) -> std::ops::Range<usize> {
        self.slot..self.slot + self.comparator.arity()
    }
}

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

///
/// OrderItem
/// One `order by` term, matched structurally by path.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct OrderItem {
    pub path: AttributePath,
    pub direction: Direction,
}

impl OrderItem {
    #[must_use]
    pub fn asc(path: impl Into<AttributePath>) -> Self {
        Self {
            path: path.into(),
            direction: Direction::Asc,
        }
    }

    #[must_use]
    pub fn desc(path: impl Into<AttributePath>) -> Self {
        Self {
            path: path.into(),
            direction: Direction::Desc,
        }
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.direction.keyword())
    }
}

///
/// PredicateTree
///
/// Backend-independent result of parsing a derived method name.
/// `groups` is a disjunction of conjunctions, in method-name order;
/// an empty `groups` means no filter.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PredicateTree {
    pub entity: &'static str,
    pub root: QueryRoot,
    pub groups: Vec<Vec<Clause>>,
    pub order: Vec<OrderItem>,
}

impl PredicateTree {
    /// Unfiltered tree over one entity.
    #[must_use]
    pub const fn new(entity: &'static str, root: QueryRoot) -> Self {
        Self {
            entity,
            root,
            groups: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Clauses in method-name order.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.groups.iter().flatten()
    }

    /// Total bind slots across all clauses.
    #[must_use]
    pub fn bind_slots(&self) -> usize {
        self.clauses().map(|clause| clause.comparator.arity()).sum()
    }

    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.groups.is_empty()
    }
}
