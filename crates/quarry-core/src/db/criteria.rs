//! Structured query graph produced by the criteria backend and the DAO.
//!
//! Providers evaluate this directly; string queries are parsed into the
//! same shape so both backends share one evaluator.

use crate::{
    db::predicate::OrderItem,
    model::AttributePath,
    value::{TextMode, Value},
};

///
/// CriteriaQuery
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CriteriaQuery {
    pub entity: String,
    pub kind: StatementKind,
    pub projection: Projection,
    pub distinct: bool,
    pub predicate: Option<Expr>,
    pub order: Vec<OrderItem>,
}

impl CriteriaQuery {
    /// Unfiltered entity selection.
    #[must_use]
    pub fn select(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            kind: StatementKind::Select,
            projection: Projection::Entity,
            distinct: false,
            predicate: None,
            order: Vec::new(),
        }
    }

    /// Unfiltered bulk delete.
    #[must_use]
    pub fn delete(entity: impl Into<String>) -> Self {
        Self {
            kind: StatementKind::Delete,
            ..Self::select(entity)
        }
    }

    #[must_use]
    pub fn filter(mut self, expr: Expr) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => Expr::and(vec![existing, expr]),
            None => expr,
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, item: OrderItem) -> Self {
        self.order.push(item);
        self
    }

    #[must_use]
    pub const fn count(mut self) -> Self {
        self.projection = Projection::Count;
        self
    }

    /// Count projection of this query with its ordering dropped.
    #[must_use]
    pub fn to_count(&self) -> Self {
        Self {
            projection: Projection::Count,
            order: Vec::new(),
            ..self.clone()
        }
    }

    /// Highest positional parameter referenced by the predicate.
    #[must_use]
    pub fn max_position(&self) -> usize {
        let mut max = 0;
        if let Some(predicate) = &self.predicate {
            predicate.visit_params(&mut |param| {
                if let Param::Position(n) = param {
                    max = max.max(*n);
                }
            });
        }

        max
    }
}

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementKind {
    Select,
    Delete,
}

///
/// Projection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Projection {
    Entity,
    Count,
}

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

///
/// Param
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Param {
    /// One-based `?n`.
    Position(usize),
    /// `:name`.
    Named(String),
}

///
/// Scalar
/// Value-producing node: an attribute, an operand, or a case fold of either.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Scalar {
    Path(AttributePath),
    Param(Param),
    Literal(Value),
    Fold(TextMode, Box<Self>),
}

impl Scalar {
    #[must_use]
    pub fn path(path: impl Into<AttributePath>) -> Self {
        Self::Path(path.into())
    }

    #[must_use]
    pub const fn position(n: usize) -> Self {
        Self::Param(Param::Position(n))
    }

    #[must_use]
    pub fn upper(self) -> Self {
        Self::Fold(TextMode::Upper, Box::new(self))
    }

    #[must_use]
    pub fn lower(self) -> Self {
        Self::Fold(TextMode::Lower, Box::new(self))
    }

    fn visit_params(&self, f: &mut impl FnMut(&Param)) {
        match self {
            Self::Param(param) => f(param),
            Self::Fold(_, inner) => inner.visit_params(f),
            Self::Path(_) | Self::Literal(_) => {}
        }
    }
}

///
/// Expr
/// Boolean predicate node.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare {
        left: Scalar,
        op: CompareOp,
        right: Scalar,
    },
    Like {
        target: Scalar,
        pattern: Scalar,
        escape: Option<char>,
        negated: bool,
    },
    Between {
        target: Scalar,
        low: Scalar,
        high: Scalar,
        negated: bool,
    },
    In {
        target: Scalar,
        values: Vec<Scalar>,
        negated: bool,
    },
    IsNull {
        target: Scalar,
        negated: bool,
    },
    IsEmpty {
        path: AttributePath,
        negated: bool,
    },
    MemberOf {
        element: Scalar,
        path: AttributePath,
        negated: bool,
    },
}

impl Expr {
    /// Conjunction; a single child collapses to itself.
    #[must_use]
    pub fn and(mut children: Vec<Self>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Self::And(children)
        }
    }

    /// Disjunction; a single child collapses to itself.
    #[must_use]
    pub fn or(mut children: Vec<Self>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Self::Or(children)
        }
    }

    #[must_use]
    pub const fn compare(left: Scalar, op: CompareOp, right: Scalar) -> Self {
        Self::Compare { left, op, right }
    }

    /// `path = literal`.
    #[must_use]
    pub fn equals(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::compare(
            Scalar::Path(path.into()),
            CompareOp::Eq,
            Scalar::Literal(value.into()),
        )
    }

    /// `path like pattern escape 'c'`.
    #[must_use]
    pub fn like(path: impl Into<AttributePath>, pattern: impl Into<String>, escape: char) -> Self {
        Self::Like {
            target: Scalar::Path(path.into()),
            pattern: Scalar::Literal(Value::Text(pattern.into())),
            escape: Some(escape),
            negated: false,
        }
    }

    /// Visit every parameter reference in evaluation order.
    pub fn visit_params(&self, f: &mut impl FnMut(&Param)) {
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.visit_params(f);
                }
            }
            Self::Not(inner) => inner.visit_params(f),
            Self::Compare { left, right, .. } => {
                left.visit_params(f);
                right.visit_params(f);
            }
            Self::Like {
                target, pattern, ..
            } => {
                target.visit_params(f);
                pattern.visit_params(f);
            }
            Self::Between {
                target, low, high, ..
            } => {
                target.visit_params(f);
                low.visit_params(f);
                high.visit_params(f);
            }
            Self::In { target, values, .. } => {
                target.visit_params(f);
                for value in values {
                    value.visit_params(f);
                }
            }
            Self::IsNull { target, .. } => target.visit_params(f),
            Self::MemberOf { element, .. } => element.visit_params(f),
            Self::IsEmpty { .. } => {}
        }
    }
}
