//! Row evaluation shared by string and criteria queries.
//!
//! Predicates use three-valued logic: any comparison involving `Null`
//! is unknown, and only rows evaluating to `Some(true)` match.

use crate::{
    db::{
        criteria::{CompareOp, Expr, Param, Scalar},
        predicate::{Direction, OrderItem},
    },
    error::PersistenceError,
    value::{Row, Value, like_match},
};
use std::{cmp::Ordering, collections::BTreeMap};

///
/// Bindings
///

#[derive(Clone, Copy, Debug)]
pub(super) struct Bindings<'a> {
    pub(super) positional: &'a BTreeMap<usize, Value>,
    pub(super) named: &'a BTreeMap<String, Value>,
}

impl Bindings<'_> {
    fn get(&self, param: &Param) -> Result<Value, PersistenceError> {
        let value = match param {
            Param::Position(n) => self.positional.get(n),
            Param::Named(name) => self.named.get(name),
        };

        value.cloned().ok_or_else(|| PersistenceError::MissingParameter {
            parameter: match param {
                Param::Position(n) => format!("?{n}"),
                Param::Named(name) => format!(":{name}"),
            },
        })
    }
}

pub(super) fn scalar(
    node: &Scalar,
    row: &Row,
    bindings: Bindings<'_>,
) -> Result<Value, PersistenceError> {
    match node {
        Scalar::Path(path) => Ok(row.path_value(path).clone()),
        Scalar::Param(param) => bindings.get(param),
        Scalar::Literal(value) => Ok(value.clone()),
        Scalar::Fold(mode, inner) => Ok(scalar(inner, row, bindings)?.fold_case(*mode)),
    }
}

/// Evaluate a predicate against one row.
pub(super) fn matches(
    expr: &Expr,
    row: &Row,
    bindings: Bindings<'_>,
) -> Result<Option<bool>, PersistenceError> {
    let result = match expr {
        Expr::And(children) => {
            let mut result = Some(true);
            for child in children {
                match matches(child, row, bindings)? {
                    Some(false) => return Ok(Some(false)),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }

        Expr::Or(children) => {
            let mut result = Some(false);
            for child in children {
                match matches(child, row, bindings)? {
                    Some(true) => return Ok(Some(true)),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }

        Expr::Not(inner) => matches(inner, row, bindings)?.map(|b| !b),

        Expr::Compare { left, op, right } => {
            let left = scalar(left, row, bindings)?;
            let right = scalar(right, row, bindings)?;
            compare(&left, *op, &right)
        }

        Expr::Like {
            target,
            pattern,
            escape,
            negated,
        } => {
            let target = scalar(target, row, bindings)?;
            let pattern = scalar(pattern, row, bindings)?;
            match (target.as_text(), pattern.as_text()) {
                (Some(text), Some(pattern)) => {
                    Some(like_match(text, pattern, *escape) != *negated)
                }
                _ => None,
            }
        }

        Expr::Between {
            target,
            low,
            high,
            negated,
        } => {
            let target = scalar(target, row, bindings)?;
            let low = scalar(low, row, bindings)?;
            let high = scalar(high, row, bindings)?;
            match (target.compare(&low), target.compare(&high)) {
                (Some(lo), Some(hi)) => Some((lo.is_ge() && hi.is_le()) != *negated),
                _ => None,
            }
        }

        Expr::In {
            target,
            values,
            negated,
        } => {
            let target = scalar(target, row, bindings)?;
            if target.is_null() {
                None
            } else {
                let mut found = false;
                for value in values {
                    let value = scalar(value, row, bindings)?;
                    let hit = match &value {
                        Value::List(items) => items
                            .iter()
                            .any(|item| target.loose_eq(item) == Some(true)),
                        other => target.loose_eq(other) == Some(true),
                    };
                    if hit {
                        found = true;
                        break;
                    }
                }
                Some(found != *negated)
            }
        }

        Expr::IsNull { target, negated } => {
            Some(scalar(target, row, bindings)?.is_null() != *negated)
        }

        Expr::IsEmpty { path, negated } => row
            .path_value(path)
            .is_empty_collection()
            .map(|empty| empty != *negated),

        Expr::MemberOf {
            element,
            path,
            negated,
        } => {
            let element = scalar(element, row, bindings)?;
            if element.is_null() {
                None
            } else {
                Some(row.path_value(path).contains_element(&element) != *negated)
            }
        }
    };

    Ok(result)
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Option<bool> {
    match op {
        CompareOp::Eq => left.loose_eq(right),
        CompareOp::Ne => left.loose_eq(right).map(|eq| !eq),
        CompareOp::Lt => left.compare(right).map(Ordering::is_lt),
        CompareOp::Lte => left.compare(right).map(Ordering::is_le),
        CompareOp::Gt => left.compare(right).map(Ordering::is_gt),
        CompareOp::Gte => left.compare(right).map(Ordering::is_ge),
    }
}

/// Stable sort by the order items; nulls sort first, incomparable values tie.
pub(super) fn sort_rows(rows: &mut [Row], order: &[OrderItem]) {
    if order.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        for item in order {
            let left = a.path_value(&item.path);
            let right = b.path_value(&item.path);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
            };
            let ordering = match item.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
