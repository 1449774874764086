use crate::{
    LIKE_ESCAPE,
    db::{
        criteria::{CompareOp, CriteriaQuery, Expr, Projection, Scalar, StatementKind},
        predicate::{Clause, Comparator, PredicateTree, Selector},
    },
    value::Value,
};

/// Lower a predicate tree to a structured criteria query.
#[must_use]
pub fn lower_criteria(tree: &PredicateTree) -> CriteriaQuery {
    let (kind, projection) = match tree.root.selector {
        Selector::Find => (StatementKind::Select, Projection::Entity),
        Selector::Count | Selector::Exists => (StatementKind::Select, Projection::Count),
        Selector::Delete => (StatementKind::Delete, Projection::Entity),
    };

    let predicate = (!tree.is_unfiltered()).then(|| {
        Expr::or(
            tree.groups
                .iter()
                .map(|group| Expr::and(group.iter().map(lower_clause).collect()))
                .collect(),
        )
    });

    let order = if tree.root.selector == Selector::Find {
        tree.order.clone()
    } else {
        Vec::new()
    };

    CriteriaQuery {
        entity: tree.entity.to_string(),
        kind,
        projection,
        distinct: tree.root.distinct,
        predicate,
        order,
    }
}

fn lower_clause(clause: &Clause) -> Expr {
    let n = clause.slot + 1;
    let fold = |scalar: Scalar| {
        if clause.ignore_case {
            scalar.upper()
        } else {
            scalar
        }
    };
    let path = || Scalar::Path(clause.path.clone());
    let target = || fold(path());
    let param = |position: usize| fold(Scalar::position(position));
    let compare = |op| Expr::compare(target(), op, param(n));

    match clause.comparator {
        Comparator::Equal => compare(CompareOp::Eq),
        Comparator::NotEqual => compare(CompareOp::Ne),
        Comparator::LessThan => compare(CompareOp::Lt),
        Comparator::LessThanEqual => compare(CompareOp::Lte),
        Comparator::GreaterThan => compare(CompareOp::Gt),
        Comparator::GreaterThanEqual => compare(CompareOp::Gte),
        Comparator::Like | Comparator::NotLike => Expr::Like {
            target: target(),
            pattern: param(n),
            escape: None,
            negated: clause.comparator == Comparator::NotLike,
        },
        Comparator::StartingWith | Comparator::EndingWith | Comparator::Containing => Expr::Like {
            target: target(),
            pattern: param(n),
            escape: Some(LIKE_ESCAPE),
            negated: false,
        },
        Comparator::Between => Expr::Between {
            target: target(),
            low: param(n),
            high: param(n + 1),
            negated: false,
        },
        Comparator::In | Comparator::NotIn => Expr::In {
            target: path(),
            values: vec![Scalar::position(n)],
            negated: clause.comparator == Comparator::NotIn,
        },
        Comparator::IsNull | Comparator::IsNotNull => Expr::IsNull {
            target: path(),
            negated: clause.comparator == Comparator::IsNotNull,
        },
        Comparator::IsEmpty | Comparator::IsNotEmpty => Expr::IsEmpty {
            path: clause.path.clone(),
            negated: clause.comparator == Comparator::IsNotEmpty,
        },
        Comparator::True | Comparator::False => Expr::compare(
            path(),
            CompareOp::Eq,
            Scalar::Literal(Value::Bool(clause.comparator == Comparator::True)),
        ),
        Comparator::MemberOf => Expr::MemberOf {
            element: Scalar::position(n),
            path: clause.path.clone(),
            negated: false,
        },
    }
}
