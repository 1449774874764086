use crate::{
    LIKE_ESCAPE,
    db::predicate::{Clause, Comparator, PredicateTree, Selector},
};

/// Render a predicate tree as a query-language string.
#[must_use]
pub fn render_text(tree: &PredicateTree, alias: &str) -> String {
    let distinct = if tree.root.distinct { "distinct " } else { "" };
    let mut out = match tree.root.selector {
        Selector::Find => format!("select {distinct}{alias} from {} {alias}", tree.entity),
        Selector::Count | Selector::Exists => {
            format!("select count({distinct}{alias}) from {} {alias}", tree.entity)
        }
        Selector::Delete => format!("delete from {} {alias}", tree.entity),
    };

    if !tree.is_unfiltered() {
        out.push_str(" where ");
        let multi = tree.groups.len() > 1;
        let groups: Vec<String> = tree
            .groups
            .iter()
            .map(|group| {
                let body = group
                    .iter()
                    .map(|clause| render_clause(clause, alias))
                    .collect::<Vec<_>>()
                    .join(" and ");
                if multi && group.len() > 1 {
                    format!("({body})")
                } else {
                    body
                }
            })
            .collect();
        out.push_str(&groups.join(" or "));
    }

    // counts and deletes ignore ordering
    if tree.root.selector == Selector::Find && !tree.order.is_empty() {
        out.push_str(" order by ");
        let terms: Vec<String> = tree
            .order
            .iter()
            .map(|item| format!("{alias}.{item}"))
            .collect();
        out.push_str(&terms.join(", "));
    }

    out
}

fn render_clause(clause: &Clause, alias: &str) -> String {
    let path = clause.path.qualified(Some(alias));
    let n = clause.slot + 1;

    let fold = |operand: String| {
        if clause.ignore_case {
            format!("upper({operand})")
        } else {
            operand
        }
    };
    let target = fold(path.clone());
    let param = |position: usize| fold(format!("?{position}"));

    match clause.comparator {
        Comparator::Equal => format!("{target} = {}", param(n)),
        Comparator::NotEqual => format!("{target} <> {}", param(n)),
        Comparator::LessThan => format!("{target} < {}", param(n)),
        Comparator::LessThanEqual => format!("{target} <= {}", param(n)),
        Comparator::GreaterThan => format!("{target} > {}", param(n)),
        Comparator::GreaterThanEqual => format!("{target} >= {}", param(n)),
        Comparator::Like => format!("{target} like {}", param(n)),
        Comparator::NotLike => format!("{target} not like {}", param(n)),
        Comparator::StartingWith | Comparator::EndingWith | Comparator::Containing => {
            format!("{target} like {} escape '{LIKE_ESCAPE}'", param(n))
        }
        Comparator::Between => format!("{target} between {} and {}", param(n), param(n + 1)),
        Comparator::In => format!("{path} in ?{n}"),
        Comparator::NotIn => format!("{path} not in ?{n}"),
        Comparator::IsNull => format!("{path} is null"),
        Comparator::IsNotNull => format!("{path} is not null"),
        Comparator::IsEmpty => format!("{path} is empty"),
        Comparator::IsNotEmpty => format!("{path} is not empty"),
        Comparator::True => format!("{path} = true"),
        Comparator::False => format!("{path} = false"),
        Comparator::MemberOf => format!("?{n} member of {path}"),
    }
}
