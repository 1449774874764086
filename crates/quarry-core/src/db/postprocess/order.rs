use crate::{
    db::{
        criteria::CriteriaQuery,
        predicate::{Direction, OrderItem},
        scan,
    },
    model::AttributePath,
};

///
/// OrderBy
///
/// Appends one ordering term. Applied to query strings as an
/// `order by` fragment and to criteria queries as an `OrderItem`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderBy {
    pub path: AttributePath,
    pub direction: Direction,
}

impl OrderBy {
    #[must_use]
    pub fn new(path: impl Into<AttributePath>, direction: Direction) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }

    #[must_use]
    pub fn asc(path: impl Into<AttributePath>) -> Self {
        Self::new(path, Direction::Asc)
    }

    #[must_use]
    pub fn desc(path: impl Into<AttributePath>) -> Self {
        Self::new(path, Direction::Desc)
    }

    /// Flip the direction in place.
    pub const fn toggle(&mut self) {
        self.direction = self.direction.toggled();
    }

    #[must_use]
    pub fn item(&self) -> OrderItem {
        OrderItem {
            path: self.path.clone(),
            direction: self.direction,
        }
    }

    pub(super) fn apply_to_string(&self, query: &str) -> String {
        let alias = scan::from_alias(query);
        let term = format!("{} {}", self.path.qualified(alias), self.direction.keyword());
        let query = query.trim_end();

        if scan::find_keyword(query, "order by").is_some() {
            format!("{query}, {term}")
        } else {
            format!("{query} order by {term}")
        }
    }

    pub(super) fn apply_to_criteria(&self, query: &mut CriteriaQuery) {
        query.order.push(self.item());
    }
}

impl From<OrderItem> for OrderBy {
    fn from(item: OrderItem) -> Self {
        Self {
            path: item.path,
            direction: item.direction,
        }
    }
}
