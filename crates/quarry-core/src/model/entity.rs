use crate::model::{AttributePath, field::FieldModel};

///
/// EntityModel
/// Minimal runtime model for one entity, built once at startup.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Name used in query-language strings (`from Simple e`).
    pub entity_name: &'static str,
    /// Name used by native SQL (`from simple_table`).
    pub table_name: &'static str,
    /// Primary key attribute (points at an entry in `fields`).
    pub primary_key: &'static str,
    /// Ordered attribute list.
    pub fields: &'static [FieldModel],
    /// Named queries declared on this entity.
    pub named_queries: &'static [NamedQuery],
}

///
/// NamedQuery
///

#[derive(Debug)]
pub struct NamedQuery {
    pub name: &'static str,
    pub query: &'static str,
}

impl EntityModel {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn primary_key_field(&self) -> Option<&'static FieldModel> {
        self.field(self.primary_key)
    }

    /// Singular, non-embedded attributes in declaration order.
    pub fn singular_fields(&self) -> impl Iterator<Item = &'static FieldModel> {
        self.fields
            .iter()
            .filter(|field| field.is_singular() && !field.kind.is_embedded())
    }

    #[must_use]
    pub fn named_query(&self, name: &str) -> Option<&'static str> {
        self.named_queries
            .iter()
            .find(|named| named.name == name)
            .map(|named| named.query)
    }

    /// Resolve a dotted attribute path to its chain of attributes.
    ///
    /// Every segment but the last must name an embedded attribute.
    #[must_use]
    pub fn resolve(&self, path: &AttributePath) -> Option<Vec<&'static FieldModel>> {
        resolve_segments(self.fields, path.segments())
    }
}

fn resolve_segments(
    fields: &'static [FieldModel],
    segments: &[String],
) -> Option<Vec<&'static FieldModel>> {
    let (first, rest) = segments.split_first()?;
    let field = fields.iter().find(|field| field.name == first)?;

    if rest.is_empty() {
        return Some(vec![field]);
    }

    let crate::model::FieldKind::Embedded(nested) = field.kind else {
        return None;
    };

    let mut chain = resolve_segments(nested, rest)?;
    chain.insert(0, field);

    Some(chain)
}
