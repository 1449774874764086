///
/// FieldModel
/// Runtime attribute metadata used by parsing, compilation and providers.
///

#[derive(Debug)]
pub struct FieldModel {
    /// Attribute name as used in paths, rows and query strings.
    pub name: &'static str,
    /// Declared type shape.
    pub kind: FieldKind,
}

impl FieldModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    /// Singular attributes hold one value (scalars and embedded objects).
    #[must_use]
    pub const fn is_singular(&self) -> bool {
        !self.kind.is_collection()
    }
}

///
/// FieldKind
///
/// Minimal type surface needed by the parser and compilers.
/// Aligned with `Value` variants.
///

#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    Bool,
    Int,
    Uint,
    Text,

    /// Collection-valued attribute.
    List(&'static Self),

    /// Embedded object; nested attributes are reachable through dotted paths.
    Embedded(&'static [FieldModel]),
}

impl FieldKind {
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::List(_))
    }

    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }

    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Kinds that a store may generate a primary key for.
    #[must_use]
    pub const fn is_generated_key(&self) -> bool {
        matches!(self, Self::Int | Self::Uint)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Text => "text",
            Self::List(_) => "list",
            Self::Embedded(_) => "embedded",
        }
    }
}
