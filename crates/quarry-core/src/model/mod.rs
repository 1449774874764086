//! Entity metadata: the static description of entities and attributes that
//! the name parser, both compiler backends, and providers resolve against.

mod entity;
mod field;
mod path;
mod registry;


pub use entity::{EntityModel, NamedQuery};
pub use field::{FieldKind, FieldModel};
pub use path::AttributePath;
pub use registry::MetadataRegistry;
