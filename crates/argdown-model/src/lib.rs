//! Semantic model for Argdown documents.
//!
//! Statements are grouped into equivalence classes by title; arguments carry
//! premise-conclusion structures; relations connect classes and arguments.
//! The [`derive`] module computes implied relations and the [`map`] module
//! holds the renderable graph built from a selection of the model.

pub mod color;
pub mod derive;
pub mod element;
pub mod error;
pub mod map;
pub mod model;
pub mod relation;
pub mod selection;

pub use color::{ColorAssignments, ColorEntry};
pub use derive::{derive_relations, ConflictPolicy, DerivationStats};
pub use element::{
    Argument, EquivalenceClass, PcsRole, PcsStep, Section, SectionId, Statement, StatementId,
    StatementRole,
};
pub use error::ModelError;
pub use map::{collapse_closed_groups, ArgumentMap, Group, MapEdge, MapError, MapNode, MapNodeKind};
pub use model::Model;
pub use relation::{DerivationRule, ElementRef, Origin, Relation, RelationId, RelationKind};
pub use selection::Selection;
