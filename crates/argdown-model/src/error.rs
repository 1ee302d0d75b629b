//! Errors raised while building the semantic model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic errors found while turning a syntax tree into a model.
///
/// These never abort model building on their own; the offending declaration
/// is skipped and the error reported.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ModelError {
    #[error("argument <{argument}> has two different premise-conclusion structures")]
    ConflictingPcs { argument: String },

    #[error("[{first}] and [{second}] cannot be equivalent: they {relation} each other")]
    ConflictingEquivalence {
        first: String,
        second: String,
        relation: String,
    },

    #[error("equivalence can only be declared between statements, found <{argument}>")]
    EquivalenceWithArgument { argument: String },

    #[error("{element} cannot relate to itself")]
    SelfRelation { element: String },

    #[error("dangling reference to {element}")]
    DanglingReference { element: String },
}
