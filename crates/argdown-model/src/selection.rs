//! The subset of the model chosen for the map.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::relation::ElementRef;

/// Selected equivalence classes and arguments, by title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub statements: BTreeSet<String>,
    pub arguments: BTreeSet<String>,
}

impl Selection {
    pub fn contains(&self, element: &ElementRef) -> bool {
        match element {
            ElementRef::Statement(t) => self.statements.contains(t),
            ElementRef::Argument(t) => self.arguments.contains(t),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.arguments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len() + self.arguments.len()
    }
}
