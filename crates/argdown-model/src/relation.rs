//! Typed relations between statements (by equivalence class) and arguments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::StatementId;

/// Index of a relation in [`Model::relations`](crate::Model::relations).
pub type RelationId = usize;

/// One endpoint of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "title", rename_all = "lowercase")]
pub enum ElementRef {
    /// An equivalence class, referenced by its title.
    Statement(String),
    Argument(String),
}

impl ElementRef {
    pub fn title(&self) -> &str {
        match self {
            ElementRef::Statement(t) | ElementRef::Argument(t) => t,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self, ElementRef::Statement(_))
    }

    pub fn is_argument(&self) -> bool {
        matches!(self, ElementRef::Argument(_))
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Statement(t) => write!(f, "[{t}]"),
            ElementRef::Argument(t) => write!(f, "<{t}>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Support,
    Attack,
    Undercut,
    Contradiction,
    Entails,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Support => "support",
            RelationKind::Attack => "attack",
            RelationKind::Undercut => "undercut",
            RelationKind::Contradiction => "contradiction",
            RelationKind::Entails => "entails",
        }
    }

    /// Undirected relations are stored once per unordered pair.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, RelationKind::Contradiction)
    }

    /// Whether the relation counts against its target.
    pub fn is_con(&self) -> bool {
        matches!(
            self,
            RelationKind::Attack | RelationKind::Undercut | RelationKind::Contradiction
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule that produced a derived relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DerivationRule {
    /// An argument inherits the outgoing relations of its main conclusion.
    ConclusionPromotion,
    /// Attacking a premise attacks the argument.
    PremiseAttack,
    /// An argument's relation to a statement is carried by its conclusion.
    ArgumentConclusion,
    /// Statement-level support and attack imply the reverse relation.
    Reciprocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "origin", content = "rule")]
pub enum Origin {
    Explicit,
    Derived(DerivationRule),
}

impl Origin {
    pub fn is_explicit(&self) -> bool {
        matches!(self, Origin::Explicit)
    }
}

/// A directed, typed relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub from: ElementRef,
    pub to: ElementRef,
    pub kind: RelationKind,
    pub origin: Origin,
    /// Statements whose relation trees declared this relation.
    pub occurrences: Vec<StatementId>,
}

impl Relation {
    /// Whether this relation links `from` and `to` with `kind`, treating
    /// symmetric kinds as undirected.
    pub fn connects(&self, from: &ElementRef, to: &ElementRef, kind: RelationKind) -> bool {
        if self.kind != kind {
            return false;
        }
        let forward = &self.from == from && &self.to == to;
        let backward = &self.from == to && &self.to == from;
        forward || (kind.is_symmetric() && backward)
    }

    /// Whether `element` is one of the endpoints.
    pub fn touches(&self, element: &ElementRef) -> bool {
        &self.from == element || &self.to == element
    }

    /// The other endpoint, if `element` is one of them.
    pub fn other_end(&self, element: &ElementRef) -> Option<&ElementRef> {
        if &self.from == element {
            Some(&self.to)
        } else if &self.to == element {
            Some(&self.from)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(from: ElementRef, to: ElementRef, kind: RelationKind) -> Relation {
        Relation {
            id: 0,
            from,
            to,
            kind,
            origin: Origin::Explicit,
            occurrences: Vec::new(),
        }
    }

    #[test]
    fn contradiction_is_undirected() {
        let a = ElementRef::Statement("A".into());
        let b = ElementRef::Statement("B".into());
        let r = relation(a.clone(), b.clone(), RelationKind::Contradiction);
        assert!(r.connects(&b, &a, RelationKind::Contradiction));

        let r = relation(a.clone(), b.clone(), RelationKind::Attack);
        assert!(!r.connects(&b, &a, RelationKind::Attack));
        assert!(r.connects(&a, &b, RelationKind::Attack));
    }

    #[test]
    fn element_ref_display_and_serde() {
        let arg = ElementRef::Argument("A".into());
        assert_eq!(arg.to_string(), "<A>");
        let json = serde_json::to_value(&arg).unwrap();
        assert_eq!(json["type"], "argument");
        assert_eq!(json["title"], "A");
    }

    #[test]
    fn origin_serializes_with_rule() {
        let json = serde_json::to_value(Origin::Derived(DerivationRule::Reciprocal)).unwrap();
        assert_eq!(json["origin"], "derived");
        assert_eq!(json["rule"], "reciprocal");
    }
}
