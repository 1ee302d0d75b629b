//! Concrete syntax tree for Argdown documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::token::{RelationMarker, Span};

/// A parsed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Front matter parsed into a JSON object, if present and valid.
    pub front_matter: Option<Map<String, Value>>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.front_matter.is_none() && self.blocks.is_empty()
    }

    pub fn headings(&self) -> impl Iterator<Item = &Heading> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Heading(h) => Some(h),
            _ => None,
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Element(e) => Some(e),
            _ => None,
        })
    }
}

/// A top-level block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Heading(Heading),
    Element(ElementBlock),
}

/// A heading line opening a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    pub tags: Vec<String>,
    pub data: Option<Map<String, Value>>,
    pub span: Span,
}

/// A top-level statement or argument with its relation tree and, for
/// arguments, an optional premise-conclusion structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBlock {
    pub element: Element,
    pub relations: Vec<RelationNode>,
    pub pcs: Option<Pcs>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Statement(StatementNode),
    Argument(ArgumentNode),
}

impl Element {
    pub fn span(&self) -> Span {
        match self {
            Element::Statement(s) => s.span,
            Element::Argument(a) => a.span,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Element::Statement(s) => s.title.as_deref(),
            Element::Argument(a) => a.title.as_deref(),
        }
    }

    pub fn is_argument(&self) -> bool {
        matches!(self, Element::Argument(_))
    }
}

/// An inline `@[Title]` or `@<Title>` mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mention {
    Statement(String),
    Argument(String),
}

/// A statement occurrence: definition, reference or untitled text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementNode {
    pub title: Option<String>,
    pub text: Option<String>,
    /// `[Title]` without any text.
    pub is_reference: bool,
    pub tags: Vec<String>,
    pub mentions: Vec<Mention>,
    pub data: Option<Map<String, Value>>,
    pub span: Span,
}

/// An argument occurrence. Untitled arguments only arise from orphan PCS blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentNode {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_reference: bool,
    pub tags: Vec<String>,
    pub mentions: Vec<Mention>,
    pub data: Option<Map<String, Value>>,
    pub span: Span,
}

/// An indented relation line and everything nested below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationNode {
    pub marker: RelationMarker,
    pub target: Element,
    pub children: Vec<RelationNode>,
    pub span: Span,
}

/// A premise-conclusion structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pcs {
    pub items: Vec<PcsItem>,
    pub span: Span,
}

impl Pcs {
    pub fn statements(&self) -> impl Iterator<Item = &PcsStatement> {
        self.items.iter().filter_map(|i| match i {
            PcsItem::Statement(s) => Some(s),
            PcsItem::Inference(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PcsItem {
    Statement(PcsStatement),
    Inference(Inference),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcsStatement {
    pub number: u32,
    pub statement: StatementNode,
    pub relations: Vec<RelationNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inference {
    pub text: Option<String>,
    pub span: Span,
}
