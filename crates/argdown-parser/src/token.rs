//! Token types produced by the lexer.
//!
//! Every token carries the source position of its first character so that
//! syntax errors and later source highlighting can point back into the input.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// 0-based byte offset into the input.
    pub offset: usize,
}

impl Position {
    /// Position of the first character of a document.
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Relation markers that open an indented relation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationMarker {
    /// `+` — the parent supports the target.
    Support,
    /// `+>` — explicit outgoing support.
    OutgoingSupport,
    /// `<+` — the target supports the parent.
    IncomingSupport,
    /// `-` — the parent attacks the target.
    Attack,
    /// `->` — explicit outgoing attack.
    OutgoingAttack,
    /// `<-` — the target attacks the parent.
    IncomingAttack,
    /// `><` — parent and target contradict each other.
    Contradiction,
    /// `_>` — the parent undercuts the target.
    OutgoingUndercut,
    /// `<_` — the target undercuts the parent.
    IncomingUndercut,
    /// `=` — parent and target are equivalent statements.
    Equivalence,
}

impl RelationMarker {
    /// Marker symbols, longest first so that prefix matching is unambiguous.
    pub const SYMBOLS: [(&'static str, RelationMarker); 10] = [
        ("+>", RelationMarker::OutgoingSupport),
        ("<+", RelationMarker::IncomingSupport),
        ("->", RelationMarker::OutgoingAttack),
        ("<-", RelationMarker::IncomingAttack),
        ("><", RelationMarker::Contradiction),
        ("_>", RelationMarker::OutgoingUndercut),
        ("<_", RelationMarker::IncomingUndercut),
        ("+", RelationMarker::Support),
        ("-", RelationMarker::Attack),
        ("=", RelationMarker::Equivalence),
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            RelationMarker::Support => "+",
            RelationMarker::OutgoingSupport => "+>",
            RelationMarker::IncomingSupport => "<+",
            RelationMarker::Attack => "-",
            RelationMarker::OutgoingAttack => "->",
            RelationMarker::IncomingAttack => "<-",
            RelationMarker::Contradiction => "><",
            RelationMarker::OutgoingUndercut => "_>",
            RelationMarker::IncomingUndercut => "<_",
            RelationMarker::Equivalence => "=",
        }
    }

    /// Whether the relation points from the child element back to its parent.
    pub fn is_incoming(&self) -> bool {
        matches!(
            self,
            RelationMarker::IncomingSupport
                | RelationMarker::IncomingAttack
                | RelationMarker::IncomingUndercut
        )
    }
}

impl fmt::Display for RelationMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The kind of a lexed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// YAML block between `===` fences at the top of the document.
    FrontMatter(String),
    /// Leading whitespace of a non-empty line, in columns.
    Indent(usize),
    /// A line without content.
    Emptyline,
    /// End of a non-empty line.
    Newline,
    /// `#`..`######` followed by whitespace at the start of a line.
    HeadingStart(usize),
    RelationMarker(RelationMarker),
    /// `(n)` opening a premise-conclusion-structure line.
    PcsNumber(u32),
    /// `----` or `-- inference text --`.
    Inference(Option<String>),
    /// `* ` or `1. ` list bullet.
    ListItem,
    /// `[Title]:`
    StatementDefinition(String),
    /// `[Title]`
    StatementReference(String),
    /// `@[Title]`
    StatementMention(String),
    /// `<Title>:`
    ArgumentDefinition(String),
    /// `<Title>`
    ArgumentReference(String),
    /// `@<Title>`
    ArgumentMention(String),
    /// `#tag` or `#(long tag)`, without the hash.
    Tag(String),
    /// Raw trailing `{...}` data block.
    Data(String),
    Text(String),
    Eof,
}

impl TokenKind {
    /// Whether this token opens a line-level construct that can never be a
    /// continuation of the previous element's text.
    pub fn is_line_structure(&self) -> bool {
        matches!(
            self,
            TokenKind::HeadingStart(_)
                | TokenKind::RelationMarker(_)
                | TokenKind::PcsNumber(_)
                | TokenKind::Inference(_)
                | TokenKind::ListItem
        )
    }
}

/// A lexed token with its source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}
