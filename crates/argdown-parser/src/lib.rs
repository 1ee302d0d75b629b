//! Parser for the Argdown argumentation markup language.
//!
//! Source text is lexed line by line into [`Token`]s and then parsed into a
//! [`Document`]: headings, statement and argument blocks with their indented
//! relation trees, and premise-conclusion structures. Parsing recovers from
//! syntax errors and reports all of them alongside the partial document.

pub mod ast;
pub mod error;
pub mod front_matter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    ArgumentNode, Block, Document, Element, ElementBlock, Heading, Inference, Mention, Pcs,
    PcsItem, PcsStatement, RelationNode, StatementNode,
};
pub use error::SyntaxError;
pub use front_matter::{parse_data, parse_front_matter};
pub use lexer::{tokenize, LexOutput};
pub use parser::{parse, ParseOutput, Parser};
pub use token::{Position, RelationMarker, Span, Token, TokenKind};
