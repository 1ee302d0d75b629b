//! Error-recovering recursive-descent parser.
//!
//! The parser works on lines of tokens. A syntax error is recorded together
//! with its position and the parser skips to the next top-level block (a blank
//! line or a non-indented line), so a single typo never blanks the rest of the
//! document. In fail-fast mode the first error is returned instead.

use serde_json::{Map, Value};

use crate::ast::{
    ArgumentNode, Block, Document, Element, ElementBlock, Heading, Inference, Mention, Pcs,
    PcsItem, PcsStatement, RelationNode, StatementNode,
};
use crate::error::{Result, SyntaxError};
use crate::front_matter::{parse_data, parse_front_matter};
use crate::lexer::tokenize;
use crate::token::{Position, Span, Token, TokenKind};

/// Document plus every recoverable error found while parsing it.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub document: Document,
    pub errors: Vec<SyntaxError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Configurable entry point.
///
/// ```rust
/// use argdown_parser::Parser;
///
/// let output = Parser::new("[A]: a claim\n  - [B]: an objection").parse().unwrap();
/// assert_eq!(output.document.blocks.len(), 1);
/// assert!(output.errors.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    input: &'a str,
    fail_fast: bool,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            fail_fast: false,
        }
    }

    /// Abort on the first syntax error instead of recovering.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Parse the input. Only returns `Err` in fail-fast mode.
    pub fn parse(&self) -> Result<ParseOutput> {
        let lexed = tokenize(self.input);
        if self.fail_fast {
            if let Some(first) = lexed.errors.first() {
                return Err(first.clone());
            }
        }

        let (front_matter, lines) = into_lines(lexed.tokens);
        let mut state = State {
            lines,
            index: 0,
            errors: lexed.errors,
            fail_fast: self.fail_fast,
        };

        let mut document = Document::default();
        if let Some(token) = front_matter {
            if let TokenKind::FrontMatter(content) = &token.kind {
                match parse_front_matter(content, token.position) {
                    Ok(map) => document.front_matter = Some(map),
                    Err(e) => state.report(e)?,
                }
            }
        }
        document.blocks = state.parse_blocks()?;

        Ok(ParseOutput {
            document,
            errors: state.errors,
        })
    }
}

/// Parse leniently, collecting all recoverable errors.
pub fn parse(input: &str) -> ParseOutput {
    // Without fail-fast, `parse` never returns an error.
    Parser::new(input).parse().unwrap_or_default()
}

#[derive(Debug, Clone)]
struct Line {
    indent: usize,
    tokens: Vec<Token>,
    start: Position,
    end: Position,
    blank: bool,
}

impl Line {
    fn new(indent: usize, start: Position) -> Self {
        Self {
            indent,
            tokens: Vec::new(),
            start,
            end: start,
            blank: false,
        }
    }

    fn blank(position: Position) -> Self {
        Self {
            blank: true,
            ..Self::new(0, position)
        }
    }

    fn first_kind(&self) -> Option<&TokenKind> {
        self.tokens.first().map(|t| &t.kind)
    }

    fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

fn into_lines(tokens: Vec<Token>) -> (Option<Token>, Vec<Line>) {
    let mut front_matter = None;
    let mut lines = Vec::new();
    let mut current: Option<Line> = None;

    for token in tokens {
        match token.kind {
            TokenKind::FrontMatter(_) => front_matter = Some(token),
            TokenKind::Emptyline => lines.push(Line::blank(token.position)),
            TokenKind::Eof => {}
            TokenKind::Newline => {
                if let Some(mut line) = current.take() {
                    line.end = token.position;
                    lines.push(line);
                }
            }
            TokenKind::Indent(width) => current = Some(Line::new(width, token.position)),
            _ => current
                .get_or_insert_with(|| Line::new(0, token.position))
                .tokens
                .push(token),
        }
    }
    if let Some(line) = current {
        lines.push(line);
    }
    (front_matter, lines)
}

/// Inline content collected from a run of tokens.
#[derive(Debug, Default)]
struct Inline {
    text: String,
    tags: Vec<String>,
    mentions: Vec<Mention>,
    data: Option<Map<String, Value>>,
}

struct State {
    lines: Vec<Line>,
    index: usize,
    errors: Vec<SyntaxError>,
    fail_fast: bool,
}

impl State {
    fn report(&mut self, error: SyntaxError) -> Result<()> {
        if self.fail_fast {
            return Err(error);
        }
        self.errors.push(error);
        Ok(())
    }

    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.index)
    }

    fn take(&mut self) -> Option<Line> {
        let line = self.lines.get(self.index).cloned();
        if line.is_some() {
            self.index += 1;
        }
        line
    }

    /// Skip the current line and every indented line belonging to it.
    fn skip_block(&mut self) {
        self.index += 1;
        while let Some(line) = self.peek() {
            if line.blank || line.indent == 0 {
                break;
            }
            self.index += 1;
        }
    }

    /// Skip lines nested deeper than `indent`.
    fn skip_deeper(&mut self, indent: usize) {
        while let Some(line) = self.peek() {
            if line.blank || line.indent <= indent {
                break;
            }
            self.index += 1;
        }
    }

    fn parse_blocks(&mut self) -> Result<Vec<Block>> {
        let mut blocks: Vec<Block> = Vec::new();

        while let Some(line) = self.peek() {
            if line.blank {
                self.index += 1;
                continue;
            }
            let start = line.start;
            let indent = line.indent;
            let kind = line.first_kind().cloned();

            match kind {
                Some(TokenKind::HeadingStart(_)) => {
                    if let Some(heading) = self.parse_heading()? {
                        blocks.push(Block::Heading(heading));
                    }
                }
                Some(TokenKind::PcsNumber(_)) if indent == 0 => {
                    if let Some(pcs) = self.parse_pcs()? {
                        attach_pcs(&mut blocks, pcs);
                    }
                }
                Some(TokenKind::Inference(_)) => {
                    self.report(SyntaxError::new(
                        "inference without preceding premises",
                        start,
                    ))?;
                    self.skip_block();
                }
                Some(TokenKind::RelationMarker(marker)) => {
                    self.report(SyntaxError::new(
                        format!("relation `{marker}` without parent element"),
                        start,
                    ))?;
                    self.skip_block();
                }
                _ => {
                    if let Some(block) = self.parse_element_block()? {
                        blocks.push(Block::Element(block));
                    }
                }
            }
        }
        Ok(blocks)
    }

    fn parse_heading(&mut self) -> Result<Option<Heading>> {
        let Some(line) = self.take() else {
            return Ok(None);
        };
        let level = match line.first_kind() {
            Some(TokenKind::HeadingStart(level)) => *level,
            _ => return Ok(None),
        };
        let inline = self.collect_inline(&line.tokens[1..])?;
        if inline.text.is_empty() {
            self.report(SyntaxError::new("heading without title", line.start))?;
            return Ok(None);
        }
        Ok(Some(Heading {
            level,
            title: inline.text,
            tags: inline.tags,
            data: inline.data,
            span: line.span(),
        }))
    }

    fn parse_element_block(&mut self) -> Result<Option<ElementBlock>> {
        let Some(line) = self.take() else {
            return Ok(None);
        };
        let base_indent = line.indent;
        let mut tokens: Vec<Token> = line
            .tokens
            .iter()
            .skip_while(|t| t.kind == TokenKind::ListItem)
            .cloned()
            .collect();
        let mut span = line.span();
        if let Some(more) = self.take_continuation(None, &mut tokens) {
            span = span.merge(more);
        }

        let Some(element) = self.build_element(&tokens, span)? else {
            self.report(SyntaxError::new("expected a statement or argument", line.start))?;
            self.skip_deeper(base_indent);
            return Ok(None);
        };
        let relations = self.parse_relations(base_indent)?;
        let span = relations.iter().fold(span, |acc, r| acc.merge(r.span));

        Ok(Some(ElementBlock {
            element,
            relations,
            pcs: None,
            span,
        }))
    }

    /// Append the tokens of continuation lines to `tokens` and return the
    /// span they cover. `deeper_than` restricts continuations to lines
    /// indented more than the given width.
    fn take_continuation(
        &mut self,
        deeper_than: Option<usize>,
        tokens: &mut Vec<Token>,
    ) -> Option<Span> {
        let mut span: Option<Span> = None;
        while let Some(line) = self.peek() {
            if line.blank {
                break;
            }
            if let Some(indent) = deeper_than {
                if line.indent <= indent {
                    break;
                }
            }
            match line.first_kind() {
                Some(kind) if kind.is_line_structure() => break,
                Some(TokenKind::StatementDefinition(_) | TokenKind::ArgumentDefinition(_)) => {
                    break
                }
                _ => {}
            }
            let Some(line) = self.take() else {
                break;
            };
            span = Some(span.map_or(line.span(), |s| s.merge(line.span())));
            tokens.push(Token::new(TokenKind::Text(" ".into()), line.start));
            tokens.extend(line.tokens);
        }
        span
    }

    fn parse_relations(&mut self, parent_indent: usize) -> Result<Vec<RelationNode>> {
        let mut relations = Vec::new();
        while let Some(line) = self.peek() {
            if line.blank || line.indent <= parent_indent {
                break;
            }
            let indent = line.indent;
            let start = line.start;
            if matches!(line.first_kind(), Some(TokenKind::RelationMarker(_))) {
                if let Some(relation) = self.parse_relation(indent)? {
                    relations.push(relation);
                }
            } else {
                self.report(SyntaxError::new(
                    "unexpected indented line, expected a relation",
                    start,
                ))?;
                self.index += 1;
                self.skip_deeper(indent);
            }
        }
        Ok(relations)
    }

    fn parse_relation(&mut self, indent: usize) -> Result<Option<RelationNode>> {
        let Some(line) = self.take() else {
            return Ok(None);
        };
        let marker = match line.first_kind() {
            Some(TokenKind::RelationMarker(marker)) => *marker,
            _ => return Ok(None),
        };
        let mut tokens = line.tokens[1..].to_vec();
        let mut span = line.span();
        if let Some(more) = self.take_continuation(Some(indent), &mut tokens) {
            span = span.merge(more);
        }

        match self.build_element(&tokens, span)? {
            None => {
                self.report(SyntaxError::new(
                    format!("relation `{marker}` without target"),
                    line.start,
                ))?;
                self.skip_deeper(indent);
                Ok(None)
            }
            Some(target) => {
                let children = self.parse_relations(indent)?;
                let span = children.iter().fold(span, |acc, c| acc.merge(c.span));
                Ok(Some(RelationNode {
                    marker,
                    target,
                    children,
                    span,
                }))
            }
        }
    }

    fn parse_pcs(&mut self) -> Result<Option<Pcs>> {
        let start = match self.peek() {
            Some(line) => line.start,
            None => return Ok(None),
        };
        let mut items = Vec::new();
        let mut span = Span::new(start, start);

        while let Some(line) = self.peek() {
            if line.blank {
                if self.pcs_continues_after_blank() {
                    self.index += 1;
                    continue;
                }
                break;
            }
            if line.indent != 0 {
                break;
            }
            let kind = line.first_kind().cloned();
            match kind {
                Some(TokenKind::PcsNumber(number)) => {
                    let Some(line) = self.take() else {
                        break;
                    };
                    let mut tokens = line.tokens[1..].to_vec();
                    let mut line_span = line.span();
                    if let Some(more) = self.take_continuation(None, &mut tokens) {
                        line_span = line_span.merge(more);
                    }
                    let statement = match self.build_element(&tokens, line_span)? {
                        Some(Element::Statement(statement)) => statement,
                        Some(Element::Argument(_)) => {
                            self.report(SyntaxError::new(
                                "premise-conclusion structures may only contain statements",
                                line.start,
                            ))?;
                            self.skip_pcs_remainder();
                            return Ok(None);
                        }
                        None => {
                            self.report(SyntaxError::new(
                                format!("empty statement ({number})"),
                                line.start,
                            ))?;
                            self.skip_pcs_remainder();
                            return Ok(None);
                        }
                    };
                    let relations = self.parse_relations(0)?;
                    span = relations
                        .iter()
                        .fold(span.merge(line_span), |acc, r| acc.merge(r.span));
                    items.push(PcsItem::Statement(PcsStatement {
                        number,
                        statement,
                        relations,
                    }));
                }
                Some(TokenKind::Inference(text)) => {
                    let Some(line) = self.take() else {
                        break;
                    };
                    span = span.merge(line.span());
                    items.push(PcsItem::Inference(Inference {
                        text,
                        span: line.span(),
                    }));
                }
                _ => break,
            }
        }

        if let Some(message) = validate_pcs(&items) {
            self.report(SyntaxError::new(message, start))?;
            return Ok(None);
        }
        Ok(Some(Pcs { items, span }))
    }

    fn pcs_continues_after_blank(&self) -> bool {
        self.lines[self.index..]
            .iter()
            .find(|l| !l.blank)
            .map_or(false, |l| {
                l.indent == 0
                    && matches!(
                        l.first_kind(),
                        Some(TokenKind::PcsNumber(_) | TokenKind::Inference(_))
                    )
            })
    }

    fn skip_pcs_remainder(&mut self) {
        while let Some(line) = self.peek() {
            let in_pcs = line.indent > 0
                || matches!(
                    line.first_kind(),
                    Some(TokenKind::PcsNumber(_) | TokenKind::Inference(_))
                );
            if line.blank || !in_pcs {
                break;
            }
            self.index += 1;
        }
    }

    fn build_element(&mut self, tokens: &[Token], span: Span) -> Result<Option<Element>> {
        let Some(first) = tokens.first() else {
            return Ok(None);
        };
        let (head, rest) = match &first.kind {
            TokenKind::StatementDefinition(_)
            | TokenKind::StatementReference(_)
            | TokenKind::ArgumentDefinition(_)
            | TokenKind::ArgumentReference(_) => (Some(&first.kind), &tokens[1..]),
            _ => (None, tokens),
        };
        let inline = self.collect_inline(rest)?;
        let has_text = !inline.text.is_empty();

        let element = match head {
            Some(TokenKind::StatementDefinition(title)) | Some(TokenKind::StatementReference(title)) => {
                let is_definition = matches!(head, Some(TokenKind::StatementDefinition(_)));
                Element::Statement(StatementNode {
                    title: Some(title.clone()),
                    is_reference: !is_definition && !has_text,
                    text: has_text.then_some(inline.text),
                    tags: inline.tags,
                    mentions: inline.mentions,
                    data: inline.data,
                    span,
                })
            }
            Some(TokenKind::ArgumentDefinition(title)) | Some(TokenKind::ArgumentReference(title)) => {
                let is_definition = matches!(head, Some(TokenKind::ArgumentDefinition(_)));
                Element::Argument(ArgumentNode {
                    title: Some(title.clone()),
                    is_reference: !is_definition && !has_text,
                    description: has_text.then_some(inline.text),
                    tags: inline.tags,
                    mentions: inline.mentions,
                    data: inline.data,
                    span,
                })
            }
            _ => {
                if !has_text && inline.tags.is_empty() {
                    return Ok(None);
                }
                Element::Statement(StatementNode {
                    title: None,
                    text: Some(inline.text),
                    is_reference: false,
                    tags: inline.tags,
                    mentions: inline.mentions,
                    data: inline.data,
                    span,
                })
            }
        };
        Ok(Some(element))
    }

    fn collect_inline(&mut self, tokens: &[Token]) -> Result<Inline> {
        let mut inline = Inline::default();
        let mut raw = String::new();

        for token in tokens {
            match &token.kind {
                TokenKind::Text(text) => raw.push_str(text),
                TokenKind::Tag(tag) => {
                    if tag.contains(char::is_whitespace) {
                        raw.push_str(&format!("#({tag})"));
                    } else {
                        raw.push_str(&format!("#{tag}"));
                    }
                    if !inline.tags.contains(tag) {
                        inline.tags.push(tag.clone());
                    }
                }
                TokenKind::StatementMention(title) => {
                    raw.push_str(&format!("@[{title}]"));
                    inline.mentions.push(Mention::Statement(title.clone()));
                }
                TokenKind::ArgumentMention(title) => {
                    raw.push_str(&format!("@<{title}>"));
                    inline.mentions.push(Mention::Argument(title.clone()));
                }
                TokenKind::StatementDefinition(title) => raw.push_str(&format!("[{title}]:")),
                TokenKind::StatementReference(title) => raw.push_str(&format!("[{title}]")),
                TokenKind::ArgumentDefinition(title) => raw.push_str(&format!("<{title}>:")),
                TokenKind::ArgumentReference(title) => raw.push_str(&format!("<{title}>")),
                TokenKind::Data(content) => match parse_data(content, token.position) {
                    Ok(map) => match inline.data.as_mut() {
                        Some(existing) => existing.extend(map),
                        None => inline.data = Some(map),
                    },
                    Err(e) => self.report(e)?,
                },
                _ => {}
            }
        }
        inline.text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(inline)
    }
}

fn validate_pcs(items: &[PcsItem]) -> Option<&'static str> {
    if !matches!(items.first(), Some(PcsItem::Statement(_))) {
        return Some("premise-conclusion structure must start with a premise");
    }
    let mut previous_was_inference = false;
    for item in items {
        let is_inference = matches!(item, PcsItem::Inference(_));
        if is_inference && previous_was_inference {
            return Some("two consecutive inferences in premise-conclusion structure");
        }
        previous_was_inference = is_inference;
    }
    let ends_with_conclusion = items.len() >= 3
        && matches!(items[items.len() - 1], PcsItem::Statement(_))
        && matches!(items[items.len() - 2], PcsItem::Inference(_));
    if !ends_with_conclusion {
        return Some("premise-conclusion structure must end with an inference and a conclusion");
    }
    None
}

/// Attach a PCS to the directly preceding argument, or wrap it in an untitled one.
fn attach_pcs(blocks: &mut Vec<Block>, pcs: Pcs) {
    if let Some(Block::Element(block)) = blocks.last_mut() {
        if block.element.is_argument() && block.pcs.is_none() {
            block.span = block.span.merge(pcs.span);
            block.pcs = Some(pcs);
            return;
        }
    }
    let span = pcs.span;
    blocks.push(Block::Element(ElementBlock {
        element: Element::Argument(ArgumentNode {
            span,
            ..ArgumentNode::default()
        }),
        relations: Vec::new(),
        pcs: Some(pcs),
        span,
    }));
}
