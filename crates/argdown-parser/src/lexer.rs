//! Line-oriented lexer for Argdown source text.
//!
//! Comments are blanked out first (byte offsets are preserved), then each line
//! is split into an indentation token, an optional structural prefix (heading,
//! relation marker, PCS number, inference, list bullet), an optional element
//! head (`[Title]:`, `<Title>`, ...) and inline content.

use crate::error::SyntaxError;
use crate::token::{Position, RelationMarker, Token, TokenKind};

const TAB_WIDTH: usize = 4;
const MAX_HEADING_LEVEL: usize = 6;

/// Tokens and recoverable errors produced by [`tokenize`].
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<SyntaxError>,
}

/// Tokenize a complete Argdown document.
pub fn tokenize(input: &str) -> LexOutput {
    let mut output = LexOutput::default();
    let cleaned = strip_comments(input, &mut output.errors);

    let lines = split_lines(&cleaned);
    let mut index = 0;

    if let Some((token, consumed)) = lex_front_matter(&lines, &mut output.errors) {
        output.tokens.push(token);
        index = consumed;
    }

    for line in &lines[index..] {
        lex_line(line, &mut output);
    }

    let end = end_position(input);
    output.tokens.push(Token::new(TokenKind::Eof, end));
    output
}

/// One physical line of the comment-free input.
#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    text: &'a str,
    number: usize,
    offset: usize,
}

fn split_lines(input: &str) -> Vec<SourceLine<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for (idx, raw) in input.split('\n').enumerate() {
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        lines.push(SourceLine {
            text,
            number: idx + 1,
            offset,
        });
        offset += raw.len() + 1;
    }
    // A trailing newline yields one empty pseudo-line; drop it.
    if input.ends_with('\n') {
        lines.pop();
    }
    lines
}

fn end_position(input: &str) -> Position {
    let mut position = Position::start();
    for c in input.chars() {
        advance(&mut position, c);
    }
    position
}

fn advance(position: &mut Position, c: char) {
    position.offset += c.len_utf8();
    if c == '\n' {
        position.line += 1;
        position.column = 1;
    } else {
        position.column += 1;
    }
}

/// Replace comments by whitespace, keeping newlines and byte offsets intact.
fn strip_comments(input: &str, errors: &mut Vec<SyntaxError>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut position = Position::start();
    let mut index = 0;
    let mut prev: Option<char> = None;

    while index < input.len() {
        let rest = &input[index..];

        let block = if rest.starts_with("/*") {
            Some(("/*", "*/"))
        } else if rest.starts_with("<!--") {
            Some(("<!--", "-->"))
        } else {
            None
        };

        let consumed = if let Some((open, close)) = block {
            match rest[open.len()..].find(close) {
                Some(at) => open.len() + at + close.len(),
                None => {
                    errors.push(SyntaxError::new("unterminated comment", position));
                    rest.len()
                }
            }
        } else if rest.starts_with("//") && prev.map_or(true, char::is_whitespace) {
            rest.find('\n').unwrap_or(rest.len())
        } else {
            0
        };

        if consumed > 0 {
            for c in rest[..consumed].chars() {
                if c == '\n' {
                    out.push('\n');
                } else {
                    out.extend(std::iter::repeat(' ').take(c.len_utf8()));
                }
                advance(&mut position, c);
            }
            index += consumed;
            prev = Some(' ');
            continue;
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        out.push(c);
        advance(&mut position, c);
        index += c.len_utf8();
        prev = Some(c);
    }
    out
}

fn lex_front_matter(
    lines: &[SourceLine<'_>],
    errors: &mut Vec<SyntaxError>,
) -> Option<(Token, usize)> {
    let first = lines.iter().position(|l| !l.text.trim().is_empty())?;
    if lines[first].text.trim() != "===" {
        return None;
    }
    let opening = Position::new(lines[first].number, 1, lines[first].offset);
    let closing = lines[first + 1..]
        .iter()
        .position(|l| l.text.trim() == "===")
        .map(|i| first + 1 + i);

    let end = match closing {
        Some(end) => end,
        None => {
            errors.push(SyntaxError::new("unterminated front matter", opening));
            lines.len()
        }
    };
    let content = lines[first + 1..end]
        .iter()
        .map(|l| l.text)
        .collect::<Vec<_>>()
        .join("\n");
    let consumed = (end + 1).min(lines.len());
    Some((Token::new(TokenKind::FrontMatter(content), opening), consumed))
}

/// Cursor over a single line.
struct LineScanner<'a> {
    text: &'a str,
    index: usize,
    line: usize,
    column: usize,
    line_offset: usize,
}

impl<'a> LineScanner<'a> {
    fn new(line: &SourceLine<'a>) -> Self {
        Self {
            text: line.text,
            index: 0,
            line: line.number,
            column: 1,
            line_offset: line.offset,
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.index..]
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.line_offset + self.index)
    }

    fn is_done(&self) -> bool {
        self.index >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self, bytes: usize) {
        let consumed = &self.text[self.index..self.index + bytes];
        self.column += consumed.chars().count();
        self.index += bytes;
    }

    fn skip_whitespace(&mut self) {
        let ws: usize = self
            .rest()
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        self.bump(ws);
    }
}

fn lex_line(line: &SourceLine<'_>, output: &mut LexOutput) {
    let mut scanner = LineScanner::new(line);

    if line.text.trim().is_empty() {
        output
            .tokens
            .push(Token::new(TokenKind::Emptyline, scanner.position()));
        return;
    }

    let mut width = 0;
    let mut indent_bytes = 0;
    for c in line.text.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += TAB_WIDTH,
            _ => break,
        }
        indent_bytes += 1;
    }
    if width > 0 {
        output
            .tokens
            .push(Token::new(TokenKind::Indent(width), scanner.position()));
        scanner.bump(indent_bytes);
    }

    let heading = lex_structure(&mut scanner, width, output);
    if !matches!(heading, Structure::InferenceDone) {
        scanner.skip_whitespace();
        if !matches!(heading, Structure::Heading) {
            lex_element_head(&mut scanner, output);
        }
        lex_inline(&mut scanner, output);
    }

    output
        .tokens
        .push(Token::new(TokenKind::Newline, scanner.position()));
}

enum Structure {
    None,
    Heading,
    Other,
    InferenceDone,
}

fn lex_structure(scanner: &mut LineScanner<'_>, indent: usize, output: &mut LexOutput) -> Structure {
    let rest = scanner.rest();
    let position = scanner.position();

    if indent == 0 && rest.starts_with('#') {
        let level = rest.chars().take_while(|c| *c == '#').count();
        let after = &rest[level..];
        if level <= MAX_HEADING_LEVEL && (after.is_empty() || after.starts_with(char::is_whitespace)) {
            output
                .tokens
                .push(Token::new(TokenKind::HeadingStart(level), position));
            scanner.bump(level);
            return Structure::Heading;
        }
    }

    let trimmed = rest.trim_end();
    if trimmed.starts_with("--") {
        let inner = trimmed.trim_matches('-').trim();
        let text = if inner.is_empty() {
            None
        } else {
            Some(inner.to_string())
        };
        output
            .tokens
            .push(Token::new(TokenKind::Inference(text), position));
        scanner.bump(rest.len());
        return Structure::InferenceDone;
    }

    for (symbol, marker) in RelationMarker::SYMBOLS {
        if let Some(after) = rest.strip_prefix(symbol) {
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                output
                    .tokens
                    .push(Token::new(TokenKind::RelationMarker(marker), position));
                scanner.bump(symbol.len());
                return Structure::Other;
            }
        }
    }

    if let Some(after) = rest.strip_prefix('(') {
        let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
        let tail = &after[digits.len()..];
        if !digits.is_empty() {
            if let Some(tail) = tail.strip_prefix(')') {
                if tail.is_empty() || tail.starts_with(char::is_whitespace) {
                    if let Ok(number) = digits.parse::<u32>() {
                        output
                            .tokens
                            .push(Token::new(TokenKind::PcsNumber(number), position));
                        scanner.bump(digits.len() + 2);
                        return Structure::Other;
                    }
                }
            }
        }
    }

    if rest.starts_with("* ") {
        output.tokens.push(Token::new(TokenKind::ListItem, position));
        scanner.bump(1);
        return Structure::Other;
    }
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && rest[digits..].starts_with(". ") {
        output.tokens.push(Token::new(TokenKind::ListItem, position));
        scanner.bump(digits + 1);
        return Structure::Other;
    }

    Structure::None
}

fn lex_element_head(scanner: &mut LineScanner<'_>, output: &mut LexOutput) {
    let rest = scanner.rest();
    let position = scanner.position();
    let (open, close, what) = match scanner.peek() {
        Some('[') => ('[', ']', "statement"),
        Some('<') => ('<', '>', "argument"),
        _ => return,
    };

    let Some(end) = rest.find(close) else {
        output.errors.push(SyntaxError::new(
            format!("unclosed {what} title: missing `{close}`"),
            position,
        ));
        return;
    };
    let title = rest[open.len_utf8()..end].trim();
    if title.is_empty() {
        return;
    }
    let after = &rest[end + close.len_utf8()..];
    if open == '[' && after.starts_with('(') {
        // Markdown link, not an element.
        return;
    }

    let (kind, consumed) = match (open, after.starts_with(':')) {
        ('[', true) => (TokenKind::StatementDefinition(title.to_string()), end + 2),
        ('[', false) => (TokenKind::StatementReference(title.to_string()), end + 1),
        (_, true) => (TokenKind::ArgumentDefinition(title.to_string()), end + 2),
        (_, false) => (TokenKind::ArgumentReference(title.to_string()), end + 1),
    };
    output.tokens.push(Token::new(kind, position));
    scanner.bump(consumed);
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '/')
}

fn lex_inline(scanner: &mut LineScanner<'_>, output: &mut LexOutput) {
    let mut text = String::new();
    let mut text_start = scanner.position();
    let mut prev_ws = true;

    fn flush(text: &mut String, start: Position, output: &mut LexOutput) {
        if !text.is_empty() {
            output
                .tokens
                .push(Token::new(TokenKind::Text(std::mem::take(text)), start));
        }
    }

    while let Some(c) = scanner.peek() {
        let rest = scanner.rest();
        let position = scanner.position();

        let special = match c {
            '#' if prev_ws => lex_tag(rest, position, &mut output.errors),
            '@' if rest.starts_with("@[") || rest.starts_with("@<") => lex_mention(rest),
            '{' => lex_data(rest),
            _ => None,
        };

        match special {
            Some((kind, consumed)) => {
                flush(&mut text, text_start, output);
                output.tokens.push(Token::new(kind, position));
                scanner.bump(consumed);
                prev_ws = false;
            }
            None => {
                if text.is_empty() {
                    text_start = position;
                }
                text.push(c);
                scanner.bump(c.len_utf8());
                prev_ws = c.is_whitespace();
            }
        }
    }
    flush(&mut text, text_start, output);
    debug_assert!(scanner.is_done());
}

fn lex_tag(
    rest: &str,
    position: Position,
    errors: &mut Vec<SyntaxError>,
) -> Option<(TokenKind, usize)> {
    let body = &rest[1..];
    if let Some(inner) = body.strip_prefix('(') {
        return match inner.find(')') {
            Some(end) if !inner[..end].trim().is_empty() => Some((
                TokenKind::Tag(inner[..end].trim().to_string()),
                end + 3,
            )),
            Some(_) => None,
            None => {
                errors.push(SyntaxError::new("unclosed tag: missing `)`", position));
                None
            }
        };
    }
    let name: String = body.chars().take_while(|c| is_tag_char(*c)).collect();
    if name.is_empty() {
        return None;
    }
    let consumed = 1 + name.len();
    Some((TokenKind::Tag(name), consumed))
}

fn lex_mention(rest: &str) -> Option<(TokenKind, usize)> {
    let (close, statement) = if rest.starts_with("@[") {
        (']', true)
    } else {
        ('>', false)
    };
    let end = rest.find(close)?;
    let title = rest[2..end].trim();
    if title.is_empty() {
        return None;
    }
    let kind = if statement {
        TokenKind::StatementMention(title.to_string())
    } else {
        TokenKind::ArgumentMention(title.to_string())
    };
    Some((kind, end + 1))
}

/// A `{...}` block counts as data only when it closes the line.
fn lex_data(rest: &str) -> Option<(TokenKind, usize)> {
    let mut depth = 0usize;
    for (idx, c) in rest.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = idx + 1;
                    if rest[end..].trim().is_empty() {
                        return Some((TokenKind::Data(rest[..end].to_string()), rest.len()));
                    }
                    return None;
                }
            }
            _ => {}
        }
    }
    None
}
