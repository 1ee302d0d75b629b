//! `parse-input`: source text to syntax tree.

use argdown_engine::{ArgdownError, Logger, Plugin, Request, Response};
use argdown_parser::Parser;
use tracing::debug;

/// Parses `request.input` into `response.ast`.
///
/// Recoverable syntax errors land in `response.parser_errors` and
/// `response.exceptions`. With `throwExceptions` the first one aborts.
#[derive(Debug, Default)]
pub struct ParserPlugin;

impl Plugin for ParserPlugin {
    fn name(&self) -> &str {
        "parser"
    }

    fn run(&self, request: &Request, response: &mut Response, logger: &Logger) -> Result<(), ArgdownError> {
        let input = request.input.as_deref().unwrap_or_default();
        let output = Parser::new(input)
            .fail_fast(request.throw_exceptions)
            .parse()?;

        debug!(
            blocks = output.document.blocks.len(),
            errors = output.errors.len(),
            "parsed input"
        );
        for error in &output.errors {
            logger.warning(&error.to_string());
            response.exceptions.push(error.clone().into());
        }

        response.front_matter = output.document.front_matter.clone();
        response.parser_errors = output.errors;
        response.ast = Some(output.document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argdown_engine::LogLevel;

    fn run(request: &Request) -> Result<Response, ArgdownError> {
        let mut response = Response::default();
        ParserPlugin.run(request, &mut response, &Logger::new(LogLevel::None))?;
        Ok(response)
    }

    #[test]
    fn writes_ast_and_front_matter() {
        let request = Request::new("===\ncolor:\n  colorizeByRelation: true\n===\n\n[A]: a");
        let response = run(&request).unwrap();
        assert_eq!(response.ast.unwrap().blocks.len(), 1);
        assert!(response.front_matter.unwrap().contains_key("color"));
        assert!(response.exceptions.is_empty());
    }

    #[test]
    fn empty_input_is_an_empty_document() {
        let response = run(&Request::default()).unwrap();
        assert!(response.ast.unwrap().is_empty());
        assert!(response.parser_errors.is_empty());
    }

    #[test]
    fn syntax_errors_are_recorded_or_thrown() {
        let input = "[A]: a\n\n  + [B]: orphan";
        let response = run(&Request::new(input)).unwrap();
        assert_eq!(response.parser_errors.len(), 1);
        assert_eq!(response.exceptions[0].code(), "syntax");

        let err = run(&Request::new(input).throwing(true)).unwrap_err();
        assert_eq!(err.code(), "syntax");
    }
}
