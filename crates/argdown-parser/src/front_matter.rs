//! YAML front matter and inline `{...}` data blocks.

use serde_json::{Map, Value};

use crate::error::{Result, SyntaxError};
use crate::token::Position;

/// Parse the content between the `===` fences into a JSON object.
///
/// An empty block yields an empty object.
pub fn parse_front_matter(content: &str, position: Position) -> Result<Map<String, Value>> {
    parse_mapping(content, position, "front matter")
}

/// Parse an inline data block such as `{isInMap: false, color: red}`.
pub fn parse_data(raw: &str, position: Position) -> Result<Map<String, Value>> {
    parse_mapping(raw, position, "data")
}

fn parse_mapping(content: &str, position: Position, what: &str) -> Result<Map<String, Value>> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(content)
        .map_err(|e| SyntaxError::new(format!("invalid {what}: {e}"), position))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(SyntaxError::new(
            format!("{what} must be a mapping, found {}", type_name(&other)),
            position,
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_front_matter() {
        let map = parse_front_matter(
            "title: Test\nselectedTags:\n  - pro\ngroup:\n  groupDepth: 3",
            Position::start(),
        )
        .unwrap();
        assert_eq!(map["title"], Value::String("Test".into()));
        assert_eq!(map["selectedTags"][0], Value::String("pro".into()));
        assert_eq!(map["group"]["groupDepth"], Value::from(3));
    }

    #[test]
    fn inline_flow_mapping() {
        let map = parse_data("{isInMap: false, color: red}", Position::start()).unwrap();
        assert_eq!(map["isInMap"], Value::Bool(false));
        assert_eq!(map["color"], Value::String("red".into()));
    }

    #[test]
    fn scalar_is_rejected() {
        let err = parse_front_matter("just text", Position::new(1, 1, 0)).unwrap_err();
        assert!(err.message.contains("must be a mapping"));
    }

    #[test]
    fn empty_is_empty_map() {
        assert!(parse_front_matter("  \n", Position::start()).unwrap().is_empty());
    }
}
