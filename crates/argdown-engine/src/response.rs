//! The response half of the pipeline context.

use std::collections::BTreeMap;
use std::fmt;

use argdown_model::{ArgumentMap, ColorAssignments, Model, Selection};
use argdown_parser::{Document, SyntaxError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ArgdownError;

/// A response field a plugin can declare as required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseField {
    Ast,
    Model,
    Selection,
    Map,
    Colors,
    Dot,
    Json,
    /// A key of [`Response::outputs`].
    Output(String),
}

impl fmt::Display for ResponseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseField::Ast => f.write_str("ast"),
            ResponseField::Model => f.write_str("model"),
            ResponseField::Selection => f.write_str("selection"),
            ResponseField::Map => f.write_str("map"),
            ResponseField::Colors => f.write_str("colors"),
            ResponseField::Dot => f.write_str("dot"),
            ResponseField::Json => f.write_str("json"),
            ResponseField::Output(key) => write!(f, "outputs.{key}"),
        }
    }
}

/// Everything stages produce during one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    pub run_id: Option<Uuid>,
    pub ast: Option<Document>,
    pub front_matter: Option<Map<String, Value>>,
    pub parser_errors: Vec<SyntaxError>,
    pub model: Option<Model>,
    pub selection: Option<Selection>,
    pub map: Option<ArgumentMap>,
    pub colors: Option<ColorAssignments>,
    pub dot: Option<String>,
    pub json: Option<String>,
    pub exceptions: Vec<ArgdownError>,
    /// Results of collaborator plugins, keyed by name.
    pub outputs: BTreeMap<String, Value>,
}

impl Response {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }

    /// Whether `field` has been written.
    pub fn has(&self, field: &ResponseField) -> bool {
        match field {
            ResponseField::Ast => self.ast.is_some(),
            ResponseField::Model => self.model.is_some(),
            ResponseField::Selection => self.selection.is_some(),
            ResponseField::Map => self.map.is_some(),
            ResponseField::Colors => self.colors.is_some(),
            ResponseField::Dot => self.dot.is_some(),
            ResponseField::Json => self.json.is_some(),
            ResponseField::Output(key) => self.outputs.contains_key(key),
        }
    }

    /// Model, or a [`ArgdownError::MissingDependency`] naming `plugin`.
    pub fn require_model(&self, plugin: &str) -> Result<&Model, ArgdownError> {
        self.model.as_ref().ok_or_else(|| missing(plugin, ResponseField::Model))
    }

    pub fn require_model_mut(&mut self, plugin: &str) -> Result<&mut Model, ArgdownError> {
        self.model
            .as_mut()
            .ok_or_else(|| missing(plugin, ResponseField::Model))
    }

    pub fn require_map_mut(&mut self, plugin: &str) -> Result<&mut ArgumentMap, ArgdownError> {
        self.map.as_mut().ok_or_else(|| missing(plugin, ResponseField::Map))
    }
}

fn missing(plugin: &str, field: ResponseField) -> ArgdownError {
    ArgdownError::MissingDependency {
        plugin: plugin.to_string(),
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_presence() {
        let mut response = Response::new(Uuid::new_v4());
        assert!(!response.has(&ResponseField::Model));
        response.model = Some(Model::new());
        assert!(response.has(&ResponseField::Model));

        let svg = ResponseField::Output("svg".into());
        assert!(!response.has(&svg));
        response.outputs.insert("svg".into(), Value::from("<svg/>"));
        assert!(response.has(&svg));
        assert_eq!(svg.to_string(), "outputs.svg");
    }

    #[test]
    fn missing_model_names_plugin() {
        let response = Response::default();
        let err = response.require_model("map").unwrap_err();
        assert_eq!(
            err,
            ArgdownError::MissingDependency {
                plugin: "map".into(),
                field: "model".into()
            }
        );
    }
}
