//! `export-json`: the complete model as JSON.

use argdown_engine::{
    ArgdownError, Capabilities, Logger, Plugin, PluginSettings, Request, Response, ResponseField,
};
use argdown_model::{ArgumentMap, Model};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Settings of the `json` namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonSettings {
    pub pretty: bool,
    /// Include `response.map` when present.
    pub export_map: bool,
    /// Leave out the relation id lists on statements, classes and arguments.
    pub remove_embedded_relations: bool,
}

impl Default for JsonSettings {
    fn default() -> Self {
        Self {
            pretty: true,
            export_map: true,
            remove_embedded_relations: false,
        }
    }
}

impl PluginSettings for JsonSettings {
    const NAMESPACE: &'static str = "json";
}

/// Writes `response.json`. Reads the full model, not the selection.
#[derive(Debug, Default)]
pub struct JsonExportPlugin;

impl Plugin for JsonExportPlugin {
    fn name(&self) -> &str {
        "json-export"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<JsonSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        let settings = request.settings::<JsonSettings>()?;
        let model = response.require_model(self.name())?;
        let map = response.map.as_ref().filter(|_| settings.export_map);

        let json = export_json(model, map, &settings)
            .map_err(|e| ArgdownError::plugin(self.name(), "serialize", e.to_string()))?;
        debug!(bytes = json.len(), "exported json");
        response.json = Some(json);
        Ok(())
    }
}

/// Serialize the model, and `map` if given.
pub fn export_json(
    model: &Model,
    map: Option<&ArgumentMap>,
    settings: &JsonSettings,
) -> Result<String, serde_json::Error> {
    let mut root = Map::new();
    root.insert("statements".into(), serde_json::to_value(model.classes())?);
    root.insert("occurrences".into(), serde_json::to_value(model.statements())?);
    root.insert("arguments".into(), serde_json::to_value(model.arguments())?);
    root.insert("relations".into(), serde_json::to_value(model.relations())?);
    root.insert("sections".into(), serde_json::to_value(model.sections())?);
    root.insert("tags".into(), serde_json::to_value(model.tags())?);
    if let Some(map) = map {
        root.insert("map".into(), serde_json::to_value(map)?);
    }

    if settings.remove_embedded_relations {
        for key in ["statements", "occurrences", "arguments"] {
            if let Some(Value::Array(items)) = root.get_mut(key) {
                for item in items.iter_mut().filter_map(Value::as_object_mut) {
                    item.remove("relations");
                }
            }
        }
    }

    let root = Value::Object(root);
    if settings.pretty {
        serde_json::to_string_pretty(&root)
    } else {
        serde_json::to_string(&root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::model::{build_model, ModelSettings};

    fn model() -> Model {
        build_model(
            &argdown_parser::parse("[A]: a #pro\n  + [B]: b\n\n<C>: c\n  - [A]").document,
            &ModelSettings::default(),
        )
        .0
    }

    #[test]
    fn exports_whole_model() {
        let json = export_json(&model(), None, &JsonSettings::default()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["statements"].as_array().unwrap().len(), 2);
        assert_eq!(value["arguments"][0]["title"], "C");
        assert_eq!(value["relations"].as_array().unwrap().len(), 2);
        assert_eq!(value["tags"][0], "pro");
        assert!(value.get("map").is_none());
        assert!(value["statements"][0].get("relations").is_some());
        assert!(json.contains('\n'));
    }

    #[test]
    fn compact_without_embedded_relations() {
        let settings = JsonSettings {
            pretty: false,
            remove_embedded_relations: true,
            ..JsonSettings::default()
        };
        let json = export_json(&model(), Some(&ArgumentMap::new()), &settings).unwrap();
        assert!(!json.contains('\n'));
        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value["statements"][0].get("relations").is_none());
        assert!(value["arguments"][0].get("relations").is_none());
        assert!(value["map"]["nodes"].as_array().unwrap().is_empty());
    }
}
