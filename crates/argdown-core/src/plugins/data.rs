//! Front matter as request configuration.

use argdown_engine::{ArgdownError, Capabilities, Logger, Plugin, Request, Response};

/// Applies the document's front matter on top of the request before any
/// other `build-model` plugin prepares its settings.
///
/// Register it first in its stage.
#[derive(Debug, Default)]
pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn name(&self) -> &str {
        "data"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE
    }

    fn prepare(&self, request: &mut Request, response: &Response) -> Result<(), ArgdownError> {
        match &response.front_matter {
            Some(front_matter) => request.overlay(front_matter),
            None => Ok(()),
        }
    }

    fn run(&self, _: &Request, _: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn front_matter_overrides_request() {
        let mut request = Request::new("[A]: a")
            .with_process("export-dot")
            .with_namespace("group", json!({"groupDepth": 3}));
        let mut response = Response::default();
        response.front_matter = json!({
            "excludeStatements": ["A"],
            "group": {"groupDepth": 1}
        })
        .as_object()
        .cloned();

        DataPlugin.prepare(&mut request, &response).unwrap();
        assert_eq!(request.selection.exclude_statements, vec!["A".to_string()]);
        assert_eq!(request.namespace("group").unwrap()["groupDepth"], 1);
        assert_eq!(request.input.as_deref(), Some("[A]: a"));
    }

    #[test]
    fn no_front_matter_is_a_no_op() {
        let mut request = Request::new("x");
        DataPlugin.prepare(&mut request, &Response::default()).unwrap();
        assert_eq!(request.input.as_deref(), Some("x"));
    }
}
