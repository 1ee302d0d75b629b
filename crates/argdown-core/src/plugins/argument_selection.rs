//! `build-map`: which arguments become map nodes.

use argdown_engine::{
    ArgdownError, Capabilities, Logger, Plugin, PluginSettings, Request, Response, ResponseField,
    SelectionSettings,
};
use argdown_model::{ElementRef, Model, Selection};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArgumentSelectionMode {
    #[default]
    All,
    WithRelations,
}

/// Settings of the `argumentSelection` namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArgumentSelectionSettings {
    pub mode: ArgumentSelectionMode,
    pub exclude_disconnected: bool,
}

impl PluginSettings for ArgumentSelectionSettings {
    const NAMESPACE: &'static str = "argumentSelection";
}

#[derive(Debug, Default)]
pub struct ArgumentSelectionPlugin;

impl Plugin for ArgumentSelectionPlugin {
    fn name(&self) -> &str {
        "argument-selection"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model, ResponseField::Selection]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<ArgumentSelectionSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        let settings = request.settings::<ArgumentSelectionSettings>()?;
        let Some(mut selection) = response.selection.take() else {
            return Err(ArgdownError::MissingDependency {
                plugin: self.name().to_string(),
                field: ResponseField::Selection.to_string(),
            });
        };
        let model = response.require_model_mut(self.name())?;

        select_arguments(model, &mut selection, &settings, &request.selection);
        debug!(
            mode = ?settings.mode,
            arguments = selection.arguments.len(),
            "selected arguments"
        );
        response.selection = Some(selection);
        Ok(())
    }
}

/// Apply the mode and `isInMap` flags to the preselected arguments.
pub fn select_arguments(
    model: &mut Model,
    selection: &mut Selection,
    settings: &ArgumentSelectionSettings,
    filters: &SelectionSettings,
) {
    let chosen: Vec<String> = model
        .arguments()
        .iter()
        .filter(|argument| !filters.exclude_arguments.contains(&argument.title))
        .filter(|argument| match argument.flag("isInMap").filter(|_| !filters.ignore_is_in_map) {
            Some(flag) => flag,
            None => {
                selection.arguments.contains(&argument.title)
                    && match settings.mode {
                        ArgumentSelectionMode::All => true,
                        ArgumentSelectionMode::WithRelations => !argument.relations.is_empty(),
                    }
            }
        })
        .map(|argument| argument.title.clone())
        .collect();
    selection.arguments = chosen.into_iter().collect();

    if settings.exclude_disconnected {
        let connected: Vec<String> = selection
            .arguments
            .iter()
            .filter(|title| {
                let element = ElementRef::Argument(title.to_string());
                let connected = model
                    .relations_of(&element)
                    .filter_map(|r| r.other_end(&element))
                    .any(|other| selection.contains(other));
                connected
            })
            .cloned()
            .collect();
        selection.arguments = connected.into_iter().collect();
    }

    for argument in model.arguments_mut() {
        argument.is_in_map = selection.arguments.contains(&argument.title);
    }
}
