//! `build-map`: which equivalence classes become map nodes.

use argdown_engine::{
    ArgdownError, Capabilities, Logger, Plugin, PluginSettings, Request, Response, ResponseField,
    SelectionSettings,
};
use argdown_model::{ElementRef, EquivalenceClass, Model, Selection};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementSelectionMode {
    All,
    /// Statements that were given an explicit title.
    #[default]
    WithTitle,
    /// Statements declared as top-level blocks.
    Top,
    WithRelations,
    NotUsedInArgument,
}

/// Settings of the `statementSelection` namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatementSelectionSettings {
    pub mode: StatementSelectionMode,
    /// Drop statements without a relation to another selected element.
    pub exclude_disconnected: bool,
}

impl PluginSettings for StatementSelectionSettings {
    const NAMESPACE: &'static str = "statementSelection";
}

/// Narrows `response.selection.statements` and marks the chosen classes
/// and their statements `is_in_map`.
#[derive(Debug, Default)]
pub struct StatementSelectionPlugin;

impl Plugin for StatementSelectionPlugin {
    fn name(&self) -> &str {
        "statement-selection"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model, ResponseField::Selection]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<StatementSelectionSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        let settings = request.settings::<StatementSelectionSettings>()?;
        let Some(mut selection) = response.selection.take() else {
            return Err(missing(self.name()));
        };
        let model = response.require_model_mut(self.name())?;

        select_statements(model, &mut selection, &settings, &request.selection);
        debug!(
            mode = ?settings.mode,
            statements = selection.statements.len(),
            "selected statements"
        );
        response.selection = Some(selection);
        Ok(())
    }
}

fn missing(plugin: &str) -> ArgdownError {
    ArgdownError::MissingDependency {
        plugin: plugin.to_string(),
        field: ResponseField::Selection.to_string(),
    }
}

/// Apply the mode and `isInMap` flags to the preselected classes.
pub fn select_statements(
    model: &mut Model,
    selection: &mut Selection,
    settings: &StatementSelectionSettings,
    filters: &SelectionSettings,
) {
    let chosen: Vec<String> = model
        .classes()
        .iter()
        .filter(|class| {
            if filters.exclude_statements.contains(&class.title) {
                return false;
            }
            if filters.include_statements.contains(&class.title) {
                return true;
            }
            match class.flag("isInMap").filter(|_| !filters.ignore_is_in_map) {
                Some(flag) => flag,
                None => selection.statements.contains(&class.title) && matches_mode(class, settings.mode),
            }
        })
        .map(|class| class.title.clone())
        .collect();
    selection.statements = chosen.into_iter().collect();

    if settings.exclude_disconnected {
        let connected: Vec<String> = selection
            .statements
            .iter()
            .filter(|title| {
                let element = ElementRef::Statement(title.to_string());
                let connected = model
                    .relations_of(&element)
                    .filter_map(|r| r.other_end(&element))
                    .any(|other| selection.contains(other));
                connected
            })
            .cloned()
            .collect();
        selection.statements = connected.into_iter().collect();
    }

    for class in model.classes_mut() {
        class.is_in_map = selection.statements.contains(&class.title);
    }
    for statement in model.statements_mut() {
        statement.is_in_map = selection.statements.contains(&statement.title);
    }
}

fn matches_mode(class: &EquivalenceClass, mode: StatementSelectionMode) -> bool {
    match mode {
        StatementSelectionMode::All => true,
        StatementSelectionMode::WithTitle => !class.is_auto_titled,
        StatementSelectionMode::Top => class.is_used_as_top_level_statement,
        StatementSelectionMode::WithRelations => !class.relations.is_empty(),
        StatementSelectionMode::NotUsedInArgument => !class.is_used_in_argument(),
    }
}
