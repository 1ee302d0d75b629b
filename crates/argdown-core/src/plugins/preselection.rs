//! `build-map`: tag and section filters over the whole model.

use argdown_engine::{ArgdownError, Logger, Plugin, Request, Response, ResponseField, SelectionSettings};
use argdown_model::{Model, SectionId, Selection};
use tracing::debug;

/// Writes the first [`Selection`] from the request's top-level selection
/// settings. Later selection plugins only narrow it down.
#[derive(Debug, Default)]
pub struct PreselectionPlugin;

impl Plugin for PreselectionPlugin {
    fn name(&self) -> &str {
        "preselection"
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model]
    }

    fn run(&self, request: &Request, response: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        let model = response.require_model(self.name())?;
        let selection = preselect(model, &request.selection);
        debug!(
            statements = selection.statements.len(),
            arguments = selection.arguments.len(),
            "preselected elements"
        );
        response.selection = Some(selection);
        Ok(())
    }
}

/// Apply tag and section filters, then the include and exclude lists.
/// Excluding wins over including.
pub fn preselect(model: &Model, settings: &SelectionSettings) -> Selection {
    let mut selection = Selection::default();

    for class in model.classes() {
        let selected = settings.include_statements.contains(&class.title)
            || matches_filters(model, settings, &class.tags, class.section);
        if selected && !settings.exclude_statements.contains(&class.title) {
            selection.statements.insert(class.title.clone());
        }
    }
    for argument in model.arguments() {
        let selected = matches_filters(model, settings, &argument.tags, argument.section);
        if selected && !settings.exclude_arguments.contains(&argument.title) {
            selection.arguments.insert(argument.title.clone());
        }
    }
    selection
}

fn matches_filters(
    model: &Model,
    settings: &SelectionSettings,
    tags: &[String],
    section: Option<SectionId>,
) -> bool {
    // The without-tag and without-section switches only matter once a filter is set.
    let tag_ok = match &settings.selected_tags {
        None => true,
        Some(_) if tags.is_empty() => settings.select_elements_without_tag,
        Some(selected) => tags.iter().any(|t| selected.contains(t)),
    };

    let section_ok = match (&settings.selected_sections, section) {
        (None, _) => true,
        (Some(_), None) => settings.select_elements_without_section,
        (Some(selected), Some(section)) => model
            .section_path(section)
            .iter()
            .any(|s| selected.contains(&s.title)),
    };

    tag_ok && section_ok
}
