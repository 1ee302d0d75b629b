//! `build-model`: replace the heading structure with a configured one.

use argdown_engine::{ArgdownError, Capabilities, Logger, Plugin, Request, Response, ResponseField};
use argdown_model::{Model, SectionId};
use argdown_parser::Span;
use serde_json::{Map, Value};
use tracing::debug;

use super::group::{GroupSettings, RegroupConfig};

/// Rebuilds the model's sections from `group.regroup`. Does nothing when
/// no regrouping is configured.
#[derive(Debug, Default)]
pub struct RegroupPlugin;

impl Plugin for RegroupPlugin {
    fn name(&self) -> &str {
        "regroup"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<GroupSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, logger: &Logger) -> Result<(), ArgdownError> {
        let Some(config) = request.settings::<GroupSettings>()?.regroup else {
            return Ok(());
        };
        let model = response.require_model_mut(self.name())?;
        let unknown = regroup(model, &config);

        debug!(sections = model.sections().len(), unknown = unknown.len(), "regrouped model");
        for title in unknown {
            logger.warning(&format!("regroup: no statement or argument titled `{title}`"));
        }
        Ok(())
    }
}

/// Replace every section of `model` with the tree in `config`.
///
/// Listed titles are placed first, in config order, and the first placement
/// of an element wins. Tag rules then place the elements that are still
/// unplaced. Everything else ends up outside any section. Returns the listed
/// titles that match no element.
pub fn regroup(model: &mut Model, config: &[RegroupConfig]) -> Vec<String> {
    model.clear_sections();
    let mut placements = Vec::new();
    add_sections(model, config, None, 1, &mut placements);

    let mut unknown = Vec::new();
    for (section, entry) in &placements {
        for title in &entry.statements {
            if model.class(title).is_none() {
                unknown.push(format!("[{title}]"));
            } else {
                place_statement(model, title, *section);
            }
        }
        for title in &entry.arguments {
            match model.argument_mut(title) {
                Some(argument) if argument.section.is_none() => argument.section = Some(*section),
                Some(_) => {}
                None => unknown.push(format!("<{title}>")),
            }
        }
    }

    for (section, entry) in &placements {
        if entry.tags.is_empty() {
            continue;
        }
        let tagged = |tags: &[String]| tags.iter().any(|t| entry.tags.contains(t));
        let statements: Vec<String> = model
            .classes()
            .iter()
            .filter(|c| c.section.is_none() && tagged(&c.tags))
            .map(|c| c.title.clone())
            .collect();
        let arguments: Vec<String> = model
            .arguments()
            .iter()
            .filter(|a| a.section.is_none() && tagged(&a.tags))
            .map(|a| a.title.clone())
            .collect();

        for title in &statements {
            place_statement(model, title, *section);
        }
        for title in &arguments {
            if let Some(argument) = model.argument_mut(title) {
                argument.section = Some(*section);
            }
        }
    }
    unknown
}

fn add_sections<'a>(
    model: &mut Model,
    config: &'a [RegroupConfig],
    parent: Option<SectionId>,
    level: usize,
    placements: &mut Vec<(SectionId, &'a RegroupConfig)>,
) {
    for entry in config {
        let mut data = Map::new();
        if let Some(closed) = entry.is_closed {
            data.insert("isClosed".to_string(), Value::Bool(closed));
        }
        let id = model.add_section(entry.title.clone(), level, parent, Vec::new(), data, Span::default());
        placements.push((id, entry));
        add_sections(model, &entry.children, Some(id), level + 1, placements);
    }
}

/// Move a class and all of its occurrences into `section` unless it was
/// placed already.
fn place_statement(model: &mut Model, title: &str, section: SectionId) {
    let members = match model.class_mut(title) {
        Some(class) if class.section.is_none() => {
            class.section = Some(section);
            class.members.clone()
        }
        _ => return,
    };
    for id in members {
        if let Some(statement) = model.statement_mut(id) {
            statement.section = Some(section);
        }
    }
}
