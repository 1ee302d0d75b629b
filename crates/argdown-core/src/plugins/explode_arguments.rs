//! `build-model`: one argument per inference.

use argdown_engine::{ArgdownError, Capabilities, Logger, Plugin, Request, Response, ResponseField};
use argdown_model::{ElementRef, Model, Origin, PcsRole, PcsStep, RelationKind};
use serde_json::Value;
use tracing::debug;

use super::model::ModelSettings;

/// Splits multi-step arguments when `model.explodeArguments` is set.
#[derive(Debug, Default)]
pub struct ExplodeArgumentsPlugin;

impl Plugin for ExplodeArgumentsPlugin {
    fn name(&self) -> &str {
        "explode-arguments"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<ModelSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, logger: &Logger) -> Result<(), ArgdownError> {
        if !request.settings::<ModelSettings>()?.explode_arguments {
            return Ok(());
        }
        let model = response.require_model_mut(self.name())?;
        let exploded = explode_arguments(model);

        debug!(exploded, arguments = model.arguments().len(), "exploded arguments");
        logger.verbose(&format!("exploded {exploded} arguments"));
        Ok(())
    }
}

/// Split every argument with intermediary conclusions into a chain of
/// single-inference arguments.
///
/// The last inference keeps the original title, so relations to and from
/// the argument stay in place. Earlier inferences become new arguments
/// titled `<title> (n)`, each supporting the next one in the chain.
/// Returns the number of arguments split.
pub fn explode_arguments(model: &mut Model) -> usize {
    let targets: Vec<String> = model
        .arguments()
        .iter()
        .filter(|a| a.pcs.iter().any(|s| s.role == PcsRole::IntermediaryConclusion))
        .map(|a| a.title.clone())
        .collect();

    for title in &targets {
        let Some(argument) = model.argument(title) else {
            continue;
        };
        let inferences = split_inferences(&argument.pcs);
        let section = argument.section;
        let tags = argument.tags.clone();

        let mut previous: Option<String> = None;
        let mut suffix = 1;
        let count = inferences.len();
        for (index, pcs) in inferences.into_iter().enumerate() {
            let current = if index + 1 == count {
                title.clone()
            } else {
                free_title(model, title, &mut suffix)
            };
            for step in pcs.iter().filter(|s| s.role == PcsRole::Premise) {
                if let Some(class) = model.class_mut(&step.title) {
                    class.is_used_as_premise = true;
                }
            }

            let is_new = current != *title;
            let argument = model.ensure_argument(&current);
            argument.pcs = pcs;
            if is_new {
                argument.section = section;
                argument.is_auto_titled = true;
                argument.add_tags(&tags);
                argument
                    .data
                    .insert("explodedFrom".to_string(), Value::String(title.clone()));
            }

            if let Some(previous) = previous.take() {
                model.add_relation(
                    ElementRef::Argument(previous),
                    ElementRef::Argument(current.clone()),
                    RelationKind::Support,
                    Origin::Explicit,
                    None,
                );
            }
            previous = Some(current);
        }
    }
    targets.len()
}

/// Group PCS steps by inference. Each conclusion ends a group as its main
/// conclusion and opens the next one as a premise.
fn split_inferences(pcs: &[PcsStep]) -> Vec<Vec<PcsStep>> {
    let mut inferences = Vec::new();
    let mut current = Vec::new();
    for step in pcs {
        if step.role == PcsRole::Premise {
            current.push(step.clone());
            continue;
        }
        current.push(PcsStep {
            role: PcsRole::MainConclusion,
            ..step.clone()
        });
        inferences.push(std::mem::take(&mut current));
        current.push(PcsStep {
            role: PcsRole::Premise,
            inference: None,
            ..step.clone()
        });
    }
    inferences
}

fn free_title(model: &Model, title: &str, suffix: &mut usize) -> String {
    loop {
        let candidate = format!("{title} ({suffix})");
        *suffix += 1;
        if model.argument(&candidate).is_none() {
            return candidate;
        }
    }
}
