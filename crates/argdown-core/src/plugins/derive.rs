//! `build-model`: implied relations.

use argdown_engine::{ArgdownError, Logger, Plugin, Request, Response, ResponseField};
use argdown_model::derive_relations;
use tracing::debug;

use super::model::ModelSettings;

/// Runs the relation deriver over `response.model` with the conflict policy
/// of the `model` namespace.
#[derive(Debug, Default)]
pub struct DerivePlugin;

impl Plugin for DerivePlugin {
    fn name(&self) -> &str {
        "derive"
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model]
    }

    fn run(&self, request: &Request, response: &mut Response, logger: &Logger) -> Result<(), ArgdownError> {
        let policy = request.settings::<ModelSettings>()?.relation_conflict_policy;
        let model = response.require_model_mut(self.name())?;
        let stats = derive_relations(model, policy);

        debug!(?policy, derived = stats.total(), skipped = stats.conflicts_skipped, "derived relations");
        logger.verbose(&format!("derived {} relations", stats.total()));
        Ok(())
    }
}
