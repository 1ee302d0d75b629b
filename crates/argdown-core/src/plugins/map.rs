//! `build-map`: nodes and edges from the selection.

use std::collections::HashMap;

use argdown_engine::{
    ArgdownError, Capabilities, Logger, Plugin, PluginSettings, Request, Response, ResponseField,
};
use argdown_model::{ArgumentMap, DerivationRule, MapNode, MapNodeKind, Model, Origin, Selection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings of the `map` namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapSettings {
    pub include_derived: bool,
    /// Also draw the reverse of statement-to-statement supports and attacks.
    pub include_reciprocal: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            include_derived: true,
            include_reciprocal: false,
        }
    }
}

impl PluginSettings for MapSettings {
    const NAMESPACE: &'static str = "map";
}

/// Builds `response.map` from the model and the final selection.
#[derive(Debug, Default)]
pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn name(&self) -> &str {
        "map"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model, ResponseField::Selection]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<MapSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        let settings = request.settings::<MapSettings>()?;
        let model = response.require_model(self.name())?;
        let Some(selection) = response.selection.as_ref() else {
            return Err(ArgdownError::MissingDependency {
                plugin: self.name().to_string(),
                field: ResponseField::Selection.to_string(),
            });
        };

        let map = build_map(model, selection, &settings);
        debug!(nodes = map.nodes.len(), edges = map.edges.len(), "built map");
        response.map = Some(map);
        Ok(())
    }
}

/// Build the map for `selection`.
///
/// Nodes follow document order. Classes declared equivalent share one node
/// titled after the first selected class. Relations with an unselected end
/// are left out.
pub fn build_map(model: &Model, selection: &Selection, settings: &MapSettings) -> ArgumentMap {
    let mut map = ArgumentMap::new();
    let representatives = model.equivalence_representatives();

    // (document offset, is argument, title)
    let mut elements: Vec<(usize, bool, &str)> = Vec::new();
    for class in model.classes().iter().filter(|c| selection.statements.contains(&c.title)) {
        let offset = model
            .members(&class.title)
            .next()
            .map_or(usize::MAX, |s| s.span.start.offset);
        elements.push((offset, false, &class.title));
    }
    for argument in model.arguments().iter().filter(|a| selection.arguments.contains(&a.title)) {
        elements.push((argument.span.start.offset, true, &argument.title));
    }
    elements.sort_by_key(|(offset, _, _)| *offset);

    let mut merged: HashMap<&str, usize> = HashMap::new();
    for (_, is_argument, title) in elements {
        if is_argument {
            let Some(argument) = model.argument(title) else {
                continue;
            };
            let mut node = MapNode::new(format!("n{}", map.nodes.len()), MapNodeKind::Argument, title);
            node.label_text = argument.description().map(str::to_string);
            node.tags = argument.tags.clone();
            node.section = argument.section;
            map.nodes.push(node);
            continue;
        }

        let Some(class) = model.class(title) else {
            continue;
        };
        let representative = representatives.get(title).map_or(title, String::as_str);
        if let Some(&index) = merged.get(representative) {
            let node = &mut map.nodes[index];
            node.members.push(class.title.clone());
            for tag in &class.tags {
                if !node.tags.contains(tag) {
                    node.tags.push(tag.clone());
                }
            }
            if node.label_text.is_none() {
                node.label_text = model.class_text(title).map(str::to_string);
            }
            continue;
        }

        let mut node = MapNode::new(format!("n{}", map.nodes.len()), MapNodeKind::Statement, title);
        node.label_text = model.class_text(title).map(str::to_string);
        node.tags = class.tags.clone();
        node.section = class.section;
        merged.insert(representative, map.nodes.len());
        map.nodes.push(node);
    }

    for relation in model.relations() {
        let wanted = match relation.origin {
            Origin::Explicit => true,
            Origin::Derived(DerivationRule::Reciprocal) => settings.include_derived && settings.include_reciprocal,
            Origin::Derived(_) => settings.include_derived,
        };
        if !wanted {
            continue;
        }
        let ends = map
            .node_for(&relation.from)
            .zip(map.node_for(&relation.to))
            .map(|(from, to)| (from.id.clone(), to.id.clone()));
        if let Some((from, to)) = ends {
            map.add_edge(&from, &to, relation.kind, relation.id);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::model::{build_model, ModelSettings};
    use argdown_engine::SelectionSettings;
    use argdown_model::{derive_relations, ConflictPolicy, RelationKind};

    use crate::plugins::preselection::preselect;

    fn map_for(input: &str, settings: &MapSettings) -> ArgumentMap {
        let (mut model, _) = build_model(&argdown_parser::parse(input).document, &ModelSettings::default());
        derive_relations(&mut model, ConflictPolicy::default());
        let selection = preselect(&model, &SelectionSettings::default());
        build_map(&model, &selection, settings)
    }

    #[test]
    fn nodes_in_document_order() {
        let map = map_for("[B]: b text\n\n<A>: a text\n  - [B]\n  + <C>: c text", &MapSettings::default());
        let titles: Vec<_> = map.nodes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
        assert_eq!(map.nodes[1].kind, MapNodeKind::Argument);
        assert_eq!(map.nodes[0].label_text.as_deref(), Some("b text"));
        assert_eq!(map.edges.len(), 2);
        assert_eq!(map.edges[0].from, "n1");
        assert_eq!(map.edges[0].to, "n0");
        assert!(map.validate().is_ok());
    }

    #[test]
    fn duplicate_relations_give_one_edge() {
        let map = map_for("[A]: a\n  + [B]: b\n\n[A]\n  + [B]", &MapSettings::default());
        assert_eq!(map.edges.len(), 1);
    }

    #[test]
    fn parallel_kinds_are_merged() {
        let map = map_for("[A]: a\n  + [B]: b\n  _> [B]", &MapSettings::default());
        assert_eq!(map.edges.len(), 1);
        assert_eq!(map.edges[0].kinds, vec![RelationKind::Support, RelationKind::Undercut]);
    }

    #[test]
    fn equivalent_classes_share_a_node() {
        let map = map_for("[A]: a\n  = [B]: b\n\n[C]: c\n  - [B]", &MapSettings::default());
        assert_eq!(map.nodes.len(), 2);
        assert_eq!(map.nodes[0].members, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(map.edges[0].to, "n0");
    }

    #[test]
    fn reciprocal_edges_are_opt_in() {
        let input = "[A]: a\n  + [B]: b";
        assert_eq!(map_for(input, &MapSettings::default()).edges.len(), 1);
        let settings = MapSettings {
            include_reciprocal: true,
            ..MapSettings::default()
        };
        assert_eq!(map_for(input, &settings).edges.len(), 2);
    }

    #[test]
    fn unselected_ends_are_skipped() {
        let (model, _) = build_model(
            &argdown_parser::parse("[A]: a\n  + [B]: b").document,
            &ModelSettings::default(),
        );
        let mut selection = Selection::default();
        selection.statements.insert("A".into());
        let map = build_map(&model, &selection, &MapSettings::default());
        assert_eq!(map.nodes.len(), 1);
        assert!(map.edges.is_empty());
    }
}
