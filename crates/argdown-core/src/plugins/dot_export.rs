//! `export-dot`: Graphviz text for an external layout engine.

use argdown_engine::{
    ArgdownError, Capabilities, Logger, Plugin, PluginSettings, Request, Response, ResponseField,
};
use argdown_model::{ArgumentMap, MapNode, MapNodeKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings of the `dot` namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DotSettings {
    pub graph_name: String,
    /// Graphviz `rankdir`: `BT`, `TB`, `LR` or `RL`.
    pub rank_dir: String,
    pub concentrate: bool,
    /// Put statement text and argument descriptions under node titles.
    pub show_label_text: bool,
}

impl Default for DotSettings {
    fn default() -> Self {
        Self {
            graph_name: "Argument Map".into(),
            rank_dir: "BT".into(),
            concentrate: false,
            show_label_text: true,
        }
    }
}

impl PluginSettings for DotSettings {
    const NAMESPACE: &'static str = "dot";
}

/// Writes `response.dot` from `response.map`.
#[derive(Debug, Default)]
pub struct DotExportPlugin;

impl Plugin for DotExportPlugin {
    fn name(&self) -> &str {
        "dot-export"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Map]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<DotSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        let settings = request.settings::<DotSettings>()?;
        let Some(map) = response.map.as_ref() else {
            return Err(ArgdownError::MissingDependency {
                plugin: self.name().to_string(),
                field: ResponseField::Map.to_string(),
            });
        };
        let dot = export_dot(map, &settings);
        debug!(bytes = dot.len(), "exported dot");
        response.dot = Some(dot);
        Ok(())
    }
}

/// Render `map` as a `digraph`. Groups become clusters.
pub fn export_dot(map: &ArgumentMap, settings: &DotSettings) -> String {
    let mut text = String::new();
    text.push_str(&format!("digraph {} {{\n", quote(&settings.graph_name)));
    text.push_str(&format!("  rankdir = {};\n", quote(&settings.rank_dir)));
    if settings.concentrate {
        text.push_str("  concentrate = true;\n");
    }
    text.push('\n');

    for node in map.nodes.iter().filter(|n| n.group.is_none()) {
        write_node(&mut text, node, settings, 1);
    }
    for group in map.root_groups() {
        write_group(&mut text, map, &group.id, settings, 1);
    }

    if !map.edges.is_empty() {
        text.push('\n');
    }
    for edge in &map.edges {
        let kinds: Vec<_> = edge.kinds.iter().map(|k| k.as_str()).collect();
        let kinds = if kinds.is_empty() {
            "relation".to_string()
        } else {
            kinds.join(",")
        };
        let mut attributes = vec![format!("type = {}", quote(&kinds))];
        if let Some(color) = &edge.color {
            attributes.push(format!("color = {}", quote(color)));
        }
        text.push_str(&format!(
            "  {} -> {} [{}];\n",
            edge.from,
            edge.to,
            attributes.join(", ")
        ));
    }

    text.push_str("}\n");
    text
}

fn write_group(text: &mut String, map: &ArgumentMap, id: &str, settings: &DotSettings, depth: usize) {
    let Some(group) = map.group(id) else {
        return;
    };
    // Collapsed groups are drawn as their node.
    if group.is_empty() {
        return;
    }
    let indent = "  ".repeat(depth);
    text.push_str(&format!("{indent}subgraph cluster_{} {{\n", group.id));
    text.push_str(&format!("{indent}  label = {};\n", quote(&group.title)));
    if let Some(color) = &group.color {
        text.push_str(&format!("{indent}  style = filled;\n"));
        text.push_str(&format!("{indent}  fillcolor = {};\n", quote(color)));
    }
    for node in group.nodes.iter().filter_map(|n| map.node(n)) {
        write_node(text, node, settings, depth + 1);
    }
    for subgroup in &group.subgroups {
        write_group(text, map, subgroup, settings, depth + 1);
    }
    text.push_str(&format!("{indent}}}\n"));
}

fn write_node(text: &mut String, node: &MapNode, settings: &DotSettings, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = match (&node.label_text, settings.show_label_text) {
        (Some(label_text), true) => format!("{}\n{}", node.title, label_text),
        _ => node.title.clone(),
    };
    let (shape, style) = match node.kind {
        MapNodeKind::Statement => ("box", "filled,rounded"),
        MapNodeKind::Argument => ("box", "filled"),
        MapNodeKind::Group => ("box3d", "filled"),
    };
    let mut attributes = vec![
        format!("label = {}", quote(&label)),
        format!("shape = {shape}"),
        format!("style = {}", quote(style)),
    ];
    if let Some(color) = &node.color {
        attributes.push(format!("fillcolor = {}", quote(color)));
    }
    text.push_str(&format!("{indent}{} [{}];\n", node.id, attributes.join(", ")));
}

/// A double-quoted DOT string.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use argdown_model::{Group, RelationKind};

    fn sample() -> ArgumentMap {
        let mut map = ArgumentMap::new();
        let mut a = MapNode::new("n0", MapNodeKind::Statement, "A \"quoted\"");
        a.label_text = Some("a text".into());
        a.group = Some("g0".into());
        map.nodes.push(a);
        map.nodes.push(MapNode::new("n1", MapNodeKind::Argument, "B"));
        let mut group = Group::new("g0", "Section", 1);
        group.nodes.push("n0".into());
        map.groups.push(group);
        map.add_edge("n1", "n0", RelationKind::Attack, 0);
        map
    }

    #[test]
    fn renders_nodes_clusters_and_edges() {
        let dot = export_dot(&sample(), &DotSettings::default());
        assert!(dot.starts_with("digraph \"Argument Map\" {\n"));
        assert!(dot.contains("rankdir = \"BT\";"));
        assert!(dot.contains("subgraph cluster_g0 {"));
        assert!(dot.contains("label = \"A \\\"quoted\\\"\\na text\""));
        assert!(dot.contains("n1 -> n0 [type = \"attack\"];"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn settings_shape_output() {
        let settings = DotSettings {
            graph_name: "debate".into(),
            rank_dir: "LR".into(),
            concentrate: true,
            show_label_text: false,
        };
        let dot = export_dot(&sample(), &settings);
        assert!(dot.starts_with("digraph \"debate\""));
        assert!(dot.contains("concentrate = true;"));
        assert!(!dot.contains("a text"));
    }

    #[test]
    fn merged_edges_list_every_kind() {
        let mut map = sample();
        map.add_edge("n1", "n0", RelationKind::Support, 1);
        let dot = export_dot(&map, &DotSettings::default());
        assert!(dot.contains("n1 -> n0 [type = \"attack,support\"];"));
        assert_eq!(dot.matches("n1 -> n0").count(), 1);
    }

    #[test]
    fn empty_collapsed_groups_are_not_clusters() {
        let mut map = ArgumentMap::new();
        map.nodes.push(MapNode::new("g0", MapNodeKind::Group, "Closed"));
        map.groups.push(Group::new("g0", "Closed", 1));
        let dot = export_dot(&map, &DotSettings::default());
        assert!(!dot.contains("cluster"));
        assert!(dot.contains("shape = box3d"));
    }
}
