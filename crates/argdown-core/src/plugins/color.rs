//! `colorize`: tag, element and group colors.
//!
//! Every color is derived from ordered inputs (tags in first-seen order,
//! map nodes and groups in map order), so two runs over the same document
//! produce identical assignments.

use std::collections::BTreeMap;

use argdown_engine::{
    ArgdownError, Capabilities, Logger, Plugin, PluginSettings, Request, Response, ResponseField,
};
use argdown_model::{
    ArgumentMap, ColorAssignments, ColorEntry, ElementRef, MapNodeKind, Model, RelationKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings of the `color` namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorSettings {
    /// Palette cycled through for tags without an explicit color.
    pub color_scheme: Vec<String>,
    pub tag_colors: BTreeMap<String, String>,
    /// Color untagged arguments and nodes by the kind of their outgoing relations.
    pub colorize_by_relation: bool,
    /// Group colors by level, outermost first. Deeper levels reuse the last.
    pub group_colors: Vec<String>,
    pub statement_color: String,
    pub argument_color: String,
    pub pro_color: String,
    pub con_color: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        let colors = |list: &[&str]| -> Vec<String> { list.iter().map(|c| c.to_string()).collect() };
        Self {
            color_scheme: colors(&[
                "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02", "#a6761d",
                "#666666",
            ]),
            tag_colors: BTreeMap::new(),
            colorize_by_relation: false,
            group_colors: colors(&["#DADADA", "#BABABA", "#AAAAAA"]),
            statement_color: "#3E8EDE".into(),
            argument_color: "#FF8C00".into(),
            pro_color: "#63AE12".into(),
            con_color: "#E2314C".into(),
        }
    }
}

impl PluginSettings for ColorSettings {
    const NAMESPACE: &'static str = "color";
}

#[derive(Debug, Default)]
pub struct ColorPlugin;

impl Plugin for ColorPlugin {
    fn name(&self) -> &str {
        "color"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<ColorSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        let settings = request.settings::<ColorSettings>()?;
        let model = response.require_model_mut(self.name())?;
        let mut colors = colorize_model(model, &settings);
        if let Some(map) = response.map.as_mut() {
            colorize_map(map, &settings, &mut colors);
        }
        debug!(
            tags = colors.tags.len(),
            nodes = colors.nodes.len(),
            groups = colors.groups.len(),
            "assigned colors"
        );
        response.colors = Some(colors);
        Ok(())
    }
}

/// Explicit tag colors first, then the palette in first-seen tag order.
pub fn tag_colors(tags: &[String], settings: &ColorSettings) -> Vec<ColorEntry> {
    let mut next = 0;
    let mut entries = Vec::with_capacity(tags.len());
    for tag in tags {
        let color = match settings.tag_colors.get(tag) {
            Some(color) => color.clone(),
            None if settings.color_scheme.is_empty() => continue,
            None => {
                let color = settings.color_scheme[next % settings.color_scheme.len()].clone();
                next += 1;
                color
            }
        };
        entries.push(ColorEntry {
            key: tag.clone(),
            color,
        });
    }
    entries
}

fn first_tag_color(tags: &[String], colors: &[ColorEntry]) -> Option<String> {
    tags.iter()
        .find_map(|tag| colors.iter().find(|e| &e.key == tag))
        .map(|e| e.color.clone())
}

/// Pro color when every kind supports, con color when every kind attacks.
fn relation_color<'a>(
    kinds: impl IntoIterator<Item = RelationKind>,
    settings: &'a ColorSettings,
) -> Option<&'a str> {
    let (mut pro, mut con) = (false, false);
    for kind in kinds {
        if kind.is_con() {
            con = true;
        } else {
            pro = true;
        }
    }
    match (pro, con) {
        (true, false) => Some(settings.pro_color.as_str()),
        (false, true) => Some(settings.con_color.as_str()),
        _ => None,
    }
}

fn edge_color(kind: Option<RelationKind>, settings: &ColorSettings) -> Option<String> {
    kind.map(|k| if k.is_con() { settings.con_color.clone() } else { settings.pro_color.clone() })
}

/// Color classes and arguments. Returns the assignments with tags filled in.
pub fn colorize_model(model: &mut Model, settings: &ColorSettings) -> ColorAssignments {
    let tags = tag_colors(model.tags(), settings);

    let argument_colors: Vec<String> = model
        .arguments()
        .iter()
        .map(|argument| {
            first_tag_color(&argument.tags, &tags)
                .or_else(|| {
                    if !settings.colorize_by_relation {
                        return None;
                    }
                    let element = ElementRef::Argument(argument.title.clone());
                    let kinds = model
                        .relations_of(&element)
                        .filter(|r| r.from == element)
                        .map(|r| r.kind)
                        .collect::<Vec<_>>();
                    relation_color(kinds, settings).map(str::to_string)
                })
                .unwrap_or_else(|| settings.argument_color.clone())
        })
        .collect();
    for (argument, color) in model.arguments_mut().zip(argument_colors) {
        argument.color = Some(color);
    }

    for class in model.classes_mut() {
        let color = first_tag_color(&class.tags, &tags).unwrap_or_else(|| settings.statement_color.clone());
        class.color = Some(color);
    }

    ColorAssignments {
        tags,
        ..ColorAssignments::default()
    }
}

/// Color groups by level, then nodes and edges.
pub fn colorize_map(map: &mut ArgumentMap, settings: &ColorSettings, colors: &mut ColorAssignments) {
    for group in &mut map.groups {
        let Some(last) = settings.group_colors.len().checked_sub(1) else {
            break;
        };
        let color = settings.group_colors[group.level.saturating_sub(1).min(last)].clone();
        colors.groups.push(ColorEntry {
            key: group.id.clone(),
            color: color.clone(),
        });
        group.color = Some(color);
    }

    let node_colors: Vec<String> = map
        .nodes
        .iter()
        .map(|node| {
            if let Some(color) = first_tag_color(&node.tags, &colors.tags) {
                return color;
            }
            if settings.colorize_by_relation && node.kind != MapNodeKind::Group {
                let kinds = map.outgoing(&node.id).flat_map(|e| e.kinds.iter().copied());
                if let Some(color) = relation_color(kinds, settings) {
                    return color.to_string();
                }
            }
            match node.kind {
                MapNodeKind::Statement => settings.statement_color.clone(),
                MapNodeKind::Argument => settings.argument_color.clone(),
                MapNodeKind::Group => colors
                    .group_color(&node.id)
                    .map(str::to_string)
                    .unwrap_or_else(|| settings.statement_color.clone()),
            }
        })
        .collect();
    for (node, color) in map.nodes.iter_mut().zip(node_colors) {
        colors.nodes.push(ColorEntry {
            key: node.id.clone(),
            color: color.clone(),
        });
        node.color = Some(color);
    }

    for edge in &mut map.edges {
        edge.color = edge_color(edge.kind(), settings);
    }
}
