//! `build-map`: group tree from section paths.

use std::collections::HashMap;

use argdown_engine::{
    ArgdownError, Capabilities, Logger, Plugin, PluginSettings, Request, Response, ResponseField,
};
use argdown_model::{ArgumentMap, Group, Model, SectionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings of the `group` namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupSettings {
    /// Number of outermost section levels turned into groups.
    pub group_depth: usize,
    /// Titles of groups to close.
    pub closed_groups: Vec<String>,
    /// Close every group at this level or deeper.
    pub close_depth: Option<usize>,
    /// Replaces the heading structure with these sections while the model
    /// is built.
    pub regroup: Option<Vec<RegroupConfig>>,
}

/// One section of a regrouping tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegroupConfig {
    pub title: String,
    /// Titles of statements placed directly in this section.
    pub statements: Vec<String>,
    /// Titles of arguments placed directly in this section.
    pub arguments: Vec<String>,
    /// Elements carrying any of these tags that no listed title claims.
    pub tags: Vec<String>,
    pub is_closed: Option<bool>,
    pub children: Vec<RegroupConfig>,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            group_depth: 2,
            closed_groups: Vec::new(),
            close_depth: None,
            regroup: None,
        }
    }
}

impl PluginSettings for GroupSettings {
    const NAMESPACE: &'static str = "group";
}

/// Nests map nodes into groups following their section paths.
#[derive(Debug, Default)]
pub struct GroupPlugin;

impl Plugin for GroupPlugin {
    fn name(&self) -> &str {
        "group"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Model, ResponseField::Map]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<GroupSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, _: &Logger) -> Result<(), ArgdownError> {
        let settings = request.settings::<GroupSettings>()?;
        let Some(mut map) = response.map.take() else {
            return Err(ArgdownError::MissingDependency {
                plugin: self.name().to_string(),
                field: ResponseField::Map.to_string(),
            });
        };
        let result = response
            .require_model(self.name())
            .map(|model| build_groups(model, &mut map, &settings));
        response.map = Some(map);
        result?;

        if let Some(map) = &response.map {
            debug!(groups = map.groups.len(), "built groups");
        }
        Ok(())
    }
}

/// Create groups for the nodes of `map`, in node order, so that only
/// groups with content exist.
pub fn build_groups(model: &Model, map: &mut ArgumentMap, settings: &GroupSettings) {
    let mut by_section: HashMap<SectionId, String> = HashMap::new();

    for index in 0..map.nodes.len() {
        let Some(section) = map.nodes[index].section else {
            continue;
        };
        let path: Vec<_> = model
            .section_path(section)
            .into_iter()
            .filter(|s| s.is_group())
            .take(settings.group_depth)
            .collect();

        let mut parent: Option<String> = None;
        for (depth, section) in path.iter().enumerate() {
            let id = match by_section.get(&section.id) {
                Some(id) => id.clone(),
                None => {
                    let id = format!("g{}", map.groups.len());
                    let level = depth + 1;
                    let mut group = Group::new(id.clone(), section.title.clone(), level);
                    group.section = Some(section.id);
                    group.parent = parent.clone();
                    group.is_closed = settings.closed_groups.contains(&section.title)
                        || section.is_closed()
                        || settings.close_depth.is_some_and(|d| level >= d);
                    if let Some(parent) = parent.as_deref().and_then(|p| map.group_mut(p)) {
                        parent.subgroups.push(id.clone());
                    }
                    map.groups.push(group);
                    by_section.insert(section.id, id.clone());
                    id
                }
            };
            parent = Some(id);
        }

        if let Some(innermost) = parent {
            let node_id = map.nodes[index].id.clone();
            if let Some(group) = map.group_mut(&innermost) {
                group.nodes.push(node_id);
            }
            map.nodes[index].group = Some(innermost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::map::{build_map, MapSettings};
    use crate::plugins::model::{build_model, ModelSettings};
    use crate::plugins::preselection::preselect;
    use argdown_engine::SelectionSettings;

    fn grouped(input: &str, settings: &GroupSettings) -> ArgumentMap {
        let (model, _) = build_model(&argdown_parser::parse(input).document, &ModelSettings::default());
        let selection = preselect(&model, &SelectionSettings::default());
        let mut map = build_map(&model, &selection, &MapSettings::default());
        build_groups(&model, &mut map, settings);
        map
    }

    #[test]
    fn nested_headings_nest_groups() {
        let map = grouped("# X\n\n[A]: a\n\n## Y\n\n[B]: b", &GroupSettings::default());
        assert_eq!(map.groups.len(), 2);
        let x = &map.groups[0];
        let y = &map.groups[1];
        assert_eq!((x.title.as_str(), x.level, x.parent.as_deref()), ("X", 1, None));
        assert_eq!((y.title.as_str(), y.level, y.parent.as_deref()), ("Y", 2, Some("g0")));
        assert_eq!(x.subgroups, vec!["g1".to_string()]);
        assert_eq!(x.nodes, vec!["n0".to_string()]);
        assert_eq!(y.nodes, vec!["n1".to_string()]);
        assert_eq!(map.nodes[1].group.as_deref(), Some("g1"));
        assert!(map.validate().is_ok());
    }

    #[test]
    fn depth_truncates_and_untitled_sections_are_skipped() {
        let settings = GroupSettings {
            group_depth: 1,
            ..GroupSettings::default()
        };
        let map = grouped("# X\n\n## Y\n\n[B]: b\n\n[C]: c", &settings);
        assert_eq!(map.groups.len(), 1);
        assert_eq!(map.groups[0].nodes.len(), 2);

        let map = grouped("# X {isGroup: false}\n\n## Y\n\n[B]: b", &GroupSettings::default());
        assert_eq!(map.groups.len(), 1);
        assert_eq!(map.groups[0].title, "Y");
        assert_eq!(map.groups[0].level, 1);
    }

    #[test]
    fn nodes_outside_sections_stay_at_root() {
        let map = grouped("[A]: a\n\n# X\n\n[B]: b", &GroupSettings::default());
        assert_eq!(map.nodes[0].group, None);
        assert_eq!(map.groups.len(), 1);
    }

    #[test]
    fn closing_rules() {
        let input = "# X\n\n[A]: a\n\n## Y\n\n[B]: b\n\n# Z {isClosed: true}\n\n[C]: c";
        let map = grouped(input, &GroupSettings::default());
        let closed: Vec<_> = map.groups.iter().filter(|g| g.is_closed).map(|g| g.title.as_str()).collect();
        assert_eq!(closed, vec!["Z"]);

        let settings = GroupSettings {
            closed_groups: vec!["X".into()],
            close_depth: Some(2),
            ..GroupSettings::default()
        };
        let map = grouped(input, &settings);
        let closed: Vec<_> = map.groups.iter().filter(|g| g.is_closed).map(|g| g.title.as_str()).collect();
        assert_eq!(closed, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn zero_depth_disables_grouping() {
        let settings = GroupSettings {
            group_depth: 0,
            ..GroupSettings::default()
        };
        assert!(grouped("# X\n\n[A]: a", &settings).groups.is_empty());
    }
}
