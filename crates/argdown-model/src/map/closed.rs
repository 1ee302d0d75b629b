//! Collapse closed groups into single nodes.

use std::collections::HashSet;

use super::{ArgumentMap, MapNode, MapNodeKind};

/// Replace every outermost closed group by a [`MapNodeKind::Group`] node
/// carrying the group's id.
///
/// Nodes and subgroups inside the group are removed, edges crossing its
/// boundary are rewritten to the group node, edges inside it are dropped and
/// rewritten parallels are merged. A group that was already collapsed is left
/// alone, so applying this twice changes nothing. Returns the number of
/// groups collapsed.
pub fn collapse_closed_groups(map: &mut ArgumentMap) -> usize {
    let targets: Vec<String> = map
        .groups
        .iter()
        .filter(|g| g.is_closed && map.node(&g.id).is_none())
        .filter(|g| {
            map.ancestors(&g.id)
                .iter()
                .all(|a| map.group(a).map_or(true, |a| !a.is_closed))
        })
        .map(|g| g.id.clone())
        .collect();

    for id in &targets {
        collapse(map, id);
    }
    if !targets.is_empty() {
        map.dedup_edges();
    }
    targets.len()
}

fn collapse(map: &mut ArgumentMap, id: &str) {
    let (inner_nodes, inner_groups) = map.descendants(id);
    let Some(group) = map.group(id).cloned() else {
        return;
    };
    let inner: HashSet<&str> = inner_nodes.iter().map(String::as_str).collect();

    let mut node = MapNode::new(group.id.clone(), MapNodeKind::Group, group.title.clone());
    node.members.clear();
    node.section = group.section;
    node.group = group.parent.clone();
    for absorbed in map.nodes.iter().filter(|n| inner.contains(n.id.as_str())) {
        node.members.push(absorbed.title.clone());
        for tag in &absorbed.tags {
            if !node.tags.contains(tag) {
                node.tags.push(tag.clone());
            }
        }
    }

    let position = map
        .nodes
        .iter()
        .position(|n| inner.contains(n.id.as_str()))
        .unwrap_or(map.nodes.len());
    map.nodes.retain(|n| !inner.contains(n.id.as_str()));
    map.nodes.insert(position.min(map.nodes.len()), node);

    map.groups.retain(|g| !inner_groups.contains(&g.id));
    if let Some(group) = map.group_mut(id) {
        group.nodes.clear();
        group.subgroups.clear();
    }
    if let Some(parent) = group.parent.as_deref().and_then(|p| map.group_mut(p)) {
        parent.subgroups.retain(|g| g != id);
        parent.nodes.push(id.to_string());
    }

    for edge in &mut map.edges {
        if inner.contains(edge.from.as_str()) {
            edge.from = id.to_string();
        }
        if inner.contains(edge.to.as_str()) {
            edge.to = id.to_string();
        }
    }
    // Edges that had both ends inside are now self edges on the group node.
    map.edges.retain(|e| e.from != e.to);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Group;
    use crate::relation::RelationKind;

    /// n0 outside; g0 (closed) holds n1 and subgroup g1 with n2.
    fn sample() -> ArgumentMap {
        let mut map = ArgumentMap::new();
        for (i, title) in ["Out", "In", "Deep"].iter().enumerate() {
            let mut node = MapNode::new(format!("n{i}"), MapNodeKind::Statement, *title);
            node.tags.push(format!("t{i}"));
            map.nodes.push(node);
        }
        let mut g0 = Group::new("g0", "Closed", 1);
        g0.is_closed = true;
        g0.nodes.push("n1".into());
        g0.subgroups.push("g1".into());
        let mut g1 = Group::new("g1", "Inner", 2);
        g1.parent = Some("g0".into());
        g1.nodes.push("n2".into());
        map.groups = vec![g0, g1];

        map.add_edge("n0", "n1", RelationKind::Support, 0);
        map.add_edge("n0", "n2", RelationKind::Attack, 1);
        map.add_edge("n1", "n2", RelationKind::Support, 2);
        map.add_edge("n2", "n0", RelationKind::Attack, 3);
        map
    }

    #[test]
    fn closed_group_becomes_node() {
        let mut map = sample();
        assert_eq!(collapse_closed_groups(&mut map), 1);

        let ids: Vec<_> = map.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n0", "g0"]);
        let node = map.node("g0").unwrap();
        assert_eq!(node.kind, MapNodeKind::Group);
        assert_eq!(node.members, vec!["In".to_string(), "Deep".to_string()]);
        assert_eq!(map.groups.len(), 1);
        assert!(map.groups[0].is_empty());

        // n0->n1 and n0->n2 merge; n1->n2 is internal; n2->n0 is rewritten.
        assert_eq!(map.edges.len(), 2);
        let incoming = map.edges_between("n0", "g0").next().unwrap();
        assert_eq!(incoming.kinds, vec![RelationKind::Support, RelationKind::Attack]);
        assert!(map.edges_between("g0", "n0").next().is_some());
        assert!(map.validate().is_ok());
    }

    #[test]
    fn collapsing_is_idempotent() {
        let mut map = sample();
        collapse_closed_groups(&mut map);
        let once = map.clone();
        assert_eq!(collapse_closed_groups(&mut map), 0);
        assert_eq!(map, once);
    }

    #[test]
    fn nested_group_node_lands_in_parent() {
        let mut map = sample();
        // Make g0 open and g1 closed.
        map.groups[0].is_closed = false;
        map.groups[1].is_closed = true;
        collapse_closed_groups(&mut map);

        let g0 = map.group("g0").unwrap();
        assert_eq!(g0.nodes, vec!["n1".to_string(), "g1".to_string()]);
        assert!(g0.subgroups.is_empty());
        assert_eq!(map.node("g1").unwrap().group.as_deref(), Some("g0"));
        assert!(map.edges.iter().all(|e| e.from != e.to));
    }
}
