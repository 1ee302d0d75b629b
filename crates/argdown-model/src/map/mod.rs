//! The renderable argument map: nodes, deduplicated edges and a group tree.

pub mod closed;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::SectionId;
use crate::relation::{ElementRef, RelationId, RelationKind};

pub use closed::collapse_closed_groups;

/// Structural problems found by [`ArgumentMap::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("edge {edge} references unknown node {node}")]
    DanglingEdge { edge: String, node: String },

    #[error("group {group} references unknown node {node}")]
    UnknownGroupMember { group: String, node: String },

    #[error("node {node} belongs to more than one group")]
    NodeInSeveralGroups { node: String },

    #[error("cycle in group tree at group {0}")]
    GroupCycle(String),

    #[error("duplicate id {0}")]
    DuplicateId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapNodeKind {
    Statement,
    Argument,
    /// A closed group collapsed into a single node.
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    /// `n<i>`, or the group id for collapsed groups.
    pub id: String,
    pub kind: MapNodeKind,
    pub title: String,
    pub label_text: Option<String>,
    /// Class titles merged into a statement node, or the titles of the
    /// elements absorbed by a collapsed group.
    pub members: Vec<String>,
    pub tags: Vec<String>,
    pub section: Option<SectionId>,
    /// Id of the innermost group containing the node.
    pub group: Option<String>,
    pub color: Option<String>,
}

impl MapNode {
    pub fn new(id: impl Into<String>, kind: MapNodeKind, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            kind,
            members: vec![title.clone()],
            title,
            label_text: None,
            tags: Vec::new(),
            section: None,
            group: None,
            color: None,
        }
    }

    /// Whether this node stands for `element`.
    pub fn represents(&self, element: &ElementRef) -> bool {
        match (self.kind, element) {
            (MapNodeKind::Statement, ElementRef::Statement(t)) => self.members.contains(t),
            (MapNodeKind::Argument, ElementRef::Argument(t)) => &self.title == t,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEdge {
    /// `e<i>`
    pub id: String,
    pub from: String,
    pub to: String,
    /// Union of the kinds of all merged relations, in merge order.
    pub kinds: Vec<RelationKind>,
    pub relations: Vec<RelationId>,
    pub color: Option<String>,
}

impl MapEdge {
    /// Kind of the first merged relation.
    pub fn kind(&self) -> Option<RelationKind> {
        self.kinds.first().copied()
    }

    fn absorb(&mut self, other: &MapEdge) {
        for kind in &other.kinds {
            if !self.kinds.contains(kind) {
                self.kinds.push(*kind);
            }
        }
        for relation in &other.relations {
            if !self.relations.contains(relation) {
                self.relations.push(*relation);
            }
        }
    }
}

/// A heading-derived group of map nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// `g<i>`
    pub id: String,
    pub title: String,
    /// 1 for outermost groups.
    pub level: usize,
    pub section: Option<SectionId>,
    pub parent: Option<String>,
    pub nodes: Vec<String>,
    pub subgroups: Vec<String>,
    pub is_closed: bool,
    pub color: Option<String>,
}

impl Group {
    pub fn new(id: impl Into<String>, title: impl Into<String>, level: usize) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            level,
            section: None,
            parent: None,
            nodes: Vec::new(),
            subgroups: Vec::new(),
            is_closed: false,
            color: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.subgroups.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentMap {
    pub nodes: Vec<MapNode>,
    pub edges: Vec<MapEdge>,
    pub groups: Vec<Group>,
}

impl ArgumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Nodes ---

    pub fn node(&self, id: &str) -> Option<&MapNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut MapNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Node standing for a model element, if it was selected.
    pub fn node_for(&self, element: &ElementRef) -> Option<&MapNode> {
        self.nodes.iter().find(|n| n.represents(element))
    }

    pub fn node_by_title(&self, title: &str) -> Option<&MapNode> {
        self.nodes.iter().find(|n| n.title == title)
    }

    // --- Edges ---

    /// Add an edge or merge it into the existing edge on the same ordered
    /// node pair. Self edges are dropped. Returns the id of the stored edge.
    pub fn add_edge(
        &mut self,
        from: &str,
        to: &str,
        kind: RelationKind,
        relation: RelationId,
    ) -> Option<String> {
        if from == to {
            return None;
        }
        let edge = MapEdge {
            id: format!("e{}", self.edges.len()),
            from: from.to_string(),
            to: to.to_string(),
            kinds: vec![kind],
            relations: vec![relation],
            color: None,
        };
        if let Some(existing) = self.edges.iter_mut().find(|e| e.from == from && e.to == to) {
            existing.absorb(&edge);
            return Some(existing.id.clone());
        }
        let id = edge.id.clone();
        self.edges.push(edge);
        Some(id)
    }

    pub fn edges_between(&self, from: &str, to: &str) -> impl Iterator<Item = &MapEdge> {
        let (from, to) = (from.to_string(), to.to_string());
        self.edges.iter().filter(move |e| e.from == from && e.to == to)
    }

    pub fn outgoing(&self, node: &str) -> impl Iterator<Item = &MapEdge> {
        let node = node.to_string();
        self.edges.iter().filter(move |e| e.from == node)
    }

    /// Merge parallel edges on the same ordered pair into the first one and
    /// drop self edges.
    pub fn dedup_edges(&mut self) {
        let mut kept: Vec<MapEdge> = Vec::with_capacity(self.edges.len());
        for edge in self.edges.drain(..) {
            if edge.from == edge.to {
                continue;
            }
            match kept.iter_mut().find(|e| e.from == edge.from && e.to == edge.to) {
                Some(existing) => existing.absorb(&edge),
                None => kept.push(edge),
            }
        }
        self.edges = kept;
    }

    // --- Groups ---

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// Groups without a parent.
    pub fn root_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| g.parent.is_none())
    }

    /// Ids of the groups enclosing `group`, innermost first.
    pub fn ancestors(&self, group: &str) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut current = self.group(group).and_then(|g| g.parent.clone());
        while let Some(id) = current {
            if ancestors.contains(&id) {
                break;
            }
            current = self.group(&id).and_then(|g| g.parent.clone());
            ancestors.push(id);
        }
        ancestors
    }

    /// Node ids and subgroup ids contained in `group` at any depth.
    pub fn descendants(&self, group: &str) -> (Vec<String>, Vec<String>) {
        let mut nodes = Vec::new();
        let mut groups = Vec::new();
        let mut stack = vec![group.to_string()];
        while let Some(id) = stack.pop() {
            let Some(g) = self.group(&id) else {
                continue;
            };
            nodes.extend(g.nodes.iter().cloned());
            for sub in g.subgroups.iter().rev() {
                if !groups.contains(sub) {
                    groups.push(sub.clone());
                    stack.push(sub.clone());
                }
            }
        }
        (nodes, groups)
    }

    // --- Validation ---

    /// Check that edges and groups only reference nodes of this map, that
    /// every node is in at most one group and that the group tree is acyclic.
    pub fn validate(&self) -> Result<(), Vec<MapError>> {
        let mut errors = Vec::new();

        let mut ids = HashSet::new();
        for id in self
            .nodes
            .iter()
            .map(|n| &n.id)
            .chain(self.edges.iter().map(|e| &e.id))
        {
            if !ids.insert(id.as_str()) {
                errors.push(MapError::DuplicateId(id.clone()));
            }
        }
        let node_ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();

        for edge in &self.edges {
            for end in [&edge.from, &edge.to] {
                if !node_ids.contains(end.as_str()) {
                    errors.push(MapError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: end.clone(),
                    });
                }
            }
        }

        let mut owner: HashMap<&str, &str> = HashMap::new();
        for group in &self.groups {
            for node in &group.nodes {
                if !node_ids.contains(node.as_str()) {
                    errors.push(MapError::UnknownGroupMember {
                        group: group.id.clone(),
                        node: node.clone(),
                    });
                }
                if owner.insert(node.as_str(), group.id.as_str()).is_some() {
                    errors.push(MapError::NodeInSeveralGroups { node: node.clone() });
                }
            }
        }

        for group in &self.groups {
            let mut seen = HashSet::new();
            let mut current = Some(group);
            while let Some(g) = current {
                if !seen.insert(g.id.as_str()) {
                    errors.push(MapError::GroupCycle(group.id.clone()));
                    break;
                }
                current = g.parent.as_deref().and_then(|p| self.group(p));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
