//! Color assignment results.

use serde::{Deserialize, Serialize};

/// A key (tag, node id or group id) with its assigned color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub key: String,
    pub color: String,
}

/// Colors assigned by one run, in deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorAssignments {
    /// In first-seen tag order.
    pub tags: Vec<ColorEntry>,
    /// In map node order.
    pub nodes: Vec<ColorEntry>,
    pub groups: Vec<ColorEntry>,
}

impl ColorAssignments {
    pub fn tag_color(&self, tag: &str) -> Option<&str> {
        lookup(&self.tags, tag)
    }

    pub fn node_color(&self, node: &str) -> Option<&str> {
        lookup(&self.nodes, node)
    }

    pub fn group_color(&self, group: &str) -> Option<&str> {
        lookup(&self.groups, group)
    }
}

fn lookup<'a>(entries: &'a [ColorEntry], key: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|e| e.key == key)
        .map(|e| e.color.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        let colors = ColorAssignments {
            tags: vec![ColorEntry {
                key: "pro".into(),
                color: "#63AE12".into(),
            }],
            ..Default::default()
        };
        assert_eq!(colors.tag_color("pro"), Some("#63AE12"));
        assert_eq!(colors.tag_color("con"), None);
        assert_eq!(colors.node_color("n0"), None);
    }
}
