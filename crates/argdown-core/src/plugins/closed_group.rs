//! `transform-closed-groups`: collapse closed groups into nodes.

use argdown_engine::{ArgdownError, Logger, Plugin, Request, Response, ResponseField};
use argdown_model::collapse_closed_groups;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ClosedGroupPlugin;

impl Plugin for ClosedGroupPlugin {
    fn name(&self) -> &str {
        "closed-group"
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Map]
    }

    fn run(&self, _: &Request, response: &mut Response, logger: &Logger) -> Result<(), ArgdownError> {
        let map = response.require_map_mut(self.name())?;
        let collapsed = collapse_closed_groups(map);
        debug!(collapsed, edges = map.edges.len(), "collapsed closed groups");
        if collapsed > 0 {
            logger.verbose(&format!("collapsed {collapsed} closed groups"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argdown_engine::LogLevel;
    use argdown_model::{ArgumentMap, Group, MapNode, MapNodeKind, RelationKind};

    fn map() -> ArgumentMap {
        let mut map = ArgumentMap::new();
        for (id, title) in [("n0", "A"), ("n1", "B"), ("n2", "C")] {
            let mut node = MapNode::new(id, MapNodeKind::Statement, title);
            if id != "n2" {
                node.group = Some("g0".into());
            }
            map.nodes.push(node);
        }
        let mut group = Group::new("g0", "Closed", 1);
        group.nodes = vec!["n0".into(), "n1".into()];
        group.is_closed = true;
        map.groups.push(group);
        map.add_edge("n0", "n1", RelationKind::Support, 0);
        map.add_edge("n0", "n2", RelationKind::Attack, 1);
        map.add_edge("n1", "n2", RelationKind::Attack, 2);
        map
    }

    #[test]
    fn collapses_and_is_idempotent() {
        let mut response = Response {
            map: Some(map()),
            ..Response::default()
        };
        let logger = Logger::new(LogLevel::None);
        ClosedGroupPlugin.run(&Request::default(), &mut response, &logger).unwrap();
        let once = response.map.clone().unwrap();
        assert_eq!(once.edges.len(), 1);
        assert_eq!((once.edges[0].from.as_str(), once.edges[0].to.as_str()), ("g0", "n2"));
        assert!(once.node("g0").is_some());

        ClosedGroupPlugin.run(&Request::default(), &mut response, &logger).unwrap();
        assert_eq!(response.map.unwrap(), once);
    }

    #[test]
    fn requires_map() {
        let err = ClosedGroupPlugin
            .run(&Request::default(), &mut Response::default(), &Logger::new(LogLevel::None))
            .unwrap_err();
        assert_eq!(err.code(), "missing-dependency");
    }
}
