//! Whole-pipeline tests through the default application.

use argdown_core::default_application;
use argdown_engine::{ArgdownError, Request, Response};
use argdown_model::{derive_relations, ConflictPolicy, ElementRef, RelationKind};
use serde_json::{json, Value};

fn run(input: &str, process: &str) -> Response {
    default_application()
        .run(Request::new(input).with_process(process))
        .unwrap()
}

// --- End to end ---

#[test]
fn statement_with_attack_and_support() {
    let response = run("[B]: b text\n\n<A>: a text\n  - [B]\n  + <C>: c text", "export-dot");
    assert!(response.exceptions.is_empty(), "{:?}", response.exceptions);

    let model = response.model.as_ref().unwrap();
    assert!(model.class("B").is_some());
    assert!(model.argument("A").is_some());
    assert!(model.argument("C").is_some());

    let a = ElementRef::Argument("A".into());
    let b = ElementRef::Statement("B".into());
    let c = ElementRef::Argument("C".into());
    assert!(model.find_relation(&a, &b, RelationKind::Attack).is_some());
    assert!(model.find_relation(&a, &c, RelationKind::Support).is_some());

    let map = response.map.as_ref().unwrap();
    assert_eq!(map.nodes.len(), 3);
    assert_eq!(map.edges.len(), 2);
    let kinds: Vec<_> = map.edges.iter().filter_map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![RelationKind::Attack, RelationKind::Support]);

    let dot = response.dot.unwrap();
    assert!(dot.contains("n1 -> n0"));
    assert!(dot.contains("n1 -> n2"));
}

#[test]
fn headings_become_nested_groups() {
    let response = run("# X\n\n[A]: a\n\n## Y\n\n[B]: b", "build-map");
    let map = response.map.unwrap();

    let roots: Vec<_> = map.root_groups().map(|g| g.title.as_str()).collect();
    assert_eq!(roots, vec!["X"]);
    let x = map.root_groups().next().unwrap();
    let y = map.group(&x.subgroups[0]).unwrap();
    assert_eq!(y.title, "Y");
    assert_eq!(y.level, 2);

    let b = map.node_by_title("B").unwrap();
    assert_eq!(b.group.as_deref(), Some(y.id.as_str()));
    assert_eq!(map.ancestors(&y.id), vec![x.id.clone()]);
}

#[test]
fn repeated_relations_are_stored_once() {
    let response = run("[A]: a\n  + [B]: b\n\n[A]\n  + [B]", "build-map");
    let model = response.model.unwrap();
    let explicit = model.explicit_relations().count();
    assert_eq!(explicit, 1);
    assert_eq!(model.members("A").count(), 2);
    assert_eq!(response.map.unwrap().edges.len(), 1);
}

// --- Selection ---

#[test]
fn exclusion_wins_over_inclusion() {
    let request = Request::from_json_value(json!({
        "input": "[A]: a\n  + [B]: b",
        "process": "build-map",
        "includeStatements": ["B"],
        "excludeStatements": ["B"]
    }))
    .unwrap();
    let response = default_application().run(request).unwrap();
    let map = response.map.unwrap();
    assert!(map.node_by_title("B").is_none());
    assert!(map.node_by_title("A").is_some());
    assert!(map.edges.is_empty());
    assert!(!response.selection.unwrap().statements.contains("B"));
}

#[test]
fn front_matter_overrides_request_settings() {
    let input = "===\nselectedTags: [pro]\ngroup:\n  groupDepth: 0\n===\n\n# S\n\n[A]: a #pro\n\n[B]: b #con";
    let request = Request::new(input)
        .with_process("build-map")
        .with_namespace("group", json!({"groupDepth": 3}));
    let response = default_application().run(request).unwrap();
    let map = response.map.unwrap();
    let titles: Vec<_> = map.nodes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["A"]);
    assert!(map.groups.is_empty());
}

#[test]
fn tag_switches_alone_keep_every_element() {
    let request = Request::from_json_value(json!({
        "input": "[A]: a\n  + [B]: b\n\n# S\n\n[C]: c",
        "process": "build-map",
        "selectElementsWithoutTag": false,
        "selectElementsWithoutSection": false
    }))
    .unwrap();
    let map = default_application().run(request).unwrap().map.unwrap();
    let titles: Vec<_> = map.nodes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
}

#[test]
fn disconnected_elements_are_dropped() {
    let input = "[A]: a\n  + [B]: b\n\n[C]: c\n\n<D>: d\n  - [A]\n\n<E>: e";
    let request = Request::new(input)
        .with_process("build-map")
        .with_namespace("statementSelection", json!({"excludeDisconnected": true}))
        .with_namespace("argumentSelection", json!({"excludeDisconnected": true}));
    let map = default_application().run(request).unwrap().map.unwrap();
    let titles: Vec<_> = map.nodes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "D"]);
}

// --- Model transforms ---

#[test]
fn exploded_arguments_reach_the_map() {
    let input = "===\nmodel:\n  explodeArguments: true\n===\n\n<A>: a\n\n(1) [P]: p\n----\n(2) [I]: i\n----\n(3) [C]: c";
    let response = run(input, "build-map");
    let model = response.model.unwrap();
    assert_eq!(model.arguments().len(), 2);
    let support = model.find_relation(
        &ElementRef::Argument("A (1)".into()),
        &ElementRef::Argument("A".into()),
        RelationKind::Support,
    );
    assert!(support.is_some());

    let map = response.map.unwrap();
    assert!(map.node_by_title("A (1)").is_some());
    assert!(map.node_by_title("A").is_some());
}

#[test]
fn regrouping_replaces_headings() {
    let request = Request::new("# Old\n\n[A]: a\n  + [B]: b")
        .with_process("build-map")
        .with_namespace(
            "group",
            json!({"regroup": [{"title": "New", "statements": ["A"], "isClosed": true}]}),
        );
    let map = default_application().run(request).unwrap().map.unwrap();
    let titles: Vec<_> = map.groups.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["New"]);
    assert!(map.groups[0].is_closed);
    assert!(map.node_by_title("A").is_none());
    assert!(map.node_by_title("B").is_some());
}

// --- Invariants ---

#[test]
fn derivation_is_idempotent() {
    let response = run("<A>\n\n(1) p\n----\n(2) [C]: c\n\n[D]: d\n  - [C]", "build-model");
    let mut model = response.model.unwrap();
    let before = model.relations().len();
    derive_relations(&mut model, ConflictPolicy::default());
    assert_eq!(model.relations().len(), before);
}

#[test]
fn closed_groups_keep_no_internal_edges() {
    let input = "# X {isClosed: true}\n\n[A]: a\n  + [B]: b\n\n# Y\n\n[C]: c\n  - [A]";
    let app = default_application();
    let response = app
        .run(Request::new(input).with_process("build-map"))
        .unwrap();
    let map = response.map.unwrap();

    let x = map.groups.iter().find(|g| g.title == "X").unwrap();
    assert!(x.is_empty());
    assert!(map.node(&x.id).is_some());
    assert!(map.node_by_title("A").is_none());
    for edge in &map.edges {
        assert_ne!(edge.from, edge.to);
    }
    assert!(map.edges.iter().any(|e| e.to == x.id));

    let mut again = map.clone();
    argdown_model::collapse_closed_groups(&mut again);
    assert_eq!(again, map);
}

#[test]
fn colors_are_deterministic() {
    let input = "# S\n\n[A]: a #x #y\n  - [B]: b #z\n\n<C>: c #y\n  + [A]";
    let first = run(input, "build-map").colors.unwrap();
    let second = run(input, "build-map").colors.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.tags.len(), 3);
}

#[test]
fn map_references_are_consistent() {
    let input = "# X\n\n[A]: a\n  = [A2]: a too\n  + [B]: b\n\n## Y\n\n<C>: c\n  - [A2]\n\n# Z\n\n[D]: d\n  _> <C>";
    let map = run(input, "build-map").map.unwrap();
    assert!(map.validate().is_ok(), "{:?}", map.validate());
    for edge in &map.edges {
        assert!(map.node(&edge.from).is_some());
        assert!(map.node(&edge.to).is_some());
    }
}

// --- Errors ---

#[test]
fn model_errors_are_collected_or_thrown() {
    let input = "[A]: a\n  + [A]";
    let response = run(input, "build-model");
    assert_eq!(response.exceptions.len(), 1);
    assert_eq!(response.exceptions[0].code(), "model");
    assert!(response.model.is_some());

    let err = default_application()
        .run(Request::new(input).with_process("build-model").throwing(true))
        .unwrap_err();
    assert_eq!(err.code(), "model");
}

#[test]
fn missing_dependencies_are_collected_or_thrown() {
    let process = vec!["parse-input", "export-dot"];
    let response = default_application()
        .run(Request::new("[A]: a").with_process(process.clone()))
        .unwrap();
    assert!(response.dot.is_none());
    assert!(response.exceptions.iter().any(|e| matches!(
        e,
        ArgdownError::MissingDependency { field, .. } if field == "map"
    )));

    let err = default_application()
        .run(Request::new("[A]: a").with_process(process).throwing(true))
        .unwrap_err();
    assert_eq!(err.code(), "missing-dependency");
}

#[test]
fn unknown_process_is_rejected() {
    let err = default_application()
        .run(Request::new("[A]: a").with_process("export-pdf"))
        .unwrap_err();
    assert_eq!(
        err,
        ArgdownError::UnknownProcess {
            name: "export-pdf".into()
        }
    );
}

#[test]
fn cancelled_runs_stop_before_the_next_stage() {
    let request = Request::new("[A]: a").with_process("export-dot");
    request.cancel.cancel();
    let err = default_application().run(request).unwrap_err();
    assert_eq!(
        err,
        ArgdownError::Cancelled {
            stage: "parse-input".into()
        }
    );
}

// --- Exports ---

#[test]
fn json_export_contains_model_and_map() {
    let response = run("[A]: a\n  - [B]: b", "export-json");
    let value: Value = serde_json::from_str(response.json.as_deref().unwrap()).unwrap();
    assert_eq!(value["statements"].as_array().unwrap().len(), 2);
    assert_eq!(value["map"]["edges"].as_array().unwrap().len(), 1);
    assert!(response.dot.is_none());
}

#[tokio::test]
async fn async_run_matches_sync_run() {
    let input = "# X\n\n[A]: a\n  - [B]: b";
    let app = default_application();
    let sync = app
        .run(Request::new(input).with_process("export-dot"))
        .unwrap();
    let async_response = app
        .run_async(Request::new(input).with_process("export-dot"))
        .await
        .unwrap();
    assert_eq!(sync.dot, async_response.dot);
    assert_ne!(sync.run_id, async_response.run_id);
}
