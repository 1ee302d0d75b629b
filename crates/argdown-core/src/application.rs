//! The stock application: every built-in plugin plus the standard processes.

use argdown_engine::{Application, Stage};

use crate::plugins::{
    ArgumentSelectionPlugin, ClosedGroupPlugin, ColorPlugin, DataPlugin, DerivePlugin,
    DotExportPlugin, ExplodeArgumentsPlugin, GroupPlugin, JsonExportPlugin, MapPlugin, ModelPlugin,
    ParserPlugin, PreselectionPlugin, RegroupPlugin, StatementSelectionPlugin,
};

/// Stages of the `export-dot` process.
pub const EXPORT_DOT: [Stage; 6] = [
    Stage::ParseInput,
    Stage::BuildModel,
    Stage::BuildMap,
    Stage::TransformClosedGroups,
    Stage::Colorize,
    Stage::ExportDot,
];

/// Stages of the `export-json` process.
pub const EXPORT_JSON: [Stage; 5] = [
    Stage::ParseInput,
    Stage::BuildModel,
    Stage::BuildMap,
    Stage::Colorize,
    Stage::ExportJson,
];

/// An application with all built-in plugins registered.
///
/// Processes: `export-dot`, `export-json`, `build-map` (up to colors) and
/// `build-model`.
pub fn default_application() -> Application {
    let mut app = Application::new();

    app.add_plugin(ParserPlugin, Stage::ParseInput);

    // Front matter must be merged before the model plugin prepares its settings.
    app.add_plugin(DataPlugin, Stage::BuildModel);
    app.add_plugin(ModelPlugin, Stage::BuildModel);
    app.add_plugin(ExplodeArgumentsPlugin, Stage::BuildModel);
    app.add_plugin(RegroupPlugin, Stage::BuildModel);
    app.add_plugin(DerivePlugin, Stage::BuildModel);

    app.add_plugin(PreselectionPlugin, Stage::BuildMap);
    app.add_plugin(StatementSelectionPlugin, Stage::BuildMap);
    app.add_plugin(ArgumentSelectionPlugin, Stage::BuildMap);
    app.add_plugin(MapPlugin, Stage::BuildMap);
    app.add_plugin(GroupPlugin, Stage::BuildMap);

    app.add_plugin(ClosedGroupPlugin, Stage::TransformClosedGroups);
    app.add_plugin(ColorPlugin, Stage::Colorize);
    app.add_plugin(DotExportPlugin, Stage::ExportDot);
    app.add_plugin(JsonExportPlugin, Stage::ExportJson);

    app.define_process("export-dot", EXPORT_DOT);
    app.define_process("export-json", EXPORT_JSON);
    app.define_process(
        "build-map",
        [
            Stage::ParseInput,
            Stage::BuildModel,
            Stage::BuildMap,
            Stage::TransformClosedGroups,
            Stage::Colorize,
        ],
    );
    app.define_process("build-model", [Stage::ParseInput, Stage::BuildModel]);
    app
}

#[cfg(test)]
mod tests {
    use super::*;
    use argdown_engine::Request;

    #[test]
    fn registers_every_stage() {
        let app = default_application();
        let stages: Vec<_> = app.stages().cloned().collect();
        assert_eq!(stages, Stage::BUILT_IN.to_vec());

        let names: Vec<_> = app.plugins(&Stage::BuildMap).iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["preselection", "statement-selection", "argument-selection", "map", "group"]
        );
        let names: Vec<_> = app.plugins(&Stage::BuildModel).iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["data", "model", "explode-arguments", "regroup", "derive"]);
    }

    #[test]
    fn standard_processes_resolve() {
        let app = default_application();
        for name in ["export-dot", "export-json", "build-map", "build-model"] {
            let request = Request::new("").with_process(name);
            assert!(app.resolve_process(&request).is_ok(), "{name}");
        }
        assert_eq!(app.process("export-dot").unwrap(), &EXPORT_DOT);
        assert_eq!(app.process("build-model").unwrap().len(), 2);
    }

    #[test]
    fn build_model_stops_before_the_map() {
        let response = default_application()
            .run(Request::new("[A]: a\n  + [B]: b").with_process("build-model"))
            .unwrap();
        assert!(response.model.is_some());
        assert!(response.map.is_none());
        assert!(response.dot.is_none());
    }
}
