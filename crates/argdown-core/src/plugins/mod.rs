//! Built-in plugins, one module per plugin.
//!
//! Each module exposes the plugin type, its settings namespace (if any) and a
//! free function doing the actual work, so stages can be exercised without
//! an [`Application`](argdown_engine::Application).

pub mod argument_selection;
pub mod closed_group;
pub mod color;
pub mod data;
pub mod derive;
pub mod dot_export;
pub mod explode_arguments;
pub mod group;
pub mod json_export;
pub mod map;
pub mod model;
pub mod parser;
pub mod preselection;
pub mod regroup;
pub mod statement_selection;

pub use argument_selection::{ArgumentSelectionMode, ArgumentSelectionPlugin, ArgumentSelectionSettings};
pub use closed_group::ClosedGroupPlugin;
pub use color::{ColorPlugin, ColorSettings};
pub use data::DataPlugin;
pub use derive::DerivePlugin;
pub use dot_export::{DotExportPlugin, DotSettings};
pub use explode_arguments::ExplodeArgumentsPlugin;
pub use group::{GroupPlugin, GroupSettings, RegroupConfig};
pub use json_export::{JsonExportPlugin, JsonSettings};
pub use map::{MapPlugin, MapSettings};
pub use model::{ModelPlugin, ModelSettings};
pub use parser::ParserPlugin;
pub use preselection::PreselectionPlugin;
pub use regroup::RegroupPlugin;
pub use statement_selection::{
    StatementSelectionMode, StatementSelectionPlugin, StatementSelectionSettings,
};
