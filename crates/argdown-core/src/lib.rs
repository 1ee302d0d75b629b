//! Argdown compiler core: the built-in plugins and a ready-made application.
//!
//! ```rust
//! use argdown_core::default_application;
//! use argdown_engine::Request;
//!
//! let app = default_application();
//! let response = app
//!     .run(Request::new("[A]: a\n  - [B]: b").with_process("export-dot"))
//!     .unwrap();
//! assert!(response.dot.unwrap().contains("->"));
//! ```

pub mod application;
pub mod plugins;

pub use application::{default_application, EXPORT_DOT, EXPORT_JSON};
pub use plugins::{
    ArgumentSelectionMode, ArgumentSelectionSettings, ColorSettings, DotSettings, GroupSettings,
    JsonSettings, MapSettings, ModelSettings, RegroupConfig, StatementSelectionMode,
    StatementSelectionSettings,
};
