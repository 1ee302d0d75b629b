//! Plugin pipeline engine for the Argdown compiler.
//!
//! An [`Application`] holds plugins grouped by [`Stage`] and a table of
//! named processes. A run threads one [`Request`] and one [`Response`]
//! through the stages of the requested process.

pub mod application;
pub mod error;
pub mod logger;
pub mod plugin;
pub mod request;
pub mod response;
pub mod settings;
pub mod stage;

pub use application::Application;
pub use error::ArgdownError;
pub use logger::Logger;
pub use plugin::{AsyncPlugin, Capabilities, Plugin, PluginHandle};
pub use request::{CancelFlag, LogLevel, ProcessSpec, Request, SelectionSettings};
pub use response::{Response, ResponseField};
pub use settings::{merge_defaults, PluginSettings};
pub use stage::Stage;
