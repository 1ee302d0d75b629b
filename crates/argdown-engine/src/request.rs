//! The request half of the pipeline context.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ArgdownError;
use crate::settings::{merge_defaults, PluginSettings};

/// Keys that front matter may not override.
const PROTECTED_KEYS: [&str; 3] = ["input", "process", "processes"];

/// Either an explicit list of stage names or the name of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessSpec {
    Stages(Vec<String>),
    Named(String),
}

impl From<&str> for ProcessSpec {
    fn from(name: &str) -> Self {
        ProcessSpec::Named(name.to_string())
    }
}

impl From<Vec<&str>> for ProcessSpec {
    fn from(stages: Vec<&str>) -> Self {
        ProcessSpec::Stages(stages.into_iter().map(str::to_string).collect())
    }
}

/// Minimum level of messages plugins emit through the [`Logger`](crate::Logger).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Verbose,
    Info,
    Warning,
    #[default]
    Error,
    None,
}

/// Run-granular cancellation, shared between the caller and a running pipeline.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Selection settings, read from the top level of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionSettings {
    /// Unset selects every tag.
    pub selected_tags: Option<Vec<String>>,
    pub select_elements_without_tag: bool,
    /// Unset selects every section.
    pub selected_sections: Option<Vec<String>>,
    pub select_elements_without_section: bool,
    pub include_statements: Vec<String>,
    pub exclude_statements: Vec<String>,
    pub exclude_arguments: Vec<String>,
    pub ignore_is_in_map: bool,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            selected_tags: None,
            select_elements_without_tag: true,
            selected_sections: None,
            select_elements_without_section: true,
            include_statements: Vec::new(),
            exclude_statements: Vec::new(),
            exclude_arguments: Vec::new(),
            ignore_is_in_map: false,
        }
    }
}

/// Typed settings prepared by plugins, keyed by settings type.
#[derive(Clone, Default)]
struct PreparedSettings(HashMap<TypeId, Arc<dyn Any + Send + Sync>>);

impl fmt::Debug for PreparedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedSettings")
            .field("entries", &self.0.len())
            .finish()
    }
}

/// Input text plus configuration for one run.
///
/// Any key that is not a recognized field is kept in [`Request::settings`]
/// as a raw namespace for the plugin that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub process: Option<ProcessSpec>,
    /// Caller-defined processes, consulted before the application's own.
    #[serde(default)]
    pub processes: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub throw_exceptions: bool,
    #[serde(default = "default_true")]
    pub log_exceptions: bool,
    #[serde(flatten)]
    pub selection: SelectionSettings,
    #[serde(flatten)]
    pub settings: Map<String, Value>,

    #[serde(skip)]
    pub cancel: CancelFlag,
    #[serde(skip)]
    prepared: PreparedSettings,
}

fn default_true() -> bool {
    true
}

impl Default for Request {
    fn default() -> Self {
        Self {
            input: None,
            process: None,
            processes: BTreeMap::new(),
            log_level: LogLevel::default(),
            throw_exceptions: false,
            log_exceptions: true,
            selection: SelectionSettings::default(),
            settings: Map::new(),
            cancel: CancelFlag::default(),
            prepared: PreparedSettings::default(),
        }
    }
}

impl Request {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: Some(input.into()),
            ..Self::default()
        }
    }

    pub fn with_process(mut self, process: impl Into<ProcessSpec>) -> Self {
        self.process = Some(process.into());
        self
    }

    pub fn with_namespace(mut self, name: &str, value: Value) -> Self {
        self.settings.insert(name.to_string(), value);
        self
    }

    pub fn throwing(mut self, throw_exceptions: bool) -> Self {
        self.throw_exceptions = throw_exceptions;
        self
    }

    /// Build a request from a JSON object.
    pub fn from_json_value(value: Value) -> Result<Self, ArgdownError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Build a request from TOML text.
    ///
    /// ```rust
    /// use argdown_engine::Request;
    ///
    /// let request = Request::from_toml_str(r#"
    /// process = "export-dot"
    /// selectedTags = ["pro"]
    ///
    /// [dot]
    /// graphName = "debate"
    /// "#).unwrap();
    /// assert_eq!(request.selection.selected_tags, Some(vec!["pro".to_string()]));
    /// assert!(request.namespace("dot").is_some());
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ArgdownError> {
        Ok(toml::from_str(text)?)
    }

    /// Raw settings object of a namespace.
    pub fn namespace(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }

    /// Merge the raw namespace over `T::default()` and store the result for
    /// [`Request::settings`].
    pub fn prepare_settings<T: PluginSettings>(&mut self) -> Result<&T, ArgdownError> {
        self.prepare_settings_with(T::default())
    }

    /// Like [`Request::prepare_settings`] with plugin-supplied defaults.
    pub fn prepare_settings_with<T: PluginSettings>(
        &mut self,
        defaults: T,
    ) -> Result<&T, ArgdownError> {
        let settings = self.resolve_settings(defaults)?;
        let key = TypeId::of::<T>();
        self.prepared.0.insert(key, Arc::new(settings));
        self.prepared
            .0
            .get(&key)
            .and_then(|v| v.downcast_ref::<T>())
            .ok_or_else(|| ArgdownError::InvalidConfig {
                message: format!("settings slot `{}` holds another type", T::NAMESPACE),
            })
    }

    /// Typed settings for a namespace: the prepared value if a plugin
    /// prepared one, otherwise the raw namespace merged over the defaults.
    pub fn settings<T: PluginSettings>(&self) -> Result<T, ArgdownError> {
        if let Some(prepared) = self
            .prepared
            .0
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
        {
            return Ok(prepared.clone());
        }
        self.resolve_settings(T::default())
    }

    fn resolve_settings<T: PluginSettings>(&self, defaults: T) -> Result<T, ArgdownError> {
        let defaults = serde_json::to_value(defaults)?;
        let explicit = self.settings.get(T::NAMESPACE).unwrap_or(&Value::Null);
        let merged = merge_defaults(explicit, &defaults);
        serde_json::from_value(merged).map_err(|e| ArgdownError::InvalidConfig {
            message: format!("{}: {e}", T::NAMESPACE),
        })
    }

    /// Apply document front matter on top of this request.
    ///
    /// Front matter values win, nested objects merge key by key, and
    /// `input`, `process` and `processes` cannot be overridden. Prepared
    /// settings and the cancel flag are kept.
    pub fn overlay(&mut self, front_matter: &Map<String, Value>) -> Result<(), ArgdownError> {
        let mut overrides = front_matter.clone();
        for key in PROTECTED_KEYS {
            overrides.remove(key);
        }
        if overrides.is_empty() {
            return Ok(());
        }

        let current = serde_json::to_value(&*self)?;
        let merged = merge_defaults(&Value::Object(overrides), &current);
        let mut next: Request = serde_json::from_value(merged)?;
        next.cancel = self.cancel.clone();
        next.prepared = std::mem::take(&mut self.prepared);
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    struct TestSettings {
        mode: String,
        depth: usize,
    }

    impl Default for TestSettings {
        fn default() -> Self {
            Self {
                mode: "all".into(),
                depth: 2,
            }
        }
    }

    impl PluginSettings for TestSettings {
        const NAMESPACE: &'static str = "test";
    }

    #[test]
    fn json_request_with_namespaces() {
        let request = Request::from_json_value(json!({
            "input": "[A]: a",
            "process": ["parse-input", "build-model"],
            "excludeStatements": ["X"],
            "throwExceptions": true,
            "test": {"depth": 3}
        }))
        .unwrap();
        assert_eq!(request.input.as_deref(), Some("[A]: a"));
        assert!(matches!(request.process, Some(ProcessSpec::Stages(ref s)) if s.len() == 2));
        assert_eq!(request.selection.exclude_statements, vec!["X".to_string()]);
        assert!(request.selection.select_elements_without_tag);
        assert!(request.throw_exceptions);
        assert!(request.log_exceptions);
        assert!(request.namespace("test").is_some());
        assert!(request.namespace("excludeStatements").is_none());
    }

    #[test]
    fn settings_merge_over_defaults() {
        let request = Request::default().with_namespace("test", json!({"mode": "top"}));
        let settings: TestSettings = request.settings().unwrap();
        assert_eq!(settings.mode, "top");
        assert_eq!(settings.depth, 2);
    }

    #[test]
    fn prepared_settings_are_stored() {
        let mut request = Request::default().with_namespace("test", json!({"depth": 5}));
        let custom = TestSettings {
            mode: "custom".into(),
            depth: 1,
        };
        let prepared = request.prepare_settings_with(custom).unwrap().clone();
        assert_eq!(prepared.mode, "custom");
        assert_eq!(prepared.depth, 5);
        assert_eq!(request.settings::<TestSettings>().unwrap(), prepared);
    }

    #[test]
    fn invalid_namespace_is_a_config_error() {
        let request = Request::default().with_namespace("test", json!({"depth": "deep"}));
        let err = request.settings::<TestSettings>().unwrap_err();
        assert_eq!(err.code(), "invalid-config");
    }

    #[test]
    fn front_matter_overlay() {
        let mut request = Request::new("text")
            .with_process("export-dot")
            .with_namespace("test", json!({"mode": "top", "depth": 4}));
        let front_matter = json!({
            "input": "replaced?",
            "process": "other",
            "selectedTags": ["pro"],
            "test": {"depth": 1}
        });
        request
            .overlay(front_matter.as_object().unwrap())
            .unwrap();

        assert_eq!(request.input.as_deref(), Some("text"));
        assert_eq!(request.process, Some(ProcessSpec::Named("export-dot".into())));
        assert_eq!(request.selection.selected_tags, Some(vec!["pro".to_string()]));
        assert_eq!(request.namespace("test").unwrap()["mode"], "top");
        assert_eq!(request.namespace("test").unwrap()["depth"], 1);
    }

    #[test]
    fn cancel_flag_is_shared() {
        let request = Request::default();
        let flag = request.cancel.clone();
        flag.cancel();
        assert!(request.cancel.is_cancelled());
    }

    #[test]
    fn toml_request() {
        let request = Request::from_toml_str(
            "input = \"[A]: a\"\nlogLevel = \"verbose\"\n\n[group]\ngroupDepth = 1\n",
        )
        .unwrap();
        assert_eq!(request.log_level, LogLevel::Verbose);
        assert_eq!(request.namespace("group").unwrap()["groupDepth"], 1);
    }
}
