//! Per-plugin settings and the default-merge rule.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Typed settings a plugin reads from its namespace of the request.
///
/// ```rust
/// use argdown_engine::PluginSettings;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase", default)]
/// struct DotSettings {
///     graph_name: String,
/// }
///
/// impl PluginSettings for DotSettings {
///     const NAMESPACE: &'static str = "dot";
/// }
/// ```
pub trait PluginSettings:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    /// Request key holding the raw settings object.
    const NAMESPACE: &'static str;
}

/// Merge `explicit` over `defaults`.
///
/// Objects merge key by key, recursively. A missing or `null` explicit value
/// takes the default. When the default is an object and the explicit value is
/// not, the default object is kept. In every other case the explicit value
/// wins.
pub fn merge_defaults(explicit: &Value, defaults: &Value) -> Value {
    match (explicit, defaults) {
        (Value::Null, _) => defaults.clone(),
        (Value::Object(explicit), Value::Object(defaults)) => {
            let mut merged = defaults.clone();
            for (key, value) in explicit {
                let default = defaults.get(key).unwrap_or(&Value::Null);
                merged.insert(key.clone(), merge_defaults(value, default));
            }
            Value::Object(merged)
        }
        (_, Value::Object(_)) => defaults.clone(),
        _ => explicit.clone(),
    }
}
