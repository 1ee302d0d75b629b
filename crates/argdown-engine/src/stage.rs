//! Stage names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named pipeline stage. Unknown names become [`Stage::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Stage {
    ParseInput,
    BuildModel,
    BuildMap,
    TransformClosedGroups,
    Colorize,
    ExportDot,
    ExportJson,
    Custom(String),
}

impl Stage {
    pub const BUILT_IN: [Stage; 7] = [
        Stage::ParseInput,
        Stage::BuildModel,
        Stage::BuildMap,
        Stage::TransformClosedGroups,
        Stage::Colorize,
        Stage::ExportDot,
        Stage::ExportJson,
    ];

    pub fn parse(name: &str) -> Self {
        match name {
            "parse-input" => Stage::ParseInput,
            "build-model" => Stage::BuildModel,
            "build-map" => Stage::BuildMap,
            "transform-closed-groups" => Stage::TransformClosedGroups,
            "colorize" => Stage::Colorize,
            "export-dot" => Stage::ExportDot,
            "export-json" => Stage::ExportJson,
            other => Stage::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Stage::ParseInput => "parse-input",
            Stage::BuildModel => "build-model",
            Stage::BuildMap => "build-map",
            Stage::TransformClosedGroups => "transform-closed-groups",
            Stage::Colorize => "colorize",
            Stage::ExportDot => "export-dot",
            Stage::ExportJson => "export-json",
            Stage::Custom(name) => name,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        Stage::parse(name)
    }
}

impl From<String> for Stage {
    fn from(name: String) -> Self {
        Stage::parse(&name)
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for stage in Stage::BUILT_IN {
            assert_eq!(Stage::parse(stage.as_str()), stage);
        }
        assert_eq!(Stage::parse("export-svg"), Stage::Custom("export-svg".into()));
    }

    #[test]
    fn serializes_as_name() {
        let json = serde_json::to_value(Stage::TransformClosedGroups).unwrap();
        assert_eq!(json, "transform-closed-groups");
        let stage: Stage = serde_json::from_value(json).unwrap();
        assert_eq!(stage, Stage::TransformClosedGroups);
    }
}
