//! Statements, equivalence classes, arguments and sections.

use argdown_parser::{Mention, Span};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{merge_data, merge_tags};
use crate::relation::RelationId;

/// Index of a statement in [`Model::statements`](crate::Model::statements).
pub type StatementId = usize;

/// Index of a section in [`Model::sections`](crate::Model::sections).
pub type SectionId = usize;

/// The part a statement occurrence plays in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "role")]
pub enum StatementRole {
    /// Declared as a top-level block.
    Top,
    Premise { argument: String, number: u32 },
    /// Main conclusion of an argument's PCS.
    Conclusion { argument: String, number: u32 },
    IntermediaryConclusion { argument: String, number: u32 },
    /// Appears as the target of a relation line.
    RelationTarget,
}

/// One occurrence of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    /// Title of the owning equivalence class.
    pub title: String,
    pub text: Option<String>,
    pub tags: Vec<String>,
    pub section: Option<SectionId>,
    pub role: StatementRole,
    pub is_reference: bool,
    pub mentions: Vec<Mention>,
    pub data: Map<String, Value>,
    /// Relations declared by this occurrence.
    pub relations: Vec<RelationId>,
    pub span: Span,
    pub is_in_map: bool,
}

impl Statement {
    pub fn new(title: impl Into<String>, role: StatementRole) -> Self {
        Self {
            id: 0,
            title: title.into(),
            text: None,
            tags: Vec::new(),
            section: None,
            role,
            is_reference: false,
            mentions: Vec::new(),
            data: Map::new(),
            relations: Vec::new(),
            span: Span::default(),
            is_in_map: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_section(mut self, section: Option<SectionId>) -> Self {
        self.section = section;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// All statements sharing one canonical title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceClass {
    pub title: String,
    pub members: Vec<StatementId>,
    /// Union of member tags in first-seen order.
    pub tags: Vec<String>,
    /// Union of member relations.
    pub relations: Vec<RelationId>,
    /// Merged member data; the first value recorded for a key wins.
    pub data: Map<String, Value>,
    /// Titles of classes declared equivalent with `=`.
    pub equivalent_to: Vec<String>,
    pub is_auto_titled: bool,
    pub is_used_as_top_level_statement: bool,
    pub is_used_as_premise: bool,
    pub is_used_as_conclusion: bool,
    pub section: Option<SectionId>,
    /// First-seen position among all classes.
    pub order: usize,
    pub is_in_map: bool,
    pub color: Option<String>,
}

impl EquivalenceClass {
    pub fn new(title: impl Into<String>, order: usize) -> Self {
        Self {
            title: title.into(),
            members: Vec::new(),
            tags: Vec::new(),
            relations: Vec::new(),
            data: Map::new(),
            equivalent_to: Vec::new(),
            is_auto_titled: false,
            is_used_as_top_level_statement: false,
            is_used_as_premise: false,
            is_used_as_conclusion: false,
            section: None,
            order,
            is_in_map: false,
            color: None,
        }
    }

    /// Whether the class appears inside any premise-conclusion structure.
    pub fn is_used_in_argument(&self) -> bool {
        self.is_used_as_premise || self.is_used_as_conclusion
    }

    /// Boolean data flag, if set.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(Value::as_bool)
    }
}

/// Role of a step in a premise-conclusion structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PcsRole {
    Premise,
    IntermediaryConclusion,
    MainConclusion,
}

/// One numbered statement in an argument's premise-conclusion structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcsStep {
    pub number: u32,
    /// Equivalence class title.
    pub title: String,
    pub role: PcsRole,
    /// Inference rule text of the inference leading to this conclusion.
    pub inference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub title: String,
    pub descriptions: Vec<String>,
    pub pcs: Vec<PcsStep>,
    pub tags: Vec<String>,
    pub section: Option<SectionId>,
    pub data: Map<String, Value>,
    pub relations: Vec<RelationId>,
    pub is_auto_titled: bool,
    pub order: usize,
    pub is_in_map: bool,
    pub color: Option<String>,
    pub span: Span,
}

impl Argument {
    pub fn new(title: impl Into<String>, order: usize) -> Self {
        Self {
            title: title.into(),
            descriptions: Vec::new(),
            pcs: Vec::new(),
            tags: Vec::new(),
            section: None,
            data: Map::new(),
            relations: Vec::new(),
            is_auto_titled: false,
            order,
            is_in_map: false,
            color: None,
            span: Span::default(),
        }
    }

    /// Union new tags into the argument, keeping first-seen order.
    pub fn add_tags(&mut self, tags: &[String]) {
        merge_tags(&mut self.tags, tags);
    }

    /// Merge data without replacing recorded keys.
    pub fn add_data(&mut self, data: &Map<String, Value>) {
        merge_data(&mut self.data, data);
    }

    pub fn has_pcs(&self) -> bool {
        !self.pcs.is_empty()
    }

    pub fn premises(&self) -> impl Iterator<Item = &PcsStep> {
        self.pcs.iter().filter(|s| s.role == PcsRole::Premise)
    }

    pub fn main_conclusion(&self) -> Option<&PcsStep> {
        self.pcs.iter().find(|s| s.role == PcsRole::MainConclusion)
    }

    /// First description, used as the label text.
    pub fn description(&self) -> Option<&str> {
        self.descriptions.first().map(String::as_str)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(Value::as_bool)
    }
}

/// A heading-delimited section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub level: usize,
    pub parent: Option<SectionId>,
    pub tags: Vec<String>,
    pub data: Map<String, Value>,
    pub span: Span,
}

impl Section {
    /// Sections are grouped unless their data says `isGroup: false`.
    pub fn is_group(&self) -> bool {
        self.data.get("isGroup").and_then(Value::as_bool) != Some(false)
    }

    pub fn is_closed(&self) -> bool {
        self.data.get("isClosed").and_then(Value::as_bool) == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcs_queries() {
        let mut arg = Argument::new("A", 0);
        arg.pcs = vec![
            PcsStep {
                number: 1,
                title: "P1".into(),
                role: PcsRole::Premise,
                inference: None,
            },
            PcsStep {
                number: 2,
                title: "C".into(),
                role: PcsRole::MainConclusion,
                inference: Some("modus ponens".into()),
            },
        ];
        assert_eq!(arg.premises().count(), 1);
        assert_eq!(arg.main_conclusion().map(|s| s.title.as_str()), Some("C"));
    }

    #[test]
    fn section_flags() {
        let mut data = Map::new();
        data.insert("isGroup".into(), Value::Bool(false));
        let section = Section {
            id: 0,
            title: "S".into(),
            level: 1,
            parent: None,
            tags: Vec::new(),
            data,
            span: Span::default(),
        };
        assert!(!section.is_group());
        assert!(!section.is_closed());
    }

    #[test]
    fn role_serializes_tagged() {
        let role = StatementRole::Premise {
            argument: "A".into(),
            number: 1,
        };
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["role"], "premise");
        assert_eq!(json["number"], 1);
    }
}
