//! Model container: statements, equivalence classes, arguments, relations
//! and sections, with title indices.
//!
//! Everything is stored in first-seen order so that iteration over the model
//! is deterministic. Title lookups go through hash indices that are rebuilt
//! on deserialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use argdown_parser::Span;

use crate::element::{Argument, EquivalenceClass, Section, SectionId, Statement, StatementId, StatementRole};
use crate::error::ModelError;
use crate::relation::{ElementRef, Origin, Relation, RelationId, RelationKind};

/// The semantic model of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ModelData")]
pub struct Model {
    statements: Vec<Statement>,
    classes: Vec<EquivalenceClass>,
    arguments: Vec<Argument>,
    relations: Vec<Relation>,
    sections: Vec<Section>,
    /// Every tag in first-seen order.
    tags: Vec<String>,

    #[serde(skip)]
    class_index: HashMap<String, usize>,
    #[serde(skip)]
    argument_index: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct ModelData {
    statements: Vec<Statement>,
    classes: Vec<EquivalenceClass>,
    arguments: Vec<Argument>,
    relations: Vec<Relation>,
    sections: Vec<Section>,
    tags: Vec<String>,
}

impl From<ModelData> for Model {
    fn from(data: ModelData) -> Self {
        let class_index = data
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.title.clone(), i))
            .collect();
        let argument_index = data
            .arguments
            .iter()
            .enumerate()
            .map(|(i, a)| (a.title.clone(), i))
            .collect();
        Self {
            statements: data.statements,
            classes: data.classes,
            arguments: data.arguments,
            relations: data.relations,
            sections: data.sections,
            tags: data.tags,
            class_index,
            argument_index,
        }
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Sections ---

    pub fn add_section(
        &mut self,
        title: impl Into<String>,
        level: usize,
        parent: Option<SectionId>,
        tags: Vec<String>,
        data: Map<String, Value>,
        span: Span,
    ) -> SectionId {
        let id = self.sections.len();
        self.record_tags(&tags);
        self.sections.push(Section {
            id,
            title: title.into(),
            level,
            parent,
            tags,
            data,
            span,
        });
        id
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Ancestors of a section, outermost first, ending with the section itself.
    pub fn section_path(&self, id: SectionId) -> Vec<&Section> {
        let mut path = Vec::new();
        let mut current = self.sections.get(id);
        while let Some(section) = current {
            path.push(section);
            current = section.parent.and_then(|p| self.sections.get(p));
        }
        path.reverse();
        path
    }

    /// Drop every section and detach all statements, classes and arguments
    /// from them.
    pub fn clear_sections(&mut self) {
        self.sections.clear();
        for statement in &mut self.statements {
            statement.section = None;
        }
        for class in &mut self.classes {
            class.section = None;
        }
        for argument in &mut self.arguments {
            argument.section = None;
        }
    }

    /// Titles along the section path; empty for elements outside any section.
    pub fn section_titles(&self, id: Option<SectionId>) -> Vec<String> {
        id.map(|id| {
            self.section_path(id)
                .into_iter()
                .map(|s| s.title.clone())
                .collect()
        })
        .unwrap_or_default()
    }

    // --- Tags ---

    pub fn record_tags(&mut self, tags: &[String]) {
        for tag in tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    // --- Statements and equivalence classes ---

    /// Add a statement occurrence, creating its equivalence class on first
    /// sight and merging tags, data and role flags into it.
    pub fn add_statement(&mut self, mut statement: Statement) -> StatementId {
        let id = self.statements.len();
        statement.id = id;

        let index = match self.class_index.get(&statement.title) {
            Some(&index) => index,
            None => {
                let index = self.classes.len();
                let mut class = EquivalenceClass::new(statement.title.clone(), index);
                class.section = statement.section;
                self.classes.push(class);
                self.class_index.insert(statement.title.clone(), index);
                index
            }
        };

        let class = &mut self.classes[index];
        class.members.push(id);
        merge_tags(&mut class.tags, &statement.tags);
        merge_data(&mut class.data, &statement.data);
        match statement.role {
            StatementRole::Top => class.is_used_as_top_level_statement = true,
            StatementRole::Premise { .. } => class.is_used_as_premise = true,
            StatementRole::Conclusion { .. } | StatementRole::IntermediaryConclusion { .. } => {
                class.is_used_as_conclusion = true
            }
            StatementRole::RelationTarget => {}
        }

        self.record_tags(&statement.tags);
        self.statements.push(statement);
        id
    }

    pub fn statement(&self, id: StatementId) -> Option<&Statement> {
        self.statements.get(id)
    }

    pub fn statement_mut(&mut self, id: StatementId) -> Option<&mut Statement> {
        self.statements.get_mut(id)
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> impl Iterator<Item = &mut Statement> {
        self.statements.iter_mut()
    }

    pub fn class(&self, title: &str) -> Option<&EquivalenceClass> {
        self.class_index.get(title).map(|&i| &self.classes[i])
    }

    pub fn class_mut(&mut self, title: &str) -> Option<&mut EquivalenceClass> {
        match self.class_index.get(title) {
            Some(&i) => self.classes.get_mut(i),
            None => None,
        }
    }

    /// Classes in first-seen order.
    pub fn classes(&self) -> &[EquivalenceClass] {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> impl Iterator<Item = &mut EquivalenceClass> {
        self.classes.iter_mut()
    }

    /// Statement occurrences of a class.
    pub fn members(&self, title: &str) -> impl Iterator<Item = &Statement> {
        self.class(title)
            .map(|c| c.members.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.statements.get(id))
    }

    /// Text of the first member that has any.
    pub fn class_text(&self, title: &str) -> Option<&str> {
        self.members(title).find_map(|s| s.text.as_deref())
    }

    // --- Arguments ---

    /// Get the argument with `title`, creating it if needed.
    pub fn ensure_argument(&mut self, title: &str) -> &mut Argument {
        let index = match self.argument_index.get(title) {
            Some(&index) => index,
            None => {
                let index = self.arguments.len();
                self.arguments.push(Argument::new(title, index));
                self.argument_index.insert(title.to_string(), index);
                index
            }
        };
        &mut self.arguments[index]
    }

    pub fn argument(&self, title: &str) -> Option<&Argument> {
        self.argument_index.get(title).map(|&i| &self.arguments[i])
    }

    pub fn argument_mut(&mut self, title: &str) -> Option<&mut Argument> {
        match self.argument_index.get(title) {
            Some(&i) => self.arguments.get_mut(i),
            None => None,
        }
    }

    /// Arguments in first-seen order.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> impl Iterator<Item = &mut Argument> {
        self.arguments.iter_mut()
    }

    /// Whether the referenced element exists.
    pub fn contains(&self, element: &ElementRef) -> bool {
        match element {
            ElementRef::Statement(t) => self.class_index.contains_key(t),
            ElementRef::Argument(t) => self.argument_index.contains_key(t),
        }
    }

    // --- Relations ---

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(id)
    }

    pub fn explicit_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(|r| r.origin.is_explicit())
    }

    /// Relations touching `element`, in creation order.
    pub fn relations_of<'a>(&'a self, element: &'a ElementRef) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| r.touches(element))
    }

    pub fn find_relation(
        &self,
        from: &ElementRef,
        to: &ElementRef,
        kind: RelationKind,
    ) -> Option<RelationId> {
        self.relations
            .iter()
            .find(|r| r.connects(from, to, kind))
            .map(|r| r.id)
    }

    /// Record a relation, merging it into an existing one with the same
    /// endpoints and kind. Returns the id of the stored relation.
    pub fn add_relation(
        &mut self,
        from: ElementRef,
        to: ElementRef,
        kind: RelationKind,
        origin: Origin,
        occurrence: Option<StatementId>,
    ) -> RelationId {
        let id = match self.find_relation(&from, &to, kind) {
            Some(id) => {
                let relation = &mut self.relations[id];
                if origin.is_explicit() {
                    relation.origin = Origin::Explicit;
                }
                if let Some(occurrence) = occurrence {
                    if !relation.occurrences.contains(&occurrence) {
                        relation.occurrences.push(occurrence);
                    }
                }
                id
            }
            None => {
                let id = self.relations.len();
                self.link_endpoint(&from, id);
                self.link_endpoint(&to, id);
                self.relations.push(Relation {
                    id,
                    from,
                    to,
                    kind,
                    origin,
                    occurrences: occurrence.into_iter().collect(),
                });
                id
            }
        };

        if let Some(statement) = occurrence.and_then(|o| self.statements.get_mut(o)) {
            if !statement.relations.contains(&id) {
                statement.relations.push(id);
            }
        }
        id
    }

    fn link_endpoint(&mut self, element: &ElementRef, id: RelationId) {
        let relations = match element {
            ElementRef::Statement(t) => self.class_mut(t).map(|c| &mut c.relations),
            ElementRef::Argument(t) => self.argument_mut(t).map(|a| &mut a.relations),
        };
        if let Some(relations) = relations {
            if !relations.contains(&id) {
                relations.push(id);
            }
        }
    }

    // --- Equivalence ---

    /// Declare two classes equivalent. Both must already exist.
    pub fn declare_equivalence(&mut self, first: &str, second: &str) {
        if first == second {
            return;
        }
        for (a, b) in [(first, second), (second, first)] {
            if let Some(class) = self.class_mut(a) {
                if !class.equivalent_to.iter().any(|t| t == b) {
                    class.equivalent_to.push(b.to_string());
                }
            }
        }
    }

    /// Map every class title to the title of the earliest class it is
    /// (transitively) declared equivalent to.
    pub fn equivalence_representatives(&self) -> HashMap<String, String> {
        let mut parent: Vec<usize> = (0..self.classes.len()).collect();

        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for (i, class) in self.classes.iter().enumerate() {
            for other in &class.equivalent_to {
                if let Some(&j) = self.class_index.get(other) {
                    let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                    // Classes are stored in first-seen order, so the smaller
                    // index is the earlier class.
                    if a < b {
                        parent[b] = a;
                    } else if b < a {
                        parent[a] = b;
                    }
                }
            }
        }

        (0..self.classes.len())
            .map(|i| {
                let root = find(&mut parent, i);
                (self.classes[i].title.clone(), self.classes[root].title.clone())
            })
            .collect()
    }

    // --- Integrity ---

    /// Check referential integrity between statements, classes and relations.
    pub fn verify(&self) -> Result<(), Vec<ModelError>> {
        let mut errors = Vec::new();

        for statement in &self.statements {
            let belongs = self
                .class(&statement.title)
                .map_or(false, |c| c.title == statement.title && c.members.contains(&statement.id));
            if !belongs {
                errors.push(ModelError::DanglingReference {
                    element: format!("[{}]", statement.title),
                });
            }
        }
        for relation in &self.relations {
            for end in [&relation.from, &relation.to] {
                if !self.contains(end) {
                    errors.push(ModelError::DanglingReference {
                        element: end.to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub(crate) fn merge_tags(into: &mut Vec<String>, tags: &[String]) {
    for tag in tags {
        if !into.contains(tag) {
            into.push(tag.clone());
        }
    }
}

/// Merge data without replacing keys that are already present.
pub(crate) fn merge_data(into: &mut Map<String, Value>, data: &Map<String, Value>) {
    for (key, value) in data {
        if !into.contains_key(key) {
            into.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(title: &str, tags: &[&str]) -> Statement {
        Statement::new(title, StatementRole::Top).with_tags(tags.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn statements_share_a_class() {
        let mut model = Model::new();
        let first = model.add_statement(statement("A", &["x"]).with_text("first"));
        let second = model.add_statement(statement("A", &["y", "x"]));
        model.add_statement(statement("B", &[]));

        assert_eq!(model.classes().len(), 2);
        let class = model.class("A").unwrap();
        assert_eq!(class.members, vec![first, second]);
        assert_eq!(class.tags, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(model.class_text("A"), Some("first"));
        assert_eq!(model.tags(), &["x".to_string(), "y".to_string()]);
        assert!(model.verify().is_ok());
    }

    #[test]
    fn first_data_value_wins() {
        let mut model = Model::new();
        let mut first = statement("A", &[]);
        first.data.insert("color".into(), Value::from("red"));
        let mut second = statement("A", &[]);
        second.data.insert("color".into(), Value::from("blue"));
        second.data.insert("isInMap".into(), Value::Bool(false));
        model.add_statement(first);
        model.add_statement(second);

        let class = model.class("A").unwrap();
        assert_eq!(class.data["color"], Value::from("red"));
        assert_eq!(class.flag("isInMap"), Some(false));
    }

    #[test]
    fn duplicate_relations_merge() {
        let mut model = Model::new();
        let a = model.add_statement(statement("A", &[]));
        let b = model.add_statement(statement("A", &[]));
        model.add_statement(statement("B", &[]));
        let from = ElementRef::Statement("A".into());
        let to = ElementRef::Statement("B".into());

        let r1 = model.add_relation(from.clone(), to.clone(), RelationKind::Attack, Origin::Explicit, Some(a));
        let r2 = model.add_relation(from, to, RelationKind::Attack, Origin::Explicit, Some(b));
        assert_eq!(r1, r2);
        assert_eq!(model.relations().len(), 1);
        assert_eq!(model.relations()[0].occurrences, vec![a, b]);
        assert_eq!(model.class("A").unwrap().relations, vec![r1]);
        assert_eq!(model.class("B").unwrap().relations, vec![r1]);
    }

    #[test]
    fn contradiction_stored_once() {
        let mut model = Model::new();
        model.add_statement(statement("A", &[]));
        model.add_statement(statement("B", &[]));
        let a = ElementRef::Statement("A".into());
        let b = ElementRef::Statement("B".into());
        model.add_relation(a.clone(), b.clone(), RelationKind::Contradiction, Origin::Explicit, None);
        model.add_relation(b, a, RelationKind::Contradiction, Origin::Explicit, None);
        assert_eq!(model.relations().len(), 1);
    }

    #[test]
    fn section_paths() {
        let mut model = Model::new();
        let x = model.add_section("X", 1, None, vec![], Map::new(), Span::default());
        let y = model.add_section("Y", 2, Some(x), vec![], Map::new(), Span::default());
        assert_eq!(model.section_titles(Some(y)), vec!["X".to_string(), "Y".to_string()]);
        assert!(model.section_titles(None).is_empty());
    }

    #[test]
    fn equivalence_representative_is_earliest() {
        let mut model = Model::new();
        for title in ["A", "B", "C", "D"] {
            model.add_statement(statement(title, &[]));
        }
        model.declare_equivalence("C", "B");
        model.declare_equivalence("B", "A");
        let reps = model.equivalence_representatives();
        assert_eq!(reps["C"], "A");
        assert_eq!(reps["B"], "A");
        assert_eq!(reps["D"], "D");
    }

    #[test]
    fn deserialization_rebuilds_indices() {
        let mut model = Model::new();
        model.add_statement(statement("A", &[]));
        model.ensure_argument("Arg");
        let json = serde_json::to_string(&model).unwrap();
        let back: Model = serde_json::from_str(&json).unwrap();
        assert!(back.class("A").is_some());
        assert!(back.argument("Arg").is_some());
        assert_eq!(back, model);
    }

    #[test]
    fn dangling_relation_is_reported() {
        let mut model = Model::new();
        model.add_statement(statement("A", &[]));
        model.add_relation(
            ElementRef::Statement("A".into()),
            ElementRef::Argument("Missing".into()),
            RelationKind::Support,
            Origin::Explicit,
            None,
        );
        let errors = model.verify().unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn clearing_sections_detaches_elements() {
        let mut model = Model::new();
        let x = model.add_section("X", 1, None, vec![], Map::new(), Span::default());
        model.add_statement(statement("A", &[]).with_section(Some(x)));
        model.ensure_argument("Arg").section = Some(x);

        model.clear_sections();
        assert!(model.sections().is_empty());
        assert_eq!(model.class("A").unwrap().section, None);
        assert_eq!(model.members("A").next().unwrap().section, None);
        assert_eq!(model.argument("Arg").unwrap().section, None);
    }
}
