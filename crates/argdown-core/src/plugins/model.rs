//! `build-model`: syntax tree to semantic model.

use argdown_engine::{
    ArgdownError, Capabilities, Logger, Plugin, PluginSettings, Request, Response, ResponseField,
};
use argdown_model::{
    ConflictPolicy, ElementRef, Model, ModelError, Origin, PcsRole, PcsStep, RelationKind,
    SectionId, Statement, StatementId, StatementRole,
};
use argdown_parser::{
    ArgumentNode, Block, Document, Element, ElementBlock, Heading, Pcs, PcsItem, RelationMarker,
    RelationNode, StatementNode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings of the `model` namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Strip `#tag` annotations from statement text and argument descriptions.
    pub remove_tags_from_text: bool,
    pub relation_conflict_policy: ConflictPolicy,
    /// Split arguments with intermediary conclusions into one argument per
    /// inference.
    pub explode_arguments: bool,
}

impl PluginSettings for ModelSettings {
    const NAMESPACE: &'static str = "model";
}

/// Builds `response.model` from `response.ast`.
#[derive(Debug, Default)]
pub struct ModelPlugin;

impl Plugin for ModelPlugin {
    fn name(&self) -> &str {
        "model"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PREPARE_AND_RUN
    }

    fn required_fields(&self) -> Vec<ResponseField> {
        vec![ResponseField::Ast]
    }

    fn prepare(&self, request: &mut Request, _: &Response) -> Result<(), ArgdownError> {
        request.prepare_settings::<ModelSettings>()?;
        Ok(())
    }

    fn run(&self, request: &Request, response: &mut Response, logger: &Logger) -> Result<(), ArgdownError> {
        let settings = request.settings::<ModelSettings>()?;
        let Some(document) = response.ast.as_ref() else {
            return Err(ArgdownError::MissingDependency {
                plugin: self.name().to_string(),
                field: ResponseField::Ast.to_string(),
            });
        };

        let (model, errors) = build_model(document, &settings);
        debug!(
            classes = model.classes().len(),
            arguments = model.arguments().len(),
            relations = model.relations().len(),
            errors = errors.len(),
            "built model"
        );
        response.model = Some(model);

        if request.throw_exceptions {
            if let Some(first) = errors.into_iter().next() {
                return Err(first.into());
            }
            return Ok(());
        }
        for error in errors {
            logger.error(&error.to_string());
            response.exceptions.push(error.into());
        }
        Ok(())
    }
}

/// Walk `document` and build its model. Declarations that cause a
/// [`ModelError`] are skipped; the rest of the document is still built.
pub fn build_model(document: &Document, settings: &ModelSettings) -> (Model, Vec<ModelError>) {
    let mut builder = ModelBuilder {
        model: Model::new(),
        settings,
        sections: Vec::new(),
        untitled_statements: 0,
        untitled_arguments: 0,
        equivalences: Vec::new(),
        errors: Vec::new(),
    };
    for block in &document.blocks {
        match block {
            Block::Heading(heading) => builder.open_section(heading),
            Block::Element(element) => builder.add_block(element),
        }
    }
    builder.check_equivalences();

    let ModelBuilder {
        model, mut errors, ..
    } = builder;
    if let Err(integrity) = model.verify() {
        errors.extend(integrity);
    }
    (model, errors)
}

struct ModelBuilder<'a> {
    model: Model,
    settings: &'a ModelSettings,
    /// Open sections, outermost first.
    sections: Vec<SectionId>,
    untitled_statements: usize,
    untitled_arguments: usize,
    /// Declared equivalences, checked once all relations are known.
    equivalences: Vec<(String, String)>,
    errors: Vec<ModelError>,
}

impl ModelBuilder<'_> {
    fn current_section(&self) -> Option<SectionId> {
        self.sections.last().copied()
    }

    // --- Sections ---

    fn open_section(&mut self, heading: &Heading) {
        while let Some(&open) = self.sections.last() {
            match self.model.section(open) {
                Some(section) if section.level >= heading.level => {
                    self.sections.pop();
                }
                _ => break,
            }
        }
        let id = self.model.add_section(
            heading.title.clone(),
            heading.level,
            self.current_section(),
            heading.tags.clone(),
            heading.data.clone().unwrap_or_default(),
            heading.span,
        );
        self.sections.push(id);
    }

    // --- Elements ---

    fn add_block(&mut self, block: &ElementBlock) {
        let (parent, occurrence) = match &block.element {
            Element::Statement(node) => {
                let (title, id) = self.add_statement(node, StatementRole::Top);
                (ElementRef::Statement(title), Some(id))
            }
            Element::Argument(node) => {
                let title = self.add_argument(node);
                if let Some(pcs) = &block.pcs {
                    self.add_pcs(&title, pcs);
                }
                (ElementRef::Argument(title), None)
            }
        };
        self.add_relations(&parent, occurrence, &block.relations);
    }

    fn add_element(&mut self, element: &Element, role: StatementRole) -> (ElementRef, Option<StatementId>) {
        match element {
            Element::Statement(node) => {
                let (title, id) = self.add_statement(node, role);
                (ElementRef::Statement(title), Some(id))
            }
            Element::Argument(node) => (ElementRef::Argument(self.add_argument(node)), None),
        }
    }

    fn add_statement(&mut self, node: &StatementNode, role: StatementRole) -> (String, StatementId) {
        let (title, auto_titled) = match &node.title {
            Some(title) => (title.clone(), false),
            None => {
                self.untitled_statements += 1;
                (format!("Untitled {}", self.untitled_statements), true)
            }
        };

        let mut statement = Statement::new(title.clone(), role)
            .with_section(self.current_section())
            .with_tags(node.tags.clone());
        statement.text = node.text.as_deref().map(|t| self.clean_text(t, &node.tags));
        statement.is_reference = node.is_reference;
        statement.mentions = node.mentions.clone();
        statement.data = node.data.clone().unwrap_or_default();
        statement.span = node.span;

        let id = self.model.add_statement(statement);
        if auto_titled {
            if let Some(class) = self.model.class_mut(&title) {
                class.is_auto_titled = true;
            }
        }
        (title, id)
    }

    fn add_argument(&mut self, node: &ArgumentNode) -> String {
        let (title, auto_titled) = match &node.title {
            Some(title) => (title.clone(), false),
            None => {
                self.untitled_arguments += 1;
                (format!("Untitled {}", self.untitled_arguments), true)
            }
        };
        let is_new = self.model.argument(&title).is_none();
        let section = self.current_section();
        let description = node
            .description
            .as_deref()
            .map(|d| self.clean_text(d, &node.tags));

        let argument = self.model.ensure_argument(&title);
        if is_new {
            argument.section = section;
            argument.span = node.span;
            argument.is_auto_titled = auto_titled;
        }
        if let Some(description) = description {
            if !argument.descriptions.contains(&description) {
                argument.descriptions.push(description);
            }
        }
        argument.add_tags(&node.tags);
        if let Some(data) = &node.data {
            argument.add_data(data);
        }
        self.model.record_tags(&node.tags);
        title
    }

    fn clean_text(&self, text: &str, tags: &[String]) -> String {
        if self.settings.remove_tags_from_text {
            remove_tags(text, tags)
        } else {
            text.to_string()
        }
    }

    // --- Premise-conclusion structures ---

    fn add_pcs(&mut self, argument: &str, pcs: &Pcs) {
        let statements: Vec<_> = pcs.statements().collect();
        let last = statements.len().saturating_sub(1);

        // Role of each numbered statement, with the inference leading to it.
        let mut roles = Vec::with_capacity(statements.len());
        let mut inference: Option<Option<String>> = None;
        for item in &pcs.items {
            match item {
                PcsItem::Inference(i) => inference = Some(i.text.clone()),
                PcsItem::Statement(_) => {
                    let index = roles.len();
                    let role = match inference.take() {
                        None => (PcsRole::Premise, None),
                        Some(text) if index == last => (PcsRole::MainConclusion, text),
                        Some(text) => (PcsRole::IntermediaryConclusion, text),
                    };
                    roles.push(role);
                }
            }
        }

        let existing = self
            .model
            .argument(argument)
            .map(|a| a.pcs.clone())
            .unwrap_or_default();
        if !existing.is_empty() {
            let same = existing.len() == statements.len()
                && existing.iter().zip(&statements).zip(&roles).all(|((step, s), (role, _))| {
                    s.statement.title.as_deref() == Some(step.title.as_str()) && step.role == *role
                });
            if !same {
                self.errors.push(ModelError::ConflictingPcs {
                    argument: argument.to_string(),
                });
            }
            return;
        }

        let mut steps = Vec::with_capacity(statements.len());
        for (item, (role, inference)) in statements.iter().zip(roles) {
            let number = item.number;
            let statement_role = match role {
                PcsRole::Premise => StatementRole::Premise {
                    argument: argument.to_string(),
                    number,
                },
                PcsRole::IntermediaryConclusion => StatementRole::IntermediaryConclusion {
                    argument: argument.to_string(),
                    number,
                },
                PcsRole::MainConclusion => StatementRole::Conclusion {
                    argument: argument.to_string(),
                    number,
                },
            };
            let (title, id) = self.add_statement(&item.statement, statement_role);
            self.add_relations(&ElementRef::Statement(title.clone()), Some(id), &item.relations);
            steps.push(PcsStep {
                number,
                title,
                role,
                inference,
            });
        }
        if let Some(argument) = self.model.argument_mut(argument) {
            argument.pcs = steps;
        }
    }

    // --- Relations ---

    fn add_relations(&mut self, parent: &ElementRef, occurrence: Option<StatementId>, nodes: &[RelationNode]) {
        for node in nodes {
            let (target, target_occurrence) = self.add_element(&node.target, StatementRole::RelationTarget);
            self.add_relation(parent, &target, node.marker, target_occurrence.or(occurrence));
            self.add_relations(&target, target_occurrence, &node.children);
        }
    }

    fn add_relation(
        &mut self,
        parent: &ElementRef,
        target: &ElementRef,
        marker: RelationMarker,
        occurrence: Option<StatementId>,
    ) {
        if parent == target {
            self.errors.push(ModelError::SelfRelation {
                element: parent.to_string(),
            });
            return;
        }

        let kind = match marker {
            RelationMarker::Support
            | RelationMarker::OutgoingSupport
            | RelationMarker::IncomingSupport => RelationKind::Support,
            RelationMarker::Attack | RelationMarker::OutgoingAttack | RelationMarker::IncomingAttack => {
                RelationKind::Attack
            }
            RelationMarker::Contradiction => RelationKind::Contradiction,
            RelationMarker::OutgoingUndercut | RelationMarker::IncomingUndercut => RelationKind::Undercut,
            RelationMarker::Equivalence => {
                match (parent, target) {
                    (ElementRef::Statement(a), ElementRef::Statement(b)) => {
                        self.model.declare_equivalence(a, b);
                        self.equivalences.push((a.clone(), b.clone()));
                    }
                    (ElementRef::Argument(a), _) | (_, ElementRef::Argument(a)) => {
                        self.errors.push(ModelError::EquivalenceWithArgument { argument: a.clone() });
                    }
                }
                return;
            }
        };

        let (from, to) = if marker.is_incoming() {
            (target.clone(), parent.clone())
        } else {
            (parent.clone(), target.clone())
        };
        self.model.add_relation(from, to, kind, Origin::Explicit, occurrence);
    }

    /// Equivalent statements may not attack or contradict each other.
    fn check_equivalences(&mut self) {
        for (first, second) in std::mem::take(&mut self.equivalences) {
            let a = ElementRef::Statement(first.clone());
            let b = ElementRef::Statement(second.clone());
            let conflict = self
                .model
                .relations()
                .iter()
                .filter(|r| r.origin.is_explicit())
                .filter(|r| matches!(r.kind, RelationKind::Attack | RelationKind::Contradiction))
                .find(|r| r.connects(&a, &b, r.kind) || r.connects(&b, &a, r.kind));
            if let Some(relation) = conflict {
                let relation = match relation.kind {
                    RelationKind::Contradiction => "contradict",
                    _ => "attack",
                };
                let error = ModelError::ConflictingEquivalence {
                    first,
                    second,
                    relation: relation.to_string(),
                };
                if !self.errors.contains(&error) {
                    self.errors.push(error);
                }
            }
        }
    }
}

/// Remove `#tag` and `#(long tag)` annotations for `tags` from `text`.
pub fn remove_tags(text: &str, tags: &[String]) -> String {
    let mut cleaned = text.to_string();
    for tag in tags {
        cleaned = cleaned.replace(&format!("#({tag})"), " ");
        if !tag.contains(char::is_whitespace) {
            cleaned = cleaned
                .split_whitespace()
                .filter(|word| *word != format!("#{tag}"))
                .collect::<Vec<_>>()
                .join(" ");
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use argdown_parser::parse;

    fn build(input: &str) -> (Model, Vec<ModelError>) {
        let output = parse(input);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        build_model(&output.document, &ModelSettings::default())
    }

    #[test]
    fn relations_are_directed_from_the_enclosing_element() {
        let (model, errors) = build("[B]: b text\n\n<A>: a text\n  - [B]\n  + <C>: c text");
        assert!(errors.is_empty());
        assert_eq!(model.classes().len(), 1);
        assert_eq!(model.arguments().len(), 2);
        assert_eq!(model.relations().len(), 2);

        let attack = &model.relations()[0];
        assert_eq!(attack.from, ElementRef::Argument("A".into()));
        assert_eq!(attack.to, ElementRef::Statement("B".into()));
        assert_eq!(attack.kind, RelationKind::Attack);
        let support = &model.relations()[1];
        assert_eq!(support.to, ElementRef::Argument("C".into()));
        assert_eq!(support.kind, RelationKind::Support);
    }

    #[test]
    fn incoming_markers_reverse_direction() {
        let (model, _) = build("[A]: a\n  <+ [B]: b\n  <- [C]: c\n  <_ <D>");
        let kinds: Vec<_> = model
            .relations()
            .iter()
            .map(|r| (r.from.title().to_string(), r.to.title().to_string(), r.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("B".into(), "A".into(), RelationKind::Support),
                ("C".into(), "A".into(), RelationKind::Attack),
                ("D".into(), "A".into(), RelationKind::Undercut),
            ]
        );
    }

    #[test]
    fn later_occurrences_merge_without_replacing() {
        let (model, _) = build("[A]: first #x {k: 1}\n\n[A]: second #y {k: 2, j: 3}");
        let class = model.class("A").unwrap();
        assert_eq!(class.members.len(), 2);
        assert_eq!(class.tags, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(class.data["k"], 1);
        assert_eq!(class.data["j"], 3);
        assert_eq!(model.class_text("A"), Some("first #x"));
    }

    #[test]
    fn sections_follow_headings() {
        let (model, _) = build("# X\n\n[A]: a\n\n## Y\n\n[B]: b\n\n# Z\n\n[C]: c");
        let section = |title: &str| model.section_titles(model.class(title).unwrap().section);
        assert_eq!(section("A"), vec!["X"]);
        assert_eq!(section("B"), vec!["X", "Y"]);
        assert_eq!(section("C"), vec!["Z"]);
    }

    #[test]
    fn untitled_elements_get_numbered_titles() {
        let (model, _) = build("just a claim\n\n(1) p\n----\n(2) c");
        assert!(model.class("Untitled 1").unwrap().is_auto_titled);
        assert!(model.argument("Untitled 1").unwrap().is_auto_titled);
        assert!(model.class("Untitled 3").is_some());
    }

    #[test]
    fn pcs_roles() {
        let (model, errors) = build(
            "<A>: a\n\n(1) [P]: p\n(2) [Q]: q\n-- modus ponens --\n(3) [I]: i\n----\n(4) [C]: c",
        );
        assert!(errors.is_empty());
        let argument = model.argument("A").unwrap();
        let roles: Vec<_> = argument.pcs.iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec![
                PcsRole::Premise,
                PcsRole::Premise,
                PcsRole::IntermediaryConclusion,
                PcsRole::MainConclusion
            ]
        );
        assert_eq!(argument.pcs[2].inference.as_deref(), Some("modus ponens"));
        assert_eq!(argument.main_conclusion().unwrap().title, "C");
        assert!(model.class("P").unwrap().is_used_as_premise);
        assert!(model.class("C").unwrap().is_used_as_conclusion);
    }

    #[test]
    fn conflicting_pcs_keeps_first() {
        let (model, errors) = build("<A>\n\n(1) [P]: p\n----\n(2) [C]: c\n\n<A>\n\n(1) [Q]: q\n----\n(2) [C]");
        assert_eq!(
            errors,
            vec![ModelError::ConflictingPcs {
                argument: "A".into()
            }]
        );
        assert_eq!(model.argument("A").unwrap().pcs[0].title, "P");
    }

    #[test]
    fn equivalence_errors() {
        let (_, errors) = build("[A]: a\n  = [B]: b\n  - [B]");
        assert!(matches!(errors[0], ModelError::ConflictingEquivalence { .. }));

        let (_, errors) = build("[A]: a\n  = <B>");
        assert_eq!(
            errors,
            vec![ModelError::EquivalenceWithArgument {
                argument: "B".into()
            }]
        );

        let (model, errors) = build("[A]: a\n  = [B]: b");
        assert!(errors.is_empty());
        assert_eq!(model.class("A").unwrap().equivalent_to, vec!["B".to_string()]);
        assert!(model.relations().is_empty());
    }

    #[test]
    fn self_relation_is_rejected() {
        let (model, errors) = build("[A]: a\n  + [A]");
        assert_eq!(errors, vec![ModelError::SelfRelation { element: "[A]".into() }]);
        assert!(model.relations().is_empty());
    }

    #[test]
    fn tags_can_be_removed_from_text() {
        let output = parse("[A]: a claim #pro #(very long)");
        let settings = ModelSettings {
            remove_tags_from_text: true,
            ..ModelSettings::default()
        };
        let (model, _) = build_model(&output.document, &settings);
        assert_eq!(model.class_text("A"), Some("a claim"));
        assert_eq!(model.class("A").unwrap().tags.len(), 2);
    }

    #[test]
    fn every_statement_belongs_to_its_class() {
        let (model, errors) = build("[A]: a\n  + [B]: b\n    - <C>\n\n<C>\n\n(1) [A]\n----\n(2) [D]: d");
        assert!(errors.is_empty());
        for statement in model.statements() {
            let class = model.class(&statement.title).unwrap();
            assert_eq!(class.title, statement.title);
            assert!(class.members.contains(&statement.id));
        }
    }
}
