//! Implicit relations computed from explicitly declared ones.
//!
//! Every rule reads only explicit relations, so the set of candidate
//! relations depends on the explicit input alone. Candidates are deduplicated
//! against everything already stored, which makes [`derive_relations`]
//! idempotent.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Model;
use crate::relation::{DerivationRule, ElementRef, Origin, RelationKind};

/// What to do with a derived relation when an explicit relation of another
/// kind already connects the same directed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Skip the derived relation.
    #[default]
    ExplicitWins,
    /// Keep both; only exact duplicates are skipped.
    KeepAll,
}

/// Counts of relations added by one derivation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationStats {
    pub conclusion_promotion: usize,
    pub premise_attack: usize,
    pub argument_conclusion: usize,
    pub reciprocal: usize,
    /// Candidates skipped because an explicit relation of another kind exists.
    pub conflicts_skipped: usize,
}

impl DerivationStats {
    pub fn total(&self) -> usize {
        self.conclusion_promotion + self.premise_attack + self.argument_conclusion + self.reciprocal
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    from: ElementRef,
    to: ElementRef,
    kind: RelationKind,
    rule: DerivationRule,
}

/// Add derived relations to the model.
pub fn derive_relations(model: &mut Model, policy: ConflictPolicy) -> DerivationStats {
    let candidates = collect_candidates(model);
    let mut stats = DerivationStats::default();

    for candidate in candidates {
        if candidate.from == candidate.to {
            continue;
        }
        if model
            .find_relation(&candidate.from, &candidate.to, candidate.kind)
            .is_some()
        {
            continue;
        }
        if policy == ConflictPolicy::ExplicitWins && has_explicit_between(model, &candidate) {
            stats.conflicts_skipped += 1;
            continue;
        }

        model.add_relation(
            candidate.from,
            candidate.to,
            candidate.kind,
            Origin::Derived(candidate.rule),
            None,
        );
        match candidate.rule {
            DerivationRule::ConclusionPromotion => stats.conclusion_promotion += 1,
            DerivationRule::PremiseAttack => stats.premise_attack += 1,
            DerivationRule::ArgumentConclusion => stats.argument_conclusion += 1,
            DerivationRule::Reciprocal => stats.reciprocal += 1,
        }
    }

    debug!(
        added = stats.total(),
        conflicts_skipped = stats.conflicts_skipped,
        "derived relations"
    );
    stats
}

fn has_explicit_between(model: &Model, candidate: &Candidate) -> bool {
    model.explicit_relations().any(|r| {
        (r.from == candidate.from && r.to == candidate.to)
            || (r.kind.is_symmetric() && r.from == candidate.to && r.to == candidate.from)
    })
}

fn collect_candidates(model: &Model) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let explicit: Vec<_> = model.explicit_relations().collect();

    for argument in model.arguments() {
        let this = ElementRef::Argument(argument.title.clone());
        let conclusion = argument.main_conclusion().map(|c| ElementRef::Statement(c.title.clone()));

        // Conclusion promotion: the argument relates to whatever its main
        // conclusion relates to.
        if let Some(conclusion) = &conclusion {
            for relation in &explicit {
                let target = match relation.kind {
                    RelationKind::Contradiction => relation.other_end(conclusion),
                    _ if &relation.from == conclusion => Some(&relation.to),
                    _ => None,
                };
                let kind = match relation.kind {
                    RelationKind::Support | RelationKind::Entails => RelationKind::Support,
                    RelationKind::Attack | RelationKind::Contradiction => RelationKind::Attack,
                    RelationKind::Undercut => continue,
                };
                if let Some(target) = target {
                    if target != &this {
                        candidates.push(Candidate {
                            from: this.clone(),
                            to: target.clone(),
                            kind,
                            rule: DerivationRule::ConclusionPromotion,
                        });
                    }
                }
            }
        }

        // Premise attack: attacking or contradicting a premise attacks the argument.
        for premise in argument.premises() {
            let premise = ElementRef::Statement(premise.title.clone());
            for relation in &explicit {
                let attacker = match relation.kind {
                    RelationKind::Attack if relation.to == premise => Some(&relation.from),
                    RelationKind::Contradiction => relation.other_end(&premise),
                    _ => None,
                };
                if let Some(attacker) = attacker {
                    if attacker != &this {
                        candidates.push(Candidate {
                            from: attacker.clone(),
                            to: this.clone(),
                            kind: RelationKind::Attack,
                            rule: DerivationRule::PremiseAttack,
                        });
                    }
                }
            }
        }

        // Argument to conclusion: the argument's own relations to other
        // statements are carried by its main conclusion.
        if let Some(conclusion) = &conclusion {
            for relation in explicit.iter().filter(|r| r.from == this) {
                if !relation.to.is_statement() || &relation.to == conclusion {
                    continue;
                }
                let kind = match relation.kind {
                    RelationKind::Support => RelationKind::Entails,
                    RelationKind::Attack => RelationKind::Attack,
                    _ => continue,
                };
                candidates.push(Candidate {
                    from: conclusion.clone(),
                    to: relation.to.clone(),
                    kind,
                    rule: DerivationRule::ArgumentConclusion,
                });
            }
        }
    }

    // Reciprocity between statements.
    for relation in &explicit {
        let reciprocal = matches!(relation.kind, RelationKind::Support | RelationKind::Attack);
        if reciprocal && relation.from.is_statement() && relation.to.is_statement() {
            candidates.push(Candidate {
                from: relation.to.clone(),
                to: relation.from.clone(),
                kind: relation.kind,
                rule: DerivationRule::Reciprocal,
            });
        }
    }

    candidates
}
