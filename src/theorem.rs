use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::conjunct::{Conjunct, ConjunctId, Justification, Role};
use crate::error::TheoryError;
use crate::expression::Expression;
use crate::syntax::parse_expression;
use crate::transformation::{Source, Transformation, TransformationKind};

/// A named fact that holds everywhere.
#[derive(Clone, Debug)]
pub struct Theorem {
    pub name: String,
    pub assertion: Expression,
}

impl Theorem {
    pub fn new(name: &str, assertion: Expression) -> Theorem {
        Theorem {
            name: name.to_string(),
            assertion,
        }
    }

    pub fn parse(name: &str, text: &str) -> Result<Theorem, TheoryError> {
        let assertion = parse_expression(text).map_err(|e| TheoryError::Parse {
            theorem: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Theorem::new(name, assertion))
    }

    /// Checks the theorem, recording symbol arities into a map shared across theorems.
    fn validate(&self, arities: &mut HashMap<String, usize>) -> Result<(), TheoryError> {
        if self.name.trim().is_empty() {
            return Err(TheoryError::EmptyName);
        }
        if self.assertion.contains_existential() {
            return Err(TheoryError::ExistentialInTheorem {
                theorem: self.name.clone(),
            });
        }
        if let Some((symbol, first, second)) = self.assertion.find_arity_conflict(arities) {
            return Err(TheoryError::InconsistentArity {
                theorem: self.name.clone(),
                symbol,
                first,
                second,
            });
        }
        Ok(())
    }

    /// Compiles the theorem into the transformations it licenses.
    pub fn compile(&self) -> Result<Vec<Transformation>, TheoryError> {
        self.validate(&mut HashMap::new())?;
        Ok(compile_assertion(
            &self.assertion,
            Source::Theorem(self.name.clone()),
        ))
    }
}

// A bare variable pattern would match every sub-expression everywhere.
fn is_usable_pattern(pattern: &Expression) -> bool {
    !pattern.is_quantified_variable()
}

/// The transformations licensed by a true assertion.
///
/// An equality rewrites in both directions, in the goal, in the givens, and by adding
/// rewritten givens. An implication strengthens goals and extends givens. Anything else can
/// only discharge goals that are instances of it.
pub fn compile_assertion(assertion: &Expression, source: Source) -> Vec<Transformation> {
    use TransformationKind::*;
    let mut answer = vec![];
    if assertion.is_equality() {
        let args = assertion.args();
        for (pattern, template) in [(&args[0], &args[1]), (&args[1], &args[0])] {
            if !is_usable_pattern(pattern) {
                continue;
            }
            let (pattern, template) = (pattern.clone(), template.clone());
            answer.push(Transformation::new(
                SubstituteInPlaceInConsequent {
                    pattern: pattern.clone(),
                    template: template.clone(),
                },
                source.clone(),
            ));
            answer.push(Transformation::new(
                SubstituteInPlaceInAntecedent {
                    pattern: pattern.clone(),
                    template: template.clone(),
                },
                source.clone(),
            ));
            answer.push(Transformation::new(
                ExpandAntecedentBySubstitution { pattern, template },
                source.clone(),
            ));
        }
        if assertion.has_quantified_variables() {
            answer.push(Transformation::new(
                ReplaceTheoremInConsequentWithTrue {
                    theorem: assertion.clone(),
                },
                source,
            ));
        }
    } else if assertion.is_implication() {
        let args = assertion.args();
        let antecedents = args[0].split_into_conjuncts();
        let consequents = args[1].split_into_conjuncts();
        if consequents.iter().all(is_usable_pattern) {
            answer.push(Transformation::new(
                StrengthenConsequent {
                    antecedents: antecedents.clone(),
                    consequents,
                },
                source.clone(),
            ));
        }
        if antecedents.iter().all(is_usable_pattern) {
            answer.push(Transformation::new(
                ExpandAntecedentByImplication {
                    antecedents,
                    consequent: args[1].clone(),
                },
                source,
            ));
        }
    } else {
        // Any other fact discharges consequents it matches.
        for conjunct in assertion.split_into_conjuncts() {
            if is_usable_pattern(&conjunct) {
                answer.push(Transformation::new(
                    ReplaceTheoremInConsequentWithTrue { theorem: conjunct },
                    source.clone(),
                ));
            }
        }
    }
    answer
}

/// Orders transformations by how promising they are: those that introduce no new variables
/// first, then those that shrink things the most. The sort is stable.
pub fn rank_by_fitness(transformations: &mut [Arc<Transformation>]) {
    transformations.sort_by_key(|t| {
        (
            t.introduces_quantified_variables(),
            t.function_application_delta(),
        )
    });
}

/// The global theorems, with their conjuncts and compiled transformations.
/// Built once and shared read-only by every proof state.
pub struct TheoremLibrary {
    theorems: Vec<Theorem>,
    conjuncts: Vec<Conjunct>,
    transformations: Vec<Arc<Transformation>>,
}

impl TheoremLibrary {
    pub fn new(theorems: Vec<Theorem>) -> Result<TheoremLibrary, TheoryError> {
        let mut arities = HashMap::new();
        let mut conjuncts = vec![];
        let mut transformations = vec![];
        for theorem in &theorems {
            theorem.validate(&mut arities)?;
            for part in theorem.assertion.split_into_conjuncts() {
                let id = ConjunctId(conjuncts.len() as u32);
                conjuncts.push(Conjunct::new(
                    id,
                    Role::GlobalTheorem,
                    part,
                    Justification::Theorem(theorem.name.clone()),
                ));
            }
            let compiled = compile_assertion(
                &theorem.assertion,
                Source::Theorem(theorem.name.clone()),
            );
            debug!(
                theorem = %theorem.name,
                transformations = compiled.len(),
                "compiled theorem"
            );
            transformations.extend(compiled.into_iter().map(Arc::new));
        }
        Ok(TheoremLibrary {
            theorems,
            conjuncts,
            transformations,
        })
    }

    pub fn empty() -> TheoremLibrary {
        TheoremLibrary {
            theorems: vec![],
            conjuncts: vec![],
            transformations: vec![],
        }
    }

    /// Builds a library from (name, assertion text) pairs.
    pub fn parse(theorems: &[(&str, &str)]) -> Result<TheoremLibrary, TheoryError> {
        let theorems = theorems
            .iter()
            .map(|(name, text)| Theorem::parse(name, text))
            .collect::<Result<Vec<_>, _>>()?;
        TheoremLibrary::new(theorems)
    }

    pub fn theorems(&self) -> &[Theorem] {
        &self.theorems
    }

    pub fn conjuncts(&self) -> &[Conjunct] {
        &self.conjuncts
    }

    pub fn transformations(&self) -> &[Arc<Transformation>] {
        &self.transformations
    }

    /// The transformations used to search for a proof: the ones that can't affect the
    /// antecedent, best first.
    pub fn search_transformations(&self) -> Vec<Arc<Transformation>> {
        let mut answer: Vec<_> = self
            .transformations
            .iter()
            .filter(|t| !t.could_affect_antecedent())
            .cloned()
            .collect();
        rank_by_fitness(&mut answer);
        answer
    }

    /// Equivalent, shrinking rewrites that don't introduce variables, filtered by role.
    pub fn reducing_transformations(&self, role: Role) -> Vec<Arc<Transformation>> {
        self.transformations
            .iter()
            .filter(|t| t.is_strictly_reducing())
            .filter(|t| match (&t.kind, role) {
                (TransformationKind::SubstituteInPlaceInConsequent { .. }, Role::Consequent) => true,
                (TransformationKind::SubstituteInPlaceInAntecedent { .. }, Role::LocalTheorem) => {
                    true
                }
                _ => false,
            })
            .cloned()
            .collect()
    }

    /// Transformations that add givens without adding new variables.
    pub fn expansion_transformations(&self) -> Vec<Arc<Transformation>> {
        self.transformations
            .iter()
            .filter(|t| t.is_antecedent_expansion() && !t.introduces_quantified_variables())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformation::Equivalence;

    fn kinds(ts: &[Transformation]) -> Vec<String> {
        ts.iter()
            .map(|t| match &t.kind {
                TransformationKind::SubstituteInPlaceInConsequent { .. } => "consequent",
                TransformationKind::SubstituteInPlaceInAntecedent { .. } => "antecedent",
                TransformationKind::ExpandAntecedentBySubstitution { .. } => "expand",
                TransformationKind::ExpandAntecedentByImplication { .. } => "implication",
                TransformationKind::StrengthenConsequent { .. } => "strengthen",
                TransformationKind::ReplaceTheoremInConsequentWithTrue { .. } => "true",
                _ => "other",
            })
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_compile_equality() {
        let compiled = Theorem::parse("plus_zero", "?x + 0 = ?x").unwrap().compile().unwrap();

        // The direction with a bare variable pattern is left out.
        assert_eq!(kinds(&compiled), vec!["consequent", "antecedent", "expand", "true"]);
        assert!(compiled.iter().all(|t| t.equivalence() == Equivalence::Equivalent));
        assert!(compiled[0].is_strictly_reducing());
    }

    #[test]
    fn test_compile_equality_both_directions() {
        let compiled = Theorem::parse("comm", "?a + ?b = ?b + ?a").unwrap().compile().unwrap();
        assert_eq!(compiled.len(), 7);
    }

    #[test]
    fn test_compile_implication() {
        let compiled = Theorem::parse("trans", "?a < ?b and ?b < ?c implies ?a < ?c")
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(kinds(&compiled), vec!["strengthen", "implication"]);
        assert_eq!(compiled[0].equivalence(), Equivalence::Stronger);
        assert_eq!(compiled[1].equivalence(), Equivalence::Weaker);
    }

    #[test]
    fn test_compile_other() {
        let compiled = Theorem::parse("refl", "?x <= ?x").unwrap().compile().unwrap();
        assert_eq!(kinds(&compiled), vec!["true"]);
        let compiled = Theorem::parse("fact", "p(a)").unwrap().compile().unwrap();
        assert_eq!(kinds(&compiled), vec!["true"]);
        assert!(!compiled[0].could_affect_antecedent());
    }

    #[test]
    fn test_malformed_theorems() {
        assert_eq!(
            Theorem::parse("bad", "f(?x) = f(?x, ?x)").unwrap().compile().unwrap_err(),
            TheoryError::InconsistentArity {
                theorem: "bad".to_string(),
                symbol: "f".to_string(),
                first: 1,
                second: 2,
            }
        );
        assert!(matches!(
            Theorem::parse("ex", "p(@x)").unwrap().compile(),
            Err(TheoryError::ExistentialInTheorem { .. })
        ));
        assert_eq!(
            Theorem::parse("", "p").unwrap().compile().unwrap_err(),
            TheoryError::EmptyName
        );
        assert!(matches!(
            Theorem::parse("broken", "p(").unwrap_err(),
            TheoryError::Parse { .. }
        ));
    }

    #[test]
    fn test_arities_are_consistent_across_the_library() {
        let result = TheoremLibrary::parse(&[("one", "f(?x) = ?x"), ("two", "f(?x, ?y) = ?x")]);
        assert!(matches!(
            result,
            Err(TheoryError::InconsistentArity { theorem, .. }) if theorem == "two"
        ));
    }

    #[test]
    fn test_library_conjuncts() {
        let library = TheoremLibrary::parse(&[("facts", "p(a) and q(b)"), ("r", "?x = ?x")]).unwrap();
        assert_eq!(library.conjuncts().len(), 3);
        assert_eq!(library.conjuncts()[2].id, ConjunctId(2));
        assert_eq!(library.conjuncts()[1].role, Role::GlobalTheorem);
    }

    #[test]
    fn test_fitness_ranking() {
        let library = TheoremLibrary::parse(&[
            ("grow", "?x = ?x * 1"),
            ("split", "?x * ?y = ?y * ?x"),
            ("shrink", "?x + 0 = ?x"),
        ])
        .unwrap();
        let ranked = library.search_transformations();
        assert!(ranked.iter().all(|t| !t.could_affect_antecedent()));
        let deltas: Vec<i64> = ranked.iter().map(|t| t.function_application_delta()).collect();
        let mut sorted = deltas.clone();
        sorted.sort();
        assert_eq!(deltas, sorted);
        assert!(ranked[0].is_strictly_reducing());
    }

    #[test]
    fn test_reducing_transformations() {
        let library = TheoremLibrary::parse(&[("shrink", "?x + 0 = ?x")]).unwrap();
        assert_eq!(library.reducing_transformations(Role::Consequent).len(), 1);
        assert_eq!(library.reducing_transformations(Role::LocalTheorem).len(), 1);
    }
}
