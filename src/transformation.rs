use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::application::{Application, Position};
use crate::binder::{Binder, BindingSearch, SiteScope};
use crate::bindings::Bindings;
use crate::conjunct::{Conjunct, ConjunctId, Role};
use crate::expression::{Expression, Quantification};
use crate::proof_state::ProofState;
use crate::site::Site;

/// How the result of a transformation relates to what it replaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Equivalence {
    /// The result implies what it replaces, but not vice versa.
    /// Only sound for tightening the goal or dropping givens.
    Stronger,

    /// Safe to substitute freely.
    Equivalent,

    /// What it replaces implies the result, but not vice versa.
    /// Only sound for asserting new givens or dropping goals.
    Weaker,
}

/// Where a transformation came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Theorem(String),

    /// An antecedent of the proof state. Its transformations never match the antecedent itself.
    Antecedent(ConjunctId),

    /// Bookkeeping rules that don't come from any theorem.
    Builtin,
}

impl Source {
    fn skip(&self) -> Option<ConjunctId> {
        match self {
            Source::Antecedent(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Source::Theorem(name) => write!(f, "{}", name),
            Source::Antecedent(id) => write!(f, "antecedent {}", id),
            Source::Builtin => write!(f, "builtin"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum TransformationKind {
    /// Rewrites a sub-expression of a consequent.
    SubstituteInPlaceInConsequent {
        pattern: Expression,
        template: Expression,
    },

    /// Rewrites a sub-expression of an antecedent.
    SubstituteInPlaceInAntecedent {
        pattern: Expression,
        template: Expression,
    },

    /// Adds a rewritten copy of an antecedent, keeping the original.
    ExpandAntecedentBySubstitution {
        pattern: Expression,
        template: Expression,
    },

    /// When every antecedent pattern matches a given or a theorem, adds the consequent as a
    /// new given. At least one pattern must match a given.
    ExpandAntecedentByImplication {
        antecedents: Vec<Expression>,
        consequent: Expression,
    },

    /// Replaces goals matching the consequent patterns with the antecedents of an implication.
    StrengthenConsequent {
        antecedents: Vec<Expression>,
        consequents: Vec<Expression>,
    },

    /// A consequent that is an instance of a theorem becomes "true".
    ReplaceTheoremInConsequentWithTrue { theorem: Expression },

    /// Finds a witness for an existential consequent and substitutes it into every consequent.
    ExistentialInstantiation,

    /// A consequent identical to an antecedent becomes "true".
    ConsequentMatchesAntecedent,

    /// A consequent "a = a", or "a = b" given "b = a", becomes "true".
    SymmetricEquality,

    /// Deletes "true" from either side.
    EliminateTrueConjunct,

    /// Deletes an antecedent that is obviously true.
    EliminateObviousAntecedent,

    /// Deletes an antecedent that duplicates an earlier one.
    EliminateRedundantAntecedent,

    /// Uses an antecedent "x = e" to replace x by e everywhere, then drops the equation.
    PropagateVariable,

    /// Records a step with no changes, to mark a phase of the search.
    Label(String),
}

/// A reusable rewriting rule. Transformations are immutable and shared between proof states.
#[derive(Clone, Debug)]
pub struct Transformation {
    pub kind: TransformationKind,
    pub source: Source,
}

fn function_applications(expressions: &[Expression]) -> i64 {
    expressions
        .iter()
        .map(|e| e.function_applications() as i64)
        .sum()
}

fn quantified_variables(expressions: &[Expression]) -> HashSet<Expression> {
    expressions
        .iter()
        .flat_map(|e| e.quantified_variables())
        .collect()
}

/// Variables that appear in the results but not in the patterns.
fn introduced_variables(patterns: &[Expression], results: &[Expression]) -> Vec<Expression> {
    let bound = quantified_variables(patterns);
    let mut answer: Vec<Expression> = quantified_variables(results)
        .into_iter()
        .filter(|v| !bound.contains(v))
        .collect();
    answer.sort_by_key(|v| v.to_string());
    answer
}

/// In a goal, an unbound universal variable asks for a witness, so it becomes existential.
fn existential_renaming(variables: &[Expression]) -> Bindings {
    let mut answer = Bindings::new();
    for v in variables {
        if v.quantification() == Quantification::ForAll {
            if let Some(name) = v.name() {
                answer.set(v.clone(), Expression::existential(name));
            }
        }
    }
    answer
}

impl Transformation {
    pub fn new(kind: TransformationKind, source: Source) -> Transformation {
        Transformation { kind, source }
    }

    pub fn builtin(kind: TransformationKind) -> Transformation {
        Transformation::new(kind, Source::Builtin)
    }

    pub fn label(text: &str) -> Transformation {
        Transformation::builtin(TransformationKind::Label(text.to_string()))
    }

    pub fn is_label(&self) -> bool {
        matches!(self.kind, TransformationKind::Label(_))
    }

    pub fn equivalence(&self) -> Equivalence {
        match self.kind {
            TransformationKind::StrengthenConsequent { .. } => Equivalence::Stronger,
            TransformationKind::ExpandAntecedentByImplication { .. } => Equivalence::Weaker,
            _ => Equivalence::Equivalent,
        }
    }

    pub fn could_affect_antecedent(&self) -> bool {
        use TransformationKind::*;
        matches!(
            self.kind,
            SubstituteInPlaceInAntecedent { .. }
                | ExpandAntecedentBySubstitution { .. }
                | ExpandAntecedentByImplication { .. }
                | EliminateTrueConjunct
                | EliminateObviousAntecedent
                | EliminateRedundantAntecedent
                | PropagateVariable
        )
    }

    pub fn could_affect_consequent(&self) -> bool {
        use TransformationKind::*;
        matches!(
            self.kind,
            SubstituteInPlaceInConsequent { .. }
                | StrengthenConsequent { .. }
                | ReplaceTheoremInConsequentWithTrue { .. }
                | ExistentialInstantiation
                | ConsequentMatchesAntecedent
                | SymmetricEquality
                | EliminateTrueConjunct
                | PropagateVariable
        )
    }

    pub fn is_antecedent_expansion(&self) -> bool {
        matches!(
            self.kind,
            TransformationKind::ExpandAntecedentBySubstitution { .. }
                | TransformationKind::ExpandAntecedentByImplication { .. }
        )
    }

    /// Whether applying this can leave quantified variables that weren't bound by matching.
    pub fn introduces_quantified_variables(&self) -> bool {
        use TransformationKind::*;
        match &self.kind {
            SubstituteInPlaceInConsequent { pattern, template }
            | SubstituteInPlaceInAntecedent { pattern, template }
            | ExpandAntecedentBySubstitution { pattern, template } => {
                !introduced_variables(&[pattern.clone()], &[template.clone()]).is_empty()
            }
            ExpandAntecedentByImplication {
                antecedents,
                consequent,
            } => !introduced_variables(antecedents, &[consequent.clone()]).is_empty(),
            StrengthenConsequent {
                antecedents,
                consequents,
            } => !introduced_variables(consequents, antecedents).is_empty(),
            _ => false,
        }
    }

    /// How many function applications this adds, roughly. Negative means it shrinks things.
    pub fn function_application_delta(&self) -> i64 {
        use TransformationKind::*;
        match &self.kind {
            SubstituteInPlaceInConsequent { pattern, template }
            | SubstituteInPlaceInAntecedent { pattern, template }
            | ExpandAntecedentBySubstitution { pattern, template } => {
                template.function_applications() as i64 - pattern.function_applications() as i64
            }
            ExpandAntecedentByImplication { consequent, .. } => {
                consequent.function_applications() as i64
            }
            StrengthenConsequent {
                antecedents,
                consequents,
            } => function_applications(antecedents) - function_applications(consequents),
            ReplaceTheoremInConsequentWithTrue { theorem } => {
                -(theorem.function_applications() as i64)
            }
            ExistentialInstantiation => -2,
            _ => 0,
        }
    }

    /// Equivalent, shrinking, and not introducing variables. Applying these to a fixed point
    /// always terminates.
    pub fn is_strictly_reducing(&self) -> bool {
        self.equivalence() == Equivalence::Equivalent
            && self.function_application_delta() < 0
            && !self.introduces_quantified_variables()
    }

    /// Lazily finds the ways this transformation applies to the state.
    /// This never changes the state, and can be called speculatively.
    pub fn applications<'a>(
        self: Arc<Self>,
        state: &'a ProofState,
    ) -> Box<dyn Iterator<Item = Application> + 'a> {
        use TransformationKind::*;
        let skip = self.source.skip();
        match self.kind.clone() {
            SubstituteInPlaceInConsequent { pattern, template } => {
                substitute_in_place(self, state, pattern, template, Role::Consequent, skip)
            }
            SubstituteInPlaceInAntecedent { pattern, template } => {
                substitute_in_place(self, state, pattern, template, Role::LocalTheorem, skip)
            }
            ExpandAntecedentBySubstitution { pattern, template } => {
                let binder = Binder::new(pattern, SiteScope::InductiveAntecedents).skipping(skip);
                Box::new(
                    BindingSearch::new(state, vec![binder]).filter_map(move |result| {
                        let site = &result.sites[0];
                        let replacement = result.bindings.apply(&template);
                        let new_root = site.altered_root(replacement)?;
                        let additions = new_antecedents(state, new_root);
                        if additions.is_empty() {
                            return None;
                        }
                        let mut application =
                            Application::new(self.clone(), result.sites, result.bindings);
                        for e in additions {
                            application.insert(Role::LocalTheorem, Position::End, e);
                        }
                        Some(application)
                    }),
                )
            }
            ExpandAntecedentByImplication {
                antecedents,
                consequent,
            } => {
                let binders = antecedents
                    .into_iter()
                    .map(|p| {
                        Binder::new(p, SiteScope::TopLevelAntecedentsAndTheorems).skipping(skip)
                    })
                    .collect();
                Box::new(
                    BindingSearch::new(state, binders)
                        .requiring_local()
                        .filter_map(move |result| {
                            let additions =
                                new_antecedents(state, result.bindings.apply(&consequent));
                            if additions.is_empty() {
                                return None;
                            }
                            let mut application =
                                Application::new(self.clone(), result.sites, result.bindings);
                            for e in additions {
                                application.insert(Role::LocalTheorem, Position::End, e);
                            }
                            Some(application)
                        }),
                )
            }
            StrengthenConsequent {
                antecedents,
                consequents,
            } => {
                let fresh = existential_renaming(&introduced_variables(&consequents, &antecedents));
                let binders = consequents
                    .into_iter()
                    .map(|p| Binder::new(p, SiteScope::TopLevelConsequents))
                    .collect();
                Box::new(
                    BindingSearch::new(state, binders).filter_map(move |result| {
                        let replacements: Vec<Expression> = antecedents
                            .iter()
                            .map(|a| fresh.apply(&result.bindings.apply(a)))
                            .flat_map(|e| e.split_into_conjuncts())
                            .collect();
                        let removed: Vec<Expression> =
                            result.sites.iter().map(|s| s.expression.clone()).collect();
                        if replacements == removed {
                            return None;
                        }
                        let keys: Vec<_> = result.sites.iter().map(|s| s.key()).collect();
                        let mut application =
                            Application::new(self.clone(), result.sites, result.bindings);
                        for key in keys {
                            application.remove(key);
                        }
                        for e in replacements {
                            application.insert(Role::Consequent, Position::End, e);
                        }
                        Some(application)
                    }),
                )
            }
            ReplaceTheoremInConsequentWithTrue { theorem } => {
                let binder = Binder::new(theorem, SiteScope::TopLevelConsequents);
                Box::new(
                    BindingSearch::new(state, vec![binder]).filter_map(move |result| {
                        if result.sites[0].expression.is_true() {
                            return None;
                        }
                        let key = result.sites[0].key();
                        let mut application =
                            Application::new(self.clone(), result.sites, result.bindings);
                        application.alter(key, Expression::new_true());
                        Some(application)
                    }),
                )
            }
            ExistentialInstantiation => Box::new(
                state
                    .consequents()
                    .iter()
                    .filter(|c| c.expression.contains_existential())
                    .flat_map(move |c| {
                        let this = self.clone();
                        let goal = Site::top_level(c);
                        let binder = Binder::new(
                            c.expression.clone(),
                            SiteScope::TopLevelAntecedentsAndTheorems,
                        );
                        BindingSearch::new(state, vec![binder]).map(move |result| {
                            let mut sites = vec![goal.clone()];
                            sites.extend(result.sites);
                            let mut application =
                                Application::new(this.clone(), sites, result.bindings.clone());
                            application.remove(goal.key());
                            for other in state.consequents() {
                                if other.id == goal.conjunct {
                                    continue;
                                }
                                let instantiated = result.bindings.apply(&other.expression);
                                replace_conjunct(state, &mut application, other, instantiated);
                            }
                            application
                        })
                    }),
            ),
            ConsequentMatchesAntecedent => Box::new(state.consequents().iter().filter_map(
                move |c| {
                    if c.expression.is_true() {
                        return None;
                    }
                    let antecedent = state
                        .antecedents()
                        .iter()
                        .find(|a| a.expression == c.expression)?;
                    let sites = vec![Site::top_level(c), Site::top_level(antecedent)];
                    let mut application = Application::new(self.clone(), sites, Bindings::new());
                    application.alter(c.key(), Expression::new_true());
                    Some(application)
                },
            )),
            SymmetricEquality => Box::new(state.consequents().iter().filter_map(move |c| {
                if !c.expression.is_equality() {
                    return None;
                }
                let args = c.expression.args();
                let mut sites = vec![Site::top_level(c)];
                if args[0] != args[1] {
                    let mirror = Expression::equality(args[1].clone(), args[0].clone());
                    let antecedent = state.antecedents().iter().find(|a| a.expression == mirror)?;
                    sites.push(Site::top_level(antecedent));
                }
                let mut application = Application::new(self.clone(), sites, Bindings::new());
                application.alter(c.key(), Expression::new_true());
                Some(application)
            })),
            EliminateTrueConjunct => Box::new(
                state
                    .antecedents()
                    .iter()
                    .chain(state.consequents())
                    .filter(|c| c.expression.is_true())
                    .map(move |c| {
                        let mut application =
                            Application::new(self.clone(), vec![Site::top_level(c)], Bindings::new());
                        application.remove(c.key());
                        application
                    }),
            ),
            EliminateObviousAntecedent => Box::new(
                state
                    .antecedents()
                    .iter()
                    .filter(|c| c.expression.is_obviously_true())
                    .map(move |c| {
                        let mut application =
                            Application::new(self.clone(), vec![Site::top_level(c)], Bindings::new());
                        application.remove(c.key());
                        application
                    }),
            ),
            EliminateRedundantAntecedent => Box::new(
                state
                    .antecedents()
                    .iter()
                    .enumerate()
                    .filter_map(move |(i, c)| {
                        let earlier = state.antecedents()[..i]
                            .iter()
                            .find(|e| e.expression == c.expression)?;
                        let sites = vec![Site::top_level(c), Site::top_level(earlier)];
                        let mut application = Application::new(self.clone(), sites, Bindings::new());
                        application.remove(c.key());
                        Some(application)
                    }),
            ),
            PropagateVariable => Box::new(state.antecedents().iter().filter_map(move |c| {
                let (variable, value) = propagation(&c.expression)?;
                let mut application =
                    Application::new(self.clone(), vec![Site::top_level(c)], Bindings::new());
                application.remove(c.key());
                if variable != value {
                    let mut substitution = Bindings::new();
                    substitution.set(variable, value);
                    for other in state.antecedents().iter().chain(state.consequents()) {
                        if other.id == c.id {
                            continue;
                        }
                        let replaced = substitution.apply(&other.expression);
                        replace_conjunct(state, &mut application, other, replaced);
                    }
                }
                Some(application)
            })),
            Label(_) => Box::new(std::iter::once(Application::new(
                self,
                vec![],
                Bindings::new(),
            ))),
        }
    }
}

/// A bare, unquantified, non-literal symbol.
fn is_propagatable(e: &Expression) -> bool {
    e.is_variable() && e.quantification() == Quantification::None && !e.is_literal()
}

/// For an equation "x = e" or "e = x", the variable and what to replace it with.
/// Equations like "x = f(x)" can't eliminate x, so they don't propagate.
fn propagation(e: &Expression) -> Option<(Expression, Expression)> {
    if !e.is_equality() {
        return None;
    }
    let args = e.args();
    for (variable, value) in [(&args[0], &args[1]), (&args[1], &args[0])] {
        if !is_propagatable(variable) {
            continue;
        }
        if variable == value {
            return Some((variable.clone(), value.clone()));
        }
        if let Some(name) = variable.name() {
            if !value.contains_name(name) {
                return Some((variable.clone(), value.clone()));
            }
        }
    }
    None
}

/// The conjuncts of an expression that aren't already antecedents, without duplicates.
fn new_antecedents(state: &ProofState, e: Expression) -> Vec<Expression> {
    let mut answer: Vec<Expression> = vec![];
    for part in e.split_into_conjuncts() {
        if !state.contains_local_theorem(&part) && !answer.contains(&part) {
            answer.push(part);
        }
    }
    answer
}

/// Plans to replace a conjunct's expression.
/// A result that splits into several conjuncts takes the old conjunct's position.
fn replace_conjunct(
    state: &ProofState,
    application: &mut Application,
    conjunct: &Conjunct,
    replacement: Expression,
) {
    if replacement == conjunct.expression {
        return;
    }
    let parts = replacement.split_into_conjuncts();
    if parts.len() == 1 {
        application.alter(conjunct.key(), replacement);
        return;
    }
    application.remove(conjunct.key());
    let index = application
        .former_position(state, conjunct.key())
        .unwrap_or(0);
    for (i, part) in parts.into_iter().enumerate() {
        application.insert(conjunct.role, Position::At(index + i), part);
    }
}

fn substitute_in_place<'a>(
    transformation: Arc<Transformation>,
    state: &'a ProofState,
    pattern: Expression,
    template: Expression,
    role: Role,
    skip: Option<ConjunctId>,
) -> Box<dyn Iterator<Item = Application> + 'a> {
    let scope = match role {
        Role::Consequent => SiteScope::InductiveConsequents,
        _ => SiteScope::InductiveAntecedents,
    };
    let fresh = if role == Role::Consequent {
        existential_renaming(&introduced_variables(&[pattern.clone()], &[template.clone()]))
    } else {
        Bindings::new()
    };
    let binder = Binder::new(pattern, scope).skipping(skip);
    Box::new(
        BindingSearch::new(state, vec![binder]).filter_map(move |result| {
            let site = &result.sites[0];
            let replacement = fresh.apply(&result.bindings.apply(&template));
            if replacement == site.expression {
                return None;
            }
            let new_root = site.altered_root(replacement)?;
            let conjunct = state.conjunct(site.key())?.clone();
            let mut application =
                Application::new(transformation.clone(), result.sites, result.bindings);
            replace_conjunct(state, &mut application, &conjunct, new_root);
            Some(application)
        }),
    )
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TransformationKind::*;
        match &self.kind {
            SubstituteInPlaceInConsequent { pattern, template } => {
                write!(f, "rewrite consequent {} => {}", pattern, template)?
            }
            SubstituteInPlaceInAntecedent { pattern, template } => {
                write!(f, "rewrite antecedent {} => {}", pattern, template)?
            }
            ExpandAntecedentBySubstitution { pattern, template } => {
                write!(f, "expand antecedent {} => {}", pattern, template)?
            }
            ExpandAntecedentByImplication {
                antecedents,
                consequent,
            } => write!(
                f,
                "expand antecedent by {} implies {}",
                Expression::conjoin(antecedents.clone()),
                consequent
            )?,
            StrengthenConsequent {
                antecedents,
                consequents,
            } => write!(
                f,
                "strengthen consequent {} to {}",
                Expression::conjoin(consequents.clone()),
                Expression::conjoin(antecedents.clone())
            )?,
            ReplaceTheoremInConsequentWithTrue { theorem } => {
                write!(f, "consequent is an instance of {}", theorem)?
            }
            ExistentialInstantiation => write!(f, "instantiate existential")?,
            ConsequentMatchesAntecedent => write!(f, "consequent matches antecedent")?,
            SymmetricEquality => write!(f, "symmetric equality")?,
            EliminateTrueConjunct => write!(f, "eliminate true conjunct")?,
            EliminateObviousAntecedent => write!(f, "eliminate obvious antecedent")?,
            EliminateRedundantAntecedent => write!(f, "eliminate redundant antecedent")?,
            PropagateVariable => write!(f, "propagate variable")?,
            Label(text) => return write!(f, "--- {} ---", text),
        }
        if self.source != Source::Builtin {
            write!(f, " [{}]", self.source)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theorem::TheoremLibrary;

    fn state(antecedents: &[&str], consequents: &[&str]) -> ProofState {
        ProofState::parse(antecedents, consequents, Arc::new(TheoremLibrary::empty()))
    }

    fn theorem_kind(kind: TransformationKind) -> Arc<Transformation> {
        Arc::new(Transformation::new(kind, Source::Theorem("t".to_string())))
    }

    fn rewrite_consequent(pattern: &str, template: &str) -> Arc<Transformation> {
        theorem_kind(TransformationKind::SubstituteInPlaceInConsequent {
            pattern: Expression::parse(pattern),
            template: Expression::parse(template),
        })
    }

    fn apply_first(t: &Arc<Transformation>, state: &mut ProofState) {
        let application = t.clone().applications(state).next().expect("no applications");
        application.apply(state).unwrap();
    }

    #[test]
    fn test_properties_of_a_shrinking_rewrite() {
        let t = rewrite_consequent("?x + 0", "?x");
        assert_eq!(t.equivalence(), Equivalence::Equivalent);
        assert_eq!(t.function_application_delta(), -1);
        assert!(!t.introduces_quantified_variables());
        assert!(t.is_strictly_reducing());
        assert!(t.could_affect_consequent());
        assert!(!t.could_affect_antecedent());
    }

    #[test]
    fn test_properties_of_a_growing_rewrite() {
        let t = rewrite_consequent("?x", "?x * ?y");
        assert!(t.introduces_quantified_variables());
        assert!(!t.is_strictly_reducing());
    }

    #[test]
    fn test_substitute_in_place_in_consequent() {
        let mut state = state(&[], &["f(a + 0) = b"]);
        apply_first(&rewrite_consequent("?x + 0", "?x"), &mut state);
        assert_eq!(state.consequent_expressions(), vec![Expression::parse("f(a) = b")]);
        assert_eq!(state.step_count(), 1);
    }

    #[test]
    fn test_substitution_that_splits_takes_the_old_position() {
        let mut state = state(&[], &["p", "q(a)", "r"]);
        apply_first(&rewrite_consequent("q(?x)", "s(?x) and t(?x)"), &mut state);
        assert_eq!(
            state.consequent_expressions(),
            vec![
                Expression::parse("p"),
                Expression::parse("s(a)"),
                Expression::parse("t(a)"),
                Expression::parse("r"),
            ]
        );
    }

    #[test]
    fn test_unbound_template_variables_become_existential_in_goals() {
        let mut state = state(&[], &["p(a)"]);
        apply_first(&rewrite_consequent("p(?x)", "q(?x, ?y)"), &mut state);
        assert_eq!(state.consequent_expressions(), vec![Expression::parse("q(a, @y)")]);
    }

    #[test]
    fn test_expand_antecedent_by_substitution_keeps_the_original() {
        let t = theorem_kind(TransformationKind::ExpandAntecedentBySubstitution {
            pattern: Expression::parse("?x + 0"),
            template: Expression::parse("?x"),
        });
        let mut state = state(&["f(a + 0) = b"], &["c"]);
        apply_first(&t, &mut state);
        assert_eq!(
            state.antecedent_expressions(),
            vec![Expression::parse("f(a + 0) = b"), Expression::parse("f(a) = b")]
        );

        // It won't add what's already there.
        assert_eq!(t.clone().applications(&state).count(), 0);
    }

    #[test]
    fn test_expand_antecedent_by_implication() {
        let t = theorem_kind(TransformationKind::ExpandAntecedentByImplication {
            antecedents: vec![Expression::parse("?s > 0")],
            consequent: Expression::parse("?s /= empty_string"),
        });
        assert_eq!(t.equivalence(), Equivalence::Weaker);
        let mut state = state(&["t > 0"], &["u"]);
        apply_first(&t, &mut state);
        assert!(state.contains_local_theorem(&Expression::parse("t /= empty_string")));
        assert!(state.contains_local_theorem(&Expression::parse("t > 0")));
    }

    #[test]
    fn test_strengthen_consequent() {
        let t = theorem_kind(TransformationKind::StrengthenConsequent {
            antecedents: vec![Expression::parse("?a < ?b"), Expression::parse("?b < ?c")],
            consequents: vec![Expression::parse("?a < ?c")],
        });
        assert_eq!(t.equivalence(), Equivalence::Stronger);
        assert!(t.introduces_quantified_variables());
        let mut state = state(&[], &["x < z"]);
        apply_first(&t, &mut state);
        assert_eq!(
            state.consequent_expressions(),
            vec![Expression::parse("x < @b"), Expression::parse("@b < z")]
        );
    }

    #[test]
    fn test_existential_instantiation_is_global() {
        let t = Arc::new(Transformation::builtin(TransformationKind::ExistentialInstantiation));
        let mut state = state(&["x < y"], &["x < @b", "@b < z"]);
        apply_first(&t, &mut state);
        assert_eq!(state.consequent_expressions(), vec![Expression::parse("y < z")]);
    }

    #[test]
    fn test_propagate_variable() {
        let t = Arc::new(Transformation::builtin(TransformationKind::PropagateVariable));
        let mut state = state(&["x = f(y)", "g(x)"], &["h(x)"]);
        apply_first(&t, &mut state);
        assert_eq!(state.antecedent_expressions(), vec![Expression::parse("g(f(y))")]);
        assert_eq!(state.consequent_expressions(), vec![Expression::parse("h(f(y))")]);
    }

    #[test]
    fn test_propagation_candidates() {
        let p = |s: &str| propagation(&Expression::parse(s));
        assert_eq!(p("x = f(y)").unwrap().0, Expression::parse("x"));
        assert_eq!(p("f(y) = x").unwrap().0, Expression::parse("x"));
        assert_eq!(p("x = x").unwrap().1, Expression::parse("x"));
        assert!(p("x = f(x)").is_none());
        assert!(p("0 = f(y)").is_none());
        assert!(p("?x = f(y)").is_none());
        assert!(p("x < y").is_none());
    }

    #[test]
    fn test_local_transformations_skip_their_source() {
        let state = state(&["a = b"], &["f(a)"]);
        let local = state.local_transformations();
        assert!(!local.is_empty());
        for t in &local {
            assert_eq!(t.source, Source::Antecedent(state.antecedents()[0].id));
            if t.is_antecedent_expansion() {
                assert_eq!(t.clone().applications(&state).count(), 0);
            }
        }
    }

    #[test]
    fn test_label() {
        let t = Arc::new(Transformation::label("phase"));
        let mut state = state(&["a"], &["b"]);
        apply_first(&t, &mut state);
        assert!(state.last_step().unwrap().is_label());
        assert!(state.last_step().unwrap().changes.is_empty());
        assert_eq!(t.to_string(), "--- phase ---");
    }
}
