use std::collections::HashSet;

use crate::bindings::Bindings;
use crate::conjunct::{ConjunctId, ConjunctKey, Role};
use crate::expression::Expression;
use crate::proof_state::ProofState;
use crate::site::Site;

/// Which sites of a proof state a binder looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteScope {
    TopLevelAntecedents,
    TopLevelConsequents,

    /// Every sub-expression of every antecedent.
    InductiveAntecedents,

    /// Every sub-expression of every consequent.
    InductiveConsequents,

    TopLevelAntecedentsAndConsequents,

    /// Antecedents, followed by the conjuncts of the global theorems.
    TopLevelAntecedentsAndTheorems,
}

/// A pattern to be matched against one site in a scope.
#[derive(Clone, Debug)]
pub struct Binder {
    pub pattern: Expression,
    pub scope: SiteScope,

    /// An antecedent to leave out, so that a local theorem never matches itself.
    pub skip: Option<ConjunctId>,
}

impl Binder {
    pub fn new(pattern: Expression, scope: SiteScope) -> Binder {
        Binder {
            pattern,
            scope,
            skip: None,
        }
    }

    pub fn skipping(mut self, skip: Option<ConjunctId>) -> Binder {
        self.skip = skip;
        self
    }

    /// Tries to bind this binder's pattern to a site, extending the bindings.
    /// Leaves the bindings unchanged on failure.
    pub fn consider(&self, site: &Site, bindings: &mut Bindings) -> bool {
        if site.role == Role::GlobalTheorem && site.expression.has_quantified_variables() {
            // Quantified theorems are used as transformations, not as facts to bind to.
            return false;
        }
        if site.role == Role::LocalTheorem && self.skip == Some(site.conjunct) {
            return false;
        }
        let pattern = bindings.apply(&self.pattern);

        // Cheap rejection before a full match.
        if let Some(name) = pattern.top_level_operation() {
            if !pattern.quantification().is_quantified() && site.expression.name() != Some(name) {
                return false;
            }
        }
        bindings.match_expressions(&pattern, &site.expression)
    }
}

/// One way of binding every binder.
#[derive(Clone, Debug)]
pub struct BindResult {
    /// The bound sites, one per binder, in binder order.
    pub sites: Vec<Site>,
    pub bindings: Bindings,
}

struct Frame<'a> {
    sites: Box<dyn Iterator<Item = Site> + 'a>,

    // The bindings in effect before this frame's binder was bound.
    bindings: Bindings,

    // The site this frame's binder is currently bound to.
    chosen: Option<Site>,
}

/// A lazy depth-first search over all the ways to bind a list of binders to distinct
/// conjuncts of a proof state.
///
/// The search borrows the proof state, so the state can't change while it's running.
/// Callers bound the work by how many results they take.
pub struct BindingSearch<'a> {
    state: &'a ProofState,
    binders: Vec<Binder>,

    /// When set, at least one binder must bind an antecedent.
    require_local: bool,

    frames: Vec<Frame<'a>>,

    // A search with no binders yields a single empty result.
    trivial_pending: bool,
}

impl<'a> BindingSearch<'a> {
    pub fn new(state: &'a ProofState, binders: Vec<Binder>) -> BindingSearch<'a> {
        let mut search = BindingSearch {
            state,
            binders,
            require_local: false,
            frames: vec![],
            trivial_pending: false,
        };
        if search.binders.is_empty() {
            search.trivial_pending = true;
        } else {
            search.push_frame(Bindings::new());
        }
        search
    }

    pub fn requiring_local(mut self) -> BindingSearch<'a> {
        self.require_local = true;
        self
    }

    fn push_frame(&mut self, bindings: Bindings) {
        let binder = &self.binders[self.frames.len()];
        self.frames.push(Frame {
            sites: self.state.sites(binder.scope),
            bindings,
            chosen: None,
        });
    }
}

impl<'a> Iterator for BindingSearch<'a> {
    type Item = BindResult;

    fn next(&mut self) -> Option<BindResult> {
        if self.trivial_pending {
            self.trivial_pending = false;
            return Some(BindResult {
                sites: vec![],
                bindings: Bindings::new(),
            });
        }
        loop {
            let depth = self.frames.len();
            if depth == 0 {
                return None;
            }

            // Conjuncts bound by the frames below this one.
            let used: HashSet<ConjunctKey> = if depth > 1 {
                self.frames[..depth - 1]
                    .iter()
                    .filter_map(|frame| frame.chosen.as_ref().map(|site| site.key()))
                    .collect()
            } else {
                HashSet::new()
            };

            let frame = &mut self.frames[depth - 1];
            let Some(site) = frame.sites.next() else {
                self.frames.pop();
                continue;
            };
            if used.contains(&site.key()) {
                continue;
            }
            let mut bindings = frame.bindings.clone();
            if !self.binders[depth - 1].consider(&site, &mut bindings) {
                continue;
            }
            frame.chosen = Some(site);

            if depth < self.binders.len() {
                self.push_frame(bindings);
                continue;
            }

            let sites: Vec<Site> = self
                .frames
                .iter()
                .filter_map(|frame| frame.chosen.clone())
                .collect();
            if self.require_local && !sites.iter().any(|s| s.role == Role::LocalTheorem) {
                continue;
            }
            return Some(BindResult { sites, bindings });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::theorem::TheoremLibrary;

    fn state(antecedents: &[&str], consequents: &[&str]) -> ProofState {
        let library = TheoremLibrary::parse(&[("t1", "p(a)"), ("t2", "?x = ?x")]).unwrap();
        ProofState::parse(antecedents, consequents, Arc::new(library))
    }

    #[test]
    fn test_single_binder_finds_every_site() {
        let state = state(&["f(a) = b", "g(f(a))"], &["h(f(c))"]);
        let binder = Binder::new(Expression::parse("f(?x)"), SiteScope::InductiveAntecedents);
        let results: Vec<BindResult> = BindingSearch::new(&state, vec![binder]).collect();
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.sites.len(), 1);
            assert_eq!(
                result.bindings.get(&Expression::parse("?x")),
                Some(&Expression::parse("a"))
            );
        }
    }

    #[test]
    fn test_binders_share_bindings() {
        let state = state(&["p(a)", "q(b)", "q(a)"], &[]);
        let binders = vec![
            Binder::new(Expression::parse("p(?x)"), SiteScope::TopLevelAntecedents),
            Binder::new(Expression::parse("q(?x)"), SiteScope::TopLevelAntecedents),
        ];
        let results: Vec<BindResult> = BindingSearch::new(&state, binders).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sites[1].expression, Expression::parse("q(a)"));
    }

    #[test]
    fn test_binders_bind_distinct_conjuncts() {
        let state = state(&["p(a)"], &[]);
        let binders = vec![
            Binder::new(Expression::parse("p(?x)"), SiteScope::TopLevelAntecedents),
            Binder::new(Expression::parse("p(?y)"), SiteScope::TopLevelAntecedents),
        ];
        assert_eq!(BindingSearch::new(&state, binders).count(), 0);
    }

    #[test]
    fn test_skipping_an_antecedent() {
        let state = state(&["p(a)", "p(b)"], &[]);
        let skip = state.antecedents()[0].id;
        let binder = Binder::new(Expression::parse("p(?x)"), SiteScope::TopLevelAntecedents)
            .skipping(Some(skip));
        let results: Vec<BindResult> = BindingSearch::new(&state, vec![binder]).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sites[0].expression, Expression::parse("p(b)"));
    }

    #[test]
    fn test_global_theorems_and_the_local_requirement() {
        let state = state(&["q(a)"], &[]);
        let binder = |p: &str| {
            Binder::new(Expression::parse(p), SiteScope::TopLevelAntecedentsAndTheorems)
        };

        // p(a) is only available as a global theorem.
        assert_eq!(BindingSearch::new(&state, vec![binder("p(?x)")]).count(), 1);
        assert_eq!(
            BindingSearch::new(&state, vec![binder("p(?x)")])
                .requiring_local()
                .count(),
            0
        );
        assert_eq!(
            BindingSearch::new(&state, vec![binder("p(?x)"), binder("q(?x)")])
                .requiring_local()
                .count(),
            1
        );

        // Theorems with quantified variables are never bound to.
        assert_eq!(BindingSearch::new(&state, vec![binder("?a = ?b")]).count(), 0);
    }

    #[test]
    fn test_unbindable_pattern_yields_nothing() {
        let state = state(&["p(a)"], &["q(b)"]);
        let binder = Binder::new(Expression::parse("r(?x)"), SiteScope::TopLevelAntecedentsAndConsequents);
        assert_eq!(BindingSearch::new(&state, vec![binder]).count(), 0);
    }

    #[test]
    fn test_no_binders_yields_one_empty_result() {
        let state = state(&[], &[]);
        let results: Vec<BindResult> = BindingSearch::new(&state, vec![]).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].bindings.is_empty());
    }
}
