use std::collections::HashMap;
use std::fmt;

use crate::expression::{Expression, ExpressionKind};

/// A mapping from pattern variables to the expressions they stand for.
///
/// A pattern variable is any quantified symbol in a pattern. Quantified symbols
/// applied to arguments, like ?f(x), bind their head as the zero-argument variable ?f.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    map: HashMap<Expression, Expression>,
}

impl Bindings {
    pub fn new() -> Bindings {
        Bindings::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, variable: &Expression) -> Option<&Expression> {
        self.map.get(variable)
    }

    pub fn has(&self, variable: &Expression) -> bool {
        self.map.contains_key(variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Expression, &Expression)> {
        self.map.iter()
    }

    /// Binds a variable without any consistency check. Overwrites an existing binding.
    pub fn set(&mut self, variable: Expression, value: Expression) {
        self.map.insert(variable, value);
    }

    pub fn as_map(&self) -> &HashMap<Expression, Expression> {
        &self.map
    }

    /// Substitutes every bound variable in the expression.
    pub fn apply(&self, e: &Expression) -> Expression {
        e.substitute(&self.map)
    }

    /// Binds a variable, or checks that an existing binding agrees.
    fn bind(
        &mut self,
        variable: Expression,
        value: &Expression,
        added: &mut Vec<Expression>,
    ) -> bool {
        match self.map.get(&variable) {
            Some(existing) => existing == value,
            None => {
                added.push(variable.clone());
                self.map.insert(variable, value.clone());
                true
            }
        }
    }

    /// Extends these bindings so that applying them to the pattern yields the candidate.
    /// Returns whether it worked. On failure, the bindings are left as they were.
    pub fn match_expressions(&mut self, pattern: &Expression, candidate: &Expression) -> bool {
        let mut added = vec![];
        if self.match_helper(pattern, candidate, &mut added) {
            true
        } else {
            for variable in added {
                self.map.remove(&variable);
            }
            false
        }
    }

    fn match_helper(
        &mut self,
        pattern: &Expression,
        candidate: &Expression,
        added: &mut Vec<Expression>,
    ) -> bool {
        match (pattern.kind(), candidate.kind()) {
            (
                ExpressionKind::Symbol {
                    name,
                    quantification,
                    args,
                },
                _,
            ) if quantification.is_quantified() => {
                if args.is_empty() {
                    return self.bind(pattern.clone(), candidate, added);
                }

                // A quantified function binds its head to the candidate's head.
                let ExpressionKind::Symbol {
                    name: candidate_name,
                    quantification: candidate_quantification,
                    args: candidate_args,
                } = candidate.kind()
                else {
                    return false;
                };
                if candidate_args.len() != args.len() {
                    return false;
                }
                let head = Expression::quantified_apply(name, *quantification, vec![]);
                let candidate_head =
                    Expression::quantified_apply(candidate_name, *candidate_quantification, vec![]);
                if !self.bind(head, &candidate_head, added) {
                    return false;
                }
                args.iter()
                    .zip(candidate_args)
                    .all(|(p, c)| self.match_helper(p, c, added))
            }
            (
                ExpressionKind::Symbol {
                    name,
                    quantification,
                    args,
                },
                ExpressionKind::Symbol {
                    name: candidate_name,
                    quantification: candidate_quantification,
                    args: candidate_args,
                },
            ) => {
                name == candidate_name
                    && quantification == candidate_quantification
                    && args.len() == candidate_args.len()
                    && args
                        .iter()
                        .zip(candidate_args)
                        .all(|(p, c)| self.match_helper(p, c, added))
            }
            (
                ExpressionKind::Alternatives {
                    branches,
                    otherwise,
                },
                ExpressionKind::Alternatives {
                    branches: candidate_branches,
                    otherwise: candidate_otherwise,
                },
            ) => {
                branches.len() == candidate_branches.len()
                    && branches.iter().zip(candidate_branches).all(|((pc, pr), (cc, cr))| {
                        self.match_helper(pc, cc, added) && self.match_helper(pr, cr, added)
                    })
                    && self.match_helper(otherwise, candidate_otherwise, added)
            }
            (
                ExpressionKind::Lambda { parameters, body },
                ExpressionKind::Lambda {
                    parameters: candidate_parameters,
                    body: candidate_body,
                },
            ) => parameters == candidate_parameters && self.match_helper(body, candidate_body, added),
            _ => false,
        }
    }

    /// Combines two sets of bindings. None if they disagree on some variable.
    pub fn merge(&self, other: &Bindings) -> Option<Bindings> {
        let mut answer = self.clone();
        for (variable, value) in other.iter() {
            match answer.map.get(variable) {
                Some(existing) if existing != value => return None,
                Some(_) => {}
                None => {
                    answer.map.insert(variable.clone(), value.clone());
                }
            }
        }
        Some(answer)
    }

    /// A hash that doesn't depend on insertion order.
    pub fn structure_hash(&self) -> u64 {
        self.map.iter().fold(0u64, |acc, (k, v)| {
            acc.wrapping_add(k.structure_hash().wrapping_mul(31) ^ v.structure_hash())
        })
    }
}

/// Matches a pattern against a candidate with no prior bindings.
pub fn matcher(pattern: &Expression, candidate: &Expression) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    if bindings.match_expressions(pattern, candidate) {
        Some(bindings)
    } else {
        None
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut entries: Vec<String> = self
            .map
            .iter()
            .map(|(k, v)| format!("{} -> {}", k, v))
            .collect();
        entries.sort();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_match(pattern: &str, candidate: &str) -> Bindings {
        let pattern = Expression::parse(pattern);
        let candidate = Expression::parse(candidate);
        let bindings = matcher(&pattern, &candidate).expect("expected a match");
        assert_eq!(bindings.apply(&pattern), candidate);
        bindings
    }

    fn check_no_match(pattern: &str, candidate: &str) {
        let pattern = Expression::parse(pattern);
        let candidate = Expression::parse(candidate);
        assert!(matcher(&pattern, &candidate).is_none());
    }

    #[test]
    fn test_simple_match() {
        let bindings = check_match("?x + 0", "f(a) + 0");
        assert_eq!(bindings.len(), 1);
        assert_eq!(
            bindings.get(&Expression::parse("?x")),
            Some(&Expression::parse("f(a)"))
        );
    }

    #[test]
    fn test_repeated_variable_must_agree() {
        check_match("?x = ?x", "f(a) = f(a)");
        check_no_match("?x = ?x", "f(a) = f(b)");
    }

    #[test]
    fn test_constants_must_agree() {
        check_no_match("?x + 0", "a + 1");
        check_no_match("f(?x)", "g(a)");
        check_no_match("f(?x)", "f(a, b)");
    }

    #[test]
    fn test_function_variables() {
        let bindings = check_match("?f(?x) = ?f(?y)", "g(a) = g(b)");
        assert_eq!(
            bindings.get(&Expression::parse("?f")),
            Some(&Expression::parse("g"))
        );
        check_no_match("?f(?x) = ?f(?y)", "g(a) = h(b)");
    }

    #[test]
    fn test_existentials_bind_too() {
        check_match("p(@y)", "p(c)");
    }

    #[test]
    fn test_failed_match_leaves_bindings_alone() {
        let mut bindings = Bindings::new();
        assert!(bindings.match_expressions(&Expression::parse("?x"), &Expression::parse("a")));
        let pattern = Expression::parse("f(?y, ?x)");
        assert!(!bindings.match_expressions(&pattern, &Expression::parse("f(b, c)")));
        assert_eq!(bindings.len(), 1);
        assert!(!bindings.has(&Expression::parse("?y")));
    }

    #[test]
    fn test_match_alternatives_and_lambdas() {
        check_match("if ?c then ?a else 0", "if p(x) then x else 0");
        check_match("lambda z. ?body", "lambda z. z + 1");
        check_no_match("lambda z. ?body", "lambda w. w + 1");
    }

    #[test]
    fn test_merge() {
        let a = check_match("f(?x)", "f(a)");
        let b = check_match("g(?y)", "g(b)");
        let c = check_match("h(?x)", "h(c)");
        assert_eq!(a.merge(&b).unwrap().len(), 2);
        assert!(a.merge(&c).is_none());
        assert_eq!(a.merge(&a).unwrap(), a);
    }
}
