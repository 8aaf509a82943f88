use std::fmt;

use crate::conjunct::{Conjunct, ConjunctId, ConjunctKey, Role};
use crate::expression::Expression;

/// A located sub-expression within a specific conjunct.
///
/// A site doesn't own anything. It records what the conjunct looked like when the site was
/// found, so that a stale site can be detected after the proof state changes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Site {
    pub conjunct: ConjunctId,
    pub role: Role,

    /// Sub-expression indices leading from the root to this site.
    pub path: Vec<usize>,

    /// The sub-expression at the path.
    pub expression: Expression,

    /// The whole conjunct expression, as of when the site was found.
    pub root: Expression,
}

impl Site {
    pub fn new(conjunct: ConjunctId, role: Role, root: Expression) -> Site {
        Site {
            conjunct,
            role,
            path: vec![],
            expression: root.clone(),
            root,
        }
    }

    pub fn top_level(conjunct: &Conjunct) -> Site {
        Site::new(conjunct.id, conjunct.role, conjunct.expression.clone())
    }

    pub fn key(&self) -> ConjunctKey {
        (self.role, self.conjunct)
    }

    pub fn is_top_level(&self) -> bool {
        self.path.is_empty()
    }

    fn child(&self, index: usize) -> Option<Site> {
        let expression = self.expression.sub_expression(index)?.clone();
        let mut path = self.path.clone();
        path.push(index);
        Some(Site {
            conjunct: self.conjunct,
            role: self.role,
            path,
            expression,
            root: self.root.clone(),
        })
    }

    /// This site followed by every site below it, in pre-order.
    pub fn descendants(self) -> Descendants {
        Descendants { stack: vec![self] }
    }

    /// The root of this site's conjunct with the site replaced.
    pub fn altered_root(&self, replacement: Expression) -> Option<Expression> {
        self.root.with_site_altered(&self.path, replacement)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.role, self.conjunct)?;
        if !self.path.is_empty() {
            let path: Vec<String> = self.path.iter().map(|i| i.to_string()).collect();
            write!(f, " at [{}]", path.join(", "))?;
        }
        write!(f, ": {}", self.expression)
    }
}

/// Lazily walks every sub-expression site of a conjunct.
pub struct Descendants {
    stack: Vec<Site>,
}

impl Iterator for Descendants {
    type Item = Site;

    fn next(&mut self) -> Option<Site> {
        let site = self.stack.pop()?;
        for i in (0..site.expression.num_sub_expressions()).rev() {
            if let Some(child) = site.child(i) {
                self.stack.push(child);
            }
        }
        Some(site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendants_in_pre_order() {
        let root = Expression::parse("f(a, g(b))");
        let site = Site::new(ConjunctId(0), Role::Consequent, root.clone());
        let found: Vec<String> = site
            .descendants()
            .map(|s| s.expression.to_string())
            .collect();
        assert_eq!(found, vec!["f(a, g(b))", "a", "g(b)", "b"]);
    }

    #[test]
    fn test_altered_root() {
        let root = Expression::parse("f(a, g(b))");
        let site = Site::new(ConjunctId(0), Role::LocalTheorem, root)
            .descendants()
            .find(|s| s.expression == Expression::parse("b"))
            .unwrap();
        assert_eq!(site.path, vec![1, 0]);
        assert_eq!(
            site.altered_root(Expression::parse("c")).unwrap(),
            Expression::parse("f(a, g(c))")
        );
    }
}
