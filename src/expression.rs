use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Names that render as infix binary operators.
pub const INFIX_OPERATORS: [&str; 13] = [
    "implies", "or", "and", "=", "/=", "<", "<=", ">", ">=", "+", "-", "*", "/",
];

/// How a symbol is bound.
/// Quantified symbols are the variables of the prover: they are what a pattern binds.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Quantification {
    None,
    ForAll,
    ThereExists,
}

impl Quantification {
    pub fn flipped(self) -> Quantification {
        match self {
            Quantification::None => Quantification::None,
            Quantification::ForAll => Quantification::ThereExists,
            Quantification::ThereExists => Quantification::ForAll,
        }
    }

    pub fn is_quantified(self) -> bool {
        self != Quantification::None
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExpressionKind {
    /// A named symbol applied to zero or more arguments.
    /// With no arguments, this is a constant, or a variable if it's quantified.
    Symbol {
        name: String,
        quantification: Quantification,
        args: Vec<Expression>,
    },

    /// An if/else chain. Each branch is a (condition, result) pair, tried in order.
    Alternatives {
        branches: Vec<(Expression, Expression)>,
        otherwise: Expression,
    },

    /// An anonymous function. Parameters appear in the body as unquantified symbols.
    Lambda {
        parameters: Vec<String>,
        body: Expression,
    },
}

struct Node {
    kind: ExpressionKind,

    // Computed bottom-up when the node is built.
    hash: u64,
    function_applications: usize,
}

/// An immutable expression tree.
///
/// Children are reference counted, so cloning is cheap and rewritten trees share every
/// subtree that didn't change. Every operation that "changes" an expression returns a new one.
#[derive(Clone)]
pub struct Expression(Arc<Node>);

impl PartialEq for Expression {
    fn eq(&self, other: &Expression) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.hash == other.0.hash && self.0.kind == other.0.kind)
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Expression {
        let mut hasher = DefaultHasher::new();
        let mut function_applications = 0;
        match &kind {
            ExpressionKind::Symbol {
                name,
                quantification,
                args,
            } => {
                0u8.hash(&mut hasher);
                name.hash(&mut hasher);
                quantification.hash(&mut hasher);
                args.len().hash(&mut hasher);
                if !args.is_empty() {
                    function_applications += 1;
                }
                for arg in args {
                    hasher.write_u64(arg.0.hash);
                    function_applications += arg.0.function_applications;
                }
            }
            ExpressionKind::Alternatives {
                branches,
                otherwise,
            } => {
                1u8.hash(&mut hasher);
                branches.len().hash(&mut hasher);
                for (condition, result) in branches {
                    hasher.write_u64(condition.0.hash);
                    hasher.write_u64(result.0.hash);
                    function_applications +=
                        condition.0.function_applications + result.0.function_applications;
                }
                hasher.write_u64(otherwise.0.hash);
                function_applications += otherwise.0.function_applications;
            }
            ExpressionKind::Lambda { parameters, body } => {
                2u8.hash(&mut hasher);
                parameters.hash(&mut hasher);
                hasher.write_u64(body.0.hash);
                function_applications += body.0.function_applications;
            }
        }
        Expression(Arc::new(Node {
            kind,
            hash: hasher.finish(),
            function_applications,
        }))
    }

    pub fn apply(name: &str, args: Vec<Expression>) -> Expression {
        Expression::new(ExpressionKind::Symbol {
            name: name.to_string(),
            quantification: Quantification::None,
            args,
        })
    }

    pub fn quantified_apply(
        name: &str,
        quantification: Quantification,
        args: Vec<Expression>,
    ) -> Expression {
        Expression::new(ExpressionKind::Symbol {
            name: name.to_string(),
            quantification,
            args,
        })
    }

    /// An unquantified symbol with no arguments.
    pub fn constant(name: &str) -> Expression {
        Expression::apply(name, vec![])
    }

    /// A universally quantified variable.
    pub fn variable(name: &str) -> Expression {
        Expression::quantified_apply(name, Quantification::ForAll, vec![])
    }

    /// An existentially quantified variable.
    pub fn existential(name: &str) -> Expression {
        Expression::quantified_apply(name, Quantification::ThereExists, vec![])
    }

    pub fn alternatives(branches: Vec<(Expression, Expression)>, otherwise: Expression) -> Expression {
        Expression::new(ExpressionKind::Alternatives {
            branches,
            otherwise,
        })
    }

    pub fn lambda(parameters: Vec<String>, body: Expression) -> Expression {
        Expression::new(ExpressionKind::Lambda { parameters, body })
    }

    pub fn new_true() -> Expression {
        Expression::constant("true")
    }

    pub fn equality(left: Expression, right: Expression) -> Expression {
        Expression::apply("=", vec![left, right])
    }

    pub fn conjunction(left: Expression, right: Expression) -> Expression {
        Expression::apply("and", vec![left, right])
    }

    /// Joins a list of conjuncts back together. An empty list is "true".
    pub fn conjoin(conjuncts: Vec<Expression>) -> Expression {
        let mut iter = conjuncts.into_iter().rev();
        let Some(mut answer) = iter.next() else {
            return Expression::new_true();
        };
        for conjunct in iter {
            answer = Expression::conjunction(conjunct, answer);
        }
        answer
    }

    pub fn kind(&self) -> &ExpressionKind {
        &self.0.kind
    }

    /// The structural hash, cached at construction.
    pub fn structure_hash(&self) -> u64 {
        self.0.hash
    }

    /// The symbol name, if this is a symbol.
    pub fn name(&self) -> Option<&str> {
        match &self.0.kind {
            ExpressionKind::Symbol { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn quantification(&self) -> Quantification {
        match &self.0.kind {
            ExpressionKind::Symbol { quantification, .. } => *quantification,
            _ => Quantification::None,
        }
    }

    /// The arguments, if this is a symbol. Empty for everything else.
    pub fn args(&self) -> &[Expression] {
        match &self.0.kind {
            ExpressionKind::Symbol { args, .. } => args,
            _ => &[],
        }
    }

    /// The name of the outermost operation, if there is one.
    pub fn top_level_operation(&self) -> Option<&str> {
        self.name()
    }

    pub fn is_symbol_named(&self, expected: &str, arity: usize) -> bool {
        match &self.0.kind {
            ExpressionKind::Symbol { name, args, .. } => name == expected && args.len() == arity,
            _ => false,
        }
    }

    pub fn is_true(&self) -> bool {
        self.is_symbol_named("true", 0) && self.quantification() == Quantification::None
    }

    pub fn is_equality(&self) -> bool {
        self.is_symbol_named("=", 2)
    }

    pub fn is_conjunction(&self) -> bool {
        self.is_symbol_named("and", 2)
    }

    pub fn is_implication(&self) -> bool {
        self.is_symbol_named("implies", 2)
    }

    /// A symbol with no arguments, quantified or not.
    pub fn is_variable(&self) -> bool {
        matches!(&self.0.kind, ExpressionKind::Symbol { args, .. } if args.is_empty())
    }

    /// A quantified symbol with no arguments.
    pub fn is_quantified_variable(&self) -> bool {
        self.is_variable() && self.quantification().is_quantified()
    }

    /// A symbol that stands for a fixed value rather than something that could be substituted.
    pub fn is_literal(&self) -> bool {
        match &self.0.kind {
            ExpressionKind::Symbol { name, args, .. } if args.is_empty() => {
                name == "true"
                    || name == "false"
                    || name == "empty_string"
                    || name.chars().all(|c| c.is_ascii_digit())
            }
            _ => false,
        }
    }

    /// Something like "true" or "a = a".
    pub fn is_obviously_true(&self) -> bool {
        if self.is_true() {
            return true;
        }
        if self.is_equality() {
            let args = self.args();
            return args[0] == args[1];
        }
        false
    }

    pub fn num_sub_expressions(&self) -> usize {
        match &self.0.kind {
            ExpressionKind::Symbol { args, .. } => args.len(),
            ExpressionKind::Alternatives { branches, .. } => branches.len() * 2 + 1,
            ExpressionKind::Lambda { .. } => 1,
        }
    }

    /// Sub-expressions are indexed as: arguments for symbols; condition, result, condition,
    /// result, ..., otherwise for alternatives; just the body for lambdas.
    pub fn sub_expression(&self, index: usize) -> Option<&Expression> {
        match &self.0.kind {
            ExpressionKind::Symbol { args, .. } => args.get(index),
            ExpressionKind::Alternatives {
                branches,
                otherwise,
            } => {
                if index == branches.len() * 2 {
                    Some(otherwise)
                } else {
                    let (condition, result) = branches.get(index / 2)?;
                    Some(if index % 2 == 0 { condition } else { result })
                }
            }
            ExpressionKind::Lambda { body, .. } => {
                if index == 0 {
                    Some(body)
                } else {
                    None
                }
            }
        }
    }

    pub fn sub_expressions(&self) -> impl Iterator<Item = &Expression> {
        (0..self.num_sub_expressions()).filter_map(move |i| self.sub_expression(i))
    }

    /// Follows a path of sub-expression indices down from this expression.
    pub fn at_path(&self, path: &[usize]) -> Option<&Expression> {
        let mut current = self;
        for &i in path {
            current = current.sub_expression(i)?;
        }
        Some(current)
    }

    /// Returns a copy of this expression with one immediate sub-expression replaced.
    /// None if the index is out of range.
    pub fn with_sub_expression_replaced(&self, index: usize, e: Expression) -> Option<Expression> {
        let kind = match &self.0.kind {
            ExpressionKind::Symbol {
                name,
                quantification,
                args,
            } => {
                if index >= args.len() {
                    return None;
                }
                let mut args = args.clone();
                args[index] = e;
                ExpressionKind::Symbol {
                    name: name.clone(),
                    quantification: *quantification,
                    args,
                }
            }
            ExpressionKind::Alternatives {
                branches,
                otherwise,
            } => {
                let mut branches = branches.clone();
                let mut otherwise = otherwise.clone();
                if index == branches.len() * 2 {
                    otherwise = e;
                } else {
                    let branch = branches.get_mut(index / 2)?;
                    if index % 2 == 0 {
                        branch.0 = e;
                    } else {
                        branch.1 = e;
                    }
                }
                ExpressionKind::Alternatives {
                    branches,
                    otherwise,
                }
            }
            ExpressionKind::Lambda { parameters, .. } => {
                if index != 0 {
                    return None;
                }
                ExpressionKind::Lambda {
                    parameters: parameters.clone(),
                    body: e,
                }
            }
        };
        Some(Expression::new(kind))
    }

    /// Returns a copy of this expression with the sub-expression at the path replaced.
    /// An empty path replaces the whole thing. None if the path doesn't exist.
    pub fn with_site_altered(&self, path: &[usize], new_value: Expression) -> Option<Expression> {
        match path.split_first() {
            None => Some(new_value),
            Some((&first, rest)) => {
                let child = self.sub_expression(first)?;
                let altered = child.with_site_altered(rest, new_value)?;
                self.with_sub_expression_replaced(first, altered)
            }
        }
    }

    /// Replaces every occurrence of a key with its value.
    ///
    /// If a zero-argument key names the head of an application, the head is renamed to the
    /// value, which lets a bound function variable like ?f(x) become g(x).
    /// Lambda parameters shadow unquantified keys of the same name.
    pub fn substitute(&self, substitutions: &HashMap<Expression, Expression>) -> Expression {
        if substitutions.is_empty() {
            return self.clone();
        }
        if let Some(replacement) = substitutions.get(self) {
            return replacement.clone();
        }
        match &self.0.kind {
            ExpressionKind::Symbol {
                name,
                quantification,
                args,
            } => {
                if args.is_empty() {
                    return self.clone();
                }
                let mut new_name = name.clone();
                let mut new_quantification = *quantification;
                let head = Expression::quantified_apply(name, *quantification, vec![]);
                if let Some(renamed) = substitutions.get(&head) {
                    if let ExpressionKind::Symbol {
                        name,
                        quantification,
                        args,
                    } = &renamed.0.kind
                    {
                        if args.is_empty() {
                            new_name = name.clone();
                            new_quantification = *quantification;
                        }
                    }
                }
                let new_args: Vec<Expression> =
                    args.iter().map(|arg| arg.substitute(substitutions)).collect();
                if new_name == *name
                    && new_quantification == *quantification
                    && new_args.iter().zip(args).all(|(a, b)| Arc::ptr_eq(&a.0, &b.0))
                {
                    return self.clone();
                }
                Expression::new(ExpressionKind::Symbol {
                    name: new_name,
                    quantification: new_quantification,
                    args: new_args,
                })
            }
            ExpressionKind::Alternatives {
                branches,
                otherwise,
            } => Expression::alternatives(
                branches
                    .iter()
                    .map(|(c, r)| (c.substitute(substitutions), r.substitute(substitutions)))
                    .collect(),
                otherwise.substitute(substitutions),
            ),
            ExpressionKind::Lambda { parameters, body } => {
                let shadowed = |key: &Expression| {
                    key.quantification() == Quantification::None
                        && key.is_variable()
                        && key.name().map_or(false, |n| parameters.iter().any(|p| p == n))
                };
                if substitutions.keys().any(|k| shadowed(k)) {
                    let filtered: HashMap<Expression, Expression> = substitutions
                        .iter()
                        .filter(|(k, _)| !shadowed(k))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    Expression::lambda(parameters.clone(), body.substitute(&filtered))
                } else {
                    Expression::lambda(parameters.clone(), body.substitute(substitutions))
                }
            }
        }
    }

    /// Splits a top-level conjunction into its conjuncts, recursively.
    pub fn split_into_conjuncts(&self) -> Vec<Expression> {
        let mut answer = vec![];
        self.split_into_conjuncts_helper(&mut answer);
        answer
    }

    fn split_into_conjuncts_helper(&self, output: &mut Vec<Expression>) {
        if self.is_conjunction() {
            let args = self.args();
            args[0].split_into_conjuncts_helper(output);
            args[1].split_into_conjuncts_helper(output);
        } else {
            output.push(self.clone());
        }
    }

    /// Turns every "for all" into "there exists" and vice versa.
    pub fn flip_quantifiers(&self) -> Expression {
        match &self.0.kind {
            ExpressionKind::Symbol {
                name,
                quantification,
                args,
            } => Expression::new(ExpressionKind::Symbol {
                name: name.clone(),
                quantification: quantification.flipped(),
                args: args.iter().map(|a| a.flip_quantifiers()).collect(),
            }),
            ExpressionKind::Alternatives {
                branches,
                otherwise,
            } => Expression::alternatives(
                branches
                    .iter()
                    .map(|(c, r)| (c.flip_quantifiers(), r.flip_quantifiers()))
                    .collect(),
                otherwise.flip_quantifiers(),
            ),
            ExpressionKind::Lambda { parameters, body } => {
                Expression::lambda(parameters.clone(), body.flip_quantifiers())
            }
        }
    }

    /// Whether any symbol, at any depth, has this name.
    pub fn contains_name(&self, name: &str) -> bool {
        if self.name() == Some(name) {
            return true;
        }
        self.sub_expressions().any(|e| e.contains_name(name))
    }

    pub fn symbol_names(&self) -> HashSet<String> {
        let mut answer = HashSet::new();
        self.collect_symbol_names(&mut answer);
        answer
    }

    fn collect_symbol_names(&self, output: &mut HashSet<String>) {
        if let Some(name) = self.name() {
            output.insert(name.to_string());
        }
        for e in self.sub_expressions() {
            e.collect_symbol_names(output);
        }
    }

    /// The quantified variables of this expression, as zero-argument symbols.
    /// A quantified function head like ?f in ?f(x) counts as the variable ?f.
    pub fn quantified_variables(&self) -> HashSet<Expression> {
        let mut answer = HashSet::new();
        self.collect_quantified_variables(&mut answer);
        answer
    }

    fn collect_quantified_variables(&self, output: &mut HashSet<Expression>) {
        if let ExpressionKind::Symbol {
            name,
            quantification,
            args,
        } = &self.0.kind
        {
            if quantification.is_quantified() {
                if args.is_empty() {
                    output.insert(self.clone());
                } else {
                    output.insert(Expression::quantified_apply(name, *quantification, vec![]));
                }
            }
        }
        for e in self.sub_expressions() {
            e.collect_quantified_variables(output);
        }
    }

    pub fn has_quantified_variables(&self) -> bool {
        if self.quantification().is_quantified() {
            return true;
        }
        self.sub_expressions().any(|e| e.has_quantified_variables())
    }

    pub fn contains_existential(&self) -> bool {
        if self.quantification() == Quantification::ThereExists {
            return true;
        }
        self.sub_expressions().any(|e| e.contains_existential())
    }

    /// The number of symbols applied to at least one argument, anywhere in the tree.
    pub fn function_applications(&self) -> usize {
        self.0.function_applications
    }

    /// Whether two expressions are the same up to a consistent renaming of quantified
    /// variables and lambda parameters.
    pub fn equivalent(&self, other: &Expression) -> bool {
        let mut renaming = Renaming::default();
        renaming.equivalent(self, other)
    }

    /// Records symbol arities, returning the first symbol found with two different ones.
    pub fn find_arity_conflict(
        &self,
        arities: &mut HashMap<String, usize>,
    ) -> Option<(String, usize, usize)> {
        if let ExpressionKind::Symbol { name, args, .. } = &self.0.kind {
            match arities.get(name) {
                Some(&arity) if arity != args.len() => {
                    return Some((name.clone(), arity, args.len()));
                }
                Some(_) => {}
                None => {
                    arities.insert(name.clone(), args.len());
                }
            }
        }
        for e in self.sub_expressions() {
            if let Some(conflict) = e.find_arity_conflict(arities) {
                return Some(conflict);
            }
        }
        None
    }

    fn is_infix(&self) -> bool {
        match &self.0.kind {
            ExpressionKind::Symbol {
                name,
                quantification: Quantification::None,
                args,
            } => args.len() == 2 && INFIX_OPERATORS.contains(&name.as_str()),
            _ => false,
        }
    }

    fn is_negation(&self) -> bool {
        self.is_symbol_named("not", 1) && self.quantification() == Quantification::None
    }

    // Whether this needs parentheses when it appears inside another expression.
    fn needs_parens(&self) -> bool {
        self.is_infix()
            || self.is_negation()
            || !matches!(self.0.kind, ExpressionKind::Symbol { .. })
    }
}

/// Tracks the pairing of bound names while checking equivalence.
#[derive(Default)]
struct Renaming {
    forward: HashMap<(String, Quantification), (String, Quantification)>,
    backward: HashMap<(String, Quantification), (String, Quantification)>,

    // Lambda parameters in scope, innermost last.
    parameters: Vec<(String, String)>,
}

impl Renaming {
    fn pair(&mut self, left: (String, Quantification), right: (String, Quantification)) -> bool {
        match (self.forward.get(&left), self.backward.get(&right)) {
            (None, None) => {
                self.forward.insert(left.clone(), right.clone());
                self.backward.insert(right, left);
                true
            }
            (Some(l), Some(r)) => *l == right && *r == left,
            _ => false,
        }
    }

    fn names_match(&mut self, left: &str, lq: Quantification, right: &str, rq: Quantification) -> bool {
        if lq != rq {
            return false;
        }
        if lq.is_quantified() {
            return self.pair((left.to_string(), lq), (right.to_string(), rq));
        }
        for (l, r) in self.parameters.iter().rev() {
            if l == left || r == right {
                return l == left && r == right;
            }
        }
        left == right
    }

    fn equivalent(&mut self, left: &Expression, right: &Expression) -> bool {
        match (left.kind(), right.kind()) {
            (
                ExpressionKind::Symbol {
                    name: ln,
                    quantification: lq,
                    args: la,
                },
                ExpressionKind::Symbol {
                    name: rn,
                    quantification: rq,
                    args: ra,
                },
            ) => {
                la.len() == ra.len()
                    && self.names_match(ln, *lq, rn, *rq)
                    && la.iter().zip(ra).all(|(a, b)| self.equivalent(a, b))
            }
            (
                ExpressionKind::Alternatives {
                    branches: lb,
                    otherwise: lo,
                },
                ExpressionKind::Alternatives {
                    branches: rb,
                    otherwise: ro,
                },
            ) => {
                lb.len() == rb.len()
                    && lb
                        .iter()
                        .zip(rb)
                        .all(|((lc, lr), (rc, rr))| self.equivalent(lc, rc) && self.equivalent(lr, rr))
                    && self.equivalent(lo, ro)
            }
            (
                ExpressionKind::Lambda {
                    parameters: lp,
                    body: lbody,
                },
                ExpressionKind::Lambda {
                    parameters: rp,
                    body: rbody,
                },
            ) => {
                if lp.len() != rp.len() {
                    return false;
                }
                let depth = self.parameters.len();
                self.parameters
                    .extend(lp.iter().cloned().zip(rp.iter().cloned()));
                let answer = self.equivalent(lbody, rbody);
                self.parameters.truncate(depth);
                answer
            }
            _ => false,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0.kind {
            ExpressionKind::Symbol {
                name,
                quantification,
                args,
            } => {
                if self.is_infix() {
                    write_child(f, &args[0])?;
                    write!(f, " {} ", name)?;
                    return write_child(f, &args[1]);
                }
                if self.is_negation() {
                    write!(f, "not ")?;
                    return write_child(f, &args[0]);
                }
                match quantification {
                    Quantification::None => {}
                    Quantification::ForAll => write!(f, "?")?,
                    Quantification::ThereExists => write!(f, "@")?,
                }
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            ExpressionKind::Alternatives {
                branches,
                otherwise,
            } => {
                for (i, (condition, result)) in branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, " else ")?;
                    }
                    write!(f, "if ")?;
                    write_child(f, condition)?;
                    write!(f, " then ")?;
                    write_child(f, result)?;
                }
                write!(f, " else ")?;
                write_child(f, otherwise)
            }
            ExpressionKind::Lambda { parameters, body } => {
                write!(f, "lambda {}. {}", parameters.join(", "), body)
            }
        }
    }
}

fn write_child(f: &mut fmt::Formatter, child: &Expression) -> fmt::Result {
    if child.needs_parens() {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Expression {
        Expression::parse(s)
    }

    #[test]
    fn test_equal_expressions_share_hashes() {
        let a = parse("f(x, g(y)) = h(1)");
        let b = parse("f(x, g(y)) = h(1)");
        assert!(!Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
        assert_eq!(a.structure_hash(), b.structure_hash());
        assert_ne!(a.structure_hash(), parse("f(x, g(y)) = h(2)").structure_hash());
    }

    #[test]
    fn test_quantification_is_part_of_identity() {
        assert_ne!(parse("x"), parse("?x"));
        assert_ne!(parse("?x"), parse("@x"));
        assert_eq!(parse("?x"), Expression::variable("x"));
    }

    #[test]
    fn test_with_site_altered() {
        let e = parse("f(a, g(b, c))");
        let altered = e.with_site_altered(&[1, 0], parse("h(d)")).unwrap();
        assert_eq!(altered, parse("f(a, g(h(d), c))"));
        // The original is untouched.
        assert_eq!(e, parse("f(a, g(b, c))"));
        assert!(e.with_site_altered(&[2], parse("d")).is_none());
        assert_eq!(e.with_site_altered(&[], parse("d")).unwrap(), parse("d"));
    }

    #[test]
    fn test_alternatives_sub_expressions() {
        let e = parse("if p then a else if q then b else c");
        assert_eq!(e.num_sub_expressions(), 5);
        assert_eq!(e.sub_expression(2).unwrap(), &parse("q"));
        assert_eq!(e.sub_expression(4).unwrap(), &parse("c"));
        let altered = e.with_sub_expression_replaced(3, parse("d")).unwrap();
        assert_eq!(altered, parse("if p then a else if q then d else c"));
    }

    #[test]
    fn test_substitute() {
        let mut map = HashMap::new();
        map.insert(parse("?x"), parse("f(y)"));
        let e = parse("g(?x, ?x, x)");
        assert_eq!(e.substitute(&map), parse("g(f(y), f(y), x)"));
    }

    #[test]
    fn test_substitute_function_head() {
        let mut map = HashMap::new();
        map.insert(parse("?f"), parse("g"));
        assert_eq!(parse("?f(a) = b").substitute(&map), parse("g(a) = b"));
    }

    #[test]
    fn test_substitute_respects_lambda_shadowing() {
        let mut map = HashMap::new();
        map.insert(parse("x"), parse("5"));
        let e = parse("f(x, lambda x. x + y)");
        assert_eq!(e.substitute(&map), parse("f(5, lambda x. x + y)"));
    }

    #[test]
    fn test_split_into_conjuncts() {
        let conjuncts = parse("a and (b and c) and d = e").split_into_conjuncts();
        assert_eq!(
            conjuncts,
            vec![parse("a"), parse("b"), parse("c"), parse("d = e")]
        );
        assert_eq!(Expression::conjoin(conjuncts.clone()).split_into_conjuncts(), conjuncts);
    }

    #[test]
    fn test_obviously_true() {
        assert!(parse("true").is_obviously_true());
        assert!(parse("f(a) = f(a)").is_obviously_true());
        assert!(!parse("f(a) = f(b)").is_obviously_true());
        assert!(!parse("?true").is_obviously_true());
    }

    #[test]
    fn test_flip_quantifiers() {
        assert_eq!(parse("f(?x, @y, z)").flip_quantifiers(), parse("f(@x, ?y, z)"));
    }

    #[test]
    fn test_function_applications() {
        assert_eq!(parse("x").function_applications(), 0);
        assert_eq!(parse("f(x) + 0").function_applications(), 2);
        assert_eq!(parse("?x + 0 = ?x").function_applications(), 2);
    }

    #[test]
    fn test_quantified_variables() {
        let vars = parse("?f(?x, y) = @z").quantified_variables();
        assert_eq!(vars.len(), 3);
        assert!(vars.contains(&parse("?f")));
        assert!(vars.contains(&parse("?x")));
        assert!(vars.contains(&parse("@z")));
    }

    #[test]
    fn test_equivalent_is_weaker_than_equal() {
        assert!(parse("f(?x, ?y)").equivalent(&parse("f(?a, ?b)")));
        assert!(!parse("f(?x, ?y)").equivalent(&parse("f(?a, ?a)")));
        assert!(!parse("f(?x, ?x)").equivalent(&parse("f(?a, ?b)")));
        assert!(!parse("f(?x)").equivalent(&parse("f(@x)")));
        assert!(!parse("f(x)").equivalent(&parse("f(y)")));
        assert!(parse("lambda x. x + c").equivalent(&parse("lambda y. y + c")));
        assert!(!parse("lambda x. x + c").equivalent(&parse("lambda y. x + c")));
        assert_ne!(parse("f(?x)"), parse("f(?a)"));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", parse("f(?x, @y) = (a + b) * c")), "f(?x, @y) = ((a + b) * c)");
        assert_eq!(format!("{}", parse("not p and q")), "(not p) and q");
        assert_eq!(
            format!("{}", parse("if p then a else b")),
            "if p then a else b"
        );
    }

    #[test]
    fn test_is_literal() {
        assert!(parse("0").is_literal());
        assert!(parse("17").is_literal());
        assert!(parse("false").is_literal());
        assert!(!parse("x").is_literal());
        assert!(!parse("f(1)").is_literal());
    }

    #[test]
    fn test_arity_conflict() {
        let mut arities = HashMap::new();
        assert_eq!(
            parse("f(a) = f(a, b)").find_arity_conflict(&mut arities),
            Some(("f".to_string(), 1, 2))
        );
        let mut arities = HashMap::new();
        assert_eq!(parse("f(a) = g(f(b))").find_arity_conflict(&mut arities), None);
    }
}
