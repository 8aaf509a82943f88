// A small text notation for expressions, used by problem files and tests.
//
//   f(a, b)                 application
//   ?x, ?f(a)               universally quantified variable or function
//   @x                      existentially quantified variable
//   a implies b             lowest precedence, right associative
//   a or b
//   a and b
//   not a
//   a = b, a /= b, a < b, a <= b, a > b, a >= b
//   a + b, a - b
//   a * b, a / b            highest precedence
//   if c then a else b      chains of "else if" flatten into one expression
//   lambda x, y. body

use std::fmt;

use crate::expression::{Expression, Quantification};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "at character {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Debug, PartialEq, Eq)]
enum TokenKind {
    Identifier(String),
    Number(String),
    ForAll(String),
    ThereExists(String),
    Operator(&'static str),
    LeftParen,
    RightParen,
    Comma,
    Dot,
}

#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    position: usize,
}

const SYMBOLIC_OPERATORS: [&str; 10] = ["/=", "<=", ">=", "=", "<", ">", "+", "-", "*", "/"];

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = vec![];
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let position = i;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let simple = match c {
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            ',' => Some(TokenKind::Comma),
            '.' => Some(TokenKind::Dot),
            _ => None,
        };
        if let Some(kind) = simple {
            tokens.push(Token { kind, position });
            i += 1;
            continue;
        }
        if c == '?' || c == '@' || is_identifier_start(c) {
            let start = if c == '?' || c == '@' { i + 1 } else { i };
            let mut end = start;
            while end < chars.len() && is_identifier_char(chars[end]) {
                end += 1;
            }
            if end == start || !is_identifier_start(chars[start]) {
                return Err(ParseError {
                    position,
                    message: format!("expected a name after '{}'", c),
                });
            }
            let name: String = chars[start..end].iter().collect();
            let kind = match c {
                '?' => TokenKind::ForAll(name),
                '@' => TokenKind::ThereExists(name),
                _ => TokenKind::Identifier(name),
            };
            tokens.push(Token { kind, position });
            i = end;
            continue;
        }
        if c.is_ascii_digit() {
            let mut end = i;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Number(chars[i..end].iter().collect()),
                position,
            });
            i = end;
            continue;
        }
        let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
        match SYMBOLIC_OPERATORS.iter().find(|op| rest.starts_with(*op)) {
            Some(op) => {
                tokens.push(Token {
                    kind: TokenKind::Operator(op),
                    position,
                });
                i += op.len();
            }
            None => {
                return Err(ParseError {
                    position,
                    message: format!("unexpected character '{}'", c),
                });
            }
        }
    }
    Ok(tokens)
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    end_position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.index)
            .map_or(self.end_position, |t| t.position)
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError {
            position: self.position(),
            message: message.into(),
        })
    }

    fn next(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.index)?.kind.clone();
        self.index += 1;
        Some(token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Identifier(name)) if name == keyword)
    }

    fn peek_operator(&self, candidates: &[&str]) -> Option<&'static str> {
        match self.peek() {
            Some(TokenKind::Operator(op)) if candidates.contains(op) => Some(op),
            _ => None,
        }
    }

    fn expect(&mut self, expected: TokenKind, description: &str) -> Result<(), ParseError> {
        if self.peek() == Some(&expected) {
            self.index += 1;
            Ok(())
        } else {
            self.error(format!("expected {}", description))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.peek_keyword(keyword) {
            self.index += 1;
            Ok(())
        } else {
            self.error(format!("expected '{}'", keyword))
        }
    }

    fn parse_implication(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_disjunction()?;
        if self.peek_keyword("implies") {
            self.index += 1;
            let right = self.parse_implication()?;
            return Ok(Expression::apply("implies", vec![left, right]));
        }
        Ok(left)
    }

    fn parse_disjunction(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_conjunction()?;
        while self.peek_keyword("or") {
            self.index += 1;
            let right = self.parse_conjunction()?;
            left = Expression::apply("or", vec![left, right]);
        }
        Ok(left)
    }

    fn parse_conjunction(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_negation()?;
        while self.peek_keyword("and") {
            self.index += 1;
            let right = self.parse_negation()?;
            left = Expression::conjunction(left, right);
        }
        Ok(left)
    }

    fn parse_negation(&mut self) -> Result<Expression, ParseError> {
        if self.peek_keyword("not") {
            self.index += 1;
            let operand = self.parse_negation()?;
            return Ok(Expression::apply("not", vec![operand]));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_additive()?;
        if let Some(op) = self.peek_operator(&["=", "/=", "<", "<=", ">", ">="]) {
            self.index += 1;
            let right = self.parse_additive()?;
            return Ok(Expression::apply(op, vec![left, right]));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) = self.peek_operator(&["+", "-"]) {
            self.index += 1;
            let right = self.parse_multiplicative()?;
            left = Expression::apply(op, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_primary()?;
        while let Some(op) = self.peek_operator(&["*", "/"]) {
            self.index += 1;
            let right = self.parse_primary()?;
            left = Expression::apply(op, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        if self.peek() != Some(&TokenKind::LeftParen) {
            return Ok(vec![]);
        }
        self.index += 1;
        let mut args = vec![self.parse_implication()?];
        while self.peek() == Some(&TokenKind::Comma) {
            self.index += 1;
            args.push(self.parse_implication()?);
        }
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(args)
    }

    fn parse_alternatives(&mut self) -> Result<Expression, ParseError> {
        let mut branches = vec![];
        loop {
            let condition = self.parse_implication()?;
            self.expect_keyword("then")?;
            let result = self.parse_implication()?;
            branches.push((condition, result));
            self.expect_keyword("else")?;
            if self.peek_keyword("if") {
                self.index += 1;
                continue;
            }
            let otherwise = self.parse_implication()?;
            return Ok(Expression::alternatives(branches, otherwise));
        }
    }

    fn parse_lambda(&mut self) -> Result<Expression, ParseError> {
        let mut parameters = vec![];
        loop {
            match self.next() {
                Some(TokenKind::Identifier(name)) if !is_keyword(&name) => parameters.push(name),
                _ => {
                    self.index = self.index.saturating_sub(1);
                    return self.error("expected a lambda parameter");
                }
            }
            if self.peek() == Some(&TokenKind::Comma) {
                self.index += 1;
            } else {
                break;
            }
        }
        self.expect(TokenKind::Dot, "'.'")?;
        let body = self.parse_implication()?;
        Ok(Expression::lambda(parameters, body))
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let Some(token) = self.next() else {
            return self.error("unexpected end of input");
        };
        match token {
            TokenKind::LeftParen => {
                let inner = self.parse_implication()?;
                self.expect(TokenKind::RightParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Number(digits) => Ok(Expression::constant(&digits)),
            TokenKind::Identifier(name) if name == "if" => self.parse_alternatives(),
            TokenKind::Identifier(name) if name == "lambda" => self.parse_lambda(),
            TokenKind::Identifier(name) if is_keyword(&name) => {
                self.index -= 1;
                self.error(format!("unexpected '{}'", name))
            }
            TokenKind::Identifier(name) => {
                let args = self.parse_arguments()?;
                Ok(Expression::apply(&name, args))
            }
            TokenKind::ForAll(name) => {
                let args = self.parse_arguments()?;
                Ok(Expression::quantified_apply(&name, Quantification::ForAll, args))
            }
            TokenKind::ThereExists(name) => {
                let args = self.parse_arguments()?;
                Ok(Expression::quantified_apply(
                    &name,
                    Quantification::ThereExists,
                    args,
                ))
            }
            _ => {
                self.index -= 1;
                self.error("expected an expression")
            }
        }
    }
}

fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "implies" | "or" | "and" | "not" | "if" | "then" | "else" | "lambda"
    )
}

/// Parses a complete expression from text.
pub fn parse_expression(input: &str) -> Result<Expression, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        end_position: input.chars().count(),
    };
    let answer = parser.parse_implication()?;
    if parser.peek().is_some() {
        return parser.error("unexpected trailing input");
    }
    Ok(answer)
}

impl Expression {
    /// Parses an expression, panicking on bad input. For tests.
    #[cfg(test)]
    pub fn parse(input: &str) -> Expression {
        match parse_expression(input) {
            Ok(e) => e,
            Err(e) => panic!("could not parse \"{}\": {}", input, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_round_trip(input: &str) {
        let first = Expression::parse(input);
        let second = Expression::parse(&first.to_string());
        assert_eq!(first, second, "{} did not survive printing", input);
    }

    #[test]
    fn test_precedence() {
        let e = Expression::parse("a implies b or c and d = e + f * g");
        assert_eq!(e.top_level_operation(), Some("implies"));
        let right = &e.args()[1];
        assert_eq!(right.top_level_operation(), Some("or"));
        let conjunction = &right.args()[1];
        assert_eq!(conjunction.top_level_operation(), Some("and"));
        let equality = &conjunction.args()[1];
        assert!(equality.is_equality());
        assert_eq!(equality.args()[1].top_level_operation(), Some("+"));
        assert_eq!(equality.args()[1].args()[1].top_level_operation(), Some("*"));
    }

    #[test]
    fn test_implies_is_right_associative() {
        assert_eq!(
            Expression::parse("a implies b implies c"),
            Expression::parse("a implies (b implies c)")
        );
    }

    #[test]
    fn test_arithmetic_is_left_associative() {
        assert_eq!(
            Expression::parse("a - b - c"),
            Expression::parse("(a - b) - c")
        );
    }

    #[test]
    fn test_quantifiers() {
        let e = Expression::parse("?f(?x) = @y");
        assert_eq!(e.args()[0].quantification(), Quantification::ForAll);
        assert_eq!(e.args()[0].args()[0], Expression::variable("x"));
        assert_eq!(e.args()[1], Expression::existential("y"));
    }

    #[test]
    fn test_else_if_chains_flatten() {
        let e = Expression::parse("if a then b else if c then d else e");
        match e.kind() {
            crate::expression::ExpressionKind::Alternatives { branches, .. } => {
                assert_eq!(branches.len(), 2)
            }
            _ => panic!("expected alternatives"),
        }
    }

    #[test]
    fn test_round_trips() {
        check_round_trip("f(?x, @y) = (a + b) * c");
        check_round_trip("not p and q implies r");
        check_round_trip("if x < 0 then 0 - x else x");
        check_round_trip("lambda x, y. x + y = g(lambda z. z)");
        check_round_trip("a /= b or a <= b");
        check_round_trip("s' = s");
    }

    #[test]
    fn test_errors() {
        assert!(parse_expression("f(a").is_err());
        assert!(parse_expression("a +").is_err());
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("? x").is_err());
        assert!(parse_expression("if a then b").is_err());
        assert!(parse_expression("and").is_err());
        let error = parse_expression("a $ b").unwrap_err();
        assert_eq!(error.position, 2);
    }
}
