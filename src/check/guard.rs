//! Guard mini-language.
//!
//! Guards are boolean preconditions over a fixed set of predicates. Nothing
//! outside this grammar is evaluated, so a guard can never run arbitrary code.
//!
//! ```text
//! expr   := and ("or" and)*
//! and    := unary ("and" unary)*
//! unary  := "not" unary | atom
//! atom   := "(" expr ")" | "true" | "false" | "True" | "False"
//!         | pred "(" name ")"
//!         | string "in" ("globals" "(" ")" | "sys.modules" | "registry")
//! pred   := "resolves" | "defined" | "module" | "registered"
//! name   := identifier | string
//! ```

use crate::program::{Origin, Program};
use crate::registry::Registry;

use super::{Finding, FindingKind};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown predicate '{0}'")]
    UnknownPredicate(String),
    #[error("empty expression")]
    Empty,
}

/// Parsed guard expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardExpr {
    Literal(bool),
    /// The symbol resolves in the program.
    Resolves(String),
    /// A module with this name is loaded.
    ModuleLoaded(String),
    /// An entity with this name carries at least one annotation.
    Registered(String),
    Not(Box<GuardExpr>),
    And(Box<GuardExpr>, Box<GuardExpr>),
    Or(Box<GuardExpr>, Box<GuardExpr>),
}

/// What a guard can observe.
pub struct GuardScope<'a> {
    pub program: &'a Program,
    pub registry: &'a Registry,
}

impl GuardExpr {
    pub fn eval(&self, scope: &GuardScope<'_>) -> bool {
        match self {
            GuardExpr::Literal(b) => *b,
            GuardExpr::Resolves(name) => scope.program.resolves(name),
            GuardExpr::ModuleLoaded(name) => scope.program.is_module_loaded(name),
            GuardExpr::Registered(name) => scope
                .registry
                .entries()
                .iter()
                .any(|e| scope.program.entity(e.target).name == *name),
            GuardExpr::Not(inner) => !inner.eval(scope),
            GuardExpr::And(a, b) => a.eval(scope) && b.eval(scope),
            GuardExpr::Or(a, b) => a.eval(scope) || b.eval(scope),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::Number(s) => write!(f, "number {}", s),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, GuardError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '\'' | '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for (_, ch) in chars.by_ref() {
                    if ch == c {
                        closed = true;
                        break;
                    }
                    value.push(ch);
                }
                if !closed {
                    return Err(GuardError::UnterminatedString);
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() => {
                let mut value = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if !d.is_ascii_alphanumeric() && d != '.' {
                        break;
                    }
                    value.push(d);
                    chars.next();
                }
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut value = String::new();
                while let Some(&(_, d)) = chars.peek() {
                    if !d.is_alphanumeric() && d != '_' && d != '.' {
                        break;
                    }
                    value.push(d);
                    chars.next();
                }
                tokens.push(Token::Ident(value));
            }
            other => return Err(GuardError::UnexpectedChar(other, pos)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, GuardError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(GuardError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(s)) if s == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, want: Token) -> Result<(), GuardError> {
        let got = self.next()?;
        if got == want {
            Ok(())
        } else {
            Err(GuardError::UnexpectedToken(got.to_string()))
        }
    }

    fn expr(&mut self) -> Result<GuardExpr, GuardError> {
        let mut lhs = self.and()?;
        while self.eat_keyword("or") {
            let rhs = self.and()?;
            lhs = GuardExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<GuardExpr, GuardError> {
        let mut lhs = self.unary()?;
        while self.eat_keyword("and") {
            let rhs = self.unary()?;
            lhs = GuardExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<GuardExpr, GuardError> {
        if self.eat_keyword("not") {
            return Ok(GuardExpr::Not(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<GuardExpr, GuardError> {
        match self.next()? {
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Str(name) => self.membership(name),
            Token::Ident(word) => match word.as_str() {
                "true" | "True" => Ok(GuardExpr::Literal(true)),
                "false" | "False" => Ok(GuardExpr::Literal(false)),
                "resolves" | "defined" | "module" | "registered" => {
                    self.expect(Token::LParen)?;
                    let name = match self.next()? {
                        Token::Ident(s) | Token::Str(s) => s,
                        other => return Err(GuardError::UnexpectedToken(other.to_string())),
                    };
                    self.expect(Token::RParen)?;
                    Ok(match word.as_str() {
                        "module" => GuardExpr::ModuleLoaded(name),
                        "registered" => GuardExpr::Registered(name),
                        _ => GuardExpr::Resolves(name),
                    })
                }
                _ => Err(GuardError::UnknownPredicate(word.clone())),
            },
            other => Err(GuardError::UnexpectedToken(other.to_string())),
        }
    }

    /// `'name' in globals()` and friends.
    fn membership(&mut self, name: String) -> Result<GuardExpr, GuardError> {
        if !self.eat_keyword("in") {
            return match self.peek() {
                Some(t) => Err(GuardError::UnexpectedToken(t.to_string())),
                None => Err(GuardError::UnexpectedEnd),
            };
        }
        match self.next()? {
            Token::Ident(s) if s == "globals" => {
                self.expect(Token::LParen)?;
                self.expect(Token::RParen)?;
                Ok(GuardExpr::Resolves(name))
            }
            Token::Ident(s) if s == "sys.modules" => Ok(GuardExpr::ModuleLoaded(name)),
            Token::Ident(s) if s == "registry" => Ok(GuardExpr::Registered(name)),
            other => Err(GuardError::UnexpectedToken(other.to_string())),
        }
    }
}

/// Parse a guard expression.
pub fn parse_guard(text: &str) -> Result<GuardExpr, GuardError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(GuardError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(GuardError::UnexpectedToken(extra.to_string()));
    }
    Ok(expr)
}

/// Evaluate `expression` for `entity`. Parse failures and false results become findings.
pub fn check_guard(
    scope: &GuardScope<'_>,
    entity: &str,
    origin: Option<&Origin>,
    expression: &str,
) -> Vec<Finding> {
    let finding = match parse_guard(expression) {
        Ok(expr) if expr.eval(scope) => return Vec::new(),
        Ok(_) => Finding::new(
            FindingKind::GuardFailed,
            entity,
            format!("guard condition failed -> {}", expression),
        ),
        Err(e) => Finding::new(
            FindingKind::GuardEvaluationError,
            entity,
            format!("guard condition error '{}' -> {}", expression, e),
        ),
    };
    vec![finding.with_origin(origin.cloned())]
}
