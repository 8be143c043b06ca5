//! Turns a user supplied string into a validated symbolic expression.
//!
//! Parsing happens in two passes:
//! 1. a `nom` lexer splits the input into tokens (numbers, identifiers,
//!    operators, parentheses, commas) and rejects any other character;
//! 2. a recursive descent parser builds the `Expr` tree, checking every
//!    identifier against the function whitelist, the named constants and the
//!    declared variable while the tree is being built.
//!
//! Nothing is evaluated before the tree is complete.
//!
//! ```text
//!   sum     := product (('+' | '-') product)*
//!   product := unary (('*' | '/') unary | unary)*      <- juxtaposition before an identifier or '('
//!   unary   := ('+' | '-') unary | power
//!   power   := atom (('^' | '**') unary)?              <- right associative, binds tighter than '-'
//!   atom    := number | name | name '(' sum ')' | '(' sum ')'
//! ```
//!# Example
//! ```
//! use RustedIntegrals::symbolic::symbolic_engine::Expr;
//! let parsed = Expr::parse_expression("2x^2 + sin(x)", "x").unwrap();
//! assert_eq!(parsed.to_text(), "2*x**2 + sin(x)");
//! ```
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use itertools::Itertools;
use log::debug;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{pair, preceded},
};
use regex::Regex;
use strum::IntoEnumIterator;

use crate::errors::IntegralError;
use crate::symbolic::symbolic_engine::{Expr, Func, named_constant};

static VARIABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("variable name pattern is a valid regex")
});

/// Limits applied while parsing untrusted input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseOptions {
    /// maximum number of characters of the input
    pub max_input_len: usize,
    /// maximum nesting depth of parentheses, calls and signs
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_input_len: 500,
            max_depth: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Number(val) => write!(f, "{}", val),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//                              LEXER
////////////////////////////////////////////////////////////////////////////////

/// `2`, `2.`, `2.5`, `.5`, `1e-3`; a dangling exponent (`2e`) leaves the `e` for the next token
fn parse_number(input: &str) -> IResult<&str, Token> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    let mut parser = map_res(recognize(pair(mantissa, exponent)), |s: &str| {
        s.parse::<f64>().map(Token::Number)
    });
    parser.parse(input)
}

fn parse_identifier(input: &str) -> IResult<&str, Token> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    let mut parser = map(parser, |s: &str| Token::Ident(s.to_string()));
    parser.parse(input)
}

fn parse_operator(input: &str) -> IResult<&str, Token> {
    let mut parser = alt((
        value(Token::Caret, tag("**")),
        value(Token::Caret, char('^')),
        value(Token::Star, char('*')),
        value(Token::Slash, char('/')),
        value(Token::Plus, char('+')),
        value(Token::Minus, char('-')),
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::Comma, char(',')),
    ));
    parser.parse(input)
}

fn parse_token(input: &str) -> IResult<&str, Token> {
    let mut parser = preceded(
        multispace0,
        alt((parse_number, parse_identifier, parse_operator)),
    );
    parser.parse(input)
}

/// Splits the input into tokens paired with their character position.
pub fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, IntegralError> {
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let position = input[..input.len() - trimmed.len()].chars().count();
        match parse_token(rest) {
            Ok((remaining, token)) => {
                tokens.push((token, position));
                rest = remaining;
            }
            Err(_) => {
                let bad = trimmed.chars().next().unwrap_or(' ');
                return Err(IntegralError::ParseError(format!(
                    "unexpected character '{}' at position {}",
                    bad, position
                )));
            }
        }
    }
    Ok(tokens)
}

////////////////////////////////////////////////////////////////////////////////
//                              PARSER
////////////////////////////////////////////////////////////////////////////////

/// What bare names may stand for.
#[derive(Debug, Clone, Copy)]
enum Mode<'a> {
    /// the integrand: the declared variable is allowed
    Function(&'a str),
    /// a bound: no variable at all
    Constant,
}

struct ExprParser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
    depth: usize,
    mode: Mode<'a>,
    max_depth: usize,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [(Token, usize)], mode: Mode<'a>, options: &ParseOptions) -> Self {
        ExprParser {
            tokens,
            pos: 0,
            depth: 0,
            mode,
            max_depth: options.max_depth,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self) -> IntegralError {
        match self.tokens.get(self.pos) {
            Some((token, position)) => IntegralError::ParseError(format!(
                "unexpected '{}' at position {}",
                token, position
            )),
            None => IntegralError::ParseError("unexpected end of expression".to_string()),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), IntegralError> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            match self.peek() {
                None => Err(IntegralError::ParseError(format!(
                    "expected '{}' but the expression ended",
                    expected
                ))),
                Some(_) => Err(self.unexpected()),
            }
        }
    }

    fn enter(&mut self) -> Result<(), IntegralError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(IntegralError::ParseError(format!(
                "expression is nested too deeply (maximum depth {})",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_all(&mut self) -> Result<Expr, IntegralError> {
        let expr = self.sum()?;
        if self.pos < self.tokens.len() {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    fn sum(&mut self) -> Result<Expr, IntegralError> {
        self.enter()?;
        let mut lhs = self.product()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let rhs = self.product()?;
                    lhs = Expr::Add(lhs.boxed(), rhs.boxed());
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.product()?;
                    lhs = Expr::Sub(lhs.boxed(), rhs.boxed());
                }
                _ => break,
            }
        }
        self.leave();
        Ok(lhs)
    }

    fn product(&mut self) -> Result<Expr, IntegralError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    lhs = Expr::Mul(lhs.boxed(), rhs.boxed());
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    lhs = Expr::Div(lhs.boxed(), rhs.boxed());
                }
                // implicit multiplication: 2x, 2sin(x), 3(x+1), (x+1)(x-1), x(x+1)
                Some(Token::Ident(_)) | Some(Token::LParen) => {
                    let rhs = self.power()?;
                    lhs = Expr::Mul(lhs.boxed(), rhs.boxed());
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, IntegralError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.enter()?;
                let operand = self.unary()?;
                self.leave();
                Ok(-operand)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.enter()?;
                let operand = self.unary()?;
                self.leave();
                Ok(operand)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, IntegralError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            self.enter()?;
            let exponent = self.unary()?;
            self.leave();
            return Ok(Expr::Pow(base.boxed(), exponent.boxed()));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, IntegralError> {
        match self.peek() {
            Some(Token::Number(val)) => {
                self.pos += 1;
                Ok(Expr::Const(*val))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.sum()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                self.name(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn name(&mut self, name: &str) -> Result<Expr, IntegralError> {
        if let Ok(func) = Func::from_str(name) {
            return self.call(func, name);
        }
        if let Some(val) = named_constant(name) {
            return Ok(Expr::Const(val));
        }
        if let Mode::Function(variable) = self.mode {
            if name == variable {
                return Ok(Expr::Var(name.to_string()));
            }
        }
        if self.peek() == Some(&Token::LParen) {
            return Err(IntegralError::ParseError(format!(
                "function '{}' is not allowed, supported functions: {}",
                name,
                Func::iter().join(", ")
            )));
        }
        if name.chars().count() > 1 {
            return Err(IntegralError::ParseError(format!(
                "name '{}' is not allowed",
                name
            )));
        }
        Err(match self.mode {
            Mode::Function(variable) => IntegralError::VariableError(format!(
                "unknown symbol '{}', the expression may only depend on '{}'",
                name, variable
            )),
            Mode::Constant => IntegralError::VariableError(format!(
                "a limit must be a number, found symbol '{}'",
                name
            )),
        })
    }

    fn call(&mut self, func: Func, name: &str) -> Result<Expr, IntegralError> {
        if self.peek() != Some(&Token::LParen) {
            return Err(IntegralError::ParseError(format!(
                "function '{}' must be followed by '('",
                name
            )));
        }
        self.pos += 1;
        if self.peek() == Some(&Token::RParen) {
            return Err(IntegralError::ParseError(format!(
                "function '{}' takes exactly one argument (0 given)",
                name
            )));
        }
        let argument = self.sum()?;
        let mut given = 1;
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            self.sum()?;
            given += 1;
        }
        if given != 1 {
            return Err(IntegralError::ParseError(format!(
                "function '{}' takes exactly one argument ({} given)",
                name, given
            )));
        }
        match self.next() {
            Some(Token::RParen) => Ok(func.apply(argument)),
            Some(_) => {
                self.pos -= 1;
                Err(self.unexpected())
            }
            None => Err(IntegralError::ParseError(format!(
                "missing ')' after the argument of '{}'",
                name
            ))),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//                              PUBLIC API
////////////////////////////////////////////////////////////////////////////////

/// Validates the name of the integration variable; blank means `x`.
pub fn resolve_variable(name: &str) -> Result<String, IntegralError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok("x".to_string());
    }
    if !VARIABLE_NAME.is_match(name) {
        return Err(IntegralError::VariableError(format!(
            "'{}' is not a valid variable name",
            name
        )));
    }
    if Func::from_str(name).is_ok() || named_constant(name).is_some() {
        return Err(IntegralError::VariableError(format!(
            "'{}' is reserved and cannot be used as a variable",
            name
        )));
    }
    Ok(name.to_string())
}

fn check_input(input: &str, options: &ParseOptions) -> Result<(), IntegralError> {
    if input.trim().is_empty() {
        return Err(IntegralError::ParseError("expression is empty".to_string()));
    }
    let length = input.chars().count();
    if length > options.max_input_len {
        return Err(IntegralError::ParseError(format!(
            "expression is too long ({} characters, maximum {})",
            length, options.max_input_len
        )));
    }
    Ok(())
}

/// Parses the integrand. On success the only free symbol is `variable`
/// and constant sub-expressions are folded.
pub fn parse_function(
    input: &str,
    variable: &str,
    options: &ParseOptions,
) -> Result<Expr, IntegralError> {
    check_input(input, options)?;
    let variable = resolve_variable(variable)?;
    let tokens = tokenize(input)?;
    let mut parser = ExprParser::new(&tokens, Mode::Function(&variable), options);
    let parsed = parser.parse_all()?.fold_constants();
    if let Some(foreign) = parsed.free_symbols().into_iter().find(|s| *s != variable) {
        return Err(IntegralError::VariableError(format!(
            "unknown symbol '{}', the expression may only depend on '{}'",
            foreign, variable
        )));
    }
    debug!("parsed '{}' as {}", input.trim(), parsed);
    Ok(parsed)
}

/// Parses a bound of integration: an expression without any variable,
/// e.g. `2`, `-1.5`, `pi/2`, `sqrt(2)`.
pub fn parse_constant(input: &str, options: &ParseOptions) -> Result<Expr, IntegralError> {
    check_input(input, options)?;
    let tokens = tokenize(input)?;
    let mut parser = ExprParser::new(&tokens, Mode::Constant, options);
    Ok(parser.parse_all()?.fold_constants())
}

impl Expr {
    /// Parses `input` as a function of `variable` with the default limits.
    pub fn parse_expression(input: &str, variable: &str) -> Result<Expr, IntegralError> {
        parse_function(input, variable, &ParseOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x() -> Expr {
        Expr::Var("x".to_string())
    }

    #[test]
    fn test_tokenize_numbers_and_operators() {
        let tokens: Vec<Token> = tokenize("2.5*x**2 - .5e1/(x)")
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::Number(2.5),
                Token::Star,
                Token::Ident("x".to_string()),
                Token::Caret,
                Token::Number(2.0),
                Token::Minus,
                Token::Number(5.0),
                Token::Slash,
                Token::LParen,
                Token::Ident("x".to_string()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_dangling_exponent() {
        let tokens: Vec<Token> = tokenize("2e")
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect();
        assert_eq!(tokens, vec![Token::Number(2.0), Token::Ident("e".to_string())]);
    }

    #[test]
    fn test_tokenize_rejects_unknown_characters() {
        for input in ["x; y", "x$", "x & 1", "x[0]", "'x'", "x.y"] {
            let err = tokenize(input).unwrap_err();
            assert_eq!(err.kind(), "ParseError", "input {}", input);
        }
        let err = tokenize("x + $").unwrap_err();
        assert_eq!(err.message(), "unexpected character '$' at position 4");
    }

    #[test]
    fn test_precedence() {
        let parsed = Expr::parse_expression("1 + x*x^2", "x").unwrap();
        let expected = Expr::Add(
            Box::new(Expr::Const(1.0)),
            Box::new(Expr::Mul(
                Box::new(x()),
                Box::new(Expr::Pow(Box::new(x()), Box::new(Expr::Const(2.0)))),
            )),
        );
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_power_is_right_associative_and_binds_tighter_than_minus() {
        let parsed = Expr::parse_expression("-x^2", "x").unwrap();
        assert_relative_eq!(parsed.eval_checked(Some(("x", 3.0))).unwrap(), -9.0);
        let parsed = Expr::parse_expression("2^3^2", "x").unwrap();
        assert_eq!(parsed, Expr::Const(512.0));
        let parsed = Expr::parse_expression("x**-1", "x").unwrap();
        assert_relative_eq!(parsed.eval_checked(Some(("x", 4.0))).unwrap(), 0.25);
    }

    #[test]
    fn test_implicit_multiplication() {
        let cases = [
            ("2x", 2.0 * 1.5),
            ("2sin(x)", 2.0 * 1.5f64.sin()),
            ("3(x+1)", 3.0 * 2.5),
            ("(x+1)(x-1)", 2.5 * 0.5),
            ("x(x+1)", 1.5 * 2.5),
            ("x x", 1.5 * 1.5),
            ("2x^2", 2.0 * 1.5 * 1.5),
            ("2pi x", 2.0 * std::f64::consts::PI * 1.5),
        ];
        for (input, expected) in cases {
            let parsed = Expr::parse_expression(input, "x").unwrap();
            assert_relative_eq!(
                parsed.eval_checked(Some(("x", 1.5))).unwrap(),
                expected,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_constants_are_folded() {
        let parsed = Expr::parse_expression("2*3*x", "x").unwrap();
        assert_eq!(parsed, Expr::Mul(Box::new(Expr::Const(6.0)), Box::new(x())));
        let parsed = parse_constant("pi/2", &ParseOptions::default()).unwrap();
        assert_relative_eq!(parsed.as_const().unwrap(), std::f64::consts::FRAC_PI_2);
        assert!(parsed.free_symbols().is_empty());
    }

    #[test]
    fn test_function_aliases() {
        let a = Expr::parse_expression("tan(x) + arctg(x) + log(x)", "x").unwrap();
        let b = Expr::parse_expression("tg(x) + atan(x) + ln(x)", "x").unwrap();
        assert_eq!(a, b);
        let sqrt = Expr::parse_expression("sqrt(x)", "x").unwrap();
        assert_eq!(sqrt, Expr::Pow(Box::new(x()), Box::new(Expr::Const(0.5))));
    }

    #[test]
    fn test_custom_variable() {
        let parsed = Expr::parse_expression("t^2 + 1", "t").unwrap();
        assert_eq!(
            parsed.free_symbols().into_iter().collect::<Vec<_>>(),
            vec!["t".to_string()]
        );
        let err = Expr::parse_expression("t^2 + x", "t").unwrap_err();
        assert_eq!(err.kind(), "VariableError");
    }

    #[test]
    fn test_blank_variable_defaults_to_x() {
        assert_eq!(resolve_variable("  ").unwrap(), "x");
        let parsed = parse_function("x + 1", "", &ParseOptions::default()).unwrap();
        assert!(parsed.contains_variable("x"));
    }

    #[test]
    fn test_invalid_variable_names() {
        for name in ["1x", "x-y", "sin", "pi", "e", "log", "_x"] {
            let err = resolve_variable(name).unwrap_err();
            assert_eq!(err.kind(), "VariableError", "name {}", name);
        }
        assert_eq!(resolve_variable("theta_1").unwrap(), "theta_1");
    }

    #[test]
    fn test_disallowed_names_are_rejected() {
        for input in ["__import__('os')", "eval(x)", "os", "exec(x)", "x.__class__", "open(x)"] {
            let err = Expr::parse_expression(input, "x").unwrap_err();
            assert_eq!(err.kind(), "ParseError", "input {}", input);
        }
        let err = Expr::parse_expression("eval(x)", "x").unwrap_err();
        assert_eq!(
            err.message(),
            "function 'eval' is not allowed, supported functions: \
             sin, cos, tan, cot, asin, acos, atan, acot, exp, ln, sqrt"
        );
    }

    #[test]
    fn test_foreign_single_letter_is_variable_error() {
        let err = Expr::parse_expression("x + y", "x").unwrap_err();
        assert_eq!(err.kind(), "VariableError");
    }

    #[test]
    fn test_wrong_arity() {
        let err = Expr::parse_expression("sin(x, y)", "x").unwrap_err();
        assert_eq!(err.kind(), "ParseError");
        assert_eq!(err.message(), "function 'sin' takes exactly one argument (2 given)");
        let err = Expr::parse_expression("sin()", "x").unwrap_err();
        assert_eq!(err.message(), "function 'sin' takes exactly one argument (0 given)");
        let err = Expr::parse_expression("sin x", "x").unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }

    #[test]
    fn test_syntax_errors() {
        for input in ["", "   ", "x +", "(x + 1", "x + 1)", "*x", "x ^", "2 3", ",", "x,x"] {
            let err = Expr::parse_expression(input, "x").unwrap_err();
            assert_eq!(err.kind(), "ParseError", "input '{}'", input);
        }
    }

    #[test]
    fn test_limits() {
        let options = ParseOptions {
            max_input_len: 10,
            max_depth: 64,
        };
        let err = parse_function("x + x + x + x", "x", &options).unwrap_err();
        assert_eq!(err.kind(), "ParseError");

        let deep = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        let err = Expr::parse_expression(&deep, "x").unwrap_err();
        assert!(err.message().contains("nested too deeply"));

        let signs = format!("{}x", "-".repeat(200));
        let err = Expr::parse_expression(&signs, "x").unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }

    #[test]
    fn test_constant_mode() {
        let options = ParseOptions::default();
        let value = parse_constant("2*pi", &options).unwrap();
        assert_relative_eq!(value.as_const().unwrap(), 2.0 * std::f64::consts::PI);
        let value = parse_constant("-1.5", &options).unwrap();
        assert_relative_eq!(value.as_const().unwrap(), -1.5);
        let err = parse_constant("x", &options).unwrap_err();
        assert_eq!(err.kind(), "VariableError");
        let err = parse_constant("__import__", &options).unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }
}
