//! Rendering of expressions for the user: plain text (`x**3/3`, `-cos(x)`) and LaTeX
//! (`\frac{x^{3}}{3}`, `- \cos{\left(x \right)}`).
//!
//! Both renderers walk the tree once and place parentheses only where the precedence of
//! the child is lower than the position requires. A negative coefficient in a sum is
//! written as a subtraction. Square roots (`u^0.5`) are written as `sqrt(u)` / `\sqrt{u}`.
use std::f64::consts::{E, PI};

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{as_rational, is_integer};

/// Binding strength of the rendered string, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Sum,
    Product,
    /// a leading minus sign
    Neg,
    Power,
    Atom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Text,
    Latex,
}

fn format_number(value: f64, style: Style) -> String {
    if value == PI {
        return match style {
            Style::Text => "pi".to_string(),
            Style::Latex => "\\pi".to_string(),
        };
    }
    if value == E {
        return "e".to_string();
    }
    if is_integer(value) {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn paren(rendered: String, style: Style) -> String {
    match style {
        Style::Text => format!("({})", rendered),
        Style::Latex => format!("\\left({}\\right)", rendered),
    }
}

fn wrap(rendered: (String, Prec), min: Prec, style: Style) -> String {
    if rendered.1 < min {
        paren(rendered.0, style)
    } else {
        rendered.0
    }
}

/// Term with a negative sign in front: the same term without it.
fn negated_term(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Const(c) if *c < 0.0 => Some(Expr::Const(-c)),
        Expr::Mul(lhs, rhs) => match lhs.as_ref() {
            Expr::Const(c) if *c == -1.0 => Some(*rhs.clone()),
            Expr::Const(c) if *c < 0.0 => Some(Expr::Mul(Box::new(Expr::Const(-c)), rhs.clone())),
            _ => None,
        },
        Expr::Div(lhs, rhs) => negated_term(lhs).map(|num| Expr::Div(Box::new(num), rhs.clone())),
        _ => None,
    }
}

/// `1.5` as the exponent `3/2`
fn rational_exponent(exp: &Expr) -> Option<Expr> {
    match exp {
        Expr::Const(e) if !is_integer(*e) => as_rational(*e).map(|(p, q)| {
            Expr::Div(Box::new(Expr::Const(p as f64)), Box::new(Expr::Const(q as f64)))
        }),
        _ => None,
    }
}

fn function_name(expr: &Expr, style: Style) -> &'static str {
    match (expr, style) {
        (Expr::Exp(_), Style::Text) => "exp",
        (Expr::Ln(_), Style::Text) => "log",
        (Expr::sin(_), Style::Text) => "sin",
        (Expr::cos(_), Style::Text) => "cos",
        (Expr::tg(_), Style::Text) => "tan",
        (Expr::ctg(_), Style::Text) => "cot",
        (Expr::arcsin(_), Style::Text) => "asin",
        (Expr::arccos(_), Style::Text) => "acos",
        (Expr::arctg(_), Style::Text) => "atan",
        (Expr::arcctg(_), Style::Text) => "acot",
        (Expr::Exp(_), Style::Latex) => "\\exp",
        (Expr::Ln(_), Style::Latex) => "\\log",
        (Expr::sin(_), Style::Latex) => "\\sin",
        (Expr::cos(_), Style::Latex) => "\\cos",
        (Expr::tg(_), Style::Latex) => "\\tan",
        (Expr::ctg(_), Style::Latex) => "\\cot",
        (Expr::arcsin(_), Style::Latex) => "\\operatorname{asin}",
        (Expr::arccos(_), Style::Latex) => "\\operatorname{acos}",
        (Expr::arctg(_), Style::Latex) => "\\operatorname{atan}",
        (Expr::arcctg(_), Style::Latex) => "\\operatorname{acot}",
        _ => "",
    }
}

fn render(expr: &Expr, style: Style) -> (String, Prec) {
    match expr {
        Expr::Var(name) => (name.clone(), Prec::Atom),
        Expr::Const(c) if *c < 0.0 => (format!("-{}", format_number(-c, style)), Prec::Neg),
        Expr::Const(c) => (format_number(*c, style), Prec::Atom),
        Expr::Add(lhs, rhs) => {
            let left = render(lhs, style).0;
            match negated_term(rhs) {
                Some(positive) => {
                    let right = wrap(render(&positive, style), Prec::Product, style);
                    (format!("{} - {}", left, right), Prec::Sum)
                }
                None => {
                    let right = wrap(render(rhs, style), Prec::Product, style);
                    (format!("{} + {}", left, right), Prec::Sum)
                }
            }
        }
        Expr::Sub(lhs, rhs) => {
            let left = render(lhs, style).0;
            match negated_term(rhs) {
                Some(positive) => {
                    let right = wrap(render(&positive, style), Prec::Product, style);
                    (format!("{} + {}", left, right), Prec::Sum)
                }
                None => {
                    let right = wrap(render(rhs, style), Prec::Product, style);
                    (format!("{} - {}", left, right), Prec::Sum)
                }
            }
        }
        Expr::Mul(lhs, rhs) => {
            if let Expr::Const(c) = lhs.as_ref() {
                if *c == -1.0 {
                    let operand = wrap(render(rhs, style), Prec::Product, style);
                    return (format!("-{}", operand), Prec::Neg);
                }
                if *c < 0.0 {
                    let positive = Expr::Mul(Box::new(Expr::Const(-c)), rhs.clone());
                    return (format!("-{}", render(&positive, style).0), Prec::Neg);
                }
            }
            let left = wrap(render(lhs, style), Prec::Product, style);
            // a product on the right needs no parentheses, a negated one does
            let right = match (rhs.as_ref(), render(rhs, style)) {
                (Expr::Mul(..), (rendered, Prec::Product)) => rendered,
                (_, rendered) => wrap(rendered, Prec::Power, style),
            };
            let joined = match style {
                Style::Text => format!("{}*{}", left, right),
                Style::Latex if right.starts_with(|ch: char| ch.is_ascii_digit()) => {
                    format!("{} \\cdot {}", left, right)
                }
                Style::Latex => format!("{} {}", left, right),
            };
            (joined, Prec::Product)
        }
        Expr::Div(lhs, rhs) => {
            if let Some(positive) = negated_term(lhs) {
                let quotient = Expr::Div(Box::new(positive), rhs.clone());
                return (format!("-{}", render(&quotient, style).0), Prec::Neg);
            }
            match style {
                Style::Text => {
                    let left = wrap(render(lhs, style), Prec::Product, style);
                    let right = wrap(render(rhs, style), Prec::Power, style);
                    (format!("{}/{}", left, right), Prec::Product)
                }
                Style::Latex => (
                    format!(
                        "\\frac{{{}}}{{{}}}",
                        render(lhs, style).0,
                        render(rhs, style).0
                    ),
                    Prec::Atom,
                ),
            }
        }
        Expr::Pow(base, exp) => {
            if let Expr::Const(e) = exp.as_ref() {
                if *e == 0.5 {
                    return match style {
                        Style::Text => (format!("sqrt({})", render(base, style).0), Prec::Atom),
                        Style::Latex => (format!("\\sqrt{{{}}}", render(base, style).0), Prec::Atom),
                    };
                }
                if *e == -0.5 {
                    let root = Expr::Pow(base.clone(), Box::new(Expr::Const(0.5)));
                    let quotient = Expr::Div(Box::new(Expr::Const(1.0)), Box::new(root));
                    return render(&quotient, style);
                }
            }
            let left = wrap(render(base, style), Prec::Atom, style);
            let exponent = rational_exponent(exp).unwrap_or_else(|| *exp.clone());
            match style {
                Style::Text => {
                    let right = wrap(render(&exponent, style), Prec::Atom, style);
                    (format!("{}**{}", left, right), Prec::Power)
                }
                Style::Latex => {
                    let right = render(&exponent, style).0;
                    (format!("{}^{{{}}}", left, right), Prec::Power)
                }
            }
        }
        Expr::Exp(arg) if style == Style::Latex => {
            (format!("e^{{{}}}", render(arg, style).0), Prec::Power)
        }
        _ => {
            let name = function_name(expr, style);
            let argument = expr.unary_arg().map(|arg| render(arg, style).0).unwrap_or_default();
            match style {
                Style::Text => (format!("{}({})", name, argument), Prec::Atom),
                Style::Latex => (
                    format!("{}{{\\left({} \\right)}}", name, argument),
                    Prec::Atom,
                ),
            }
        }
    }
}

impl Expr {
    /// Plain text rendering, `**` for powers. Deterministic.
    pub fn to_text(&self) -> String {
        render(self, Style::Text).0
    }

    /// LaTeX rendering.
    pub fn to_latex(&self) -> String {
        render(self, Style::Latex).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(input: &str) -> String {
        Expr::parse_expression(input, "x").unwrap().to_text()
    }

    fn latex(input: &str) -> String {
        Expr::parse_expression(input, "x").unwrap().to_latex()
    }

    #[test]
    fn test_text_basic() {
        assert_eq!(text("x^2"), "x**2");
        assert_eq!(text("x**3/3"), "x**3/3");
        assert_eq!(text("-cos(x)"), "-cos(x)");
        assert_eq!(text("2x^2 + sin(x)"), "2*x**2 + sin(x)");
        assert_eq!(text("ln(x) + tg(x) + arctg(x)"), "log(x) + tan(x) + atan(x)");
        assert_eq!(text("sqrt(x+1)"), "sqrt(x + 1)");
    }

    #[test]
    fn test_text_parentheses() {
        assert_eq!(text("(x+1)^2"), "(x + 1)**2");
        assert_eq!(text("(x+1)*(x-1)"), "(x + 1)*(x - 1)");
        let nested = Expr::Mul(
            Box::new(Expr::Const(2.0)),
            Box::new(Expr::Mul(
                Box::new(Expr::Var("x".to_string())),
                Box::new(Expr::sin(Box::new(Expr::Var("x".to_string())))),
            )),
        );
        assert_eq!(nested.to_text(), "2*x*sin(x)");
        let negated = Expr::Mul(
            Box::new(Expr::Var("y".to_string())),
            Box::new(-Expr::Var("x".to_string())),
        );
        assert_eq!(negated.to_text(), "y*(-x)");
        assert_eq!(text("1/(x+1)"), "1/(x + 1)");
        assert_eq!(text("x - (x - 1)"), "x - (x - 1)");
        assert_eq!(text("x/(2x)"), "x/(2*x)");
        assert_eq!(text("x^(-1)"), "x**(-1)");
        assert_eq!(text("2^(x+1)"), "2**(x + 1)");
        assert_eq!(text("(-x)^2"), "(-x)**2");
        assert_eq!(text("(x+1)^1.5"), "(x + 1)**(3/2)");
        assert_eq!(text("x^(-2.5)"), "x**(-5/2)");
    }

    #[test]
    fn test_text_negative_terms() {
        let expr = Expr::Add(
            Box::new(Expr::Var("x".to_string())),
            Box::new(Expr::Mul(
                Box::new(Expr::Const(-2.0)),
                Box::new(Expr::Var("x".to_string())),
            )),
        );
        assert_eq!(expr.to_text(), "x - 2*x");
        assert_eq!(text("x - -1"), "x + 1");
    }

    #[test]
    fn test_text_constants() {
        assert_eq!(text("pi*x"), "pi*x");
        assert_eq!(text("e^x"), "e**x");
        assert_eq!(text("0.25*x"), "0.25*x");
    }

    #[test]
    fn test_latex() {
        assert_eq!(latex("x^2/3"), "\\frac{x^{2}}{3}");
        assert_eq!(latex("-cos(x)"), "-\\cos{\\left(x \\right)}");
        assert_eq!(latex("exp(2x)"), "e^{2 x}");
        assert_eq!(latex("sqrt(x)"), "\\sqrt{x}");
        assert_eq!(latex("ln(x+1)"), "\\log{\\left(x + 1 \\right)}");
        assert_eq!(latex("(x+1)^2"), "\\left(x + 1\\right)^{2}");
        assert_eq!(latex("pi x"), "\\pi x");
        assert_eq!(latex("x^1.5"), "x^{\\frac{3}{2}}");
    }

    #[test]
    fn test_rendering_is_stable() {
        let expr = Expr::parse_expression("x^2*sin(3x) - 1/(x^2+1) + acot(x)", "x").unwrap();
        let first = expr.to_text();
        for _ in 0..5 {
            assert_eq!(expr.to_text(), first);
        }
        assert_eq!(
            Expr::parse_expression(&first, "x").unwrap().to_text(),
            first
        );
    }
}
