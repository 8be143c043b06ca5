//! # Symbolic Expression Simplification Module
//!
//! Two levels of simplification are provided:
//!
//! 1. **Constant folding** (`fold_constants`): every operation whose operands are all numbers
//!    is replaced by its value. The rest of the tree is left exactly as it was written, so the
//!    parsed input keeps its shape. A quotient of two integers that is not an integer stays a
//!    reduced fraction (`1/3`), everything else becomes a float (`pi/2` -> `1.5707963...`).
//! 2. **Simplification** (`simplify`): a single bottom-up pass that
//!    - folds constants and applies identities (`x + 0`, `x*1`, `x^1`, `x^0`, `0/x`, `x/x`, `ln(exp(u))`),
//!    - pulls numeric coefficients to the front of products and merges them (`(2*x)*3 = 6*x`),
//!    - merges powers of the same base (`x*x^2 = x^3`),
//!    - collects like terms of a sum keeping the order of first appearance, with the constant term last,
//!    - writes rational coefficients as fractions (`x^3/3`, `-cos(2*x)/2`) and negative terms as subtraction.
//!
//! The result depends only on the input tree: no hashing, no randomness.

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{as_rational, gcd, is_integer};

impl Expr {
    /// Folds every sub-expression whose operands are all numbers.
    pub fn fold_constants(&self) -> Expr {
        let folded = self.map_children(&mut |child| child.fold_constants());
        if !folded.has_only_constant_operands() {
            return folded;
        }
        if let Expr::Div(lhs, rhs) = &folded {
            if let (Expr::Const(a), Expr::Const(b)) = (lhs.as_ref(), rhs.as_ref()) {
                if *b != 0.0 && is_integer(*a) && is_integer(*b) && !is_integer(a / b) {
                    return integer_fraction(*a as i64, *b as i64);
                }
            }
        }
        match folded.eval_checked(None) {
            Ok(value) => Expr::Const(value),
            // left for the evaluator to report
            Err(_) => folded,
        }
    }

    fn has_only_constant_operands(&self) -> bool {
        match self {
            Expr::Var(_) | Expr::Const(_) => false,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                matches!(lhs.as_ref(), Expr::Const(_)) && matches!(rhs.as_ref(), Expr::Const(_))
            }
            _ => matches!(self.unary_arg(), Some(Expr::Const(_))),
        }
    }

    //___________________________________SIMPLIFICATION____________________________________

    /// Simplifies the expression, see the module documentation for the rules.
    pub fn simplify(&self) -> Expr {
        let node = self.map_children(&mut |child| child.simplify());
        match node {
            Expr::Add(..) | Expr::Sub(..) => simplify_sum(&node),
            Expr::Mul(lhs, rhs) => simplify_product(&lhs, &rhs),
            Expr::Div(lhs, rhs) => simplify_quotient(*lhs, *rhs),
            Expr::Pow(base, exp) => simplify_power(*base, *exp),
            Expr::Ln(arg) => match *arg {
                Expr::Exp(inner) => *inner,
                other => fold_function(Expr::Ln(Box::new(other))),
            },
            Expr::Var(_) | Expr::Const(_) => node,
            _ => fold_function(odd_even(node)),
        }
    }

    /// `coefficient * core` written the way the simplifier writes products:
    /// `x`, `-x`, `3*x`, `x/3`, `-2*x/3`, `1.5707963267948966*x`.
    pub fn scaled(coefficient: f64, core: Expr) -> Expr {
        if coefficient == 0.0 {
            return Expr::Const(0.0);
        }
        if core.is_one() {
            return rational_const(coefficient);
        }
        if coefficient == 1.0 {
            return core;
        }
        if coefficient == -1.0 {
            return -core;
        }
        match as_rational(coefficient) {
            Some((1, 1)) => core,
            Some((-1, 1)) => -core,
            Some((p, 1)) => Expr::Mul(Box::new(Expr::Const(p as f64)), Box::new(core)),
            Some((p, q)) => {
                let numerator = match p {
                    1 => core,
                    -1 => -core,
                    _ => Expr::Mul(Box::new(Expr::Const(p as f64)), Box::new(core)),
                };
                Expr::Div(Box::new(numerator), Box::new(Expr::Const(q as f64)))
            }
            None => Expr::Mul(Box::new(Expr::Const(coefficient)), Box::new(core)),
        }
    }

    /// Splits a term into its numeric coefficient and the rest: `-2*x/3` -> (-2/3, x).
    /// A bare number gives (number, 1).
    pub fn split_coefficient(&self) -> (f64, Expr) {
        match self {
            Expr::Const(c) => (*c, Expr::Const(1.0)),
            Expr::Mul(lhs, rhs) => {
                let (c1, u1) = lhs.split_coefficient();
                let (c2, u2) = rhs.split_coefficient();
                let core = if u1.is_one() {
                    u2
                } else if u2.is_one() {
                    u1
                } else {
                    Expr::Mul(Box::new(u1), Box::new(u2))
                };
                (c1 * c2, core)
            }
            Expr::Div(lhs, rhs) => match rhs.as_ref() {
                Expr::Const(d) if *d != 0.0 => {
                    let (c, u) = lhs.split_coefficient();
                    (c / d, u)
                }
                _ => (1.0, self.clone()),
            },
            _ => (1.0, self.clone()),
        }
    }
}

/// reduced fraction p/q with a positive denominator
fn integer_fraction(p: i64, q: i64) -> Expr {
    let g = gcd(p, q).max(1);
    let (p, q) = if q < 0 { (-p / g, -q / g) } else { (p / g, q / g) };
    if q == 1 {
        return Expr::Const(p as f64);
    }
    Expr::Div(
        Box::new(Expr::Const(p as f64)),
        Box::new(Expr::Const(q as f64)),
    )
}

/// a number, written as a fraction when it is one
pub fn rational_const(value: f64) -> Expr {
    match as_rational(value) {
        Some((p, q)) => integer_fraction(p, q),
        None => Expr::Const(value),
    }
}

/// a float, snapped to the nearest nonzero integer when it is one up to rounding
fn fold_value(value: f64) -> Expr {
    let rounded = value.round();
    if rounded != 0.0 && (value - rounded).abs() < 1e-12 * rounded.abs() {
        Expr::Const(rounded)
    } else {
        Expr::Const(value)
    }
}

/// sin(-u) = -sin(u), tan and cot are odd as well, cos(-u) = cos(u)
fn odd_even(node: Expr) -> Expr {
    let (coefficient, core) = match node.unary_arg() {
        Some(arg) => arg.split_coefficient(),
        None => return node,
    };
    if coefficient >= 0.0 || core.is_one() {
        return node;
    }
    let positive = Expr::scaled(-coefficient, core).boxed();
    match node {
        Expr::sin(_) => -Expr::sin(positive),
        Expr::cos(_) => Expr::cos(positive),
        Expr::tg(_) => -Expr::tg(positive),
        Expr::ctg(_) => -Expr::ctg(positive),
        other => other,
    }
}

/// folds a function of a number only when the value is an integer (`sin(0)`, `ln(1)`),
/// `ln(2)` stays as written
fn fold_function(node: Expr) -> Expr {
    if let Some(Expr::Const(_)) = node.unary_arg() {
        if let Ok(value) = node.eval_checked(None) {
            if (value - value.round()).abs() < 1e-12 {
                return Expr::Const(value.round());
            }
        }
    }
    node
}

fn collect_terms(expr: &Expr, sign: f64, terms: &mut Vec<(f64, Expr)>) {
    match expr {
        Expr::Add(lhs, rhs) => {
            collect_terms(lhs, sign, terms);
            collect_terms(rhs, sign, terms);
        }
        Expr::Sub(lhs, rhs) => {
            collect_terms(lhs, sign, terms);
            collect_terms(rhs, -sign, terms);
        }
        _ => {
            let (coefficient, core) = expr.split_coefficient();
            let coefficient = sign * coefficient;
            match terms.iter_mut().find(|(_, existing)| *existing == core) {
                Some(term) => {
                    let sum = term.0 + coefficient;
                    // like terms that cancel up to rounding leave no residue
                    term.0 = if sum.abs() <= 1e-12 * (term.0.abs() + coefficient.abs()) {
                        0.0
                    } else {
                        sum
                    };
                }
                None => terms.push((coefficient, core)),
            }
        }
    }
}

/// Joins terms into `a + b - c ...`; a negative coefficient becomes a subtraction.
pub fn build_sum(terms: Vec<(f64, Expr)>) -> Expr {
    let mut result: Option<Expr> = None;
    for (coefficient, core) in terms {
        if coefficient == 0.0 {
            continue;
        }
        result = Some(match result {
            None => Expr::scaled(coefficient, core),
            Some(acc) if coefficient < 0.0 => {
                Expr::Sub(Box::new(acc), Box::new(Expr::scaled(-coefficient, core)))
            }
            Some(acc) => Expr::Add(Box::new(acc), Box::new(Expr::scaled(coefficient, core))),
        });
    }
    result.unwrap_or(Expr::Const(0.0))
}

fn simplify_sum(node: &Expr) -> Expr {
    let mut terms = Vec::new();
    collect_terms(node, 1.0, &mut terms);
    let (constants, mut others): (Vec<_>, Vec<_>) =
        terms.into_iter().partition(|(_, core)| core.is_one());
    others.extend(constants);
    build_sum(others)
}

/// (base, exponent) of a factor, `x` counts as `x^1`
fn power_parts(expr: &Expr) -> (&Expr, f64) {
    match expr {
        Expr::Pow(base, exp) => match exp.as_ref() {
            Expr::Const(n) => (base.as_ref(), *n),
            _ => (expr, 1.0),
        },
        _ => (expr, 1.0),
    }
}

fn power_of(base: &Expr, exponent: f64) -> Expr {
    if exponent == 0.0 {
        Expr::Const(1.0)
    } else if exponent == 1.0 {
        base.clone()
    } else {
        Expr::Pow(Box::new(base.clone()), Box::new(Expr::Const(exponent)))
    }
}

fn merge_factors(a: Expr, b: Expr) -> Expr {
    if a.is_one() {
        return b;
    }
    if b.is_one() {
        return a;
    }
    let (base_a, exp_a) = power_parts(&a);
    let (base_b, exp_b) = power_parts(&b);
    if base_a == base_b {
        return power_of(base_a, exp_a + exp_b);
    }
    Expr::Mul(Box::new(a), Box::new(b))
}

fn simplify_product(lhs: &Expr, rhs: &Expr) -> Expr {
    let (c1, u1) = lhs.split_coefficient();
    let (c2, u2) = rhs.split_coefficient();
    let coefficient = c1 * c2;
    if coefficient == 0.0 {
        return Expr::Const(0.0);
    }
    Expr::scaled(coefficient, merge_factors(u1, u2))
}

fn simplify_quotient(num: Expr, den: Expr) -> Expr {
    if let Expr::Const(d) = den {
        if d != 0.0 {
            let (c, u) = num.split_coefficient();
            return Expr::scaled(c / d, u);
        }
        return Expr::Div(Box::new(num), Box::new(den));
    }
    if num.is_zero() {
        return Expr::Const(0.0);
    }
    if num == den {
        return Expr::Const(1.0);
    }
    let (base_n, exp_n) = power_parts(&num);
    let (base_d, exp_d) = power_parts(&den);
    if base_n == base_d && !matches!(base_n, Expr::Const(_)) {
        let exponent = exp_n - exp_d;
        if exponent >= 0.0 {
            return power_of(base_n, exponent);
        }
        return Expr::Div(
            Box::new(Expr::Const(1.0)),
            Box::new(power_of(base_n, -exponent)),
        );
    }
    Expr::Div(Box::new(num), Box::new(den))
}

fn simplify_power(base: Expr, exp: Expr) -> Expr {
    if let Expr::Const(e) = exp {
        if e == 0.0 {
            return Expr::Const(1.0);
        }
        if e == 1.0 {
            return base;
        }
    }
    if base.is_one() {
        return Expr::Const(1.0);
    }
    if let (Expr::Const(_), Expr::Const(e)) = (&base, &exp) {
        let node = Expr::Pow(Box::new(base.clone()), Box::new(exp.clone()));
        return match node.eval_checked(None) {
            Ok(value) if is_integer(*e) => rational_const(value),
            Ok(value) => fold_value(value),
            Err(_) => node,
        };
    }
    // (u^a)^n = u^(a*n) only for an integer n
    if let (Expr::Pow(inner, inner_exp), Expr::Const(e)) = (&base, &exp) {
        if let Expr::Const(a) = inner_exp.as_ref() {
            if is_integer(*e) {
                return simplify_power(*inner.clone(), Expr::Const(a * e));
            }
        }
    }
    Expr::Pow(Box::new(base), Box::new(exp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::Var("x".to_string())
    }

    fn c(value: f64) -> Expr {
        Expr::Const(value)
    }

    #[test]
    fn test_fold_constants_keeps_fractions() {
        let folded = Expr::Div(Box::new(c(2.0)), Box::new(c(6.0))).fold_constants();
        assert_eq!(folded, Expr::Div(Box::new(c(1.0)), Box::new(c(3.0))));
        let folded = Expr::Div(Box::new(c(6.0)), Box::new(c(3.0))).fold_constants();
        assert_eq!(folded, c(2.0));
        let folded = Expr::Div(Box::new(c(1.0)), Box::new(c(0.0))).fold_constants();
        assert!(matches!(folded, Expr::Div(..)));
    }

    #[test]
    fn test_fold_constants_keeps_shape() {
        let expr = Expr::Add(
            Box::new(x()),
            Box::new(Expr::Mul(
                Box::new(Expr::Mul(Box::new(c(2.0)), Box::new(c(3.0)))),
                Box::new(x()),
            )),
        );
        let expected = Expr::Add(
            Box::new(x()),
            Box::new(Expr::Mul(Box::new(c(6.0)), Box::new(x()))),
        );
        assert_eq!(expr.fold_constants(), expected);
    }

    #[test]
    fn test_identities() {
        assert_eq!((x() + c(0.0)).simplify(), x());
        assert_eq!((c(1.0) * x()).simplify(), x());
        assert_eq!((x() * c(0.0)).simplify(), c(0.0));
        assert_eq!(x().pow(c(1.0)).simplify(), x());
        assert_eq!(x().pow(c(0.0)).simplify(), c(1.0));
        assert_eq!((x() / x()).simplify(), c(1.0));
        assert_eq!((x() - x()).simplify(), c(0.0));
        assert_eq!(x().exp().ln().simplify(), x());
    }

    #[test]
    fn test_coefficients_move_left() {
        let expr = (x() * c(2.0)) * c(3.0);
        assert_eq!(expr.simplify(), Expr::Mul(Box::new(c(6.0)), Box::new(x())));
    }

    #[test]
    fn test_rational_coefficients() {
        let expr = x().pow(c(3.0)) * c(1.0 / 3.0);
        assert_eq!(
            expr.simplify(),
            Expr::Div(Box::new(x().pow(c(3.0))), Box::new(c(3.0)))
        );
        let expr = -(Expr::cos(Box::new(c(2.0) * x()))) / c(2.0);
        let expected = Expr::Div(
            Box::new(Expr::Mul(
                Box::new(c(-1.0)),
                Box::new(Expr::cos(Box::new(Expr::Mul(Box::new(c(2.0)), Box::new(x()))))),
            )),
            Box::new(c(2.0)),
        );
        assert_eq!(expr.simplify(), expected);
    }

    #[test]
    fn test_like_terms_and_order() {
        // 3x + 1 + 2x - x^2 -> 5x - x^2 + 1
        let expr = c(3.0) * x() + c(1.0) + c(2.0) * x() - x().pow(c(2.0));
        let expected = Expr::Add(
            Box::new(Expr::Sub(
                Box::new(Expr::Mul(Box::new(c(5.0)), Box::new(x()))),
                Box::new(x().pow(c(2.0))),
            )),
            Box::new(c(1.0)),
        );
        assert_eq!(expr.simplify(), expected);
    }

    #[test]
    fn test_small_coefficients_are_kept() {
        let expr = c(1e-13) * x().pow(c(3.0)) + x();
        let expected = Expr::Add(
            Box::new(Expr::Mul(Box::new(c(1e-13)), Box::new(x().pow(c(3.0))))),
            Box::new(x()),
        );
        assert_eq!(expr.simplify(), expected);
        // 0.1 + 0.2 - 0.3 cancels to rounding, the term is gone
        let expr = c(0.1) * x() + c(0.2) * x() - c(0.3) * x() + c(1.0);
        assert_eq!(expr.simplify(), c(1.0));
    }

    #[test]
    fn test_negative_terms_become_subtraction() {
        let expr = x() + c(-2.0) * Expr::sin(Box::new(x()));
        let expected = Expr::Sub(
            Box::new(x()),
            Box::new(Expr::Mul(Box::new(c(2.0)), Box::new(Expr::sin(Box::new(x()))))),
        );
        assert_eq!(expr.simplify(), expected);
    }

    #[test]
    fn test_powers_merge() {
        assert_eq!((x() * x().pow(c(2.0))).simplify(), x().pow(c(3.0)));
        assert_eq!((x() * x()).simplify(), x().pow(c(2.0)));
        assert_eq!((x().pow(c(3.0)) / x()).simplify(), x().pow(c(2.0)));
        assert_eq!(x().pow(c(2.0)).pow(c(3.0)).simplify(), x().pow(c(6.0)));
        // (x^2)^0.5 is |x|, left alone
        let root = x().pow(c(2.0)).pow(c(0.5));
        assert_eq!(root.simplify(), root);
    }

    #[test]
    fn test_function_folding() {
        assert_eq!(Expr::sin(Box::new(c(0.0))).simplify(), c(0.0));
        assert_eq!(c(0.0).exp().simplify(), c(1.0));
        let bad = c(-1.0).ln();
        assert_eq!(bad.simplify(), bad);
        let symbolic = c(2.0).ln();
        assert_eq!(symbolic.simplify(), symbolic);
    }

    #[test]
    fn test_odd_and_even_functions() {
        let minus_x = || c(-1.0) * x();
        assert_eq!(Expr::cos(Box::new(minus_x())).simplify(), Expr::cos(Box::new(x())));
        assert_eq!(
            Expr::sin(Box::new(minus_x())).simplify(),
            Expr::Mul(Box::new(c(-1.0)), Box::new(Expr::sin(Box::new(x()))))
        );
        let doubled = Expr::tg(Box::new(c(-2.0) * x())).simplify();
        assert_eq!(doubled.to_text(), "-tan(2*x)");
        // the inverse functions are left as written
        let inverse = Expr::arccos(Box::new(minus_x())).simplify();
        assert_eq!(inverse.to_text(), "acos(-x)");
    }

    #[test]
    fn test_simplify_is_deterministic() {
        let expr = Expr::parse_expression("x^2 + 3x + sin(x) + 2x + x^2", "x").unwrap();
        let first = expr.simplify();
        for _ in 0..10 {
            assert_eq!(expr.simplify(), first);
        }
        assert_eq!(first.simplify(), first);
    }
}
