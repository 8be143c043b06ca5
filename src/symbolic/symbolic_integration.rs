//! # Symbolic Integration Module
//!
//! Indefinite integration of single-variable elementary expressions. The integrator tries a
//! fixed sequence of rules and returns the first antiderivative it finds, simplified, without
//! the constant of integration:
//!
//! 1. constants: `∫c dx = c*x`
//! 2. polynomials in any written form, integrated term by term
//! 3. linearity: sums, differences and constant factors
//! 4. the table of elementary antiderivatives with a linear inner argument `u = a*x + b`:
//!    `u^n`, `c^u`, `exp(u)`, `ln(u)`, `sin(u)`, `cos(u)`, `tan(u)`, `cot(u)`, `asin(u)`,
//!    `acos(u)`, `atan(u)`, `acot(u)`; the result is `G(u)/a`
//! 5. rational functions whose denominator has degree one or two
//! 6. integration by parts in tabular form: `P(x)*exp(u)`, `P(x)*sin(u)`, `P(x)*cos(u)`,
//!    `P(x)*ln(u)`, and `exp(u)*sin(v)`, `exp(u)*cos(v)`
//! 7. substitution when the integrand is `c*f(g(x))*g'(x)` for a table function `f`
//!    (the derivative-divides test)
//!
//! Anything else is an `IntegrationError`: no numeric fallback is attempted.
//!
//! Logarithms are written `ln(u)`; the evaluator reads them as `ln|u|` for antiderivatives.
//!
//! # Example
//! ```
//! use RustedIntegrals::symbolic::symbolic_engine::Expr;
//! let f = Expr::parse_expression("x*exp(x)", "x").unwrap();
//! assert_eq!(f.integrate("x").unwrap().to_text(), "(x - 1)*exp(x)");
//! ```
use std::time::Instant;

use log::debug;

use crate::errors::IntegralError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_polynomial::{self as poly, Poly, poly_to_expr};
use crate::symbolic::symbolic_simplify::build_sum;

/// default bound on nested rule applications
pub const DEFAULT_MAX_DEPTH: usize = 24;

/// points where a candidate constant factor is checked
const PROBES: [f64; 8] = [0.37, 0.81, 1.23, 1.77, 2.41, 3.05, -0.53, -1.29];

/// Outer function of a composition `f(u)` with a known antiderivative `G(u)`.
#[derive(Debug, Clone, PartialEq)]
enum Outer {
    Power(f64),
    /// `c^u` with a constant positive base
    Exponential(Expr),
    Exp,
    Ln,
    Sin,
    Cos,
    Tan,
    Cot,
    Asin,
    Acos,
    Atan,
    Acot,
}

impl Outer {
    /// Splits `expr` into a table function and its inner argument.
    fn decompose(expr: &Expr, var: &str) -> Option<(Outer, Expr)> {
        let outer = match expr {
            Expr::Var(name) if name == var => return Some((Outer::Power(1.0), expr.clone())),
            Expr::Pow(base, exp) if !exp.contains_variable(var) => {
                let n = exp.eval_checked(None).ok()?;
                return Some((Outer::Power(n), *base.clone()));
            }
            Expr::Pow(base, exp) if !base.contains_variable(var) => {
                let c = base.eval_checked(None).ok()?;
                if c <= 0.0 || c == 1.0 {
                    return None;
                }
                return Some((Outer::Exponential(*base.clone()), *exp.clone()));
            }
            Expr::Exp(_) => Outer::Exp,
            Expr::Ln(_) => Outer::Ln,
            Expr::sin(_) => Outer::Sin,
            Expr::cos(_) => Outer::Cos,
            Expr::tg(_) => Outer::Tan,
            Expr::ctg(_) => Outer::Cot,
            Expr::arcsin(_) => Outer::Asin,
            Expr::arccos(_) => Outer::Acos,
            Expr::arctg(_) => Outer::Atan,
            Expr::arcctg(_) => Outer::Acot,
            _ => return None,
        };
        expr.unary_arg().map(|arg| (outer, arg.clone()))
    }

    /// `G(u)` with `G' = f`
    fn antiderivative(&self, u: Expr) -> Expr {
        match self {
            Outer::Power(n) if *n == -1.0 => u.ln(),
            Outer::Power(n) => Expr::scaled(1.0 / (n + 1.0), u.pow(Expr::Const(n + 1.0))),
            Outer::Exponential(base) => base.clone().pow(u) / base.clone().ln(),
            Outer::Exp => u.exp(),
            Outer::Ln => u.clone() * u.clone().ln() - u,
            Outer::Sin => -Expr::cos(u.boxed()),
            Outer::Cos => Expr::sin(u.boxed()),
            Outer::Tan => -Expr::cos(u.boxed()).ln(),
            Outer::Cot => Expr::sin(u.boxed()).ln(),
            Outer::Asin => {
                let root = one_minus_square(&u).pow(Expr::Const(0.5));
                u.clone() * Expr::arcsin(u.boxed()) + root
            }
            Outer::Acos => {
                let root = one_minus_square(&u).pow(Expr::Const(0.5));
                u.clone() * Expr::arccos(u.boxed()) - root
            }
            Outer::Atan => {
                let log = one_plus_square(&u).ln() / Expr::Const(2.0);
                u.clone() * Expr::arctg(u.boxed()) - log
            }
            Outer::Acot => {
                let log = one_plus_square(&u).ln() / Expr::Const(2.0);
                u.clone() * Expr::arcctg(u.boxed()) + log
            }
        }
    }
}

fn one_minus_square(u: &Expr) -> Expr {
    Expr::Const(1.0) - u.clone().pow(Expr::Const(2.0))
}

fn one_plus_square(u: &Expr) -> Expr {
    u.clone().pow(Expr::Const(2.0)) + Expr::Const(1.0)
}

impl Expr {
    /// Antiderivative with respect to `var`, simplified, without the constant of integration.
    ///
    /// Fails with `IntegrationError` when no rule applies (e.g. `exp(x^2)`) and with
    /// `EvaluationError` when a constant integrand is not a real number.
    pub fn integrate(&self, var: &str) -> Result<Expr, IntegralError> {
        self.integrate_with_depth(var, DEFAULT_MAX_DEPTH)
    }

    /// Same as `integrate` with an explicit bound on nested rule applications.
    pub fn integrate_with_depth(&self, var: &str, max_depth: usize) -> Result<Expr, IntegralError> {
        self.integrate_until(var, max_depth, None)
    }

    /// Same as `integrate_with_depth`; gives up with `Timeout` once `deadline` has passed.
    pub fn integrate_until(
        &self,
        var: &str,
        max_depth: usize,
        deadline: Option<Instant>,
    ) -> Result<Expr, IntegralError> {
        let integrator = Integrator {
            var,
            max_depth,
            deadline,
        };
        let antiderivative = integrator.integrate(&self.simplify(), 0)?;
        let result = antiderivative.simplify();
        debug!("∫ {} d{} = {}", self.to_text(), var, result.to_text());
        Ok(result)
    }
}

struct Integrator<'a> {
    var: &'a str,
    max_depth: usize,
    deadline: Option<Instant>,
}

impl Integrator<'_> {
    fn x(&self) -> Expr {
        Expr::Var(self.var.to_string())
    }

    fn check_deadline(&self) -> Result<(), IntegralError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(IntegralError::Timeout(
                "the antiderivative was not found before the deadline".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn integrate(&self, f: &Expr, depth: usize) -> Result<Expr, IntegralError> {
        let var = self.var;
        if depth > self.max_depth {
            return Err(IntegralError::IntegrationError(format!(
                "recursion limit of {} reached while integrating {}",
                self.max_depth,
                f.to_text()
            )));
        }
        self.check_deadline()?;
        if !f.contains_variable(var) {
            f.eval_checked(None).map_err(|e| e.context("integrand"))?;
            return Ok(Expr::Mul(f.clone().boxed(), self.x().boxed()));
        }
        if let Some(p) = f.polynomial_coefficients(var) {
            return Ok(poly_to_expr(&poly::antiderivative(&p), var));
        }
        match f {
            Expr::Add(..) | Expr::Sub(..) => {
                let mut terms = Vec::new();
                signed_terms(f, 1.0, &mut terms);
                let mut integrated = Vec::with_capacity(terms.len());
                for (sign, term) in terms {
                    integrated.push((sign, self.integrate(&term, depth + 1)?));
                }
                return Ok(build_sum(integrated));
            }
            Expr::Mul(lhs, rhs) if !lhs.contains_variable(var) => {
                return Ok(Expr::Mul(lhs.clone(), self.integrate(rhs, depth + 1)?.boxed()));
            }
            Expr::Mul(lhs, rhs) if !rhs.contains_variable(var) => {
                return Ok(Expr::Mul(rhs.clone(), self.integrate(lhs, depth + 1)?.boxed()));
            }
            Expr::Div(lhs, rhs) if !rhs.contains_variable(var) => {
                return Ok(Expr::Div(self.integrate(lhs, depth + 1)?.boxed(), rhs.clone()));
            }
            _ => {}
        }
        if let Some(result) = self.linear_substitution(f) {
            return Ok(result);
        }
        if let Some(result) = self.rational(f) {
            return Ok(result);
        }
        if let Some(result) = self.by_parts(f, depth)? {
            return Ok(result);
        }
        if let Some(result) = self.exp_times_trig(f) {
            return Ok(result);
        }
        if let Some(result) = self.derivative_divides(f)? {
            return Ok(result);
        }
        Err(IntegralError::IntegrationError(format!(
            "no elementary antiderivative found for {}",
            f.to_text()
        )))
    }

    /// `∫f(a*x + b) dx = G(a*x + b)/a`
    fn linear_substitution(&self, f: &Expr) -> Option<Expr> {
        let (outer, u) = Outer::decompose(f, self.var)?;
        let (a, _) = u.linear_coefficients(self.var)?;
        Some(Expr::scaled(1.0 / a, outer.antiderivative(u)))
    }

    //___________________________________RATIONAL FUNCTIONS____________________________________

    /// `P(x)/Q(x)` with `deg Q` one or two: long division, then logarithm and arctangent terms.
    fn rational(&self, f: &Expr) -> Option<Expr> {
        let var = self.var;
        let (num, den) = match f {
            Expr::Div(num, den) => (num.as_ref().clone(), den.as_ref().clone()),
            Expr::Pow(base, exp) if exp.as_const() == Some(-1.0) => (Expr::Const(1.0), *base.clone()),
            _ => return None,
        };
        let p = num.polynomial_coefficients(var)?;
        let q = den.polynomial_coefficients(var)?;
        let degree = poly::degree(&q);
        if degree == 0 || degree > 2 {
            return None;
        }
        let (quotient, remainder) = poly::div_rem(&p, &q);
        let mut terms = Vec::new();
        if !poly::is_zero(&quotient) {
            terms.push((1.0, poly_to_expr(&poly::antiderivative(&quotient), var)));
        }
        if !poly::is_zero(&remainder) {
            let fraction = if degree == 1 {
                self.over_linear(&remainder, &q)
            } else {
                self.over_quadratic(&remainder, &q)
            };
            terms.push((1.0, fraction));
        }
        Some(build_sum(terms))
    }

    /// `∫r/(a*x + b) dx = (r/a) ln(a*x + b)`
    fn over_linear(&self, remainder: &[f64], den: &[f64]) -> Expr {
        Expr::scaled(remainder[0] / den[1], poly_to_expr(den, self.var).ln())
    }

    /// `∫(r1*x + r0)/(p*x^2 + q*x + s) dx`
    fn over_quadratic(&self, remainder: &[f64], den: &[f64]) -> Expr {
        let var = self.var;
        let (s, q, p) = (den[0], den[1], den[2]);
        let r0 = remainder[0];
        let r1 = remainder.get(1).copied().unwrap_or(0.0);
        // r1*x + r0 = A*(2p*x + q) + B
        let a = r1 / (2.0 * p);
        let b = r0 - a * q;
        let mut terms = Vec::new();
        if a != 0.0 {
            terms.push((a, poly_to_expr(den, var).ln()));
        }
        if b != 0.0 {
            let disc = q * q - 4.0 * p * s;
            let tol = 1e-12 * (q * q).max((4.0 * p * s).abs()).max(1.0);
            if disc < -tol {
                let k = (-disc).sqrt();
                let arg = poly_to_expr(&[q / k, 2.0 * p / k], var);
                terms.push((2.0 * b / k, Expr::arctg(arg.boxed())));
            } else if disc > tol {
                let root_low = (-q - disc.sqrt()) / (2.0 * p);
                let root_high = (-q + disc.sqrt()) / (2.0 * p);
                let c = b / (p * (root_low - root_high));
                terms.push((c, poly_to_expr(&[-root_low, 1.0], var).ln()));
                terms.push((-c, poly_to_expr(&[-root_high, 1.0], var).ln()));
            } else {
                // B/(p (x - r)^2)
                let root = -q / (2.0 * p);
                let coefficient = -b / p;
                terms.push((
                    1.0,
                    Expr::Div(
                        Expr::Const(coefficient).boxed(),
                        poly_to_expr(&[-root, 1.0], var).boxed(),
                    ),
                ));
            }
        }
        build_sum(terms)
    }

    //___________________________________INTEGRATION BY PARTS____________________________________

    /// Tabular integration by parts with a polynomial factor.
    fn by_parts(&self, f: &Expr, depth: usize) -> Result<Option<Expr>, IntegralError> {
        let var = self.var;
        let (coefficient, core) = f.split_coefficient();
        let Expr::Mul(lhs, rhs) = &core else {
            return Ok(None);
        };
        let (p, other) = match (
            lhs.polynomial_coefficients(var),
            rhs.polynomial_coefficients(var),
        ) {
            (Some(p), None) => (p, rhs.as_ref()),
            (None, Some(p)) => (p, lhs.as_ref()),
            _ => return Ok(None),
        };
        let result = match other {
            Expr::Exp(u) => u
                .linear_coefficients(var)
                .map(|(a, _)| self.poly_times_exponential(&p, a, other.clone())),
            Expr::Pow(base, u) if !base.contains_variable(var) => {
                let rate = base.eval_checked(None).ok().filter(|c| *c > 0.0 && *c != 1.0);
                match (rate, u.linear_coefficients(var)) {
                    (Some(_), Some((a, _))) => {
                        Some(self.poly_times_power(&p, a, base, other.clone()))
                    }
                    _ => None,
                }
            }
            Expr::sin(u) | Expr::cos(u) => u
                .linear_coefficients(var)
                .map(|(a, _)| self.poly_times_trig(&p, a, u, matches!(other, Expr::sin(_)))),
            Expr::Ln(u) => match u.linear_coefficients(var) {
                Some((a, _)) => Some(self.poly_times_log(&p, a, u, depth)?),
                None => None,
            },
            _ => None,
        };
        Ok(result.map(|r| Expr::scaled(coefficient, r)))
    }

    /// `∫P e^(a x) = Q e^(a x)` with `Q = Σ (-1)^k P^(k) / a^(k+1)`
    fn poly_times_exponential(&self, p: &[f64], rate: f64, exponential: Expr) -> Expr {
        let mut q: Poly = vec![0.0];
        let mut derivative = p.to_vec();
        let mut sign = 1.0;
        let mut power = rate;
        while !poly::is_zero(&derivative) {
            q = poly::add(&q, &poly::scale(&derivative, sign / power));
            derivative = poly::derivative(&derivative);
            sign = -sign;
            power *= rate;
        }
        Expr::Mul(poly_to_expr(&q, self.var).boxed(), exponential.boxed())
    }

    /// `∫P c^(a x) = c^(a x) Σ (-1)^k P^(k) / (a ln c)^(k+1)`, with `ln c` kept symbolic
    fn poly_times_power(&self, p: &[f64], a: f64, base: &Expr, exponential: Expr) -> Expr {
        let log_rate = Expr::scaled(a, base.clone().ln());
        let mut terms = Vec::new();
        let mut derivative = p.to_vec();
        let mut sign = 1.0;
        let mut power = 1.0;
        while !poly::is_zero(&derivative) {
            let denominator = if power == 1.0 {
                log_rate.clone()
            } else {
                log_rate.clone().pow(Expr::Const(power))
            };
            terms.push((
                sign,
                Expr::Div(poly_to_expr(&derivative, self.var).boxed(), denominator.boxed()),
            ));
            derivative = poly::derivative(&derivative);
            sign = -sign;
            power += 1.0;
        }
        Expr::Mul(build_sum(terms).boxed(), exponential.boxed())
    }

    /// `∫P sin(u)` or `∫P cos(u)` for `u = a*x + b`, as `A(x) sin(u) + B(x) cos(u)`.
    fn poly_times_trig(&self, p: &[f64], a: f64, u: &Expr, is_sin: bool) -> Expr {
        // the integral of D sin(u) is -D/a cos(u) + ∫D'/a cos(u), and the same with sin and
        // cos swapped; (s, c) are the running coefficients of sin(u) and cos(u)
        let mut sin_part: Poly = vec![0.0];
        let mut cos_part: Poly = vec![0.0];
        let (mut s, mut c) = if is_sin { (1.0, 0.0) } else { (0.0, 1.0) };
        let mut derivative = p.to_vec();
        while !poly::is_zero(&derivative) {
            // ∫D (s sin + c cos) = D (c sin - s cos)/a - ∫D' (c sin - s cos)/a
            let (next_s, next_c) = (c / a, -s / a);
            sin_part = poly::add(&sin_part, &poly::scale(&derivative, next_s));
            cos_part = poly::add(&cos_part, &poly::scale(&derivative, next_c));
            (s, c) = (-next_s, -next_c);
            derivative = poly::derivative(&derivative);
        }
        let sin_term = Expr::Mul(
            poly_to_expr(&sin_part, self.var).boxed(),
            Expr::sin(u.clone().boxed()).boxed(),
        );
        let cos_term = Expr::Mul(
            poly_to_expr(&cos_part, self.var).boxed(),
            Expr::cos(u.clone().boxed()).boxed(),
        );
        let ordered = if is_sin { [cos_term, sin_term] } else { [sin_term, cos_term] };
        build_sum(
            ordered
                .into_iter()
                .filter(|term| !term_is_zero(term))
                .map(|term| (1.0, term))
                .collect(),
        )
    }

    /// `∫P ln(u) = Q ln(u) - ∫Q a/u` with `Q = ∫P`
    fn poly_times_log(
        &self,
        p: &[f64],
        a: f64,
        u: &Expr,
        depth: usize,
    ) -> Result<Expr, IntegralError> {
        let q = poly::antiderivative(p);
        let first = Expr::Mul(poly_to_expr(&q, self.var).boxed(), u.clone().ln().boxed());
        let rest = Expr::Div(poly_to_expr(&poly::scale(&q, a), self.var).boxed(), u.clone().boxed());
        let second = self.integrate(&rest, depth + 1)?;
        Ok(first - second)
    }

    /// `∫exp(α x + c) sin(β x + d)` and the cosine variant, in closed form
    fn exp_times_trig(&self, f: &Expr) -> Option<Expr> {
        let var = self.var;
        let (coefficient, core) = f.split_coefficient();
        let Expr::Mul(lhs, rhs) = &core else {
            return None;
        };
        let (exponential, trig) = match (lhs.as_ref(), rhs.as_ref()) {
            (Expr::Exp(_), Expr::sin(_) | Expr::cos(_)) => (lhs.as_ref(), rhs.as_ref()),
            (Expr::sin(_) | Expr::cos(_), Expr::Exp(_)) => (rhs.as_ref(), lhs.as_ref()),
            _ => return None,
        };
        let (alpha, _) = exponential.unary_arg()?.linear_coefficients(var)?;
        let v = trig.unary_arg()?;
        let (beta, _) = v.linear_coefficients(var)?;
        let norm = alpha * alpha + beta * beta;
        let sin_v = Expr::sin(v.clone().boxed());
        let cos_v = Expr::cos(v.clone().boxed());
        let combination = match trig {
            // e^u (α sin v - β cos v)/(α² + β²)
            Expr::sin(_) => build_sum(vec![(alpha, sin_v), (-beta, cos_v)]),
            // e^u (α cos v + β sin v)/(α² + β²)
            _ => build_sum(vec![(alpha, cos_v), (beta, sin_v)]),
        };
        Some(Expr::scaled(
            coefficient / norm,
            Expr::Mul(exponential.clone().boxed(), combination.boxed()),
        ))
    }

    //___________________________________SUBSTITUTION____________________________________

    /// `∫c f(g(x)) g'(x) dx = c G(g(x))`: for every factor, checks whether the product of the
    /// remaining factors is a constant multiple of the derivative of its inner argument.
    fn derivative_divides(&self, f: &Expr) -> Result<Option<Expr>, IntegralError> {
        let var = self.var;
        let mut factors = Vec::new();
        collect_factors(f, false, &mut factors);
        let mut candidates: Vec<(Expr, Expr)> = (0..factors.len())
            .map(|i| {
                let rest = factors
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, factor)| factor.clone());
                (factors[i].clone(), product(rest))
            })
            .collect();
        if let Expr::Div(num, den) = f {
            candidates.push((invert(den), *num.clone()));
        }
        for (factor, cofactor) in candidates {
            self.check_deadline()?;
            let mut options = Vec::new();
            if let Some(decomposed) = Outer::decompose(&factor, var) {
                options.push(decomposed);
            }
            if !matches!(factor, Expr::Var(_)) {
                options.push((Outer::Power(1.0), factor.clone()));
            }
            for (outer, inner) in options {
                if !inner.contains_variable(var) {
                    continue;
                }
                let derivative = inner.diff(var).simplify();
                let ratio = Expr::Div(cofactor.clone().boxed(), derivative.boxed());
                let Some(c) = constant_value(&ratio, var) else {
                    continue;
                };
                let candidate = Expr::scaled(c, outer.antiderivative(inner.clone()));
                if candidate.diff(var).matches_numerically(f, var, &PROBES, 1e-6) {
                    debug!("substitution u = {} in {}", inner.to_text(), f.to_text());
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }
}

fn term_is_zero(term: &Expr) -> bool {
    match term {
        Expr::Mul(lhs, _) => lhs.is_zero(),
        _ => term.is_zero(),
    }
}

/// flattens nested sums and differences into (sign, term)
fn signed_terms(expr: &Expr, sign: f64, out: &mut Vec<(f64, Expr)>) {
    match expr {
        Expr::Add(lhs, rhs) => {
            signed_terms(lhs, sign, out);
            signed_terms(rhs, sign, out);
        }
        Expr::Sub(lhs, rhs) => {
            signed_terms(lhs, sign, out);
            signed_terms(rhs, -sign, out);
        }
        _ => out.push((sign, expr.clone())),
    }
}

/// flattens products and quotients into factors, denominators as negative powers
fn collect_factors(expr: &Expr, inverted: bool, out: &mut Vec<Expr>) {
    match expr {
        Expr::Mul(lhs, rhs) => {
            collect_factors(lhs, inverted, out);
            collect_factors(rhs, inverted, out);
        }
        Expr::Div(num, den) => {
            collect_factors(num, inverted, out);
            collect_factors(den, !inverted, out);
        }
        _ if inverted => out.push(invert(expr)),
        _ => out.push(expr.clone()),
    }
}

fn invert(expr: &Expr) -> Expr {
    match expr {
        Expr::Pow(base, exp) => match exp.as_const() {
            Some(n) => Expr::Pow(base.clone(), Expr::Const(-n).boxed()),
            None => Expr::Pow(expr.clone().boxed(), Expr::Const(-1.0).boxed()),
        },
        _ => Expr::Pow(expr.clone().boxed(), Expr::Const(-1.0).boxed()),
    }
}

fn product(factors: impl Iterator<Item = Expr>) -> Expr {
    factors
        .reduce(|acc, factor| Expr::Mul(acc.boxed(), factor.boxed()))
        .unwrap_or(Expr::Const(1.0))
}

/// The value of `expr` when it is the same number at every point where it is defined.
fn constant_value(expr: &Expr, var: &str) -> Option<f64> {
    let values: Vec<f64> = PROBES
        .iter()
        .filter_map(|point| expr.eval_checked(Some((var, *point))).ok())
        .collect();
    if values.len() < 3 {
        return None;
    }
    let first = values[0];
    if first == 0.0 {
        return None;
    }
    values
        .iter()
        .all(|v| (v - first).abs() <= 1e-9 * first.abs().max(1.0))
        .then_some(first)
}
