//! Dense univariate polynomials with `f64` coefficients in ascending order
//! (`[c0, c1, c2]` is `c0 + c1*x + c2*x^2`), and the conversion between them and `Expr`.
//!
//! The integrator uses them to recognize polynomial integrands in any written form
//! (`(x+1)^2`, `x(x+2)`, `(3x^2 - 1)/4`), for rational functions with a linear or quadratic
//! denominator, and for tabular integration by parts.
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_simplify::build_sum;

/// highest degree produced while expanding products and powers
pub const MAX_DEGREE: usize = 64;

pub type Poly = Vec<f64>;

/// relative size below which a computed coefficient is a cancellation residue
const CANCELLATION_EPS: f64 = 1e-12;

/// `value` computed from terms of total absolute size `magnitude`; zero when the terms
/// cancelled up to rounding
fn settle(value: f64, magnitude: f64) -> f64 {
    if value.abs() <= CANCELLATION_EPS * magnitude {
        0.0
    } else {
        value
    }
}

/// drops zero leading coefficients, keeps at least one
pub fn trim(mut p: Poly) -> Poly {
    while p.len() > 1 && p.last() == Some(&0.0) {
        p.pop();
    }
    if p.is_empty() {
        p.push(0.0);
    }
    p
}

pub fn degree(p: &[f64]) -> usize {
    p.len().saturating_sub(1)
}

pub fn is_zero(p: &[f64]) -> bool {
    p.iter().all(|c| *c == 0.0)
}

pub fn add(a: &[f64], b: &[f64]) -> Poly {
    let out = (0..a.len().max(b.len()))
        .map(|i| {
            let (ca, cb) = (a.get(i).copied().unwrap_or(0.0), b.get(i).copied().unwrap_or(0.0));
            settle(ca + cb, ca.abs() + cb.abs())
        })
        .collect();
    trim(out)
}

pub fn scale(a: &[f64], factor: f64) -> Poly {
    trim(a.iter().map(|c| c * factor).collect())
}

pub fn mul(a: &[f64], b: &[f64]) -> Option<Poly> {
    if degree(a) + degree(b) > MAX_DEGREE {
        return None;
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    let mut magnitude = vec![0.0; out.len()];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            out[i + j] += ca * cb;
            magnitude[i + j] += (ca * cb).abs();
        }
    }
    Some(trim(
        out.into_iter()
            .zip(magnitude)
            .map(|(c, m)| settle(c, m))
            .collect(),
    ))
}

pub fn derivative(a: &[f64]) -> Poly {
    if a.len() <= 1 {
        return vec![0.0];
    }
    trim(a.iter().enumerate().skip(1).map(|(k, c)| c * k as f64).collect())
}

/// antiderivative with a zero constant term
pub fn antiderivative(a: &[f64]) -> Poly {
    let mut out = vec![0.0];
    out.extend(a.iter().enumerate().map(|(k, c)| c / (k as f64 + 1.0)));
    trim(out)
}

/// Long division: (quotient, remainder) with deg(remainder) < deg(divisor).
pub fn div_rem(num: &[f64], den: &[f64]) -> (Poly, Poly) {
    let den = trim(den.to_vec());
    let lead = den[den.len() - 1];
    let mut rem = trim(num.to_vec());
    if rem.len() < den.len() {
        return (vec![0.0], rem);
    }
    let mut quot = vec![0.0; rem.len() - den.len() + 1];
    while rem.len() >= den.len() && !is_zero(&rem) {
        let shift = rem.len() - den.len();
        let factor = rem[rem.len() - 1] / lead;
        quot[shift] = factor;
        for (i, c) in den.iter().enumerate() {
            let old = rem[shift + i];
            rem[shift + i] = settle(old - factor * c, old.abs() + (factor * c).abs());
        }
        // the leading term cancels exactly
        rem.pop();
        rem = trim(rem);
    }
    (trim(quot), rem)
}

/// polynomial in `var`, highest degree first, constant term last
pub fn poly_to_expr(p: &[f64], var: &str) -> Expr {
    let x = Expr::Var(var.to_string());
    let terms: Vec<(f64, Expr)> = p
        .iter()
        .enumerate()
        .rev()
        .map(|(k, c)| {
            let monomial = match k {
                0 => Expr::Const(1.0),
                1 => x.clone(),
                _ => Expr::Pow(Box::new(x.clone()), Box::new(Expr::Const(k as f64))),
            };
            (*c, monomial)
        })
        .collect();
    build_sum(terms)
}

impl Expr {
    /// Coefficients of the expression as a polynomial in `var`, or `None` when it is not one
    /// (or its degree exceeds `MAX_DEGREE`). Sub-expressions free of `var` must evaluate to numbers.
    pub fn polynomial_coefficients(&self, var: &str) -> Option<Poly> {
        if !self.contains_variable(var) {
            return self.eval_checked(None).ok().map(|c| vec![c]);
        }
        match self {
            Expr::Var(name) if name == var => Some(vec![0.0, 1.0]),
            Expr::Add(lhs, rhs) => Some(add(
                &lhs.polynomial_coefficients(var)?,
                &rhs.polynomial_coefficients(var)?,
            )),
            Expr::Sub(lhs, rhs) => Some(add(
                &lhs.polynomial_coefficients(var)?,
                &scale(&rhs.polynomial_coefficients(var)?, -1.0),
            )),
            Expr::Mul(lhs, rhs) => mul(
                &lhs.polynomial_coefficients(var)?,
                &rhs.polynomial_coefficients(var)?,
            ),
            Expr::Div(lhs, rhs) if !rhs.contains_variable(var) => {
                let den = rhs.eval_checked(None).ok()?;
                if den == 0.0 {
                    return None;
                }
                Some(scale(&lhs.polynomial_coefficients(var)?, 1.0 / den))
            }
            Expr::Pow(base, exp) if !exp.contains_variable(var) => {
                let n = exp.eval_checked(None).ok()?;
                if n < 0.0 || n.fract() != 0.0 || n > MAX_DEGREE as f64 {
                    return None;
                }
                let base = base.polynomial_coefficients(var)?;
                let mut result = vec![1.0];
                for _ in 0..n as usize {
                    result = mul(&result, &base)?;
                }
                Some(result)
            }
            _ => None,
        }
    }

    /// (a, b) when the expression is `a*var + b` with `a != 0`
    pub fn linear_coefficients(&self, var: &str) -> Option<(f64, f64)> {
        let p = self.polynomial_coefficients(var)?;
        if p.len() == 2 && p[1] != 0.0 {
            Some((p[1], p[0]))
        } else {
            None
        }
    }
}
