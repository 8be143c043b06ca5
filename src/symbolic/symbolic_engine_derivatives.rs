//! # Symbolic Engine Derivatives Module
//!
//! Differentiation and checked numerical evaluation of symbolic expressions.
//!
//! ## Key Methods
//! - `diff(var)` - analytical derivative, all rules of calculus for the supported functions
//! - `eval_checked(binding)` - evaluation that reports domain errors instead of producing NaN
//! - `matches_numerically(other, var, probes, tol)` - numerical identity check used by the
//!   integrator to test whether a quotient is constant and by tests to verify antiderivatives
use std::f64::consts::PI;

use crate::errors::IntegralError;
use crate::symbolic::symbolic_engine::Expr;

fn domain_error(msg: String) -> IntegralError {
    IntegralError::EvaluationError(msg)
}

fn finite(value: f64, what: &str) -> Result<f64, IntegralError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(domain_error(format!("{} is not finite", what)))
    }
}

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to a variable.
    ///
    /// - Power rule: d/dx(u^n) = n*u^(n-1)*u' for an exponent free of `var`
    /// - General power: d/dx(u^v) = u^v*(v'*ln(u) + v*u'/u)
    /// - Product rule, quotient rule and chain rule for every function
    ///
    /// The result is not simplified.
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::Var("x".to_string());
    /// let f = x.clone().pow(Expr::Const(2.0)); // x^2
    /// let df_dx = f.diff("x"); // 2*x^1*1
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => Expr::Add(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Sub(lhs, rhs) => Expr::Sub(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Mul(lhs, rhs) => Expr::Add(
                Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                    Box::new(Expr::Mul(Box::new(rhs.diff(var)), lhs.clone())),
                )),
                Box::new(Expr::Pow(rhs.clone(), Box::new(Expr::Const(2.0)))),
            ),
            Expr::Pow(base, exp) if !exp.contains_variable(var) => Expr::Mul(
                Box::new(Expr::Mul(
                    exp.clone(),
                    Box::new(Expr::Pow(
                        base.clone(),
                        Box::new(Expr::Sub(exp.clone(), Box::new(Expr::Const(1.0)))),
                    )),
                )),
                Box::new(base.diff(var)),
            ),
            Expr::Pow(base, exp) if !base.contains_variable(var) => Expr::Mul(
                Box::new(Expr::Mul(Box::new(self.clone()), Box::new(Expr::Ln(base.clone())))),
                Box::new(exp.diff(var)),
            ),
            Expr::Pow(base, exp) => Expr::Mul(
                Box::new(self.clone()),
                Box::new(Expr::Add(
                    Box::new(Expr::Mul(Box::new(exp.diff(var)), Box::new(Expr::Ln(base.clone())))),
                    Box::new(Expr::Div(
                        Box::new(Expr::Mul(exp.clone(), Box::new(base.diff(var)))),
                        base.clone(),
                    )),
                )),
            ),
            Expr::Exp(expr) => {
                Expr::Mul(Box::new(Expr::Exp(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::Ln(expr) => Expr::Div(Box::new(expr.diff(var)), expr.clone()),
            Expr::sin(expr) => {
                Expr::Mul(Box::new(Expr::cos(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::cos(expr) => Expr::Mul(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(Expr::sin(expr.clone())),
                )),
                Box::new(expr.diff(var)),
            ),
            Expr::tg(expr) => Expr::Div(
                Box::new(expr.diff(var)),
                Box::new(Expr::Pow(
                    Box::new(Expr::cos(expr.clone())),
                    Box::new(Expr::Const(2.0)),
                )),
            ),
            Expr::ctg(expr) => Expr::Div(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(expr.diff(var)),
                )),
                Box::new(Expr::Pow(
                    Box::new(Expr::sin(expr.clone())),
                    Box::new(Expr::Const(2.0)),
                )),
            ),
            Expr::arcsin(expr) => Expr::Div(
                Box::new(expr.diff(var)),
                Box::new(Expr::Pow(
                    Box::new(Expr::Sub(
                        Box::new(Expr::Const(1.0)),
                        Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                    )),
                    Box::new(Expr::Const(0.5)),
                )),
            ),
            Expr::arccos(expr) => Expr::Div(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(expr.diff(var)),
                )),
                Box::new(Expr::Pow(
                    Box::new(Expr::Sub(
                        Box::new(Expr::Const(1.0)),
                        Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                    )),
                    Box::new(Expr::Const(0.5)),
                )),
            ),
            Expr::arctg(expr) => Expr::Div(
                Box::new(expr.diff(var)),
                Box::new(Expr::Add(
                    Box::new(Expr::Const(1.0)),
                    Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                )),
            ),
            Expr::arcctg(expr) => Expr::Div(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(expr.diff(var)),
                )),
                Box::new(Expr::Add(
                    Box::new(Expr::Const(1.0)),
                    Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                )),
            ),
        }
    } // end of diff

    /// CHECKED EVALUATION

    /// Evaluates the expression to a real number.
    ///
    /// `binding` gives the value of the only variable allowed in the expression; `None`
    /// evaluates a constant expression. Every domain violation (logarithm of a non-positive
    /// number, even root of a negative number, division by zero, arcsin outside [-1, 1], ...)
    /// and every non-finite intermediate value is reported as an `EvaluationError`.
    pub fn eval_checked(&self, binding: Option<(&str, f64)>) -> Result<f64, IntegralError> {
        self.evaluate(binding, false)
    }

    /// Evaluates an antiderivative: every logarithm is read as `ln|u|`.
    ///
    /// The integrator writes `ln(u)` for the antiderivative of `u'/u`; `ln|u|` has the same
    /// derivative wherever `u != 0`, so this gives a real antiderivative on intervals where
    /// `u < 0` as well (e.g. the integral of `1/x` on [-2, -1]).
    pub fn eval_antiderivative(&self, binding: Option<(&str, f64)>) -> Result<f64, IntegralError> {
        self.evaluate(binding, true)
    }

    fn evaluate(&self, binding: Option<(&str, f64)>, abs_logs: bool) -> Result<f64, IntegralError> {
        match self {
            Expr::Var(name) => match binding {
                Some((var, value)) if var == name => Ok(value),
                _ => Err(domain_error(format!("symbol '{}' has no value", name))),
            },
            Expr::Const(val) => finite(*val, "constant"),
            Expr::Add(lhs, rhs) => finite(
                lhs.evaluate(binding, abs_logs)? + rhs.evaluate(binding, abs_logs)?,
                "sum",
            ),
            Expr::Sub(lhs, rhs) => finite(
                lhs.evaluate(binding, abs_logs)? - rhs.evaluate(binding, abs_logs)?,
                "difference",
            ),
            Expr::Mul(lhs, rhs) => finite(
                lhs.evaluate(binding, abs_logs)? * rhs.evaluate(binding, abs_logs)?,
                "product",
            ),
            Expr::Div(lhs, rhs) => {
                let numerator = lhs.evaluate(binding, abs_logs)?;
                let denominator = rhs.evaluate(binding, abs_logs)?;
                if denominator == 0.0 {
                    return Err(domain_error("division by zero".to_string()));
                }
                finite(numerator / denominator, "quotient")
            }
            Expr::Pow(base, exp) => {
                let base = base.evaluate(binding, abs_logs)?;
                let exp = exp.evaluate(binding, abs_logs)?;
                if base < 0.0 && exp.fract() != 0.0 {
                    return Err(domain_error(format!(
                        "{} raised to the non-integer power {} is not real",
                        base, exp
                    )));
                }
                if base == 0.0 && exp < 0.0 {
                    return Err(domain_error("division by zero".to_string()));
                }
                finite(base.powf(exp), "power")
            }
            Expr::Exp(expr) => finite(expr.evaluate(binding, abs_logs)?.exp(), "exponential"),
            Expr::Ln(expr) => {
                let arg = expr.evaluate(binding, abs_logs)?;
                let arg = if abs_logs { arg.abs() } else { arg };
                if arg <= 0.0 {
                    return Err(domain_error(format!(
                        "logarithm of non-positive value {}",
                        arg
                    )));
                }
                Ok(arg.ln())
            }
            Expr::sin(expr) => Ok(expr.evaluate(binding, abs_logs)?.sin()),
            Expr::cos(expr) => Ok(expr.evaluate(binding, abs_logs)?.cos()),
            Expr::tg(expr) => {
                let arg = expr.evaluate(binding, abs_logs)?;
                if arg.cos() == 0.0 {
                    return Err(domain_error(format!("tan is undefined at {}", arg)));
                }
                finite(arg.tan(), "tangent")
            }
            Expr::ctg(expr) => {
                let arg = expr.evaluate(binding, abs_logs)?;
                let sin = arg.sin();
                if sin == 0.0 {
                    return Err(domain_error(format!("cot is undefined at {}", arg)));
                }
                finite(arg.cos() / sin, "cotangent")
            }
            Expr::arcsin(expr) => {
                let arg = expr.evaluate(binding, abs_logs)?;
                if arg.abs() > 1.0 {
                    return Err(domain_error(format!("asin is undefined at {}", arg)));
                }
                Ok(arg.asin())
            }
            Expr::arccos(expr) => {
                let arg = expr.evaluate(binding, abs_logs)?;
                if arg.abs() > 1.0 {
                    return Err(domain_error(format!("acos is undefined at {}", arg)));
                }
                Ok(arg.acos())
            }
            Expr::arctg(expr) => Ok(expr.evaluate(binding, abs_logs)?.atan()),
            Expr::arcctg(expr) => Ok(PI / 2.0 - expr.evaluate(binding, abs_logs)?.atan()),
        }
    } // end of evaluate

    /// Numerical identity check: `self` and `other` agree at every probe point where both
    /// can be evaluated, within a relative tolerance. At least one probe must be usable.
    pub fn matches_numerically(&self, other: &Expr, var: &str, probes: &[f64], tol: f64) -> bool {
        let mut compared = 0;
        for &probe in probes {
            let (Ok(a), Ok(b)) = (
                self.eval_checked(Some((var, probe))),
                other.eval_checked(Some((var, probe))),
            ) else {
                continue;
            };
            if (a - b).abs() > tol * (1.0 + a.abs().max(b.abs())) {
                return false;
            }
            compared += 1;
        }
        compared > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parse(input: &str) -> Expr {
        Expr::parse_expression(input, "x").unwrap()
    }

    #[test]
    fn test_diff_polynomial() {
        let f = parse("3x^2 + 2x + 1");
        let df = f.diff("x");
        assert_relative_eq!(df.eval_checked(Some(("x", 2.0))).unwrap(), 14.0);
    }

    #[test]
    fn test_diff_variable_exponent() {
        // d/dx 2^x = 2^x ln 2
        let f = parse("2^x");
        let df = f.diff("x");
        assert_relative_eq!(
            df.eval_checked(Some(("x", 1.5))).unwrap(),
            2f64.powf(1.5) * 2f64.ln(),
            epsilon = 1e-12
        );
        // d/dx x^x = x^x (ln x + 1)
        let f = parse("x^x");
        let df = f.diff("x");
        assert_relative_eq!(
            df.eval_checked(Some(("x", 1.5))).unwrap(),
            1.5f64.powf(1.5) * (1.5f64.ln() + 1.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_diff_functions_against_finite_differences() {
        let inputs = [
            "sin(2x)", "cos(x^2)", "tan(x)", "cot(x)", "asin(x/2)", "acos(x/2)", "atan(3x)",
            "acot(x)", "exp(-x^2)", "ln(x^2+1)", "sqrt(x+4)", "x/(x^2+1)",
        ];
        let h = 1e-6;
        for input in inputs {
            let f = parse(input);
            let df = f.diff("x");
            for probe in [0.3, 0.7, 1.1] {
                let numeric = (f.eval_checked(Some(("x", probe + h))).unwrap()
                    - f.eval_checked(Some(("x", probe - h))).unwrap())
                    / (2.0 * h);
                let analytic = df.eval_checked(Some(("x", probe))).unwrap();
                assert_relative_eq!(analytic, numeric, epsilon = 1e-5, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_eval_domain_errors() {
        let cases = [
            ("ln(x)", 0.0),
            ("ln(x)", -1.0),
            ("1/x", 0.0),
            ("sqrt(x)", -4.0),
            ("asin(x)", 2.0),
            ("acos(x)", -1.5),
            ("cot(x)", 0.0),
            ("x^-1", 0.0),
            ("exp(x)", 1000.0),
        ];
        for (input, at) in cases {
            let err = parse(input).eval_checked(Some(("x", at))).unwrap_err();
            assert_eq!(err.kind(), "EvaluationError", "{} at {}", input, at);
        }
    }

    #[test]
    fn test_eval_values() {
        assert_relative_eq!(parse("x^3").eval_checked(Some(("x", -2.0))).unwrap(), -8.0);
        assert_relative_eq!(
            parse("acot(x)").eval_checked(Some(("x", -1.0))).unwrap(),
            3.0 * PI / 4.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            parse("cot(x)").eval_checked(Some(("x", PI / 4.0))).unwrap(),
            1.0,
            epsilon = 1e-12
        );
        let err = parse("x").eval_checked(None).unwrap_err();
        assert_eq!(err.kind(), "EvaluationError");
    }

    #[test]
    fn test_matches_numerically() {
        let a = parse("(x+1)^2");
        let b = parse("x^2 + 2x + 1");
        assert!(a.matches_numerically(&b, "x", &[0.5, 1.5, -2.0], 1e-10));
        let c = parse("x^2 + 2x");
        assert!(!a.matches_numerically(&c, "x", &[0.5, 1.5, -2.0], 1e-10));
        let ln = parse("ln(x)");
        assert!(!ln.matches_numerically(&ln, "x", &[-1.0, -2.0], 1e-10));
    }
}
