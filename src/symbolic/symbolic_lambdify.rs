use crate::symbolic::symbolic_engine::Expr;
use std::f64::consts::PI;

/// compiled single-variable function, shareable with a blocking worker thread
pub type Lambda1D = Box<dyn Fn(f64) -> f64 + Send + Sync>;

impl Expr {
    /// LAMBDIFICATION - Converting Symbolic Expressions to Executable Functions

    /// Converts a single-variable expression into a closure for fast repeated evaluation.
    ///
    /// The closure mirrors the expression tree: one nested closure per node, no parsing or
    /// tree walking at call time. Outside the real domain the closure returns a non-finite
    /// value (`NaN` for `ln(-1)` or `(-1)^0.5`, `inf` for `1/0`), which samplers filter out.
    /// Symbols other than `var` evaluate to `NaN`.
    ///
    /// # Examples
    /// ```
    /// use RustedIntegrals::symbolic::symbolic_engine::Expr;
    /// let f = Expr::parse_expression("x^2 + 1", "x").unwrap();
    /// let func = f.lambdify1D("x");
    /// assert_eq!(func(3.0), 10.0);
    /// assert!(Expr::parse_expression("ln(x)", "x").unwrap().lambdify1D("x")(-1.0).is_nan());
    /// ```
    pub fn lambdify1D(&self, var: &str) -> Lambda1D {
        self.compile1D(var, false)
    }

    /// Same as `lambdify1D` for an antiderivative: logarithms are evaluated as `ln|u|`,
    /// matching `eval_antiderivative`.
    pub fn lambdify1D_antiderivative(&self, var: &str) -> Lambda1D {
        self.compile1D(var, true)
    }

    fn compile1D(&self, var: &str, abs_logs: bool) -> Lambda1D {
        match self {
            Expr::Var(name) if name == var => Box::new(|x| x),
            Expr::Var(_) => Box::new(|_| f64::NAN),
            Expr::Const(val) => {
                let val = *val;
                Box::new(move |_| val)
            }
            Expr::Add(lhs, rhs) => {
                let lhs_fn = lhs.compile1D(var, abs_logs);
                let rhs_fn = rhs.compile1D(var, abs_logs);
                Box::new(move |x| lhs_fn(x) + rhs_fn(x))
            }
            Expr::Sub(lhs, rhs) => {
                let lhs_fn = lhs.compile1D(var, abs_logs);
                let rhs_fn = rhs.compile1D(var, abs_logs);
                Box::new(move |x| lhs_fn(x) - rhs_fn(x))
            }
            Expr::Mul(lhs, rhs) => {
                let lhs_fn = lhs.compile1D(var, abs_logs);
                let rhs_fn = rhs.compile1D(var, abs_logs);
                Box::new(move |x| lhs_fn(x) * rhs_fn(x))
            }
            Expr::Div(lhs, rhs) => {
                let lhs_fn = lhs.compile1D(var, abs_logs);
                let rhs_fn = rhs.compile1D(var, abs_logs);
                Box::new(move |x| lhs_fn(x) / rhs_fn(x))
            }
            Expr::Pow(base, exp) => {
                let base_fn = base.compile1D(var, abs_logs);
                // integer exponents are the common case: powi keeps negative bases real
                if let Some(n) = exp.as_const().filter(|n| n.fract() == 0.0 && n.abs() < 1024.0) {
                    let n = n as i32;
                    return Box::new(move |x| base_fn(x).powi(n));
                }
                let exp_fn = exp.compile1D(var, abs_logs);
                Box::new(move |x| base_fn(x).powf(exp_fn(x)))
            }
            Expr::Exp(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| expr_fn(x).exp())
            }
            Expr::Ln(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                if abs_logs {
                    Box::new(move |x| expr_fn(x).abs().ln())
                } else {
                    Box::new(move |x| expr_fn(x).ln())
                }
            }
            Expr::sin(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| expr_fn(x).sin())
            }
            Expr::cos(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| expr_fn(x).cos())
            }
            Expr::tg(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| expr_fn(x).tan())
            }
            Expr::ctg(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| {
                    let arg = expr_fn(x);
                    arg.cos() / arg.sin()
                })
            }
            Expr::arcsin(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| expr_fn(x).asin())
            }
            Expr::arccos(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| expr_fn(x).acos())
            }
            Expr::arctg(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| expr_fn(x).atan())
            }
            Expr::arcctg(expr) => {
                let expr_fn = expr.compile1D(var, abs_logs);
                Box::new(move |x| PI / 2.0 - expr_fn(x).atan())
            }
        }
    } // end of compile1D
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn compile(input: &str) -> Lambda1D {
        Expr::parse_expression(input, "x").unwrap().lambdify1D("x")
    }

    #[test]
    fn test_lambdify1d_polynomial() {
        let f = compile("2x^3 - x + 1");
        assert_relative_eq!(f(2.0), 15.0);
        assert_relative_eq!(f(-1.0), 0.0);
    }

    #[test]
    fn test_lambdify1d_negative_base() {
        let f = compile("x^3");
        assert_relative_eq!(f(-2.0), -8.0);
        let f = compile("x^(-2)");
        assert_relative_eq!(f(-2.0), 0.25);
        assert!(compile("sqrt(x)")(-4.0).is_nan());
    }

    #[test]
    fn test_lambdify1d_trigonometric() {
        let f = compile("sin(x) + cos(x) + tg(x) + ctg(x)");
        let x = 0.7f64;
        assert_relative_eq!(
            f(x),
            x.sin() + x.cos() + x.tan() + 1.0 / x.tan(),
            epsilon = 1e-12
        );
        let f = compile("acot(x)");
        assert_relative_eq!(f(1.0), PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lambdify1d_domain() {
        assert!(compile("ln(x)")(-1.0).is_nan());
        assert!(compile("1/x")(0.0).is_infinite());
        assert!(compile("asin(x)")(2.0).is_nan());
    }

    #[test]
    fn test_antiderivative_logs() {
        let big_f = Expr::parse_expression("ln(x)", "x").unwrap();
        let plain = big_f.lambdify1D("x");
        let absolute = big_f.lambdify1D_antiderivative("x");
        assert!(plain(-2.0).is_nan());
        assert_relative_eq!(absolute(-2.0), 2f64.ln());
    }

    #[test]
    fn test_lambdify1d_agrees_with_evaluator() {
        let expr = Expr::parse_expression("x^2*exp(-x) + atan(x/2) - 3/(x^2+1)", "x").unwrap();
        let f = expr.lambdify1D("x");
        for x in [-2.5, -0.3, 0.0, 1.7, 4.2] {
            assert_relative_eq!(
                f(x),
                expr.eval_checked(Some(("x", x))).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_closure_is_send_sync() {
        let f = compile("x^2");
        let handle = std::thread::spawn(move || f(3.0));
        assert_eq!(handle.join().unwrap(), 9.0);
    }
}
