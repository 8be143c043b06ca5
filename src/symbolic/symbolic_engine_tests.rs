use crate::symbolic::symbolic_engine::Expr;
use std::f64::consts::{E, PI};
//___________________________________TESTS____________________________________

mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gauss_quad::GaussLegendre;
    use std::collections::BTreeSet;

    fn parse(input: &str) -> Expr {
        Expr::parse_expression(input, "x").unwrap()
    }

    /// ∫_a^b f by Gauss-Legendre quadrature
    fn quadrature(f: &Expr, a: f64, b: f64) -> f64 {
        let quad = GaussLegendre::new(60).unwrap();
        let func = f.lambdify1D("x");
        quad.integrate(a, b, |x| func(x))
    }

    fn definite(f: &Expr, a: f64, b: f64) -> f64 {
        let big_f = f.integrate("x").unwrap();
        big_f.eval_antiderivative(Some(("x", b))).unwrap()
            - big_f.eval_antiderivative(Some(("x", a))).unwrap()
    }

    #[test]
    fn test_operators_build_nodes() {
        let x = Expr::Var("x".to_string());
        let expr = x.clone() + Expr::Const(2.0);
        assert_eq!(
            expr,
            Expr::Add(Box::new(x.clone()), Box::new(Expr::Const(2.0)))
        );
        let expr = -x.clone();
        assert_eq!(
            expr,
            Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(x.clone()))
        );
        let expr = x.clone() / Expr::Const(3.0) - x.clone() * x.clone();
        assert_eq!(expr.node_count(), 7);
    }

    #[test]
    fn test_free_symbols_and_substitution() {
        let expr = Expr::Var("t".to_string()) * Expr::Var("x".to_string()).exp();
        let symbols: BTreeSet<String> = ["t".to_string(), "x".to_string()].into_iter().collect();
        assert_eq!(expr.free_symbols(), symbols);
        let substituted = expr.set_variable("t", 2.0);
        assert!(!substituted.contains_variable("t"));
        assert_relative_eq!(
            substituted.eval_checked(Some(("x", 0.0))).unwrap(),
            2.0
        );
        let renamed = parse("sin(x) + x").rename_variable("x", "u");
        assert_eq!(renamed.to_text(), "sin(u) + u");
    }

    #[test]
    fn test_parse_integrate_render() {
        let cases = [
            ("x**2", "x**3/3"),
            ("sin(x)", "-cos(x)"),
            ("2x", "x**2"),
            ("exp(-x)", "-exp(-x)"),
            ("1/(x^2+1)", "atan(x)"),
            ("x*exp(x)", "(x - 1)*exp(x)"),
        ];
        for (input, expected) in cases {
            assert_eq!(parse(input).integrate("x").unwrap().to_text(), expected, "{}", input);
        }
    }

    #[test]
    fn test_other_variable_name() {
        let f = Expr::parse_expression("t^2 + sin(t)", "t").unwrap();
        assert_eq!(f.integrate("t").unwrap().to_text(), "t**3/3 - cos(t)");
    }

    #[test]
    fn test_antiderivative_differentiates_back() {
        let integrands = [
            "x^4 - 3x + 2",
            "sin(3x) + cos(x/2)",
            "exp(2x - 1)",
            "1/(3x + 2)",
            "x^2*exp(x)",
            "x*cos(2x)",
            "x^2*ln(x)",
            "ln(2x + 1)",
            "tan(x)",
            "1/(x^2 + 4)",
            "x/(x^2 + 4)",
            "(2x + 3)/(x^2 + 3x + 1)",
            "x*(x^2 + 1)^3",
            "cos(x)*exp(sin(x))",
            "sqrt(2x + 1)",
            "atan(x)",
        ];
        let probes = [0.35, 0.8, 1.3, 2.2];
        for input in integrands {
            let f = parse(input);
            let derivative = f.integrate("x").unwrap().diff("x");
            for probe in probes {
                let (Ok(expected), Ok(actual)) = (
                    f.eval_checked(Some(("x", probe))),
                    derivative.eval_checked(Some(("x", probe))),
                ) else {
                    continue;
                };
                assert_relative_eq!(actual, expected, epsilon = 1e-9, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_definite_values_agree_with_quadrature() {
        let cases = [
            ("x^2", 0.0, 2.0),
            ("sin(x)", 0.0, PI),
            ("x*exp(-x)", 0.0, 3.0),
            ("1/(x^2+1)", -1.0, 1.0),
            ("x*ln(x)", 1.0, 2.0),
            ("exp(x)*cos(x)", 0.0, 1.5),
            ("1/x", 1.0, E),
            ("sqrt(x + 1)", 0.0, 4.0),
        ];
        for (input, a, b) in cases {
            let f = parse(input);
            assert_relative_eq!(
                definite(&f, a, b),
                quadrature(&f, a, b),
                epsilon = 1e-6,
                max_relative = 1e-6
            );
        }
    }

    #[test]
    fn test_known_definite_values() {
        assert_relative_eq!(definite(&parse("x^2"), 0.0, 2.0), 8.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(
            definite(&parse("sin(x)"), 0.0, PI),
            2.0,
            epsilon = 1e-12
        );
        // ln|x| on a negative interval
        assert_relative_eq!(
            definite(&parse("1/x"), -2.0, -1.0),
            -(2f64.ln()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_latex_of_antiderivatives() {
        assert_eq!(parse("x^2").integrate("x").unwrap().to_latex(), "\\frac{x^{3}}{3}");
        assert_eq!(
            parse("sin(x)").integrate("x").unwrap().to_latex(),
            "-\\cos{\\left(x \\right)}"
        );
    }
}
