/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedIntegrals::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("2x^2 + sin(x)", "x").unwrap();
/// println!(" parsed_expression {}", parsed_expression.to_text());
/// let f = parsed_expression.lambdify1D("x");
/// println!("f(1) = {}", f(1.0));
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) holds the expression tree and the function whitelist
/// 2) differentiates expressions and evaluates them with domain checks
/// 3) simplifies and renders expressions for the user
///# Example#
/// ```
/// use RustedIntegrals::symbolic::symbolic_engine::Expr;
/// let expr = Expr::parse_expression("x^3/3", "x").unwrap();
/// let derivative = expr.diff("x").simplify();
/// assert_eq!(derivative.to_text(), "x**2");
/// assert_eq!(expr.eval_checked(Some(("x", 3.0))).unwrap(), 9.0);
/// ```
pub mod symbolic_engine;
pub mod symbolic_engine_derivatives;
#[cfg(test)]
mod symbolic_engine_tests;
/// finds antiderivatives of elementary expressions
///# Example
/// ```
/// use RustedIntegrals::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("sin(x)", "x").unwrap();
/// assert_eq!(f.integrate("x").unwrap().to_text(), "-cos(x)");
/// ```
pub mod symbolic_integration;
/// turns a symbolic expression into a Rust closure
pub mod symbolic_lambdify;
/// dense polynomials, used to recognize polynomial and rational integrands
pub mod symbolic_polynomial;
/// plain text and LaTeX output
pub mod symbolic_render;
pub mod symbolic_simplify;
/// numeric helpers
pub mod utils;
