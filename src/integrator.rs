//! The integration pipeline: parse, integrate, render, evaluate between the bounds and
//! sample the three plots. One call per request, no state shared between calls.
///
/// # Example
/// ```
/// use RustedIntegrals::integrator::engine::{EngineSettings, IntegrationEngine};
/// use RustedIntegrals::integrator::request::IntegrationRequest;
/// let engine = IntegrationEngine::new(EngineSettings::default());
/// let result = engine.run(&IntegrationRequest::new("sin(x)", "x", None, None));
/// assert_eq!(result.integral_text.as_deref(), Some("-cos(x) + C"));
/// assert!(result.definite_value.is_none());
/// ```
pub mod engine;
/// wire types of the calculation request and its result
pub mod request;
/// discretization of functions into plot-ready point series
pub mod sampling;
