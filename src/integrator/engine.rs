//! # Integration & Sampling Engine
//!
//! Runs the whole pipeline for one request:
//!
//! 1. parse and validate the expression and the variable
//! 2. find the antiderivative (`IntegrationError` when there is none)
//! 3. render it as text and LaTeX, with `+ C`
//! 4. when both bounds are given: evaluate them, check that the integrand and the
//!    antiderivative are finite on the interval, and compute `F(upper) - F(lower)`
//! 5. sample the function, the antiderivative and the area between the bounds
//!
//! Steps 1-4 either succeed or fail the whole request; sampling never fails, bad points
//! are dropped. Every error is turned into a failed `IntegrationResult` by `run`.
//!
//! `run_until` takes a deadline: the integrator and the singularity scan check it and stop
//! with a `Timeout` error once it has passed.
use std::time::Instant;

use log::{debug, info, warn};

use crate::Utils::config::{AppConfig, LimitsConfig, SamplingConfig};
use crate::errors::IntegralError;
use crate::integrator::request::{BoundInput, IntegrationRequest, IntegrationResult};
use crate::integrator::sampling::Sampler;
use crate::symbolic::parse_expr::{ParseOptions, parse_constant, parse_function, resolve_variable};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::linspace;

/// iterations of the bisection that tells a pole from a root
const BISECTION_STEPS: usize = 200;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineSettings {
    pub sampling: SamplingConfig,
    pub limits: LimitsConfig,
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        EngineSettings {
            sampling: config.sampling.clone(),
            limits: config.limits.clone(),
        }
    }
}

pub struct IntegrationEngine {
    settings: EngineSettings,
}

impl IntegrationEngine {
    pub fn new(settings: EngineSettings) -> Self {
        IntegrationEngine { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_input_len: self.settings.limits.max_input_len,
            max_depth: self.settings.limits.max_depth,
        }
    }

    /// Runs the pipeline; a failure is reported in the result, never raised.
    pub fn run(&self, request: &IntegrationRequest) -> IntegrationResult {
        self.run_until(request, None)
    }

    pub fn run_until(&self, request: &IntegrationRequest, deadline: Option<Instant>) -> IntegrationResult {
        match self.try_run_until(request, deadline) {
            Ok(result) => {
                info!(
                    "∫ {} = {}{}",
                    request.function.trim(),
                    result.integral_text.as_deref().unwrap_or_default(),
                    result
                        .definite_value
                        .map(|value| format!(", definite value {}", value))
                        .unwrap_or_default()
                );
                result
            }
            Err(err) => {
                warn!("{} for input '{}'", err, request.function.trim());
                IntegrationResult::failure(&err)
            }
        }
    }

    pub fn try_run(&self, request: &IntegrationRequest) -> Result<IntegrationResult, IntegralError> {
        self.try_run_until(request, None)
    }

    pub fn try_run_until(
        &self,
        request: &IntegrationRequest,
        deadline: Option<Instant>,
    ) -> Result<IntegrationResult, IntegralError> {
        let options = self.parse_options();
        let variable = resolve_variable(&request.variable)?;
        let f = parse_function(&request.function, &variable, &options)?;
        debug!("parsed {} as {}", request.function.trim(), f.to_text());

        let big_f =
            f.integrate_until(&variable, self.settings.limits.max_integration_depth, deadline)?;
        let integral_text = format!("{} + C", big_f.to_text());
        let integral_latex = format!("{} + C", big_f.to_latex());

        let bounds = match request.bounds() {
            Some((lower, upper)) => Some((
                self.evaluate_bound(lower, &options).map_err(|e| e.context("lower limit"))?,
                self.evaluate_bound(upper, &options).map_err(|e| e.context("upper limit"))?,
            )),
            None => None,
        };
        let definite_value = match bounds {
            Some((lower, upper)) => {
                Some(self.definite_value(&f, &big_f, &variable, (lower, upper), deadline)?)
            }
            None => None,
        };

        check_deadline(deadline)?;
        let sampler = Sampler::new(&self.settings.sampling, self.settings.limits.max_samples);
        let window = sampler.window(bounds);
        let f_fn = f.lambdify1D(&variable);
        let big_f_fn = big_f.lambdify1D_antiderivative(&variable);
        let function_points = sampler.sample(&f_fn, window);
        let integral_points = sampler.sample_on_domain(&big_f_fn, &f_fn, window);
        let area_points = bounds.map(|bounds| sampler.area(&f_fn, bounds));

        Ok(IntegrationResult {
            success: true,
            integral_text: Some(integral_text),
            integral_latex: Some(integral_latex),
            definite_value,
            function_points: Some(function_points),
            integral_points: Some(integral_points),
            area_points,
            error: None,
            error_kind: None,
        })
    }

    /// A bound as a finite real number: `2`, `-1.5`, `pi/2`, `sqrt(2)`.
    pub fn evaluate_bound(&self, bound: &BoundInput, options: &ParseOptions) -> Result<f64, IntegralError> {
        let value = match bound {
            BoundInput::Number(value) => *value,
            BoundInput::Text(text) => parse_constant(text, options)?.eval_checked(None)?,
        };
        if !value.is_finite() {
            return Err(IntegralError::EvaluationError(format!(
                "a limit must be a finite number, found {}",
                value
            )));
        }
        Ok(value)
    }

    /// `F(upper) - F(lower)` after checking that `f` and `F` are finite on the interval.
    pub fn definite_value(
        &self,
        f: &Expr,
        big_f: &Expr,
        var: &str,
        (lower, upper): (f64, f64),
        deadline: Option<Instant>,
    ) -> Result<f64, IntegralError> {
        let (lo, hi) = (lower.min(upper), lower.max(upper));
        let mut probes = linspace(lo, hi, self.settings.sampling.singularity_probes);
        probes.push(0.5 * (lo + hi));
        let integrand = |x: f64| f.eval_checked(Some((var, x)));
        let antiderivative = |x: f64| big_f.eval_antiderivative(Some((var, x)));

        let mut f_values = Vec::with_capacity(probes.len());
        let mut big_f_values = Vec::with_capacity(probes.len());
        for &x in &probes {
            check_deadline(deadline)?;
            let y = integrand(x).map_err(|_| {
                IntegralError::EvaluationError(format!(
                    "integrand is not finite on [{}, {}]: undefined at {} = {}",
                    lo, hi, var, x
                ))
            })?;
            let big_y = antiderivative(x).map_err(|_| {
                IntegralError::EvaluationError(format!(
                    "antiderivative is not finite at {} = {}",
                    var, x
                ))
            })?;
            f_values.push(y);
            big_f_values.push(big_y);
        }
        // the midpoint was only probed
        probes.pop();
        f_values.pop();
        big_f_values.pop();
        for i in 1..probes.len() {
            check_deadline(deadline)?;
            let (a, b) = (probes[i - 1], probes[i]);
            if crosses_pole(&integrand, a, b, f_values[i - 1], f_values[i])
                || crosses_pole(&antiderivative, a, b, big_f_values[i - 1], big_f_values[i])
            {
                return Err(IntegralError::EvaluationError(format!(
                    "integrand is not finite on [{}, {}]: singular between {} = {} and {} = {}",
                    lo, hi, var, a, var, b
                )));
            }
        }

        let value = antiderivative(upper)? - antiderivative(lower)?;
        if !value.is_finite() {
            return Err(IntegralError::EvaluationError(format!(
                "definite value is not finite: {}",
                value
            )));
        }
        debug!("F({}) - F({}) = {}", upper, lower, value);
        Ok(value)
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), IntegralError> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(IntegralError::Timeout(
            "the calculation did not finish before the deadline".to_string(),
        )),
        _ => Ok(()),
    }
}

/// A sign change of `func` between two neighbouring probes is either a root or a pole.
/// Bisection towards the sign change decides: the values shrink at a root and grow
/// without bound at a pole, or the function becomes undefined there.
fn crosses_pole<F>(func: &F, mut a: f64, mut b: f64, mut fa: f64, mut fb: f64) -> bool
where
    F: Fn(f64) -> Result<f64, IntegralError>,
{
    if fa == 0.0 || fb == 0.0 || fa.signum() == fb.signum() {
        return false;
    }
    let start = fa.abs().max(fb.abs());
    for _ in 0..BISECTION_STEPS {
        let m = 0.5 * (a + b);
        if m <= a || m >= b {
            break;
        }
        let Ok(fm) = func(m) else {
            return true;
        };
        if fm == 0.0 {
            return false;
        }
        if fm.signum() == fa.signum() {
            (a, fa) = (m, fm);
        } else {
            (b, fb) = (m, fm);
        }
    }
    fa.abs().min(fb.abs()) > 1e3 * start
}
