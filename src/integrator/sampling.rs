//! Discretization of a compiled function into a plot-ready `PointSeries`.
//!
//! A point is kept only when its value is finite and within `max_abs_value`; a point that
//! fails is dropped, never replaced by zero, so a pole leaves a gap in the plot.
use log::debug;

use crate::Utils::config::SamplingConfig;
use crate::integrator::request::PointSeries;
use crate::symbolic::utils::linspace;

pub struct Sampler<'a> {
    settings: &'a SamplingConfig,
    max_samples: usize,
}

impl<'a> Sampler<'a> {
    pub fn new(settings: &'a SamplingConfig, max_samples: usize) -> Self {
        Sampler {
            settings,
            max_samples,
        }
    }

    /// The default window, or the bounds widened by a margin on each side.
    pub fn window(&self, bounds: Option<(f64, f64)>) -> (f64, f64) {
        match bounds {
            None => (self.settings.window_min, self.settings.window_max),
            Some((a, b)) => {
                let (lo, hi) = (a.min(b), a.max(b));
                let margin = ((hi - lo) * self.settings.margin_ratio).max(self.settings.min_margin);
                (lo - margin, hi + margin)
            }
        }
    }

    fn keeps(&self, y: f64) -> bool {
        y.is_finite() && y.abs() <= self.settings.max_abs_value
    }

    fn count(&self, requested: usize) -> usize {
        requested.min(self.max_samples)
    }

    /// `func` at `samples` evenly spaced points of the window.
    pub fn sample<F>(&self, func: F, window: (f64, f64)) -> PointSeries
    where
        F: Fn(f64) -> f64,
    {
        self.sample_where(func, |_| true, window)
    }

    /// Like `sample`, restricted to the points where `domain` is finite. An antiderivative
    /// is plotted only where its integrand is defined.
    pub fn sample_on_domain<F, D>(&self, func: F, domain: D, window: (f64, f64)) -> PointSeries
    where
        F: Fn(f64) -> f64,
        D: Fn(f64) -> f64,
    {
        self.sample_where(func, |x| domain(x).is_finite(), window)
    }

    fn sample_where<F, P>(&self, func: F, inside: P, window: (f64, f64)) -> PointSeries
    where
        F: Fn(f64) -> f64,
        P: Fn(f64) -> bool,
    {
        let mut series = PointSeries::default();
        let points = linspace(window.0, window.1, self.count(self.settings.samples));
        let total = points.len();
        for x in points {
            if !inside(x) {
                continue;
            }
            let y = func(x);
            if self.keeps(y) {
                series.push(x, y);
            }
        }
        if series.len() < total {
            debug!(
                "dropped {} of {} samples on [{}, {}]",
                total - series.len(),
                total,
                window.0,
                window.1
            );
        }
        series
    }

    /// The area under `func` between the bounds as a closed polygon: `(lo, 0)`, the curve,
    /// `(hi, 0)`.
    pub fn area<F>(&self, func: F, bounds: (f64, f64)) -> PointSeries
    where
        F: Fn(f64) -> f64,
    {
        let (lo, hi) = (bounds.0.min(bounds.1), bounds.0.max(bounds.1));
        let mut series = PointSeries::default();
        series.push(lo, 0.0);
        for x in linspace(lo, hi, self.count(self.settings.area_samples)) {
            let y = func(x);
            if self.keeps(y) {
                series.push(x, y);
            }
        }
        series.push(hi, 0.0);
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_engine::Expr;
    use approx::assert_relative_eq;

    fn assert_well_formed(series: &PointSeries) {
        assert_eq!(series.x.len(), series.y.len());
        assert!(series.x.windows(2).all(|w| w[0] <= w[1]));
        assert!(series.y.iter().all(|y| y.is_finite()));
    }

    #[test]
    fn test_window() {
        let settings = SamplingConfig::default();
        let sampler = Sampler::new(&settings, 5000);
        assert_eq!(sampler.window(None), (-10.0, 10.0));
        assert_eq!(sampler.window(Some((0.0, 4.0))), (-2.0, 6.0));
        // narrow bounds get the minimum margin, reversed bounds are ordered
        assert_eq!(sampler.window(Some((1.0, 0.5))), (-0.5, 2.0));
    }

    #[test]
    fn test_sample_smooth_function() {
        let settings = SamplingConfig::default();
        let sampler = Sampler::new(&settings, 5000);
        let series = sampler.sample(|x| x * x, (-10.0, 10.0));
        assert_eq!(series.len(), 200);
        assert_eq!(series.x[0], -10.0);
        assert_eq!(series.x[199], 10.0);
        assert_relative_eq!(series.y[199], 100.0);
        assert_well_formed(&series);
    }

    #[test]
    fn test_sample_drops_bad_points() {
        let settings = SamplingConfig::default();
        let sampler = Sampler::new(&settings, 5000);
        let f = Expr::parse_expression("ln(x)", "x").unwrap().lambdify1D("x");
        let series = sampler.sample(f, (-10.0, 10.0));
        assert_eq!(series.len(), 100);
        assert!(series.x.iter().all(|x| *x > 0.0));
        assert_well_formed(&series);

        let f = Expr::parse_expression("exp(x)", "x").unwrap().lambdify1D("x");
        let series = sampler.sample(f, (0.0, 20.0));
        assert!(series.y.iter().all(|y| *y <= 1e6));
        assert!(series.len() < 200);
    }

    #[test]
    fn test_sample_on_domain() {
        let settings = SamplingConfig::default();
        let sampler = Sampler::new(&settings, 5000);
        let f = Expr::parse_expression("ln(x)", "x").unwrap().lambdify1D("x");
        let series = sampler.sample_on_domain(|x| x * x, &f, (-10.0, 10.0));
        assert_eq!(series.len(), 100);
        assert!(series.x.iter().all(|x| *x > 0.0));
        // 1/x is finite at every sample, none is dropped
        let series = sampler.sample_on_domain(|x| x, |x| 1.0 / x, (-10.0, 10.0));
        assert_eq!(series.len(), 200);
        assert_well_formed(&series);
    }

    #[test]
    fn test_sample_count_is_capped() {
        let settings = SamplingConfig {
            samples: 300,
            ..SamplingConfig::default()
        };
        let sampler = Sampler::new(&settings, 50);
        assert_eq!(sampler.sample(|x| x, (0.0, 1.0)).len(), 50);
    }

    #[test]
    fn test_area_is_closed() {
        let settings = SamplingConfig::default();
        let sampler = Sampler::new(&settings, 5000);
        let area = sampler.area(|x| x * x, (0.0, 2.0));
        assert_eq!(area.len(), 102);
        assert_eq!((area.x[0], area.y[0]), (0.0, 0.0));
        assert_eq!((area.x[101], area.y[101]), (2.0, 0.0));
        assert_relative_eq!(area.y[100], 4.0);
        assert_well_formed(&area);
    }

    #[test]
    fn test_empty_series() {
        let settings = SamplingConfig::default();
        let sampler = Sampler::new(&settings, 5000);
        let series = sampler.sample(|_| f64::NAN, (-1.0, 1.0));
        assert!(series.is_empty());
        assert_eq!(serde_json::to_string(&series).unwrap(), r#"{"x":[],"y":[]}"#);
    }
}
