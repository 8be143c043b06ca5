use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use RustedIntegrals::integrator::engine::{EngineSettings, IntegrationEngine};
use RustedIntegrals::integrator::request::IntegrationRequest;
use RustedIntegrals::symbolic::symbolic_engine::Expr;

fn bench_antiderivatives(c: &mut Criterion) {
    let mut group = c.benchmark_group("antiderivative");
    for input in ["x**3 + 2*x - 1", "x**2*exp(x)", "1/(x**2 + 2*x + 5)", "x*sin(x) + cos(2*x)"] {
        let expr = Expr::parse_expression(input, "x").unwrap();
        group.bench_function(input, |b| b.iter(|| black_box(&expr).integrate("x")));
    }
    group.finish();
}

fn bench_full_request(c: &mut Criterion) {
    let engine = IntegrationEngine::new(EngineSettings::default());
    let request = IntegrationRequest::new("x*ln(x)", "x", Some("1"), Some("e"));
    c.bench_function("calculate x*ln(x) on [1, e]", |b| {
        b.iter(|| engine.run(black_box(&request)))
    });
}

criterion_group!(benches, bench_antiderivatives, bench_full_request);
criterion_main!(benches);
