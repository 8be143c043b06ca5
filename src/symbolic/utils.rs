// numeric helpers shared by the simplifier, the integrator and the sampler

/// `num_values` evenly spaced points on [start, end], both ends included exactly.
pub fn linspace(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    match num_values {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let mut values = Vec::with_capacity(num_values);
            let step = (end - start) / (num_values as f64 - 1.0);
            for i in 0..num_values - 1 {
                values.push(start + (i as f64 * step));
            }
            values.push(end);
            values
        }
    }
}

pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

const MAX_DENOMINATOR: i64 = 1000;

/// Recognizes a float as a fraction p/q with a small denominator, q > 0 and gcd(p, q) = 1.
/// Integers come back as (p, 1).
pub fn as_rational(value: f64) -> Option<(i64, i64)> {
    if !value.is_finite() || value.abs() > 1e12 {
        return None;
    }
    if value == 0.0 {
        return Some((0, 1));
    }
    for q in 1..=MAX_DENOMINATOR {
        let scaled = value * q as f64;
        let p = scaled.round();
        // relative test, a tiny value is not rounded to 0/1
        if p != 0.0 && (scaled - p).abs() <= 1e-9 * p.abs() {
            let p = p as i64;
            let g = gcd(p, q).max(1);
            return Some((p / g, q / g));
        }
    }
    None
}

pub fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15
}
