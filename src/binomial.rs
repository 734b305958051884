//! Binomial upper tail probabilities for occurrence counts.
//!
//! `P[X >= n]` for `X ~ Binomial(N, p)` equals the regularized incomplete beta function
//! `I_p(n, N - n + 1)`, which stays finite for the millions of trials a genome scan produces
//! where summing the probability mass directly would underflow term by term.

use std::f64;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

const MAX_ITERATIONS: usize = 100_000;
const EPS: f64 = 1.0e-15;
const FPMIN: f64 = 1.0e-300;

/// Natural logarithm of the gamma function for `x > 0` (Lanczos approximation)
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // reflection formula
        let pi = f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let mut sum = LANCZOS_COEFFICIENTS[0];
    for (i, coefficient) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        sum += coefficient / (x + i as f64);
    }

    0.5 * (2.0 * f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Continued fraction of the incomplete beta function, evaluated with the modified Lentz
/// method
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = clamp_tiny(1.0 - qab * x / qap).recip();
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = clamp_tiny(1.0 + aa * d).recip();
        c = clamp_tiny(1.0 + aa / c);
        h *= d * c;

        // odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = clamp_tiny(1.0 + aa * d).recip();
        c = clamp_tiny(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

#[inline]
fn clamp_tiny(x: f64) -> f64 {
    if x.abs() < FPMIN {
        FPMIN
    } else {
        x
    }
}

/// Natural logarithm of the regularized incomplete beta function `I_x(a, b)` for
/// `a, b > 0`.  Stays finite far below the smallest positive `f64`.
pub fn ln_regularized_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if x >= 1.0 {
        return 0.0;
    }

    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (-x).ln_1p();

    // the continued fraction converges quickly only on one side of the mean
    if x < (a + 1.0) / (a + b + 2.0) {
        ln_front + beta_continued_fraction(x, a, b).ln() - a.ln()
    } else {
        (-(ln_front.exp() * beta_continued_fraction(1.0 - x, b, a) / b)).ln_1p()
    }
}

/// Regularized incomplete beta function `I_x(a, b)` for `a, b > 0`
pub fn regularized_beta(x: f64, a: f64, b: f64) -> f64 {
    ln_regularized_beta(x, a, b).exp()
}

/// Natural logarithm of the probability of observing at least `n` successes in `trials`
/// Bernoulli trials of success probability `p`.
///
/// Without trials or with a zero (or NaN) probability there is nothing to test and the
/// tail is certain, so callers never take the logarithm of zero.
pub fn ln_binomial_tail(n: u64, trials: u64, p: f64) -> f64 {
    if n == 0 || trials == 0 || !(p > 0.0) {
        return 0.0;
    }
    if n > trials {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return 0.0;
    }

    ln_regularized_beta(p, n as f64, (trials - n + 1) as f64).min(0.0)
}

/// Probability of observing at least `n` successes in `trials` Bernoulli trials of success
/// probability `p`, see `ln_binomial_tail`
pub fn binomial_tail(n: u64, trials: u64, p: f64) -> f64 {
    ln_binomial_tail(n, trials, p).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1.0e-9;

    fn ln_choose(n: u64, k: u64) -> f64 {
        ln_gamma(n as f64 + 1.0) - ln_gamma(k as f64 + 1.0) - ln_gamma((n - k) as f64 + 1.0)
    }

    fn summed_tail(n: u64, trials: u64, p: f64) -> f64 {
        (n..=trials)
            .map(|k| {
                (ln_choose(trials, k) + k as f64 * p.ln() + (trials - k) as f64 * (-p).ln_1p())
                    .exp()
            })
            .sum()
    }

    #[test]
    fn test_ln_gamma() {
        assert!(ln_gamma(1.0).abs() < EPS);
        assert!(ln_gamma(2.0).abs() < EPS);
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < EPS);
        assert!((ln_gamma(0.5) - f64::consts::PI.sqrt().ln()).abs() < EPS);
        assert!((ln_gamma(101.0) - 363.739_375_555_563_5).abs() < 1e-7);
    }

    #[test]
    fn test_regularized_beta() {
        assert_eq!(regularized_beta(0.0, 2.0, 3.0), 0.0);
        assert_eq!(regularized_beta(1.0, 2.0, 3.0), 1.0);
        // I_x(1, 1) = x and I_x(a, 1) = x^a
        assert!((regularized_beta(0.3, 1.0, 1.0) - 0.3).abs() < EPS);
        assert!((regularized_beta(0.7, 3.0, 1.0) - 0.343).abs() < EPS);
        // symmetry I_x(a, b) = 1 - I_{1-x}(b, a)
        let lhs = regularized_beta(0.2, 4.5, 7.0);
        let rhs = 1.0 - regularized_beta(0.8, 7.0, 4.5);
        assert!((lhs - rhs).abs() < EPS);
    }

    #[test]
    fn test_binomial_tail_edge_cases() {
        assert_eq!(binomial_tail(0, 10, 0.5), 1.0);
        assert_eq!(binomial_tail(0, 0, 0.5), 1.0);
        assert_eq!(binomial_tail(0, 10, 0.0), 1.0);
        assert_eq!(binomial_tail(11, 10, 0.5), 0.0);
        assert_eq!(binomial_tail(3, 10, 1.0), 1.0);
        // zero trials or zero probability resolve to a certain tail
        assert_eq!(binomial_tail(3, 0, 0.5), 1.0);
        assert_eq!(binomial_tail(3, 10, 0.0), 1.0);
        assert_eq!(binomial_tail(3, 10, f64::NAN), 1.0);
        assert_eq!(ln_binomial_tail(3, 10, 0.0), 0.0);
        assert_eq!(ln_binomial_tail(11, 10, 0.5), f64::NEG_INFINITY);
    }

    #[test]
    fn test_binomial_tail_small() {
        assert!((binomial_tail(10, 10, 0.5) - 0.5f64.powi(10)).abs() < EPS);
        assert!((binomial_tail(5, 10, 0.5) - 638.0 / 1024.0).abs() < EPS);
        assert!((binomial_tail(1, 20, 0.1) - (1.0 - 0.9f64.powi(20))).abs() < EPS);

        for n in 1..=50 {
            let expected = summed_tail(n, 50, 0.13);
            assert!(
                (binomial_tail(n, 50, 0.13) - expected).abs() < 1e-8,
                "n = {}",
                n
            );
        }
    }

    #[test]
    fn test_binomial_tail_large() {
        // mean of 1000 in a million trials, roughly half of the mass at or above the mean
        let tail = binomial_tail(1_000, 1_000_000, 0.001);
        assert!(tail > 0.49 && tail < 0.52);

        // far above the mean the tail is tiny but not zero
        let tail = binomial_tail(1_300, 1_000_000, 0.001);
        assert!(tail > 0.0 && tail < 1e-15);

        let tail = binomial_tail(900, 5_000_000, 0.0002);
        assert!(tail > 0.999);
    }

    #[test]
    fn test_ln_binomial_tail_below_f64_range() {
        // tails far below the smallest positive f64 keep distinct logarithms
        let ln_tail = ln_binomial_tail(5_000, 1_000_000, 1.0 / 4096.0);
        assert_eq!(binomial_tail(5_000, 1_000_000, 1.0 / 4096.0), 0.0);
        assert!(ln_tail.is_finite());
        assert!((ln_tail + 10_357.84).abs() < 0.1);

        let further = ln_binomial_tail(20_000, 1_000_000, 1.0 / 4096.0);
        assert!(further.is_finite() && further < ln_tail);
        assert!((further + 68_561.35).abs() < 0.1);

        // near the mean the log tail matches the plain tail
        let tail = binomial_tail(1_000, 1_000_000, 0.001);
        assert!((ln_binomial_tail(1_000, 1_000_000, 0.001) - tail.ln()).abs() < 1e-9);
    }
}
