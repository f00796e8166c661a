//! Numerical routines backing the batch tests
//!
//! Two-sample KS null distributions (exact lattice-path and asymptotic),
//! chi-square survival via the regularized incomplete gamma function,
//! elementwise relative entropy and histogram helpers.

use crate::drift::types::Alternative;
use std::cmp::Ordering;
use std::f64::consts::PI;

const GAMMA_EPS: f64 = 1e-14;
const GAMMA_MAX_ITER: usize = 500;

/// Sort a copy of `data` ascending; NaNs compare equal and must be rejected upstream
pub fn sorted(data: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = data.into_iter().collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// One-sided ECDF differences between two sorted samples.
///
/// Returns `(d_plus, d_minus)` where `d_plus = max(F_a - F_b)` and
/// `d_minus = max(F_b - F_a)`, both evaluated at every observed value.
pub fn ecdf_differences(a_sorted: &[f64], b_sorted: &[f64]) -> (f64, f64) {
    let na = a_sorted.len() as f64;
    let nb = b_sorted.len() as f64;
    let mut d_plus: f64 = 0.0;
    let mut d_minus: f64 = 0.0;

    for &x in a_sorted.iter().chain(b_sorted.iter()) {
        let fa = a_sorted.partition_point(|&v| v <= x) as f64 / na;
        let fb = b_sorted.partition_point(|&v| v <= x) as f64 / nb;
        d_plus = d_plus.max(fa - fb);
        d_minus = d_minus.max(fb - fa);
    }

    (d_plus, d_minus)
}

/// Exact survival function of the two-sample KS statistic.
///
/// Walks the `m x n` lattice of merge orders, carrying the probability of
/// reaching each node without crossing the boundary implied by `d`. Every
/// merge order is equally likely under the null, so each step is taken with
/// probability proportional to the remaining items on that side.
pub fn ks_exact_sf(m: usize, n: usize, d: f64, alternative: Alternative) -> f64 {
    if m == 0 || n == 0 {
        return 1.0;
    }
    // d * m * n is integral for every attainable statistic
    let h = (d * m as f64 * n as f64).round() as i64;
    if h <= 0 {
        return 1.0;
    }

    let (mi, ni) = (m as i64, n as i64);
    let crosses = |i: usize, j: usize| -> bool {
        let diff = i as i64 * ni - j as i64 * mi;
        match alternative {
            Alternative::TwoSided => diff.abs() >= h,
            Alternative::Greater => diff >= h,
            Alternative::Less => -diff >= h,
        }
    };

    let total = (m + n) as f64;
    let mut prev = vec![0.0f64; n + 1];
    let mut row = vec![0.0f64; n + 1];

    for i in 0..=m {
        for j in 0..=n {
            if i == 0 && j == 0 {
                row[0] = 1.0;
                continue;
            }
            if crosses(i, j) {
                row[j] = 0.0;
                continue;
            }
            let mut p = 0.0;
            if i > 0 {
                // step (i-1, j) -> (i, j): one more reference item
                let remaining = total - (i - 1 + j) as f64;
                p += prev[j] * (m - (i - 1)) as f64 / remaining;
            }
            if j > 0 {
                // step (i, j-1) -> (i, j): one more incoming item
                let remaining = total - (i + j - 1) as f64;
                p += row[j - 1] * (n - (j - 1)) as f64 / remaining;
            }
            row[j] = p;
        }
        std::mem::swap(&mut prev, &mut row);
    }

    (1.0 - prev[n]).clamp(0.0, 1.0)
}

/// Asymptotic survival function of the two-sample KS statistic
pub fn ks_asymptotic_sf(m: usize, n: usize, d: f64, alternative: Alternative) -> f64 {
    if m == 0 || n == 0 || d <= 0.0 {
        return 1.0;
    }
    let (big, small) = if m >= n { (m as f64, n as f64) } else { (n as f64, m as f64) };
    let en = big * small / (big + small);
    let z = en.sqrt() * d;

    match alternative {
        Alternative::TwoSided => kolmogorov_sf(z),
        Alternative::Less | Alternative::Greater => {
            let expt = -2.0 * z * z
                - 2.0 * z * (big + 2.0 * small) / (big * small * (big + small)).sqrt() / 3.0;
            expt.exp().clamp(0.0, 1.0)
        }
    }
}

/// Survival function of the Kolmogorov limiting distribution
pub fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    if lambda < 1.18 {
        // Jacobi theta form converges fast for small lambda
        let factor = (2.0 * PI).sqrt() / lambda;
        let w = -PI * PI / (8.0 * lambda * lambda);
        let mut cdf = 0.0;
        for k in 1..=50 {
            let odd = (2 * k - 1) as f64;
            let term = (odd * odd * w).exp();
            cdf += term;
            if term < 1e-16 {
                break;
            }
        }
        return (1.0 - factor * cdf).clamp(0.0, 1.0);
    }

    let mut p = 0.0;
    for k in 1..=100 {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let kf = k as f64;
        let term = sign * (-2.0 * kf * kf * lambda * lambda).exp();
        p += term;
        if term.abs() < 1e-16 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Natural log of the gamma function (Lanczos approximation, g = 7)
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // reflection
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut a = COEFFS[0];
    let t = x + 7.5;
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Regularized upper incomplete gamma function Q(a, x)
pub fn regularized_gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if a <= 0.0 {
        return 0.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut del = sum;
    for _ in 0..GAMMA_MAX_ITER {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * GAMMA_EPS {
            break;
        }
    }
    (sum * (-x + a * x.ln() - ln_gamma(a)).exp()).clamp(0.0, 1.0)
}

fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    let tiny = f64::MIN_POSITIVE / GAMMA_EPS;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / tiny;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=GAMMA_MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < tiny {
            d = tiny;
        }
        c = b + an / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < GAMMA_EPS {
            break;
        }
    }
    ((-x + a * x.ln() - ln_gamma(a)).exp() * h).clamp(0.0, 1.0)
}

/// Upper tail probability of the chi-square distribution
pub fn chi_square_sf(statistic: f64, df: usize) -> f64 {
    if df == 0 {
        return 1.0;
    }
    regularized_gamma_q(df as f64 / 2.0, statistic / 2.0)
}

/// Elementwise relative entropy `x * ln(x / y)`
pub fn rel_entr(x: f64, y: f64) -> f64 {
    if x > 0.0 && y > 0.0 {
        x * (x / y).ln()
    } else if x == 0.0 && y >= 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}

/// Probability mass per equal-width bin over `[min_val, max_val]`
pub fn histogram(data: &[f64], min_val: f64, max_val: f64, n_bins: usize) -> Vec<f64> {
    let n_bins = n_bins.max(1);
    let mut counts = vec![0usize; n_bins];
    let range = max_val - min_val;

    for &value in data {
        let bin = if range <= 0.0 {
            0
        } else {
            (((value - min_val) / range) * n_bins as f64).floor() as usize
        };
        counts[bin.min(n_bins - 1)] += 1;
    }

    let n = data.len().max(1) as f64;
    counts.iter().map(|&c| c as f64 / n).collect()
}

/// Interior quantile cut points of `sorted_data`, bracketed by infinities
pub fn quantile_edges(sorted_data: &[f64], n_bins: usize) -> Vec<f64> {
    let mut edges = Vec::with_capacity(n_bins + 1);
    edges.push(f64::NEG_INFINITY);
    if !sorted_data.is_empty() {
        for i in 1..n_bins {
            let idx = (i * sorted_data.len()) / n_bins;
            edges.push(sorted_data[idx.min(sorted_data.len() - 1)]);
        }
    }
    edges.push(f64::INFINITY);
    edges
}

/// Fraction of `data` falling in each `(edges[i], edges[i + 1]]` bin
pub fn bin_proportions(data: &[f64], edges: &[f64]) -> Vec<f64> {
    let n_bins = edges.len().saturating_sub(1);
    let mut counts = vec![0usize; n_bins];
    for &value in data {
        if let Some(i) = (0..n_bins).find(|&i| value > edges[i] && value <= edges[i + 1]) {
            counts[i] += 1;
        }
    }
    let n = data.len().max(1) as f64;
    counts.iter().map(|&c| c as f64 / n).collect()
}
