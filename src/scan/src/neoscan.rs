//! NEOSCAN: per-marker golden-section search over an allele-frequency shift,
//! optionally time-weighted by per-individual sample ages.

use config::ScanConfig;
use matrix::Matrix;
use model::GenotypeModel;

use crate::error::ScanError;

const F_MIN: f64 = 1.0e-6;
const F_MAX: f64 = 1.0 - F_MIN;
const GOLDEN_TOLERANCE: f64 = 1.0e-6;

/// One marker's outcome: the shift `d*` found by the golden-section search,
/// the log-likelihood at zero shift, the log-likelihood at `d*`, and the
/// likelihood-ratio statistic `2*(local - global)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeoscanResult {
    pub d: f64,
    pub global_lle: f64,
    pub local_lle: f64,
    pub lrt: f64,
}

/// Per-individual inclusion weight (`1.0`/`0.0`) and shift coefficient `y_i`
/// derived from the years vector. With no years vector, every individual is
/// included with a coefficient of `1.0` (the shift applies uniformly).
fn individual_coefficients(years: Option<&[f64]>, i_count: usize) -> (Vec<f64>, Vec<f64>) {
    match years {
        None => (vec![1.0; i_count], vec![1.0; i_count]),
        Some(y) => {
            let included: Vec<usize> = (0..i_count).filter(|&i| y[i] >= 0.0).collect();
            let mut weights = vec![0.0; i_count];
            let mut coefficients = vec![0.0; i_count];
            if included.is_empty() {
                return (weights, coefficients);
            }

            let count = included.len() as f64;
            let y_mean: f64 = included.iter().map(|&i| y[i]).sum::<f64>() / count;
            let y_max = included.iter().map(|&i| y[i]).fold(f64::NEG_INFINITY, f64::max);
            let y_min = included.iter().map(|&i| y[i]).fold(f64::INFINITY, f64::min);

            for &i in &included {
                weights[i] = 1.0;
                let yi = y[i];
                let denom = (y_max - yi).max(yi - y_min);
                coefficients[i] = if denom > 0.0 { (y_mean - yi) / denom } else { 0.0 };
            }
            (weights, coefficients)
        }
    }
}

/// Minimizes `f` over `[a, b]` by golden-section search, terminating once the
/// bracket shrinks to `tolerance`. `f` is assumed unimodal on the interval.
fn golden_section_minimize(mut a: f64, mut b: f64, tolerance: f64, mut f: impl FnMut(f64) -> f64) -> f64 {
    let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
    let inv_phi2 = (3.0 - 5.0_f64.sqrt()) / 2.0;

    let mut h = b - a;
    if h.abs() <= tolerance {
        return (a + b) / 2.0;
    }

    let steps = ((tolerance / h).abs().ln() / inv_phi.ln()).ceil() as usize;
    let mut c = a + inv_phi2 * h;
    let mut d = a + inv_phi * h;
    let mut fc = f(c);
    let mut fd = f(d);

    for _ in 0..steps {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            h = inv_phi * h;
            c = a + inv_phi2 * h;
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            h = inv_phi * h;
            d = a + inv_phi * h;
            fd = f(d);
        }
    }

    if fc < fd {
        (a + d) / 2.0
    } else {
        (c + b) / 2.0
    }
}

/// Runs NEOSCAN over every marker of `f`. `years`, when supplied, must have
/// one entry per individual (row of `q`); a negative entry excludes that
/// individual from the scan entirely.
pub fn run(
    _config: &ScanConfig,
    model: &GenotypeModel,
    q: &Matrix,
    f: &Matrix,
    years: Option<&[f64]>,
) -> Result<Vec<NeoscanResult>, ScanError> {
    let i_count = q.height();
    let k = q.width();
    let j_count = f.width();

    if let Some(y) = years {
        if y.len() != i_count {
            return Err(ScanError::YearsSizeMismatch { expected: i_count, found: y.len() });
        }
    }

    let (weights, y_coef) = individual_coefficients(years, i_count);

    let mut results = Vec::with_capacity(j_count);
    for j in 0..j_count {
        let f_col: Vec<f64> = (0..k).map(|kk| f.get(kk, j)).collect();
        let col_max = f_col.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let col_min = f_col.iter().cloned().fold(f64::INFINITY, f64::min);
        let lower = -col_max;
        let upper = 1.0 - col_min;

        let ell = |d: f64| -> f64 {
            let mut sum = 0.0;
            for i in 0..i_count {
                if weights[i] == 0.0 {
                    continue;
                }
                let shift = d * y_coef[i];
                let mut qfa_ij = 0.0;
                let mut qfb_ij = 0.0;
                for kk in 0..k {
                    let shifted = (f_col[kk] + shift).clamp(F_MIN, F_MAX);
                    qfa_ij += q.get(i, kk) * shifted;
                    qfb_ij += q.get(i, kk) * (1.0 - shifted);
                }
                sum += weights[i] * model.cell_lle(i, j, qfa_ij, qfb_ij);
            }
            sum
        };

        let global_lle = ell(0.0);
        let d_star = golden_section_minimize(lower, upper, GOLDEN_TOLERANCE, |d| -ell(d));
        let local_lle = ell(d_star);

        results.push(NeoscanResult { d: d_star, global_lle, local_lle, lrt: 2.0 * (local_lle - global_lle) });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::DiscreteGenotypeMatrix;

    #[test]
    fn golden_section_finds_the_minimum_of_a_parabola() {
        let d = golden_section_minimize(-5.0, 5.0, 1e-6, |x| (x - 1.5).powi(2));
        assert!((d - 1.5).abs() < 1e-4);
    }

    #[test]
    fn negative_years_exclude_an_individual() {
        let (weights, _) = individual_coefficients(Some(&[10.0, -1.0, 20.0]), 3);
        assert_eq!(weights, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn no_years_includes_everyone_uniformly() {
        let (weights, coef) = individual_coefficients(None, 3);
        assert_eq!(weights, vec![1.0, 1.0, 1.0]);
        assert_eq!(coef, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn run_produces_one_result_per_marker() {
        let g = DiscreteGenotypeMatrix::from_codes(3, 4, vec![0, 1, 2, 0, 1, 1, 2, 2, 2, 0, 0, 1]);
        let model = GenotypeModel::Discrete(g);
        let q = Matrix::from_vec(3, 2, vec![0.6, 0.4, 0.3, 0.7, 0.9, 0.1]);
        let f = Matrix::from_vec(2, 4, vec![0.3, 0.5, 0.4, 0.2, 0.6, 0.4, 0.5, 0.7]);
        let config = ScanConfig::default();

        let results = run(&config, &model, &q, &f, None).unwrap();
        assert_eq!(results.len(), 4);
        for r in &results {
            assert!(r.lrt >= -1e-6, "local optimum must be at least as good as d=0: {}", r.lrt);
        }
    }

    #[test]
    fn mismatched_years_length_is_rejected() {
        let g = DiscreteGenotypeMatrix::from_codes(2, 1, vec![0, 1]);
        let model = GenotypeModel::Discrete(g);
        let q = Matrix::from_vec(2, 2, vec![0.5, 0.5, 0.5, 0.5]);
        let f = Matrix::from_vec(2, 1, vec![0.3, 0.6]);
        let config = ScanConfig::default();
        let years = vec![1.0];
        assert!(run(&config, &model, &q, &f, Some(&years)).is_err());
    }
}
