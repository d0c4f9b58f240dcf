//! SELSCAN: interpolates between a global covariance matrix `C1` and a scaled
//! matrix `C2`, scoring every marker's Gaussian log-likelihood at each step and
//! reporting the best-fitting step as a likelihood-ratio test against the
//! global (step 0) fit.

use std::f64::consts::PI;

use config::ScanConfig;
use matrix::Matrix;
use model::GenotypeModel;

use crate::error::ScanError;

/// One marker's outcome: the interpolation step whose covariance best fits it,
/// the log-likelihood under the global (`step = 0`) covariance, the
/// log-likelihood at the best step, and the likelihood-ratio statistic
/// `2*(local - global)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelscanResult {
    pub step: usize,
    pub global_lle: f64,
    pub local_lle: f64,
    pub lrt: f64,
}

fn interpolate(c1: &Matrix, c2: &Matrix, t: f64) -> Matrix {
    let mut out = Matrix::new(c1.height(), c1.width());
    for (o, (&a, &b)) in out.data_mut().iter_mut().zip(c1.data().iter().zip(c2.data())) {
        *o = a + t * (b - a);
    }
    out
}

/// Runs SELSCAN over every marker of `f`, interpolating `config.steps` matrices
/// between `c1` and `c2` (`c2` defaults to `2*c1` when not supplied). Steps
/// whose interpolated covariance is not positive-definite are skipped for
/// every marker rather than aborting the scan; `step = 0` is assumed to
/// always be well-conditioned since it is the caller's fitted `C1`.
pub fn run(
    config: &ScanConfig,
    model: &GenotypeModel,
    f: &Matrix,
    c1: &Matrix,
    c2: Option<&Matrix>,
) -> Result<Vec<SelscanResult>, ScanError> {
    let rk = c1.height();
    let doubled;
    let c2: &Matrix = match c2 {
        Some(c2) => {
            if !c2.is_size(rk, rk) {
                return Err(ScanError::CScaleSizeMismatch { expected: rk, found_h: c2.height(), found_w: c2.width() });
            }
            c2
        }
        None => {
            let mut m = c1.clone();
            m.data_mut().iter_mut().for_each(|v| *v *= 2.0);
            doubled = m;
            &doubled
        }
    };

    let rf = nemeco::rooted_f(f);
    let mu = model.create_mu(config.f_epsilon);
    let j_count = f.width();

    let mut best_score = vec![f64::NEG_INFINITY; j_count];
    let mut best_step = vec![0usize; j_count];
    let mut global_lle = vec![0.0_f64; j_count];

    let steps = config.steps;
    for s in 0..steps {
        let t = if steps > 1 { s as f64 / (steps - 1) as f64 } else { 0.0 };
        let mut c = interpolate(c1, c2, t);

        let log_det = match c.invert()? {
            Some(ld) => ld,
            None => {
                log::debug!("selscan: step {s} rejected (covariance not positive-definite)");
                continue;
            }
        };

        let mut mul = Matrix::new(rk, j_count);
        Matrix::gemm(&c, &rf, &mut mul, 1.0, 0.0)?;

        for j in 0..j_count {
            let mux = mu[j] * (1.0 - mu[j]);
            if mux <= 0.0 {
                continue;
            }
            let mut zip = 0.0;
            for r in 0..rk {
                zip += rf.get(r, j) * mul.get(r, j);
            }
            let score = -0.5 * (log_det + (rk as f64) * (2.0 * PI * mux).ln() + zip / mux);

            if s == 0 {
                global_lle[j] = score;
            }
            if score > best_score[j] {
                best_score[j] = score;
                best_step[j] = s;
            }
        }
    }

    Ok((0..j_count)
        .map(|j| {
            let local = best_score[j];
            let global = global_lle[j];
            SelscanResult { step: best_step[j], global_lle: global, local_lle: local, lrt: 2.0 * (local - global) }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::DiscreteGenotypeMatrix;

    fn tiny_model() -> GenotypeModel {
        GenotypeModel::Discrete(DiscreteGenotypeMatrix::from_codes(3, 2, vec![0, 1, 1, 2, 2, 0]))
    }

    #[test]
    fn two_steps_interpolate_exactly_to_the_endpoints() {
        let c1 = Matrix::from_vec(1, 1, vec![1.0]);
        let c2 = Matrix::from_vec(1, 1, vec![4.0]);
        assert_eq!(interpolate(&c1, &c2, 0.0), c1);
        assert_eq!(interpolate(&c1, &c2, 1.0), c2);
    }

    #[test]
    fn run_produces_one_result_per_marker_with_a_nonnegative_lrt() {
        let model = tiny_model();
        let f = Matrix::from_vec(2, 2, vec![0.2, 0.5, 0.4, 0.6]);
        let c1 = Matrix::from_vec(1, 1, vec![0.05]);
        let config = ScanConfig { steps: 5, ..Default::default() };

        let results = run(&config, &model, &f, &c1, None).unwrap();
        assert_eq!(results.len(), 2);
        for r in results {
            assert!(r.lrt >= -1e-9, "lrt should be non-negative up to rounding: {}", r.lrt);
        }
    }

    #[test]
    fn default_c2_is_twice_c1() {
        let model = tiny_model();
        let f = Matrix::from_vec(2, 2, vec![0.2, 0.5, 0.4, 0.6]);
        let c1 = Matrix::from_vec(1, 1, vec![0.05]);
        let explicit_c2 = Matrix::from_vec(1, 1, vec![0.1]);
        let config = ScanConfig { steps: 4, ..Default::default() };

        let with_default = run(&config, &model, &f, &c1, None).unwrap();
        let with_explicit = run(&config, &model, &f, &c1, Some(&explicit_c2)).unwrap();
        for (a, b) in with_default.iter().zip(with_explicit.iter()) {
            assert!((a.local_lle - b.local_lle).abs() < 1e-9);
        }
    }
}
