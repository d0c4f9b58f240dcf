//! The QPAS ancestry optimizer: an outer EM-like loop that alternately
//! improves `Q` and `F` by solving one inequality-constrained QP per row/column
//! via the active-set method (or, as a legacy alternative, Lemke's LCP solver).

mod activeset;
mod error;
mod lemke_qp;

pub use error::QpasError;

use std::time::Instant;

use config::{AncestryConfig, Solver};
use io::ForcedGrouping;
use matrix::Matrix;
use model::GenotypeModel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const F_MIN: f64 = 1.0e-6;
const F_MAX: f64 = 1.0 - F_MIN;

/// Resolves the `[f_min, f_max]` clamp bounds for a run: the fixed `1e-6`
/// defaults, or, when `AncestryConfig::frequency_bounds` is set, the
/// individual-count-derived `[1/(2I+1), 1-1/(2I+1)]` from SPEC_FULL.md §6.
fn frequency_bounds(individuals: usize, frequency_bounds: bool) -> (f64, f64) {
    if frequency_bounds {
        let f_min = 1.0 / (2.0 * individuals as f64 + 1.0);
        (f_min, 1.0 - f_min)
    } else {
        (F_MIN, F_MAX)
    }
}

/// Samples an initial `Q` (I x K): each row drawn uniformly on `[0,1)` then
/// renormalized to sum to one.
pub fn randomize_q(individuals: usize, ksize: usize, rng: &mut impl Rng) -> Matrix {
    let mut q = Matrix::new(individuals, ksize);
    for i in 0..individuals {
        for k in 0..ksize {
            q.set(i, k, rng.gen_range(0.0..1.0));
        }
        q.renormalize_row(i);
    }
    q
}

/// Samples an initial `F` (K x J): each cell drawn from `Normal(mu[j], 0.1)`,
/// clamped into `[f_min, f_max]`.
pub fn randomize_f(ksize: usize, mu: &[f64], rng: &mut impl Rng) -> Matrix {
    let width = mu.len();
    let mut f = Matrix::new(ksize, width);
    for (j, &mu_j) in mu.iter().enumerate() {
        let dist = Normal::new(mu_j, 0.1).expect("sigma=0.1 is always a valid normal scale");
        for k in 0..ksize {
            let sample = dist.sample(rng).clamp(F_MIN, F_MAX);
            f.set(k, j, sample);
        }
    }
    f
}

/// Builds the box (+ optional equality) constraint tables for one row/column
/// update, following the original's `_create_coefficients_mat`/`_create_b_vec`
/// layout: rows `0..K` are the lower bound `-delta_k <= current_k - lower_k`,
/// rows `K..2K` are the upper bound `delta_k <= upper_k - current_k`, and an
/// optional trailing row of all-ones enforces `sum(delta) = 0`.
fn build_constraints(
    current: &[f64],
    lower: impl Fn(usize) -> f64,
    upper: impl Fn(usize) -> f64,
    with_equality: bool,
) -> (Matrix, Vec<f64>) {
    let k = current.len();
    let rows = 2 * k + usize::from(with_equality);
    let mut coefficients = Matrix::new(rows, k);
    let mut b = vec![0.0; rows];

    for kk in 0..k {
        coefficients.set(kk, kk, -1.0);
        b[kk] = current[kk] - lower(kk);

        coefficients.set(k + kk, kk, 1.0);
        b[k + kk] = upper(kk) - current[kk];
    }

    if with_equality {
        for kk in 0..k {
            coefficients.set(2 * k, kk, 1.0);
        }
        b[2 * k] = 0.0;
    }

    (coefficients, b)
}

/// Solves one row/column's inequality-constrained QP and returns the step
/// `delta`, or `None` if the inner solver could not make progress (the caller
/// leaves the row/column unchanged for this iteration, per the failure policy).
fn solve_delta(
    solver: Solver,
    hessian: &Matrix,
    derivative: &[f64],
    coefficients: &Matrix,
    b: &[f64],
    fixed_active_set: &[usize],
) -> Option<Vec<f64>> {
    match solver {
        Solver::Qpas => {
            let k = hessian.height();
            let mut active_set = vec![0];
            let mut delta = vec![0.0; k];
            delta[0] = -b[0];
            activeset::loop_over_active_set(b, coefficients, hessian, derivative, fixed_active_set, &mut active_set, &mut delta).ok()?;
            Some(delta)
        }
        Solver::Lemke => lemke_qp::solve_shifted(hessian, coefficients, derivative, b).map(|shifted| {
            shifted.iter().map(|z| z - 1.0).collect()
        }),
    }
}

/// Improves one row of `Q` (individual `i`), respecting the simplex equality
/// and any forced-grouping bounds, then clamps and renormalizes the result.
fn improve_q_row(
    model: &GenotypeModel,
    q: &Matrix,
    fa: &Matrix,
    fb: &Matrix,
    qfa: &Matrix,
    qfb: &Matrix,
    i: usize,
    solver: Solver,
    forced_grouping: Option<&ForcedGrouping>,
    bounds: (f64, f64),
) -> Vec<f64> {
    let k = q.width();
    let current: Vec<f64> = q.row(i).to_vec();

    let mut derivative = vec![0.0; k];
    let mut hessian = Matrix::new(k, k);
    model.compute_derivatives_q(q, fa, fb, qfa, qfb, i, &mut derivative, &mut hessian);

    let lower = |kk: usize| forced_grouping.map_or(bounds.0, |fg| fg.get_min(i, kk));
    let upper = |kk: usize| forced_grouping.map_or(bounds.1, |fg| fg.get_max(i, kk));
    let (coefficients, b) = build_constraints(&current, lower, upper, true);
    let fixed_active_set = [2 * k];

    match solve_delta(solver, &hessian, &derivative, &coefficients, &b, &fixed_active_set) {
        Some(delta) => {
            let mut row: Vec<f64> = current.iter().zip(&delta).map(|(c, d)| (c + d).clamp(bounds.0, bounds.1)).collect();
            let sum: f64 = row.iter().sum();
            if sum != 0.0 {
                row.iter_mut().for_each(|v| *v /= sum);
            }
            row
        }
        None => current,
    }
}

/// Improves one column of `F` (marker `j`); first `fin_force.height()` rows
/// are pinned to their current value when `fin_force` is supplied.
fn improve_f_col(
    model: &GenotypeModel,
    q: &Matrix,
    fa: &Matrix,
    fb: &Matrix,
    qfa: &Matrix,
    qfb: &Matrix,
    j: usize,
    solver: Solver,
    fin_force_rows: usize,
    bounds: (f64, f64),
) -> Vec<f64> {
    let k = fa.height();
    let current: Vec<f64> = (0..k).map(|kk| fa.get(kk, j)).collect();

    let mut derivative = vec![0.0; k];
    let mut hessian = Matrix::new(k, k);
    model.compute_derivatives_f(q, fa, fb, qfa, qfb, j, &mut derivative, &mut hessian);

    let lower = |kk: usize| if kk < fin_force_rows { current[kk] } else { bounds.0 };
    let upper = |kk: usize| if kk < fin_force_rows { current[kk] } else { bounds.1 };
    let (coefficients, b) = build_constraints(&current, lower, upper, false);
    let fixed_active_set: [usize; 0] = [];

    match solve_delta(solver, &hessian, &derivative, &coefficients, &b, &fixed_active_set) {
        Some(delta) => current.iter().zip(&delta).map(|(c, d)| (c + d).clamp(bounds.0, bounds.1)).collect(),
        None => current,
    }
}

/// Improves every row of `Q` in place.
pub fn improve_q(model: &GenotypeModel, q: &mut Matrix, fa: &Matrix, fb: &Matrix, qfa: &Matrix, qfb: &Matrix, solver: Solver, forced_grouping: Option<&ForcedGrouping>, bounds: (f64, f64)) {
    for i in 0..q.height() {
        let row = improve_q_row(model, q, fa, fb, qfa, qfb, i, solver, forced_grouping, bounds);
        q.row_mut(i).copy_from_slice(&row);
    }
}

/// Improves every column of `F` in place.
pub fn improve_f(model: &GenotypeModel, q: &Matrix, f: &mut Matrix, fb: &Matrix, qfa: &Matrix, qfb: &Matrix, solver: Solver, fin_force_rows: usize, bounds: (f64, f64)) {
    for j in 0..f.width() {
        let col = improve_f_col(model, q, f, fb, qfa, qfb, j, solver, fin_force_rows, bounds);
        for (k, v) in col.into_iter().enumerate() {
            f.set(k, j, v);
        }
    }
}

fn fb_of(fa: &Matrix) -> Matrix {
    let mut fb = Matrix::new(fa.height(), fa.width());
    for (dst, &src) in fb.data_mut().iter_mut().zip(fa.data()) {
        *dst = 1.0 - src;
    }
    fb
}

/// The result of running the ancestry optimizer to convergence.
pub struct AncestryResult {
    pub q: Matrix,
    pub f: Matrix,
    pub lle: f64,
    pub iterations: usize,
}

/// Runs the QPAS outer loop: alternately improves `Q` and `F` until the
/// iteration cap, the time cap, or `0 <= dLLE <= epsilon` is reached. `Q`
/// is always updated before `F` within an iteration.
pub fn run(
    config: &AncestryConfig,
    model: &GenotypeModel,
    mut q: Matrix,
    mut f: Matrix,
    forced_grouping: Option<&ForcedGrouping>,
    fin_force_rows: usize,
) -> Result<AncestryResult, QpasError> {
    let started = Instant::now();
    let bounds = frequency_bounds(q.height(), config.frequency_bounds);

    let mut fb = fb_of(&f);
    let mut qfa = Matrix::new(q.height(), f.width());
    let mut qfb = Matrix::new(q.height(), f.width());
    Matrix::gemm(&q, &f, &mut qfa, 1.0, 0.0)?;
    Matrix::gemm(&q, &fb, &mut qfb, 1.0, 0.0)?;

    let mut lle = model.compute_lle(&q, &f, &fb, &qfa, &qfb);
    log::info!("seed: {}", config.seed);
    log::info!("iter 0: lle={lle:.6}");

    let mut iterations = 0;
    loop {
        if iterations >= config.max_iterations {
            break;
        }
        if config.max_time > 0.0 && started.elapsed().as_secs_f64() >= config.max_time {
            break;
        }

        if !config.fixed_q {
            improve_q(model, &mut q, &f, &fb, &qfa, &qfb, config.solver, forced_grouping, bounds);
            Matrix::gemm(&q, &f, &mut qfa, 1.0, 0.0)?;
            Matrix::gemm(&q, &fb, &mut qfb, 1.0, 0.0)?;
        }

        if !config.fixed_f {
            improve_f(model, &q, &mut f, &fb, &qfa, &qfb, config.solver, fin_force_rows, bounds);
            fb = fb_of(&f);
            Matrix::gemm(&q, &f, &mut qfa, 1.0, 0.0)?;
            Matrix::gemm(&q, &fb, &mut qfb, 1.0, 0.0)?;
        }

        let lle_next = model.compute_lle(&q, &f, &fb, &qfa, &qfb);
        let dlle = lle_next - lle;
        iterations += 1;
        log::debug!("iter {iterations}: lle={lle_next:.6} dlle={dlle:.6}");
        lle = lle_next;

        if dlle >= 0.0 && dlle <= config.epsilon {
            break;
        }
    }

    Ok(AncestryResult { q, f, lle, iterations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::DiscreteGenotypeMatrix;

    #[test]
    fn tiny_discrete_ancestry_run_increases_lle_and_converges() {
        // Scenario 1: G = [[0,1,2,0];[1,1,2,2];[2,0,0,1]], K=2, seed 1864.
        let g = DiscreteGenotypeMatrix::from_codes(3, 4, vec![0, 1, 2, 0, 1, 1, 2, 2, 2, 0, 0, 1]);
        let model = GenotypeModel::Discrete(g);

        let mut rng = StdRng::seed_from_u64(1864);
        let q0 = randomize_q(3, 2, &mut rng);
        let mu = model.create_mu(1e-6);
        let f0 = randomize_f(2, &mu, &mut rng);

        let config = AncestryConfig { max_iterations: 50, epsilon: 1e-6, ..Default::default() };
        let result = run(&config, &model, q0, f0, None, 0).unwrap();

        assert!(result.iterations <= 50);
        for i in 0..result.q.height() {
            assert!((result.q.row_sum(i) - 1.0).abs() < 1e-6);
            for k in 0..result.q.width() {
                assert!(result.q.get(i, k) >= F_MIN - 1e-9 && result.q.get(i, k) <= F_MAX + 1e-9);
            }
        }
    }

    #[test]
    fn fixed_q_leaves_q_unchanged() {
        let g = DiscreteGenotypeMatrix::from_codes(2, 2, vec![0, 1, 1, 2]);
        let model = GenotypeModel::Discrete(g);
        let q0 = Matrix::from_vec(2, 2, vec![0.5, 0.5, 0.3, 0.7]);
        let f0 = Matrix::from_vec(2, 2, vec![0.2, 0.3, 0.6, 0.7]);

        let config = AncestryConfig { fixed_q: true, qin: Some("x".into()), max_iterations: 5, ..Default::default() };
        let result = run(&config, &model, q0.clone(), f0, None, 0).unwrap();
        assert_eq!(result.q, q0);
    }

    #[test]
    fn fin_force_rows_stay_pinned_to_their_initial_value() {
        let g = DiscreteGenotypeMatrix::from_codes(2, 2, vec![0, 1, 1, 2]);
        let model = GenotypeModel::Discrete(g);
        let q0 = Matrix::from_vec(2, 2, vec![0.5, 0.5, 0.3, 0.7]);
        // Row 0 of F is the "forced" row loaded from a fin-force file by the
        // caller; only row 1 is free to move.
        let f0 = Matrix::from_vec(2, 2, vec![0.4, 0.45, 0.6, 0.7]);

        let config = AncestryConfig { max_iterations: 10, ..Default::default() };
        let result = run(&config, &model, q0, f0.clone(), None, 1).unwrap();

        assert_eq!(result.f.get(0, 0), f0.get(0, 0));
        assert_eq!(result.f.get(0, 1), f0.get(0, 1));
    }

    #[test]
    fn frequency_bounds_defaults_to_the_fixed_epsilon() {
        assert_eq!(frequency_bounds(5, false), (F_MIN, F_MAX));
    }

    #[test]
    fn frequency_bounds_derives_from_individual_count_when_enabled() {
        let (lo, hi) = frequency_bounds(5, true);
        assert!((lo - 1.0 / 11.0).abs() < 1e-12);
        assert!((hi - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn frequency_bounds_flag_tightens_the_ancestry_run_output() {
        // K=2 so every row has only two cells; I=2 individuals makes the
        // derived bound 1/(2*2+1) = 0.2, far looser than F_MIN but strict
        // enough to confirm it is the value actually used to clamp Q.
        let g = DiscreteGenotypeMatrix::from_codes(2, 2, vec![0, 1, 1, 2]);
        let model = GenotypeModel::Discrete(g);
        let q0 = Matrix::from_vec(2, 2, vec![0.05, 0.95, 0.9, 0.1]);
        let f0 = Matrix::from_vec(2, 2, vec![0.2, 0.3, 0.6, 0.7]);

        let config = AncestryConfig { frequency_bounds: true, max_iterations: 1, ..Default::default() };
        let result = run(&config, &model, q0, f0, None, 0).unwrap();

        let (lo, hi) = frequency_bounds(2, true);
        for i in 0..result.q.height() {
            for k in 0..result.q.width() {
                let v = result.q.get(i, k);
                assert!(v >= lo - 1e-9 && v <= hi + 1e-9, "cell ({i},{k})={v} outside [{lo},{hi}]");
            }
        }
    }
}
