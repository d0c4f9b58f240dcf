use std::collections::HashSet;

use matrix::Matrix;

use crate::error::QpasError;

const EPSILON: f64 = 1.0e-6;

/// Solves the KKT system for a fixed active set: the Hessian block augmented
/// with one row/column per active constraint, solved via `gesv`. Returns the
/// step `delta` and the Lagrange multipliers for the active constraints.
fn kkt(
    b_vec: &[f64],
    coefficients_mat: &Matrix,
    hessian_mat: &Matrix,
    derivative_vec: &[f64],
    active_set: &[usize],
) -> Result<(Vec<f64>, Vec<f64>), QpasError> {
    let k = hessian_mat.height();
    let active_count = active_set.len();
    let n = k + active_count;

    let mut a = Matrix::new(n, n);
    for k1 in 0..k {
        for k2 in 0..k {
            a.set(k1, k2, hessian_mat.get(k1, k2));
        }
    }
    for (i, &idx) in active_set.iter().enumerate() {
        for kk in 0..k {
            let v = coefficients_mat.get(idx, kk);
            a.set(i + k, kk, v);
            a.set(kk, i + k, v);
        }
    }

    let mut rhs = Matrix::new(n, 1);
    for kk in 0..k {
        rhs.set(kk, 0, -derivative_vec[kk]);
    }
    for (i, &idx) in active_set.iter().enumerate() {
        rhs.set(k + i, 0, b_vec[idx]);
    }

    Matrix::gesv(&mut a, &mut rhs)?;

    let delta = (0..k).map(|kk| rhs.get(kk, 0)).collect();
    let lagrangian = (0..active_count).map(|i| rhs.get(k + i, 0)).collect();
    Ok((delta, lagrangian))
}

/// Finds the largest feasible step along `violated_delta_vec - old_delta_vec`
/// that brings exactly one violated constraint to its bound, returning the new
/// delta and which constraint became active. `None` if no constraint limits
/// the step (the caller should treat the active set as converged).
fn backtrack(
    b_vec: &[f64],
    coefficients_mat: &Matrix,
    old_delta_vec: &[f64],
    violated_delta_vec: &[f64],
    violated_indices: &[usize],
) -> Option<(Vec<f64>, usize)> {
    let k = old_delta_vec.len();
    let diff_vec: Vec<f64> =
        violated_delta_vec.iter().zip(old_delta_vec).map(|(a, b)| a - b).collect();

    let mut min_i: Option<usize> = None;
    let mut min_t = 0.0_f64;

    for (i, &violated_index) in violated_indices.iter().enumerate() {
        let b_scalar = b_vec[violated_index];
        let row = |kk: usize| coefficients_mat.get(violated_index, kk);

        let denominator: f64 = (0..k).map(|kk| row(kk) * diff_vec[kk]).sum();
        if denominator.abs() < EPSILON {
            continue;
        }
        let numerator = b_scalar - (0..k).map(|kk| row(kk) * old_delta_vec[kk]).sum::<f64>();
        let t = numerator / denominator;

        if min_i.is_none() || t < min_t {
            min_i = Some(i);
            min_t = t;
        }
    }

    let min_i = min_i?;
    let new_delta = (0..k).map(|kk| min_t * diff_vec[kk] + old_delta_vec[kk]).collect();
    Some((new_delta, violated_indices[min_i]))
}

/// The active-set QP algorithm: repeatedly solves the KKT system for the
/// current active set, adds any newly-violated inequality constraint (taking
/// the largest feasible step towards it), or drops the active constraint with
/// the largest positive Lagrange multiplier once the step is fully feasible.
/// Terminates when no constraint can be dropped; a bitmask-keyed visited set
/// guards against cycling back to an already-tried active set.
pub fn loop_over_active_set(
    b_vec: &[f64],
    coefficients_mat: &Matrix,
    hessian_mat: &Matrix,
    derivative_vec: &[f64],
    fixed_active_set: &[usize],
    active_set: &mut Vec<usize>,
    delta_vec: &mut [f64],
) -> Result<(), QpasError> {
    let k = hessian_mat.height();
    let inequality_constraint_count = b_vec.len() - fixed_active_set.len();
    let mut visited_sets: HashSet<u64> = HashSet::new();

    loop {
        let mut key = 0_u64;
        for &i in active_set.iter() {
            key |= 1_u64 << i;
        }
        if !visited_sets.insert(key) {
            return Ok(());
        }

        let mut merged_active_set = active_set.clone();
        merged_active_set.extend_from_slice(fixed_active_set);

        let (try_delta_vec, lagrangian_vec) =
            kkt(b_vec, coefficients_mat, hessian_mat, derivative_vec, &merged_active_set)?;

        let mut violated_indices = Vec::new();
        if active_set.len() < k - fixed_active_set.len() {
            for i in 0..inequality_constraint_count {
                if merged_active_set.contains(&i) {
                    continue;
                }
                let lhs: f64 = (0..k).map(|kk| coefficients_mat.get(i, kk) * try_delta_vec[kk]).sum();
                if lhs > b_vec[i] {
                    violated_indices.push(i);
                }
            }
        }

        if violated_indices.is_empty() {
            delta_vec.copy_from_slice(&try_delta_vec);

            let mut lagrangian_index: Option<usize> = None;
            for (i, &lms_i) in lagrangian_vec.iter().take(active_set.len()).enumerate() {
                if lms_i < 0.0 {
                    continue;
                }
                if lagrangian_index.map_or(true, |li| lms_i > lagrangian_vec[li]) {
                    lagrangian_index = Some(i);
                }
            }

            match lagrangian_index {
                None => return Ok(()),
                Some(li) => {
                    active_set.remove(li);
                }
            }
        } else {
            match backtrack(b_vec, coefficients_mat, delta_vec, &try_delta_vec, &violated_indices) {
                Some((new_delta, k_violated)) => {
                    delta_vec.copy_from_slice(&new_delta);
                    active_set.push(k_violated);
                }
                None => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_the_unconstrained_minimum_when_feasible() {
        // Minimize 0.5*delta'*H*delta + d'*delta with H=2I, d=(-1,-1), subject to
        // the box -1<=delta<=1. The unconstrained optimum delta=(0.5,0.5) sits
        // strictly inside the box, so both bounds should end up inactive.
        let hessian = Matrix::from_vec(2, 2, vec![2.0, 0.0, 0.0, 2.0]);
        let derivative = vec![-1.0, -1.0];
        let mut coefficients = Matrix::new(4, 2);
        coefficients.set(0, 0, -1.0);
        coefficients.set(1, 1, -1.0);
        coefficients.set(2, 0, 1.0);
        coefficients.set(3, 1, 1.0);
        let b_vec = vec![1.0, 1.0, 1.0, 1.0];

        let fixed_active_set: Vec<usize> = vec![];
        let mut active_set = vec![0];
        let mut delta = vec![-b_vec[0], 0.0];

        loop_over_active_set(
            &b_vec,
            &coefficients,
            &hessian,
            &derivative,
            &fixed_active_set,
            &mut active_set,
            &mut delta,
        )
        .unwrap();

        assert!((delta[0] - 0.5).abs() < 1e-6);
        assert!((delta[1] - 0.5).abs() < 1e-6);
        assert!(active_set.is_empty());
    }

    #[test]
    fn clamps_to_an_active_bound_when_the_optimum_is_infeasible() {
        // Same objective, but the unconstrained optimum (2.5, 2.5) falls
        // outside the box, so the upper bound on each component binds.
        let hessian = Matrix::from_vec(2, 2, vec![2.0, 0.0, 0.0, 2.0]);
        let derivative = vec![-5.0, -5.0];
        let mut coefficients = Matrix::new(4, 2);
        coefficients.set(0, 0, -1.0);
        coefficients.set(1, 1, -1.0);
        coefficients.set(2, 0, 1.0);
        coefficients.set(3, 1, 1.0);
        let b_vec = vec![1.0, 1.0, 1.0, 1.0];

        let fixed_active_set: Vec<usize> = vec![];
        let mut active_set = vec![0];
        let mut delta = vec![-b_vec[0], 0.0];

        loop_over_active_set(
            &b_vec,
            &coefficients,
            &hessian,
            &derivative,
            &fixed_active_set,
            &mut active_set,
            &mut delta,
        )
        .unwrap();

        assert!((delta[0] - 1.0).abs() < 1e-6);
        assert!((delta[1] - 1.0).abs() < 1e-6);
    }
}
