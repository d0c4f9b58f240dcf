use matrix::Matrix;

/// Reduces a box/equality-constrained QP (`min 0.5 delta'*H*delta + d'*delta`,
/// s.t. `A*delta <= b`) to the standard LCP form `w - M*z = q` used by Lemke's
/// pivoting algorithm, by shifting the QP so its feasible region contains the
/// origin (`z = delta + 1`). Returns the `z`-shifted solution's first `delta.len()`
/// entries on success.
pub fn solve_shifted(
    hessian_mat: &Matrix,
    coefficients_mat: &Matrix,
    derivative_vec: &[f64],
    b_vec: &[f64],
) -> Option<Vec<f64>> {
    let k = hessian_mat.height();
    let a_height = coefficients_mat.height();

    let shift_vec = vec![1.0_f64; k];
    let mut hessian_shift = vec![0.0_f64; k];
    Matrix::gemv(hessian_mat, &shift_vec, &mut hessian_shift, 1.0, 0.0).ok()?;

    let sqp_c: Vec<f64> = (0..k).map(|i| hessian_shift[i] - derivative_vec[i]).collect();

    // M = [[-H, A^T], [-A, 0]]
    let n = k + a_height;
    let mut m = Matrix::new(n, n);
    for i in 0..k {
        for j in 0..k {
            m.set(i, j, -hessian_mat.get(i, j));
        }
    }
    for i in 0..a_height {
        for j in 0..k {
            let v = coefficients_mat.get(i, j);
            m.set(k + i, j, -v);
            m.set(j, k + i, v);
        }
    }

    // q = [sqp_c, b]
    let mut q_vec = vec![0.0_f64; n];
    q_vec[..k].copy_from_slice(&sqp_c);
    q_vec[k..].copy_from_slice(b_vec);

    let output = lemke::Lemke::solve(&m, &q_vec)?;
    Some(output[..k].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_active_set_solution_on_a_simple_box() {
        // Minimize 0.5*delta'*2I*delta - delta, box -1<=delta<=1. Both solvers
        // should land on the unconstrained optimum delta=(0.5, 0.5).
        let hessian = Matrix::from_vec(2, 2, vec![2.0, 0.0, 0.0, 2.0]);
        let derivative = vec![-1.0, -1.0];
        let mut coefficients = Matrix::new(4, 2);
        coefficients.set(0, 0, -1.0);
        coefficients.set(1, 1, -1.0);
        coefficients.set(2, 0, 1.0);
        coefficients.set(3, 1, 1.0);
        let b_vec = vec![1.0, 1.0, 1.0, 1.0];

        let shifted = solve_shifted(&hessian, &coefficients, &derivative, &b_vec).unwrap();
        let delta: Vec<f64> = shifted.iter().map(|z| z - 1.0).collect();
        assert!((delta[0] - 0.5).abs() < 1e-6);
        assert!((delta[1] - 0.5).abs() < 1e-6);
    }
}
