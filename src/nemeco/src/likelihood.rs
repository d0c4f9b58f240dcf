use std::f64::consts::PI;

use matrix::Matrix;

/// A Gaussian log-likelihood cached against a rooted `F` matrix and a `mu`
/// vector; evaluated once per candidate inverse covariance matrix.
pub struct Likelihood {
    rf: Matrix,
    mux: Vec<f64>,
    rkltmux: Vec<f64>,
}

impl Likelihood {
    /// `rf` is the `(K-1) x J` rooted major-allele-frequency matrix; `mu` is
    /// the length-`J` mean-frequency vector.
    pub fn new(rf: Matrix, mu: &[f64]) -> Self {
        let rk = rf.height();
        let tau = 2.0 * PI;
        let mux: Vec<f64> = mu.iter().map(|&m| m * (1.0 - m)).collect();
        let rkltmux: Vec<f64> = mux.iter().map(|&m| rk as f64 * (tau * m).ln()).collect();
        Self { rf, mux, rkltmux }
    }

    /// Computes the log-likelihood given the inverted covariance matrix and
    /// the log of its determinant; columns with non-positive `mu[j](1-mu[j])`
    /// are skipped.
    pub fn evaluate(&self, c_inv: &Matrix, log_c_det: f64) -> f64 {
        let rk = self.rf.height();
        let j_count = self.rf.width();

        let mut mul = Matrix::new(rk, j_count);
        Matrix::gemm(c_inv, &self.rf, &mut mul, 1.0, 0.0).expect("c_inv and rf shapes are fixed at construction");

        let mut sum = 0.0;
        for j in 0..j_count {
            let mux = self.mux[j];
            if mux <= 0.0 {
                continue;
            }
            let mut zip = 0.0;
            for rk_i in 0..rk {
                zip += self.rf.get(rk_i, j) * mul.get(rk_i, j);
            }
            sum += self.rkltmux[j] + (zip / mux);
        }

        -0.5 * ((j_count as f64) * log_c_det + sum)
    }
}

/// Derives the rooted `(K-1) x J` frequency matrix from the full `K x J`
/// major-allele-frequency matrix, subtracting row 0 from every other row.
pub fn rooted_f(f: &Matrix) -> Matrix {
    let k = f.height();
    let j_count = f.width();
    let rk = k - 1;
    let mut rf = Matrix::new(rk, j_count);
    for r in 0..rk {
        for j in 0..j_count {
            rf.set(r, j, f.get(r + 1, j) - f.get(0, j));
        }
    }
    rf
}

/// Builds a starting covariance matrix from the rooted `F` matrix:
/// `C = (1/J) * RF * RF'`.
pub fn initial_c(rf: &Matrix) -> Matrix {
    let rk = rf.height();
    let j_count = rf.width();
    let mut c = Matrix::new(rk, rk);
    for j in 0..j_count {
        for a in 0..rk {
            for b in 0..rk {
                let v = c.get(a, b) + rf.get(a, j) * rf.get(b, j) / (j_count as f64);
                c.set(a, b, v);
            }
        }
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_f_subtracts_the_first_row() {
        let f = Matrix::from_vec(3, 2, vec![0.2, 0.3, 0.5, 0.4, 0.1, 0.9]);
        let rf = rooted_f(&f);
        assert_eq!(rf.height(), 2);
        assert!((rf.get(0, 0) - 0.3).abs() < 1e-12);
        assert!((rf.get(1, 1) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn likelihood_matches_closed_form_for_a_single_column() {
        // RK=1, J=1. RF=[2.0], mu=[0.5]. C=[[1.0]], c_inv=[[1.0]], log_det=0.
        let rf = Matrix::from_vec(1, 1, vec![2.0]);
        let mu = vec![0.5];
        let likelihood = Likelihood::new(rf, &mu);

        let c_inv = Matrix::from_vec(1, 1, vec![1.0]);
        let lle = likelihood.evaluate(&c_inv, 0.0);

        let mux = 0.25;
        let rkltmux = 1.0 * (2.0 * PI * mux).ln();
        let zip = 2.0 * 2.0;
        let expected = -0.5 * (1.0 * 0.0 + rkltmux + zip / mux);
        assert!((lle - expected).abs() < 1e-9);
    }
}
