use matrix::Matrix;

use crate::error::ModelError;

/// A likelihood-encoded genotype matrix: three parallel `I x J` matrices holding
/// `P(minor/minor)`, `P(major/minor)`, `P(major/major)` per cell. The triple need
/// not sum to one.
#[derive(Debug, Clone)]
pub struct LikelihoodGenotypeMatrix {
    g_aa: Matrix,
    g_aa_alt: Matrix, // P(major/minor)
    g_aa_ref: Matrix, // P(major/major)
}

impl LikelihoodGenotypeMatrix {
    pub fn new(g_minor_minor: Matrix, g_major_minor: Matrix, g_major_major: Matrix) -> Result<Self, ModelError> {
        if !g_minor_minor.is_size(g_major_minor.height(), g_major_minor.width())
            || !g_minor_minor.is_size(g_major_major.height(), g_major_major.width())
        {
            return Err(ModelError::LikelihoodSubmatrixMismatch);
        }
        Ok(Self { g_aa: g_minor_minor, g_aa_alt: g_major_minor, g_aa_ref: g_major_major })
    }

    pub fn height(&self) -> usize { self.g_aa.height() }
    pub fn width(&self) -> usize { self.g_aa.width() }

    pub fn compute_lle(&self, qfa: &Matrix, qfb: &Matrix) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.height() {
            for j in 0..self.width() {
                let qfa_ij = qfa.get(i, j);
                let qfb_ij = qfb.get(i, j);
                sum += ((self.g_aa_ref.get(i, j) * qfa_ij * qfa_ij)
                    + (self.g_aa.get(i, j) * qfb_ij * qfb_ij)
                    + (self.g_aa_alt.get(i, j) * qfa_ij * qfb_ij * 2.0))
                    .ln();
            }
        }
        sum
    }

    pub fn compute_derivatives_f(
        &self,
        q: &Matrix,
        qfa: &Matrix,
        qfb: &Matrix,
        j: usize,
        d_vec: &mut [f64],
        h_mat: &mut Matrix,
    ) {
        let k = d_vec.len();
        d_vec.iter_mut().for_each(|v| *v = 0.0);
        h_mat.fill(0.0);

        for i in 0..self.height() {
            let g_aa = self.g_aa.get(i, j);
            let g_aa_alt = self.g_aa_alt.get(i, j);
            let g_aa_ref = self.g_aa_ref.get(i, j);
            let qfa_ij = qfa.get(i, j);
            let qfb_ij = qfb.get(i, j);

            let alpha = 1.0 / (g_aa_ref * qfa_ij * qfa_ij
                + g_aa * qfb_ij * qfb_ij
                + g_aa_alt * qfa_ij * qfb_ij * 2.0);
            let theta = 2.0 * (g_aa_ref * qfa_ij - g_aa * qfb_ij + g_aa_alt * qfb_ij - g_aa_alt * qfa_ij);

            for k1 in 0..k {
                let q_ik1 = q.get(i, k1);
                d_vec[k1] += theta * alpha * q_ik1;
                for k2 in 0..k {
                    let q_ik2 = q.get(i, k2);
                    let term = 2.0 * (g_aa_ref + g_aa - 2.0 * g_aa_alt);
                    *h_mat.entry(k1, k2) += alpha * q_ik1 * q_ik2 * (term - theta * theta * alpha);
                }
            }
        }
    }

    pub fn compute_derivatives_q(
        &self,
        fa: &Matrix,
        fb: &Matrix,
        qfa: &Matrix,
        qfb: &Matrix,
        i: usize,
        d_vec: &mut [f64],
        h_mat: &mut Matrix,
    ) {
        let k = d_vec.len();
        d_vec.iter_mut().for_each(|v| *v = 0.0);
        h_mat.fill(0.0);

        for j in 0..self.width() {
            let g_aa = self.g_aa.get(i, j);
            let g_aa_alt = self.g_aa_alt.get(i, j);
            let g_aa_ref = self.g_aa_ref.get(i, j);
            let qfa_ij = qfa.get(i, j);
            let qfb_ij = qfb.get(i, j);

            let alpha = 1.0 / (g_aa_ref * qfa_ij * qfa_ij
                + g_aa * qfb_ij * qfb_ij
                + g_aa_alt * qfa_ij * qfb_ij * 2.0);
            let theta = 2.0 * (g_aa_ref * qfa_ij + g_aa_alt * qfb_ij);
            let gamma = 2.0 * (g_aa * qfb_ij + g_aa_alt * qfa_ij);

            for k1 in 0..k {
                let fa_k1j = fa.get(k1, j);
                let fb_k1j = fb.get(k1, j);
                d_vec[k1] += alpha * (theta * fa_k1j + gamma * fb_k1j);
                for k2 in 0..k {
                    let fa_k2j = fa.get(k2, j);
                    let fb_k2j = fb.get(k2, j);

                    let term1 = 2.0 * (g_aa_ref * fa_k1j * fa_k2j + g_aa * fb_k1j * fb_k2j);
                    let term2 = 2.0 * g_aa_alt * (fa_k1j * fb_k2j + fb_k1j * fa_k2j);
                    let term3 = theta * theta * fa_k1j * fa_k2j + gamma * gamma * fb_k1j * fb_k2j;
                    let term4 = theta * gamma * (fa_k1j * fb_k2j + fb_k1j * fa_k2j);

                    *h_mat.entry(k1, k2) += alpha * (term1 + term2 - alpha * (term3 + term4));
                }
            }
        }
    }

    /// Log-likelihood contribution of a single cell, given the already-mixed
    /// `qfa = sum_k q[k]*fa[k]` and `qfb = sum_k q[k]*fb[k]` for that cell.
    pub fn cell_lle(&self, i: usize, j: usize, qfa_ij: f64, qfb_ij: f64) -> f64 {
        let g_aa = self.g_aa.get(i, j);
        let g_aa_alt = self.g_aa_alt.get(i, j);
        let g_aa_ref = self.g_aa_ref.get(i, j);
        (g_aa_ref * qfa_ij * qfa_ij + g_aa * qfb_ij * qfb_ij + g_aa_alt * qfa_ij * qfb_ij * 2.0).ln()
    }

    /// Fixed-point EM estimate of the per-marker major-allele frequency, to at
    /// most 100 iterations or a change of at most `1e-6`, clamped into `[f_min, f_max]`.
    pub fn create_mu(&self, f_epsilon: f64) -> Vec<f64> {
        const EM_ITERATIONS: usize = 100;
        const EM_EPSILON: f64 = 1.0e-6;

        let f_min = f_epsilon;
        let f_max = 1.0 - f_epsilon;
        let i_count = self.height();

        (0..self.width())
            .map(|j| {
                let mut mu_j = 0.5_f64;
                for _ in 0..EM_ITERATIONS {
                    let wu_j = 1.0 - mu_j;
                    let mut sum = 0.0;
                    for i in 0..i_count {
                        let aa_ref = self.g_aa_ref.get(i, j) * mu_j * mu_j;
                        let aa = self.g_aa.get(i, j) * wu_j * wu_j;
                        let aa_alt = self.g_aa_alt.get(i, j) * mu_j * wu_j * 2.0;
                        sum += (2.0 * aa_ref + aa_alt) / (2.0 * (aa_ref + aa_alt + aa));
                    }
                    let previous = mu_j;
                    mu_j = (sum / i_count as f64).clamp(f_min, f_max);
                    if (previous - mu_j).abs() <= EM_EPSILON {
                        break;
                    }
                }
                mu_j
            })
            .collect()
    }
}
