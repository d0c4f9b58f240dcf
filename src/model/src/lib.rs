//! Genotype likelihood models.
//!
//! Two variants, `Discrete` and `Likelihood`, share five operations (`compute_lle`,
//! gradient/Hessian for `Q`, gradient/Hessian for `F`, `create_mu`) but differ in
//! data layout, so a tagged union dispatches at the boundary of each per-marker or
//! per-individual loop rather than paying for dynamic dispatch throughout.

mod discrete;
mod error;
mod likelihood;

pub use discrete::DiscreteGenotypeMatrix;
pub use error::ModelError;
pub use likelihood::LikelihoodGenotypeMatrix;
use matrix::Matrix;

#[derive(Debug, Clone)]
pub enum GenotypeModel {
    Discrete(DiscreteGenotypeMatrix),
    Likelihood(LikelihoodGenotypeMatrix),
}

impl GenotypeModel {
    pub fn height(&self) -> usize {
        match self {
            Self::Discrete(g) => g.height(),
            Self::Likelihood(g) => g.height(),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Self::Discrete(g) => g.width(),
            Self::Likelihood(g) => g.width(),
        }
    }

    pub fn compute_lle(&self, q: &Matrix, fa: &Matrix, fb: &Matrix, qfa: &Matrix, qfb: &Matrix) -> f64 {
        match self {
            Self::Discrete(g) => g.compute_lle(q, fa, fb),
            Self::Likelihood(g) => g.compute_lle(qfa, qfb),
        }
    }

    pub fn compute_derivatives_q(
        &self,
        q: &Matrix,
        fa: &Matrix,
        fb: &Matrix,
        qfa: &Matrix,
        qfb: &Matrix,
        i: usize,
        d_vec: &mut [f64],
        h_mat: &mut Matrix,
    ) {
        match self {
            Self::Discrete(g) => g.compute_derivatives_q(fa, fb, qfa, qfb, i, d_vec, h_mat),
            Self::Likelihood(g) => g.compute_derivatives_q(fa, fb, qfa, qfb, i, d_vec, h_mat),
        }
        let _ = q;
    }

    pub fn compute_derivatives_f(
        &self,
        q: &Matrix,
        fa: &Matrix,
        fb: &Matrix,
        qfa: &Matrix,
        qfb: &Matrix,
        j: usize,
        d_vec: &mut [f64],
        h_mat: &mut Matrix,
    ) {
        match self {
            Self::Discrete(g) => g.compute_derivatives_f(q, qfa, qfb, j, d_vec, h_mat),
            Self::Likelihood(g) => g.compute_derivatives_f(q, qfa, qfb, j, d_vec, h_mat),
        }
        let _ = fa;
        let _ = fb;
    }

    pub fn create_mu(&self, f_epsilon: f64) -> Vec<f64> {
        match self {
            Self::Discrete(g) => g.create_mu(f_epsilon),
            Self::Likelihood(g) => g.create_mu(f_epsilon),
        }
    }

    /// Log-likelihood of a single `(i,j)` cell given pre-mixed `qfa`/`qfb`
    /// scalars, used by per-marker scans that mix a shifted frequency vector
    /// with ancestry outside of the stored `F`.
    pub fn cell_lle(&self, i: usize, j: usize, qfa_ij: f64, qfb_ij: f64) -> f64 {
        match self {
            Self::Discrete(g) => g.cell_lle(i, j, qfa_ij, qfb_ij),
            Self::Likelihood(g) => g.cell_lle(i, j, qfa_ij, qfb_ij),
        }
    }

    /// Whether the discrete form marks `(i,j)` as a missing genotype. Always
    /// `false` for the likelihood form (per-cell likelihoods, not posteriors,
    /// have no missing-data encoding).
    pub fn is_missing(&self, i: usize, j: usize) -> bool {
        match self {
            Self::Discrete(g) => g.is_missing(i, j),
            Self::Likelihood(_) => false,
        }
    }
}
