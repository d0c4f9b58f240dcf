use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("genotype matrix shape mismatch: G is {g_h}x{g_w}, Q is {q_h}x{q_w}")]
    ShapeMismatch { g_h: usize, g_w: usize, q_h: usize, q_w: usize },

    #[error("likelihood genotype matrix sub-matrices must share one shape")]
    LikelihoodSubmatrixMismatch,
}
