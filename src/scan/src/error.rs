use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("selection scan: {0}")]
    Matrix(#[from] matrix::MatrixError),

    #[error("'c-scale' matrix must have the same shape as the global covariance matrix: expected {expected}x{expected}, found {found_h}x{found_w}")]
    CScaleSizeMismatch { expected: usize, found_h: usize, found_w: usize },

    #[error("years vector length {found} does not match the individual count {expected}")]
    YearsSizeMismatch { expected: usize, found: usize },
}
