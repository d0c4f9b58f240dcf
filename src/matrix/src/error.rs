use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("matrix size mismatch: expected {expected_h}x{expected_w}, found {found_h}x{found_w}")]
    SizeMismatch {
        expected_h: usize,
        expected_w: usize,
        found_h: usize,
        found_w: usize,
    },

    #[error("matrix is not square ({height}x{width})")]
    NotSquare { height: usize, width: usize },

    #[error("linear solve failed: singular system (LAPACK info = {info})")]
    SingularSystem { info: i32 },
}
