use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("unexpected end of Newick input")]
    UnexpectedEof,

    #[error("unexpected character '{0}' in Newick input")]
    UnexpectedChar(char),

    #[error("expected ';' to terminate the Newick tree")]
    MissingTerminator,

    #[error("branch length '{0}' is not a valid number")]
    InvalidLength(String),

    #[error("tree has fewer than two leaves; cannot reroot or map to a covariance matrix")]
    TooFewLeaves,

    #[error("covariance matrix must be square, found {height}x{width}")]
    NotSquare { height: usize, width: usize },
}
