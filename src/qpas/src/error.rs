use thiserror::Error;

#[derive(Debug, Error)]
pub enum QpasError {
    #[error(transparent)]
    Matrix(#[from] matrix::MatrixError),

    #[error(transparent)]
    Io(#[from] io::IoError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("the forced-grouping file's individual/component counts do not match the G matrix")]
    ForcedGroupingShapeMismatch,

    #[error("the Fin-force matrix shape does not match K components x J markers")]
    FinForceShapeMismatch,

    #[error("ksize is required when deriving Q and F from scratch (no qin/fin given)")]
    MissingKsize,
}
