use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to open '{path}': {source}")]
    Open { path: String, #[source] source: std::io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: String, #[source] source: std::io::Error },

    #[error("failed to parse matrix size in '{path}'")]
    MatrixSize { path: String },

    #[error("failed to parse matrix value at cell [{row},{col}] in '{path}'")]
    MatrixCell { path: String, row: usize, col: usize },

    #[error("genotype code '{0}' is out of range 0-3")]
    InvalidGenotypeCode(String),

    #[error("missing file extension for G matrix '{0}'")]
    MissingExtension(String),

    #[error("unsupported file extension for G matrix '{0}'")]
    UnsupportedExtension(String),

    #[error("likelihood genotype matrix '{0}': {1}")]
    LikelihoodShape(String, String),

    #[error(transparent)]
    Tree(#[from] tree::TreeError),

    #[error(transparent)]
    Expr(#[from] expr::ExprError),

    #[error(transparent)]
    Model(#[from] model::ModelError),

    #[error("invalid forced-grouping file '{path}': {reason}")]
    ForcedGrouping { path: String, reason: String },
}
