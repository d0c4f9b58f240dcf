use thiserror::Error;

#[derive(Debug, Error)]
pub enum NemecoError {
    #[error(transparent)]
    Matrix(#[from] matrix::MatrixError),

    #[error(transparent)]
    Io(#[from] io::IoError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Tree(#[from] tree::TreeError),

    #[error(transparent)]
    Expr(#[from] expr::ExprError),

    #[error("the rooted F matrix's row count does not match the C matrix's dimensions")]
    FcSizeMismatch,

    #[error("the initial parameters are infeasible: {0}")]
    InfeasibleStart(&'static str),
}
