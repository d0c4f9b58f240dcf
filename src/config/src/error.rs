use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("at most one of 'ain', 'cin', 'tin' may be specified")]
    MultipleCovarianceInputs,

    #[error("'fin-force' cannot be combined with 'fin'")]
    FinForceExcludesFin,

    #[error("'fixed-q' cannot be combined with 'force'")]
    FixedQExcludesForce,

    #[error("'fixed-f' requires 'fin'")]
    FixedFRequiresFin,

    #[error("'fixed-q' requires 'qin'")]
    FixedQRequiresQin,

    #[error("'ksize' must be at least 2, found {0}")]
    KsizeTooSmall(usize),

    #[error("'epsilon' must be non-negative, found {0}")]
    NegativeEpsilon(f64),

    #[error("'max-iterations' must be positive, found {0}")]
    ZeroMaxIterations(usize),

    #[error("'max-time' must be non-negative, found {0}")]
    NegativeMaxTime(f64),

    #[error("'f-epsilon' must be in (0, 0.1), found {0}")]
    FEpsilonOutOfRange(f64),

    #[error("'steps' must be at least 2, found {0}")]
    StepsTooSmall(usize),

    #[error("missing required option: {0}")]
    MissingOption(&'static str),
}
