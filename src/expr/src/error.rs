use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("invalid symbol '{0}'")]
    InvalidSymbol(char),

    #[error("mismatched parentheses")]
    MismatchedParentheses,

    #[error("invalid expression")]
    InvalidExpression,

    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("invalid name: '{0}'")]
    InvalidName(String),

    #[error("invalid size: {0}")]
    InvalidSize(String),

    #[error("duplicate variable name '{0}'")]
    DuplicateVariable(String),

    #[error("undeclared variable name '{0}' in expression")]
    UndeclaredVariable(String),
}
