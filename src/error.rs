use thiserror::Error;

/// Error types for the errest-rs library.
///
/// The first four variants form the taxonomy surfaced by the error-estimation
/// entry points. Their `Display` output is the bare message so it can be
/// compared verbatim.
#[derive(Error, Debug)]
pub enum EstError {
    /// An argument could not be classified as a dataset id or a parameter.
    #[error("{0}")]
    ArgumentType(String),

    /// A dataset identifier is unknown, duplicated, or no datasets exist.
    #[error("{0}")]
    Identifier(String),

    /// A requested parameter is frozen or not part of the selected fit.
    #[error("{0}")]
    Parameter(String),

    /// Session state error, e.g. asking for results that were never computed.
    #[error("{0}")]
    Session(String),

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(String),

    /// Error during model or statistic evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<crate::parameters::BoundsError> for EstError {
    fn from(err: crate::parameters::BoundsError) -> Self {
        EstError::Bounds(err.to_string())
    }
}

/// Result type alias for errest-rs operations.
pub type Result<T> = std::result::Result<T, EstError>;
