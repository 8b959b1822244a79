use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("input is empty: {0}")]
    InputEmpty(String),

    #[error("input is malformed: {0}")]
    InputMalformed(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("calculation error: {0}")]
    CalculationError(String),

    #[error("timeout exceeded: {0}")]
    Timeout(String),

    #[error("run cancelled: {0}")]
    Cancelled(String),
}
