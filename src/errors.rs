//! Error taxonomy of the integration pipeline.
//!
//! Every failure that can abort a request is one of five kinds. They are
//! produced deep inside the parser, the integrator and the evaluator, travel
//! up with `?`, and are turned into a failed `IntegrationResult` at the
//! boundary of `IntegrationEngine::run`.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegralError {
    /// invalid syntax, disallowed token or function, wrong arity, input limits
    #[error("ParseError: {0}")]
    ParseError(String),
    /// invalid variable name or a free symbol other than the declared variable
    #[error("VariableError: {0}")]
    VariableError(String),
    /// no closed-form antiderivative was found
    #[error("IntegrationError: {0}")]
    IntegrationError(String),
    /// domain error, non-finite or complex value where a real scalar was required
    #[error("EvaluationError: {0}")]
    EvaluationError(String),
    /// the deadline of the request passed before the calculation finished
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl IntegralError {
    /// name of the error kind as reported to the client
    pub fn kind(&self) -> &'static str {
        match self {
            IntegralError::ParseError(_) => "ParseError",
            IntegralError::VariableError(_) => "VariableError",
            IntegralError::IntegrationError(_) => "IntegrationError",
            IntegralError::EvaluationError(_) => "EvaluationError",
            IntegralError::Timeout(_) => "Timeout",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            IntegralError::ParseError(msg)
            | IntegralError::VariableError(msg)
            | IntegralError::IntegrationError(msg)
            | IntegralError::EvaluationError(msg)
            | IntegralError::Timeout(msg) => msg,
        }
    }

    /// prefixes the message with some context, keeping the kind
    pub fn context(self, prefix: &str) -> IntegralError {
        match self {
            IntegralError::ParseError(msg) => IntegralError::ParseError(format!("{prefix}: {msg}")),
            IntegralError::VariableError(msg) => {
                IntegralError::VariableError(format!("{prefix}: {msg}"))
            }
            IntegralError::IntegrationError(msg) => {
                IntegralError::IntegrationError(format!("{prefix}: {msg}"))
            }
            IntegralError::EvaluationError(msg) => {
                IntegralError::EvaluationError(format!("{prefix}: {msg}"))
            }
            IntegralError::Timeout(msg) => IntegralError::Timeout(format!("{prefix}: {msg}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_kind() {
        let err = IntegralError::ParseError("unexpected character '$'".to_string());
        assert_eq!(err.to_string(), "ParseError: unexpected character '$'");
        assert_eq!(err.kind(), "ParseError");
        assert_eq!(err.message(), "unexpected character '$'");
    }

    #[test]
    fn test_context_keeps_kind() {
        let err = IntegralError::EvaluationError("division by zero".to_string())
            .context("lower limit");
        assert_eq!(err.kind(), "EvaluationError");
        assert_eq!(err.message(), "lower limit: division by zero");
    }

    #[test]
    fn test_timeout_kind() {
        let err = IntegralError::Timeout("deadline passed".to_string());
        assert_eq!(err.kind(), "Timeout");
        assert_eq!(err.to_string(), "Timeout: deadline passed");
    }
}
