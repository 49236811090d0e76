use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("UI Automation API error: {message}")]
    UIAutomationAPIError {
        message: String,
        com_error: Option<i32>,
        operation: String,
        is_retryable: bool,
    },

    #[error("Element is detached from the tree: {0}")]
    ElementDetached(String),

    #[error("Element is not enabled: {0}")]
    ElementNotEnabled(String),
}

impl AutomationError {
    /// Whether a retry with backoff has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AutomationError::UIAutomationAPIError {
                is_retryable: true,
                ..
            }
        )
    }

    /// The native COM error code, when the provider surfaced one.
    pub fn com_error(&self) -> Option<i32> {
        match self {
            AutomationError::UIAutomationAPIError { com_error, .. } => *com_error,
            _ => None,
        }
    }
}

/// COM failure conditions the discovery path knows how to recover from.
///
/// Anything outside this table is treated as non-retryable and degrades to
/// an empty result once the retry budget is spent.
const KNOWN_COM_ERRORS: &[(i32, &str)] = &[
    (-2146233083, "UI element access denied or window destroyed"),
    (-2147024809, "Invalid parameter or window handle"),
    (-2147467259, "Unspecified error in COM operation"),
    (-2147023728, "Access denied to UI element"),
];

/// Describe a native COM error code, falling back to a generic message.
pub fn describe_com_error(code: i32) -> String {
    KNOWN_COM_ERRORS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, msg)| (*msg).to_string())
        .unwrap_or_else(|| format!("Unknown COM error: {code}"))
}

/// Whether a native COM error code is in the recoverable set.
pub fn is_known_com_error(code: i32) -> bool {
    KNOWN_COM_ERRORS.iter().any(|(known, _)| *known == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_com_codes_are_described() {
        assert_eq!(
            describe_com_error(-2146233083),
            "UI element access denied or window destroyed"
        );
        assert!(is_known_com_error(-2147467259));
        assert!(!is_known_com_error(42));
        assert_eq!(describe_com_error(42), "Unknown COM error: 42");
    }

    #[test]
    fn retryable_classification() {
        let err = AutomationError::UIAutomationAPIError {
            message: "boom".into(),
            com_error: Some(-2147024809),
            operation: "FindAll".into(),
            is_retryable: true,
        };
        assert!(err.is_retryable());
        assert_eq!(err.com_error(), Some(-2147024809));
        assert!(!AutomationError::ElementNotFound("x".into()).is_retryable());
    }
}
