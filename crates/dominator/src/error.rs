//! Error types for collection operations

use dom::DomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Failure reported by the document, passed through untouched
    #[error(transparent)]
    Dom(#[from] DomError),

    /// `get_val`/`set_val` on an element whose content is not a value
    #[error("cannot {operation} the value of a non-value based element")]
    NotValueBased {
        operation: &'static str,
        tag: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::NotValueBased {
            operation: "get",
            tag: "div".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot get the value of a non-value based element"
        );

        let err: Error = DomError::InvalidSelector("a[".to_string()).into();
        assert_eq!(err.to_string(), "Invalid selector: a[");
    }
}
