//! Error type shared by the builder, the normalizer and the matcher.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything a public operation can fail with.
///
/// Every variant is terminal for the call that produced it; in a test context
/// callers treat them as assertion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An attribute was set while the cursor is not on an element
    #[error("Current node is not an element")]
    InvalidOperation,

    /// `to_parent` called at the document node
    #[error("Element has no parent")]
    NoParent,

    /// `to_ancestor` exhausted the ancestor chain
    #[error("Parent {0} not found in XML")]
    AncestorNotFound(String),

    /// The tree could not be written out as text
    #[error("Failed to convert document to string: {0}")]
    SerializationFailed(String),

    /// The XPath expression is not valid
    #[error("Malformed locator: {0}")]
    MalformedLocator(String),

    /// Neither the CSS nor the XPath reading of a selector matched, or no
    /// target node shares the schema root's tag name
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The schema input normalized to a document without a root element
    #[error("XML is empty")]
    EmptySchema,

    /// XML text could not be parsed
    #[error("XML parse error at byte {offset}: {message}")]
    Parse { message: String, offset: usize },

    /// The input cannot be converted into a document
    #[error("Cannot convert input to XML: {0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>, offset: usize) -> Self {
        Error::Parse {
            message: message.into(),
            offset,
        }
    }
}
